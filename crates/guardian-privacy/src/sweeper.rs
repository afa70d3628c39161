//! Script, iframe and cookie sweeping
//!
//! Every operation is destructive and idempotent: a second pass over the
//! same document removes nothing more.

use guardian_dom::{Document, NodeId, EXPIRED_DATE};

use crate::tracking::TrackerDenylist;

/// What one full sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub cookies: usize,
    pub iframes: usize,
    pub cross_origin_scripts: usize,
    pub denylisted_scripts: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.cookies + self.iframes + self.cross_origin_scripts + self.denylisted_scripts
    }
}

pub struct Sweeper<'a> {
    doc: &'a mut Document,
}

impl<'a> Sweeper<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    fn scripts_with_src(&self) -> Vec<(NodeId, String)> {
        self.doc
            .elements_by_tag("script")
            .into_iter()
            .filter_map(|id| self.doc.attr(id, "src").map(|src| (id, src.to_string())))
            .collect()
    }

    fn remove_all(&mut self, ids: Vec<NodeId>) -> usize {
        ids.into_iter().filter(|id| self.doc.remove(*id)).count()
    }

    /// Remove every `<script>` whose `src` contains `substring`.
    pub fn remove_by_domain_substring(&mut self, substring: &str) -> usize {
        let doomed = self
            .scripts_with_src()
            .into_iter()
            .filter(|(_, src)| src.contains(substring))
            .map(|(id, _)| id)
            .collect();
        self.remove_all(doomed)
    }

    /// Remove every `<script>` whose `src` host differs from the page host.
    pub fn remove_cross_origin(&mut self) -> usize {
        let page = self.doc.location().clone();
        let doomed = self
            .scripts_with_src()
            .into_iter()
            .filter(|(_, src)| TrackerDenylist::is_cross_origin(&page, src))
            .map(|(id, _)| id)
            .collect();
        self.remove_all(doomed)
    }

    pub fn remove_all_iframes(&mut self) -> usize {
        let doomed = self.doc.elements_by_tag("iframe");
        self.remove_all(doomed)
    }

    /// Expire every cookie readable through `document.cookie`.
    ///
    /// Each one is rewritten with a past expiry at path `/`, so cookies
    /// scoped to a deeper path survive, as they would in a browser.
    pub fn clear_all_cookies(&mut self) -> usize {
        let jar = self.doc.cookie();
        let names: Vec<String> = jar
            .split(';')
            .filter_map(|pair| pair.trim().split('=').next())
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .collect();

        let before = self.doc.cookies().len();
        for name in &names {
            self.doc
                .set_cookie(&format!("{}=; expires={}; path=/;", name, EXPIRED_DATE));
        }
        before - self.doc.cookies().len()
    }

    /// Cookies, iframes, cross-origin scripts, then each denylisted domain.
    pub fn sweep(&mut self, denylist: &TrackerDenylist) -> SweepReport {
        let mut report = SweepReport {
            cookies: self.clear_all_cookies(),
            iframes: self.remove_all_iframes(),
            cross_origin_scripts: self.remove_cross_origin(),
            denylisted_scripts: 0,
        };

        for domain in denylist.domains() {
            report.denylisted_scripts += self.remove_by_domain_substring(domain);
        }

        if report.total() > 0 {
            tracing::debug!(
                cookies = report.cookies,
                iframes = report.iframes,
                cross_origin = report.cross_origin_scripts,
                denylisted = report.denylisted_scripts,
                "Swept tracking content"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn page(body: &str) -> Document {
        Document::parse(
            Url::parse("https://example.com/").unwrap(),
            &format!("<html><head></head><body>{}</body></html>", body),
        )
    }

    fn script_srcs(doc: &Document) -> Vec<String> {
        doc.elements_by_tag("script")
            .into_iter()
            .filter_map(|id| doc.attr(id, "src").map(String::from))
            .collect()
    }

    #[test]
    fn test_denylist_sweep_keeps_first_party() {
        let mut doc = page(
            r#"<script src="https://googletagmanager.com/gtm.js"></script>
               <script src="https://example.com/app.js"></script>"#,
        );

        let removed = Sweeper::new(&mut doc).remove_by_domain_substring("googletagmanager.com");

        assert_eq!(removed, 1);
        assert_eq!(script_srcs(&doc), vec!["https://example.com/app.js"]);
    }

    #[test]
    fn test_cross_origin_leaves_inline_and_relative_scripts() {
        let mut doc = page(
            r#"<script>window.x = 1;</script>
               <script src="/local.js"></script>
               <script src="https://cdn.jsdelivr.net/lib.js"></script>"#,
        );

        let removed = Sweeper::new(&mut doc).remove_cross_origin();

        assert_eq!(removed, 1);
        assert_eq!(script_srcs(&doc), vec!["/local.js"]);
        assert_eq!(doc.elements_by_tag("script").len(), 2);
    }

    #[test]
    fn test_cross_origin_removes_hostless_sources() {
        let mut doc = page(
            r#"<script src="data:text/javascript,window.tracked=1"></script>
               <script src="/local.js"></script>"#,
        );

        assert_eq!(Sweeper::new(&mut doc).remove_cross_origin(), 1);
        assert_eq!(script_srcs(&doc), vec!["/local.js"]);
    }

    #[test]
    fn test_remove_nested_iframes() {
        let mut doc = page(
            r#"<div><iframe src="https://youtube.com/embed/1"></iframe></div>
               <iframe src="/widget"></iframe>"#,
        );

        assert_eq!(Sweeper::new(&mut doc).remove_all_iframes(), 2);
        assert!(doc.elements_by_tag("iframe").is_empty());
    }

    #[test]
    fn test_clear_all_cookies() {
        let mut doc = page("");
        doc.set_cookie("a=1");
        doc.set_cookie("b=2");
        assert_eq!(doc.cookie(), "a=1; b=2");

        assert_eq!(Sweeper::new(&mut doc).clear_all_cookies(), 2);
        assert_eq!(doc.cookie(), "");
        assert_eq!(Sweeper::new(&mut doc).clear_all_cookies(), 0);
    }

    #[test]
    fn test_full_sweep_is_idempotent() {
        let mut doc = page(
            r#"<script src="https://www.google-analytics.com/analytics.js"></script>
               <script src="https://static.hotjar.com/c/hotjar.js"></script>
               <script src="/js/app.js?ref=linkedin.com"></script>
               <script src="/js/main.js"></script>
               <iframe src="https://ads.example.net/"></iframe>"#,
        );
        doc.set_cookie("_ga=GA1.2");
        let denylist = TrackerDenylist::new();

        let first = Sweeper::new(&mut doc).sweep(&denylist);
        let second = Sweeper::new(&mut doc).sweep(&denylist);

        assert_eq!(
            first,
            SweepReport {
                cookies: 1,
                iframes: 1,
                cross_origin_scripts: 2,
                denylisted_scripts: 1,
            }
        );
        assert_eq!(second.total(), 0);
        assert_eq!(script_srcs(&doc), vec!["/js/main.js"]);
    }
}
