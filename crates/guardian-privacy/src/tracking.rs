//! Tracker denylist and origin checks for script sources

use url::Url;

/// Known analytics, advertising and marketing script hosts.
pub const TRACKER_DOMAINS: &[&str] = &[
    // Google
    "google-analytics.com",
    "googletagmanager.com",
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    // Social
    "facebook.net",
    "twitter.com",
    "linkedin.com",
    // Session recording / heatmaps
    "hotjar.com",
    "crazyegg.com",
    "mouseflow.com",
    "fullstory.com",
    // Analytics
    "matomo.org",
    "omniture.com",
    "quantserve.com",
    "mixpanel.com",
    "segment.com",
    "heapanalytics.com",
    "finteza.com",
    "mc.yandex.ru",
    // Experimentation
    "vwo.com",
    "optimizely.com",
    // Advertising
    "adroll.com",
    "taboola.com",
    "outbrain.com",
    "bing.com",
    "yahoo.com",
    "adform.com",
    "adgear.com",
    // Marketing automation
    "hubspot.com",
    "pardot.com",
    "leadfeeder.com",
];

/// Substring denylist matched against raw `src` attributes.
#[derive(Debug, Clone)]
pub struct TrackerDenylist {
    domains: Vec<String>,
}

impl TrackerDenylist {
    pub fn new() -> Self {
        Self {
            domains: TRACKER_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Built-in list plus `extra`, skipping blanks and duplicates.
    pub fn with_extra_domains<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for domain in extra {
            list.add_domain(domain.as_ref());
        }
        list
    }

    pub fn add_domain(&mut self, domain: &str) {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() || self.domains.contains(&domain) {
            return;
        }
        self.domains.push(domain);
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// First denylisted domain appearing in `src`.
    pub fn matching_domain(&self, src: &str) -> Option<&str> {
        self.domains
            .iter()
            .find(|d| src.contains(d.as_str()))
            .map(|d| d.as_str())
    }

    /// Whether `src`, resolved against `page`, points at another host.
    ///
    /// Hostless sources (`data:`, `blob:`) never match a page with a host.
    /// Sources that cannot be resolved are treated as same-origin and kept.
    pub fn is_cross_origin(page: &Url, src: &str) -> bool {
        let resolved = match page.join(src.trim()) {
            Ok(u) => u,
            Err(_) => return false,
        };

        let page_host = page.host_str().unwrap_or("");
        let src_host = resolved.host_str().unwrap_or("");
        !page_host.eq_ignore_ascii_case(src_host)
    }
}

impl Default for TrackerDenylist {
    fn default() -> Self {
        Self::new()
    }
}
