//! Replaceable fragment rendering

use crate::document::{Document, NodeId};
use crate::Result;

/// Attribute tagging a rendered root so the next render can find it.
pub const STABLE_ID_ATTR: &str = "data-uuid";

/// Parse `html`, tag its root with `stable_id`, and swap it into `container`.
///
/// An element under `container` already tagged with `stable_id` is replaced
/// in place; otherwise the new element is appended. Returns the new element.
/// Malformed markup is not an error: it becomes whatever tree the HTML
/// parser recovers.
pub fn render(
    doc: &mut Document,
    html: &str,
    stable_id: &str,
    container: NodeId,
) -> Result<NodeId> {
    let element = doc.parse_fragment(html)?;
    doc.set_attr(element, STABLE_ID_ATTR, stable_id)?;

    match doc.find_by_attr(container, STABLE_ID_ATTR, stable_id) {
        Some(previous) => {
            doc.replace_child(previous, element)?;
            tracing::trace!(stable_id, "Replaced rendered fragment");
        }
        None => {
            doc.append_child(container, element)?;
            tracing::trace!(stable_id, "Appended rendered fragment");
        }
    }

    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn doc() -> Document {
        Document::parse(
            Url::parse("https://example.com/").unwrap(),
            "<body><header></header><footer></footer></body>",
        )
    }

    #[test]
    fn test_render_appends_then_replaces() {
        let mut doc = doc();
        let body = doc.body();

        let first = render(&mut doc, "<div>one</div>", "1", body).unwrap();
        let second = render(&mut doc, "<div>two</div>", "1", body).unwrap();

        assert_ne!(first, second);
        assert!(!doc.is_connected(first));
        assert_eq!(doc.attr(second, STABLE_ID_ATTR), Some("1"));

        let tagged: Vec<_> = doc
            .descendants(body)
            .into_iter()
            .filter(|id| doc.attr(*id, STABLE_ID_ATTR) == Some("1"))
            .collect();
        assert_eq!(tagged, vec![second]);
        assert_eq!(doc.text_content(second), "two");
    }

    #[test]
    fn test_replacement_preserves_sibling_order() {
        let mut doc = doc();
        let body = doc.body();
        let header = doc.elements_by_tag("header")[0];

        let banner = render(&mut doc, "<div></div>", "1", header).unwrap();
        render(&mut doc, "<section></section>", "2", body).unwrap();
        let banner_again = render(&mut doc, "<aside></aside>", "1", body).unwrap();

        assert!(!doc.is_connected(banner));
        assert_eq!(doc.parent(banner_again), Some(header));
        let order: Vec<_> = doc
            .children(body)
            .iter()
            .filter_map(|c| doc.tag_name(*c))
            .collect();
        assert_eq!(order, vec!["header", "footer", "section"]);
    }

    #[test]
    fn test_distinct_ids_coexist() {
        let mut doc = doc();
        let body = doc.body();

        render(&mut doc, "<div></div>", "1", body).unwrap();
        render(&mut doc, "<div></div>", "2", body).unwrap();
        render(&mut doc, "<div></div>", "1", body).unwrap();

        assert_eq!(doc.elements_by_tag("div").len(), 2);
    }

    #[test]
    fn test_malformed_markup_is_best_effort() {
        let mut doc = doc();
        let body = doc.body();

        let id = render(&mut doc, "<div><p>unclosed", "1", body).unwrap();

        assert_eq!(doc.tag_name(id), Some("div"));
        assert_eq!(doc.text_content(id), "unclosed");
    }
}
