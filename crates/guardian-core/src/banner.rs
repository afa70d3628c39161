//! Banner and toggle button markup
//!
//! Plain string substitution. Configured strings are inserted verbatim, so
//! the description may carry its own HTML.

use guardian_privacy::ConsentCategory;

use crate::config::Config;

/// Stable id of the banner fragment.
pub const BANNER_ID: &str = "1";
/// Stable id of the floating toggle button fragment.
pub const BUTTON_ID: &str = "2";

pub const ACTIVE_CLASS: &str = "cookie-guardian__active";
pub const CLOSE_CLASS: &str = "cookie-guardian__close";
pub const TOGGLE_CLASS: &str = "cookie-button";
pub const DENY_BUTTON_ID: &str = "cookie-guardian__deny-button";
pub const ACCEPT_BUTTON_ID: &str = "cookie-guardian__accept-button";

const CLOSE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 384 512"><!--!Font Awesome Free 6.5.2 by @fontawesome - https://fontawesome.com License - https://fontawesome.com/license/free Copyright 2024 Fonticons, Inc.--><path d="M376.6 84.5c11.3-13.6 9.5-33.8-4.1-45.1s-33.8-9.5-45.1 4.1L192 206 56.6 43.5C45.3 29.9 25.1 28.1 11.5 39.4S-3.9 70.9 7.4 84.5L150.3 256 7.4 427.5c-11.3 13.6-9.5 33.8 4.1 45.1s33.8 9.5 45.1-4.1L192 306 327.4 468.5c11.3 13.6 31.5 15.4 45.1 4.1s15.4-31.5 4.1-45.1L233.7 256 376.6 84.5z"/></svg>"#;

const COOKIE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 512 512"><!--!Font Awesome Free 6.5.2 by @fontawesome - https://fontawesome.com License - https://fontawesome.com/license/free Copyright 2024 Fonticons, Inc.--><path d="M247.2 17c-22.1-3.1-44.6 .9-64.4 11.4l-74 39.5C89.1 78.4 73.2 94.9 63.4 115L26.7 190.6c-9.8 20.1-13 42.9-9.1 64.9l14.5 82.8c3.9 22.1 14.6 42.3 30.7 57.9l60.3 58.4c16.1 15.6 36.6 25.6 58.7 28.7l83 11.7c22.1 3.1 44.6-.9 64.4-11.4l74-39.5c19.7-10.5 35.6-27 45.4-47.2l36.7-75.5c9.8-20.1 13-42.9 9.1-64.9l-14.6-82.8c-3.9-22.1-14.6-42.3-30.7-57.9L388.9 57.5c-16.1-15.6-36.6-25.6-58.7-28.7L247.2 17zM208 144a32 32 0 1 1 0 64 32 32 0 1 1 0-64zM144 336a32 32 0 1 1 64 0 32 32 0 1 1 -64 0zm224-64a32 32 0 1 1 0 64 32 32 0 1 1 0-64z"/></svg>"#;

/// Class of the checkbox for `category`, e.g. `cg--marketing`.
pub fn checkbox_class(category: ConsentCategory) -> String {
    format!("cg--{}", category.as_str())
}

fn section_html(config: &Config, category: ConsentCategory) -> String {
    let input = if category.is_optional() {
        format!(
            r#"<input type="checkbox" class="{}" />"#,
            checkbox_class(category)
        )
    } else {
        r#"<input type="checkbox" checked="checked" disabled="disabled" />"#.to_string()
    };

    format!(
        r#"<div class="cookie-guardian__section">
                <b>{label}</b>
                <p>{text}</p>
                {input}
                <div class="checkbox-slider"></div>
            </div>"#,
        label = category.label(),
        text = config.category_text(category),
        input = input,
    )
}

pub fn banner_html(config: &Config) -> String {
    let sections: String = ConsentCategory::ALL
        .iter()
        .map(|c| section_html(config, *c))
        .collect();

    format!(
        r#"<div>
    <div class="cookie-guardian">
        <div class="{close_class}">{close_icon}</div>
        <div class="cookie-guardian__content" data-tabcg="1">
            <div class="cookie-guardian__banner">
                <div>Cookie Guardian</div>
                <span>BY CHRISTOPHER NATHANIEL</span>
            </div>
            <div class="cookie-guardian__desc">
                {desc}
            </div>
            <div class="cookie-guardian__options">
                {sections}
            </div>
            <div class="cookie-guardian__buttons">
                <button id="{deny_id}" class="cookie-guardian__button">{decline}</button>
                <button id="{accept_id}" class="cookie-guardian__button">{accept}</button>
            </div>
        </div>
    </div>
    <div class="cookie-guardian__overlay"></div>
</div>"#,
        close_class = CLOSE_CLASS,
        close_icon = CLOSE_ICON,
        desc = config.description(),
        sections = sections,
        deny_id = DENY_BUTTON_ID,
        accept_id = ACCEPT_BUTTON_ID,
        decline = config.decline_text,
        accept = config.accept_text,
    )
}

pub fn button_html() -> String {
    format!(
        r#"<div>
    <div class="{}">{}</div>
</div>"#,
        TOGGLE_CLASS, COOKIE_ICON
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_dom::Document;

    fn parse(html: &str) -> (Document, guardian_dom::NodeId) {
        let mut doc = Document::new("https://example.com/".parse().unwrap());
        let root = doc.parse_fragment(html).unwrap();
        (doc, root)
    }

    #[test]
    fn test_banner_has_every_control() {
        let (doc, root) = parse(&banner_html(&Config::default()));

        assert!(doc.find_by_class(root, CLOSE_CLASS).is_some());
        assert!(doc.find_by_id(root, DENY_BUTTON_ID).is_some());
        assert!(doc.find_by_id(root, ACCEPT_BUTTON_ID).is_some());
        for category in ConsentCategory::OPTIONAL {
            let checkbox = doc.find_by_class(root, &checkbox_class(category)).unwrap();
            assert!(!doc.has_attr(checkbox, "checked"));
        }

        let inputs: Vec<_> = doc
            .descendants(root)
            .into_iter()
            .filter(|id| doc.tag_name(*id) == Some("input"))
            .collect();
        assert_eq!(inputs.len(), 5);
        assert!(doc.has_attr(inputs[0], "disabled"));
        assert!(doc.has_attr(inputs[0], "checked"));
    }

    #[test]
    fn test_banner_substitutes_config() {
        let config = Config {
            accept_text: "Yes please".to_string(),
            decline_text: "No thanks".to_string(),
            desc: Some("<p class=\"custom\">Hi</p>".to_string()),
            ..Config::default()
        };
        let (doc, root) = parse(&banner_html(&config));

        let accept = doc.find_by_id(root, ACCEPT_BUTTON_ID).unwrap();
        let deny = doc.find_by_id(root, DENY_BUTTON_ID).unwrap();
        assert_eq!(doc.text_content(accept), "Yes please");
        assert_eq!(doc.text_content(deny), "No thanks");
        assert!(doc.find_by_class(root, "custom").is_some());
    }

    #[test]
    fn test_button_markup() {
        let (doc, root) = parse(&button_html());
        assert_eq!(doc.tag_name(root), Some("div"));
        assert!(doc.find_by_class(root, TOGGLE_CLASS).is_some());
    }
}
