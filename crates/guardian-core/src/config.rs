//! Widget configuration
//!
//! Supplied once at construction and frozen. Field names follow the
//! embedding page's camelCase option object (`policyLink`, `acceptText`, ...).

use guardian_privacy::ConsentCategory;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub type ConsentCallback = Arc<dyn Fn() + Send + Sync>;

/// One optional hook per optional category.
#[derive(Clone, Default)]
pub struct Callbacks {
    preferences: Option<ConsentCallback>,
    statistics: Option<ConsentCallback>,
    marketing: Option<ConsentCallback>,
    unclassified: Option<ConsentCallback>,
}

impl Callbacks {
    fn slot(&mut self, category: ConsentCategory) -> Option<&mut Option<ConsentCallback>> {
        match category {
            ConsentCategory::Required => None,
            ConsentCategory::Preferences => Some(&mut self.preferences),
            ConsentCategory::Statistics => Some(&mut self.statistics),
            ConsentCategory::Marketing => Some(&mut self.marketing),
            ConsentCategory::Unclassified => Some(&mut self.unclassified),
        }
    }

    /// Returns false for Required, which has no hook.
    pub fn set(&mut self, category: ConsentCategory, callback: ConsentCallback) -> bool {
        match self.slot(category) {
            Some(slot) => {
                *slot = Some(callback);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, category: ConsentCategory) -> Option<&ConsentCallback> {
        match category {
            ConsentCategory::Required => None,
            ConsentCategory::Preferences => self.preferences.as_ref(),
            ConsentCategory::Statistics => self.statistics.as_ref(),
            ConsentCategory::Marketing => self.marketing.as_ref(),
            ConsentCategory::Unclassified => self.unclassified.as_ref(),
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<&str> = ConsentCategory::OPTIONAL
            .iter()
            .filter(|c| self.get(**c).is_some())
            .map(|c| c.as_str())
            .collect();
        f.debug_struct("Callbacks")
            .field("registered", &registered)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Cookie policy page linked from the default description
    pub policy_link: String,
    /// Sweep cookies and third-party scripts while marketing is not granted
    pub stop_all_cookies: bool,
    /// Banner description HTML. `None` uses the built-in text.
    pub desc: Option<String>,
    pub required_text: String,
    pub preferences_text: String,
    pub statistics_text: String,
    pub marketing_text: String,
    pub unclassified_text: String,
    pub accept_text: String,
    pub decline_text: String,
    /// Script hosts swept in addition to the built-in denylist
    pub extra_tracker_domains: Vec<String>,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient parse: fields of the wrong type keep their defaults.
    pub fn from_json(text: &str) -> Self {
        let mut config = Self::default();

        let object = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                tracing::warn!(kind = %json_kind(&other), "Config is not an object, using defaults");
                return config;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable config, using defaults");
                return config;
            }
        };

        take(&object, "policyLink", &mut config.policy_link);
        take(&object, "stopAllCookies", &mut config.stop_all_cookies);
        take(&object, "desc", &mut config.desc);
        take(&object, "requiredText", &mut config.required_text);
        take(&object, "preferencesText", &mut config.preferences_text);
        take(&object, "statisticsText", &mut config.statistics_text);
        take(&object, "marketingText", &mut config.marketing_text);
        take(&object, "unclassifiedText", &mut config.unclassified_text);
        take(&object, "acceptText", &mut config.accept_text);
        take(&object, "declineText", &mut config.decline_text);
        take(&object, "extraTrackerDomains", &mut config.extra_tracker_domains);

        config
    }

    pub fn with_policy_link(mut self, link: impl Into<String>) -> Self {
        self.policy_link = link.into();
        self
    }

    pub fn with_stop_all_cookies(mut self, enabled: bool) -> Self {
        self.stop_all_cookies = enabled;
        self
    }

    /// Register the hook run when `category` is granted.
    pub fn on_consent<F>(mut self, category: ConsentCategory, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        if !self.callbacks.set(category, Arc::new(callback)) {
            tracing::warn!(category = %category, "Ignoring callback for a category without consent");
        }
        self
    }

    pub fn category_text(&self, category: ConsentCategory) -> &str {
        match category {
            ConsentCategory::Required => &self.required_text,
            ConsentCategory::Preferences => &self.preferences_text,
            ConsentCategory::Statistics => &self.statistics_text,
            ConsentCategory::Marketing => &self.marketing_text,
            ConsentCategory::Unclassified => &self.unclassified_text,
        }
    }

    /// Description HTML, falling back to the built-in text with the policy link.
    pub fn description(&self) -> String {
        match &self.desc {
            Some(desc) => desc.clone(),
            None => default_description(&self.policy_link),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy_link: "/cookie-policy".to_string(),
            stop_all_cookies: true,
            desc: None,
            required_text: "Required cookies help make a website usable by enabling basic functions like page navigation and access to secure areas of the website. The website cannot function properly without these cookies.".to_string(),
            preferences_text: "Preference cookies enable a website to remember information that changes the way the website behaves or looks, like your preferred language or the region that you are in.".to_string(),
            statistics_text: "Statistical cookies help website owners to understand how visitors interact with websites by collecting and reporting information anonymously.".to_string(),
            marketing_text: "Marketing cookies are used to track visitors across websites. The intention is to display ads that are relevant and engaging for the individual user and thereby more valuable for publishers and third party advertisers.".to_string(),
            unclassified_text: "Unclassified cookies are cookies that we are in the process of classifying, together with the providers of individual cookies.".to_string(),
            accept_text: "Accept All".to_string(),
            decline_text: "Deny".to_string(),
            extra_tracker_domains: Vec::new(),
            callbacks: Callbacks::default(),
        }
    }
}

fn default_description(policy_link: &str) -> String {
    format!(
        r#"<p>This website uses cookies to improve user experience. By continuing to use this website, you consent to our use of cookies in accordance with our <a href="{policy_link}">Cookie Policy.</a></p>
<p>Cookies are small text files that are placed on your machine to help the site provide a better user experience. In general, cookies are used to retain user preferences, store information for things like shopping carts, and provide anonymized tracking data to third-party applications like Google Analytics. As a rule, cookies will make your browsing experience better. However, you may prefer to disable cookies on this site and on others. The most effective way to do this is to disable cookies in your browser. We suggest consulting the Help section of your browser or taking a look at the About Cookies website which offers guidance for all modern browsers.</p>
<p>By using this website, you agree to the use of cookies as described above.</p>"#
    )
}

fn take<T: DeserializeOwned>(object: &Map<String, Value>, key: &str, slot: &mut T) {
    let Some(value) = object.get(key) else {
        return;
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => *slot = parsed,
        Err(e) => tracing::warn!(key, error = %e, "Invalid config value, keeping default"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.policy_link, "/cookie-policy");
        assert!(config.stop_all_cookies);
        assert_eq!(config.accept_text, "Accept All");
        assert_eq!(config.decline_text, "Deny");
        assert!(config.description().contains(r#"<a href="/cookie-policy">"#));
    }

    #[test]
    fn test_from_json_reads_camel_case() {
        let config = Config::from_json(
            r#"{"policyLink": "/privacy", "stopAllCookies": false, "acceptText": "OK"}"#,
        );

        assert_eq!(config.policy_link, "/privacy");
        assert!(!config.stop_all_cookies);
        assert_eq!(config.accept_text, "OK");
        assert!(config.description().contains(r#"<a href="/privacy">"#));
    }

    #[test]
    fn test_from_json_falls_back_per_field() {
        let config = Config::from_json(
            r#"{"stopAllCookies": "yes", "declineText": 7, "desc": "<p>Custom</p>"}"#,
        );

        assert!(config.stop_all_cookies);
        assert_eq!(config.decline_text, "Deny");
        assert_eq!(config.description(), "<p>Custom</p>");

        let config = Config::from_json("not json");
        assert_eq!(config.policy_link, "/cookie-policy");
        let config = Config::from_json("[1, 2]");
        assert!(config.stop_all_cookies);
    }

    #[test]
    fn test_required_has_no_callback() {
        let config = Config::new()
            .on_consent(ConsentCategory::Required, || {})
            .on_consent(ConsentCategory::Marketing, || {});

        assert!(config.callbacks.get(ConsentCategory::Required).is_none());
        assert!(config.callbacks.get(ConsentCategory::Marketing).is_some());
        assert_eq!(
            format!("{:?}", config.callbacks),
            r#"Callbacks { registered: ["marketing"] }"#
        );
    }
}
