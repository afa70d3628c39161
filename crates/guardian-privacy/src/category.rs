//! Consent categories and in-memory consent state
//!
//! | Category     | Default | Stored |
//! | Required     | Granted | Never  |
//! | Preferences  | Denied  | Yes    |
//! | Statistics   | Denied  | Yes    |
//! | Marketing    | Denied  | Yes    |
//! | Unclassified | Denied  | Yes    |

use serde::{Deserialize, Serialize};

/// Prefix shared by every stored key. Also the banner-open key itself.
pub const STORAGE_NAMESPACE: &str = "cookie-guardian";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentCategory {
    Required,
    Preferences,
    Statistics,
    Marketing,
    Unclassified,
}

impl ConsentCategory {
    pub const ALL: [ConsentCategory; 5] = [
        ConsentCategory::Required,
        ConsentCategory::Preferences,
        ConsentCategory::Statistics,
        ConsentCategory::Marketing,
        ConsentCategory::Unclassified,
    ];

    /// Categories the user can toggle, in callback order.
    pub const OPTIONAL: [ConsentCategory; 4] = [
        ConsentCategory::Preferences,
        ConsentCategory::Statistics,
        ConsentCategory::Marketing,
        ConsentCategory::Unclassified,
    ];

    pub fn default_granted(&self) -> bool {
        matches!(self, ConsentCategory::Required)
    }

    pub fn is_optional(&self) -> bool {
        !matches!(self, ConsentCategory::Required)
    }

    /// Persisted key for this category. Required is never stored.
    pub fn storage_key(&self) -> Option<&'static str> {
        match self {
            ConsentCategory::Required => None,
            ConsentCategory::Preferences => Some("cookie-guardian-preferences"),
            ConsentCategory::Statistics => Some("cookie-guardian-statistics"),
            ConsentCategory::Marketing => Some("cookie-guardian-marketing"),
            ConsentCategory::Unclassified => Some("cookie-guardian-unclassified"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentCategory::Required => "required",
            ConsentCategory::Preferences => "preferences",
            ConsentCategory::Statistics => "statistics",
            ConsentCategory::Marketing => "marketing",
            ConsentCategory::Unclassified => "unclassified",
        }
    }

    /// Human label shown in the banner.
    pub fn label(&self) -> &'static str {
        match self {
            ConsentCategory::Required => "Required",
            ConsentCategory::Preferences => "Preferences",
            ConsentCategory::Statistics => "Statistics",
            ConsentCategory::Marketing => "Marketing",
            ConsentCategory::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for ConsentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "required" => Ok(ConsentCategory::Required),
            "preferences" => Ok(ConsentCategory::Preferences),
            "statistics" => Ok(ConsentCategory::Statistics),
            "marketing" => Ok(ConsentCategory::Marketing),
            "unclassified" => Ok(ConsentCategory::Unclassified),
            _ => Err(format!("Unknown consent category: {}", s)),
        }
    }
}

/// The user's current choices. Required is implicit and always granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentState {
    pub preferences: bool,
    pub statistics: bool,
    pub marketing: bool,
    pub unclassified: bool,
}

impl ConsentState {
    pub fn required(&self) -> bool {
        true
    }

    pub fn get(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Required => true,
            ConsentCategory::Preferences => self.preferences,
            ConsentCategory::Statistics => self.statistics,
            ConsentCategory::Marketing => self.marketing,
            ConsentCategory::Unclassified => self.unclassified,
        }
    }

    /// Set one category. Returns false (and changes nothing) for Required.
    pub fn set(&mut self, category: ConsentCategory, granted: bool) -> bool {
        let slot = match category {
            ConsentCategory::Required => return false,
            ConsentCategory::Preferences => &mut self.preferences,
            ConsentCategory::Statistics => &mut self.statistics,
            ConsentCategory::Marketing => &mut self.marketing,
            ConsentCategory::Unclassified => &mut self.unclassified,
        };
        *slot = granted;
        true
    }

    pub fn grant_all(&mut self) {
        for category in ConsentCategory::OPTIONAL {
            self.set(category, true);
        }
    }

    pub fn deny_all(&mut self) {
        for category in ConsentCategory::OPTIONAL {
            self.set(category, false);
        }
    }

    /// Optional categories currently granted, in callback order.
    pub fn granted(&self) -> Vec<ConsentCategory> {
        ConsentCategory::OPTIONAL
            .into_iter()
            .filter(|c| self.get(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_is_fixed() {
        let mut state = ConsentState::default();

        assert!(state.required());
        assert!(!state.set(ConsentCategory::Required, false));
        assert!(state.get(ConsentCategory::Required));
        assert_eq!(ConsentCategory::Required.storage_key(), None);
    }

    #[test]
    fn test_toggle_leaves_other_categories_alone() {
        let toggles = [
            (ConsentCategory::Statistics, true),
            (ConsentCategory::Marketing, true),
            (ConsentCategory::Statistics, false),
            (ConsentCategory::Unclassified, true),
            (ConsentCategory::Marketing, false),
        ];

        for untouched in ConsentCategory::OPTIONAL {
            let mut state = ConsentState::default();
            state.set(untouched, true);

            for (category, value) in toggles.iter().filter(|(c, _)| *c != untouched) {
                state.set(*category, *value);
                assert!(state.get(untouched), "{} changed", untouched);
            }
        }
    }

    #[test]
    fn test_grant_and_deny_all() {
        let mut state = ConsentState::default();

        state.grant_all();
        state.grant_all();
        assert_eq!(state.granted(), ConsentCategory::OPTIONAL.to_vec());

        state.deny_all();
        state.deny_all();
        assert!(state.granted().is_empty());
        assert_eq!(state, ConsentState::default());
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in ConsentCategory::ALL {
            assert_eq!(category.as_str().parse::<ConsentCategory>(), Ok(category));
            assert_eq!(category.default_granted(), !category.is_optional());
        }
        assert!("cookies".parse::<ConsentCategory>().is_err());
    }
}
