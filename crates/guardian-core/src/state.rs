//! Banner visibility
//!
//! ```text
//! Open ──close / deny / accept / toggle──▶ Closed
//!  ▲                                        │
//!  └──────────────── toggle ────────────────┘
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerState {
    /// Banner is shown and choices can be edited
    Open,
    /// Only the floating toggle button is shown
    Closed,
}

impl BannerState {
    /// State for a stored banner-open flag. A first visit opens the banner.
    pub fn from_persisted(open: Option<bool>) -> Self {
        match open {
            Some(false) => BannerState::Closed,
            Some(true) | None => BannerState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, BannerState::Open)
    }

    pub fn toggled(&self) -> Self {
        match self {
            BannerState::Open => BannerState::Closed,
            BannerState::Closed => BannerState::Open,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BannerState::Open => "open",
            BannerState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for BannerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BannerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(BannerState::Open),
            "closed" => Ok(BannerState::Closed),
            _ => Err(format!("Unknown banner state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_persisted() {
        assert_eq!(BannerState::from_persisted(None), BannerState::Open);
        assert_eq!(BannerState::from_persisted(Some(true)), BannerState::Open);
        assert_eq!(BannerState::from_persisted(Some(false)), BannerState::Closed);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(BannerState::Open.toggled(), BannerState::Closed);
        assert_eq!(BannerState::Closed.toggled().toggled(), BannerState::Closed);
        assert_eq!("OPEN".parse::<BannerState>(), Ok(BannerState::Open));
    }
}
