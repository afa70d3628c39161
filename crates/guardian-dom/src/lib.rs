//! Cookie Guardian Document Model
//!
//! An in-memory stand-in for the live page the widget runs in: an element
//! tree addressed by [`NodeId`], the page location, and the cookies visible
//! to `document.cookie`.

mod cookies;
mod document;
mod error;
mod render;

pub use cookies::{Cookie, CookieJar, EXPIRED_DATE};
pub use document::{Document, NodeId, NodeKind};
pub use error::DomError;
pub use render::{render, STABLE_ID_ATTR};

pub type Result<T> = std::result::Result<T, DomError>;
