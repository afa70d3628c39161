//! Cookies visible through `document.cookie`.
//!
//! Only the script-facing view is modelled: one jar per page, `name=value`
//! reads, and assignments carrying `path`, `expires` and `max-age`. Other
//! attributes are accepted and ignored.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use url::Url;

/// An expiry date that is always in the past.
pub const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:00 UTC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// `None` for session cookies.
    pub expires: Option<DateTime<Utc>>,
}

impl Cookie {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map(|at| at <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unexpired cookies, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        let now = Utc::now();
        self.cookies.iter().filter(move |c| !c.is_expired_at(now))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `name=value` pairs visible at `location`, joined with `"; "`.
    pub fn cookie_string(&self, location: &Url) -> String {
        self.iter()
            .filter(|c| path_matches(location.path(), &c.path))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Apply one `document.cookie = input` assignment made from `location`.
    pub fn set_cookie_string(&mut self, location: &Url, input: &str) {
        let mut parts = input.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            tracing::debug!(input, "Ignoring cookie assignment without name=value");
            return;
        };

        let now = Utc::now();
        let mut cookie = Cookie {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            path: default_path(location),
            expires: None,
        };
        let mut max_age: Option<i64> = None;

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attr.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "path" if val.starts_with('/') => cookie.path = val.to_string(),
                "expires" => match parse_expires(val) {
                    Some(at) => cookie.expires = Some(at),
                    None => tracing::debug!(value = val, "Unparseable cookie expiry"),
                },
                "max-age" => max_age = val.parse().ok(),
                _ => {}
            }
        }

        // Max-Age wins over Expires
        if let Some(secs) = max_age {
            cookie.expires = Some(if secs <= 0 {
                DateTime::<Utc>::UNIX_EPOCH
            } else {
                TimeDelta::try_seconds(secs)
                    .and_then(|delta| now.checked_add_signed(delta))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            });
        }

        let existing = self
            .cookies
            .iter()
            .position(|c| c.name == cookie.name && c.path == cookie.path);

        if cookie.is_expired_at(now) {
            if let Some(index) = existing {
                self.cookies.remove(index);
            }
            return;
        }

        match existing {
            Some(index) => self.cookies[index] = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }
}

/// RFC 6265 section 5.1.4 default path.
fn default_path(location: &Url) -> String {
    let path = location.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_string(),
    }
}

/// RFC 6265 section 5.1.4 path-match.
fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc2822(value) {
        return Some(at.with_timezone(&Utc));
    }

    // `Thu, 01 Jan 1970 00:00:00 UTC` and the dashed cookie variant
    let trimmed = value
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches("GMT")
        .trim_end();
    ["%a, %d %b %Y %H:%M:%S", "%a, %d-%b-%Y %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_set_and_read_cookies() {
        let mut jar = CookieJar::new();
        jar.set_cookie_string(&root(), "a=1");
        jar.set_cookie_string(&root(), "b=2; path=/");
        jar.set_cookie_string(&root(), "a=3");

        assert_eq!(jar.cookie_string(&root()), "a=3; b=2");
    }

    #[test]
    fn test_past_expiry_deletes() {
        let mut jar = CookieJar::new();
        jar.set_cookie_string(&root(), "a=1");
        jar.set_cookie_string(&root(), &format!("a=; expires={}; path=/;", EXPIRED_DATE));

        assert!(jar.is_empty());
        assert_eq!(jar.cookie_string(&root()), "");
    }

    #[test]
    fn test_max_age_overrides_expires() {
        let mut jar = CookieJar::new();
        jar.set_cookie_string(
            &root(),
            "a=1; expires=Fri, 31 Dec 9999 23:59:59 GMT; max-age=0",
        );
        assert!(jar.is_empty());

        jar.set_cookie_string(&root(), &format!("b=1; expires={}; max-age=60", EXPIRED_DATE));
        assert_eq!(jar.cookie_string(&root()), "b=1");
    }

    #[test]
    fn test_expiry_only_hits_matching_path() {
        let page = Url::parse("https://example.com/shop/cart").unwrap();
        let mut jar = CookieJar::new();
        jar.set_cookie_string(&page, "basket=9");

        assert_eq!(jar.iter().next().map(|c| c.path.as_str()), Some("/shop"));

        jar.set_cookie_string(&page, &format!("basket=; expires={}; path=/", EXPIRED_DATE));
        assert_eq!(jar.cookie_string(&page), "basket=9");
        assert_eq!(jar.cookie_string(&root()), "");
    }

    #[test]
    fn test_parse_expires_formats() {
        assert_eq!(
            parse_expires(EXPIRED_DATE),
            Some(DateTime::<Utc>::UNIX_EPOCH)
        );
        assert!(parse_expires("Wed, 21 Oct 2065 07:28:00 GMT").is_some());
        assert!(parse_expires("Wed, 21-Oct-2065 07:28:00 GMT").is_some());
        assert!(parse_expires("tomorrow").is_none());
    }
}
