//! A single stored cookie and `Set-Cookie` parsing.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cookie held by the [`CookieStore`](super::CookieStore).
///
/// Entries serialize to the array-of-objects JSON layout used for cookie
/// persistence, with PascalCase keys and `Expires` as a Unix timestamp:
///
/// ```json
/// {"Name":"csrftoken","Value":"abc","Domain":"i.instagram.com","Path":"/","Expires":1767225600,"Secure":true,"HttpOnly":false}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CookieEntry {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Normalized domain (lowercase, no leading dot).
    pub domain: String,
    /// Path prefix the cookie applies to.
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiry as a Unix timestamp; `None` for session cookies.
    #[serde(default)]
    pub expires: Option<i64>,
    /// Only sent over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Not exposed to scripts. Stored for round-tripping only.
    #[serde(default)]
    pub http_only: bool,
}

fn default_path() -> String {
    "/".to_string()
}

impl CookieEntry {
    /// Creates a session cookie for `domain` with path `/`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl AsRef<str>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: normalize_domain(domain.as_ref()),
            path: default_path(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Sets the expiry timestamp.
    #[must_use]
    pub const fn expires_at(mut self, timestamp: i64) -> Self {
        self.expires = Some(timestamp);
        self
    }

    /// Parses one `Set-Cookie` header value received from `request_host`.
    ///
    /// Returns `None` when the header has no `name=value` pair, or when its
    /// `Domain` attribute names a domain that `request_host` does not belong
    /// to. The entry is returned even if it is already expired; the store
    /// treats such entries as deletions.
    #[must_use]
    pub fn parse_set_cookie(header: &str, request_host: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut attributes = header.split(';');
        let (name, value) = attributes.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut entry = Self::new(name, value.trim().trim_matches('"'), request_host);
        let mut max_age = None;

        for attribute in attributes {
            let (key, val) = attribute
                .split_once('=')
                .map_or((attribute.trim(), ""), |(k, v)| (k.trim(), v.trim()));

            match key.to_ascii_lowercase().as_str() {
                "domain" if !val.is_empty() => {
                    let domain = normalize_domain(val);
                    if !domain_match(&normalize_domain(request_host), &domain) {
                        return None;
                    }
                    entry.domain = domain;
                }
                "path" if val.starts_with('/') => entry.path = val.to_string(),
                "expires" => {
                    if let Some(expires) = parse_cookie_date(val) {
                        entry.expires = Some(expires.timestamp());
                    }
                }
                "max-age" => max_age = val.parse::<i64>().ok(),
                "secure" => entry.secure = true,
                "httponly" => entry.http_only = true,
                _ => {}
            }
        }

        if let Some(seconds) = max_age {
            entry.expires = Some(if seconds <= 0 {
                now.timestamp() - 1
            } else {
                now.timestamp().saturating_add(seconds)
            });
        }

        Some(entry)
    }

    /// Returns `true` if the cookie has an expiry at or before `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now.timestamp())
    }

    /// Returns `true` if the cookie applies to `host`.
    ///
    /// A cookie for `example.com` applies to `example.com` and to any
    /// subdomain such as `i.example.com`.
    #[must_use]
    pub fn matches_domain(&self, host: &str) -> bool {
        domain_match(&normalize_domain(host), &self.domain)
    }

    /// Returns `true` if the cookie applies to `path`.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        if self.path == "/" || path == self.path {
            return true;
        }
        path.strip_prefix(self.path.as_str())
            .is_some_and(|rest| self.path.ends_with('/') || rest.starts_with('/'))
    }
}

/// Lowercases a domain and strips any leading dot.
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// `host` equals `domain` or is one of its subdomains. Both are normalized.
fn domain_match(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    ["%a, %d-%b-%Y %H:%M:%S GMT", "%a, %d-%b-%y %H:%M:%S GMT"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_basic_set_cookie() {
        let entry = CookieEntry::parse_set_cookie(
            "csrftoken=abc123; Path=/; Secure; HttpOnly",
            "i.instagram.com",
            now(),
        )
        .unwrap();

        assert_eq!(entry.name, "csrftoken");
        assert_eq!(entry.value, "abc123");
        assert_eq!(entry.domain, "i.instagram.com");
        assert_eq!(entry.path, "/");
        assert!(entry.secure);
        assert!(entry.http_only);
        assert!(entry.expires.is_none());
    }

    #[test]
    fn test_parse_domain_attribute_is_normalized() {
        let entry = CookieEntry::parse_set_cookie(
            "mid=xyz; Domain=.Instagram.com",
            "i.instagram.com",
            now(),
        )
        .unwrap();
        assert_eq!(entry.domain, "instagram.com");
    }

    #[test]
    fn test_parse_rejects_domain_of_unrelated_host() {
        let forged = CookieEntry::parse_set_cookie(
            "csrftoken=forged; Domain=i.instagram.com",
            "upload.other-host.example",
            now(),
        );
        assert!(forged.is_none());

        let sibling = CookieEntry::parse_set_cookie(
            "csrftoken=forged; Domain=i.instagram.com",
            "b.instagram.com",
            now(),
        );
        assert!(sibling.is_none());
    }

    #[test]
    fn test_parse_accepts_domain_of_own_host() {
        let entry =
            CookieEntry::parse_set_cookie("a=b; Domain=I.Instagram.com", "i.instagram.com", now())
                .unwrap();
        assert_eq!(entry.domain, "i.instagram.com");
    }

    #[test]
    fn test_parse_imf_fixdate_expires() {
        let entry = CookieEntry::parse_set_cookie(
            "a=b; expires=Tue, 31 Dec 2024 23:59:59 GMT",
            "host",
            now(),
        )
        .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(entry.expires, Some(expected.timestamp()));
    }

    #[test]
    fn test_parse_dashed_expires() {
        let entry = CookieEntry::parse_set_cookie(
            "a=b; expires=Tue, 31-Dec-2024 23:59:59 GMT",
            "host",
            now(),
        )
        .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(entry.expires, Some(expected.timestamp()));
    }

    #[test]
    fn test_max_age_overrides_expires() {
        let entry = CookieEntry::parse_set_cookie(
            "a=b; Max-Age=60; expires=Tue, 31 Dec 2024 23:59:59 GMT",
            "host",
            now(),
        )
        .unwrap();
        assert_eq!(entry.expires, Some(now().timestamp() + 60));
    }

    #[test]
    fn test_zero_max_age_is_expired() {
        let entry = CookieEntry::parse_set_cookie("a=; Max-Age=0", "host", now()).unwrap();
        assert!(entry.is_expired(now()));
    }

    #[test]
    fn test_parse_rejects_missing_pair() {
        assert!(CookieEntry::parse_set_cookie("garbage", "host", now()).is_none());
        assert!(CookieEntry::parse_set_cookie("=value", "host", now()).is_none());
    }

    #[test]
    fn test_domain_matching() {
        let entry = CookieEntry::new("a", "b", "instagram.com");
        assert!(entry.matches_domain("instagram.com"));
        assert!(entry.matches_domain("i.instagram.com"));
        assert!(!entry.matches_domain("notinstagram.com"));
        assert!(!entry.matches_domain("example.com"));
    }

    #[test]
    fn test_path_matching() {
        let mut entry = CookieEntry::new("a", "b", "host");
        entry.path = "/api".to_string();
        assert!(entry.matches_path("/api"));
        assert!(entry.matches_path("/api/v1/"));
        assert!(!entry.matches_path("/apiv1"));
        assert!(!entry.matches_path("/other"));
    }

    #[test]
    fn test_json_layout_is_pascal_case() {
        let entry = CookieEntry::new("csrftoken", "abc", "i.instagram.com").expires_at(100);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["Name"], "csrftoken");
        assert_eq!(json["Domain"], "i.instagram.com");
        assert_eq!(json["Expires"], 100);
        assert_eq!(json["HttpOnly"], false);
    }
}
