//! Raw HTTP responses.
//!
//! The transport does not police status codes beyond HTTP 429: the remote
//! service answers legitimate negative results with 4xx statuses, so every
//! other response is handed back as-is for the decoder to inspect.

use std::collections::HashMap;

/// A response received from the server.
///
/// Header names are stored lowercase; repeated headers keep every value in
/// arrival order.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use appwire::clients::HttpResponse;
///
/// let mut headers = HashMap::new();
/// headers.insert("set-cookie".to_string(), vec!["a=1".to_string(), "b=2".to_string()]);
///
/// let response = HttpResponse::new(200, headers, b"0-1023/4096".to_vec());
/// assert!(response.is_ok());
/// assert_eq!(response.header("Set-Cookie"), Some("a=1"));
/// assert_eq!(response.header_values("set-cookie").len(), 2);
/// assert_eq!(response.text(), "0-1023/4096");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers keyed by lowercase name.
    pub headers: HashMap<String, Vec<String>>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(status: u16, headers: HashMap<String, Vec<String>>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value of a header, matched case-insensitively.
    #[must_use]
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Converts reqwest headers into the lowercase multi-value map.
pub(crate) fn parse_response_headers(
    headers: &reqwest::header::HeaderMap,
) -> HashMap<String, Vec<String>> {
    let mut result: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        let key = name.as_str().to_lowercase();
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        result.entry(key).or_default().push(value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};

    #[test]
    fn test_is_ok_covers_2xx_only() {
        assert!(HttpResponse::new(200, HashMap::new(), Vec::new()).is_ok());
        assert!(HttpResponse::new(201, HashMap::new(), Vec::new()).is_ok());
        assert!(!HttpResponse::new(302, HashMap::new(), Vec::new()).is_ok());
        assert!(!HttpResponse::new(404, HashMap::new(), Vec::new()).is_ok());
    }

    #[test]
    fn test_missing_header() {
        let response = HttpResponse::new(200, HashMap::new(), Vec::new());
        assert!(response.header("x-missing").is_none());
        assert!(response.header_values("x-missing").is_empty());
    }

    #[test]
    fn test_parse_response_headers_keeps_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert("X-Custom", HeaderValue::from_static("v"));

        let parsed = parse_response_headers(&headers);
        assert_eq!(parsed["set-cookie"], vec!["a=1", "b=2"]);
        assert_eq!(parsed["x-custom"], vec!["v"]);
    }

    #[test]
    fn test_text_is_lossy() {
        let response = HttpResponse::new(200, HashMap::new(), vec![b'o', b'k', 0xff]);
        assert!(response.text().starts_with("ok"));
    }
}
