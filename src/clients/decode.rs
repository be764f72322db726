//! Response body decoding.
//!
//! Identifiers in this API are 64-bit integers sent as bare JSON numbers.
//! Many of them exceed 2^53 - 1, past which a double can no longer hold
//! every integer exactly. Decoding therefore parses with exact number
//! literals and turns every integer outside the safe range into a string
//! holding its literal digits.
//!
//! Two entry points are provided:
//!
//! - [`decode_json`]: the raw tree, with no success check
//! - [`decode_typed`]: maps the tree onto an [`ApiResponse`] type and fails
//!   with [`ApiError::ApiCallFailed`] unless the response reports success
//!
//! # Example
//!
//! ```rust
//! use appwire::clients::decode::decode_json;
//!
//! let tree = decode_json(br#"{"pk": 1234567890123456789, "count": 3}"#).unwrap();
//! assert_eq!(tree["pk"], "1234567890123456789");
//! assert_eq!(tree["count"], 3);
//! ```

use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde_json::Value;

use crate::clients::api::responses::ApiResponse;
use crate::clients::errors::ApiError;
use crate::clients::http_response::HttpResponse;

/// The largest integer a double represents exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Parses `body` as JSON, preserving large integers as strings.
///
/// # Errors
///
/// Returns [`ApiError::MalformedResponse`] if `body` is not valid JSON.
pub fn decode_json(body: &[u8]) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| ApiError::malformed(e, body))?;
    Ok(preserve_big_integers(value))
}

/// Parses `body` into `T` and checks its success flag.
///
/// # Errors
///
/// Returns [`ApiError::MalformedResponse`] if `body` is not JSON or does not
/// fit `T`, or [`ApiError::ApiCallFailed`] if the response is not `ok`.
pub fn decode_typed<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: ApiResponse + DeserializeOwned,
{
    let tree = decode_json(body)?;
    map_typed(tree, body)
}

fn map_typed<T>(tree: Value, body: &[u8]) -> Result<T, ApiError>
where
    T: ApiResponse + DeserializeOwned,
{
    let fallback_message = tree
        .get("message")
        .and_then(Value::as_str)
        .map(String::from);
    let typed: T = serde_json::from_value(tree).map_err(|e| ApiError::malformed(e, body))?;

    if typed.is_ok() {
        Ok(typed)
    } else {
        Err(ApiError::ApiCallFailed {
            type_name: short_type_name::<T>().to_string(),
            message: typed.message().map(String::from).or(fallback_message),
        })
    }
}

/// Replaces every integer outside `±MAX_SAFE_INTEGER` with its digit string.
#[must_use]
pub fn preserve_big_integers(value: Value) -> Value {
    match value {
        Value::Number(number) => {
            let literal = number.to_string();
            if is_unsafe_integer(&literal) {
                Value::String(literal)
            } else {
                Value::Number(number)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(preserve_big_integers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, preserve_big_integers(v)))
                .collect(),
        ),
        other => other,
    }
}

fn is_unsafe_integer(literal: &str) -> bool {
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    digits
        .parse::<u64>()
        .map_or(true, |magnitude| magnitude > MAX_SAFE_INTEGER)
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A response together with its decoded body.
#[derive(Clone, Debug)]
pub struct DecodedResponse<T = Value> {
    /// HTTP status code.
    pub status: u16,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// The decoded JSON tree.
    pub json: Value,
    /// The typed body; the tree itself for untyped decoding.
    pub data: T,
    /// Whether the body reported `"status": "ok"`.
    pub success: bool,
}

impl DecodedResponse<Value> {
    /// Decodes a response without a success check.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MalformedResponse`] if the body is not JSON.
    pub fn raw(response: HttpResponse) -> Result<Self, ApiError> {
        let json = decode_json(&response.body)?;
        let success = json.get("status").and_then(Value::as_str) == Some("ok");
        Ok(Self {
            status: response.status,
            data: json.clone(),
            json,
            body: response.body,
            success,
        })
    }
}

impl<T> DecodedResponse<T>
where
    T: ApiResponse + DeserializeOwned,
{
    /// Decodes a response into `T`, failing unless it reports success.
    ///
    /// # Errors
    ///
    /// See [`decode_typed`].
    pub fn typed(response: HttpResponse) -> Result<Self, ApiError> {
        let json = decode_json(&response.body)?;
        let data: T = map_typed(json.clone(), &response.body)?;
        Ok(Self {
            status: response.status,
            body: response.body,
            json,
            data,
            success: true,
        })
    }
}

/// Deserializes a `String` from either a JSON string or a JSON number.
///
/// Use this for identifiers, which arrive as strings once they exceed the
/// safe integer range and as numbers otherwise.
///
/// # Errors
///
/// Fails for values that are neither strings nor numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(StringOrNumber)
}

/// Like [`string_or_number`], accepting `null` or a missing field as `None`.
///
/// # Errors
///
/// Fails for values that are neither strings, numbers nor null.
pub fn option_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(OptionalStringOrNumber)
}

struct StringOrNumber;

impl<'de> Visitor<'de> for StringOrNumber {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

struct OptionalStringOrNumber;

impl<'de> Visitor<'de> for OptionalStringOrNumber {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a string or a number")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        string_or_number(d).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::api::responses::StatusResponse;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_nineteen_digit_integer_kept_as_literal_string() {
        let tree = decode_json(br#"{"media": {"pk": 1862381929234567890}}"#).unwrap();
        assert_eq!(tree["media"]["pk"], json!("1862381929234567890"));
    }

    #[test]
    fn test_safe_integers_stay_numbers() {
        let tree = decode_json(br#"{"a": 9007199254740991, "b": -42, "c": 1.5}"#).unwrap();
        assert!(tree["a"].is_number());
        assert_eq!(tree["b"], -42);
        assert!(tree["c"].is_number());
    }

    #[test]
    fn test_boundary_above_safe_range_becomes_string() {
        let tree = decode_json(br#"[9007199254740992, -9007199254740993]"#).unwrap();
        assert_eq!(tree[0], json!("9007199254740992"));
        assert_eq!(tree[1], json!("-9007199254740993"));
    }

    #[test]
    fn test_integers_beyond_u64_are_preserved() {
        let tree = decode_json(br#"{"id": 123456789012345678901234567890}"#).unwrap();
        assert_eq!(tree["id"], json!("123456789012345678901234567890"));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = decode_json(b"0-1024/4096").unwrap_err();
        match err {
            ApiError::MalformedResponse { body, .. } => assert_eq!(body, "0-1024/4096"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_typed_success() {
        let typed: StatusResponse = decode_typed(br#"{"status": "ok"}"#).unwrap();
        assert!(typed.is_ok());
    }

    #[test]
    fn test_typed_failure_carries_type_and_message() {
        let err = decode_typed::<StatusResponse>(br#"{"status": "fail", "message": "login_required"}"#)
            .unwrap_err();
        match err {
            ApiError::ApiCallFailed { type_name, message } => {
                assert_eq!(type_name, "StatusResponse");
                assert_eq!(message.as_deref(), Some("login_required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_typed_missing_status_is_failure() {
        let err = decode_typed::<StatusResponse>(br#"{"anything": 1}"#).unwrap_err();
        assert!(matches!(err, ApiError::ApiCallFailed { message: None, .. }));
    }

    #[test]
    fn test_raw_decoding_reports_success_flag() {
        let response = HttpResponse::new(404, Default::default(), br#"{"status":"fail"}"#.to_vec());
        let decoded = DecodedResponse::raw(response).unwrap();
        assert_eq!(decoded.status, 404);
        assert!(!decoded.success);
        assert_eq!(decoded.data["status"], "fail");
    }

    #[derive(Deserialize)]
    struct Ids {
        #[serde(deserialize_with = "string_or_number")]
        small: String,
        #[serde(deserialize_with = "string_or_number")]
        big: String,
        #[serde(default, deserialize_with = "option_string_or_number")]
        missing: Option<String>,
        #[serde(default, deserialize_with = "option_string_or_number")]
        null: Option<String>,
    }

    #[test]
    fn test_string_or_number_accepts_both_forms() {
        let tree = decode_json(br#"{"small": 17, "big": 1862381929234567890, "null": null}"#).unwrap();
        let ids: Ids = serde_json::from_value(tree).unwrap();
        assert_eq!(ids.small, "17");
        assert_eq!(ids.big, "1862381929234567890");
        assert!(ids.missing.is_none());
        assert!(ids.null.is_none());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<StatusResponse>(), "StatusResponse");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }
}
