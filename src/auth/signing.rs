//! HMAC body signing for account-mutation endpoints.
//!
//! Some endpoints only accept a "signed body": the lowercase hex
//! HMAC-SHA256 of a JSON payload, keyed with the application signing key,
//! immediately followed by the JSON itself. The signed body travels in a
//! url-encoded form together with the signature key version.
//!
//! # Example
//!
//! ```rust
//! use appwire::auth::signing::{compute_signature, signed_body};
//!
//! let payload = r#"{"_uuid":"abc"}"#;
//! let signature = compute_signature(payload, "app-key");
//! assert_eq!(signature.len(), 64);
//!
//! let body = signed_body(payload, "app-key");
//! assert_eq!(body, format!("{signature}{payload}"));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::ClientConfig;

type HmacSha256 = Hmac<Sha256>;

/// Computes an HMAC-SHA256 signature for the given message.
///
/// The signature is returned as a lowercase hexadecimal string.
///
/// # Note
///
/// This function uses `expect()` internally but this will never panic because
/// HMAC-SHA256 accepts keys of any length.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, key: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Returns the signature of `payload_json` followed by the payload itself.
#[must_use]
pub fn signed_body(payload_json: &str, key: &str) -> String {
    let mut body = compute_signature(payload_json, key);
    body.push_str(payload_json);
    body
}

/// A url-encoded form carrying a signed body.
///
/// # Example
///
/// ```rust
/// use appwire::auth::signing::SignedForm;
///
/// let form = SignedForm::new(r#"{"a":1}"#, "app-key", "4");
/// let encoded = form.encode();
/// assert!(encoded.starts_with("ig_sig_key_version=4&signed_body="));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedForm {
    sig_key_version: String,
    signed_body: String,
}

impl SignedForm {
    /// Signs `payload_json` with `key`.
    #[must_use]
    pub fn new(payload_json: &str, key: &str, sig_key_version: impl Into<String>) -> Self {
        Self {
            sig_key_version: sig_key_version.into(),
            signed_body: signed_body(payload_json, key),
        }
    }

    /// Signs `payload` using the key and key version from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `payload` cannot be serialized.
    pub fn from_payload<T: serde::Serialize + ?Sized>(
        payload: &T,
        config: &ClientConfig,
    ) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(payload)?;
        Ok(Self::new(
            &json,
            config.signing_key().as_ref(),
            config.sig_key_version(),
        ))
    }

    /// Returns the unencoded signed body.
    #[must_use]
    pub fn signed_body(&self) -> &str {
        &self.signed_body
    }

    /// Encodes the form as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "ig_sig_key_version={}&signed_body={}",
            urlencoding::encode(&self.sig_key_version),
            urlencoding::encode(&self.signed_body)
        )
    }
}
