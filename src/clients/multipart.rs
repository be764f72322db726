//! Multipart body encoding.
//!
//! The remote parser is strict about layout, so bodies are assembled by hand
//! rather than through a generic form encoder. For each part, in input order:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="<name>"[; filename="pending_media_<id>.<ext>"]
//! [\r\n<extra header>]...
//! \r\n\r\n<data>\r\n
//! ```
//!
//! followed by a closing `--<boundary>--`.
//!
//! File parts never carry the caller's filename; it is replaced with a
//! freshly minted `pending_media_<upload id>.<ext>` name that keeps only the
//! original extension. A filename without an extension still gets the dot.
//!
//! # Example
//!
//! ```rust
//! use appwire::clients::multipart::{encode_with, MultipartPart};
//!
//! let parts = vec![
//!     MultipartPart::field("upload_id", "1700000000000"),
//!     MultipartPart::file("photo", b"JPEG".to_vec(), "cat.jpg"),
//! ];
//! let body = encode_with(&parts, "B1", "42");
//! let text = String::from_utf8(body).unwrap();
//!
//! assert!(text.contains("filename=\"pending_media_42.jpg\""));
//! assert!(text.ends_with("--B1--"));
//! ```

use std::path::Path;

use chrono::Utc;

use crate::clients::errors::InvalidRequestError;

/// Whether a part carries a plain value or file data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartKind {
    /// A plain form value.
    FormField,
    /// File data with a synthesized filename.
    FileField,
}

/// One part of a multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartPart {
    disposition: String,
    name: String,
    data: Vec<u8>,
    filename: Option<String>,
    headers: Vec<String>,
}

impl MultipartPart {
    /// Creates a plain form field.
    #[must_use]
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            disposition: "form-data".to_string(),
            name: name.into(),
            data: value.into().into_bytes(),
            filename: None,
            headers: Vec::new(),
        }
    }

    /// Creates a file field.
    ///
    /// Only the extension of `filename` reaches the wire.
    #[must_use]
    pub fn file(name: impl Into<String>, data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            disposition: "form-data".to_string(),
            name: name.into(),
            data,
            filename: Some(filename.into()),
            headers: Vec::new(),
        }
    }

    /// Appends an extra header line, emitted verbatim after the disposition.
    #[must_use]
    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    /// Overrides the disposition type (default `form-data`).
    #[must_use]
    pub fn disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = disposition.into();
        self
    }

    /// Returns the part kind.
    #[must_use]
    pub const fn kind(&self) -> PartKind {
        if self.filename.is_some() {
            PartKind::FileField
        } else {
            PartKind::FormField
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn write_to(&self, body: &mut Vec<u8>, boundary: &str, upload_id: &str) {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: {}; name=\"{}\"",
                self.disposition, self.name
            )
            .as_bytes(),
        );

        if let Some(filename) = &self.filename {
            let ext = Path::new(filename)
                .extension()
                .map(|ext| ext.to_string_lossy())
                .unwrap_or_default();
            body.extend_from_slice(
                format!("; filename=\"pending_media_{upload_id}.{ext}\"").as_bytes(),
            );
        }

        for header in &self.headers {
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(header.as_bytes());
        }

        body.extend_from_slice(b"\r\n\r\n");
        body.extend_from_slice(&self.data);
        body.extend_from_slice(b"\r\n");
    }
}

/// Checks that every file part has data.
///
/// # Errors
///
/// Returns [`InvalidRequestError::MissingFileData`] naming the first empty
/// file part.
pub fn validate(parts: &[MultipartPart]) -> Result<(), InvalidRequestError> {
    match parts
        .iter()
        .find(|p| p.kind() == PartKind::FileField && p.data.is_empty())
    {
        Some(part) => Err(InvalidRequestError::MissingFileData {
            name: part.name.clone(),
        }),
        None => Ok(()),
    }
}

/// Encodes `parts` with a freshly generated upload id in file names.
#[must_use]
pub fn encode(parts: &[MultipartPart], boundary: &str) -> Vec<u8> {
    encode_with(parts, boundary, &generate_upload_id())
}

/// Encodes `parts`, using `upload_id` in synthesized file names.
#[must_use]
pub fn encode_with(parts: &[MultipartPart], boundary: &str, upload_id: &str) -> Vec<u8> {
    let capacity = parts
        .iter()
        .map(|p| p.data.len() + p.name.len() + 128)
        .sum::<usize>()
        + boundary.len()
        + 4;
    let mut body = Vec::with_capacity(capacity);

    for part in parts {
        part.write_to(&mut body, boundary, upload_id);
    }
    body.extend_from_slice(format!("--{boundary}--").as_bytes());
    body
}

/// Returns the `Content-Type` header value for a body with `boundary`.
#[must_use]
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Generates an upload id: the current Unix time in milliseconds.
#[must_use]
pub fn generate_upload_id() -> String {
    Utc::now().timestamp_millis().to_string()
}
