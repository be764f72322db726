//! Cookie persistence backends.
//!
//! The store hands its entries to a [`CookiePersistence`] implementation
//! after every response and asks it for the saved entries when loading.
//! Two backends are provided:
//!
//! - [`FileCookieJar`]: a JSON file on disk
//! - [`MemoryCookieJar`]: an in-memory JSON string, for callers that keep
//!   cookies in their own settings storage

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use super::entry::CookieEntry;

/// Errors raised while loading or saving cookies.
#[derive(Debug, Error)]
pub enum CookieError {
    /// Reading or writing the backing file failed.
    #[error("Cookie file '{}' could not be accessed: {source}", .path.display())]
    Io {
        /// Path of the cookie file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The stored cookies are not a valid JSON cookie array.
    #[error("Stored cookies could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes cookies as a JSON array of objects.
///
/// # Errors
///
/// Returns [`CookieError::Json`] if serialization fails.
pub fn encode_cookies(cookies: &[CookieEntry]) -> Result<String, CookieError> {
    Ok(serde_json::to_string(cookies)?)
}

/// Decodes a JSON array of cookie objects. Blank input yields no cookies.
///
/// # Errors
///
/// Returns [`CookieError::Json`] if the input is not a cookie array.
pub fn decode_cookies(json: &str) -> Result<Vec<CookieEntry>, CookieError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}

/// Storage for the cookies of one account.
pub trait CookiePersistence: Send + Sync + fmt::Debug {
    /// Returns the previously saved cookies.
    ///
    /// # Errors
    ///
    /// Returns a [`CookieError`] if the storage cannot be read or decoded.
    fn load_cookies(&self) -> Result<Vec<CookieEntry>, CookieError>;

    /// Replaces the saved cookies.
    ///
    /// # Errors
    ///
    /// Returns a [`CookieError`] if the storage cannot be written.
    fn save_cookies(&self, cookies: &[CookieEntry]) -> Result<(), CookieError>;
}

/// Persists cookies to a JSON file.
///
/// A missing file loads as an empty jar.
#[derive(Clone, Debug)]
pub struct FileCookieJar {
    path: PathBuf,
}

impl FileCookieJar {
    /// Creates a jar backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> CookieError {
        CookieError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CookiePersistence for FileCookieJar {
    fn load_cookies(&self) -> Result<Vec<CookieEntry>, CookieError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => decode_cookies(&json),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save_cookies(&self, cookies: &[CookieEntry]) -> Result<(), CookieError> {
        let json = encode_cookies(cookies)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }
}

/// Persists cookies as a JSON string held in memory.
///
/// # Example
///
/// ```rust
/// use appwire::cookies::{CookiePersistence, MemoryCookieJar};
///
/// let jar = MemoryCookieJar::new(r#"[{"Name":"mid","Value":"x","Domain":"example.com"}]"#);
/// let cookies = jar.load_cookies().unwrap();
/// assert_eq!(cookies[0].name, "mid");
/// ```
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    json: Mutex<String>,
}

impl MemoryCookieJar {
    /// Creates a jar holding previously exported cookie JSON.
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self {
            json: Mutex::new(json.into()),
        }
    }

    /// Returns the current JSON contents, for writing back to external storage.
    #[must_use]
    pub fn contents(&self) -> String {
        self.json
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CookiePersistence for MemoryCookieJar {
    fn load_cookies(&self) -> Result<Vec<CookieEntry>, CookieError> {
        decode_cookies(&self.contents())
    }

    fn save_cookies(&self, cookies: &[CookieEntry]) -> Result<(), CookieError> {
        let json = encode_cookies(cookies)?;
        *self.json.lock().unwrap_or_else(PoisonError::into_inner) = json;
        Ok(())
    }
}
