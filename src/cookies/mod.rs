//! Session cookie storage.
//!
//! The [`CookieStore`] is the single owner of session continuity for one
//! account. The transport reads it to build the `Cookie` header of every
//! request and merges every response's `Set-Cookie` headers back into it,
//! then persists it through a [`CookiePersistence`] backend.
//!
//! Entries are keyed by `(name, domain)`; a later directive for the same key
//! replaces the earlier one, and an already-expired directive deletes it.
//!
//! # Login Signal
//!
//! The account counts as authenticated only while an unexpired `csrftoken`
//! cookie for the API host is present. See
//! [`CookieStore::has_valid_csrf_token`].
//!
//! # Example
//!
//! ```rust
//! use appwire::cookies::CookieStore;
//!
//! let store = CookieStore::in_memory();
//! store.merge_set_cookie_headers(["csrftoken=abc; Path=/"], "i.instagram.com");
//!
//! assert!(store.has_valid_csrf_token("i.instagram.com"));
//! assert_eq!(store.csrf_token("i.instagram.com").as_deref(), Some("abc"));
//! assert_eq!(
//!     store.cookie_header("i.instagram.com", "/api/v1/", true).as_deref(),
//!     Some("csrftoken=abc")
//! );
//! ```

mod entry;
mod persistence;

pub use entry::{normalize_domain, CookieEntry};
pub use persistence::{
    decode_cookies, encode_cookies, CookieError, CookiePersistence, FileCookieJar, MemoryCookieJar,
};

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::config::constants::CSRF_COOKIE_NAME;

type CookieKey = (String, String);

/// Cookies for one account, shared by every request it makes.
///
/// Reads and writes go through an `RwLock`, so concurrent calls may build
/// request headers in parallel while response merges are serialized.
///
/// # Thread Safety
///
/// `CookieStore` is `Send + Sync`.
#[derive(Debug)]
pub struct CookieStore {
    cookies: RwLock<BTreeMap<CookieKey, CookieEntry>>,
    persistence: Box<dyn CookiePersistence>,
}

// Verify CookieStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CookieStore>();
};

impl CookieStore {
    /// Creates an empty store backed by `persistence`.
    ///
    /// Call [`load`](Self::load) to restore saved cookies.
    #[must_use]
    pub fn new(persistence: impl CookiePersistence + 'static) -> Self {
        Self {
            cookies: RwLock::new(BTreeMap::new()),
            persistence: Box::new(persistence),
        }
    }

    /// Creates an empty store backed by a [`MemoryCookieJar`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryCookieJar::default())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<CookieKey, CookieEntry>> {
        self.cookies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<CookieKey, CookieEntry>> {
        self.cookies.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the store's contents with the persisted cookies.
    ///
    /// Expired entries are dropped. If the stored data cannot be read or
    /// decoded the store is left empty, which forces a logged-out state.
    ///
    /// Returns the number of cookies restored.
    pub fn load(&self) -> usize {
        let loaded = match self.persistence.load_cookies() {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore cookies, starting with an empty jar");
                Vec::new()
            }
        };

        let now = Utc::now();
        let mut cookies = self.write();
        cookies.clear();
        for entry in loaded.into_iter().filter(|c| !c.is_expired(now)) {
            cookies.insert(key_of(&entry), entry);
        }
        cookies.len()
    }

    /// Replaces the store's contents with cookies decoded from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::Json`] if `json` is not a cookie array. The
    /// store is emptied in that case.
    pub fn import_json(&self, json: &str) -> Result<usize, CookieError> {
        let decoded = decode_cookies(json);
        let mut cookies = self.write();
        cookies.clear();
        let now = Utc::now();
        for entry in decoded?.into_iter().filter(|c| !c.is_expired(now)) {
            cookies.insert(key_of(&entry), entry);
        }
        Ok(cookies.len())
    }

    /// Exports the unexpired cookies as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CookieError> {
        encode_cookies(&self.entries())
    }

    /// Writes the unexpired cookies to the persistence backend.
    ///
    /// # Errors
    ///
    /// Returns a [`CookieError`] if the backend fails.
    pub fn save(&self) -> Result<(), CookieError> {
        self.persistence.save_cookies(&self.entries())
    }

    /// Merges `Set-Cookie` header values received from `request_host`.
    ///
    /// Later entries for the same `(name, domain)` win. Expired directives
    /// delete the matching entry. Unparseable headers, and headers whose
    /// `Domain` does not cover `request_host`, are ignored.
    pub fn merge_set_cookie_headers<'a>(
        &self,
        headers: impl IntoIterator<Item = &'a str>,
        request_host: &str,
    ) {
        let now = Utc::now();
        let mut cookies = self.write();
        for header in headers {
            let Some(entry) = CookieEntry::parse_set_cookie(header, request_host, now) else {
                tracing::debug!(header, "Ignoring malformed or foreign Set-Cookie header");
                continue;
            };
            if entry.is_expired(now) {
                cookies.remove(&key_of(&entry));
            } else {
                cookies.insert(key_of(&entry), entry);
            }
        }
    }

    /// Inserts or replaces a single cookie.
    pub fn insert(&self, entry: CookieEntry) {
        self.write().insert(key_of(&entry), entry);
    }

    /// Builds the `Cookie` header for a request to `host` and `path`.
    ///
    /// Returns `None` when no stored cookie applies.
    #[must_use]
    pub fn cookie_header(&self, host: &str, path: &str, secure: bool) -> Option<String> {
        let now = Utc::now();
        let pairs: Vec<String> = self
            .read()
            .values()
            .filter(|c| !c.is_expired(now))
            .filter(|c| c.matches_domain(host) && c.matches_path(path))
            .filter(|c| secure || !c.secure)
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Returns the value of the unexpired `csrftoken` cookie for `api_host`.
    #[must_use]
    pub fn csrf_token(&self, api_host: &str) -> Option<String> {
        let now = Utc::now();
        self.read()
            .values()
            .find(|c| c.name == CSRF_COOKIE_NAME && c.matches_domain(api_host) && !c.is_expired(now))
            .map(|c| c.value.clone())
    }

    /// Returns `true` if an unexpired `csrftoken` cookie exists for `api_host`.
    #[must_use]
    pub fn has_valid_csrf_token(&self, api_host: &str) -> bool {
        self.csrf_token(api_host).is_some()
    }

    /// Returns a snapshot of the unexpired cookies.
    #[must_use]
    pub fn entries(&self) -> Vec<CookieEntry> {
        let now = Utc::now();
        self.read()
            .values()
            .filter(|c| !c.is_expired(now))
            .cloned()
            .collect()
    }

    /// Returns the number of stored cookies, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the store holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Removes every cookie.
    pub fn clear(&self) {
        self.write().clear();
    }
}

fn key_of(entry: &CookieEntry) -> CookieKey {
    (entry.name.clone(), entry.domain.clone())
}
