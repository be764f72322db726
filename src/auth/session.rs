//! Per-account identity and login state.
//!
//! This module provides the [`Session`] type, which carries the device
//! identity sent with every call and the account's logged-in flag, and the
//! [`LoginState`] trait the request layer consults before making calls that
//! require authentication.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Answers whether the account is currently authenticated.
///
/// Calls flagged as requiring authentication consult this before any
/// network activity and fail with
/// [`ApiError::LoginRequired`](crate::clients::ApiError::LoginRequired) when
/// it returns `false`.
pub trait LoginState: Send + Sync {
    /// Returns `true` if the account is logged in.
    fn is_logged_in(&self) -> bool;
}

/// Identity and login state for one account.
///
/// The session UUID doubles as the multipart boundary and the `_uuid` form
/// field, so it must stay stable for the lifetime of the session.
///
/// A new session always starts logged out. It only becomes logged in through
/// [`ApiClient::mark_logged_in`](crate::clients::api::ApiClient::mark_logged_in),
/// which checks the cookie store for a valid `csrftoken` first.
///
/// # Thread Safety
///
/// `Session` is `Send + Sync`; the login flag is an atomic so one session can
/// be shared across concurrent calls.
///
/// # Example
///
/// ```rust
/// use appwire::{LoginState, Session};
///
/// let session = Session::new("Instagram 10.3.2 Android (18/4.3; 320dpi; 720x1280)");
/// assert!(!session.is_logged_in());
/// assert_eq!(session.uuid().len(), 36);
/// ```
pub struct Session {
    user_agent: String,
    uuid: String,
    account_id: Option<String>,
    logged_in: AtomicBool,
}

impl Session {
    /// Creates a logged-out session with a freshly generated UUID.
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self::with_uuid(user_agent, uuid::Uuid::new_v4().to_string())
    }

    /// Creates a logged-out session with a known UUID.
    ///
    /// Use this when restoring a previously persisted device identity.
    #[must_use]
    pub fn with_uuid(user_agent: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            uuid: uuid.into(),
            account_id: None,
            logged_in: AtomicBool::new(false),
        }
    }

    /// Sets the numeric account id.
    #[must_use]
    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Returns the device user agent.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the session UUID.
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Returns the account id, if known.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub(crate) fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::SeqCst);
    }
}

impl LoginState for Session {
    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_agent", &self.user_agent)
            .field("uuid", &self.uuid)
            .field("account_id", &self.account_id)
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};
