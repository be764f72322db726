//! Account identity, login state and body signing.
//!
//! Login flows themselves live outside this crate. What the request layer
//! needs from them is modelled here:
//!
//! - [`Session`]: device user agent, session UUID and the logged-in flag
//! - [`LoginState`]: the precondition checked before authenticated calls
//! - [`signing`]: HMAC-SHA256 signed bodies for account-mutation endpoints
//!
//! # Example
//!
//! ```rust
//! use appwire::{LoginState, Session};
//! use appwire::auth::signing::signed_body;
//!
//! let session = Session::new("my-device-agent");
//! assert!(!session.is_logged_in());
//!
//! let body = signed_body(r#"{"_uuid":"x"}"#, "app-key");
//! assert!(body.ends_with(r#"{"_uuid":"x"}"#));
//! ```

pub mod session;
pub mod signing;

pub use session::{LoginState, Session};
pub use signing::SignedForm;
