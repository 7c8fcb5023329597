//! Authentication module for managing the user session and credentials.
//!
//! This module provides:
//! - `SessionManager`: the sign-in/sign-out lifecycle state machine
//! - `CredentialStore` / `KeyringStore`: secure OS-level token storage
//!
//! The stored token is restored and validated once at startup; an
//! unresolvable token is discarded rather than surfaced as an error.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialStore, KeyringStore};
pub use session::{SessionManager, SessionState, SignInError};
