//! Session lifecycle management.
//!
//! `SessionManager` is the single source of truth for "is someone logged in,
//! and who". It owns a small state machine:
//!
//! - `Loading`: initial state, the stored token has not been checked yet
//! - `Authenticated`: the token resolved to a profile
//! - `Unauthenticated`: no usable credential
//!
//! The credential store and the remote auth service are injected, so the
//! lifecycle can be exercised against in-memory fakes in tests. The token
//! itself only passes through here transiently; the durable copy lives in
//! the credential store and is never logged.

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, AuthApi};
use crate::models::UserProfile;

use super::CredentialStore;

/// Fallback shown when the service gave no structured error detail.
/// Portuguese, matching the locale of the service's own `detail` strings.
const GENERIC_SIGN_IN_ERROR: &str = "Erro ao fazer login";

/// Shown for connection-level failures before any response arrived.
const NETWORK_ERROR_MESSAGE: &str =
    "Não foi possível conectar ao servidor. Verifique sua conexão.";

const BUSY_MESSAGE: &str = "Outra operação de login já está em andamento";

const LOADING_MESSAGE: &str = "A sessão ainda está sendo restaurada";

/// Authentication phase of the running application.
///
/// A profile exists exactly when the state is `Authenticated`; the variant
/// carries it so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Authenticated(UserProfile),
    Unauthenticated,
}

/// Failure result of a sign-in attempt, carrying a message safe to show the
/// user (the service's `detail` payload when available).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SignInError {
    pub message: String,
}

impl SignInError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Owns the authentication state machine and performs the side effects for
/// transitions between signed-in and signed-out.
///
/// One instance exists per running application, constructed at startup and
/// handed to the view layer.
pub struct SessionManager<S, A> {
    store: S,
    api: A,
    state: SessionState,
    /// Guards against interleaved mutating operations when the manager is
    /// reachable from more than one place (e.g. behind a RefCell in the UI).
    in_flight: bool,
}

impl<S: CredentialStore, A: AuthApi> SessionManager<S, A> {
    pub fn new(store: S, api: A) -> Self {
        Self {
            store,
            api,
            state: SessionState::Loading,
            in_flight: false,
        }
    }

    // ===== View-layer contract (read-only) =====

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// True until `restore_session` has resolved. The view layer gates
    /// protected content on this flag.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    // ===== Mutating operations =====

    /// Restore the session from the stored token. Called exactly once, at
    /// startup; later calls are ignored.
    ///
    /// Always resolves to `Authenticated` or `Unauthenticated`. A token that
    /// cannot be resolved - expired, revoked, or unreachable server - is
    /// deleted and treated as absent, so a stale credential can never leave
    /// the app stuck behind the loading screen.
    pub async fn restore_session(&mut self) {
        if !self.is_loading() {
            warn!("restore_session called after startup, ignoring");
            return;
        }
        if self.in_flight {
            return;
        }

        self.in_flight = true;
        self.state = self.resolve_stored_token().await;
        self.in_flight = false;
    }

    async fn resolve_stored_token(&mut self) -> SessionState {
        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No stored token, starting unauthenticated");
                return SessionState::Unauthenticated;
            }
            Err(e) => {
                warn!(error = %e, "Credential store unreadable, starting unauthenticated");
                return SessionState::Unauthenticated;
            }
        };

        match self.api.current_user(&token).await {
            Ok(user) => {
                debug!(user_id = user.id, "Session restored");
                SessionState::Authenticated(user)
            }
            Err(e) => {
                // Transient network failures are indistinguishable from a
                // revoked token here; both discard the credential.
                warn!(error = %e, "Stored token did not resolve, discarding");
                self.discard_token();
                SessionState::Unauthenticated
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On success the token is persisted and the state becomes
    /// `Authenticated`. On failure the credential store and the state are
    /// left as they were, and the returned message is suitable for display.
    ///
    /// `&mut self` already serializes callers; the `in_flight` rejection
    /// only comes into play when the manager is shared through interior
    /// mutability (see the field note).
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), SignInError> {
        if self.in_flight {
            return Err(SignInError::new(BUSY_MESSAGE));
        }
        if self.is_loading() {
            return Err(SignInError::new(LOADING_MESSAGE));
        }

        self.in_flight = true;
        let result = self.authenticate(email, password).await;
        self.in_flight = false;
        result
    }

    async fn authenticate(&mut self, email: &str, password: &str) -> Result<(), SignInError> {
        let token = self
            .api
            .login(email, password)
            .await
            .map_err(|e| SignInError::new(sign_in_message(&e)))?;

        // Snapshot the credential currently on disk; a failure past this
        // point must leave the store exactly as it was, including the valid
        // token of an already-authenticated session being replaced.
        let previous = self.store.get().unwrap_or_else(|e| {
            warn!(error = %e, "Credential store unreadable before persist");
            None
        });

        if let Err(e) = self.store.set(&token) {
            warn!(error = %e, "Failed to persist token");
            return Err(SignInError::new(GENERIC_SIGN_IN_ERROR));
        }

        // Login succeeded but identity resolution is a separate call; if it
        // fails, put the store back so neither a restart nor the current
        // session picks up a credential we never confirmed.
        match self.api.current_user(&token).await {
            Ok(user) => {
                debug!(user_id = user.id, "Signed in");
                self.state = SessionState::Authenticated(user);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed after login, rolling back token");
                match previous {
                    Some(old) => {
                        if let Err(e) = self.store.set(&old) {
                            warn!(error = %e, "Failed to restore previous token");
                        }
                    }
                    None => self.discard_token(),
                }
                Err(SignInError::new(sign_in_message(&e)))
            }
        }
    }

    /// Sign out unconditionally.
    ///
    /// A storage fault cannot keep the user logged in: the delete error is
    /// logged and the in-memory transition happens regardless. Idempotent.
    pub fn sign_out(&mut self) {
        if self.in_flight {
            warn!("sign_out ignored while another operation is in flight");
            return;
        }
        self.discard_token();
        self.state = SessionState::Unauthenticated;
        debug!("Signed out");
    }

    fn discard_token(&mut self) {
        if let Err(e) = self.store.delete() {
            warn!(error = %e, "Failed to delete stored token");
        }
    }
}

/// Map an API failure to the message surfaced by `sign_in`.
fn sign_in_message(err: &ApiError) -> String {
    match err {
        ApiError::Rejected(detail) => detail.clone(),
        ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
        _ => GENERIC_SIGN_IN_ERROR.to_string(),
    }
}
