//! Core client library for PetWalker, a pet-care scheduling service.
//!
//! This crate owns everything the app's screens share:
//!
//! - [`auth::SessionManager`]: the session lifecycle state machine
//! - [`auth::KeyringStore`]: secure token storage in the OS keychain
//! - [`api::ApiClient`]: HTTP client for the PetWalker REST API
//! - [`models`]: data structures returned by the API
//! - [`config::Config`]: persisted application settings
//!
//! The view layer constructs one [`auth::SessionManager`] at startup with a
//! credential store and an API client, calls `restore_session` once before
//! rendering protected content, and routes on `is_loading` / `is_signed_in`.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthApi};
pub use auth::{CredentialStore, KeyringStore, SessionManager, SessionState, SignInError};
pub use config::Config;
pub use models::UserProfile;
