//! REST API client module for the PetWalker service.
//!
//! This module provides the `ApiClient` for talking to the PetWalker API:
//! the authentication endpoints (behind the `AuthApi` trait) plus generic
//! bearer-authenticated helpers for domain resources.
//!
//! The API uses JWT bearer token authentication obtained through
//! the `/api/auth/login` endpoint.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthApi};
pub use error::ApiError;
