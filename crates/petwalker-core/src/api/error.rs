use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The service rejected the request with a structured `detail` payload
    /// (e.g. "Email ou senha incorretos" from the login endpoint).
    #[error("{0}")]
    Rejected(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape used by the PetWalker API: `{"detail": "..."}`.
/// Validation failures carry a structured array instead, which deliberately
/// fails to parse here and falls through to status-based classification.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    detail: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Extract the human-readable `detail` field from an error body, if any.
    fn extract_detail(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorPayload>(body)
            .ok()
            .map(|p| p.detail)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if status.is_client_error() {
            if let Some(detail) = Self::extract_detail(body) {
                return ApiError::Rejected(detail);
            }
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}
