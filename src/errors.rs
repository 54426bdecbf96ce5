use axum::{extract::rejection::JsonRejection, http::StatusCode};
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Entry parameters that cannot identify a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("missing email parameter")]
    MissingEmail,
}

/// Failures reported by a backend gateway, already classified at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate record")]
    Duplicate,

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected backend payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckinError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] GatewayError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SUPABASE_URL is set but SUPABASE_ANON_KEY is missing")]
    MissingAnonKey,

    #[error("invalid SUPABASE_URL {url:?}: must start with http:// or https://")]
    InvalidUrl { url: String },
}
