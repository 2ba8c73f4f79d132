use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients as a structured `{"detail": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "detail": message }));
        (status, body).into_response()
    }
}

/// Failures talking to a hosted collaborator (embedding, generation, vector index).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: no API key configured")]
    MissingCredentials { provider: &'static str },
    #[error("{provider}: authentication failed")]
    AuthFailed { provider: &'static str },
    #[error("{provider}: rate limited")]
    RateLimited { provider: &'static str },
    #[error("{provider}: request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },
    #[error("{provider}: HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider}: invalid response: {message}")]
    ResponseParse {
        provider: &'static str,
        message: String,
    },
    #[error("{provider}: {message}")]
    InvalidRequest {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(provider: &'static str, status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::AuthFailed { provider },
            429 => ProviderError::RateLimited { provider },
            code => ProviderError::Status {
                provider,
                status: code,
                body,
            },
        }
    }

    pub fn request(provider: &'static str, err: reqwest::Error) -> Self {
        ProviderError::Request {
            provider,
            message: err.to_string(),
        }
    }

    pub fn parse<E: std::fmt::Display>(provider: &'static str, err: E) -> Self {
        ProviderError::ResponseParse {
            provider,
            message: err.to_string(),
        }
    }

    /// Whether a later attempt may succeed without any change on our side.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } | ProviderError::Request { .. } => true,
            ProviderError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config at '{path}': {reason}")]
    Invalid { path: String, reason: String },
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse config: {0}")]
    Parse(String),
}
