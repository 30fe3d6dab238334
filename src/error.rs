//! Error types for the gapi crate.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Terminal status of a job.
///
/// A job reports exactly one of these when it finishes. `NoError` means every
/// request the job issued succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    #[default]
    NoError,
    /// The reply could not be decoded or had an unsupported content type.
    InvalidResponse,
    /// Transport-level failure (timeout, refused connection, TLS).
    NetworkError,
    /// HTTP 401/403. Tokens are never refreshed by the job.
    AuthError,
    BadRequest,
    NotFound,
    /// HTTP 409, or 412 when an `If-Match` etag did not match.
    Conflict,
    /// HTTP 429. Reported as is, the job does not retry.
    QuotaExceeded,
    ServerError,
    UnknownError,
}

impl ErrorCode {
    /// Map a reply status to an error code, or `None` for success statuses.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }

        let code = match status.as_u16() {
            401 | 403 => ErrorCode::AuthError,
            404 | 410 => ErrorCode::NotFound,
            409 | 412 => ErrorCode::Conflict,
            429 => ErrorCode::QuotaExceeded,
            400..=499 => ErrorCode::BadRequest,
            500..=599 => ErrorCode::ServerError,
            _ => ErrorCode::UnknownError,
        };
        Some(code)
    }

    pub fn is_error(self) -> bool {
        self != ErrorCode::NoError
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::NoError => "no error",
            ErrorCode::InvalidResponse => "invalid response",
            ErrorCode::NetworkError => "network error",
            ErrorCode::AuthError => "authorization error",
            ErrorCode::BadRequest => "bad request",
            ErrorCode::NotFound => "not found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::QuotaExceeded => "quota exceeded",
            ErrorCode::ServerError => "server error",
            ErrorCode::UnknownError => "unknown error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when talking to Google APIs.
#[derive(Error, Debug)]
pub enum GapiError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Failed to read credentials file: {0}")]
    CredentialsFileError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("{kind} has no id")]
    MissingId { kind: &'static str },

    #[error("Operation not supported by {service}: {operation}")]
    Unsupported {
        service: &'static str,
        operation: &'static str,
    },

    #[error("JWT encoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchangeError(String),

    #[error("Job failed ({code}): {message}")]
    JobFailed { code: ErrorCode, message: String },
}

impl GapiError {
    /// The job error code this error is reported as.
    pub fn code(&self) -> ErrorCode {
        match self {
            GapiError::JsonError(_) | GapiError::InvalidResponse(_) => ErrorCode::InvalidResponse,
            GapiError::HttpError(_) => ErrorCode::NetworkError,
            GapiError::AuthenticationError(_)
            | GapiError::JwtError(_)
            | GapiError::TokenExchangeError(_) => ErrorCode::AuthError,
            GapiError::InvalidHeader(_)
            | GapiError::InvalidUrlOrId(_)
            | GapiError::MissingId { .. }
            | GapiError::Unsupported { .. } => ErrorCode::BadRequest,
            GapiError::JobFailed { code, .. } => *code,
            GapiError::CredentialsFileError(_) => ErrorCode::UnknownError,
        }
    }
}

/// Result type alias for GapiError.
pub type Result<T> = std::result::Result<T, GapiError>;
