//! Error types for the relay.
//!
//! Three layers of failure are modeled separately:
//!
//! - [`NytError`]: what the upstream client and aggregation service report
//! - [`ApiError`]: what the HTTP boundary turns into a status code and `{"detail": ...}` body
//! - [`ConfigError`]: startup failures while assembling [`crate::config::Settings`]

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure talking to the New York Times API.
#[derive(Error, Debug)]
pub enum NytError {
    /// Upstream answered 429 on every attempt.
    #[error("rate limit exceeded for {url} after {attempts} attempts")]
    RateLimitExceeded { url: String, attempts: u32 },

    /// Upstream answered with a non-2xx status other than 429.
    #[error("upstream returned {status} for {url}: {message}")]
    Upstream {
        url: String,
        status: u16,
        message: String,
    },

    /// Upstream could not be reached, or its response could not be read.
    #[error("upstream unavailable for {url}: {message}")]
    Unavailable { url: String, message: String },
}

impl NytError {
    /// Create an [`NytError::Unavailable`] from any displayable cause.
    pub fn unavailable(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            url: url.into(),
            message: cause.to_string(),
        }
    }

    /// The status class this failure maps to when surfaced on its own.
    pub fn status_code(&self) -> StatusCode {
        match self {
            NytError::RateLimitExceeded { .. }
            | NytError::Upstream { .. }
            | NytError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Short machine-friendly label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NytError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            NytError::Upstream { .. } => "upstream_error",
            NytError::Unavailable { .. } => "upstream_unavailable",
        }
    }
}

/// Error returned by route handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller supplied missing or malformed parameters.
    #[error("{0}")]
    Validation(String),

    /// Anything that went wrong after validation passed.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Wrap an upstream failure with a caller-facing context prefix.
    pub fn internal(context: &str, cause: &NytError) -> Self {
        error!(
            kind = cause.kind(),
            upstream_status_class = cause.status_code().as_u16(),
            error = %cause,
            "{context}"
        );
        Self::Internal(format!("{context}: {cause}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Startup configuration failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_upstream_failures_are_service_unavailable() {
        let errors = [
            NytError::RateLimitExceeded {
                url: "u".into(),
                attempts: 3,
            },
            NytError::Upstream {
                url: "u".into(),
                status: 401,
                message: "Invalid ApiKey".into(),
            },
            NytError::unavailable("u", "connection refused"),
        ];
        for e in errors {
            assert_eq!(e.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[test]
    fn test_internal_message_embeds_cause() {
        let cause = NytError::Upstream {
            url: "https://api.nytimes.com/svc/topstories/v2/arts.json".into(),
            status: 500,
            message: "boom".into(),
        };
        let err = ApiError::internal("Failed to retrieve top stories", &cause);
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to retrieve top stories: upstream returned 500"));
        assert!(msg.ends_with("boom"));
    }

    #[test]
    fn test_api_error_status_codes() {
        let resp = ApiError::Validation("q is required".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = ApiError::Internal("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
