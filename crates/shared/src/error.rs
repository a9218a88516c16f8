//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Each variant carries a stable machine-readable code next to the message so
/// callers can surface the exact rejection kind.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Stable error code.
        code: &'static str,
        /// Human readable message.
        message: String,
    },

    /// Validation error (rejected before any write).
    #[error("Validation error: {message}")]
    Validation {
        /// Stable error code of the first violation.
        code: &'static str,
        /// Human readable message listing every violation.
        message: String,
    },

    /// Conflict (referenced record, stale version).
    #[error("Conflict: {message}")]
    Conflict {
        /// Stable error code.
        code: &'static str,
        /// Human readable message.
        message: String,
    },

    /// Storage collaborator failure.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation { .. } => 422,
            Self::Conflict { .. } => 409,
            Self::Upstream(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { code, .. }
            | Self::Validation { code, .. }
            | Self::Conflict { code, .. } => *code,
            Self::Upstream(_) => "UPSTREAM_FAILURE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation() -> AppError {
        AppError::Validation {
            code: "BUDGET_IS_INACTIVE",
            message: "msg".into(),
        }
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::NotFound {
                code: "BUDGET_NOT_FOUND",
                message: String::new()
            }
            .status_code(),
            404
        );
        assert_eq!(validation().status_code(), 422);
        assert_eq!(
            AppError::Conflict {
                code: "CONFLICT",
                message: String::new()
            }
            .status_code(),
            409
        );
        assert_eq!(AppError::Upstream(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(validation().error_code(), "BUDGET_IS_INACTIVE");
        assert_eq!(
            AppError::Upstream(String::new()).error_code(),
            "UPSTREAM_FAILURE"
        );
        assert_eq!(
            AppError::Configuration(String::new()).error_code(),
            "CONFIGURATION_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(validation().to_string(), "Validation error: msg");
        assert_eq!(
            AppError::Upstream("timeout".into()).to_string(),
            "Upstream failure: timeout"
        );
    }
}
