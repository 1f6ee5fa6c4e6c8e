use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Type alias for alacena results
pub type AlacenaResult<T> = Result<T, AlacenaError>;

/// Alacena error types using thiserror
///
/// The enum is `Clone` so a single refresh outcome can be handed to every
/// request that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlacenaError {
    #[error("Invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("Unknown expiration status '{label}'")]
    UnknownStatus { label: String },

    #[error("Access token is missing or expired")]
    AuthExpired,

    #[error("Failed to refresh authentication token: {reason}")]
    RefreshFailed { reason: String },

    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Credential storage failed for '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("Token could not be decoded: {reason}")]
    TokenDecode { reason: String },

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Invalid configuration value for '{key}': {reason}")]
    ConfigInvalid { key: String, reason: String },
}

impl AlacenaError {
    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidDate { .. } => ErrorCode::InvalidDate,
            Self::UnknownStatus { .. } => ErrorCode::InvalidStatus,
            Self::AuthExpired => ErrorCode::AuthTokenExpired,
            Self::RefreshFailed { .. } => ErrorCode::AuthRefreshFailed,
            Self::Network { .. } => ErrorCode::NetworkFailed,
            Self::Storage { .. } => ErrorCode::StorageFailed,
            Self::TokenDecode { .. } => ErrorCode::AuthTokenInvalid,
            Self::Api { .. } => ErrorCode::ApiRequestFailed,
            Self::InvalidResponse { .. } => ErrorCode::ApiResponseInvalid,
            Self::ConfigInvalid { .. } => ErrorCode::ConfigInvalid,
        }
    }

    /// Get the category used to decide how the error is handled
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDate { .. } | Self::UnknownStatus { .. } => ErrorCategory::Validation,
            Self::AuthExpired | Self::RefreshFailed { .. } | Self::TokenDecode { .. } => {
                ErrorCategory::Authentication
            }
            Self::Network { .. } => ErrorCategory::Network,
            Self::Storage { .. } => ErrorCategory::Storage,
            Self::Api { status, .. } if *status == 401 || *status == 403 => {
                ErrorCategory::Authentication
            }
            Self::Api { .. } | Self::InvalidResponse { .. } => ErrorCategory::Service,
            Self::ConfigInvalid { .. } => ErrorCategory::Configuration,
        }
    }

    /// Create an invalid date error
    pub fn invalid_date(input: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidDate {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an unknown status label error
    pub fn unknown_status(label: impl Into<String>) -> Self {
        Self::UnknownStatus {
            label: label.into(),
        }
    }

    /// Create a refresh failure error
    pub fn refresh_failed(reason: impl fmt::Display) -> Self {
        Self::RefreshFailed {
            reason: reason.to_string(),
        }
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a storage error
    pub fn storage(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Storage {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a token decode error
    pub fn token_decode(reason: impl fmt::Display) -> Self {
        Self::TokenDecode {
            reason: reason.to_string(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn config_invalid(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ConfigInvalid {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Error codes for different types of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Classifier errors
    InvalidDate,
    InvalidStatus,

    // Authentication errors
    AuthTokenExpired,
    AuthTokenInvalid,
    AuthRefreshFailed,

    // Transport errors
    NetworkFailed,
    ApiRequestFailed,
    ApiResponseInvalid,

    // Local resources
    StorageFailed,
    ConfigInvalid,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code_str = match self {
            ErrorCode::InvalidDate => "INVALID_DATE",
            ErrorCode::InvalidStatus => "INVALID_STATUS",

            ErrorCode::AuthTokenExpired => "AUTH_TOKEN_EXPIRED",
            ErrorCode::AuthTokenInvalid => "AUTH_TOKEN_INVALID",
            ErrorCode::AuthRefreshFailed => "AUTH_REFRESH_FAILED",

            ErrorCode::NetworkFailed => "NETWORK_FAILED",
            ErrorCode::ApiRequestFailed => "API_REQUEST_FAILED",
            ErrorCode::ApiResponseInvalid => "API_RESPONSE_INVALID",

            ErrorCode::StorageFailed => "STORAGE_FAILED",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
        };
        write!(f, "{}", code_str)
    }
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Transport failures, surfaced to the caller and never retried here
    Network,
    /// Token missing, expired, undecodable or rejected
    Authentication,
    /// The remote API answered with an error or an unexpected body
    Service,
    /// Credential store failures
    Storage,
    /// Bad configuration, not recoverable without user action
    Configuration,
    /// Bad input such as an unparsable date
    Validation,
}

impl ErrorCategory {
    /// Returns true if errors in this category end the user's session
    pub fn forces_logout(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}

impl From<reqwest::Error> for AlacenaError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        Self::Network {
            url,
            reason: err.to_string(),
        }
    }
}
