//! Error types shared by request construction and configuration
//!
//! Error taxonomy using thiserror

use thiserror::Error;

/// Errors raised while turning a raw intent into a canonical request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Unknown token: {token}")]
    UnknownToken { token: String },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl RequestError {
    pub fn unknown_token(token: impl Into<String>) -> Self {
        Self::UnknownToken {
            token: token.into(),
        }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: String, reason: String },
}
