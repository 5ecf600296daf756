//! Error types for the Goals Core library

use thiserror::Error;

/// Result type alias for goal operations
pub type Result<T> = std::result::Result<T, GoalsError>;

/// Main error type for goal operations
#[derive(Error, Debug)]
pub enum GoalsError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Goal not found: {id}")]
    GoalNotFound { id: i64 },

    #[error("Invalid time unit: {value}")]
    InvalidTimeUnit { value: String },

    #[error("Invalid time amount: {value}")]
    InvalidTimeAmount { value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl GoalsError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for GoalsError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::configuration(format!("Invalid YAML: {error}"))
    }
}
