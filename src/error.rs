//! Error types and handling for the `CitySense` service

use thiserror::Error;

/// Main error type for the `CitySense` service
#[derive(Error, Debug)]
pub enum CitySenseError {
    /// A forecast document lacks a value the risk engine needs
    #[error("Incomplete forecast data: {field}")]
    DataIncomplete { field: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// The language model failed or its reply was unusable
    #[error("AI analysis failed: {message}")]
    Narrative { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Requested entity does not exist (or is not visible to the caller)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Report store errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl CitySenseError {
    /// Create a new data-incomplete error naming the missing field
    pub fn data_incomplete<S: Into<String>>(field: S) -> Self {
        Self::DataIncomplete {
            field: field.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new narrative analysis error
    pub fn narrative<S: Into<String>>(message: S) -> Self {
        Self::Narrative {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CitySenseError::DataIncomplete { .. } => {
                "Weather data for this location is incomplete.".to_string()
            }
            CitySenseError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CitySenseError::Api { .. } => {
                "Unable to reach an external service. Please try again later.".to_string()
            }
            CitySenseError::Narrative { .. } => {
                "AI analysis failed. Please try again later.".to_string()
            }
            CitySenseError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            CitySenseError::NotFound { message } => message.clone(),
            CitySenseError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            CitySenseError::Storage { .. } => {
                "Report storage is unavailable. Please try again later.".to_string()
            }
            CitySenseError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            CitySenseError::General { message } => message.clone(),
        }
    }
}

impl From<fjall::Error> for CitySenseError {
    fn from(err: fjall::Error) -> Self {
        CitySenseError::storage(err.to_string())
    }
}

impl From<postcard::Error> for CitySenseError {
    fn from(err: postcard::Error) -> Self {
        CitySenseError::storage(format!("encoding failed: {err}"))
    }
}

impl From<reqwest_middleware::Error> for CitySenseError {
    fn from(err: reqwest_middleware::Error) -> Self {
        CitySenseError::api(err.to_string())
    }
}

impl From<reqwest::Error> for CitySenseError {
    fn from(err: reqwest::Error) -> Self {
        CitySenseError::api(err.to_string())
    }
}
