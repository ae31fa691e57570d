//! Error types and handling for the `SolarMap` crate

use thiserror::Error;

/// Main error type for the `SolarMap` crate
#[derive(Error, Debug)]
pub enum SolarMapError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Climatology API unreachable, non-success status or unusable body
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Report generation refused or failed
    #[error("Export error: {message}")]
    Export { message: String },

    /// Static city/district data is missing or inconsistent
    #[error("Reference data error: {message}")]
    ReferenceData { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SolarMapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new export error
    pub fn export<S: Into<String>>(message: S) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Create a new reference data error
    pub fn reference_data<S: Into<String>>(message: S) -> Self {
        Self::ReferenceData {
            message: message.into(),
        }
    }

    /// Whether this error came from the climatology API
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SolarMapError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            SolarMapError::UpstreamUnavailable { .. } => {
                "Unable to reach NASA POWER. Please check your internet connection.".to_string()
            }
            SolarMapError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            SolarMapError::Export { message } => message.clone(),
            SolarMapError::ReferenceData { .. } => {
                "City reference data could not be loaded.".to_string()
            }
            SolarMapError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
