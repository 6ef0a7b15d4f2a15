// src/error.rs

//! Unified error handling for the harvester.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// A search page could not be fetched even after retrying
    #[error("Page at offset {start} failed after {attempts} attempts: {message}")]
    Fetch {
        start: usize,
        attempts: u32,
        message: String,
    },

    /// Markup did not match the expected search-result structure
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Submission date of a result entry could not be resolved
    #[error("Unparseable submission date {raw:?} for {url}")]
    Date { url: String, raw: String },

    /// Translation of a record failed
    #[error("Translation failed for {context}: {message}")]
    Translate { context: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The run was cancelled before completing
    #[error("Run cancelled")]
    Cancelled,
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error for an exhausted page request.
    pub fn fetch(start: usize, attempts: u32, message: impl fmt::Display) -> Self {
        Self::Fetch {
            start,
            attempts,
            message: message.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a date resolution error.
    pub fn date(url: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Date {
            url: url.into(),
            raw: raw.into(),
        }
    }

    /// Create a translation error with record context.
    pub fn translate(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Translate {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
