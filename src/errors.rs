// ABOUTME: Error types for the slide-deck application
// ABOUTME: Provides structured error handling for deck assembly, serving and PDF export

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    #[error("HTML parsing error: {0}")]
    HtmlError(String),

    #[error("Headless browser error: {message}")]
    BrowserError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("No slides found: {0}")]
    NoSlidesFoundError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Static server error: {0}")]
    ServerError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("[export] validation failed: {0}")]
    LayoutError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl DeckError {
    /// Wrap a headless browser failure with a message describing the step that failed
    pub fn browser(message: impl Into<String>, err: anyhow::Error) -> Self {
        DeckError::BrowserError {
            message: format!("{}: {}", message.into(), err),
            source: Some(err.into()),
        }
    }
}

// headless_chrome reports everything through anyhow
impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::ConfigError(format!("Invalid JSON: {}", err))
    }
}

impl From<tl::ParseError> for DeckError {
    fn from(err: tl::ParseError) -> Self {
        DeckError::HtmlError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
