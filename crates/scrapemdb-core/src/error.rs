//! Error types for scrapemdb
//!
//! This module defines all error types used throughout the library.
//! ScrapeError implements Serialize so a failure can be persisted as a
//! document value (enhanced review loading stores its raw error this way).

use std::path::PathBuf;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for harvesting operations
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Element lookup did not materialize within its timeout
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The schema has no entry for the requested field
    #[error("No schema entry for field: {0}")]
    MissingSchemaEntry(String),

    /// Schema file could not be loaded (unknown selector kind, bad JSON)
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Selector value rejected by the navigator backend
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Page load did not reach a usable state
    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailure { url: String, reason: String },

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Folder cannot be used as an append target
    #[error("Invalid list folder: {0}")]
    InvalidListFolder(String),

    /// Rate limited by the server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Requested page was not found (HTTP 404)
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Capability the navigator backend does not provide
    #[error("Unsupported by this navigator: {0}")]
    Unsupported(String),

    /// Script execution failed inside the page
    #[error("Script failed: {0}")]
    ScriptError(String),

    /// Persisted document could not be parsed
    #[error("Document {} is corrupted: {reason}", path.display())]
    DocumentCorruption { path: PathBuf, reason: String },

    /// Series walk stopped before its declared end
    #[error("Series traversal stopped: {0}")]
    TraversalBreak(String),

    /// No navigator backend could be started
    #[error("Navigator session unavailable: {0}")]
    SessionFailure(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Whether this error is a lookup miss that callers degrade to a sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScrapeError::ElementNotFound(_) | ScrapeError::MissingSchemaEntry(_)
        )
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrapeError::SessionFailure(_))
    }
}

/// Serialize ScrapeError as its display string
impl Serialize for ScrapeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_element_not_found() {
        let error = ScrapeError::ElementNotFound("targetRate".to_string());
        assert_eq!(error.to_string(), "Element not found: targetRate");
    }

    #[test]
    fn test_display_navigation_failure() {
        let error = ScrapeError::NavigationFailure {
            url: "https://example.com/title/tt1/".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Navigation to https://example.com/title/tt1/ failed: timeout"
        );
    }

    #[test]
    fn test_display_document_corruption() {
        let error = ScrapeError::DocumentCorruption {
            path: PathBuf::from("data/main.js"),
            reason: "EOF while parsing".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Document data/main.js is corrupted: EOF while parsing"
        );
    }

    #[test]
    fn test_display_rate_limited() {
        assert_eq!(
            ScrapeError::RateLimited.to_string(),
            "Rate limited - too many requests"
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(ScrapeError::ElementNotFound("x".into()).is_not_found());
        assert!(ScrapeError::MissingSchemaEntry("x".into()).is_not_found());
        assert!(!ScrapeError::RateLimited.is_not_found());
    }

    #[test]
    fn test_only_session_failure_is_fatal() {
        assert!(ScrapeError::SessionFailure("no backend".into()).is_fatal());
        assert!(!ScrapeError::TraversalBreak("next missing".into()).is_fatal());
        assert!(!ScrapeError::NotFound("x".into()).is_fatal());
    }

    #[test]
    fn test_serialize_as_string() {
        let error = ScrapeError::ScriptError("click intercepted".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, "\"Script failed: click intercepted\"");
    }
}
