//! Error types for the harmonization engine.
//!
//! Most failures in this crate never surface as errors: missing configuration
//! and missing metadata degrade to a zero score with a message, and vocabulary
//! lookups degrade to `non_valid`. The variants here cover the few cases that
//! do propagate, plus the I/O and parsing errors of the loading helpers.

use thiserror::Error;

/// Common result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The gatherer produced no values from non-empty input. Signals a
    /// category-definition bug in the plugin and is the only error allowed
    /// to cross the harmonizer boundary.
    #[error("No values for metadata element '{element}' resulted from the homogenization process")]
    Homogenization { element: String },

    /// Configuration loading or validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outbound HTTP failure (wraps reqwest::Error).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A redirect chain did not reach a terminal status within the bound.
    #[error("Redirect limit of {limit} exceeded starting from {url}")]
    TooManyRedirects { url: String, limit: usize },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Remote vocabulary answered with something we cannot use.
    #[error("Vocabulary '{vocabulary}' error: {reason}")]
    Vocabulary { vocabulary: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl Error {
    pub(crate) fn vocabulary(vocabulary: &str, reason: impl Into<String>) -> Self {
        Error::Vocabulary {
            vocabulary: vocabulary.to_string(),
            reason: reason.into(),
        }
    }
}
