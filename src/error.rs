//! Error types (thiserror-based).
//!
//! Only synchronous preconditions end up here. Errors the engine reports
//! about itself travel through the `on_error` callback instead.

use thiserror::Error;

/// Errors raised by loaders and configuration parsing.
#[derive(Error, Debug)]
pub enum WaveError {
    /// A media-element selector matched nothing.
    #[error("Media element not found for selector `{selector}`")]
    MediaElementNotFound { selector: String },

    /// A source value that is neither a path/URL, a binary object nor a media element.
    #[error("Unsupported audio source ({kind}): expected a path/URL string, a binary object or a media element")]
    UnsupportedSource { kind: String },

    /// A reload was requested but no source is configured.
    #[error("No audio source to load")]
    MissingSource,

    /// Malformed configuration document.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, WaveError>;
