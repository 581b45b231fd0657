//! Error types for Tekst.

use thiserror::Error;

/// Library-level error type for Tekst operations.
#[derive(Error, Debug)]
pub enum TekstError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid YouTube URL")]
    InvalidUrl,

    /// A caption fetch failed for a reason other than "captions
    /// disabled"; the disabled condition is a [`CaptionOutcome`] variant,
    /// not an error.
    ///
    /// [`CaptionOutcome`]: crate::captions::CaptionOutcome
    #[error("Caption fetch failed: {0}")]
    Captions(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Local to a single chunk of the formatting fan-out. Degrades that
    /// chunk to an inline marker instead of failing the request.
    #[error("Chunk formatting failed: {0}")]
    Formatting(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Tekst operations.
pub type Result<T> = std::result::Result<T, TekstError>;
