/*!
 * Error types for the subburn application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors produced by timestamp parsing and arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// Text that does not follow the expected timestamp or decimal grammar
    #[error("Invalid timestamp '{text}': {reason}")]
    Format {
        /// The offending input text
        text: String,
        /// What was wrong with it
        reason: String,
    },

    /// Arithmetic that would leave the timeline
    #[error("Time out of range: {base_ms}ms {offset_ms:+}ms does not fit on the timeline")]
    Range {
        /// Value the offset was applied to
        base_ms: i128,
        /// Offset that was applied
        offset_ms: i128,
    },
}

impl TimeError {
    pub(crate) fn format(text: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    /// A cue block that does not follow the grammar
    #[error("Malformed cue block {block} (line {line}): {reason}")]
    Parse {
        /// 1-based block index, 0 for the file header
        block: usize,
        /// 1-based line number of the offending line
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Timing arithmetic failed while transforming a track
    #[error("Timing error in cue {cue}: {source}")]
    Timing {
        /// 1-based position of the cue in its track
        cue: usize,
        #[source]
        source: TimeError,
    },

    /// A cue whose end comes before its start
    #[error("Invalid time range: end {end} is before start {start}")]
    InvertedRange {
        /// Formatted start time
        start: String,
        /// Formatted end time
        end: String,
    },
}

/// Errors raised by the external video encoder
#[derive(Error, Debug)]
pub enum EncoderError {
    /// The encoder process could not be launched
    #[error("Failed to launch encoder '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the encoder's output or waiting on it failed
    #[error("Encoder I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The encoder did not finish in time
    #[error("Encoder timed out after {0} seconds")]
    Timeout(u64),

    /// The encoder exited with a failure status
    #[error("Encoder failed with exit code {exit_code:?}: {diagnostics}")]
    Failed {
        exit_code: Option<i32>,
        diagnostics: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from timestamp handling
    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the encoder
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
