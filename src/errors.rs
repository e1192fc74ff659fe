/*!
 * Error types for the subclip application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;
use thiserror::Error;

/// Errors raised by the pure timing and caption pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// A timecode string could not be converted to seconds
    #[error("Invalid timecode '{timecode}': {reason}")]
    InvalidTimecode {
        /// The offending input
        timecode: String,
        /// What was wrong with it
        reason: String,
    },

    /// A cue cannot be turned into an overlay
    #[error("Invalid cue #{index}: {reason}")]
    InvalidCue {
        /// Position of the cue in the stream being processed
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// An interval whose bounds are unusable
    #[error("Invalid interval {from} -> {to}: {reason}")]
    InvalidInterval {
        from: String,
        to: String,
        reason: String,
    },
}

impl SubtitleError {
    pub(crate) fn timecode(timecode: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTimecode {
            timecode: timecode.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur when talking to the external media tools
#[derive(Error, Debug)]
pub enum MediaError {
    /// The tool binary could not be spawned
    #[error("{tool} could not be started: {message}")]
    ToolNotFound { tool: String, message: String },

    /// The tool ran but reported failure
    #[error("{tool} failed: {message}")]
    CommandFailed { tool: String, message: String },

    /// The tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    /// No encoding satisfied the selection rules
    #[error("No suitable video format found (need a format with an audio track)")]
    NoSuitableFormat,

    /// The source has no captions in the requested language
    #[error("No captions available for language '{language}'")]
    NoCaptions { language: String },

    /// Filesystem error around a tool invocation
    #[error("I/O error: {0}")]
    Io(String),

    /// Tool output could not be understood
    #[error("Failed to parse tool output: {0}")]
    Parse(String),

    /// Fetched captions were malformed
    #[error("Caption data error: {0}")]
    Subtitle(#[from] SubtitleError),
}

impl From<std::io::Error> for MediaError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Pipeline stages that can abort a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Metadata,
    Download,
    Extraction,
    Concatenation,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Metadata => "metadata",
            Stage::Download => "download",
            Stage::Extraction => "extraction",
            Stage::Concatenation => "concatenation",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the caption pipeline
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from a media collaborator outside a named stage
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// A collaborator failure that aborted the named stage
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: MediaError,
    },

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Wrap a collaborator failure with the stage it aborted
    pub fn at(stage: Stage) -> impl FnOnce(MediaError) -> AppError {
        move |source| AppError::Stage { stage, source }
    }

    /// Stage that failed, when the error came from one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AppError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
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
