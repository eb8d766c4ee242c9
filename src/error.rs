//! Error types shared by the organizer, the move log and the undo engine.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while organizing a folder or undoing an organization.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The organize target does not exist or is not a directory.
    #[error("Invalid folder: {}", .path.display())]
    InvalidFolder { path: PathBuf },

    /// The move log exists but does not hold a list of move records.
    #[error("Move log {} is corrupt: {reason}", .path.display())]
    CorruptLog { path: PathBuf, reason: String },

    /// There is no move log, or it holds no records.
    #[error("No actions to undo (move log {} is missing or empty)", .path.display())]
    NothingToUndo { path: PathBuf },

    /// A file already occupies the destination and the conflict policy refuses to replace it.
    #[error("Destination already exists: {}", .path.display())]
    Conflict { path: PathBuf },

    /// The path is not valid UTF-8 and cannot be written to the move log.
    #[error("Cannot record {} in the move log: path is not valid UTF-8", .path.display())]
    UnloggablePath { path: PathBuf },

    /// A filesystem call failed.
    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OrganizeError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

/// Result type for organize and undo operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
