use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    StdIoError(#[from] std::io::Error),

    #[error("Failed to write settings to {path}: {source}")]
    SettingsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Invalid input argument: {0}")]
    InvalidInputArgument(String),

    #[error("Invalid game link: {0}")]
    InvalidGameLink(String),

    #[error("No shortcut named '{0}'")]
    ShortcutNotFound(String),

    #[error("Please select a base directory first.")]
    BaseDirectoryNotSet,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to create profile directory {path}: {source}")]
    ProfileCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No terminal emulator available (tried: {0})")]
    NoTerminalAvailable(String),

    #[error("Required tool not found: {0}")]
    ToolUnavailable(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Command execution error: {0}")]
    CommandExecutionError(String),
}

/// Coarse classification reported to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Environment,
    ExternalTool,
    Filesystem,
    Process,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::SettingsWrite { .. } | AppError::SerdeJsonError(_) => {
                ErrorKind::Configuration
            }
            AppError::InvalidInputArgument(_)
            | AppError::InvalidGameLink(_)
            | AppError::ShortcutNotFound(_)
            | AppError::BaseDirectoryNotSet
            | AppError::InvalidPath(_) => ErrorKind::Validation,
            AppError::NoTerminalAvailable(_) => ErrorKind::Environment,
            AppError::ToolUnavailable(_) | AppError::ToolFailed { .. } => ErrorKind::ExternalTool,
            AppError::StdIoError(_) | AppError::ProfileCreation { .. } => ErrorKind::Filesystem,
            AppError::CommandExecutionError(_) => ErrorKind::Process,
        }
    }
}
