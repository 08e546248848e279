//! File system errors

use std::path::Path;

use super::SideloadError;

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> SideloadError {
    SideloadError::IoError {
        message: message.into(),
    }
}

/// Creates an IO error naming the operation and path that failed
pub fn io_at(operation: &str, path: &Path, err: &std::io::Error) -> SideloadError {
    io_error(format!("{operation} '{}': {err}", path.display()))
}

/// Creates a move failed error
pub fn move_failed(from: &Path, to: &Path, reason: impl std::fmt::Display) -> SideloadError {
    SideloadError::MoveFailed {
        from: from.display().to_string(),
        to: to.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates an extraction failed error
pub fn extraction_failed(archive: &Path, reason: impl std::fmt::Display) -> SideloadError {
    SideloadError::ExtractionFailed {
        path: archive.display().to_string(),
        reason: reason.to_string(),
    }
}
