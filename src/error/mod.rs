//! Error types and handling for sideload
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Constructors for the file system variants live in [`fs`] so call sites can
//! stay on one line inside `map_err`.

pub mod fs;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for sideload operations
#[derive(Error, Diagnostic, Debug)]
pub enum SideloadError {
    // Archive errors
    #[error("Failed to extract archive '{path}': {reason}")]
    #[diagnostic(
        code(sideload::archive::extraction_failed),
        help("Check that the file is a valid zip archive and that the staging directory is writable")
    )]
    ExtractionFailed { path: String, reason: String },

    // Bundle errors
    #[error("No installable bundle found in '{path}'")]
    #[diagnostic(
        code(sideload::bundle::not_found),
        help("The archive must contain a Payload directory holding a '.app' bundle")
    )]
    BundleNotFound { path: String },

    #[error("Cannot read bundle manifest '{path}': {reason}")]
    #[diagnostic(code(sideload::bundle::manifest_unreadable))]
    ManifestUnreadable { path: String, reason: String },

    // Conflict errors
    #[error("Conflict decision {index} is out of range ({count} options were offered)")]
    #[diagnostic(code(sideload::conflict::invalid_decision))]
    InvalidDecision { index: usize, count: usize },

    #[error("Another install is already running")]
    #[diagnostic(
        code(sideload::install::in_progress),
        help("Wait for the running install to finish before starting another one")
    )]
    InstallInProgress,

    // Store errors
    #[error("Failed to move '{from}' to '{to}': {reason}")]
    #[diagnostic(code(sideload::store::move_failed))]
    MoveFailed {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Signing failed for '{path}': {message}")]
    #[diagnostic(
        code(sideload::signing::failed),
        help("The bundle was kept in the store but not catalogued. Run 'sideload resign <path>' to retry")
    )]
    SigningFailed { path: String, message: String },

    // Catalog errors
    #[error("App not found: {path}")]
    #[diagnostic(
        code(sideload::catalog::app_not_found),
        help("Run 'sideload list --all' to see installed apps and their paths")
    )]
    AppNotFound { path: String },

    #[error("Failed to read catalog '{path}': {reason}")]
    #[diagnostic(code(sideload::catalog::read_failed))]
    CatalogReadFailed { path: String, reason: String },

    #[error("Failed to write catalog '{path}': {reason}")]
    #[diagnostic(code(sideload::catalog::write_failed))]
    CatalogWriteFailed { path: String, reason: String },

    // Reconciliation errors
    #[error("Cannot move {from} storage to {to}: '{path}' is not empty")]
    #[diagnostic(
        code(sideload::reconcile::conflict),
        help("Nothing was moved. Empty the destination first if you want to migrate")
    )]
    ReconciliationConflict {
        from: String,
        to: String,
        path: String,
    },

    // Configuration errors
    #[error("Failed to parse configuration file '{path}': {reason}")]
    #[diagnostic(code(sideload::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Could not determine a home directory for sideload")]
    #[diagnostic(
        code(sideload::config::no_home),
        help("Set SIDELOAD_HOME or pass --home")
    )]
    HomeNotFound,

    // Interaction errors
    #[error("Prompt failed: {message}")]
    #[diagnostic(code(sideload::prompt::failed))]
    PromptFailed { message: String },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(sideload::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for SideloadError {
    fn from(err: std::io::Error) -> Self {
        SideloadError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for SideloadError {
    fn from(err: serde_yaml::Error) -> Self {
        SideloadError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SideloadError {
    fn from(err: serde_json::Error) -> Self {
        SideloadError::ManifestUnreadable {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for SideloadError {
    fn from(err: zip::result::ZipError) -> Self {
        SideloadError::ExtractionFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for SideloadError {
    fn from(err: inquire::InquireError) -> Self {
        SideloadError::PromptFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, SideloadError>;
