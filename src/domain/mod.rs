//! Domain models for sideload
//!
//! This module contains pure domain objects representing the installed catalog,
//! bundle manifests and storage domains. They hold invariants but perform no I/O.

pub mod app;
pub mod manifest;
pub mod storage;

pub use app::InstalledApp;
pub use manifest::PackageManifest;
pub use storage::{FolderKind, StorageDomain};
