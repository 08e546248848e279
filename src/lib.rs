//! Sideload - bundle installer and storage reconciler
//!
//! Installs app bundles extracted from archives into a managed store,
//! registers them in a persisted catalog, and keeps the per-app data and tweak
//! folders of the private and shared storage domains consistent with it.
//!
//! The binary in `main.rs` is a thin command line wrapper over this library.

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod conflict;
pub mod domain;
pub mod error;
pub mod installer;
pub mod locator;
pub mod progress;
pub mod reconcile;
pub mod signing;

pub use catalog::{Catalog, CatalogStore};
pub use config::LayoutConfig;
pub use conflict::{ConflictPolicy, ConflictRequest, DecisionResponder, InstallDisposition};
pub use domain::{FolderKind, InstalledApp, PackageManifest, StorageDomain};
pub use error::{Result, SideloadError};
pub use installer::{InstallOptions, InstallOutcome, Installer};
pub use progress::ProgressUnit;
pub use reconcile::StorageReconciler;
pub use signing::SigningAdapter;
