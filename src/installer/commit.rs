//! Moving a located bundle into the managed store
//!
//! Ordering is what keeps the store safe here:
//! 1. when replacing, the old bundle directory is deleted and its catalog
//!    entry dropped, so the move target is vacant;
//! 2. the bundle is moved with a single rename (copy then delete only across
//!    file systems);
//! 3. the new entry is built, inheriting the replaced app's data folder, and
//!    that folder is recorded in the stored bundle's manifest.
//!
//! The entry is *not* added to the catalog here. That waits for signing.

use std::fs;

use tracing::info;

use crate::catalog::CatalogStore;
use crate::common::fs::{move_entry, remove_entry};
use crate::config::LayoutConfig;
use crate::conflict::InstallDisposition;
use crate::domain::InstalledApp;
use crate::error::fs::{io_at, move_failed};
use crate::error::Result;
use crate::locator::{self, LocatedBundle};

/// Commit `bundle` to the store according to `disposition`.
///
/// Returns the entry to catalogue once the bundle is usable.
pub async fn commit_bundle(
    layout: &LayoutConfig,
    catalog: &CatalogStore,
    bundle: &LocatedBundle,
    disposition: &InstallDisposition,
) -> Result<InstalledApp> {
    let relative_path = disposition.relative_path();
    let destination = layout.bundle_path(relative_path);

    if let Some(target) = disposition.replaced() {
        info!(path = %target.relative_path, "removing replaced bundle");
        remove_entry(&destination).map_err(|e| io_at("Failed to remove replaced bundle", &destination, &e))?;
        catalog.remove_by_path(&target.relative_path).await?;
    }

    fs::create_dir_all(&layout.bundle_root)
        .map_err(|e| io_at("Failed to create store", &layout.bundle_root, &e))?;
    move_entry(&bundle.path, &destination).map_err(|e| move_failed(&bundle.path, &destination, e))?;
    info!(
        identifier = %bundle.manifest.identifier,
        path = relative_path,
        "moved bundle into store"
    );

    let mut app = InstalledApp::from_manifest(&bundle.manifest, relative_path);
    if let Some(target) = disposition.replaced() {
        app.data_uuid.clone_from(&target.data_uuid);
    }
    locator::write_data_uuid(&destination, app.data_uuid.as_deref())?;
    Ok(app)
}
