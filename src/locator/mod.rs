//! Bundle location inside an extracted payload
//!
//! A bundle is a direct child directory of the payload whose name ends in
//! [`BUNDLE_SUFFIX`]. When several candidates exist, they are sorted by name
//! and the first one wins; directory listing order is never relied upon.
//!
//! Once a bundle is in the store, its manifest also records the data folder it
//! uses ([`DATA_UUID_KEY`]), so a bundle that never made it into the catalog
//! can be catalogued again without losing its data.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::PackageManifest;
use crate::error::fs::io_at;
use crate::error::{Result, SideloadError};

/// Directory name suffix that marks a bundle
pub const BUNDLE_SUFFIX: &str = ".app";

/// Manifest file at the bundle root
pub const MANIFEST_FILE: &str = "Info.json";

/// Manifest key holding the data folder of a stored bundle
pub const DATA_UUID_KEY: &str = "SideloadDataUUID";

/// A bundle found in the payload together with its manifest
#[derive(Debug, Clone)]
pub struct LocatedBundle {
    pub path: PathBuf,
    pub manifest: PackageManifest,
}

/// Find the bundle directory inside `payload`
pub fn locate_bundle(payload: &Path) -> Result<PathBuf> {
    let not_found = || SideloadError::BundleNotFound {
        path: payload.display().to_string(),
    };

    let entries = fs::read_dir(payload).map_err(|_| not_found())?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(BUNDLE_SUFFIX))
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        warn!(
            count = candidates.len(),
            chosen = %candidates[0].display(),
            "payload contains several bundles, using the first by name"
        );
    }

    candidates.into_iter().next().ok_or_else(not_found)
}

/// Read and validate the manifest of the bundle at `bundle`
pub fn read_manifest(bundle: &Path) -> Result<PackageManifest> {
    let path = bundle.join(MANIFEST_FILE);
    let content = fs::read_to_string(&path).map_err(|e| SideloadError::ManifestUnreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    PackageManifest::from_json(&content, &path.display().to_string())
}

/// Data folder recorded in the manifest of the stored bundle at `bundle`
pub fn read_data_uuid(bundle: &Path) -> Result<Option<String>> {
    let (_, manifest) = read_manifest_map(bundle)?;
    Ok(manifest
        .get(DATA_UUID_KEY)
        .and_then(Value::as_str)
        .filter(|uuid| !uuid.is_empty())
        .map(str::to_string))
}

/// Record `data_uuid` in the manifest of the stored bundle at `bundle`.
///
/// `None` clears the key. Other keys are kept as they are.
pub fn write_data_uuid(bundle: &Path, data_uuid: Option<&str>) -> Result<()> {
    let (path, mut manifest) = read_manifest_map(bundle)?;
    if manifest.get(DATA_UUID_KEY).and_then(Value::as_str) == data_uuid {
        return Ok(());
    }

    match data_uuid {
        Some(uuid) => {
            manifest.insert(DATA_UUID_KEY.to_string(), Value::String(uuid.to_string()));
        }
        None => {
            manifest.remove(DATA_UUID_KEY);
        }
    }
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&path, json).map_err(|e| io_at("Failed to write manifest", &path, &e))?;
    debug!(bundle = %bundle.display(), data_uuid = ?data_uuid, "recorded data folder in manifest");
    Ok(())
}

fn read_manifest_map(bundle: &Path) -> Result<(PathBuf, Map<String, Value>)> {
    let path = bundle.join(MANIFEST_FILE);
    let unreadable = |reason: String| SideloadError::ManifestUnreadable {
        path: path.display().to_string(),
        reason,
    };
    let content = fs::read_to_string(&path).map_err(|e| unreadable(e.to_string()))?;
    let manifest = serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))?;
    Ok((path, manifest))
}

/// Locate the bundle in `payload` and read its manifest
pub fn locate(payload: &Path) -> Result<LocatedBundle> {
    let path = locate_bundle(payload)?;
    let manifest = read_manifest(&path)?;
    debug!(bundle = %path.display(), identifier = %manifest.identifier, "located bundle");
    Ok(LocatedBundle { path, manifest })
}
