//! Installed app catalog entry

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::manifest::PackageManifest;
use super::storage::StorageDomain;

/// One installed bundle as recorded in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    /// Bundle identifier from the manifest
    pub identifier: String,

    /// Path of the bundle directory relative to the managed store.
    /// Unique per installed instance.
    pub relative_path: String,

    /// Display name from the manifest
    #[serde(default)]
    pub display_name: String,

    /// Data folder name, assigned by the app on first run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_uuid: Option<String>,

    /// Tweak folder name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweak_folder: Option<String>,

    /// Whether the app keeps its folders in the shared domain
    #[serde(default)]
    pub shared: bool,

    /// Whether launching requires authentication
    #[serde(default)]
    pub locked: bool,

    /// Whether the app is hidden from the regular list
    #[serde(default)]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub url_schemes: BTreeSet<String>,
}

impl InstalledApp {
    /// Create a fresh entry for a bundle stored at `relative_path`.
    ///
    /// The data folder stays unassigned: a new identifier has not used managed
    /// storage yet.
    pub fn from_manifest(manifest: &PackageManifest, relative_path: impl Into<String>) -> Self {
        Self {
            identifier: manifest.identifier.clone(),
            relative_path: relative_path.into(),
            display_name: manifest.display_name.clone(),
            data_uuid: None,
            tweak_folder: None,
            shared: false,
            locked: false,
            hidden: false,
            url_schemes: manifest.url_schemes.clone(),
        }
    }

    /// Domain that holds this app's data and tweak folders
    pub fn storage_domain(&self) -> StorageDomain {
        if self.shared {
            StorageDomain::Shared
        } else {
            StorageDomain::Private
        }
    }

    pub fn handles_scheme(&self, scheme: &str) -> bool {
        self.url_schemes.contains(scheme)
    }
}
