//! Reconciliation plans
//!
//! Pure functions from a catalog and directory listings to the set of folder
//! operations to perform. Nothing here touches the file system.

use std::collections::BTreeSet;

use crate::domain::{FolderKind, InstalledApp, StorageDomain};

/// Reserved shared tweak asset, never relocated
pub const TWEAK_LOADER_ASSET: &str = "TweakLoader.dylib";

/// One folder to move between domains
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FolderMove {
    pub kind: FolderKind,
    pub name: String,
}

/// Folder operations computed from one catalog snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Private data folders to delete
    pub delete: BTreeSet<String>,
    /// Folders to move from the private into the shared domain
    pub to_shared: Vec<FolderMove>,
    /// Folders to move from the shared into the private domain
    pub to_private: Vec<FolderMove>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.to_shared.is_empty() && self.to_private.is_empty()
    }
}

/// Data folders on disk that no catalogued app references.
///
/// `catalog` must hold hidden apps as well as visible ones.
pub fn plan_orphans(catalog: &[InstalledApp], on_disk: &BTreeSet<String>) -> ReconciliationPlan {
    let referenced: BTreeSet<&str> = catalog
        .iter()
        .filter_map(|app| app.data_uuid.as_deref())
        .collect();

    ReconciliationPlan {
        delete: on_disk
            .iter()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect(),
        ..ReconciliationPlan::default()
    }
}

/// Shared folders not used by any app on shared storage, to be moved back to
/// the private domain.
///
/// The tweak loader asset stays in the shared tweak root.
pub fn plan_dangling(
    catalog: &[InstalledApp],
    shared_data: &BTreeSet<String>,
    shared_tweaks: &BTreeSet<String>,
) -> ReconciliationPlan {
    let shared_apps = || catalog.iter().filter(|app| app.shared);
    let data_in_use: BTreeSet<&str> = shared_apps()
        .filter_map(|app| app.data_uuid.as_deref())
        .collect();
    let tweaks_in_use: BTreeSet<&str> = shared_apps()
        .filter_map(|app| app.tweak_folder.as_deref())
        .collect();

    let data = shared_data
        .iter()
        .filter(|name| !data_in_use.contains(name.as_str()))
        .map(|name| FolderMove {
            kind: FolderKind::Data,
            name: name.clone(),
        });
    let tweaks = shared_tweaks
        .iter()
        .filter(|name| name.as_str() != TWEAK_LOADER_ASSET && !tweaks_in_use.contains(name.as_str()))
        .map(|name| FolderMove {
            kind: FolderKind::Tweak,
            name: name.clone(),
        });

    ReconciliationPlan {
        to_private: data.chain(tweaks).collect(),
        ..ReconciliationPlan::default()
    }
}

/// Move every app group entry into `to`.
///
/// Returns `None` when the destination already has content: the two domains
/// are never merged.
pub fn plan_domain_migration(
    to: StorageDomain,
    source: &BTreeSet<String>,
    destination: &BTreeSet<String>,
) -> Option<ReconciliationPlan> {
    if !destination.is_empty() {
        return None;
    }

    let moves: Vec<FolderMove> = source
        .iter()
        .map(|name| FolderMove {
            kind: FolderKind::AppGroup,
            name: name.clone(),
        })
        .collect();

    let mut plan = ReconciliationPlan::default();
    match to {
        StorageDomain::Shared => plan.to_shared = moves,
        StorageDomain::Private => plan.to_private = moves,
    }
    Some(plan)
}
