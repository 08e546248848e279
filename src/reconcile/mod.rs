//! Storage reconciliation
//!
//! Keeps per-app folders consistent with the catalog across the private and
//! shared domains. Each operation lists the relevant roots once, computes a
//! [`ReconciliationPlan`] and then executes it, holding the catalog's read
//! side throughout so no install or user edit lands mid-pass. Folders created
//! after the listing are left for the next run.
//!
//! The reconciler never discovers references on its own: whatever the catalog
//! names is protected, including hidden apps.

pub mod plan;
pub mod report;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

pub use plan::{
    FolderMove, ReconciliationPlan, TWEAK_LOADER_ASSET, plan_dangling, plan_domain_migration,
    plan_orphans,
};
pub use report::{RootUsage, StorageReport, storage_report};

use crate::catalog::CatalogStore;
use crate::common::fs::{entry_size, list_names, move_entry, remove_entry};
use crate::config::LayoutConfig;
use crate::domain::{FolderKind, InstalledApp, StorageDomain};
use crate::error::fs::{io_at, move_failed};
use crate::error::{Result, SideloadError};

/// What orphan cleanup is about to delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanSummary {
    pub folders: Vec<String>,
    /// Total size in bytes
    pub size: u64,
}

impl OrphanSummary {
    pub fn count(&self) -> usize {
        self.folders.len()
    }
}

/// Asks before a destructive step
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, orphans: &OrphanSummary) -> Result<bool>;
}

/// Confirmer with a fixed answer, for `-y` and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirmer for FixedAnswer {
    async fn confirm(&self, _orphans: &OrphanSummary) -> Result<bool> {
        Ok(self.0)
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub deleted: usize,
    pub moved_data: usize,
    pub moved_tweaks: usize,
    pub moved_app_group: usize,
    /// Planned moves whose destination already existed
    pub skipped: usize,
    /// Set when the confirmer declined
    pub declined: bool,
}

/// Runs reconciliation passes over a layout and its catalog
pub struct StorageReconciler {
    layout: LayoutConfig,
    catalog: Arc<CatalogStore>,
}

impl StorageReconciler {
    pub fn new(layout: LayoutConfig, catalog: Arc<CatalogStore>) -> Self {
        Self { layout, catalog }
    }

    /// Orphaned private data folders, without deleting anything
    pub async fn orphans(&self) -> Result<OrphanSummary> {
        let catalog = self.catalog.settled().await;
        self.summarize_orphans(&catalog.apps)
    }

    fn summarize_orphans(&self, apps: &[InstalledApp]) -> Result<OrphanSummary> {
        let root = &self.layout.private_data_root;
        let on_disk = list_names(root).map_err(|e| io_at("Failed to list", root, &e))?;
        let plan = plan_orphans(apps, &on_disk);

        let size = plan.delete.iter().map(|name| entry_size(&root.join(name))).sum();
        Ok(OrphanSummary {
            folders: plan.delete.into_iter().collect(),
            size,
        })
    }

    /// Delete private data folders no catalogued app references.
    ///
    /// `confirmer` is consulted whenever there is at least one orphan, and
    /// never when there is none.
    pub async fn clean_orphans(&self, confirmer: &dyn Confirmer) -> Result<ReconcileReport> {
        let catalog = self.catalog.settled().await;
        let summary = self.summarize_orphans(&catalog.apps)?;

        if summary.folders.is_empty() {
            debug!("no orphaned data folders");
            return Ok(ReconcileReport::default());
        }

        if !confirmer.confirm(&summary).await? {
            info!(count = summary.count(), "orphan cleanup declined");
            return Ok(ReconcileReport {
                declined: true,
                ..ReconcileReport::default()
            });
        }

        let mut report = ReconcileReport::default();
        for name in &summary.folders {
            let path = self.layout.private_data_root.join(name);
            remove_entry(&path).map_err(|e| io_at("Failed to remove", &path, &e))?;
            info!(folder = %name, "deleted orphaned data folder");
            report.deleted += 1;
        }
        drop(catalog);

        Ok(report)
    }

    /// Move shared data and tweak folders not used by any shared-storage app
    /// back into the private domain
    pub async fn relocate_dangling(&self) -> Result<ReconcileReport> {
        let catalog = self.catalog.settled().await;

        let shared_data = self.list_root(FolderKind::Data, StorageDomain::Shared)?;
        let shared_tweaks = self.list_root(FolderKind::Tweak, StorageDomain::Shared)?;
        let plan = plan_dangling(&catalog.apps, &shared_data, &shared_tweaks);

        let mut report = ReconcileReport::default();
        for folder in &plan.to_private {
            if !self.move_folder(folder, StorageDomain::Private)? {
                report.skipped += 1;
                continue;
            }
            match folder.kind {
                FolderKind::Data => report.moved_data += 1,
                FolderKind::Tweak => report.moved_tweaks += 1,
                FolderKind::AppGroup => report.moved_app_group += 1,
            }
        }
        drop(catalog);

        info!(
            data = report.moved_data,
            tweaks = report.moved_tweaks,
            skipped = report.skipped,
            "relocated dangling folders"
        );
        Ok(report)
    }

    /// Move the whole app group container into `to`.
    ///
    /// Refuses with [`SideloadError::ReconciliationConflict`] and moves
    /// nothing if `to` already holds anything.
    pub async fn migrate_app_group(&self, to: StorageDomain) -> Result<ReconcileReport> {
        let catalog = self.catalog.settled().await;
        let from = to.other();
        let source_root = self.layout.root_for(FolderKind::AppGroup, from);
        let destination_root = self.layout.root_for(FolderKind::AppGroup, to);

        for root in [source_root, destination_root] {
            fs::create_dir_all(root).map_err(|e| io_at("Failed to create", root, &e))?;
        }

        let source = self.list_root(FolderKind::AppGroup, from)?;
        let destination = self.list_root(FolderKind::AppGroup, to)?;
        let plan = plan_domain_migration(to, &source, &destination).ok_or_else(|| {
            SideloadError::ReconciliationConflict {
                from: from.to_string(),
                to: to.to_string(),
                path: destination_root.display().to_string(),
            }
        })?;

        let moves = match to {
            StorageDomain::Shared => &plan.to_shared,
            StorageDomain::Private => &plan.to_private,
        };
        let mut report = ReconcileReport::default();
        for folder in moves {
            let from_path = source_root.join(&folder.name);
            let to_path = destination_root.join(&folder.name);
            move_entry(&from_path, &to_path).map_err(|e| move_failed(&from_path, &to_path, e))?;
            report.moved_app_group += 1;
        }
        drop(catalog);

        info!(%from, %to, moved = report.moved_app_group, "migrated app group storage");
        Ok(report)
    }

    fn list_root(&self, kind: FolderKind, domain: StorageDomain) -> Result<BTreeSet<String>> {
        let root = self.layout.root_for(kind, domain);
        list_names(root).map_err(|e| io_at("Failed to list", root, &e))
    }

    /// Move one folder into `to`; `false` if the destination was taken
    fn move_folder(&self, folder: &FolderMove, to: StorageDomain) -> Result<bool> {
        let from_path = self.layout.root_for(folder.kind, to.other()).join(&folder.name);
        let to_root = self.layout.root_for(folder.kind, to);
        let to_path = to_root.join(&folder.name);

        if exists(&to_path) {
            warn!(
                folder = %folder.name,
                kind = %folder.kind,
                "folder exists in both domains, leaving it in place"
            );
            return Ok(false);
        }

        fs::create_dir_all(to_root).map_err(|e| io_at("Failed to create", to_root, &e))?;
        move_entry(&from_path, &to_path).map_err(|e| move_failed(&from_path, &to_path, e))?;
        debug!(folder = %folder.name, kind = %folder.kind, %to, "moved folder");
        Ok(true)
    }
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingConfirmer {
        calls: AtomicUsize,
        answer: bool,
    }

    #[async_trait]
    impl Confirmer for CountingConfirmer {
        async fn confirm(&self, _orphans: &OrphanSummary) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    fn setup() -> (TempDir, StorageReconciler) {
        let temp = TempDir::new().unwrap();
        let layout = LayoutConfig::rooted_at(temp.path());
        let catalog = Arc::new(CatalogStore::open(&layout.catalog_path).unwrap());
        (temp, StorageReconciler::new(layout, catalog))
    }

    #[tokio::test]
    async fn test_declined_cleanup_deletes_nothing() {
        let (_temp, reconciler) = setup();
        let orphan = reconciler.layout.private_data_root.join("A");
        fs::create_dir_all(&orphan).unwrap();

        let confirmer = CountingConfirmer {
            calls: AtomicUsize::new(0),
            answer: false,
        };
        let report = reconciler.clean_orphans(&confirmer).await.unwrap();

        assert!(report.declined);
        assert_eq!(report.deleted, 0);
        assert_eq!(confirmer.calls.load(Ordering::SeqCst), 1);
        assert!(orphan.exists());
    }

    #[tokio::test]
    async fn test_missing_roots_are_empty() {
        let (_temp, reconciler) = setup();
        let confirmer = CountingConfirmer {
            calls: AtomicUsize::new(0),
            answer: true,
        };

        assert_eq!(
            reconciler.clean_orphans(&confirmer).await.unwrap(),
            ReconcileReport::default()
        );
        assert_eq!(confirmer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            reconciler.relocate_dangling().await.unwrap(),
            ReconcileReport::default()
        );
    }

    #[tokio::test]
    async fn test_relocation_skips_folder_present_in_both_domains() {
        let (_temp, reconciler) = setup();
        let layout = &reconciler.layout;
        fs::create_dir_all(layout.shared_data_root.join("U1")).unwrap();
        fs::write(layout.shared_data_root.join("U1/marker"), "shared").unwrap();
        fs::create_dir_all(layout.private_data_root.join("U1")).unwrap();

        let report = reconciler.relocate_dangling().await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.moved_data, 0);
        assert!(layout.shared_data_root.join("U1/marker").exists());
    }

    #[tokio::test]
    async fn test_migration_creates_missing_roots() {
        let (_temp, reconciler) = setup();
        let report = reconciler
            .migrate_app_group(StorageDomain::Shared)
            .await
            .unwrap();

        assert_eq!(report.moved_app_group, 0);
        assert!(reconciler.layout.private_app_group_root.is_dir());
        assert!(reconciler.layout.shared_app_group_root.is_dir());
    }
}
