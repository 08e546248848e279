//! Catalog of installed apps (`catalog.yaml`)
//!
//! [`CatalogStore`] is the only way to mutate the catalog. Every mutation takes
//! the write side of one `RwLock`, persists the new catalog, and only then
//! publishes it in memory. Readers either clone a settled [`snapshot`] or hold
//! the read side for a whole pass via [`settled`], which keeps mutations out
//! until they are done.
//!
//! [`snapshot`]: CatalogStore::snapshot
//! [`settled`]: CatalogStore::settled

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

use crate::domain::InstalledApp;
use crate::error::{Result, SideloadError};

/// Installed apps, both visible and hidden
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub apps: Vec<InstalledApp>,
}

impl Catalog {
    /// Parse a catalog from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load from `path`; a missing file is an empty catalog
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let read_failed = |reason: String| SideloadError::CatalogReadFailed {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| read_failed(e.to_string()))?;
        Self::from_yaml(&content).map_err(|e| read_failed(e.to_string()))
    }

    /// Write to `path` through a temporary file and a rename
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_failed = |reason: String| SideloadError::CatalogWriteFailed {
            path: path.display().to_string(),
            reason,
        };

        let yaml = self.to_yaml()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| write_failed(e.to_string()))?;

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_failed(e.to_string()))?;
        file.write_all(yaml.as_bytes())
            .map_err(|e| write_failed(e.to_string()))?;
        file.persist(path).map_err(|e| write_failed(e.to_string()))?;
        Ok(())
    }

    /// Entry stored at `relative_path`
    pub fn find(&self, relative_path: &str) -> Option<&InstalledApp> {
        self.apps.iter().find(|a| a.relative_path == relative_path)
    }

    pub fn visible(&self) -> impl Iterator<Item = &InstalledApp> {
        self.apps.iter().filter(|a| !a.hidden)
    }

    pub fn hidden(&self) -> impl Iterator<Item = &InstalledApp> {
        self.apps.iter().filter(|a| a.hidden)
    }

    /// First app registering `scheme`.
    ///
    /// Visible apps are searched first; hidden apps only when `include_hidden`.
    pub fn find_by_scheme(&self, scheme: &str, include_hidden: bool) -> Option<&InstalledApp> {
        self.visible()
            .find(|a| a.handles_scheme(scheme))
            .or_else(|| {
                if include_hidden {
                    self.hidden().find(|a| a.handles_scheme(scheme))
                } else {
                    None
                }
            })
    }
}

/// Exclusive-access gate over the persisted catalog
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    inner: RwLock<Catalog>,
}

impl CatalogStore {
    /// Open the catalog persisted at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let catalog = Catalog::load(&path)?;
        debug!(path = %path.display(), apps = catalog.apps.len(), "opened catalog");
        Ok(Self {
            path,
            inner: RwLock::new(catalog),
        })
    }

    /// Clone of the catalog as of the last completed mutation
    pub async fn snapshot(&self) -> Catalog {
        self.inner.read().await.clone()
    }

    /// Hold the catalog still for the lifetime of the guard
    pub async fn settled(&self) -> RwLockReadGuard<'_, Catalog> {
        self.inner.read().await
    }

    /// Apply `mutate` to a copy, persist it, then publish it
    async fn mutate<T>(&self, mutate: impl FnOnce(&mut Catalog) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        let value = mutate(&mut next)?;
        next.save(&self.path)?;
        *guard = next;
        Ok(value)
    }

    /// Append `app`, replacing an entry already stored at the same path
    pub async fn add(&self, app: InstalledApp) -> Result<()> {
        debug!(path = %app.relative_path, identifier = %app.identifier, "adding catalog entry");
        self.mutate(|catalog| {
            catalog.apps.retain(|a| a.relative_path != app.relative_path);
            catalog.apps.push(app);
            Ok(())
        })
        .await
    }

    /// Drop the entry stored at `relative_path`, returning it
    pub async fn remove_by_path(&self, relative_path: &str) -> Result<Option<InstalledApp>> {
        debug!(path = relative_path, "removing catalog entry");
        self.mutate(|catalog| {
            let position = catalog
                .apps
                .iter()
                .position(|a| a.relative_path == relative_path);
            Ok(position.map(|i| catalog.apps.remove(i)))
        })
        .await
    }

    /// Edit the entry stored at `relative_path`, returning the result
    pub async fn update(
        &self,
        relative_path: &str,
        edit: impl FnOnce(&mut InstalledApp),
    ) -> Result<InstalledApp> {
        self.mutate(|catalog| {
            let app = catalog
                .apps
                .iter_mut()
                .find(|a| a.relative_path == relative_path)
                .ok_or_else(|| SideloadError::AppNotFound {
                    path: relative_path.to_string(),
                })?;
            edit(app);
            Ok(app.clone())
        })
        .await
    }

    pub async fn set_hidden(&self, relative_path: &str, hidden: bool) -> Result<InstalledApp> {
        self.update(relative_path, |app| app.hidden = hidden).await
    }

    pub async fn set_locked(&self, relative_path: &str, locked: bool) -> Result<InstalledApp> {
        self.update(relative_path, |app| app.locked = locked).await
    }

    pub async fn set_shared(&self, relative_path: &str, shared: bool) -> Result<InstalledApp> {
        self.update(relative_path, |app| app.shared = shared).await
    }

    /// Assign or clear the tweak folder
    pub async fn set_tweak_folder(&self, relative_path: &str, folder: Option<String>) -> Result<InstalledApp> {
        self.update(relative_path, |app| app.tweak_folder = folder).await
    }

    /// Assign or clear the data folder
    pub async fn set_data_uuid(&self, relative_path: &str, uuid: Option<String>) -> Result<InstalledApp> {
        self.update(relative_path, |app| app.data_uuid = uuid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageManifest;
    use tempfile::TempDir;

    fn app(identifier: &str, path: &str) -> InstalledApp {
        let manifest = PackageManifest {
            identifier: identifier.to_string(),
            display_name: identifier.to_string(),
            url_schemes: std::collections::BTreeSet::new(),
        };
        InstalledApp::from_manifest(&manifest, path)
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::load(&temp.path().join("catalog.yaml")).unwrap();
        assert!(catalog.apps.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/catalog.yaml");
        let mut catalog = Catalog::default();
        let mut entry = app("a.b", "a.b.app");
        entry.data_uuid = Some("UUID-1".to_string());
        catalog.apps.push(entry);

        catalog.save(&path).unwrap();
        assert_eq!(Catalog::load(&path).unwrap(), catalog);
    }

    #[test]
    fn test_corrupt_catalog_is_read_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yaml");
        fs::write(&path, "apps: [not, a, list, of, apps").unwrap();

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, SideloadError::CatalogReadFailed { .. }));
    }

    #[test]
    fn test_find_by_scheme_prefers_visible() {
        let mut hidden = app("h", "h.app");
        hidden.hidden = true;
        hidden.url_schemes.insert("shared".to_string());
        hidden.url_schemes.insert("secret".to_string());
        let mut visible = app("v", "v.app");
        visible.url_schemes.insert("shared".to_string());

        let catalog = Catalog {
            apps: vec![hidden, visible],
        };
        assert_eq!(catalog.find_by_scheme("shared", true).unwrap().identifier, "v");
        assert!(catalog.find_by_scheme("secret", false).is_none());
        assert_eq!(catalog.find_by_scheme("secret", true).unwrap().identifier, "h");
    }

    #[tokio::test]
    async fn test_store_mutations_persist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yaml");
        let store = CatalogStore::open(&path).unwrap();

        store.add(app("a.b", "a.b.app")).await.unwrap();
        store.add(app("c.d", "c.d.app")).await.unwrap();
        store.set_hidden("c.d.app", true).await.unwrap();

        let reopened = CatalogStore::open(&path).unwrap().snapshot().await;
        assert_eq!(reopened.apps.len(), 2);
        assert!(reopened.find("c.d.app").unwrap().hidden);

        let removed = store.remove_by_path("a.b.app").await.unwrap();
        assert_eq!(removed.unwrap().identifier, "a.b");
        assert!(store.remove_by_path("a.b.app").await.unwrap().is_none());
        assert_eq!(Catalog::load(&path).unwrap().apps.len(), 1);
    }

    #[tokio::test]
    async fn test_add_replaces_same_path() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::open(temp.path().join("catalog.yaml")).unwrap();

        store.add(app("a.b", "a.b.app")).await.unwrap();
        let mut again = app("a.b", "a.b.app");
        again.locked = true;
        store.add(again).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.apps.len(), 1);
        assert!(snapshot.apps[0].locked);
    }

    #[tokio::test]
    async fn test_folder_assignments() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::open(temp.path().join("catalog.yaml")).unwrap();
        store.add(app("a.b", "a.b.app")).await.unwrap();

        store.set_shared("a.b.app", true).await.unwrap();
        store
            .set_tweak_folder("a.b.app", Some("tweaks-1".to_string()))
            .await
            .unwrap();
        let updated = store
            .set_data_uuid("a.b.app", Some("UUID-9".to_string()))
            .await
            .unwrap();

        assert!(updated.shared);
        assert_eq!(updated.tweak_folder.as_deref(), Some("tweaks-1"));
        assert_eq!(updated.data_uuid.as_deref(), Some("UUID-9"));
    }

    #[tokio::test]
    async fn test_update_unknown_path() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::open(temp.path().join("catalog.yaml")).unwrap();

        let err = store.set_locked("nope.app", true).await.unwrap_err();
        assert!(matches!(err, SideloadError::AppNotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_memory_unchanged() {
        let temp = TempDir::new().unwrap();
        // a directory where the catalog file should be makes the rename fail
        let path = temp.path().join("catalog.yaml");
        fs::create_dir_all(path.join("occupied")).unwrap();
        let store = CatalogStore {
            path: path.clone(),
            inner: RwLock::new(Catalog::default()),
        };

        assert!(store.add(app("a.b", "a.b.app")).await.is_err());
        assert!(store.snapshot().await.apps.is_empty());
    }
}
