//! Storage layout configuration (`sideload.yaml`)
//!
//! Every folder root the installer and reconciler touch is supplied here.
//! Nothing in the core computes these paths on its own.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{FolderKind, StorageDomain};
use crate::error::{Result, SideloadError};

/// Environment variable overriding the base directory
pub const HOME_ENV: &str = "SIDELOAD_HOME";

/// Configuration file name inside the base directory
pub const CONFIG_FILE: &str = "sideload.yaml";

/// Default base directory name under the user's data directory
const HOME_DIR: &str = "sideload";

/// External signing command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Program to run; receives the bundle path as its last argument
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Resolved folder roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutConfig {
    /// Managed store holding installed bundles
    pub bundle_root: PathBuf,
    /// Exclusive scratch space for the running install
    pub staging_root: PathBuf,
    pub private_data_root: PathBuf,
    pub shared_data_root: PathBuf,
    pub private_tweak_root: PathBuf,
    pub shared_tweak_root: PathBuf,
    pub private_app_group_root: PathBuf,
    pub shared_app_group_root: PathBuf,
    /// Persisted catalog file
    pub catalog_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerConfig>,
}

/// On-disk form: every field optional, relative paths resolve against home
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutOverrides {
    bundle_root: Option<PathBuf>,
    staging_root: Option<PathBuf>,
    private_data_root: Option<PathBuf>,
    shared_data_root: Option<PathBuf>,
    private_tweak_root: Option<PathBuf>,
    shared_tweak_root: Option<PathBuf>,
    private_app_group_root: Option<PathBuf>,
    shared_app_group_root: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    signer: Option<SignerConfig>,
}

/// Get the base directory.
///
/// An explicit path wins, then the `SIDELOAD_HOME` environment variable, then the
/// platform data directory (e.g. XDG on Linux) with a `sideload` subdirectory.
pub fn home_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    let base = dirs::data_dir().ok_or(SideloadError::HomeNotFound)?;
    Ok(base.join(HOME_DIR))
}

impl LayoutConfig {
    /// Default layout under `home`
    pub fn rooted_at(home: &Path) -> Self {
        Self {
            bundle_root: home.join("Bundles"),
            staging_root: home.join("Staging"),
            private_data_root: home.join("Data").join("Application"),
            shared_data_root: home.join("Shared").join("Data").join("Application"),
            private_tweak_root: home.join("Tweaks"),
            shared_tweak_root: home.join("Shared").join("Tweaks"),
            private_app_group_root: home.join("Data").join("AppGroup"),
            shared_app_group_root: home.join("Shared").join("Data").join("AppGroup"),
            catalog_path: home.join("catalog.yaml"),
            signer: None,
        }
    }

    /// Load the layout for `home`, applying `sideload.yaml` when present
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = home.join(CONFIG_FILE);
        let mut layout = Self::rooted_at(home);

        if !config_path.exists() {
            return Ok(layout);
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            SideloadError::ConfigParseFailed {
                path: config_path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        layout.apply_yaml(&content, home).map_err(|e| match e {
            SideloadError::ConfigParseFailed { reason, .. } => SideloadError::ConfigParseFailed {
                path: config_path.display().to_string(),
                reason,
            },
            other => other,
        })?;

        Ok(layout)
    }

    fn apply_yaml(&mut self, yaml: &str, home: &Path) -> Result<()> {
        // An empty file deserializes as unit, not as a map
        if yaml.trim().is_empty() {
            return Ok(());
        }
        let overrides: LayoutOverrides = serde_yaml::from_str(yaml)?;

        let resolve = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                home.join(path)
            }
        };

        let slots: [(&mut PathBuf, Option<PathBuf>); 9] = [
            (&mut self.bundle_root, overrides.bundle_root),
            (&mut self.staging_root, overrides.staging_root),
            (&mut self.private_data_root, overrides.private_data_root),
            (&mut self.shared_data_root, overrides.shared_data_root),
            (&mut self.private_tweak_root, overrides.private_tweak_root),
            (&mut self.shared_tweak_root, overrides.shared_tweak_root),
            (&mut self.private_app_group_root, overrides.private_app_group_root),
            (&mut self.shared_app_group_root, overrides.shared_app_group_root),
            (&mut self.catalog_path, overrides.catalog_path),
        ];
        for (slot, value) in slots {
            if let Some(path) = value {
                *slot = resolve(path);
            }
        }

        if overrides.signer.is_some() {
            self.signer = overrides.signer;
        }
        Ok(())
    }

    /// Root holding folders of `kind` in `domain`
    pub fn root_for(&self, kind: FolderKind, domain: StorageDomain) -> &Path {
        match (kind, domain) {
            (FolderKind::Data, StorageDomain::Private) => &self.private_data_root,
            (FolderKind::Data, StorageDomain::Shared) => &self.shared_data_root,
            (FolderKind::Tweak, StorageDomain::Private) => &self.private_tweak_root,
            (FolderKind::Tweak, StorageDomain::Shared) => &self.shared_tweak_root,
            (FolderKind::AppGroup, StorageDomain::Private) => &self.private_app_group_root,
            (FolderKind::AppGroup, StorageDomain::Shared) => &self.shared_app_group_root,
        }
    }

    /// Absolute path of an installed bundle
    pub fn bundle_path(&self, relative_path: &str) -> PathBuf {
        self.bundle_root.join(relative_path)
    }

    /// Like [`bundle_path`](Self::bundle_path), but only for a single plain
    /// path component, so user input cannot point outside the store
    pub fn checked_bundle_path(&self, relative_path: &str) -> Option<PathBuf> {
        let mut components = Path::new(relative_path).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => Some(self.bundle_path(relative_path)),
            _ => None,
        }
    }

    /// All directory roots, labelled for display
    pub fn roots(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("bundles", self.bundle_root.as_path()),
            ("staging", self.staging_root.as_path()),
            ("private data", self.private_data_root.as_path()),
            ("shared data", self.shared_data_root.as_path()),
            ("private tweaks", self.private_tweak_root.as_path()),
            ("shared tweaks", self.shared_tweak_root.as_path()),
            ("private app group", self.private_app_group_root.as_path()),
            ("shared app group", self.shared_app_group_root.as_path()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let layout = LayoutConfig::rooted_at(Path::new("/home/u/sl"));
        assert_eq!(layout.bundle_root, PathBuf::from("/home/u/sl/Bundles"));
        assert_eq!(
            layout.root_for(FolderKind::Data, StorageDomain::Shared),
            Path::new("/home/u/sl/Shared/Data/Application")
        );
        assert_eq!(
            layout.root_for(FolderKind::Tweak, StorageDomain::Private),
            Path::new("/home/u/sl/Tweaks")
        );
        assert!(layout.signer.is_none());
    }

    #[test]
    fn test_checked_bundle_path() {
        let layout = LayoutConfig::rooted_at(Path::new("/sl"));
        assert_eq!(
            layout.checked_bundle_path("a.b.app"),
            Some(PathBuf::from("/sl/Bundles/a.b.app"))
        );
        for bad in ["", "..", "../x.app", "a/b.app", "/etc"] {
            assert!(layout.checked_bundle_path(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn test_load_without_config_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let layout = LayoutConfig::load(temp.path()).unwrap();
        assert_eq!(layout, LayoutConfig::rooted_at(temp.path()));
    }

    #[test]
    fn test_load_applies_overrides() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "bundle_root: store\nshared_tweak_root: /abs/tweaks\nsigner:\n  command: zsign\n  args: [\"-k\", \"key.pem\"]\n",
        )
        .unwrap();

        let layout = LayoutConfig::load(temp.path()).unwrap();
        assert_eq!(layout.bundle_root, temp.path().join("store"));
        assert_eq!(layout.shared_tweak_root, PathBuf::from("/abs/tweaks"));
        assert_eq!(layout.staging_root, temp.path().join("Staging"));
        let signer = layout.signer.unwrap();
        assert_eq!(signer.command, "zsign");
        assert_eq!(signer.args, vec!["-k", "key.pem"]);
    }

    #[test]
    fn test_load_empty_config_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "\n").unwrap();
        assert!(LayoutConfig::load(temp.path()).is_ok());
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "bundle_rot: typo\n").unwrap();

        let err = LayoutConfig::load(temp.path()).unwrap_err();
        assert!(matches!(err, SideloadError::ConfigParseFailed { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    #[serial]
    fn test_home_dir_precedence() {
        let original = std::env::var(HOME_ENV).ok();
        unsafe {
            std::env::set_var(HOME_ENV, "/from/env");
        }

        assert_eq!(
            home_dir(Some(PathBuf::from("/explicit"))).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(home_dir(None).unwrap(), PathBuf::from("/from/env"));

        unsafe {
            if let Some(o) = original {
                std::env::set_var(HOME_ENV, o);
            } else {
                std::env::remove_var(HOME_ENV);
            }
        }
    }
}
