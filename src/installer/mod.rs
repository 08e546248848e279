//! Install pipeline
//!
//! An install runs extraction, location, conflict resolution, commit and
//! signing in that order, and publishes the catalog entry last:
//!
//! - errors before the commit leave the store untouched (the staging
//!   directory is discarded, so the whole install can simply be retried);
//! - cancelling the conflict decision is a logged no-op, not an error;
//! - once the commit starts it runs to completion or failure;
//! - a signing failure leaves the bundle in the store but out of the catalog,
//!   recoverable through [`Installer::resign`].
//!
//! Only one pipeline runs at a time: every operation that writes the staging
//! directory or moves bundles holds the installer's gate.

pub mod commit;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::archive::extract_in_background;
use crate::catalog::CatalogStore;
use crate::common::fs::{list_names, remove_entry};
use crate::config::LayoutConfig;
use crate::conflict::{self, DecisionResponder, InstallDisposition, Resolution};
use crate::domain::InstalledApp;
use crate::error::fs::io_at;
use crate::error::{Result, SideloadError};
use crate::locator::{self, BUNDLE_SUFFIX, LocatedBundle};
use crate::progress::{ProgressUnit, TOTAL_UNITS};
use crate::signing::SigningAdapter;

/// Share of the install progress taken by extraction
pub const EXTRACTION_WEIGHT: u64 = 80;

/// Share of the install progress taken by signing
pub const SIGNING_WEIGHT: u64 = 20;

/// Options for installation
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Re-sign even if the bundle looks signed already
    pub force_sign: bool,
}

/// Terminal state of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(InstalledApp),
    /// The conflict decision was cancelled; nothing changed
    Cancelled,
}

/// Installs bundles into the managed store and owns the install gate
pub struct Installer {
    layout: LayoutConfig,
    catalog: Arc<CatalogStore>,
    responder: Arc<dyn DecisionResponder>,
    signer: Arc<dyn SigningAdapter>,
    gate: Mutex<()>,
}

impl Installer {
    pub fn new(
        layout: LayoutConfig,
        catalog: Arc<CatalogStore>,
        responder: Arc<dyn DecisionResponder>,
        signer: Arc<dyn SigningAdapter>,
    ) -> Self {
        Self {
            layout,
            catalog,
            responder,
            signer,
            gate: Mutex::new(()),
        }
    }

    /// Install the bundle in `archive`, waiting for any running install first.
    ///
    /// `progress` receives an extraction child weighted 80 and a signing child
    /// weighted 20.
    pub async fn install(
        &self,
        archive: &Path,
        progress: &ProgressUnit,
        options: InstallOptions,
    ) -> Result<InstallOutcome> {
        let _running = self.gate.lock().await;
        self.run(archive, progress, options).await
    }

    /// Like [`install`](Self::install), but rejects instead of queueing when an
    /// install is already running
    pub async fn try_install(
        &self,
        archive: &Path,
        progress: &ProgressUnit,
        options: InstallOptions,
    ) -> Result<InstallOutcome> {
        let Ok(_running) = self.gate.try_lock() else {
            return Err(SideloadError::InstallInProgress);
        };
        self.run(archive, progress, options).await
    }

    async fn run(
        &self,
        archive: &Path,
        progress: &ProgressUnit,
        options: InstallOptions,
    ) -> Result<InstallOutcome> {
        info!(archive = %archive.display(), "installing");

        let extraction = ProgressUnit::discrete();
        progress.add_child(&extraction, EXTRACTION_WEIGHT);
        let extracted = extract_in_background(
            archive.to_path_buf(),
            self.layout.staging_root.clone(),
            extraction,
        )
        .await;
        let payload = match extracted {
            Ok(payload) => payload,
            Err(e) => {
                self.discard_staging();
                return Err(e);
            }
        };

        let (bundle, disposition) = match self.prepare(&payload).await {
            Ok(Some(prepared)) => prepared,
            Ok(None) => {
                info!(archive = %archive.display(), "install cancelled at conflict decision");
                self.discard_staging();
                return Ok(InstallOutcome::Cancelled);
            }
            Err(e) => {
                self.discard_staging();
                return Err(e);
            }
        };

        let committed = commit::commit_bundle(&self.layout, &self.catalog, &bundle, &disposition).await;
        self.discard_staging();
        let app = committed?;

        let signing = ProgressUnit::discrete();
        progress.add_child(&signing, SIGNING_WEIGHT);
        self.sign(&app, options.force_sign, &signing).await?;

        self.catalog.add(app.clone()).await?;
        info!(identifier = %app.identifier, path = %app.relative_path, "installed");
        Ok(InstallOutcome::Installed(app))
    }

    /// Locate the bundle and settle where it goes. `None` means cancelled.
    async fn prepare(&self, payload: &Path) -> Result<Option<(LocatedBundle, InstallDisposition)>> {
        let bundle = locator::locate(payload)?;
        let identifier = bundle.manifest.identifier.clone();
        let snapshot = self.catalog.snapshot().await;

        let resolution = conflict::resolve(
            &identifier,
            &snapshot.apps,
            &self.layout.bundle_root,
            Utc::now().timestamp(),
        );

        let disposition = match resolution {
            Resolution::Immediate(disposition) => disposition,
            Resolution::NeedsDecision(request) => {
                info!(
                    identifier = %identifier,
                    options = request.options.len(),
                    "identifier already installed, waiting for a decision"
                );
                match self.responder.decide(&request).await? {
                    Some(index) => request.choose(index)?,
                    None => return Ok(None),
                }
            }
        };

        Ok(Some((bundle, disposition)))
    }

    async fn sign(&self, app: &InstalledApp, force: bool, progress: &ProgressUnit) -> Result<()> {
        let bundle_path = self.layout.bundle_path(&app.relative_path);
        self.signer
            .sign(&bundle_path, force, progress)
            .await
            .map_err(|e| {
                let message = match e {
                    SideloadError::SigningFailed { message, .. } => message,
                    other => other.to_string(),
                };
                warn!(
                    path = %app.relative_path,
                    %message,
                    "signing failed, bundle kept in store but not catalogued"
                );
                SideloadError::SigningFailed {
                    path: app.relative_path.clone(),
                    message,
                }
            })
    }

    /// Sign the stored bundle at `relative_path` again.
    ///
    /// A bundle left uncatalogued by a failed signing is catalogued on success,
    /// with the data folder recorded in its manifest; a catalogued one keeps
    /// its entry as is.
    pub async fn resign(
        &self,
        relative_path: &str,
        force: bool,
        progress: &ProgressUnit,
    ) -> Result<InstalledApp> {
        let _running = self.gate.lock().await;

        let bundle_path = self
            .layout
            .checked_bundle_path(relative_path)
            .filter(|p| p.is_dir())
            .ok_or_else(|| SideloadError::AppNotFound {
                path: relative_path.to_string(),
            })?;
        let manifest = locator::read_manifest(&bundle_path)?;

        let signing = ProgressUnit::discrete();
        progress.add_child(&signing, TOTAL_UNITS);

        let existing = self.catalog.snapshot().await.find(relative_path).cloned();
        let app = match existing.clone() {
            Some(app) => app,
            None => {
                let mut app = InstalledApp::from_manifest(&manifest, relative_path);
                app.data_uuid = locator::read_data_uuid(&bundle_path)?;
                app
            }
        };
        self.sign(&app, force, &signing).await?;

        if existing.is_none() {
            self.catalog.add(app.clone()).await?;
            info!(path = relative_path, "catalogued re-signed bundle");
        }
        Ok(app)
    }

    /// Drop an app from the catalog and delete its bundle directory.
    ///
    /// Data and tweak folders are left for the reconciler.
    pub async fn remove(&self, relative_path: &str) -> Result<InstalledApp> {
        let _running = self.gate.lock().await;

        let bundle_path = self
            .layout
            .checked_bundle_path(relative_path)
            .ok_or_else(|| SideloadError::AppNotFound {
                path: relative_path.to_string(),
            })?;
        let app = self
            .catalog
            .remove_by_path(relative_path)
            .await?
            .ok_or_else(|| SideloadError::AppNotFound {
                path: relative_path.to_string(),
            })?;

        remove_entry(&bundle_path).map_err(|e| io_at("Failed to remove bundle", &bundle_path, &e))?;
        info!(path = relative_path, identifier = %app.identifier, "removed app");
        Ok(app)
    }

    /// Bundles present in the store without a catalog entry, sorted
    pub async fn stray_bundles(&self) -> Result<Vec<String>> {
        let catalog = self.catalog.snapshot().await;
        let names = list_names(&self.layout.bundle_root)
            .map_err(|e| io_at("Failed to list", &self.layout.bundle_root, &e))?;

        Ok(names
            .into_iter()
            .filter(|name| name.ends_with(BUNDLE_SUFFIX))
            .filter(|name| catalog.find(name).is_none())
            .collect())
    }

    fn discard_staging(&self) {
        let staging = &self.layout.staging_root;
        if let Err(e) = remove_entry(staging) {
            warn!(staging = %staging.display(), error = %e, "failed to discard staged archive");
        }
    }
}

