//! Command implementations for the sideload CLI

pub mod completions;
pub mod install;
pub mod list;
pub mod manage;
pub mod storage;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::CatalogStore;
use crate::config::{LayoutConfig, home_dir};
use crate::conflict::DecisionResponder;
use crate::error::Result;
use crate::installer::Installer;
use crate::reconcile::StorageReconciler;
use crate::signing::signer_for;

/// Layout and catalog for one command invocation
pub struct Context {
    pub layout: LayoutConfig,
    pub catalog: Arc<CatalogStore>,
}

impl Context {
    /// Resolve the base directory, load its layout and open the catalog
    pub fn open(home: Option<PathBuf>) -> Result<Self> {
        let home = home_dir(home)?;
        debug!(home = %home.display(), "using base directory");
        let layout = LayoutConfig::load(&home)?;
        let catalog = Arc::new(CatalogStore::open(&layout.catalog_path)?);
        Ok(Self { layout, catalog })
    }

    pub fn installer(&self, responder: Arc<dyn DecisionResponder>) -> Installer {
        let signer = Arc::from(signer_for(self.layout.signer.as_ref()));
        Installer::new(self.layout.clone(), Arc::clone(&self.catalog), responder, signer)
    }

    pub fn reconciler(&self) -> StorageReconciler {
        StorageReconciler::new(self.layout.clone(), Arc::clone(&self.catalog))
    }
}
