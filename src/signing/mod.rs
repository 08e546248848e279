//! Signing boundary
//!
//! Signing itself is an external routine. The installer only knows its
//! contract: it gets the bundle path, a force flag and a progress node that
//! stands for a fixed slice of the install, and it either succeeds or reports
//! a message.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SignerConfig;
use crate::error::{Result, SideloadError};
use crate::progress::ProgressUnit;

/// Opaque signing step
#[async_trait]
pub trait SigningAdapter: Send + Sync {
    /// Sign the bundle at `bundle`, reporting on `progress`.
    ///
    /// `force` re-signs even if the bundle already looks signed.
    async fn sign(&self, bundle: &Path, force: bool, progress: &ProgressUnit) -> Result<()>;
}

/// Signer for setups where bundles need no signing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSigner;

#[async_trait]
impl SigningAdapter for NoopSigner {
    async fn sign(&self, bundle: &Path, _force: bool, progress: &ProgressUnit) -> Result<()> {
        debug!(bundle = %bundle.display(), "no signer configured, skipping");
        progress.finish();
        Ok(())
    }
}

/// Runs an external signing program as `command [args...] [--force] <bundle>`
#[derive(Debug, Clone)]
pub struct CommandSigner {
    config: SignerConfig,
}

impl CommandSigner {
    pub fn new(config: SignerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SigningAdapter for CommandSigner {
    async fn sign(&self, bundle: &Path, force: bool, progress: &ProgressUnit) -> Result<()> {
        let failed = |message: String| SideloadError::SigningFailed {
            path: bundle.display().to_string(),
            message,
        };

        let mut command = Command::new(&self.config.command);
        command.args(&self.config.args);
        if force {
            command.arg("--force");
        }
        command.arg(bundle);

        info!(signer = %self.config.command, bundle = %bundle.display(), force, "signing bundle");
        progress.set_fraction(0.0);

        let output = command
            .output()
            .await
            .map_err(|e| failed(format!("cannot run '{}': {e}", self.config.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("signer exited with {}", output.status)
            } else {
                stderr
            };
            return Err(failed(message));
        }

        progress.finish();
        Ok(())
    }
}

/// Signer for the configured layout
pub fn signer_for(config: Option<&SignerConfig>) -> Box<dyn SigningAdapter> {
    match config {
        Some(config) => Box::new(CommandSigner::new(config.clone())),
        None => Box::new(NoopSigner),
    }
}
