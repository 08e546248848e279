//! Archive extraction into the staging directory
//!
//! The archive is a zip file whose bundle lives under a top-level `Payload/`
//! directory. Extraction always starts from an empty staging directory: stale
//! output of an earlier, possibly crashed, run is never trusted, and neither
//! are the archive's top-level extras (`SwiftSupport/`, `Symbols/`, metadata
//! files). Output of a failed extraction is likewise unusable and the caller
//! must not read it.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::common::fs::remove_entry;
use crate::error::fs::extraction_failed;
use crate::error::Result;
use crate::progress::ProgressUnit;

/// Directory inside the archive (and the staging root) holding the bundle
pub const PAYLOAD_DIR: &str = "Payload";

/// Extract `archive` into `destination`, returning the payload directory.
///
/// Everything already in `destination` is removed first.
/// Progress is reported on `progress` as the share of uncompressed bytes
/// written. Not cancellable once started.
pub fn extract_archive(archive: &Path, destination: &Path, progress: &ProgressUnit) -> Result<PathBuf> {
    remove_entry(destination)
        .map_err(|e| extraction_failed(archive, format!("cannot clear '{}': {e}", destination.display())))?;
    fs::create_dir_all(destination).map_err(|e| extraction_failed(archive, e))?;
    let payload = destination.join(PAYLOAD_DIR);

    let file = File::open(archive).map_err(|e| extraction_failed(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| extraction_failed(archive, e))?;

    let mut total_bytes = 0_u64;
    for i in 0..zip.len() {
        total_bytes += zip.by_index(i).map_err(|e| extraction_failed(archive, e))?.size();
    }
    debug!(archive = %archive.display(), entries = zip.len(), total_bytes, "extracting archive");

    progress.set_fraction(0.0);
    let mut written = 0_u64;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| extraction_failed(archive, e))?;
        let Some(target) = entry.enclosed_name().map(|p| destination.join(p)) else {
            warn!(entry = entry.name(), "skipping archive entry outside the destination");
            continue;
        };

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| extraction_failed(archive, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| extraction_failed(archive, e))?;
        }
        let mut outfile = File::create(&target).map_err(|e| extraction_failed(archive, e))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| extraction_failed(archive, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))
                    .map_err(|e| extraction_failed(archive, e))?;
            }
        }

        written += entry.size();
        if total_bytes > 0 {
            #[allow(clippy::cast_precision_loss)]
            progress.set_fraction(written as f64 / total_bytes as f64);
        }
    }

    progress.finish();
    Ok(payload)
}

/// Run [`extract_archive`] on the blocking thread pool
pub async fn extract_in_background(
    archive: PathBuf,
    destination: PathBuf,
    progress: ProgressUnit,
) -> Result<PathBuf> {
    let label = archive.clone();
    tokio::task::spawn_blocking(move || extract_archive(&archive, &destination, &progress))
        .await
        .map_err(|e| extraction_failed(&label, e))?
}
