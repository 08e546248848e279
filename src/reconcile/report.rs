//! Storage usage statistics

use std::path::{Path, PathBuf};

use crate::common::fs::{entry_size, format_size, list_names};
use crate::config::LayoutConfig;
use crate::error::Result;
use crate::error::fs::io_at;

/// Usage of one storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootUsage {
    pub label: &'static str,
    pub path: PathBuf,
    /// Number of direct entries
    pub entries: usize,
    /// Total size in bytes
    pub size: u64,
}

impl RootUsage {
    pub fn formatted_size(&self) -> String {
        format_size(self.size)
    }
}

/// Usage of every root in a layout
#[derive(Debug, Clone, Default)]
pub struct StorageReport {
    pub roots: Vec<RootUsage>,
}

impl StorageReport {
    pub fn total_size(&self) -> u64 {
        self.roots.iter().map(|r| r.size).sum()
    }

    pub fn formatted_size(&self) -> String {
        format_size(self.total_size())
    }
}

/// Measure one root; a missing root is empty
pub fn measure_root(label: &'static str, path: &Path) -> Result<RootUsage> {
    let names = list_names(path).map_err(|e| io_at("Failed to list", path, &e))?;
    Ok(RootUsage {
        label,
        path: path.to_path_buf(),
        entries: names.len(),
        size: if names.is_empty() { 0 } else { entry_size(path) },
    })
}

/// Measure every root in `layout`
pub fn storage_report(layout: &LayoutConfig) -> Result<StorageReport> {
    let roots = layout
        .roots()
        .into_iter()
        .map(|(label, path)| measure_root(label, path))
        .collect::<Result<Vec<_>>>()?;
    Ok(StorageReport { roots })
}
