//! Common test utilities for sideload integration tests

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sideload::catalog::CatalogStore;
use sideload::conflict::{ConflictRequest, DecisionResponder};
use sideload::config::LayoutConfig;
use sideload::installer::Installer;
use sideload::signing::{NoopSigner, SigningAdapter};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A throwaway sideload home with its layout and catalog
#[allow(dead_code)]
pub struct TestHome {
    /// Temporary directory
    pub temp: TempDir,
    pub layout: LayoutConfig,
    pub catalog: Arc<CatalogStore>,
}

#[allow(dead_code)]
impl TestHome {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let layout = LayoutConfig::rooted_at(temp.path());
        let catalog = Arc::new(CatalogStore::open(&layout.catalog_path).expect("Failed to open catalog"));
        Self {
            temp,
            layout,
            catalog,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Installer answering conflicts with `responder` and signing with `NoopSigner`
    pub fn installer(&self, responder: Arc<dyn DecisionResponder>) -> Installer {
        self.installer_with_signer(responder, Arc::new(NoopSigner))
    }

    pub fn installer_with_signer(
        &self,
        responder: Arc<dyn DecisionResponder>,
        signer: Arc<dyn SigningAdapter>,
    ) -> Installer {
        Installer::new(
            self.layout.clone(),
            Arc::clone(&self.catalog),
            responder,
            signer,
        )
    }

    /// Write an archive holding one bundle for `identifier`
    pub fn archive(&self, file_name: &str, identifier: &str, binary: &str) -> PathBuf {
        let path = self.path().join("archives").join(file_name);
        let manifest = format!(
            r#"{{"CFBundleIdentifier": "{identifier}", "CFBundleDisplayName": "{identifier}"}}"#
        );
        write_zip(
            &path,
            &[
                ("Payload/App.app/Info.json", manifest.as_bytes()),
                ("Payload/App.app/App", binary.as_bytes()),
            ],
        );
        path
    }

    /// Create a folder with one marker file
    pub fn folder(&self, root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).expect("Failed to create folder");
        fs::write(dir.join("marker"), name).expect("Failed to write marker");
        dir
    }
}

/// Write a zip archive with the given entries
#[allow(dead_code)]
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create archive directory");
    }
    let file = fs::File::create(path).expect("Failed to create archive");
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, zip::write::FileOptions::default())
            .expect("Failed to start zip entry");
        zip.write_all(content).expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish archive");
}

/// Every file under `root` with its contents, for before/after comparisons
#[allow(dead_code)]
pub fn tree_contents(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap_or(e.path()).to_path_buf();
            (relative, fs::read(e.path()).unwrap_or_default())
        })
        .collect()
}

/// Responder that records every request and answers from a script
#[allow(dead_code)]
pub struct RecordingResponder {
    answer: Option<usize>,
    pub requests: Mutex<Vec<ConflictRequest>>,
}

#[allow(dead_code)]
impl RecordingResponder {
    pub fn answering(answer: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ConflictRequest> {
        self.requests.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl DecisionResponder for RecordingResponder {
    async fn decide(&self, request: &ConflictRequest) -> sideload::Result<Option<usize>> {
        self.requests.lock().expect("poisoned").push(request.clone());
        Ok(self.answer)
    }
}
