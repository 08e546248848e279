//! Bundle manifest (`Info.json`) model
//!
//! The manifest is read once from an extracted bundle and never mutated.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::{Result, SideloadError};

/// Identity and capabilities of an installable bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    /// Unique key used for conflict detection
    pub identifier: String,
    /// Human readable name, falls back to the identifier
    pub display_name: String,
    /// URL schemes the bundle registers
    pub url_schemes: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(rename = "CFBundleIdentifier")]
    identifier: Option<String>,
    #[serde(rename = "CFBundleDisplayName")]
    display_name: Option<String>,
    #[serde(rename = "CFBundleName")]
    name: Option<String>,
    #[serde(rename = "CFBundleURLTypes", default)]
    url_types: Vec<RawUrlType>,
}

#[derive(Debug, Deserialize)]
struct RawUrlType {
    #[serde(rename = "CFBundleURLSchemes", default)]
    schemes: Vec<String>,
}

impl PackageManifest {
    /// Parse a manifest from its JSON text.
    ///
    /// `origin` is only used to label errors.
    pub fn from_json(json: &str, origin: &str) -> Result<Self> {
        let unreadable = |reason: String| SideloadError::ManifestUnreadable {
            path: origin.to_string(),
            reason,
        };

        let raw: RawManifest = serde_json::from_str(json).map_err(|e| unreadable(e.to_string()))?;

        let identifier = raw
            .identifier
            .map(|id| id.trim().to_string())
            .ok_or_else(|| unreadable("missing CFBundleIdentifier".to_string()))?;
        validate_identifier(&identifier).map_err(unreadable)?;

        let display_name = raw
            .display_name
            .or(raw.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| identifier.clone());

        let url_schemes = raw
            .url_types
            .into_iter()
            .flat_map(|t| t.schemes)
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            identifier,
            display_name,
            url_schemes,
        })
    }
}

/// Identifiers become directory names in the managed store, so they must be
/// a single, non-special path component.
fn validate_identifier(identifier: &str) -> std::result::Result<(), String> {
    if identifier.is_empty() {
        return Err("CFBundleIdentifier is empty".to_string());
    }
    if identifier == "." || identifier == ".." {
        return Err(format!("CFBundleIdentifier '{identifier}' is not allowed"));
    }
    if identifier
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(format!(
            "CFBundleIdentifier '{identifier}' contains path separators or control characters"
        ));
    }
    Ok(())
}
