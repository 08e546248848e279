//! Configuration file handling for sideload
//!
//! This module contains data structures for:
//! - `sideload.yaml` - Storage layout and signer configuration

pub mod layout;

// Re-export commonly used types
pub use layout::{CONFIG_FILE, HOME_ENV, LayoutConfig, SignerConfig, home_dir};
