//! Version command implementation
//!
//! Besides the version, shows where this invocation would install to, so a
//! misplaced `SIDELOAD_HOME` or `sideload.yaml` is easy to spot.

use std::path::PathBuf;

use crate::config::{LayoutConfig, SignerConfig, home_dir};
use crate::error::Result;

/// Run version command
pub fn run(home: Option<PathBuf>) -> Result<()> {
    let home = home_dir(home)?;
    let layout = LayoutConfig::load(&home)?;

    println!("sideload {} ({})", env!("CARGO_PKG_VERSION"), build_profile());
    println!();
    println!("Home:    {}", home.display());
    println!("Store:   {}", layout.bundle_root.display());
    println!("Catalog: {}", layout.catalog_path.display());
    println!("Signer:  {}", signer_label(layout.signer.as_ref()));

    Ok(())
}

fn signer_label(signer: Option<&SignerConfig>) -> String {
    match signer {
        Some(signer) if signer.args.is_empty() => signer.command.clone(),
        Some(signer) => format!("{} {}", signer.command, signer.args.join(" ")),
        None => "none (bundles are catalogued unsigned)".to_string(),
    }
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) { "debug" } else { "release" }
}
