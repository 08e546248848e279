//! List and lookup commands
//!
//! `list` prints the catalog, plus any bundles sitting in the store without a
//! catalog entry (typically left by a failed signing).

use std::path::PathBuf;
use std::sync::Arc;

use console::Style;

use super::Context;
use crate::cli::{ListArgs, LookupArgs};
use crate::conflict::ConflictPolicy;
use crate::domain::InstalledApp;
use crate::error::Result;

/// Run list command
pub async fn run(home: Option<PathBuf>, args: ListArgs) -> Result<()> {
    let context = Context::open(home)?;
    let catalog = context.catalog.snapshot().await;
    let stray = context
        .installer(Arc::new(ConflictPolicy::Cancel))
        .stray_bundles()
        .await?;

    let apps: Vec<&InstalledApp> = if args.all {
        catalog.apps.iter().collect()
    } else {
        catalog.visible().collect()
    };

    if apps.is_empty() {
        println!("No apps installed.");
    } else {
        println!("Installed apps ({}):", apps.len());
        println!();
        for app in apps {
            display_app(app);
        }
    }

    let hidden = catalog.hidden().count();
    if !args.all && hidden > 0 {
        println!();
        println!("{hidden} hidden app(s). Use --all to show them.");
    }

    if !stray.is_empty() {
        println!();
        println!(
            "{}",
            Style::new()
                .bold()
                .red()
                .apply_to("Bundles in the store but not in the catalog:")
        );
        for path in &stray {
            println!("  {path}  (run 'sideload resign {path}' to finish installing)");
        }
    }

    Ok(())
}

fn display_app(app: &InstalledApp) {
    let mut flags = Vec::new();
    if app.hidden {
        flags.push("hidden");
    }
    if app.locked {
        flags.push("locked");
    }
    if app.shared {
        flags.push("shared");
    }

    let name = Style::new().bold().yellow().apply_to(&app.display_name);
    if flags.is_empty() {
        println!("  {name}");
    } else {
        println!("  {name} [{}]", flags.join(", "));
    }

    let label = Style::new().bold();
    println!("    {} {}", label.apply_to("Identifier:"), app.identifier);
    println!("    {} {}", label.apply_to("Path:"), app.relative_path);
    if let Some(uuid) = &app.data_uuid {
        println!("    {} {uuid}", label.apply_to("Data:"));
    }
    if let Some(folder) = &app.tweak_folder {
        println!("    {} {folder}", label.apply_to("Tweaks:"));
    }
    if !app.url_schemes.is_empty() {
        let schemes: Vec<&str> = app.url_schemes.iter().map(String::as_str).collect();
        println!("    {} {}", label.apply_to("Schemes:"), schemes.join(", "));
    }
}

/// Run lookup command
pub async fn lookup(home: Option<PathBuf>, args: LookupArgs) -> Result<()> {
    let context = Context::open(home)?;
    let catalog = context.catalog.snapshot().await;
    let scheme = args.scheme.trim_end_matches("://");

    match catalog.find_by_scheme(scheme, args.all) {
        Some(app) => println!("{}", app.relative_path),
        None => println!("No installed app handles '{scheme}'."),
    }
    Ok(())
}
