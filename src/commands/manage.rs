//! Single-app catalog edits: remove, visibility, lock, storage settings

use std::path::PathBuf;
use std::sync::Arc;

use console::Style;
use inquire::Confirm;

use super::Context;
use crate::cli::{AppArgs, ConfigureArgs, RemoveArgs};
use crate::conflict::ConflictPolicy;
use crate::domain::StorageDomain;
use crate::error::{Result, SideloadError};

/// Run remove command
pub async fn remove(home: Option<PathBuf>, args: RemoveArgs) -> Result<()> {
    let context = Context::open(home)?;
    let app = context
        .catalog
        .snapshot()
        .await
        .find(&args.path)
        .cloned()
        .ok_or_else(|| SideloadError::AppNotFound {
            path: args.path.clone(),
        })?;

    if !args.yes {
        let prompt = format!("Remove {} ({})?", app.display_name, app.relative_path);
        let confirmed = tokio::task::spawn_blocking(move || {
            Confirm::new(&prompt)
                .with_default(false)
                .with_help_message("The data folder is kept until you run clean-orphans")
                .prompt()
        })
        .await
        .map_err(|e| SideloadError::PromptFailed {
            message: e.to_string(),
        })??;
        if !confirmed {
            println!("Nothing removed.");
            return Ok(());
        }
    }

    let removed = context
        .installer(Arc::new(ConflictPolicy::Cancel))
        .remove(&args.path)
        .await?;
    println!(
        "Removed {}",
        Style::new().bold().yellow().apply_to(&removed.display_name)
    );
    Ok(())
}

/// Run hide or unhide command
pub async fn set_hidden(home: Option<PathBuf>, args: AppArgs, hidden: bool) -> Result<()> {
    let context = Context::open(home)?;
    let app = context.catalog.set_hidden(&args.path, hidden).await?;
    let state = if hidden { "hidden" } else { "visible" };
    println!("{} is now {state}", app.display_name);
    Ok(())
}

/// Run lock or unlock command
pub async fn set_locked(home: Option<PathBuf>, args: AppArgs, locked: bool) -> Result<()> {
    let context = Context::open(home)?;
    let app = context.catalog.set_locked(&args.path, locked).await?;
    let state = if locked { "locked" } else { "unlocked" };
    println!("{} is now {state}", app.display_name);
    Ok(())
}

/// Run configure command
pub async fn configure(home: Option<PathBuf>, args: ConfigureArgs) -> Result<()> {
    let context = Context::open(home)?;
    let catalog = &context.catalog;

    let mut app = catalog
        .snapshot()
        .await
        .find(&args.path)
        .cloned()
        .ok_or_else(|| SideloadError::AppNotFound {
            path: args.path.clone(),
        })?;

    if let Some(domain) = args.storage {
        app = catalog
            .set_shared(&args.path, StorageDomain::from(domain) == StorageDomain::Shared)
            .await?;
    }
    if args.no_tweak_folder {
        app = catalog.set_tweak_folder(&args.path, None).await?;
    } else if let Some(folder) = args.tweak_folder {
        app = catalog.set_tweak_folder(&args.path, Some(folder)).await?;
    }
    if let Some(folder) = args.data_folder {
        app = catalog.set_data_uuid(&args.path, Some(folder)).await?;
    }

    println!(
        "{}: {} storage, data {}, tweaks {}",
        Style::new().bold().yellow().apply_to(&app.display_name),
        app.storage_domain(),
        app.data_uuid.as_deref().unwrap_or("(unassigned)"),
        app.tweak_folder.as_deref().unwrap_or("(none)")
    );
    Ok(())
}
