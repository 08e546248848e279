//! Storage report and reconciliation commands

use std::path::PathBuf;

use async_trait::async_trait;
use console::Style;
use inquire::Confirm;

use super::Context;
use crate::cli::{CleanOrphansArgs, MigrateAppGroupArgs};
use crate::common::fs::format_size;
use crate::domain::StorageDomain;
use crate::error::{Result, SideloadError};
use crate::reconcile::{Confirmer, FixedAnswer, OrphanSummary, storage_report};

/// Asks before deleting orphaned folders, listing them first
struct PromptConfirmer;

#[async_trait]
impl Confirmer for PromptConfirmer {
    async fn confirm(&self, orphans: &OrphanSummary) -> Result<bool> {
        println!("\nThe following data folder(s) are not used by any installed app:");
        for folder in &orphans.folders {
            println!("  - {folder}");
        }
        println!();

        let prompt = format!(
            "Delete {} folder(s) ({})?",
            orphans.count(),
            format_size(orphans.size)
        );
        tokio::task::spawn_blocking(move || {
            Confirm::new(&prompt)
                .with_default(false)
                .with_help_message("This cannot be undone")
                .prompt()
        })
        .await
        .map_err(|e| SideloadError::PromptFailed {
            message: e.to_string(),
        })?
        .map_err(SideloadError::from)
    }
}

/// Run storage command
pub async fn report(home: Option<PathBuf>) -> Result<()> {
    let context = Context::open(home)?;
    let report = storage_report(&context.layout)?;
    let orphans = context.reconciler().orphans().await?;

    println!("Storage:");
    for root in &report.roots {
        println!(
            "  {:<18} {:>5} entries {:>10}  {}",
            Style::new().bold().apply_to(root.label),
            root.entries,
            root.formatted_size(),
            Style::new().dim().apply_to(root.path.display())
        );
    }
    println!("  {:<18} {:>24}", Style::new().bold().apply_to("total"), report.formatted_size());

    if orphans.count() > 0 {
        println!();
        println!(
            "{} orphaned data folder(s) using {}. Run 'sideload clean-orphans' to delete them.",
            orphans.count(),
            format_size(orphans.size)
        );
    }
    Ok(())
}

/// Run clean-orphans command
pub async fn clean_orphans(home: Option<PathBuf>, args: CleanOrphansArgs) -> Result<()> {
    let context = Context::open(home)?;
    let reconciler = context.reconciler();

    let report = if args.yes {
        reconciler.clean_orphans(&FixedAnswer(true)).await?
    } else {
        reconciler.clean_orphans(&PromptConfirmer).await?
    };

    if report.declined {
        println!("Nothing deleted.");
    } else if report.deleted == 0 {
        println!("No orphaned data folders.");
    } else {
        println!("Deleted {} orphaned data folder(s).", report.deleted);
    }
    Ok(())
}

/// Run relocate-dangling command
pub async fn relocate_dangling(home: Option<PathBuf>) -> Result<()> {
    let context = Context::open(home)?;
    let report = context.reconciler().relocate_dangling().await?;

    println!(
        "Moved {} data folder(s) and {} tweak folder(s) to private storage.",
        report.moved_data, report.moved_tweaks
    );
    if report.skipped > 0 {
        println!(
            "{} folder(s) exist in both domains and were left in place.",
            report.skipped
        );
    }
    Ok(())
}

/// Run migrate-app-group command
pub async fn migrate_app_group(home: Option<PathBuf>, args: MigrateAppGroupArgs) -> Result<()> {
    let context = Context::open(home)?;
    let to = StorageDomain::from(args.to);
    let report = context.reconciler().migrate_app_group(to).await?;

    println!(
        "Moved {} app group item(s) to {to} storage.",
        report.moved_app_group
    );
    Ok(())
}
