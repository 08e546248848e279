//! Install and resign commands
//!
//! The conflict decision is asked with an `inquire` select prompt on a
//! blocking thread while the pipeline task waits for the answer.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use console::Style;
use indicatif::ProgressBar;
use inquire::{InquireError, Select};

use super::Context;
use crate::cli::{InstallArgs, ResignArgs};
use crate::conflict::{ConflictPolicy, ConflictRequest, DecisionResponder};
use crate::error::{Result, SideloadError};
use crate::installer::{InstallOptions, InstallOutcome};
use crate::progress::{ProgressDisplay, ProgressUnit};

/// Asks the user to pick a conflict option in the terminal
pub struct PromptResponder {
    bar: ProgressBar,
}

impl PromptResponder {
    /// Prompt while hiding `bar`
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

#[async_trait]
impl DecisionResponder for PromptResponder {
    async fn decide(&self, request: &ConflictRequest) -> Result<Option<usize>> {
        let message = format!("'{}' is already installed. What should be done?", request.identifier);
        let labels: Vec<String> = request.options.iter().map(|o| o.label()).collect();
        let bar = self.bar.clone();

        let answer = tokio::task::spawn_blocking(move || {
            bar.suspend(|| {
                Select::new(&message, labels)
                    .with_starting_cursor(0)
                    .without_filtering()
                    .with_help_message("↑↓ to move, ENTER to select, ESC to cancel the install")
                    .raw_prompt_skippable()
            })
        })
        .await
        .map_err(|e| SideloadError::PromptFailed {
            message: e.to_string(),
        })?;

        match answer {
            Ok(choice) => Ok(choice.map(|option| option.index)),
            Err(InquireError::OperationInterrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Run install command
pub async fn run(home: Option<PathBuf>, args: InstallArgs) -> Result<()> {
    let context = Context::open(home)?;
    let mut display = ProgressDisplay::new("Installing");

    let responder: Arc<dyn DecisionResponder> = match args.on_conflict.policy() {
        Some(policy) => Arc::new(policy),
        None => Arc::new(PromptResponder::new(display.bar())),
    };
    let installer = context.installer(responder);

    let progress = ProgressUnit::discrete();
    display.follow(&progress);

    let options = InstallOptions {
        force_sign: args.force_sign,
    };
    match installer.install(&args.archive, &progress, options).await {
        Ok(InstallOutcome::Installed(app)) => {
            display.finish("Installed");
            println!(
                "Installed {} as {}",
                Style::new().bold().yellow().apply_to(&app.display_name),
                Style::new().cyan().apply_to(&app.relative_path)
            );
            if app.data_uuid.is_some() {
                println!("  Kept data folder of the replaced app");
            }
            Ok(())
        }
        Ok(InstallOutcome::Cancelled) => {
            display.abandon("Cancelled");
            println!("Install cancelled. Nothing was changed.");
            Ok(())
        }
        Err(e) => {
            display.abandon("Failed");
            Err(e)
        }
    }
}

/// Run resign command
pub async fn resign(home: Option<PathBuf>, args: ResignArgs) -> Result<()> {
    let context = Context::open(home)?;
    // resign never meets a conflict; the policy is never consulted
    let installer = context.installer(Arc::new(ConflictPolicy::Cancel));

    let mut display = ProgressDisplay::new("Signing");
    let progress = ProgressUnit::discrete();
    display.follow(&progress);

    match installer.resign(&args.path, args.force, &progress).await {
        Ok(app) => {
            display.finish("Signed");
            println!(
                "Signed {} ({})",
                Style::new().bold().yellow().apply_to(&app.display_name),
                Style::new().cyan().apply_to(&app.relative_path)
            );
            Ok(())
        }
        Err(e) => {
            display.abandon("Failed");
            Err(e)
        }
    }
}
