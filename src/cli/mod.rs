//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command group's argument types:
//! - install: install and resign arguments
//! - list: list and lookup arguments
//! - manage: single-app catalog edits
//! - storage: reconciliation arguments
//! - completions: completions arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod install;
pub mod list;
pub mod manage;
pub mod storage;

pub use completions::CompletionsArgs;
pub use install::{ConflictArg, InstallArgs, ResignArgs};
pub use list::{ListArgs, LookupArgs};
pub use manage::{AppArgs, ConfigureArgs, RemoveArgs};
pub use storage::{CleanOrphansArgs, DomainArg, MigrateAppGroupArgs};

/// Sideload - bundle installer and storage reconciler
#[derive(Parser, Debug)]
#[command(
    name = "sideload",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install sideloaded app bundles and keep their storage consistent",
    long_about = "Sideload installs app bundles from archives into a managed store, keeps a \
                  catalog of installed apps, and reconciles per-app data and tweak folders \
                  across the private and shared storage domains.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  sideload install ./Game.ipa               \x1b[90m# Install a bundle\x1b[0m\n   \
                  sideload install ./Game.ipa --on-conflict replace\n   \
                  sideload list --all                       \x1b[90m# Include hidden apps\x1b[0m\n   \
                  sideload clean-orphans                    \x1b[90m# Delete unreferenced data folders\x1b[0m\n   \
                  sideload migrate-app-group --to shared    \x1b[90m# Move app group storage\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Base directory (defaults to the platform data directory)
    #[arg(long, global = true, env = "SIDELOAD_HOME")]
    pub home: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a bundle from an archive
    Install(InstallArgs),

    /// Sign a stored bundle again and catalogue it
    Resign(ResignArgs),

    /// List installed apps
    List(ListArgs),

    /// Find the app handling a URL scheme
    Lookup(LookupArgs),

    /// Remove an installed app
    Remove(RemoveArgs),

    /// Hide an app from the regular list
    Hide(AppArgs),

    /// Show a hidden app in the regular list again
    Unhide(AppArgs),

    /// Require authentication to launch an app
    Lock(AppArgs),

    /// Stop requiring authentication to launch an app
    Unlock(AppArgs),

    /// Change where an app keeps its folders
    Configure(ConfigureArgs),

    /// Show storage usage per root
    Storage,

    /// Delete data folders no installed app references
    CleanOrphans(CleanOrphansArgs),

    /// Move shared folders no shared-storage app uses back to private storage
    RelocateDangling,

    /// Move the app group container between storage domains
    MigrateAppGroup(MigrateAppGroupArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
