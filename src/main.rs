//! Sideload - bundle installer and storage reconciler
//!
//! Command line entry point. All logic lives in the library crate.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sideload::cli::{Cli, Commands};
use sideload::commands;

/// Default filter for a verbosity level; `RUST_LOG` overrides it
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "sideload=warn",
        1 => "sideload=debug",
        _ => "sideload=trace",
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let home = cli.home;
    let result = match cli.command {
        Commands::Install(args) => commands::install::run(home, args).await,
        Commands::Resign(args) => commands::install::resign(home, args).await,
        Commands::List(args) => commands::list::run(home, args).await,
        Commands::Lookup(args) => commands::list::lookup(home, args).await,
        Commands::Remove(args) => commands::manage::remove(home, args).await,
        Commands::Hide(args) => commands::manage::set_hidden(home, args, true).await,
        Commands::Unhide(args) => commands::manage::set_hidden(home, args, false).await,
        Commands::Lock(args) => commands::manage::set_locked(home, args, true).await,
        Commands::Unlock(args) => commands::manage::set_locked(home, args, false).await,
        Commands::Configure(args) => commands::manage::configure(home, args).await,
        Commands::Storage => commands::storage::report(home).await,
        Commands::CleanOrphans(args) => commands::storage::clean_orphans(home, args).await,
        Commands::RelocateDangling => commands::storage::relocate_dangling(home).await,
        Commands::MigrateAppGroup(args) => commands::storage::migrate_app_group(home, args).await,
        Commands::Version => commands::version::run(home),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
