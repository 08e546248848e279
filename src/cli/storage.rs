use clap::{Parser, ValueEnum};

use crate::domain::StorageDomain;

/// Storage domain argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DomainArg {
    Private,
    Shared,
}

impl From<DomainArg> for StorageDomain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Private => StorageDomain::Private,
            DomainArg::Shared => StorageDomain::Shared,
        }
    }
}

/// Arguments for the clean-orphans command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Review and delete orphaned data folders:\n    sideload clean-orphans\n\n\
                  Delete without confirmation:\n    sideload clean-orphans -y")]
pub struct CleanOrphansArgs {
    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Arguments for the migrate-app-group command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Move the app group container to shared storage:\n    sideload migrate-app-group --to shared\n\n\
                  Nothing moves if the destination already has content.")]
pub struct MigrateAppGroupArgs {
    /// Destination domain
    #[arg(long, value_enum)]
    pub to: DomainArg,
}
