use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::conflict::ConflictPolicy;

/// How to answer an identifier conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictArg {
    /// Ask interactively
    Ask,
    /// Install next to the existing app
    New,
    /// Replace the first existing app, keeping its data
    Replace,
    /// Abort the install
    Cancel,
}

impl ConflictArg {
    /// Fixed policy, or `None` when the user should be asked
    pub fn policy(self) -> Option<ConflictPolicy> {
        match self {
            ConflictArg::Ask => None,
            ConflictArg::New => Some(ConflictPolicy::InstallAsNew),
            ConflictArg::Replace => Some(ConflictPolicy::ReplaceFirst),
            ConflictArg::Cancel => Some(ConflictPolicy::Cancel),
        }
    }
}

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install a bundle:\n    sideload install ./Game.ipa\n\n\
                   Replace an installed copy without asking:\n    sideload install ./Game.ipa --on-conflict replace\n\n\
                   Force re-signing:\n    sideload install ./Game.ipa --force-sign")]
pub struct InstallArgs {
    /// Archive holding a Payload directory with one '.app' bundle
    pub archive: PathBuf,

    /// Re-sign even if the bundle already looks signed
    #[arg(long)]
    pub force_sign: bool,

    /// What to do when the identifier is already installed
    #[arg(long, value_enum, default_value_t = ConflictArg::Ask)]
    pub on_conflict: ConflictArg,
}

/// Arguments for the resign command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Retry signing after a failed install:\n    sideload resign com.example.game.app\n\n\
                   Force re-signing:\n    sideload resign com.example.game.app --force")]
pub struct ResignArgs {
    /// Bundle path inside the store (e.g. com.example.game.app)
    pub path: String,

    /// Re-sign even if the bundle already looks signed
    #[arg(long)]
    pub force: bool,
}
