use clap::Parser;

use super::DomainArg;

/// An installed app, by store path
#[derive(Parser, Debug)]
pub struct AppArgs {
    /// Bundle path inside the store (e.g. com.example.game.app)
    pub path: String,
}

/// Arguments for the remove command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Remove an app:\n    sideload remove com.example.game.app\n\n\
                  Remove without confirmation:\n    sideload remove com.example.game.app -y\n\n\
                  Data folders are kept; run 'sideload clean-orphans' to delete them.")]
pub struct RemoveArgs {
    /// Bundle path inside the store
    pub path: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Arguments for the configure command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Keep an app's folders in shared storage:\n    sideload configure com.example.game.app --storage shared\n\n\
                  Assign a tweak folder:\n    sideload configure com.example.game.app --tweak-folder GameTweaks\n\n\
                  Clear the tweak folder:\n    sideload configure com.example.game.app --no-tweak-folder")]
pub struct ConfigureArgs {
    /// Bundle path inside the store
    pub path: String,

    /// Storage domain for the app's data and tweak folders
    #[arg(long, value_enum)]
    pub storage: Option<DomainArg>,

    /// Tweak folder name
    #[arg(long, conflicts_with = "no_tweak_folder")]
    pub tweak_folder: Option<String>,

    /// Clear the tweak folder
    #[arg(long)]
    pub no_tweak_folder: bool,

    /// Data folder name
    #[arg(long)]
    pub data_folder: Option<String>,
}
