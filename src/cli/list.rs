use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List installed apps:\n    sideload list\n\n\
                  Include hidden apps:\n    sideload list --all")]
pub struct ListArgs {
    /// Include hidden apps
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Arguments for the lookup command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Find the app for a URL scheme:\n    sideload lookup mygame\n\n\
                  Search hidden apps too:\n    sideload lookup mygame --all")]
pub struct LookupArgs {
    /// URL scheme without '://'
    pub scheme: String,

    /// Search hidden apps too
    #[arg(long, short = 'a')]
    pub all: bool,
}
