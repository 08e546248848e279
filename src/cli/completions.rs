use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    sideload completions bash > ~/.bash_completion.d/sideload\n\n\
                  Generate zsh completions:\n    sideload completions zsh > ~/.zfunc/_sideload\n\n\
                  Generate fish completions:\n    sideload completions fish > ~/.config/fish/completions/sideload.fish\n\n\
                  Generate PowerShell completions:\n    sideload completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
