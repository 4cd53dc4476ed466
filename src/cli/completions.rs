use clap::Parser;

/// Arguments for the completions command
///
/// The shell is matched case-insensitively, so `rbinstall completions PWSH`
/// works too. An unknown name is reported with the supported list.
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Enable completions for every bash user (run as root):\n    \
                  rbinstall completions bash > /etc/bash_completion.d/rbinstall\n\n\
                  Enable zsh completions for yourself:\n    \
                  rbinstall completions zsh > ~/.zfunc/_rbinstall\n\n\
                  Enable fish completions:\n    \
                  rbinstall completions fish > ~/.config/fish/completions/rbinstall.fish")]
pub struct CompletionsArgs {
    /// bash, elvish, fish, powershell (or pwsh), zsh
    #[arg(value_name = "SHELL")]
    pub shell: String,
}
