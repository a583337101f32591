// src/cli.rs

use clap::Parser;

/// armshell: operator console shell for a robotic arm controller.
///
/// Drives the front panel display and keypad, presents the mode and system
/// menus and supervises the companion programs started from them. Logs go to
/// the file configured in `armshell.toml` (`~/armshell.log` by default).
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Offer "Quit to shell" in the shutdown menu.
    #[arg(long)]
    pub allow_quit: bool,

    /// Log at debug level, and ask companion programs to do the same.
    #[arg(short, long)]
    pub verbose: bool,
}
