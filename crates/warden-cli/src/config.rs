use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warden_types::Action;

/// CLI for warden
#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Single-service lifecycle supervisor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// File path to the configuration file (TOML)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Directory holding the pid record, overrides the configuration file
    #[arg(long, global = true)]
    pub run_dir: Option<PathBuf>,

    /// Keep the pid record unless SIGKILL is confirmed to have worked
    #[arg(long, global = true)]
    pub strict_kill: bool,

    /// Refuse to run while another invocation works on the same service
    #[arg(long, global = true)]
    pub lock: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the service unless it already has a pid record
    Start,
    /// Stop the service, escalating from SIGTERM to SIGALRM to SIGKILL
    Stop,
    /// Report whether the service is running, stopped or crashed
    Status,
    /// Stop, then start the service
    Restart,
    /// Register the service to start at boot
    Autostart,
}

impl From<Commands> for Action {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Start => Action::Start,
            Commands::Stop => Action::Stop,
            Commands::Status => Action::Status,
            Commands::Restart => Action::Restart,
            Commands::Autostart => Action::Autostart,
        }
    }
}
