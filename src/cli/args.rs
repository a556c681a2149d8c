//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Publish a generated page to a git remote.
///
/// Stages the target file, commits it when it changed, and pushes to the
/// primary branch, falling back to the secondary branch if that push fails.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Commit message (ignored when `[deploy.commit] allow_override = false`)
    #[arg(value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: pagepush.toml, searched upward; optional)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Working directory holding the repository and the target file
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// File to publish, relative to the working directory
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Remote alias to push to
    #[arg(short, long)]
    pub remote: Option<String>,

    /// Force push (overwrites remote history)
    #[arg(long)]
    pub force: bool,

    /// Show command output and every step
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Default config file name.
pub const DEFAULT_CONFIG: &str = "pagepush.toml";

impl Cli {
    /// Config file name or path to search for.
    pub fn config_name(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
    }
}
