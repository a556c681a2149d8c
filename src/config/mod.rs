//! Configuration management for `pagepush.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── deploy     # [deploy] and sub-sections
//! │   └── log        # [log]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # Config (this file)
//! ```
//!
//! The config file is optional: without one every section takes its
//! defaults, and command-line flags override whatever was loaded.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{CommitConfig, DeployConfig, LogConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, DEFAULT_CONFIG},
    debug, log,
    logger::Verbosity,
    utils::path::{normalize_path, resolve_path},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing pagepush.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Working directory holding the repository and target file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Deployment settings
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Output settings
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from the working directory for the config file.
    /// A missing default config is fine; a missing `--config` is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let start = cli.dir.as_ref().map_or_else(|| cwd.clone(), |dir| cwd.join(dir));

        let config_path = Self::resolve_config_path(cli, &start)?;
        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => {
                debug!("config"; "no {} found, using defaults", DEFAULT_CONFIG);
                Self::default()
            }
        };

        config.config_path = config_path;
        config.finalize(cli, &start);
        config.validate()?;

        Ok(config)
    }

    /// Locate the config file for this run.
    fn resolve_config_path(cli: &Cli, start: &Path) -> Result<Option<PathBuf>> {
        let name = cli.config_name();
        match (find_config_file(&name, start), &cli.config) {
            (Some(path), _) => Ok(Some(normalize_path(&path))),
            (None, Some(explicit)) => Err(ConfigError::NotFound(explicit.clone()).into()),
            (None, None) => Ok(None),
        }
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli, start: &Path) {
        // --dir wins, then the config file's directory, then cwd
        let root = if cli.dir.is_some() {
            start.to_path_buf()
        } else {
            self.config_path
                .as_deref()
                .and_then(Path::parent)
                .map_or_else(|| start.to_path_buf(), Path::to_path_buf)
        };
        self.root = normalize_path(&root);

        self.apply_cli_options(cli);

        if let Some(log_file) = self.deploy.log_file.take() {
            self.deploy.log_file = Some(resolve_path(&log_file, &self.root));
        }
    }

    /// Apply command-line overrides.
    fn apply_cli_options(&mut self, cli: &Cli) {
        Self::update_option(&mut self.deploy.file, cli.file.as_ref());
        Self::update_option(&mut self.deploy.remote, cli.remote.as_ref());
        if cli.force {
            self.deploy.force = true;
        }

        if cli.verbose {
            self.log.level = Verbosity::Verbose;
        } else if cli.quiet {
            self.log.level = Verbosity::Quiet;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    ///
    /// Runs unattended (CI, hooks), so unknown keys never block a deploy.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.deploy.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
