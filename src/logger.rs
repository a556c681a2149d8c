//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output only shown in verbose mode
//! - [`error`] for messages that are printed even in quiet mode
//!
//! # Example
//!
//! ```ignore
//! log!("git"; "commit {}", id);
//! debug!("deploy"; "stage -> {:?}", stage);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::{
    io::{Write, stderr, stdout},
    sync::atomic::{AtomicU8, Ordering},
};

/// How much output a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Step summaries.
    #[default]
    Normal,
    /// Step summaries plus command output and state transitions.
    Verbose,
}

impl Verbosity {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Quiet => 0,
            Self::Normal => 1,
            Self::Verbose => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Quiet,
            1 => Self::Normal,
            _ => Self::Verbose,
        }
    }
}

/// Global verbosity (set from CLI flags or `[log] level`)
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Set verbosity globally
pub fn set_verbosity(v: Verbosity) {
    VERBOSITY.store(v.as_u8(), Ordering::SeqCst);
}

/// Current global verbosity
pub fn verbosity() -> Verbosity {
    Verbosity::from_u8(VERBOSITY.load(Ordering::SeqCst))
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    verbosity() == Verbosity::Verbose
}

/// Check if quiet mode is enabled
pub fn is_quiet() -> bool {
    verbosity() == Verbosity::Quiet
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// Suppressed in quiet mode.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        if !$crate::logger::is_quiet() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    // PTY children may leave a partial line behind
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Print an error to stderr regardless of verbosity.
pub fn error(message: &str) {
    let prefix = colorize_prefix("error", "error");
    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "deploy" => prefix.bright_blue().bold().to_string(),
        "push" | "done" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}
