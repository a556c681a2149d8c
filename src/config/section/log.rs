//! `[log]` section configuration.
//!
//! ```toml
//! [log]
//! level = "normal"   # quiet | normal | verbose
//! ```

use crate::logger::Verbosity;
use serde::{Deserialize, Serialize};

/// Output settings. `--quiet` / `--verbose` take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Verbosity,
}
