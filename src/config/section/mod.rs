//! Configuration section definitions.
//!
//! Each module corresponds to a section in `pagepush.toml`:
//!
//! | Module   | TOML Section | Purpose                                  |
//! |----------|--------------|------------------------------------------|
//! | `deploy` | `[deploy]`   | Target file, remote, branches, commit    |
//! | `log`    | `[log]`      | Output verbosity                         |

mod deploy;
mod log;

pub use deploy::{CommitConfig, DeployConfig};
pub use log::LogConfig;
