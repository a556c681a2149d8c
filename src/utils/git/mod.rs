//! Git operations for publishing a single file.
//!
//! Handles repository detection/initialization, staging, committing and
//! remote pushing. The [`Vcs`] trait is the seam the deploy sequencer
//! drives; [`GitCli`] is the real implementation.

mod backend;
mod remote;
mod repo;

#[cfg(test)]
pub mod fixture;
#[cfg(test)]
mod tests;

pub use backend::GitCli;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

/// Committer identity used for generated commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "pagepush".to_string(),
            email: "pagepush@localhost".to_string(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Version-control operations needed to publish one file.
///
/// Every method blocks until the underlying operation completes.
pub trait Vcs {
    /// Whether repository metadata exists at the working directory.
    fn has_repo(&self) -> bool;

    /// Create a repository at the working directory.
    fn init_repo(&mut self) -> Result<()>;

    /// The committer identity configured for this repository, if complete.
    fn identity(&self) -> Result<Option<Identity>>;

    /// Add the file's current content to the index.
    fn stage(&mut self, file: &Path) -> Result<()>;

    /// Whether the staged content of `file` differs from the last commit.
    fn has_staged_changes(&self, file: &Path) -> Result<bool>;

    /// Commit the staged change of `file` only, returning the new commit id.
    ///
    /// `identity` overrides author and committer when given.
    fn commit(&mut self, file: &Path, message: &str, identity: Option<&Identity>) -> Result<String>;

    /// Push the current history to `remote` under `branch`.
    ///
    /// The error carries the diagnostic output of the failed attempt.
    fn push(&mut self, remote: &str, branch: &str, force: bool) -> Result<()>;
}
