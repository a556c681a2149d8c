use super::message::{CommitMessage, commit_message};
use crate::{config::Config, utils::date::DateTimeUtc, utils::git::Identity};
use std::path::PathBuf;

/// Ordered pair of branch names tried during push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTarget {
    pub primary: String,
    pub fallback: String,
}

impl BranchTarget {
    pub fn new(primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }

    /// Branches in the order they are attempted.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [self.primary.as_str(), self.fallback.as_str()].into_iter()
    }
}

impl Default for BranchTarget {
    fn default() -> Self {
        Self::new("main", "master")
    }
}

/// Everything one deploy run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    /// Working directory holding the repository.
    pub root: PathBuf,
    /// Target file, relative to `root`.
    pub file: PathBuf,
    /// Remote alias.
    pub remote: String,
    pub branches: BranchTarget,
    /// Identity used when git has none configured.
    pub identity: Identity,
    pub message: CommitMessage,
    pub force: bool,
}

impl DeployPlan {
    /// Resolve a plan from loaded configuration and an optional message.
    pub fn from_config(config: &Config, supplied_message: Option<&str>) -> Self {
        let deploy = &config.deploy;
        Self {
            root: config.get_root().to_path_buf(),
            file: deploy.file.clone(),
            remote: deploy.remote.clone(),
            branches: BranchTarget::new(&deploy.branches.primary, &deploy.branches.fallback),
            identity: deploy.identity.clone(),
            message: commit_message(
                &deploy.commit,
                &deploy.file,
                supplied_message,
                DateTimeUtc::now(),
            ),
            force: deploy.force,
        }
    }

    /// Absolute path of the target file.
    pub fn target_path(&self) -> PathBuf {
        self.root.join(&self.file)
    }
}
