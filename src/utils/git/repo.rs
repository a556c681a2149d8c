use crate::log;
use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

/// Name of the repository metadata entry in a working directory.
const DOT_GIT: &str = ".git";

/// Whether `root` holds repository metadata (no upward search).
///
/// Only checks for the `.git` entry, so repositories gix cannot open
/// (e.g. other object formats) still count as present.
pub fn has_repo(root: &Path) -> bool {
    root.join(DOT_GIT).exists()
}

/// Create a new git repository at the given path
pub fn create_repo(root: &Path) -> Result<PathBuf> {
    let repo = gix::init(root)?;
    log!("git"; "initialized repository in {}", root.display());
    Ok(repo.path().to_path_buf())
}

/// Path of the metadata directory for the repository at `root`
pub fn git_dir(root: &Path) -> Result<PathBuf> {
    let dot_git = root.join(DOT_GIT);
    if dot_git.is_dir() {
        return Ok(dot_git);
    }

    // `.git` file: linked worktree or submodule
    let repo = gix::open(root).map_err(|e| anyhow!("no repository at {}: {e}", root.display()))?;
    Ok(repo.path().to_path_buf())
}
