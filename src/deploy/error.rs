//! Deploy failure taxonomy.

use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// One failed push attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    /// Branch name the push targeted.
    pub branch: String,
    /// Diagnostic output of the attempt.
    pub diagnostics: String,
}

impl fmt::Display for PushFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push to `{}` failed:", self.branch)?;
        for line in self.diagnostics.lines() {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

/// Fatal outcome of a deploy run. Every variant maps to exit code 1.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to initialize repository in `{}`: {reason}", .path.display())]
    Initialization { path: PathBuf, reason: String },

    #[error(
        "`{}` not found, nothing to deploy{}",
        .path.display(),
        render_candidates(.dir, .candidates)
    )]
    MissingInput {
        path: PathBuf,
        /// Directory that was searched.
        dir: PathBuf,
        /// `.html` files present there.
        candidates: Vec<String>,
    },

    #[error("failed to stage `{}`: {reason}", .file.display())]
    Staging { file: PathBuf, reason: String },

    #[error("failed to commit: {reason}")]
    Commit { reason: String },

    #[error("{}", render_push_failures(.failures))]
    Push { failures: Vec<PushFailure> },
}

fn render_candidates(dir: &Path, candidates: &[String]) -> String {
    if candidates.is_empty() {
        format!("\n  no .html files in `{}`", dir.display())
    } else {
        format!("\n  .html files in `{}`: {}", dir.display(), candidates.join(", "))
    }
}

fn render_push_failures(failures: &[PushFailure]) -> String {
    let branches: Vec<_> = failures.iter().map(|f| format!("`{}`", f.branch)).collect();
    let mut out = format!("push failed for {}", branches.join(" and "));
    for failure in failures {
        out.push('\n');
        out.push_str(&failure.to_string());
    }
    out
}
