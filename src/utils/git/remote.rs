//! Push diagnostics.
//!
//! A failing push leaves its error stream in a transient log file so the
//! output survives after the terminal scrolls away. The next successful
//! push removes it.

use super::backend::GIT_FILTER;
use crate::{debug, utils::date::DateTimeUtc};
use std::{fs, path::Path, process::Output};

/// Default file name, placed inside the repository metadata directory.
pub const PUSH_LOG_NAME: &str = "pagepush-push.log";

/// Human-readable diagnostics from a failed push.
///
/// PTY runs have their stderr merged into stdout, so both streams are read.
pub fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut lines = GIT_FILTER.apply(&stderr);
    lines.extend(GIT_FILTER.apply(&stdout));

    if lines.is_empty() {
        format!("git push failed with {}", output.status)
    } else {
        lines.join("\n")
    }
}

/// Overwrite the push log with the latest failure.
pub fn write_push_log(path: &Path, remote: &str, branch: &str, diagnostics: &str) {
    let content = format!(
        "# {} push {remote} HEAD:{branch}\n{diagnostics}\n",
        DateTimeUtc::now().to_rfc3339()
    );
    let written = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(path, content));

    match written {
        Ok(()) => debug!("push"; "diagnostics written to {}", path.display()),
        Err(e) => debug!("push"; "failed to write {}: {e}", path.display()),
    }
}

/// Remove a stale push log, if any.
pub fn clear_push_log(path: &Path) {
    if path.exists() && fs::remove_file(path).is_ok() {
        debug!("push"; "removed {}", path.display());
    }
}
