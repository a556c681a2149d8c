use super::{Identity, Vcs, remote, repo};
use crate::{
    config::DeployConfig,
    debug, exec, log,
    utils::exec::{Cmd, FilterRule, SILENT_FILTER, format_error},
};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Skip git's advisory chatter when echoing command output.
pub(super) const GIT_FILTER: FilterRule = FilterRule::new(&["hint:"]);

/// [`Vcs`] implementation driving the `git` executable.
pub struct GitCli {
    root: PathBuf,
    git: PathBuf,
    pty: bool,
    set_upstream: bool,
    log_file: Option<PathBuf>,
}

impl GitCli {
    /// Create a backend for the working directory `root`.
    ///
    /// Fails when no `git` executable is on `PATH`.
    pub fn new(root: &Path, deploy: &DeployConfig) -> Result<Self> {
        let git = which::which("git").context("`git` not found on PATH")?;
        debug!("git"; "using {}", git.display());
        Ok(Self {
            root: root.to_path_buf(),
            git,
            pty: deploy.pty,
            set_upstream: deploy.set_upstream,
            log_file: deploy.log_file.clone(),
        })
    }

    /// Base command with the working directory set.
    fn git(&self) -> Cmd {
        Cmd::new(&self.git).cwd(&self.root).filter(&GIT_FILTER)
    }

    /// Read one config value; `None` when unset.
    fn config_value(&self, key: &str) -> Result<Option<String>> {
        let output = self
            .git()
            .args(["config", "--get", key])
            .allow_failure(true)
            .run()?;

        match output.status.code() {
            Some(0) => {
                let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
                Ok((!value.is_empty()).then_some(value))
            }
            // exit 1: key not set
            Some(1) => Ok(None),
            _ => bail!(format_error("git", &output, &SILENT_FILTER)),
        }
    }

    /// Where failing push output is written.
    fn push_log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(repo::git_dir(&self.root)?.join(remote::PUSH_LOG_NAME)),
        }
    }
}

impl Vcs for GitCli {
    fn has_repo(&self) -> bool {
        repo::has_repo(&self.root)
    }

    fn init_repo(&mut self) -> Result<()> {
        repo::create_repo(&self.root).map(|_| ())
    }

    fn identity(&self) -> Result<Option<Identity>> {
        let name = self.config_value("user.name")?;
        let email = self.config_value("user.email")?;
        Ok(name.zip(email).map(|(name, email)| Identity { name, email }))
    }

    fn stage(&mut self, file: &Path) -> Result<()> {
        exec!(filter=&GIT_FILTER; &self.root; &self.git; "add", "--", file)?;
        Ok(())
    }

    fn has_staged_changes(&self, file: &Path) -> Result<bool> {
        let output = self
            .git()
            .args(["diff", "--cached", "--quiet", "--"])
            .arg(file)
            .allow_failure(true)
            .run()?;

        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => bail!(format_error("git", &output, &GIT_FILTER)),
        }
    }

    fn commit(
        &mut self,
        file: &Path,
        message: &str,
        identity: Option<&Identity>,
    ) -> Result<String> {
        let mut cmd = self
            .git()
            .args(["commit", "--quiet", "-m", message, "--"])
            .arg(file);
        if let Some(id) = identity {
            cmd = cmd.envs([
                ("GIT_AUTHOR_NAME", id.name.as_str()),
                ("GIT_AUTHOR_EMAIL", id.email.as_str()),
                ("GIT_COMMITTER_NAME", id.name.as_str()),
                ("GIT_COMMITTER_EMAIL", id.email.as_str()),
            ]);
        }
        cmd.run()?;

        let output = exec!(&self.root; &self.git; "rev-parse", "HEAD")?;
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        log!("git"; "commit {id}");
        Ok(id)
    }

    fn push(&mut self, remote_name: &str, branch: &str, force: bool) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        let output = self
            .git()
            .arg("push")
            .arg(if force { "--force" } else { "" })
            .arg(if self.set_upstream { "--set-upstream" } else { "" })
            .args([remote_name, refspec.as_str()])
            .pty(self.pty)
            .allow_failure(true)
            .run()?;

        let log_path = self.push_log_path();
        if output.status.success() {
            if let Ok(path) = &log_path {
                remote::clear_push_log(path);
            }
            return Ok(());
        }

        let diagnostics = remote::diagnostics(&output);
        match &log_path {
            Ok(path) => remote::write_push_log(path, remote_name, branch, &diagnostics),
            Err(e) => debug!("push"; "no place for push log: {e:#}"),
        }
        bail!(diagnostics)
    }
}
