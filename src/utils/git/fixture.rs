//! Real-git fixture shared by backend and command tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{GitCli, remote::PUSH_LOG_NAME};
use crate::config::{Config, DeployConfig};
use crate::deploy::{DeployError, DeployPlan, Outcome, Sequencer};
use crate::utils::exec::Cmd;
use crate::utils::path::normalize_path;

const TEST_IDENTITY: [(&str, &str); 4] = [
    ("GIT_AUTHOR_NAME", "Fixture"),
    ("GIT_AUTHOR_EMAIL", "fixture@example.com"),
    ("GIT_COMMITTER_NAME", "Fixture"),
    ("GIT_COMMITTER_EMAIL", "fixture@example.com"),
];

pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Run git in `dir` and return trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Cmd::new("git")
        .args(args)
        .cwd(dir)
        .envs(TEST_IDENTITY)
        .run()
        .unwrap();
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Work tree with `index.html` and an `origin` pointing at a bare repository.
pub struct Fixture {
    _temp: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = normalize_path(temp.path());
        let remote = base.join("remote.git");
        let work = base.join("site");

        fs::create_dir_all(&remote).unwrap();
        git(&remote, &["init", "--quiet", "--bare"]);

        fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "--quiet"]);
        git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);
        fs::write(work.join("index.html"), "<h1>v1</h1>").unwrap();

        Self {
            _temp: temp,
            work,
            remote,
        }
    }

    pub fn backend(&self) -> GitCli {
        GitCli::new(&self.work, &DeployConfig::default()).unwrap()
    }

    /// Default plan for the work tree, with an untimestamped message.
    pub fn plan(&self) -> DeployPlan {
        let mut config = Config::default();
        config.root = self.work.clone();
        config.deploy.commit.timestamp = false;
        DeployPlan::from_config(&config, None)
    }

    pub fn deploy(&self) -> Result<Outcome, DeployError> {
        let mut vcs = self.backend();
        let plan = self.plan();
        Sequencer::new(&mut vcs, &plan).run()
    }

    pub fn remote_ref(&self, branch: &str) -> String {
        git(&self.remote, &["rev-parse", &format!("refs/heads/{branch}")])
    }

    pub fn commit_count(&self) -> usize {
        git(&self.work, &["rev-list", "--count", "HEAD"]).parse().unwrap()
    }

    pub fn push_log(&self) -> PathBuf {
        self.work.join(".git").join(PUSH_LOG_NAME)
    }
}
