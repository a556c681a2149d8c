use super::{DeployError, DeployPlan, PushFailure};
use std::{fs, path::Path};
use crate::{
    debug, log,
    utils::git::{Identity, Vcs},
};

/// Position in the deploy state machine.
///
/// ```text
/// Start → RepoChecked → IdentityChecked → InputChecked → Staged
///       → { NoChange | Committed → Pushed }
/// ```
///
/// Any fatal step moves to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    RepoChecked,
    IdentityChecked,
    InputChecked,
    Staged,
    Committed,
    NoChange,
    Pushed,
    Failed,
}

impl Stage {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::NoChange | Self::Pushed | Self::Failed)
    }
}

/// Successful result of a deploy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Target file matches the last commit; nothing was committed or pushed.
    NoChange,
    /// A commit was created and pushed.
    Published { branch: String, commit: String },
}

/// Runs the deploy steps in order against a [`Vcs`] backend.
pub struct Sequencer<'a, V: Vcs> {
    vcs: &'a mut V,
    plan: &'a DeployPlan,
    stage: Stage,
}

impl<'a, V: Vcs> Sequencer<'a, V> {
    pub fn new(vcs: &'a mut V, plan: &'a DeployPlan) -> Self {
        Self {
            vcs,
            plan,
            stage: Stage::Start,
        }
    }

    /// Current state machine position.
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Run every step until a terminal state is reached.
    pub fn run(&mut self) -> Result<Outcome, DeployError> {
        debug_assert_eq!(self.stage, Stage::Start, "a sequencer runs once");

        let result = self.run_steps();
        if result.is_err() {
            self.advance(Stage::Failed);
        }
        result
    }

    fn run_steps(&mut self) -> Result<Outcome, DeployError> {
        self.ensure_repo()?;
        let identity = self.resolve_identity();
        self.check_input()?;
        self.stage_file()?;

        if !self.detect_change()? {
            log!("deploy"; "{} unchanged, nothing to deploy", self.plan.file.display());
            self.advance(Stage::NoChange);
            return Ok(Outcome::NoChange);
        }

        let commit = self.commit(identity.as_ref())?;
        let branch = self.push()?;
        Ok(Outcome::Published { branch, commit })
    }

    fn advance(&mut self, next: Stage) {
        debug!("deploy"; "{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    /// Initialize a repository when none exists at the working directory.
    fn ensure_repo(&mut self) -> Result<(), DeployError> {
        if !self.vcs.has_repo() {
            self.vcs
                .init_repo()
                .map_err(|e| DeployError::Initialization {
                    path: self.plan.root.clone(),
                    reason: format!("{e:#}"),
                })?;
        }
        self.advance(Stage::RepoChecked);
        Ok(())
    }

    /// Identity override for the commit: `None` keeps git's own identity.
    ///
    /// Never fails; an unreadable identity is treated as missing.
    fn resolve_identity(&mut self) -> Option<Identity> {
        let configured = self.vcs.identity().unwrap_or_else(|e| {
            debug!("deploy"; "could not read git identity: {e:#}");
            None
        });

        let identity = match configured {
            Some(id) => {
                debug!("deploy"; "committing as {id}");
                None
            }
            None => {
                log!("deploy"; "no git identity configured, committing as {}", self.plan.identity);
                Some(self.plan.identity.clone())
            }
        };
        self.advance(Stage::IdentityChecked);
        identity
    }

    fn check_input(&mut self) -> Result<(), DeployError> {
        let path = self.plan.target_path();
        if !path.is_file() {
            let dir = path.parent().unwrap_or(&self.plan.root).to_path_buf();
            let candidates = html_files(&dir);
            return Err(DeployError::MissingInput {
                path,
                dir,
                candidates,
            });
        }
        self.advance(Stage::InputChecked);
        Ok(())
    }

    fn stage_file(&mut self) -> Result<(), DeployError> {
        let file = &self.plan.file;
        self.vcs.stage(file).map_err(|e| DeployError::Staging {
            file: file.clone(),
            reason: format!("{e:#}"),
        })?;
        self.advance(Stage::Staged);
        Ok(())
    }

    /// Compare the staged file with the last commit.
    fn detect_change(&mut self) -> Result<bool, DeployError> {
        let file = &self.plan.file;
        self.vcs
            .has_staged_changes(file)
            .map_err(|e| DeployError::Staging {
                file: file.clone(),
                reason: format!("{e:#}"),
            })
    }

    fn commit(&mut self, identity: Option<&Identity>) -> Result<String, DeployError> {
        let plan = self.plan;
        let id = self
            .vcs
            .commit(&plan.file, &plan.message.text, identity)
            .map_err(|e| DeployError::Commit {
                reason: format!("{e:#}"),
            })?;
        self.advance(Stage::Committed);
        Ok(id)
    }

    /// Push under each branch name in order until one succeeds.
    fn push(&mut self) -> Result<String, DeployError> {
        let plan = self.plan;
        let mut failures: Vec<PushFailure> = Vec::new();

        for branch in plan.branches.iter() {
            if let Some(previous) = failures.last() {
                log!("push"; "push to {} failed, trying {}", previous.branch, branch);
            }
            log!("push"; "{} HEAD:{}", plan.remote, branch);

            match self.vcs.push(&plan.remote, branch, plan.force) {
                Ok(()) => {
                    self.advance(Stage::Pushed);
                    return Ok(branch.to_string());
                }
                Err(e) => {
                    let diagnostics = format!("{e:#}");
                    debug!("push"; "{}", diagnostics);
                    failures.push(PushFailure {
                        branch: branch.to_string(),
                        diagnostics,
                    });
                }
            }
        }

        Err(DeployError::Push { failures })
    }
}

/// Names of the `.html` files in `dir`, sorted.
fn html_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        })
        .filter_map(|path| Some(path.file_name()?.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}
