//! Backend and end-to-end tests against the real `git` executable.
//!
//! Each test returns early when `git` is not on `PATH`.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::fixture::{Fixture, git, git_available};
use super::repo::{create_repo, git_dir, has_repo};
use super::{GitCli, Identity, Vcs};
use crate::config::DeployConfig;
use crate::deploy::{DeployError, DeployPlan, Outcome, Sequencer};
use crate::utils::exec::Cmd;
use crate::utils::path::normalize_path;

#[test]
fn test_has_repo_and_create_repo() {
    let temp = TempDir::new().unwrap();
    assert!(!has_repo(temp.path()));

    let dir = create_repo(temp.path()).unwrap();
    assert!(dir.ends_with(".git"));
    assert!(has_repo(temp.path()));
    assert_eq!(normalize_path(&git_dir(temp.path()).unwrap()), normalize_path(&dir));
}

#[test]
fn test_has_repo_accepts_repository_gix_cannot_open() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let work = fx.work.parent().unwrap().join("sha256");
    fs::create_dir_all(&work).unwrap();
    let init = Cmd::new("git")
        .args(["init", "--quiet", "--object-format=sha256"])
        .cwd(&work)
        .allow_failure(true)
        .run()
        .unwrap();
    if !init.status.success() {
        return; // git without sha256 support
    }
    fs::write(work.join("index.html"), "<p>sha256</p>").unwrap();

    assert!(has_repo(&work));
    assert_eq!(git_dir(&work).unwrap(), work.join(".git"));

    // The existing repository is used, never re-initialized
    let mut vcs = GitCli::new(&work, &DeployConfig::default()).unwrap();
    let plan = DeployPlan {
        root: work.clone(),
        ..fx.plan()
    };
    let result = Sequencer::new(&mut vcs, &plan).run();
    assert!(!matches!(result, Err(DeployError::Initialization { .. })));
    assert_eq!(git(&work, &["rev-list", "--count", "HEAD"]), "1");
}

#[test]
fn test_has_repo_accepts_linked_worktree() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    fx.deploy().unwrap();
    let linked = fx.work.parent().unwrap().join("linked");
    git(&fx.work, &["worktree", "add", "--quiet", linked.to_str().unwrap()]);

    assert!(linked.join(".git").is_file());
    assert!(has_repo(&linked));
    assert_eq!(
        normalize_path(&git_dir(&linked).unwrap()),
        normalize_path(&fx.work.join(".git/worktrees/linked"))
    );
}

#[test]
fn test_git_dir_without_repo_fails() {
    let temp = TempDir::new().unwrap();
    assert!(git_dir(temp.path()).is_err());
}

#[test]
fn test_identity_from_repo_config() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    git(&fx.work, &["config", "user.name", "Site Owner"]);
    git(&fx.work, &["config", "user.email", "owner@example.com"]);

    let identity = fx.backend().identity().unwrap();
    assert_eq!(
        identity,
        Some(Identity {
            name: "Site Owner".into(),
            email: "owner@example.com".into(),
        })
    );
}

#[test]
fn test_staged_change_detection() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let mut vcs = fx.backend();
    let file = Path::new("index.html");

    // Unborn branch: everything staged is a change
    vcs.stage(file).unwrap();
    assert!(vcs.has_staged_changes(file).unwrap());

    vcs.commit(file, "first", Some(&Identity::default())).unwrap();
    vcs.stage(file).unwrap();
    assert!(!vcs.has_staged_changes(file).unwrap());

    fs::write(fx.work.join("index.html"), "<h1>v2</h1>").unwrap();
    vcs.stage(file).unwrap();
    assert!(vcs.has_staged_changes(file).unwrap());
}

#[test]
fn test_commit_uses_placeholder_identity() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let mut vcs = fx.backend();
    let file = Path::new("index.html");
    let identity = Identity {
        name: "Deploy Bot".into(),
        email: "bot@example.com".into(),
    };

    vcs.stage(file).unwrap();
    let id = vcs.commit(file, "Publish", Some(&identity)).unwrap();

    assert_eq!(git(&fx.work, &["rev-parse", "HEAD"]), id);
    assert_eq!(
        git(&fx.work, &["log", "-1", "--format=%an <%ae>|%cn <%ce>|%s"]),
        "Deploy Bot <bot@example.com>|Deploy Bot <bot@example.com>|Publish"
    );
}

#[test]
fn test_deploy_pushes_to_main() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();

    let outcome = fx.deploy().unwrap();

    let Outcome::Published { branch, commit } = outcome else {
        panic!("expected a published outcome");
    };
    assert_eq!(branch, "main");
    assert_eq!(fx.remote_ref("main"), commit);
    assert!(!fx.push_log().exists());
}

#[test]
fn test_redeploy_without_change_is_no_op() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    fx.deploy().unwrap();
    let before = fx.commit_count();

    assert_eq!(fx.deploy().unwrap(), Outcome::NoChange);
    assert_eq!(fx.commit_count(), before);
}

#[test]
fn test_changed_file_creates_exactly_one_commit() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    fx.deploy().unwrap();
    let before = fx.commit_count();

    fs::write(fx.work.join("index.html"), "<h1>v2</h1>").unwrap();
    fs::write(fx.work.join("notes.txt"), "draft").unwrap();
    git(&fx.work, &["add", "notes.txt"]);

    assert!(matches!(fx.deploy().unwrap(), Outcome::Published { .. }));
    assert_eq!(fx.commit_count(), before + 1);
    assert_eq!(
        git(&fx.work, &["show", "--name-only", "--format=", "HEAD"]),
        "index.html"
    );
}

#[test]
fn test_deploy_falls_back_to_master_when_main_rejected() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();

    // Someone else owns `main` with unrelated history
    let other = fx.work.parent().unwrap().join("other");
    fs::create_dir_all(&other).unwrap();
    git(&other, &["init", "--quiet"]);
    fs::write(other.join("README"), "unrelated").unwrap();
    git(&other, &["add", "README"]);
    git(&other, &["commit", "--quiet", "-m", "unrelated"]);
    git(&other, &["push", "--quiet", fx.remote.to_str().unwrap(), "HEAD:refs/heads/main"]);
    let foreign_main = fx.remote_ref("main");

    let outcome = fx.deploy().unwrap();

    let Outcome::Published { branch, commit } = outcome else {
        panic!("expected a published outcome");
    };
    assert_eq!(branch, "master");
    assert_eq!(fx.remote_ref("master"), commit);
    assert_eq!(fx.remote_ref("main"), foreign_main);
    // the master success clears the log left by the main failure
    assert!(!fx.push_log().exists());
}

#[test]
fn test_deploy_reports_both_push_failures() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let missing = fx.work.parent().unwrap().join("does-not-exist.git");
    git(&fx.work, &["remote", "set-url", "origin", missing.to_str().unwrap()]);

    let err = fx.deploy().unwrap_err();

    let DeployError::Push { failures } = &err else {
        panic!("expected a push error, got {err}");
    };
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].branch, "main");
    assert_eq!(failures[1].branch, "master");
    assert!(!failures[1].diagnostics.is_empty());

    let log = fs::read_to_string(fx.push_log()).unwrap();
    assert!(log.contains("HEAD:master"));
    assert!(log.contains(&failures[1].diagnostics));
}

#[test]
fn test_deploy_initializes_repository() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let work = normalize_path(temp.path());
    fs::write(work.join("index.html"), "<p>fresh</p>").unwrap();

    let mut vcs = GitCli::new(&work, &DeployConfig::default()).unwrap();
    let plan = DeployPlan {
        root: work.clone(),
        ..Fixture::new().plan()
    };
    let result = Sequencer::new(&mut vcs, &plan).run();

    // Repository and commit exist; no `origin` configured, so both pushes fail
    assert!(has_repo(&work));
    assert_eq!(git(&work, &["rev-list", "--count", "HEAD"]), "1");
    assert!(matches!(result, Err(DeployError::Push { .. })));
}

#[test]
fn test_deploy_missing_input_leaves_repository_untouched() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    fs::remove_file(fx.work.join("index.html")).unwrap();

    let err = fx.deploy().unwrap_err();

    assert!(matches!(err, DeployError::MissingInput { .. }));
    assert!(git(&fx.work, &["status", "--porcelain"]).is_empty());
}
