//! Deploy command.

use anyhow::Result;

use crate::config::Config;
use crate::deploy::{DeployPlan, MessageSource, Outcome, Sequencer};
use crate::utils::git::GitCli;
use crate::{debug, log};

/// Publish the configured file and report what happened.
pub fn deploy_site(config: &Config, message: Option<&str>) -> Result<Outcome> {
    let plan = DeployPlan::from_config(config, message);

    if let Some(ignored) = ignored_message(message, &plan) {
        log!(
            "warning";
            "commit message overrides are disabled, ignoring \"{}\" and using \"{}\"",
            ignored,
            plan.message.text
        );
    }

    log!("deploy"; "{} -> {}", plan.file.display(), plan.remote);

    let mut vcs = GitCli::new(&plan.root, &config.deploy)?;
    let mut sequencer = Sequencer::new(&mut vcs, &plan);
    let result = sequencer.run();
    debug_assert!(sequencer.stage().is_terminal());
    debug!("deploy"; "stopped at {:?}", sequencer.stage());
    let outcome = result?;

    match &outcome {
        Outcome::NoChange => log!("done"; "already up to date"),
        Outcome::Published { branch, commit } => {
            let short = commit.get(..7).unwrap_or(commit);
            log!("done"; "published {} to {}/{}", short, plan.remote, branch);
        }
    }
    Ok(outcome)
}

/// Process exit status for a finished run: success and "nothing changed"
/// are `0`, every failure is `1`.
pub fn exit_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// The caller's message when the commit policy discarded it.
fn ignored_message<'a>(supplied: Option<&'a str>, plan: &DeployPlan) -> Option<&'a str> {
    let supplied = supplied.map(str::trim).filter(|m| !m.is_empty())?;
    (plan.message.source == MessageSource::Default).then_some(supplied)
}
