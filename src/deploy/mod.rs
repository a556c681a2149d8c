//! Deploy sequencing.
//!
//! Publishes one file to a git remote:
//!
//! 1. Ensure a repository exists (initialize one otherwise)
//! 2. Resolve the committer identity (placeholder when none is configured)
//! 3. Check the target file exists
//! 4. Stage it
//! 5. Stop early when the staged content matches the last commit
//! 6. Commit
//! 7. Push under the primary branch name, then the fallback
//!
//! Every step returns a [`DeployError`] variant on failure and the run stops
//! there. "Nothing changed" is a successful [`Outcome::NoChange`].

mod error;
mod message;
mod plan;
mod sequencer;


pub use error::{DeployError, PushFailure};
pub use message::MessageSource;
pub use plan::DeployPlan;
pub use sequencer::{Outcome, Sequencer};
