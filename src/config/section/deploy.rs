//! `[deploy]` section configuration.
//!
//! Contains the publishing target, branch fallback pair, commit message
//! policy and placeholder identity.
//!
//! # Example
//!
//! ```toml
//! [deploy]
//! file = "index.html"         # File to publish, relative to the working directory
//! remote = "origin"           # Remote alias
//! force = false               # Force push (overwrites remote history)
//! set_upstream = true         # Pass --set-upstream to push
//! pty = false                 # Run push in a pseudo-terminal (credential prompts)
//! log_file = "push.log"       # Optional: where failing push output goes
//!
//! [deploy.branches]
//! primary = "main"
//! fallback = "master"
//!
//! [deploy.commit]
//! message = "Update {file}"   # Default message; `{file}` is replaced
//! allow_override = true       # Accept a message from the command line
//! timestamp = true            # Append generation time to the default message
//!
//! [deploy.identity]
//! name = "pagepush"           # Used only when git has no identity configured
//! email = "pagepush@localhost"
//! ```

use crate::{
    config::{ConfigDiagnostics, FieldPath},
    utils::{git::Identity, path::is_contained},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deploy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// File to publish, relative to the working directory.
    pub file: PathBuf,

    /// Remote alias to push to.
    pub remote: String,

    /// Force push (overwrites remote history).
    pub force: bool,

    /// Record the pushed branch as upstream of the current branch.
    pub set_upstream: bool,

    /// Run push inside a pseudo-terminal.
    pub pty: bool,

    /// Where failing push output is written (default: inside `.git`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Primary and fallback branch names.
    pub branches: BranchConfig,

    /// Commit message policy.
    pub commit: CommitConfig,

    /// Placeholder committer identity.
    pub identity: Identity,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("index.html"),
            remote: "origin".to_string(),
            force: false,
            set_upstream: true,
            pty: false,
            log_file: None,
            branches: BranchConfig::default(),
            commit: CommitConfig::default(),
            identity: Identity::default(),
        }
    }
}

/// Field paths of `[deploy]` for diagnostics.
pub struct DeployFields {
    pub file: FieldPath,
    pub remote: FieldPath,
    pub primary: FieldPath,
    pub fallback: FieldPath,
    pub message: FieldPath,
    pub identity_name: FieldPath,
    pub identity_email: FieldPath,
}

impl DeployConfig {
    pub const FIELDS: DeployFields = DeployFields {
        file: FieldPath::new("deploy.file"),
        remote: FieldPath::new("deploy.remote"),
        primary: FieldPath::new("deploy.branches.primary"),
        fallback: FieldPath::new("deploy.branches.fallback"),
        message: FieldPath::new("deploy.commit.message"),
        identity_name: FieldPath::new("deploy.identity.name"),
        identity_email: FieldPath::new("deploy.identity.email"),
    };

    /// Validate deploy configuration.
    ///
    /// # Checks
    /// - `file` is a relative path that stays inside the working directory.
    /// - `remote` is a non-empty alias without whitespace.
    /// - Both branch names are valid and distinct.
    /// - The commit message template is not blank.
    /// - The placeholder identity has a name and an email with `@`.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let fields = &Self::FIELDS;

        if !is_contained(&self.file) {
            diag.error_with_hint(
                fields.file,
                format!(
                    "{} must stay inside the working directory: {}",
                    fields.file,
                    self.file.display()
                ),
                "use a path relative to the working directory, e.g. `index.html`",
            );
        }

        if self.remote.trim().is_empty() || self.remote.chars().any(char::is_whitespace) {
            diag.error(
                fields.remote,
                format!("{} is not a valid remote alias: {:?}", fields.remote, self.remote),
            );
        }

        for (field, name) in [
            (fields.primary, &self.branches.primary),
            (fields.fallback, &self.branches.fallback),
        ] {
            if let Err(reason) = check_branch_name(name) {
                diag.error(field, format!("{field} {reason}: {name:?}"));
            }
        }
        if self.branches.primary == self.branches.fallback {
            diag.error_with_hint(
                fields.fallback,
                format!("{} must differ from the primary branch", fields.fallback),
                "the fallback is only tried after the primary push fails",
            );
        }

        if self.commit.message.trim().is_empty() {
            diag.error(fields.message, format!("{} cannot be empty", fields.message));
        }

        if self.identity.name.trim().is_empty() {
            diag.error(
                fields.identity_name,
                format!("{} cannot be empty", fields.identity_name),
            );
        }
        if !self.identity.email.contains('@') {
            diag.error(
                fields.identity_email,
                format!(
                    "{} is not an email address: {:?}",
                    fields.identity_email, self.identity.email
                ),
            );
        }
    }
}

/// Check a branch name against git's ref naming rules.
fn check_branch_name(name: &str) -> Result<(), &'static str> {
    const FORBIDDEN: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

    if name.is_empty() {
        return Err("cannot be empty");
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN.contains(&c)) {
        return Err("contains a character git does not allow");
    }
    if name.starts_with('-') || name.starts_with('/') || name.ends_with('/') {
        return Err("cannot start with `-` or `/`, or end with `/`");
    }
    if name.contains("..") || name.contains("//") || name.contains("@{") {
        return Err("contains a forbidden sequence");
    }
    if name.ends_with(".lock") || name.ends_with('.') {
        return Err("cannot end with `.lock` or `.`");
    }
    Ok(())
}

/// `[deploy.branches]`: ordered pair tried during push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    pub primary: String,
    pub fallback: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            primary: "main".to_string(),
            fallback: "master".to_string(),
        }
    }
}

/// `[deploy.commit]`: where the commit message comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Default message; `{file}` is replaced with the target file name.
    pub message: String,

    /// Accept a message given on the command line.
    pub allow_override: bool,

    /// Append the generation time to the default message.
    pub timestamp: bool,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            message: "Update {file}".to_string(),
            allow_override: true,
            timestamp: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, test_parse_config};

    fn validate(config: &DeployConfig) -> ConfigDiagnostics {
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        diag
    }

    #[test]
    fn test_deploy_config() {
        let config = test_parse_config(
            r#"[deploy]
file = "public/index.html"
remote = "pages"
force = true
pty = true
log_file = "~/push.log"

[deploy.branches]
primary = "gh-pages"
fallback = "pages"

[deploy.commit]
message = "Publish {file}"
allow_override = false
timestamp = false

[deploy.identity]
name = "Site Bot"
email = "bot@example.com""#,
        );

        assert_eq!(config.deploy.file, PathBuf::from("public/index.html"));
        assert_eq!(config.deploy.remote, "pages");
        assert!(config.deploy.force);
        assert!(config.deploy.pty);
        assert_eq!(config.deploy.log_file, Some(PathBuf::from("~/push.log")));
        assert_eq!(config.deploy.branches.primary, "gh-pages");
        assert_eq!(config.deploy.branches.fallback, "pages");
        assert_eq!(config.deploy.commit.message, "Publish {file}");
        assert!(!config.deploy.commit.allow_override);
        assert!(!config.deploy.commit.timestamp);
        assert_eq!(config.deploy.identity.name, "Site Bot");
        assert_eq!(config.deploy.identity.email, "bot@example.com");
    }

    #[test]
    fn test_deploy_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(config.deploy.file, PathBuf::from("index.html"));
        assert_eq!(config.deploy.remote, "origin");
        assert!(!config.deploy.force);
        assert!(config.deploy.set_upstream);
        assert!(!config.deploy.pty);
        assert!(config.deploy.log_file.is_none());
        assert_eq!(config.deploy.branches.primary, "main");
        assert_eq!(config.deploy.branches.fallback, "master");
        assert!(config.deploy.commit.allow_override);
        assert!(config.deploy.commit.timestamp);
        assert!(validate(&config.deploy).is_empty());
    }

    #[test]
    fn test_deploy_partial_section_keeps_other_defaults() {
        let config = test_parse_config("[deploy.branches]\nprimary = \"trunk\"");
        assert_eq!(config.deploy.branches.primary, "trunk");
        assert_eq!(config.deploy.branches.fallback, "master");
    }

    #[test]
    fn test_deploy_unknown_field_detected() {
        let (_, ignored) = Config::parse_with_ignored("[deploy]\nunknown = \"field\"").unwrap();
        assert!(ignored.iter().any(|f| f.contains("unknown")));
    }

    #[test]
    fn test_deploy_identity_unknown_field_detected() {
        let (_, ignored) = Config::parse_with_ignored("[deploy.identity]\nnick = \"bot\"").unwrap();
        assert!(ignored.iter().any(|f| f.contains("nick")));
    }

    #[test]
    fn test_validate_rejects_escaping_file() {
        let config = DeployConfig {
            file: PathBuf::from("../outside.html"),
            ..DeployConfig::default()
        };
        let diag = validate(&config);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field, DeployConfig::FIELDS.file);
    }

    #[test]
    fn test_validate_rejects_same_branches() {
        let mut config = DeployConfig::default();
        config.branches.fallback = "main".to_string();
        let diag = validate(&config);
        assert!(diag.errors().iter().any(|e| e.field == DeployConfig::FIELDS.fallback));
    }

    #[test]
    fn test_validate_collects_multiple_errors() {
        let mut config = DeployConfig::default();
        config.remote = "has space".to_string();
        config.commit.message = "  ".to_string();
        config.identity.email = "nobody".to_string();
        let diag = validate(&config);
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_check_branch_name() {
        assert!(check_branch_name("main").is_ok());
        assert!(check_branch_name("gh-pages").is_ok());
        assert!(check_branch_name("release/v1").is_ok());

        assert!(check_branch_name("").is_err());
        assert!(check_branch_name("has space").is_err());
        assert!(check_branch_name("-main").is_err());
        assert!(check_branch_name("a..b").is_err());
        assert!(check_branch_name("main.lock").is_err());
        assert!(check_branch_name("feat:x").is_err());
        assert!(check_branch_name("trailing/").is_err());
    }
}
