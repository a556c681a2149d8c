//! Commit message selection.

use crate::{config::CommitConfig, utils::date::DateTimeUtc};
use std::path::Path;

/// Where the commit message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Supplied on the command line.
    Caller,
    /// Built from `[deploy.commit] message`.
    Default,
}

/// A resolved commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub text: String,
    pub source: MessageSource,
}

/// Pick the commit message for this run.
///
/// A caller-supplied message wins when the policy allows overrides and the
/// message is not blank. Otherwise the template is used, with `{file}`
/// replaced and the generation time appended when enabled.
pub fn commit_message(
    policy: &CommitConfig,
    file: &Path,
    supplied: Option<&str>,
    now: DateTimeUtc,
) -> CommitMessage {
    if policy.allow_override
        && let Some(text) = supplied.map(str::trim).filter(|s| !s.is_empty())
    {
        return CommitMessage {
            text: text.to_string(),
            source: MessageSource::Caller,
        };
    }

    let base = policy.message.replace("{file}", &file.display().to_string());
    let text = if policy.timestamp {
        format!("{base} ({now})")
    } else {
        base
    };

    CommitMessage {
        text,
        source: MessageSource::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: DateTimeUtc = DateTimeUtc::new(2024, 6, 15, 14, 30, 45);

    #[test]
    fn test_default_message_with_timestamp() {
        let msg = commit_message(&CommitConfig::default(), Path::new("index.html"), None, NOW);
        assert_eq!(msg.text, "Update index.html (2024-06-15 14:30:45 UTC)");
        assert_eq!(msg.source, MessageSource::Default);
    }

    #[test]
    fn test_default_message_without_timestamp() {
        let policy = CommitConfig {
            message: "Publish site".into(),
            timestamp: false,
            ..CommitConfig::default()
        };
        let msg = commit_message(&policy, Path::new("index.html"), None, NOW);
        assert_eq!(msg.text, "Publish site");
    }

    #[test]
    fn test_caller_message_wins_when_allowed() {
        let msg = commit_message(
            &CommitConfig::default(),
            Path::new("index.html"),
            Some("  Fix typo in footer "),
            NOW,
        );
        assert_eq!(msg.text, "Fix typo in footer");
        assert_eq!(msg.source, MessageSource::Caller);
    }

    #[test]
    fn test_caller_message_ignored_when_disallowed() {
        let policy = CommitConfig {
            allow_override: false,
            ..CommitConfig::default()
        };
        let msg = commit_message(&policy, Path::new("index.html"), Some("custom"), NOW);
        assert_eq!(msg.source, MessageSource::Default);
        assert!(msg.text.starts_with("Update index.html"));
    }

    #[test]
    fn test_blank_caller_message_falls_back() {
        let msg = commit_message(&CommitConfig::default(), Path::new("a.html"), Some("   "), NOW);
        assert_eq!(msg.source, MessageSource::Default);
        assert!(msg.text.starts_with("Update a.html"));
    }
}
