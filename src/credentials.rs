//! Twitch credential discovery.
//!
//! The access token is searched across an ordered list of candidate file
//! locations: the platform config directory, a home dot-directory, then a
//! local fallback file. The first file containing a usable token wins. No
//! safe default exists, so absence halts startup.

use crate::error::{PipelineError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolved Twitch credentials ready for runtime use.
///
/// Custom [`Debug`] redacts the token to prevent accidental leakage in logs.
pub struct TwitchCredentials {
    /// OAuth access token (without the `oauth:` prefix).
    pub access_token: String,
    /// File the token was loaded from.
    pub source: PathBuf,
}

impl fmt::Debug for TwitchCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitchCredentials")
            .field("access_token", &redact(&self.access_token))
            .field("source", &self.source)
            .finish()
    }
}

fn redact(s: &str) -> &str {
    if s.is_empty() { "" } else { "[REDACTED]" }
}

/// Ordered candidate paths for the credential store file.
#[must_use]
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("chattervox").join("credentials.json"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".chattervox").join("credentials.json"));
    }
    // Local fallback next to the process working directory.
    candidates.push(PathBuf::from("credentials.json"));
    candidates
}

/// Discover a Twitch access token from the default candidate locations.
///
/// # Errors
///
/// Returns a [`PipelineError::Credential`] when no candidate file yields a
/// usable token.
pub fn discover_twitch_token() -> Result<TwitchCredentials> {
    discover_twitch_token_in(&candidate_paths())
}

/// Discover a Twitch access token from an explicit candidate list.
///
/// # Errors
///
/// Returns a [`PipelineError::Credential`] when no candidate file yields a
/// usable token.
pub fn discover_twitch_token_in(candidates: &[PathBuf]) -> Result<TwitchCredentials> {
    for path in candidates {
        match read_token(path) {
            Some(access_token) => {
                info!("found twitch credentials in {}", path.display());
                return Ok(TwitchCredentials {
                    access_token,
                    source: path.clone(),
                });
            }
            None => debug!("no usable twitch token in {}", path.display()),
        }
    }

    Err(PipelineError::Credential(
        "twitch access token not found; connect your Twitch account first".to_owned(),
    ))
}

fn read_token(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let store: serde_json::Value = serde_json::from_str(&raw).ok()?;
    let token = store
        .pointer("/twitch_credentials/access_token")
        .and_then(serde_json::Value::as_str)?
        .trim();
    if token.is_empty() {
        return None;
    }
    Some(token.trim_start_matches("oauth:").to_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn write_store(dir: &Path, name: &str, token: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(
            &path,
            serde_json::json!({ "twitch_credentials": { "access_token": token } }).to_string(),
        )
        .unwrap();
        path
    }

    #[test]
    fn first_usable_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let empty = write_store(dir.path(), "empty.json", "");
        let good = write_store(dir.path(), "good.json", "abc123");
        let later = write_store(dir.path(), "later.json", "zzz999");

        let creds =
            discover_twitch_token_in(&[missing, empty, good.clone(), later]).unwrap();
        assert_eq!(creds.access_token, "abc123");
        assert_eq!(creds.source, good);
    }

    #[test]
    fn oauth_prefix_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_store(dir.path(), "store.json", "oauth:abc123");

        let creds = discover_twitch_token_in(&[path]).unwrap();
        assert_eq!(creds.access_token, "abc123");
    }

    #[test]
    fn no_candidates_is_a_credential_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");

        let result = discover_twitch_token_in(&[missing]);
        assert!(matches!(result, Err(PipelineError::Credential(_))));
    }

    #[test]
    fn malformed_store_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        let good = write_store(dir.path(), "good.json", "tok");

        let creds = discover_twitch_token_in(&[bad, good]).unwrap();
        assert_eq!(creds.access_token, "tok");
    }

    #[test]
    fn debug_output_redacts_token() {
        let creds = TwitchCredentials {
            access_token: "supersecret".to_owned(),
            source: PathBuf::from("credentials.json"),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
