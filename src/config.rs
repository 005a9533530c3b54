use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::handlers::SessionConfig;
use crate::voting::{AUTO_CONFIRM_SECONDS, VOTER_SAMPLE_LIMIT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Posts JSON file; bundled mock data when unset
    pub data_path: Option<PathBuf>,
    pub vote_delay: Duration,
    pub undo_seconds: u32,
    pub voter_sample: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            data_path: lookup("POLLS_DATA").map(PathBuf::from),
            vote_delay: Duration::from_millis(try_load(&lookup, "POLL_VOTE_DELAY_MS", 500u64)),
            undo_seconds: try_load(&lookup, "POLL_UNDO_SECONDS", AUTO_CONFIRM_SECONDS).max(1),
            voter_sample: try_load(&lookup, "POLL_VOTER_SAMPLE", VOTER_SAMPLE_LIMIT),
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            vote_delay: self.vote_delay,
            undo_seconds: self.undo_seconds,
            voter_sample: self.voter_sample,
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = config(&[]);
        assert_eq!(c.data_path, None);
        assert_eq!(c.vote_delay, Duration::from_millis(500));
        assert_eq!(c.undo_seconds, 5);
        assert_eq!(c.voter_sample, 8);
        assert_eq!(c.session(), SessionConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let c = config(&[
            ("POLLS_DATA", "/srv/polls.json"),
            ("POLL_VOTE_DELAY_MS", "250"),
            ("POLL_UNDO_SECONDS", " 10 "),
        ]);
        assert_eq!(c.data_path, Some(PathBuf::from("/srv/polls.json")));
        assert_eq!(c.vote_delay, Duration::from_millis(250));
        assert_eq!(c.undo_seconds, 10);
    }

    #[test]
    fn bad_values_fall_back() {
        let c = config(&[("POLL_UNDO_SECONDS", "soon"), ("POLL_VOTER_SAMPLE", "-1")]);
        assert_eq!(c.undo_seconds, 5);
        assert_eq!(c.voter_sample, 8);

        let c = config(&[("POLL_UNDO_SECONDS", "0")]);
        assert_eq!(c.undo_seconds, 1);
    }
}
