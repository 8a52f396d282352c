use std::env;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::blockchain::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};

/// Node settings, read from the environment (and `.env` via dotenvy in `main`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    /// Upper bound for one peer chain request during conflict resolution.
    pub peer_timeout: Duration,
    /// Recipient of mining rewards.
    pub node_id: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults.
    /// `DIFFICULTY` must lie in `1..=64`.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        fn parsed<T: FromStr>(raw: Option<String>, default: T) -> T {
            raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        }

        let node_id = lookup("NODE_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(lookup("PORT"), 8080),
            difficulty: lookup("DIFFICULTY")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|d| (1..=MAX_DIFFICULTY).contains(d))
                .unwrap_or(DEFAULT_DIFFICULTY),
            peer_timeout: Duration::from_millis(parsed(lookup("PEER_TIMEOUT_MS"), 5_000)),
            node_id,
        }
    }
}
