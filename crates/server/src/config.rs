//! Chat server configuration

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::clock::Clock;
use crate::messages::MessageLog;
use crate::presence::PresenceTracker;
use crate::store::ChatStore;

/// `DATABASE_URL` value selecting the in-process store.
pub const MEMORY_STORE_URL: &str = "memory";

/// Configuration for the chat server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// SQLite URL, or `memory` for the in-process store
    pub database_url: String,
    /// Silence after which a participant is evicted
    pub stale_after: Duration,
    /// Time between reaper sweeps
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "sqlite:batepapo.sqlite".to_string(),
            stale_after: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    /// Load `env_file` (or the nearest `.env` when `None`) into the process
    /// environment, then read the configuration from it. Variables already
    /// set in the environment win over the file.
    pub fn load(env_file: Option<&Path>) -> Self {
        let loaded = match env_file {
            Some(path) => dotenv::from_path(path),
            None => dotenv::dotenv().map(|_| ()),
        };
        if let Err(e) = loaded {
            if env_file.is_some() {
                warn!("Could not load env file: {}", e);
            }
        }
        Self::from_env()
    }

    /// Read `PORT`, `DATABASE_URL`, `STALE_AFTER_SECS` and `SWEEP_INTERVAL_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            database_url: lookup("DATABASE_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.database_url),
            stale_after: Duration::from_secs(parse_or(
                "STALE_AFTER_SECS",
                lookup("STALE_AFTER_SECS"),
                defaults.stale_after.as_secs(),
            )),
            sweep_interval: Duration::from_secs(parse_or(
                "SWEEP_INTERVAL_SECS",
                lookup("SWEEP_INTERVAL_SECS"),
                defaults.sweep_interval.as_secs(),
            )),
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_STORE_URL
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub presence: PresenceTracker,
    pub messages: MessageLog,
}

impl AppState {
    pub fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            presence: PresenceTracker::new(store.clone(), clock.clone()),
            messages: MessageLog::new(store, clock),
        }
    }
}
