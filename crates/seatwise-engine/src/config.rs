//! # Engine Configuration
//!
//! Tunables for scheduling, the waitlist and the database.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SEATWISE_TURNOVER_BUFFER_MINUTES=20                                │
//! │     SEATWISE_DB_PATH=/var/lib/seatwise/seatwise.db                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/seatwise/seatwise.toml (Linux)                           │
//! │     ~/Library/Application Support/com.seatwise.engine/seatwise.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     15 min buffer, 30 min slots, 240 min wait cap                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [scheduling]
//! turnover_buffer_minutes = 15
//! slot_granularity_minutes = 30
//! default_slot_duration_minutes = 120
//!
//! [waitlist]
//! max_wait_minutes = 240
//! turnover_lookback_days = 7
//! event_channel_capacity = 256
//!
//! [database]
//! path = "seatwise.db"
//! max_connections = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use seatwise_core::{SchedulingPolicy, WaitlistPolicy};
use seatwise_db::DbConfig;

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Sections
// =============================================================================

/// `[waitlist]`: the estimate policy plus the event channel size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistSettings {
    #[serde(flatten)]
    pub policy: WaitlistPolicy,

    /// Buffered events before publishing starts dropping.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_event_channel_capacity() -> usize {
    256
}

impl Default for WaitlistSettings {
    fn default() -> Self {
        WaitlistSettings {
            policy: WaitlistPolicy::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// `[database]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; `None` means the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scheduling: SchedulingPolicy,

    #[serde(default)]
    pub waitlist: WaitlistSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (seatwise.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns the defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Rejects values the algorithms cannot work with.
    pub fn validate(&self) -> EngineResult<()> {
        let s = &self.scheduling;
        if s.turnover_buffer_minutes < 0 {
            return Err(EngineError::Config("turnover_buffer_minutes must not be negative".into()));
        }
        if s.slot_granularity_minutes <= 0 {
            return Err(EngineError::Config("slot_granularity_minutes must be greater than 0".into()));
        }
        if s.default_slot_duration_minutes <= 0 {
            return Err(EngineError::Config(
                "default_slot_duration_minutes must be greater than 0".into(),
            ));
        }
        if s.optimal_fit_slack < 0 || s.future_party_slack < 0 {
            return Err(EngineError::Config("fit slacks must not be negative".into()));
        }
        if !s.waste_weight.is_finite() || s.waste_weight < 0.0 {
            return Err(EngineError::Config("waste_weight must be a non-negative number".into()));
        }

        let w = &self.waitlist.policy;
        if w.max_wait_minutes <= 0 {
            return Err(EngineError::Config("max_wait_minutes must be greater than 0".into()));
        }
        if w.default_turnover_minutes <= 0 {
            return Err(EngineError::Config("default_turnover_minutes must be greater than 0".into()));
        }
        if w.turnover_lookback_days < 0 || w.similar_party_tolerance < 0 {
            return Err(EngineError::Config(
                "turnover_lookback_days and similar_party_tolerance must not be negative".into(),
            ));
        }
        if self.waitlist.event_channel_capacity == 0 {
            return Err(EngineError::Config("event_channel_capacity must be greater than 0".into()));
        }

        if self.database.max_connections == 0 {
            return Err(EngineError::Config("max_connections must be greater than 0".into()));
        }

        Ok(())
    }

    /// Applies `SEATWISE_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        override_from_env("SEATWISE_TURNOVER_BUFFER_MINUTES", &mut self.scheduling.turnover_buffer_minutes);
        override_from_env("SEATWISE_SLOT_GRANULARITY_MINUTES", &mut self.scheduling.slot_granularity_minutes);
        override_from_env(
            "SEATWISE_DEFAULT_SLOT_DURATION_MINUTES",
            &mut self.scheduling.default_slot_duration_minutes,
        );
        override_from_env("SEATWISE_MAX_WAIT_MINUTES", &mut self.waitlist.policy.max_wait_minutes);
        override_from_env(
            "SEATWISE_DEFAULT_TURNOVER_MINUTES",
            &mut self.waitlist.policy.default_turnover_minutes,
        );
        override_from_env(
            "SEATWISE_TURNOVER_LOOKBACK_DAYS",
            &mut self.waitlist.policy.turnover_lookback_days,
        );
        override_from_env(
            "SEATWISE_EVENT_CHANNEL_CAPACITY",
            &mut self.waitlist.event_channel_capacity,
        );
        override_from_env("SEATWISE_DB_MAX_CONNECTIONS", &mut self.database.max_connections);

        if let Ok(path) = std::env::var("SEATWISE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "seatwise", "engine")
            .map(|dirs| dirs.config_dir().join("seatwise.toml"))
    }

    /// Pool settings for [`seatwise_db::Database::new`].
    pub fn db_config(&self) -> EngineResult<DbConfig> {
        let path = match &self.database.path {
            Some(path) => path.clone(),
            None => {
                let dirs = directories::ProjectDirs::from("com", "seatwise", "engine")
                    .ok_or_else(|| EngineError::Config("Could not determine data directory".into()))?;
                std::fs::create_dir_all(dirs.data_dir())?;
                dirs.data_dir().join("seatwise.db")
            }
        };

        Ok(DbConfig::new(path).max_connections(self.database.max_connections))
    }
}

/// Parses `key` into `target` when set; unparsable values are logged and ignored.
fn override_from_env<T>(key: &str, target: &mut T)
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(value) => {
            debug!(key, value = %value, "Overriding config from environment");
            *target = value;
        }
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable environment override"),
    }
}
