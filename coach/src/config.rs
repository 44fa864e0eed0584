//! Coach configuration
//!
//! Timing of the simulated "thinking" pauses, the ply checkpoint and the
//! opponent's error rate. Loaded from a JSON file; anything missing or
//! unreadable falls back to the defaults so a bad file never stops a game.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chess_agents::{Agent, OpponentPolicy, DEFAULT_BLUNDER_RATE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoachError, CoachResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Pause before the opponent replies
    pub opponent_delay_ms: u64,
    /// Pause between the opponent's reply and the refreshed recommendations
    pub reevaluation_delay_ms: u64,
    /// Completed turns after which a verdict is requested
    pub ply_cap: u32,
    /// Chance that the opponent plays its second-best move
    pub blunder_rate: f64,
    /// Fixed seed for the opponent; entropy when absent
    pub seed: Option<u64>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            opponent_delay_ms: 1000,
            reevaluation_delay_ms: 2000,
            ply_cap: 10,
            blunder_rate: DEFAULT_BLUNDER_RATE,
            seed: None,
        }
    }
}

impl CoachConfig {
    /// Defaults with both pauses removed.
    pub fn instant() -> Self {
        Self {
            opponent_delay_ms: 0,
            reevaluation_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn opponent_delay(&self) -> Duration {
        Duration::from_millis(self.opponent_delay_ms)
    }

    pub fn reevaluation_delay(&self) -> Duration {
        Duration::from_millis(self.reevaluation_delay_ms)
    }

    pub fn from_json(json: &str) -> CoachResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration file, failing on I/O or parse errors.
    pub fn read(path: &Path) -> CoachResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| CoachError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Reads a configuration file, using defaults when it is missing or
    /// invalid.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load config from {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    /// Builds the opponent described by this configuration.
    pub fn opponent(&self) -> Box<dyn Agent> {
        match self.seed {
            Some(seed) => Box::new(OpponentPolicy::seeded(seed, self.blunder_rate)),
            None => Box::new(OpponentPolicy::from_entropy(self.blunder_rate)),
        }
    }
}
