//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Default capacity of the recent-prediction log.
pub const DEFAULT_PREDICTION_CAPACITY: usize = 20;
/// Default capacity of the recent-correctness log.
pub const DEFAULT_CORRECTNESS_CAPACITY: usize = 20;
/// Consecutive misses that switch the cascade into failure-adaptive mode.
pub const DEFAULT_EMERGENCY_FAILURES: usize = 3;
/// The anti-repeat rules look back this many predictions.
pub const ANTI_REPEAT_WINDOW: usize = 3;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroCapacity { field: &'static str },
    #[error("prediction_capacity too small (got={got}, min={min})")]
    PredictionCapacityTooSmall { got: usize, min: usize },
    #[error("emergency_failures out of range (got={got}, max={max})")]
    EmergencyFailuresOutOfRange { got: usize, max: usize },
    #[error("unknown profile {0:?} (expected cascade or consensus)")]
    UnknownProfile(String),
}

/// Detector set used by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Strict-priority rule cascade: the first applicable rule wins.
    #[default]
    Cascade,
    /// Weighted voting across signals.
    Consensus,
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "consensus" => Ok(Self::Consensus),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cascade => f.write_str("cascade"),
            Self::Consensus => f.write_str("consensus"),
        }
    }
}

/// Threshold used when confirming a flagged bias against the last 5/7 non-tie hands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MajorityStrictness {
    /// At least 5 of 7 or 4 of 5.
    #[default]
    Strict,
    /// At least 4 of 7 or 3 of 5.
    Loose,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub profile: Profile,
    pub prediction_capacity: usize,
    pub correctness_capacity: usize,
    /// Consecutive reported misses that trigger the failure-adaptive override.
    pub emergency_failures: usize,
    pub majority: MajorityStrictness,
    /// Seed for the random fallback. `None` draws one from the OS at construction.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Cascade,
            prediction_capacity: DEFAULT_PREDICTION_CAPACITY,
            correctness_capacity: DEFAULT_CORRECTNESS_CAPACITY,
            emergency_failures: DEFAULT_EMERGENCY_FAILURES,
            majority: MajorityStrictness::Strict,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prediction_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "prediction_capacity",
            });
        }
        if self.prediction_capacity < ANTI_REPEAT_WINDOW {
            return Err(ConfigError::PredictionCapacityTooSmall {
                got: self.prediction_capacity,
                min: ANTI_REPEAT_WINDOW,
            });
        }
        if self.correctness_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "correctness_capacity",
            });
        }
        if self.emergency_failures == 0 || self.emergency_failures > self.correctness_capacity {
            return Err(ConfigError::EmergencyFailuresOutOfRange {
                got: self.emergency_failures,
                max: self.correctness_capacity,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}
