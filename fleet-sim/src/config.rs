//! Simulation configuration with per-field defaults and validation.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants;
use crate::demand::DemandConfig;
use crate::port::Tier;
use crate::reward::RewardKind;

const DEFAULT_CONFIG_DATA: &str = include_str!("../data/config.json");

/// Errors raised when simulation configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("demand range for {tier:?} tier invalid (min {min} > max {max})")]
    TierRange { tier: Tier, min: u32, max: u32 },
    #[error("fleet entry for model {model:?} has zero aircraft")]
    EmptyFleetEntry { model: String },
    #[error("fleet has no aircraft")]
    EmptyFleet,
    #[error("malformed configuration: {0}")]
    Parse(String),
}

/// A group of identical aircraft in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetEntry {
    pub model: String,
    #[serde(default = "FleetEntry::default_count")]
    pub count: usize,
}

impl FleetEntry {
    const fn default_count() -> usize {
        1
    }
}

/// Full configuration of one simulation instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Episode length in ticks.
    #[serde(default = "SimConfig::default_horizon")]
    pub horizon: u32,
    /// Demand is regenerated on every port when `tick % refresh_period == 0`.
    #[serde(default = "SimConfig::default_refresh_period")]
    pub refresh_period: u32,
    /// Ticks spent in PREPARE before departure.
    #[serde(default = "SimConfig::default_prepare_ticks")]
    pub prepare_ticks: u32,
    /// Distance covered by an aircraft per FLY tick.
    #[serde(default = "SimConfig::default_distance_per_tick")]
    pub distance_per_tick: f64,
    /// Distance used when a pair is missing from the distance table.
    #[serde(default = "SimConfig::default_distance")]
    pub default_distance: f64,
    /// Reference load used to spread aircraft across ports at reset.
    #[serde(default = "SimConfig::default_passengers_per_aircraft")]
    pub passengers_per_aircraft: u32,
    #[serde(default = "SimConfig::default_departure_reward")]
    pub departure_reward: f32,
    #[serde(default = "SimConfig::default_invalid_action_penalty")]
    pub invalid_action_penalty: f32,
    #[serde(default)]
    pub reward: RewardKind,
    #[serde(default)]
    pub demand: DemandConfig,
    #[serde(default = "SimConfig::default_fleet")]
    pub fleet: Vec<FleetEntry>,
    /// Port code -> tier; ports not listed use `default_tier`.
    #[serde(default)]
    pub port_tiers: BTreeMap<String, Tier>,
    #[serde(default)]
    pub default_tier: Tier,
    /// Port receiving aircraft left over after demand-proportional placement.
    /// Defaults to the last port.
    #[serde(default)]
    pub fallback_port: Option<String>,
    #[serde(default = "SimConfig::default_seed")]
    pub seed: u64,
}

impl SimConfig {
    const fn default_horizon() -> u32 {
        constants::DEFAULT_HORIZON
    }

    const fn default_refresh_period() -> u32 {
        constants::DEFAULT_REFRESH_PERIOD
    }

    const fn default_prepare_ticks() -> u32 {
        constants::DEFAULT_PREPARE_TICKS
    }

    const fn default_distance_per_tick() -> f64 {
        constants::DEFAULT_DISTANCE_PER_TICK
    }

    const fn default_distance() -> f64 {
        constants::DEFAULT_DISTANCE
    }

    const fn default_passengers_per_aircraft() -> u32 {
        constants::DEFAULT_PASSENGERS_PER_AIRCRAFT
    }

    const fn default_departure_reward() -> f32 {
        constants::DEPARTURE_REWARD
    }

    const fn default_invalid_action_penalty() -> f32 {
        constants::INVALID_ACTION_PENALTY
    }

    fn default_fleet() -> Vec<FleetEntry> {
        vec![FleetEntry {
            model: constants::DEFAULT_AIRCRAFT_MODEL.to_string(),
            count: constants::DEFAULT_FLEET_SIZE,
        }]
    }

    const fn default_seed() -> u64 {
        constants::DEFAULT_SEED
    }

    /// Parse configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates an invariant.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Embedded default configuration, falling back to compiled defaults.
    #[must_use]
    pub fn default_config() -> Self {
        Self::from_json(DEFAULT_CONFIG_DATA).unwrap_or_default()
    }

    /// Total number of aircraft across fleet entries.
    #[must_use]
    pub fn fleet_size(&self) -> usize {
        self.fleet.iter().map(|entry| entry.count).sum()
    }

    /// Tier assigned to a port code.
    #[must_use]
    pub fn tier_for(&self, code: &str) -> Tier {
        self.port_tiers
            .get(code)
            .copied()
            .unwrap_or(self.default_tier)
    }

    /// Builder-style override used by tests and the runner.
    #[must_use]
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    /// Builder-style override used by tests and the runner.
    #[must_use]
    pub fn with_fleet(mut self, model: &str, count: usize) -> Self {
        self.fleet = vec![FleetEntry {
            model: model.to_string(),
            count,
        }];
        self
    }

    /// Builder-style override used by tests and the runner.
    #[must_use]
    pub fn with_tier(mut self, code: &str, tier: Tier) -> Self {
        self.port_tiers.insert(code.to_string(), tier);
        self
    }

    /// Check every invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        min_u32("horizon", self.horizon, 1)?;
        min_u32("refresh_period", self.refresh_period, 1)?;
        min_u32("prepare_ticks", self.prepare_ticks, 1)?;
        min_u32("passengers_per_aircraft", self.passengers_per_aircraft, 1)?;
        positive("distance_per_tick", self.distance_per_tick)?;
        positive("default_distance", self.default_distance)?;
        if !self.departure_reward.is_finite() {
            return Err(ConfigError::MinViolation {
                field: "departure_reward",
                min: f64::MIN,
                value: f64::from(self.departure_reward),
            });
        }
        if !self.invalid_action_penalty.is_finite() {
            return Err(ConfigError::MinViolation {
                field: "invalid_action_penalty",
                min: f64::MIN,
                value: f64::from(self.invalid_action_penalty),
            });
        }
        self.demand.validate()?;
        if let Some(entry) = self.fleet.iter().find(|entry| entry.count == 0) {
            return Err(ConfigError::EmptyFleetEntry {
                model: entry.model.clone(),
            });
        }
        if self.fleet_size() == 0 {
            return Err(ConfigError::EmptyFleet);
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizon: Self::default_horizon(),
            refresh_period: Self::default_refresh_period(),
            prepare_ticks: Self::default_prepare_ticks(),
            distance_per_tick: Self::default_distance_per_tick(),
            default_distance: Self::default_distance(),
            passengers_per_aircraft: Self::default_passengers_per_aircraft(),
            departure_reward: Self::default_departure_reward(),
            invalid_action_penalty: Self::default_invalid_action_penalty(),
            reward: RewardKind::default(),
            demand: DemandConfig::default(),
            fleet: Self::default_fleet(),
            port_tiers: BTreeMap::new(),
            default_tier: Tier::default(),
            fallback_port: None,
            seed: Self::default_seed(),
        }
    }
}

fn min_u32(field: &'static str, value: u32, min: u32) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::MinViolation {
            field,
            min: f64::from(min),
            value: f64::from(value),
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::MinViolation {
            field,
            min: f64::EPSILON,
            value,
        });
    }
    Ok(())
}
