//! Centralized tuning constants for the fleet simulation.
//!
//! These are the defaults behind [`crate::config::SimConfig`]. Keeping them
//! together means a configuration file only has to name what it changes.

// Episode shape ------------------------------------------------------------
pub const DEFAULT_HORIZON: u32 = 168;
pub const DEFAULT_REFRESH_PERIOD: u32 = 5;
pub const DEFAULT_PREPARE_TICKS: u32 = 2;

// Movement -----------------------------------------------------------------
pub const DEFAULT_DISTANCE: f64 = 400.0;
pub const DEFAULT_DISTANCE_PER_TICK: f64 = 100.0;

// Placement ----------------------------------------------------------------
pub const DEFAULT_PASSENGERS_PER_AIRCRAFT: u32 = 250;

// Rewards ------------------------------------------------------------------
pub const DEPARTURE_REWARD: f32 = 0.8;
pub const INVALID_ACTION_PENALTY: f32 = -1.0;

// Demand tiers (inclusive ranges) -------------------------------------------
pub const LOW_TIER_RANGE: (u32, u32) = (10, 60);
pub const MEDIUM_TIER_RANGE: (u32, u32) = (60, 150);
pub const HIGH_TIER_RANGE: (u32, u32) = (150, 300);
pub const DEFAULT_EVALUATION_JITTER: f64 = 0.2;

// Fleet --------------------------------------------------------------------
pub const DEFAULT_FLEET_SIZE: usize = 6;
pub const DEFAULT_AIRCRAFT_MODEL: &str = "A320";
pub const DEFAULT_CAPACITY: u32 = 180;
pub const DEFAULT_SEED: u64 = 0x5EED_F1EE;

// RNG stream domains ---------------------------------------------------------
pub(crate) const STREAM_DEMAND: &[u8] = b"demand";
pub(crate) const STREAM_BASELINE: &[u8] = b"baseline";
pub(crate) const STREAM_EPISODE: &[u8] = b"episode";
