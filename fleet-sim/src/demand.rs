//! Per-port passenger demand: generation by tier, periodic refresh and withdrawal.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants;
use crate::numbers::round_f64_to_u32;
use crate::port::{PortId, Tier};

/// Inclusive integer range demand values are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRange {
    pub min: u32,
    pub max: u32,
}

impl DemandRange {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    const fn from_pair(pair: (u32, u32)) -> Self {
        Self::new(pair.0, pair.1)
    }

    fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Demand range per port tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRanges {
    #[serde(default = "TierRanges::default_low")]
    pub low: DemandRange,
    #[serde(default = "TierRanges::default_medium")]
    pub medium: DemandRange,
    #[serde(default = "TierRanges::default_high")]
    pub high: DemandRange,
}

impl TierRanges {
    const fn default_low() -> DemandRange {
        DemandRange::from_pair(constants::LOW_TIER_RANGE)
    }

    const fn default_medium() -> DemandRange {
        DemandRange::from_pair(constants::MEDIUM_TIER_RANGE)
    }

    const fn default_high() -> DemandRange {
        DemandRange::from_pair(constants::HIGH_TIER_RANGE)
    }

    #[must_use]
    pub const fn range(&self, tier: Tier) -> DemandRange {
        match tier {
            Tier::Low => self.low,
            Tier::Medium => self.medium,
            Tier::High => self.high,
        }
    }

    /// Largest value any tier can produce.
    #[must_use]
    pub fn upper_bound(&self) -> u32 {
        self.low.max.max(self.medium.max).max(self.high.max)
    }
}

impl Default for TierRanges {
    fn default() -> Self {
        Self {
            low: Self::default_low(),
            medium: Self::default_medium(),
            high: Self::default_high(),
        }
    }
}

/// How demand is regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandMode {
    /// Fresh uniform draw from the tier range every time.
    #[default]
    Training,
    /// Bounded multiplicative jitter around a baseline fixed at construction.
    Evaluation {
        #[serde(default = "DemandMode::default_jitter")]
        jitter: f64,
    },
}

impl DemandMode {
    const fn default_jitter() -> f64 {
        constants::DEFAULT_EVALUATION_JITTER
    }
}

/// Demand generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DemandConfig {
    #[serde(default)]
    pub mode: DemandMode,
    #[serde(default)]
    pub tiers: TierRanges,
}

impl DemandConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for tier in [Tier::Low, Tier::Medium, Tier::High] {
            let range = self.tiers.range(tier);
            if range.min > range.max {
                return Err(ConfigError::TierRange {
                    tier,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        if let DemandMode::Evaluation { jitter } = self.mode
            && !(0.0..=1.0).contains(&jitter)
        {
            return Err(ConfigError::RangeViolation {
                field: "demand.jitter",
                min: 0.0,
                max: 1.0,
                value: jitter,
            });
        }
        Ok(())
    }
}

/// Passengers waiting at one port, keyed by destination port id.
///
/// The entry for the owning port is always zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandModel {
    origin: PortId,
    demand: Vec<u32>,
    total: u32,
    baseline: Vec<u32>,
}

impl DemandModel {
    #[must_use]
    pub fn new(origin: PortId, num_ports: usize) -> Self {
        Self {
            origin,
            demand: vec![0; num_ports],
            total: 0,
            baseline: vec![0; num_ports],
        }
    }

    /// Replace every destination's demand according to the configured mode.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, tier: Tier, cfg: &DemandConfig, rng: &mut R) {
        let range = cfg.tiers.range(tier);
        for index in 0..self.demand.len() {
            if index == self.origin.index() {
                self.demand[index] = 0;
                continue;
            }
            self.demand[index] = match cfg.mode {
                DemandMode::Training => range.draw(rng),
                DemandMode::Evaluation { jitter } => {
                    let factor = 1.0 + rng.gen_range(-jitter..=jitter);
                    round_f64_to_u32(f64::from(self.baseline[index]) * factor)
                }
            };
        }
        self.recompute_total();
    }

    /// Draw the evaluation baseline from the tier range.
    pub fn draw_baseline<R: Rng + ?Sized>(&mut self, range: DemandRange, rng: &mut R) {
        for index in 0..self.baseline.len() {
            self.baseline[index] = if index == self.origin.index() {
                0
            } else {
                range.draw(rng)
            };
        }
    }

    /// Take up to `requested` passengers bound for `destination`.
    ///
    /// Returns the number actually granted, never more than is waiting.
    pub fn withdraw(&mut self, destination: PortId, requested: u32) -> u32 {
        let Some(available) = self.demand.get_mut(destination.index()) else {
            return 0;
        };
        let granted = requested.min(*available);
        *available -= granted;
        self.total = self.total.saturating_sub(granted);
        granted
    }

    /// Passengers waiting for `destination`; zero for unknown ports.
    #[must_use]
    pub fn get(&self, destination: PortId) -> u32 {
        self.demand.get(destination.index()).copied().unwrap_or(0)
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub const fn origin(&self) -> PortId {
        self.origin
    }

    /// `(destination, demand)` for every other port, in id order.
    pub fn destinations(&self) -> impl Iterator<Item = (PortId, u32)> + '_ {
        self.demand
            .iter()
            .enumerate()
            .filter(move |(index, _)| *index != self.origin.index())
            .map(|(index, value)| (PortId(index), *value))
    }

    /// Number of other destinations with strictly more demand than `destination`.
    #[must_use]
    pub fn rank_of(&self, destination: PortId) -> usize {
        let target = self.get(destination);
        self.destinations()
            .filter(|(id, value)| *id != destination && *value > target)
            .count()
    }

    /// Demand row as dense values indexed by destination id.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.demand
    }

    #[must_use]
    pub fn baseline(&self) -> &[u32] {
        &self.baseline
    }

    /// Overwrite the baseline; the own-port entry is forced to zero.
    pub fn set_baseline(&mut self, values: &[u32]) {
        for (index, slot) in self.baseline.iter_mut().enumerate() {
            *slot = if index == self.origin.index() {
                0
            } else {
                values.get(index).copied().unwrap_or(0)
            };
        }
    }

    fn recompute_total(&mut self) {
        self.total = self
            .demand
            .iter()
            .fold(0_u32, |acc, value| acc.saturating_add(*value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::mock::StepRng;
    use rand_chacha::ChaCha20Rng;

    fn training() -> DemandConfig {
        DemandConfig::default()
    }

    #[test]
    fn regenerate_stays_in_tier_range_with_zero_diagonal() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut model = DemandModel::new(PortId(1), 4);
        let cfg = training();
        for _ in 0..20 {
            model.regenerate(Tier::High, &cfg, &mut rng);
            assert_eq!(model.get(PortId(1)), 0);
            let range = cfg.tiers.range(Tier::High);
            for (_, value) in model.destinations() {
                assert!((range.min..=range.max).contains(&value));
            }
            let sum: u32 = model.as_slice().iter().sum();
            assert_eq!(model.total(), sum);
        }
    }

    #[test]
    fn withdraw_is_clamped_to_available() {
        let mut rng = StepRng::new(0, 0);
        let mut model = DemandModel::new(PortId(0), 3);
        model.regenerate(Tier::Low, &training(), &mut rng);
        let available = model.get(PortId(2));
        let before_total = model.total();

        let granted = model.withdraw(PortId(2), available + 500);
        assert_eq!(granted, available);
        assert_eq!(model.get(PortId(2)), 0);
        assert_eq!(model.total(), before_total - available);

        assert_eq!(model.withdraw(PortId(2), 10), 0);
        assert_eq!(model.withdraw(PortId(9), 10), 0);
    }

    #[test]
    fn partial_withdraw_leaves_remainder() {
        let mut model = DemandModel::new(PortId(0), 2);
        model.set_baseline(&[7, 40]);
        let cfg = DemandConfig {
            mode: DemandMode::Evaluation { jitter: 0.0 },
            ..DemandConfig::default()
        };
        model.regenerate(Tier::Medium, &cfg, &mut StepRng::new(0, 1));
        assert_eq!(model.get(PortId(0)), 0);
        assert_eq!(model.get(PortId(1)), 40);
        assert_eq!(model.withdraw(PortId(1), 15), 15);
        assert_eq!(model.get(PortId(1)), 25);
        assert_eq!(model.total(), 25);
    }

    #[test]
    fn evaluation_mode_stays_within_jitter_of_baseline() {
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let cfg = DemandConfig {
            mode: DemandMode::Evaluation { jitter: 0.2 },
            ..DemandConfig::default()
        };
        let mut model = DemandModel::new(PortId(0), 3);
        model.draw_baseline(cfg.tiers.range(Tier::Medium), &mut rng);
        let baseline = model.baseline().to_vec();
        for _ in 0..20 {
            model.regenerate(Tier::Medium, &cfg, &mut rng);
            for (id, value) in model.destinations() {
                let base = f64::from(baseline[id.index()]);
                let value = f64::from(value);
                assert!(value >= (base * 0.8).floor() && value <= (base * 1.2).ceil());
            }
        }
    }

    #[test]
    fn rank_counts_strictly_larger_destinations() {
        let mut model = DemandModel::new(PortId(0), 4);
        model.set_baseline(&[0, 30, 90, 30]);
        let cfg = DemandConfig {
            mode: DemandMode::Evaluation { jitter: 0.0 },
            ..DemandConfig::default()
        };
        model.regenerate(Tier::Low, &cfg, &mut StepRng::new(0, 1));
        assert_eq!(model.rank_of(PortId(2)), 0);
        assert_eq!(model.rank_of(PortId(1)), 1);
        assert_eq!(model.rank_of(PortId(3)), 1);
    }
}
