//! Reward strategies applied on WAIT and FLY ticks.
//!
//! The departure bonus and the invalid-action penalty are fixed by
//! configuration and shared by every strategy; only the per-tick shaping
//! differs between them.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::demand::DemandModel;
use crate::numbers::usize_to_f32;
use crate::port::PortId;

/// Reward interface consulted by the aircraft state machine.
pub trait RewardModel: fmt::Debug + Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &'static str;

    /// WAIT tick where the aircraft stays put.
    fn waiting(&self, load_ratio: f32) -> f32;

    /// WAIT tick where the aircraft is sent towards `destination`.
    fn dispatched(
        &self,
        load_ratio: f32,
        origin_demand: &DemandModel,
        destination: PortId,
        num_ports: usize,
    ) -> f32;

    /// FLY tick, including the arrival tick.
    fn in_flight(&self, load_ratio: f32) -> f32;
}

/// Configured choice of reward strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    #[default]
    LoadFactor,
    DemandRank,
}

impl RewardKind {
    #[must_use]
    pub fn build(self) -> Box<dyn RewardModel> {
        match self {
            Self::LoadFactor => Box::new(LoadFactorReward),
            Self::DemandRank => Box::new(DemandRankReward),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoadFactor => "load_factor",
            Self::DemandRank => "demand_rank",
        }
    }
}

/// Squared load ratio: near-full flights pay disproportionately more.
///
/// While waiting, the ratio is the one left over from the last flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadFactorReward;

impl LoadFactorReward {
    fn shaped(load_ratio: f32) -> f32 {
        let ratio = load_ratio.clamp(0.0, 1.0);
        ratio * ratio
    }
}

impl RewardModel for LoadFactorReward {
    fn name(&self) -> &'static str {
        "load_factor"
    }

    fn waiting(&self, load_ratio: f32) -> f32 {
        Self::shaped(load_ratio)
    }

    fn dispatched(
        &self,
        load_ratio: f32,
        _origin_demand: &DemandModel,
        _destination: PortId,
        _num_ports: usize,
    ) -> f32 {
        Self::shaped(load_ratio)
    }

    fn in_flight(&self, load_ratio: f32) -> f32 {
        Self::shaped(load_ratio)
    }
}

/// Rewards the dispatch decision by how the destination ranks on demand.
///
/// Rank 0 is the busiest destination and pays 1.0; every strictly busier
/// destination costs `1 / num_ports`. Idle and cruise ticks pay nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemandRankReward;

impl RewardModel for DemandRankReward {
    fn name(&self) -> &'static str {
        "demand_rank"
    }

    fn waiting(&self, _load_ratio: f32) -> f32 {
        0.0
    }

    fn dispatched(
        &self,
        _load_ratio: f32,
        origin_demand: &DemandModel,
        destination: PortId,
        num_ports: usize,
    ) -> f32 {
        if num_ports == 0 {
            return 0.0;
        }
        let rank = origin_demand.rank_of(destination);
        usize_to_f32(num_ports.saturating_sub(rank)) / usize_to_f32(num_ports)
    }

    fn in_flight(&self, _load_ratio: f32) -> f32 {
        0.0
    }
}
