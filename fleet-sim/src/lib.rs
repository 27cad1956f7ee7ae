//! Fleet Rotation Simulator Engine
//!
//! Discrete-time simulation of an airline fleet rotating between ports while
//! passenger demand regenerates. This crate provides the engine only: reset,
//! step and observation for an agent adapter, with no rendering, training or
//! data fetching.

pub mod aircraft;
pub mod config;
pub mod constants;
pub mod data;
pub mod demand;
pub mod distance;
pub mod episode;
pub mod error;
pub mod numbers;
pub mod port;
pub mod registry;
pub mod reward;
pub mod rng;
pub mod schedule;

use anyhow::Context;

// Re-export commonly used types
pub use aircraft::{Action, Aircraft, AircraftId, AircraftTick, FlightRules, FlightState, Status, TickEvent};
pub use config::{ConfigError, FleetEntry, SimConfig};
pub use data::{
    AircraftModel, BaselineTable, Coordinate, DistanceTable, ModelCatalog, PortRecord, ReferenceData,
};
pub use demand::{DemandConfig, DemandMode, DemandModel, DemandRange, TierRanges};
pub use distance::DistanceProvider;
pub use episode::{
    ActionSpace, FleetSimulation, Observation, ObservationSpace, StepInfo, StepOutcome,
};
pub use error::{DataError, SimError};
pub use port::{Port, PortId, Tier};
pub use registry::{Registry, Violation};
pub use reward::{DemandRankReward, LoadFactorReward, RewardKind, RewardModel};
pub use rng::{RngBundle, derive_episode_seed};
pub use schedule::{ScheduleHistory, ScheduleSegment};

/// Source of reference data and configuration.
/// Fetching and caching live behind this trait, outside the engine.
pub trait ReferenceLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load port codes and coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the port data cannot be loaded.
    fn load_ports(&self) -> Result<Vec<PortRecord>, Self::Error>;

    /// Load the port-to-port distance table; may be partial or empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the distance data cannot be loaded.
    fn load_distances(&self) -> Result<DistanceTable, Self::Error>;

    /// Load aircraft model parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the model data cannot be loaded.
    fn load_models(&self) -> Result<ModelCatalog, Self::Error>;

    /// Load fixed evaluation baselines; empty means every baseline is drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if the baseline data cannot be loaded.
    fn load_baselines(&self) -> Result<BaselineTable, Self::Error> {
        Ok(BaselineTable::new())
    }

    /// Load simulation configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<SimConfig, Self::Error> {
        Ok(SimConfig::default_config())
    }
}

/// Loader backed by the datasets compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLoader;

impl ReferenceLoader for StaticLoader {
    type Error = DataError;

    fn load_ports(&self) -> Result<Vec<PortRecord>, Self::Error> {
        Ok(ReferenceData::load_from_static()?.ports)
    }

    fn load_distances(&self) -> Result<DistanceTable, Self::Error> {
        Ok(ReferenceData::load_from_static()?.distances)
    }

    fn load_models(&self) -> Result<ModelCatalog, Self::Error> {
        ModelCatalog::load_from_static()
    }
}

/// Builds simulations from whatever a loader supplies.
pub struct FleetEngine<L>
where
    L: ReferenceLoader,
{
    loader: L,
}

impl<L> FleetEngine<L>
where
    L: ReferenceLoader,
{
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load and validate all reference data.
    ///
    /// # Errors
    ///
    /// Returns an error if any dataset fails to load or validate.
    pub fn load_reference(&self) -> anyhow::Result<ReferenceData> {
        let ports = self.loader.load_ports().context("loading ports")?;
        let distances = self
            .loader
            .load_distances()
            .context("loading port distances")?;
        let models = self
            .loader
            .load_models()
            .context("loading aircraft models")?;
        let baselines = self
            .loader
            .load_baselines()
            .context("loading evaluation baselines")?;
        Ok(ReferenceData::new(ports, distances, models)
            .context("validating reference data")?
            .with_baselines(baselines))
    }

    /// Build a simulation from the loader's own configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if data or configuration cannot be loaded, or the
    /// simulation rejects them.
    pub fn create_simulation(&self) -> anyhow::Result<FleetSimulation> {
        let config = self.loader.load_config().context("loading configuration")?;
        self.create_simulation_with(config)
    }

    /// Build a simulation with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if data cannot be loaded or the simulation rejects it.
    pub fn create_simulation_with(&self, config: SimConfig) -> anyhow::Result<FleetSimulation> {
        let data = self.load_reference()?;
        FleetSimulation::new(&data, config).context("building simulation")
    }

    pub const fn loader(&self) -> &L {
        &self.loader
    }
}
