//! Episode controller: the adapter-facing reset/step surface.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::aircraft::{Action, AircraftId, FlightRules, TickEvent};
use crate::config::SimConfig;
use crate::data::ReferenceData;
use crate::demand::DemandMode;
use crate::error::SimError;
use crate::numbers::ceil_f64_to_u32;
use crate::registry::Registry;
use crate::reward::RewardModel;
use crate::rng::RngBundle;

/// Dense `(P + 1) x P` observation matrix in row-major order.
///
/// Row 0 holds the number of aircraft whose current port is each column;
/// rows `1..=P` hold `demand[origin][destination]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<u32>,
}

impl Observation {
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[u32]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        self.data.get(start..start + self.cols)
    }

    /// Occupancy row.
    #[must_use]
    pub fn occupancy(&self) -> &[u32] {
        self.row(0).unwrap_or(&[])
    }

    /// Demand row for one origin port.
    #[must_use]
    pub fn demand_row(&self, origin: usize) -> Option<&[u32]> {
        self.row(origin + 1)
    }
}

/// Shape and bounds of every observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSpace {
    pub rows: usize,
    pub cols: usize,
    pub low: u32,
    pub high: u32,
}

impl ObservationSpace {
    #[must_use]
    pub fn contains(&self, observation: &Observation) -> bool {
        observation.rows == self.rows
            && observation.cols == self.cols
            && observation
                .data
                .iter()
                .all(|value| (self.low..=self.high).contains(value))
    }
}

/// One discrete choice of `choices` per aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub aircraft: usize,
    pub choices: usize,
}

impl ActionSpace {
    /// Decode raw indices into actions, one per aircraft.
    ///
    /// # Errors
    ///
    /// Returns an error for a wrong count or an out-of-range index.
    pub fn decode(&self, indices: &[usize]) -> Result<Vec<Action>, SimError> {
        if indices.len() != self.aircraft {
            return Err(SimError::ActionCount {
                expected: self.aircraft,
                got: indices.len(),
            });
        }
        indices
            .iter()
            .map(|index| Action::from_index(*index, self.choices.saturating_sub(1)))
            .collect()
    }
}

/// Per-tick diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StepInfo {
    pub tick: u32,
    pub aircraft_rewards: Vec<f32>,
    pub passengers_boarded: u32,
    pub passengers_delivered: u32,
    pub flights_completed: u32,
    pub dispatches: u32,
    pub rejected_actions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    /// Always false: episodes only end at the horizon.
    pub truncated: bool,
    pub info: StepInfo,
}

/// A single simulation instance driven tick by tick.
#[derive(Debug)]
pub struct FleetSimulation {
    config: SimConfig,
    registry: Registry,
    rngs: RngBundle,
    reward: Box<dyn RewardModel>,
    rules: FlightRules,
    tick: u32,
    finished: bool,
}

impl FleetSimulation {
    /// Build a simulation and reset it with the configured seed.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration or unusable reference data.
    pub fn new(data: &ReferenceData, config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut rngs = RngBundle::from_user_seed(config.seed);
        let registry = Registry::build(data, &config, &mut rngs)?;
        let reward = config.reward.build();
        let rules = FlightRules::from(&config);
        let mut sim = Self {
            config,
            registry,
            rngs,
            reward,
            rules,
            tick: 0,
            finished: false,
        };
        sim.reset(None);
        Ok(sim)
    }

    /// Start a new episode, reseeding the random streams when a seed is given.
    pub fn reset(&mut self, seed: Option<u64>) -> Observation {
        if let Some(seed) = seed {
            self.rngs.reseed(seed);
        }
        self.registry.reset(&self.config, self.rngs.demand());
        self.tick = 0;
        self.finished = false;
        debug!(
            "episode reset (seed {}, {} ports, {} aircraft, reward {})",
            self.rngs.seed(),
            self.registry.num_ports(),
            self.registry.fleet_size(),
            self.reward.name()
        );
        self.observe()
    }

    /// Advance one tick with one action per aircraft, in aircraft id order.
    ///
    /// # Errors
    ///
    /// Returns an error, without changing any state, for a wrong action count,
    /// an unknown destination port, or an episode that already terminated.
    pub fn step(&mut self, actions: &[Action]) -> Result<StepOutcome, SimError> {
        if self.finished {
            return Err(SimError::EpisodeFinished { tick: self.tick });
        }
        self.validate_actions(actions)?;

        let mut info = StepInfo {
            aircraft_rewards: Vec::with_capacity(actions.len()),
            ..StepInfo::default()
        };
        let mut reward = 0.0_f32;
        for (index, action) in actions.iter().enumerate() {
            let tick = self.registry.step_aircraft(
                AircraftId(index),
                *action,
                self.reward.as_ref(),
                self.rules,
            )?;
            reward += tick.reward;
            info.aircraft_rewards.push(tick.reward);
            match tick.event {
                Some(TickEvent::Departed { passengers, .. }) => {
                    info.passengers_boarded += passengers;
                }
                Some(TickEvent::Arrived { passengers, .. }) => {
                    info.passengers_delivered += passengers;
                    info.flights_completed += 1;
                }
                Some(TickEvent::Dispatched { .. }) => info.dispatches += 1,
                Some(TickEvent::Rejected) => info.rejected_actions += 1,
                None => {}
            }
        }

        self.tick += 1;
        if self.tick % self.config.refresh_period == 0 {
            self.registry
                .refresh_demand(&self.config, self.rngs.demand());
            debug!("demand refreshed at tick {}", self.tick);
        }
        let terminated = self.tick >= self.config.horizon;
        self.finished = terminated;
        info.tick = self.tick;

        Ok(StepOutcome {
            observation: self.observe(),
            reward,
            terminated,
            truncated: false,
            info,
        })
    }

    /// Apply the same action to every aircraft.
    ///
    /// # Errors
    ///
    /// Same as [`FleetSimulation::step`].
    pub fn step_shared(&mut self, action: Action) -> Result<StepOutcome, SimError> {
        let actions = vec![action; self.registry.fleet_size()];
        self.step(&actions)
    }

    /// Step with raw discrete indices, as an agent adapter would supply them.
    ///
    /// # Errors
    ///
    /// Same as [`FleetSimulation::step`], plus out-of-range indices.
    pub fn step_indices(&mut self, indices: &[usize]) -> Result<StepOutcome, SimError> {
        let actions = self.action_space().decode(indices)?;
        self.step(&actions)
    }

    #[must_use]
    pub fn observe(&self) -> Observation {
        let cols = self.registry.num_ports();
        let mut data = Vec::with_capacity((cols + 1) * cols);
        data.extend(self.registry.occupancy());
        for port in self.registry.ports() {
            data.extend_from_slice(port.demand().as_slice());
        }
        Observation {
            rows: cols + 1,
            cols,
            data,
        }
    }

    #[must_use]
    pub fn observation_space(&self) -> ObservationSpace {
        let ports = self.registry.num_ports();
        let fleet = u32::try_from(self.registry.fleet_size()).unwrap_or(u32::MAX);
        let demand = self.config.demand.tiers.upper_bound();
        let high = match self.config.demand.mode {
            DemandMode::Training => demand,
            // Jitter can push a draw past the tier maximum.
            DemandMode::Evaluation { jitter } => ceil_f64_to_u32(f64::from(demand) * (1.0 + jitter)),
        };
        ObservationSpace {
            rows: ports + 1,
            cols: ports,
            low: 0,
            high: high.max(fleet),
        }
    }

    #[must_use]
    pub fn action_space(&self) -> ActionSpace {
        ActionSpace {
            aircraft: self.registry.fleet_size(),
            choices: self.registry.num_ports() + 1,
        }
    }

    #[must_use]
    pub const fn tick(&self) -> u32 {
        self.tick
    }

    #[must_use]
    pub const fn horizon(&self) -> u32 {
        self.config.horizon
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.rngs.seed()
    }

    /// Reward strategy in use.
    #[must_use]
    pub fn reward_model(&self) -> &dyn RewardModel {
        self.reward.as_ref()
    }

    fn validate_actions(&self, actions: &[Action]) -> Result<(), SimError> {
        let expected = self.registry.fleet_size();
        if actions.len() != expected {
            return Err(SimError::ActionCount {
                expected,
                got: actions.len(),
            });
        }
        let num_ports = self.registry.num_ports();
        for action in actions {
            if let Action::GoTo(port) = action
                && port.index() >= num_ports
            {
                return Err(SimError::UnknownPort(*port));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortId;

    fn sim(horizon: u32) -> FleetSimulation {
        let data = ReferenceData::load_from_static().unwrap();
        let config = SimConfig::default_config().with_horizon(horizon);
        FleetSimulation::new(&data, config).unwrap()
    }

    #[test]
    fn observation_has_occupancy_and_demand_rows() {
        let mut sim = sim(20);
        let observation = sim.reset(Some(11));
        let ports = sim.registry().num_ports();
        assert_eq!(observation.rows, ports + 1);
        assert_eq!(observation.cols, ports);
        assert_eq!(observation.data.len(), (ports + 1) * ports);
        let fleet = u32::try_from(sim.registry().fleet_size()).unwrap();
        assert_eq!(observation.occupancy().iter().sum::<u32>(), fleet);
        for origin in 0..ports {
            assert_eq!(observation.get(origin + 1, origin), Some(0));
        }
        assert!(sim.observation_space().contains(&observation));
    }

    #[test]
    fn rejects_wrong_action_count_and_unknown_port() {
        let mut sim = sim(5);
        let before = sim.registry().fingerprint();
        assert!(matches!(
            sim.step(&[Action::Continue]),
            Err(SimError::ActionCount { .. })
        ));
        let mut actions = vec![Action::Continue; sim.registry().fleet_size()];
        actions[0] = Action::GoTo(PortId(99));
        assert_eq!(sim.step(&actions), Err(SimError::UnknownPort(PortId(99))));
        assert_eq!(sim.registry().fingerprint(), before);
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn terminates_at_horizon_and_refuses_further_steps() {
        let mut sim = sim(7);
        for tick in 1..=7 {
            let outcome = sim.step_shared(Action::Continue).unwrap();
            assert_eq!(outcome.info.tick, tick);
            assert_eq!(outcome.terminated, tick == 7);
            assert!(!outcome.truncated);
        }
        assert_eq!(
            sim.step_shared(Action::Continue),
            Err(SimError::EpisodeFinished { tick: 7 })
        );
        sim.reset(None);
        assert!(sim.step_shared(Action::Continue).is_ok());
    }

    #[test]
    fn refresh_happens_on_period_ticks() {
        let mut sim = sim(20);
        sim.reset(Some(5));
        let initial = sim.observe();
        for _ in 0..4 {
            let outcome = sim.step_shared(Action::Continue).unwrap();
            assert_eq!(outcome.observation.data[initial.cols..], initial.data[initial.cols..]);
        }
        let refreshed = sim.step_shared(Action::Continue).unwrap();
        assert_ne!(refreshed.observation.data[initial.cols..], initial.data[initial.cols..]);
    }

    #[test]
    fn index_actions_decode_through_the_action_space() {
        let mut sim = sim(5);
        let space = sim.action_space();
        assert_eq!(space.choices, sim.registry().num_ports() + 1);
        let mut indices = vec![0; space.aircraft];
        indices[0] = space.choices;
        assert!(matches!(
            sim.step_indices(&indices),
            Err(SimError::ActionIndex { .. })
        ));
        indices[0] = 0;
        let outcome = sim.step_indices(&indices).unwrap();
        assert_eq!(outcome.info.aircraft_rewards.len(), space.aircraft);
    }

    #[test]
    fn empty_action_space_rejects_indices_without_panicking() {
        let space = ActionSpace {
            aircraft: 1,
            choices: 0,
        };
        assert!(matches!(
            space.decode(&[1]),
            Err(SimError::ActionIndex { index: 1, .. })
        ));
        assert!(matches!(
            space.decode(&[]),
            Err(SimError::ActionCount { expected: 1, got: 0 })
        ));
    }

    #[test]
    fn reward_sums_per_aircraft_rewards() {
        let mut sim = sim(30);
        sim.reset(Some(3));
        let ports = sim.registry().num_ports();
        let mut actions: Vec<Action> = sim
            .registry()
            .aircraft()
            .iter()
            .map(|plane| Action::GoTo(PortId((plane.current_port().index() + 1) % ports)))
            .collect();
        let outcome = sim.step(&actions).unwrap();
        let sum: f32 = outcome.info.aircraft_rewards.iter().sum();
        assert!((outcome.reward - sum).abs() < 1e-5);
        assert_eq!(outcome.info.dispatches, u32::try_from(actions.len()).unwrap());

        // Dispatching again while preparing is penalised for every aircraft.
        let outcome = sim.step(&actions).unwrap();
        assert_eq!(outcome.info.rejected_actions, u32::try_from(actions.len()).unwrap());
        assert!((outcome.reward + actions.len() as f32).abs() < 1e-5);

        actions.fill(Action::Continue);
        sim.step(&actions).unwrap();
        let outcome = sim.step(&actions).unwrap();
        assert!(outcome.info.passengers_boarded > 0);
    }
}
