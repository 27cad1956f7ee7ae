//! Aircraft state machine: WAIT -> PREPARE -> FLY -> WAIT.
//!
//! Each aircraft owns its flight state and schedule history. Port lists and
//! demand pools are mutated only through [`Aircraft::step`], which applies one
//! complete transaction before returning.
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SimConfig;
use crate::constants;
use crate::data::{Coordinate, ModelCatalog};
use crate::distance::DistanceProvider;
use crate::error::SimError;
use crate::numbers::{ceil_f64_to_u32, clamp_f64_to_f32, u32_to_f32};
use crate::port::{Port, PortId};
use crate::reward::RewardModel;
use crate::schedule::ScheduleHistory;

/// Stable aircraft identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftId(pub usize);

impl AircraftId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Coarse status projected from [`FlightState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Wait,
    Prepare,
    Fly,
}

/// Per-aircraft decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Stay while waiting, keep counting down or keep flying otherwise.
    Continue,
    /// Start preparing a flight to the given port. Only valid while waiting.
    GoTo(PortId),
}

impl Action {
    /// Decode a discrete action index: 0 continues, `i + 1` goes to port `i`.
    ///
    /// # Errors
    ///
    /// Returns an error when the index is beyond `num_ports`.
    pub fn from_index(index: usize, num_ports: usize) -> Result<Self, SimError> {
        match index {
            0 => Ok(Self::Continue),
            i if i <= num_ports => Ok(Self::GoTo(PortId(i - 1))),
            _ => Err(SimError::ActionIndex {
                index,
                choices: num_ports + 1,
            }),
        }
    }

    /// Discrete index of this action.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Continue => 0,
            Self::GoTo(port) => port.index() + 1,
        }
    }
}

/// Flight state with exactly the fields each status needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlightState {
    Wait,
    Prepare {
        departure: PortId,
        arrival: PortId,
        remaining_ticks: u32,
    },
    Fly {
        departure: PortId,
        arrival: PortId,
        distance: f64,
        completion: f64,
        ticks_to_arrival: u32,
    },
}

/// Fixed per-simulation rules the state machine consults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightRules {
    pub prepare_ticks: u32,
    pub distance_per_tick: f64,
    pub departure_reward: f32,
    pub invalid_action_penalty: f32,
}

impl From<&SimConfig> for FlightRules {
    fn from(cfg: &SimConfig) -> Self {
        Self {
            prepare_ticks: cfg.prepare_ticks,
            distance_per_tick: cfg.distance_per_tick,
            departure_reward: cfg.departure_reward,
            invalid_action_penalty: cfg.invalid_action_penalty,
        }
    }
}

/// Shared state an aircraft needs to resolve one tick.
pub struct StepContext<'a> {
    pub ports: &'a mut [Port],
    pub distances: &'a DistanceProvider,
    pub reward: &'a dyn RewardModel,
    pub rules: FlightRules,
}

/// Transition performed during a tick, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TickEvent {
    Dispatched { to: PortId },
    Departed { from: PortId, to: PortId, passengers: u32 },
    Arrived { at: PortId, passengers: u32 },
    Rejected,
}

/// Reward and transition produced by one aircraft tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftTick {
    pub reward: f32,
    pub event: Option<TickEvent>,
}

impl AircraftTick {
    const fn quiet(reward: f32) -> Self {
        Self {
            reward,
            event: None,
        }
    }

    const fn with_event(reward: f32, event: TickEvent) -> Self {
        Self {
            reward,
            event: Some(event),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aircraft {
    id: AircraftId,
    model: String,
    /// Fuel fraction in `[0, 1]`.
    fuel: f64,
    capacity: u32,
    state: FlightState,
    current_port: PortId,
    passenger_count: u32,
    passenger_load_ratio: f32,
    position: Coordinate,
    history: ScheduleHistory,
}

impl Aircraft {
    /// A default-model aircraft parked at `home`.
    #[must_use]
    pub fn new(id: AircraftId, home: &Port) -> Self {
        Self {
            id,
            model: constants::DEFAULT_AIRCRAFT_MODEL.to_string(),
            fuel: 1.0,
            capacity: constants::DEFAULT_CAPACITY,
            state: FlightState::Wait,
            current_port: home.id(),
            passenger_count: 0,
            passenger_load_ratio: 0.0,
            position: home.position(),
            history: ScheduleHistory::new(),
        }
    }

    /// Take fuel and capacity from the model table.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownModel`] when the name is not in the table;
    /// the aircraft keeps its previous model, fuel and capacity.
    pub fn init_model(&mut self, name: &str, catalog: &ModelCatalog) -> Result<(), SimError> {
        let Some(model) = catalog.get(name) else {
            return Err(SimError::UnknownModel {
                aircraft: self.id,
                model: name.to_string(),
            });
        };
        self.model = name.to_string();
        self.fuel = model.fuel.clamp(0.0, 1.0);
        self.capacity = model.capacity.max(1);
        Ok(())
    }

    /// Return to an idle, empty state parked at `port`. Port lists are the
    /// caller's responsibility.
    pub fn reset(&mut self, port: &Port) {
        self.state = FlightState::Wait;
        self.current_port = port.id();
        self.passenger_count = 0;
        self.passenger_load_ratio = 0.0;
        self.position = port.position();
        self.history.clear();
    }

    /// Resolve one tick for this aircraft.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPort`] when a dispatch names a port that
    /// does not exist. State is untouched in that case.
    pub fn step(
        &mut self,
        action: Action,
        ctx: &mut StepContext<'_>,
    ) -> Result<AircraftTick, SimError> {
        let outcome = match self.state {
            FlightState::Wait => self.step_waiting(action, ctx)?,
            FlightState::Prepare { .. } => self.step_preparing(action, ctx)?,
            FlightState::Fly { .. } => self.step_flying(action, ctx)?,
        };
        self.history
            .record(self.status(), self.departure_port(), self.arrival_port());
        trace!(
            "{} {:?} -> {:?} reward {:.3}",
            self.id,
            action,
            self.status(),
            outcome.reward
        );
        Ok(outcome)
    }

    fn step_waiting(
        &mut self,
        action: Action,
        ctx: &mut StepContext<'_>,
    ) -> Result<AircraftTick, SimError> {
        let destination = match action {
            Action::GoTo(port) if port != self.current_port => port,
            _ => {
                return Ok(AircraftTick::quiet(
                    ctx.reward.waiting(self.passenger_load_ratio),
                ));
            }
        };
        if destination.index() >= ctx.ports.len() {
            return Err(SimError::UnknownPort(destination));
        }
        let origin = port_ref(ctx.ports, self.current_port)?;
        let reward = ctx.reward.dispatched(
            self.passenger_load_ratio,
            origin.demand(),
            destination,
            ctx.ports.len(),
        );
        self.state = FlightState::Prepare {
            departure: self.current_port,
            arrival: destination,
            remaining_ticks: ctx.rules.prepare_ticks,
        };
        Ok(AircraftTick::with_event(
            reward,
            TickEvent::Dispatched { to: destination },
        ))
    }

    fn step_preparing(
        &mut self,
        action: Action,
        ctx: &mut StepContext<'_>,
    ) -> Result<AircraftTick, SimError> {
        let FlightState::Prepare {
            departure,
            arrival,
            remaining_ticks,
        } = self.state
        else {
            return Ok(AircraftTick::quiet(0.0));
        };
        if action != Action::Continue {
            return Ok(AircraftTick::with_event(
                ctx.rules.invalid_action_penalty,
                TickEvent::Rejected,
            ));
        }
        let remaining_ticks = remaining_ticks.saturating_sub(1);
        if remaining_ticks > 0 {
            self.state = FlightState::Prepare {
                departure,
                arrival,
                remaining_ticks,
            };
            return Ok(AircraftTick::quiet(0.0));
        }
        let passengers = self.depart(departure, arrival, ctx)?;
        Ok(AircraftTick::with_event(
            ctx.rules.departure_reward,
            TickEvent::Departed {
                from: departure,
                to: arrival,
                passengers,
            },
        ))
    }

    fn step_flying(
        &mut self,
        action: Action,
        ctx: &mut StepContext<'_>,
    ) -> Result<AircraftTick, SimError> {
        let FlightState::Fly {
            departure,
            arrival,
            distance,
            completion,
            ticks_to_arrival,
        } = self.state
        else {
            return Ok(AircraftTick::quiet(0.0));
        };
        if action != Action::Continue {
            return Ok(AircraftTick::with_event(
                ctx.rules.invalid_action_penalty,
                TickEvent::Rejected,
            ));
        }
        let reward = ctx.reward.in_flight(self.passenger_load_ratio);
        let completion = (completion + ctx.rules.distance_per_tick / distance).min(1.0);
        let ticks_to_arrival = ticks_to_arrival.saturating_sub(1);
        if completion >= 1.0 || ticks_to_arrival == 0 {
            let delivered = self.arrive(departure, arrival, ctx)?;
            return Ok(AircraftTick::with_event(
                reward,
                TickEvent::Arrived {
                    at: arrival,
                    passengers: delivered,
                },
            ));
        }
        let from = port_ref(ctx.ports, departure)?.position();
        let to = port_ref(ctx.ports, arrival)?.position();
        self.position = from.lerp(to, completion);
        self.state = FlightState::Fly {
            departure,
            arrival,
            distance,
            completion,
            ticks_to_arrival,
        };
        Ok(AircraftTick::quiet(reward))
    }

    /// PREPARE -> FLY: move between port lists, board passengers, plan the leg.
    fn depart(
        &mut self,
        departure: PortId,
        arrival: PortId,
        ctx: &mut StepContext<'_>,
    ) -> Result<u32, SimError> {
        if arrival.index() >= ctx.ports.len() {
            return Err(SimError::UnknownPort(arrival));
        }
        let origin = port_mut(ctx.ports, departure)?;
        if !origin.unpark(self.id) {
            warn_unlisted(self.id, "parked", origin);
        }
        origin.add_departing(self.id);
        let boarded = origin.demand_mut().withdraw(arrival, self.capacity);
        let from = origin.position();
        port_mut(ctx.ports, arrival)?.add_incoming(self.id);

        self.passenger_count = boarded;
        self.passenger_load_ratio = u32_to_f32(boarded) / u32_to_f32(self.capacity);
        let distance = ctx.distances.distance(departure, arrival);
        let ticks_to_arrival = ceil_f64_to_u32(distance / ctx.rules.distance_per_tick).max(1);
        self.state = FlightState::Fly {
            departure,
            arrival,
            distance,
            completion: 0.0,
            ticks_to_arrival,
        };
        self.position = from;
        debug!(
            "{} departed {departure} -> {arrival} with {boarded}/{} passengers ({distance:.0} units, {ticks_to_arrival} ticks)",
            self.id, self.capacity
        );
        Ok(boarded)
    }

    /// FLY -> WAIT: park at the arrival port and unload.
    fn arrive(
        &mut self,
        departure: PortId,
        arrival: PortId,
        ctx: &mut StepContext<'_>,
    ) -> Result<u32, SimError> {
        let origin = port_mut(ctx.ports, departure)?;
        if !origin.remove_departing(self.id) {
            warn_unlisted(self.id, "departing", origin);
        }
        let destination = port_mut(ctx.ports, arrival)?;
        if !destination.remove_incoming(self.id) {
            warn_unlisted(self.id, "incoming", destination);
        }
        destination.park(self.id);
        self.position = destination.position();
        self.current_port = arrival;
        self.state = FlightState::Wait;
        let delivered = std::mem::take(&mut self.passenger_count);
        debug!(
            "{} arrived at {arrival} from {departure} delivering {delivered}",
            self.id
        );
        Ok(delivered)
    }

    #[must_use]
    pub const fn id(&self) -> AircraftId {
        self.id
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub const fn fuel(&self) -> f64 {
        self.fuel
    }

    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub const fn state(&self) -> &FlightState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        match self.state {
            FlightState::Wait => Status::Wait,
            FlightState::Prepare { .. } => Status::Prepare,
            FlightState::Fly { .. } => Status::Fly,
        }
    }

    #[must_use]
    pub const fn current_port(&self) -> PortId {
        self.current_port
    }

    /// Port the current or next leg starts from.
    #[must_use]
    pub const fn departure_port(&self) -> PortId {
        match self.state {
            FlightState::Wait => self.current_port,
            FlightState::Prepare { departure, .. } | FlightState::Fly { departure, .. } => {
                departure
            }
        }
    }

    /// `None` exactly when waiting.
    #[must_use]
    pub const fn arrival_port(&self) -> Option<PortId> {
        match self.state {
            FlightState::Wait => None,
            FlightState::Prepare { arrival, .. } | FlightState::Fly { arrival, .. } => {
                Some(arrival)
            }
        }
    }

    #[must_use]
    pub const fn passenger_count(&self) -> u32 {
        self.passenger_count
    }

    #[must_use]
    pub const fn passenger_load_ratio(&self) -> f32 {
        self.passenger_load_ratio
    }

    /// Fraction of the current leg flown; zero unless flying.
    #[must_use]
    pub fn route_completion(&self) -> f32 {
        match self.state {
            FlightState::Fly { completion, .. } => clamp_f64_to_f32(completion),
            _ => 0.0,
        }
    }

    #[must_use]
    pub const fn remaining_prepare_ticks(&self) -> Option<u32> {
        match self.state {
            FlightState::Prepare {
                remaining_ticks, ..
            } => Some(remaining_ticks),
            _ => None,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Coordinate {
        self.position
    }

    #[must_use]
    pub const fn history(&self) -> &ScheduleHistory {
        &self.history
    }
}

fn warn_unlisted(id: AircraftId, list: &str, port: &Port) {
    warn!("{id} missing from {list} list at {}", port.code());
}

fn port_ref(ports: &[Port], id: PortId) -> Result<&Port, SimError> {
    ports.get(id.index()).ok_or(SimError::UnknownPort(id))
}

fn port_mut(ports: &mut [Port], id: PortId) -> Result<&mut Port, SimError> {
    ports.get_mut(id.index()).ok_or(SimError::UnknownPort(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AircraftModel, DistanceTable, PortRecord};
    use crate::demand::{DemandConfig, DemandMode};
    use crate::port::Tier;
    use crate::reward::{DemandRankReward, LoadFactorReward};
    use rand::rngs::mock::StepRng;
    use std::collections::BTreeMap;

    fn ports(demand_to_b: u32) -> Vec<Port> {
        let records = [
            PortRecord::new("AAA", 0.0, 0.0),
            PortRecord::new("BBB", 0.0, 10.0),
            PortRecord::new("CCC", 10.0, 0.0),
        ];
        let mut ports: Vec<Port> = records
            .iter()
            .enumerate()
            .map(|(i, record)| Port::new(PortId(i), record, Tier::Medium, records.len()))
            .collect();
        let cfg = DemandConfig {
            mode: DemandMode::Evaluation { jitter: 0.0 },
            ..DemandConfig::default()
        };
        ports[0].demand_mut().set_baseline(&[0, demand_to_b, 40]);
        ports[0]
            .demand_mut()
            .regenerate(Tier::Medium, &cfg, &mut StepRng::new(0, 1));
        ports
    }

    fn distances() -> DistanceProvider {
        let mut table = DistanceTable::new();
        table.insert("AAA".to_string(), BTreeMap::from([("BBB".to_string(), 250.0)]));
        DistanceProvider::new(&table, &["AAA", "BBB", "CCC"], 400.0)
    }

    fn rules() -> FlightRules {
        FlightRules::from(&SimConfig::default())
    }

    fn parked_aircraft(ports: &mut [Port]) -> Aircraft {
        let mut aircraft = Aircraft::new(AircraftId(0), &ports[0]);
        ports[0].park(aircraft.id());
        aircraft.reset(&ports[0]);
        aircraft
    }

    #[test]
    fn full_rotation_moves_between_port_lists() {
        let mut ports = ports(120);
        let distances = distances();
        let reward = LoadFactorReward;
        let mut aircraft = parked_aircraft(&mut ports);
        let mut ctx = StepContext {
            ports: &mut ports,
            distances: &distances,
            reward: &reward,
            rules: rules(),
        };

        let tick = aircraft.step(Action::GoTo(PortId(1)), &mut ctx).unwrap();
        assert_eq!(aircraft.status(), Status::Prepare);
        assert!(tick.reward.abs() < f32::EPSILON);
        assert_eq!(aircraft.remaining_prepare_ticks(), Some(2));

        let tick = aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert_eq!(aircraft.status(), Status::Prepare);
        assert!(tick.reward.abs() < f32::EPSILON);

        let tick = aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert_eq!(aircraft.status(), Status::Fly);
        assert!((tick.reward - 0.8).abs() < f32::EPSILON);
        assert_eq!(aircraft.passenger_count(), 120);
        assert!(ctx.ports[0].parked().is_empty());
        assert_eq!(ctx.ports[0].departing(), &[AircraftId(0)]);
        assert_eq!(ctx.ports[1].incoming(), &[AircraftId(0)]);
        assert_eq!(ctx.ports[0].demand().get(PortId(1)), 0);

        // 250 units at 100 per tick: three ticks.
        let expected_ratio = 120.0_f32 / 180.0;
        for _ in 0..2 {
            let tick = aircraft.step(Action::Continue, &mut ctx).unwrap();
            assert_eq!(aircraft.status(), Status::Fly);
            assert!((tick.reward - expected_ratio * expected_ratio).abs() < 1e-6);
        }
        let tick = aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert_eq!(aircraft.status(), Status::Wait);
        assert_eq!(
            tick.event,
            Some(TickEvent::Arrived {
                at: PortId(1),
                passengers: 120
            })
        );
        assert_eq!(aircraft.current_port(), PortId(1));
        assert_eq!(aircraft.departure_port(), PortId(1));
        assert_eq!(aircraft.arrival_port(), None);
        assert_eq!(aircraft.passenger_count(), 0);
        assert_eq!(aircraft.position(), ctx.ports[1].position());
        assert!(ctx.ports[0].departing().is_empty());
        assert!(ctx.ports[1].incoming().is_empty());
        assert_eq!(ctx.ports[1].parked(), &[AircraftId(0)]);

        // Waiting again pays the stale ratio from the finished leg.
        let tick = aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert!((tick.reward - expected_ratio * expected_ratio).abs() < 1e-6);
    }

    #[test]
    fn boarding_is_capped_at_capacity() {
        let mut ports = ports(500);
        let distances = distances();
        let reward = LoadFactorReward;
        let mut aircraft = parked_aircraft(&mut ports);
        let mut ctx = StepContext {
            ports: &mut ports,
            distances: &distances,
            reward: &reward,
            rules: rules(),
        };
        aircraft.step(Action::GoTo(PortId(1)), &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert_eq!(aircraft.passenger_count(), aircraft.capacity());
        assert!((aircraft.passenger_load_ratio() - 1.0).abs() < f32::EPSILON);
        assert_eq!(ctx.ports[0].demand().get(PortId(1)), 500 - 180);
    }

    #[test]
    fn busy_aircraft_reject_dispatch_with_penalty() {
        let mut ports = ports(50);
        let distances = distances();
        let reward = LoadFactorReward;
        let mut aircraft = parked_aircraft(&mut ports);
        let mut ctx = StepContext {
            ports: &mut ports,
            distances: &distances,
            reward: &reward,
            rules: rules(),
        };
        aircraft.step(Action::GoTo(PortId(2)), &mut ctx).unwrap();
        let tick = aircraft.step(Action::GoTo(PortId(1)), &mut ctx).unwrap();
        assert!((tick.reward + 1.0).abs() < f32::EPSILON);
        assert_eq!(tick.event, Some(TickEvent::Rejected));
        assert_eq!(aircraft.remaining_prepare_ticks(), Some(2));
        assert_eq!(aircraft.arrival_port(), Some(PortId(2)));

        aircraft.step(Action::Continue, &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert_eq!(aircraft.status(), Status::Fly);
        let before = aircraft.route_completion();
        let tick = aircraft.step(Action::GoTo(PortId(0)), &mut ctx).unwrap();
        assert!((tick.reward + 1.0).abs() < f32::EPSILON);
        assert!((aircraft.route_completion() - before).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_route_uses_default_distance() {
        let mut ports = ports(10);
        let distances = distances();
        let reward = LoadFactorReward;
        let mut aircraft = parked_aircraft(&mut ports);
        let mut ctx = StepContext {
            ports: &mut ports,
            distances: &distances,
            reward: &reward,
            rules: rules(),
        };
        aircraft.step(Action::GoTo(PortId(2)), &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        match aircraft.state() {
            FlightState::Fly {
                distance,
                ticks_to_arrival,
                ..
            } => {
                assert!((distance - 400.0).abs() < f64::EPSILON);
                assert_eq!(*ticks_to_arrival, 4);
            }
            other => panic!("expected flight, got {other:?}"),
        }
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert!((aircraft.route_completion() - 0.25).abs() < 1e-6);
        let midway = aircraft.position();
        assert!(midway.latitude > 0.0 && midway.latitude < 10.0);
    }

    #[test]
    fn dispatch_to_own_port_or_unknown_port() {
        let mut ports = ports(10);
        let distances = distances();
        let reward = DemandRankReward;
        let mut aircraft = parked_aircraft(&mut ports);
        let mut ctx = StepContext {
            ports: &mut ports,
            distances: &distances,
            reward: &reward,
            rules: rules(),
        };
        let tick = aircraft.step(Action::GoTo(PortId(0)), &mut ctx).unwrap();
        assert_eq!(aircraft.status(), Status::Wait);
        assert!(tick.event.is_none());

        let err = aircraft.step(Action::GoTo(PortId(9)), &mut ctx).unwrap_err();
        assert_eq!(err, SimError::UnknownPort(PortId(9)));
        assert_eq!(aircraft.status(), Status::Wait);

        // C has 40 waiting against B's 10: C ranks first of three ports.
        let tick = aircraft.step(Action::GoTo(PortId(2)), &mut ctx).unwrap();
        assert!((tick.reward - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn init_model_keeps_previous_values_for_unknown_names() {
        let ports = ports(0);
        let mut aircraft = Aircraft::new(AircraftId(3), &ports[0]);
        let mut catalog = ModelCatalog::empty();
        catalog.insert(
            "B777",
            AircraftModel {
                fuel: 0.6,
                capacity: 349,
            },
        );
        aircraft.init_model("B777", &catalog).unwrap();
        assert_eq!(aircraft.capacity(), 349);

        let err = aircraft.init_model("ZEPPELIN", &catalog).unwrap_err();
        assert!(matches!(err, SimError::UnknownModel { .. }));
        assert_eq!(aircraft.model(), "B777");
        assert_eq!(aircraft.capacity(), 349);
        assert!((aircraft.fuel() - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn unlisted_aircraft_still_completes_its_rotation() {
        let mut ports = ports(30);
        let distances = distances();
        let reward = LoadFactorReward;
        // Never parked: each list removal misses and is only reported.
        let mut aircraft = Aircraft::new(AircraftId(0), &ports[0]);
        let mut ctx = StepContext {
            ports: &mut ports,
            distances: &distances,
            reward: &reward,
            rules: rules(),
        };
        aircraft.step(Action::GoTo(PortId(1)), &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        assert_eq!(ctx.ports[0].departing(), &[AircraftId(0)]);
        assert_eq!(ctx.ports[1].incoming(), &[AircraftId(0)]);

        ctx.ports[0].remove_departing(AircraftId(0));
        ctx.ports[1].remove_incoming(AircraftId(0));
        for _ in 0..3 {
            aircraft.step(Action::Continue, &mut ctx).unwrap();
        }
        assert_eq!(aircraft.status(), Status::Wait);
        assert_eq!(ctx.ports[1].parked(), &[AircraftId(0)]);
        assert!(ctx.ports[0].departing().is_empty());
        assert!(ctx.ports[1].incoming().is_empty());
    }

    #[test]
    fn action_indices_map_to_ports() {
        assert_eq!(Action::from_index(0, 3).unwrap(), Action::Continue);
        assert_eq!(Action::from_index(3, 3).unwrap(), Action::GoTo(PortId(2)));
        assert!(Action::from_index(4, 3).is_err());
        assert_eq!(Action::GoTo(PortId(1)).index(), 2);
    }

    #[test]
    fn history_tracks_status_runs() {
        let mut ports = ports(10);
        let distances = distances();
        let reward = LoadFactorReward;
        let mut aircraft = parked_aircraft(&mut ports);
        let mut ctx = StepContext {
            ports: &mut ports,
            distances: &distances,
            reward: &reward,
            rules: rules(),
        };
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        aircraft.step(Action::GoTo(PortId(1)), &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        aircraft.step(Action::Continue, &mut ctx).unwrap();
        let statuses: Vec<Status> = aircraft
            .history()
            .segments()
            .iter()
            .map(|segment| segment.status)
            .collect();
        assert_eq!(statuses, vec![Status::Wait, Status::Prepare, Status::Fly]);
        assert_eq!(aircraft.history().segments()[1].tick_count, 2);
    }
}
