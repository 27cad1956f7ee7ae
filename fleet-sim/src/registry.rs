//! Owned registry of ports and aircraft for one simulation instance.
use log::{debug, warn};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::aircraft::{Aircraft, AircraftId, AircraftTick, Action, FlightRules, Status, StepContext};
use crate::config::SimConfig;
use crate::data::{BaselineTable, ReferenceData};
use crate::distance::DistanceProvider;
use crate::error::SimError;
use crate::port::{Port, PortId};
use crate::reward::RewardModel;
use crate::rng::RngBundle;

/// Fewest ports a simulation can run on.
pub const MIN_PORTS: usize = 2;

/// A broken bookkeeping rule found by [`Registry::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub subject: String,
    pub detail: String,
}

impl Violation {
    fn aircraft(id: AircraftId, detail: String) -> Self {
        Self {
            subject: id.to_string(),
            detail,
        }
    }

    fn port(port: &Port, detail: String) -> Self {
        Self {
            subject: port.code().to_string(),
            detail,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.detail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    ports: Vec<Port>,
    aircraft: Vec<Aircraft>,
    #[serde(skip)]
    distances: DistanceProvider,
    fallback: PortId,
}

impl Registry {
    /// Build ports and fleet from reference data.
    ///
    /// Evaluation baselines are drawn here, once, from the baseline stream;
    /// pairs listed in `data.baselines` then replace the drawn values.
    /// Aircraft whose model is missing from the catalog keep default values.
    ///
    /// # Errors
    ///
    /// Returns an error for fewer than two ports, an empty fleet or an
    /// unknown fallback port code.
    pub fn build(
        data: &ReferenceData,
        cfg: &SimConfig,
        rngs: &mut RngBundle,
    ) -> Result<Self, SimError> {
        let num_ports = data.ports.len();
        if num_ports < MIN_PORTS {
            return Err(SimError::TooFewPorts {
                min: MIN_PORTS,
                got: num_ports,
            });
        }
        if cfg.fleet_size() == 0 {
            return Err(SimError::EmptyFleet);
        }

        let mut ports: Vec<Port> = data
            .ports
            .iter()
            .enumerate()
            .map(|(index, record)| {
                Port::new(PortId(index), record, cfg.tier_for(&record.code), num_ports)
            })
            .collect();
        for port in &mut ports {
            let range = cfg.demand.tiers.range(port.tier());
            port.demand_mut().draw_baseline(range, rngs.baseline());
        }
        apply_supplied_baselines(&mut ports, &data.baselines);

        let fallback = match cfg.fallback_port.as_deref() {
            Some(code) => ports
                .iter()
                .find(|port| port.code() == code)
                .map(Port::id)
                .ok_or_else(|| SimError::UnknownPortCode(code.to_string()))?,
            None => PortId(num_ports - 1),
        };

        let mut aircraft: Vec<Aircraft> = Vec::with_capacity(cfg.fleet_size());
        for entry in &cfg.fleet {
            for _ in 0..entry.count {
                let mut plane = Aircraft::new(AircraftId(aircraft.len()), &ports[fallback.index()]);
                if let Err(err) = plane.init_model(&entry.model, &data.models) {
                    warn!(
                        "{err}; {} keeps capacity {}",
                        plane.id(),
                        plane.capacity()
                    );
                }
                aircraft.push(plane);
            }
        }

        let codes = data.port_codes();
        let distances = DistanceProvider::new(&data.distances, &codes, cfg.default_distance);

        Ok(Self {
            ports,
            aircraft,
            distances,
            fallback,
        })
    }

    /// Regenerate demand and spread the fleet across ports.
    ///
    /// Ports are visited in id order; each takes
    /// `total_demand / passengers_per_aircraft` of the not-yet-placed aircraft
    /// (ascending ids). Whatever is left parks at the fallback port.
    pub fn reset<R: Rng + ?Sized>(&mut self, cfg: &SimConfig, rng: &mut R) {
        for port in &mut self.ports {
            port.clear_aircraft();
        }
        let fleet_size = self.aircraft.len();
        let mut placed = 0_usize;
        for port in &mut self.ports {
            let tier = port.tier();
            port.demand_mut().regenerate(tier, &cfg.demand, rng);
            let wanted = port.demand().total() / cfg.passengers_per_aircraft.max(1);
            let count = usize::try_from(wanted)
                .unwrap_or(usize::MAX)
                .min(fleet_size - placed);
            for plane in &mut self.aircraft[placed..placed + count] {
                port.park(plane.id());
                plane.reset(port);
            }
            placed += count;
        }
        let fallback = &mut self.ports[self.fallback.index()];
        for plane in &mut self.aircraft[placed..] {
            fallback.park(plane.id());
            plane.reset(fallback);
        }
        debug!(
            "registry reset: {placed} of {fleet_size} aircraft placed by demand, {} at {}",
            fleet_size - placed,
            fallback.code()
        );
    }

    /// Regenerate demand on every port.
    pub fn refresh_demand<R: Rng + ?Sized>(&mut self, cfg: &SimConfig, rng: &mut R) {
        for port in &mut self.ports {
            let tier = port.tier();
            port.demand_mut().regenerate(tier, &cfg.demand, rng);
        }
    }

    /// Resolve one tick for one aircraft.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown aircraft or destination port.
    pub fn step_aircraft(
        &mut self,
        id: AircraftId,
        action: Action,
        reward: &dyn RewardModel,
        rules: FlightRules,
    ) -> Result<AircraftTick, SimError> {
        let Self {
            ports,
            aircraft,
            distances,
            ..
        } = self;
        let plane = aircraft
            .get_mut(id.index())
            .ok_or(SimError::UnknownAircraft(id))?;
        let mut ctx = StepContext {
            ports,
            distances,
            reward,
            rules,
        };
        plane.step(action, &mut ctx)
    }

    #[must_use]
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    #[must_use]
    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    #[must_use]
    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }

    #[must_use]
    pub fn fleet_size(&self) -> usize {
        self.aircraft.len()
    }

    #[must_use]
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.index())
    }

    /// Look a port up by its code.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownPortCode`] when no port carries the code.
    pub fn port_by_code(&self, code: &str) -> Result<&Port, SimError> {
        self.ports
            .iter()
            .find(|port| port.code() == code)
            .ok_or_else(|| SimError::UnknownPortCode(code.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`SimError::UnknownAircraft`] for ids beyond the fleet.
    pub fn aircraft_by_id(&self, id: AircraftId) -> Result<&Aircraft, SimError> {
        self.aircraft
            .get(id.index())
            .ok_or(SimError::UnknownAircraft(id))
    }

    #[must_use]
    pub const fn distances(&self) -> &DistanceProvider {
        &self.distances
    }

    #[must_use]
    pub const fn fallback_port(&self) -> PortId {
        self.fallback
    }

    /// Aircraft count per port, keyed by current port.
    #[must_use]
    pub fn occupancy(&self) -> Vec<u32> {
        let mut counts = vec![0_u32; self.ports.len()];
        for plane in &self.aircraft {
            if let Some(slot) = counts.get_mut(plane.current_port().index()) {
                *slot = slot.saturating_add(1);
            }
        }
        counts
    }

    /// Check list membership against every aircraft's status.
    ///
    /// WAIT and PREPARE aircraft sit in exactly one parked list (their current
    /// port) and nowhere else. FLY aircraft sit only in their departure port's
    /// departing list and their arrival port's incoming list.
    #[must_use]
    pub fn check_membership(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let fleet = self.aircraft.len();
        for port in &self.ports {
            let listed = port
                .parked()
                .iter()
                .chain(port.departing())
                .chain(port.incoming());
            for id in listed {
                if id.index() >= fleet {
                    violations.push(Violation::port(port, format!("lists unknown aircraft {id}")));
                }
            }
        }

        for plane in &self.aircraft {
            let id = plane.id();
            let parked = self.ports_listing(id, Port::parked);
            let departing = self.ports_listing(id, Port::departing);
            let incoming = self.ports_listing(id, Port::incoming);
            match plane.status() {
                Status::Wait | Status::Prepare => {
                    if parked != [plane.current_port()] {
                        violations.push(Violation::aircraft(
                            id,
                            format!(
                                "{:?} at {} but parked at {parked:?}",
                                plane.status(),
                                plane.current_port()
                            ),
                        ));
                    }
                    if !departing.is_empty() || !incoming.is_empty() {
                        violations.push(Violation::aircraft(
                            id,
                            format!(
                                "grounded but departing {departing:?} incoming {incoming:?}"
                            ),
                        ));
                    }
                }
                Status::Fly => {
                    if !parked.is_empty() {
                        violations.push(Violation::aircraft(
                            id,
                            format!("flying but parked at {parked:?}"),
                        ));
                    }
                    if departing != [plane.departure_port()] {
                        violations.push(Violation::aircraft(
                            id,
                            format!(
                                "flying from {} but departing {departing:?}",
                                plane.departure_port()
                            ),
                        ));
                    }
                    if plane.arrival_port().map(|port| vec![port]) != Some(incoming.clone()) {
                        violations.push(Violation::aircraft(
                            id,
                            format!(
                                "flying to {:?} but incoming at {incoming:?}",
                                plane.arrival_port()
                            ),
                        ));
                    }
                }
            }
        }
        violations
    }

    /// Membership plus demand bookkeeping: zero diagonal and consistent totals.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<Violation> {
        let mut violations = self.check_membership();
        for port in &self.ports {
            let demand = port.demand();
            if demand.get(port.id()) != 0 {
                violations.push(Violation::port(
                    port,
                    format!("{} passengers bound for itself", demand.get(port.id())),
                ));
            }
            let sum = demand
                .as_slice()
                .iter()
                .fold(0_u32, |acc, value| acc.saturating_add(*value));
            if sum != demand.total() {
                violations.push(Violation::port(
                    port,
                    format!("demand total {} but entries sum to {sum}", demand.total()),
                ));
            }
        }
        for plane in &self.aircraft {
            if plane.passenger_count() > plane.capacity() {
                violations.push(Violation::aircraft(
                    plane.id(),
                    format!(
                        "{} passengers exceed capacity {}",
                        plane.passenger_count(),
                        plane.capacity()
                    ),
                ));
            }
        }
        violations
    }

    /// Stable digest of ports, demand and fleet state.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        hasher.finish()
    }

    fn ports_listing(&self, id: AircraftId, list: fn(&Port) -> &[AircraftId]) -> Vec<PortId> {
        self.ports
            .iter()
            .flat_map(|port| {
                list(port)
                    .iter()
                    .filter(move |candidate| **candidate == id)
                    .map(move |_| port.id())
            })
            .collect()
    }
}

/// Overwrite drawn baselines with supplied `origin -> destination` values.
fn apply_supplied_baselines(ports: &mut [Port], baselines: &BaselineTable) {
    let index_of = |code: &str| ports.iter().position(|port| port.code() == code);
    let mut rows: Vec<(usize, Vec<(usize, u32)>)> = Vec::new();
    for (origin, destinations) in baselines {
        let Some(origin_index) = index_of(origin) else {
            warn!("baseline for unknown port {origin} ignored");
            continue;
        };
        let mut entries = Vec::with_capacity(destinations.len());
        for (destination, passengers) in destinations {
            match index_of(destination) {
                Some(index) => entries.push((index, *passengers)),
                None => warn!("baseline {origin} -> {destination} names an unknown port; ignored"),
            }
        }
        rows.push((origin_index, entries));
    }
    for (origin_index, entries) in rows {
        let demand = ports[origin_index].demand_mut();
        let mut row = demand.baseline().to_vec();
        for (index, passengers) in entries {
            row[index] = passengers;
        }
        demand.set_baseline(&row);
    }
}
