//! Ports: resource nodes holding aircraft lists and passenger demand.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::aircraft::AircraftId;
use crate::data::{Coordinate, PortRecord};
use crate::demand::DemandModel;

/// Aircraft ids kept inline for the common handful-per-port case.
pub type AircraftList = SmallVec<[AircraftId; 4]>;

/// Stable port identifier, assigned in reference-data order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub usize);

impl PortId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Demand-intensity class of a port.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    #[default]
    Medium,
    High,
}

/// One port and everything parked at, leaving, or heading to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    id: PortId,
    code: String,
    coordinate: Coordinate,
    tier: Tier,
    demand: DemandModel,
    parked: AircraftList,
    departing: AircraftList,
    incoming: AircraftList,
}

impl Port {
    #[must_use]
    pub fn new(id: PortId, record: &PortRecord, tier: Tier, num_ports: usize) -> Self {
        Self {
            id,
            code: record.code.clone(),
            coordinate: record.coordinate,
            tier,
            demand: DemandModel::new(id, num_ports),
            parked: AircraftList::new(),
            departing: AircraftList::new(),
            incoming: AircraftList::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> PortId {
        self.id
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub const fn position(&self) -> Coordinate {
        self.coordinate
    }

    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub const fn demand(&self) -> &DemandModel {
        &self.demand
    }

    pub const fn demand_mut(&mut self) -> &mut DemandModel {
        &mut self.demand
    }

    #[must_use]
    pub fn parked(&self) -> &[AircraftId] {
        &self.parked
    }

    #[must_use]
    pub fn departing(&self) -> &[AircraftId] {
        &self.departing
    }

    #[must_use]
    pub fn incoming(&self) -> &[AircraftId] {
        &self.incoming
    }

    pub fn park(&mut self, id: AircraftId) {
        insert_sorted(&mut self.parked, id);
    }

    pub fn unpark(&mut self, id: AircraftId) -> bool {
        remove(&mut self.parked, id)
    }

    pub fn add_departing(&mut self, id: AircraftId) {
        insert_sorted(&mut self.departing, id);
    }

    pub fn remove_departing(&mut self, id: AircraftId) -> bool {
        remove(&mut self.departing, id)
    }

    pub fn add_incoming(&mut self, id: AircraftId) {
        insert_sorted(&mut self.incoming, id);
    }

    pub fn remove_incoming(&mut self, id: AircraftId) -> bool {
        remove(&mut self.incoming, id)
    }

    /// Drop every aircraft reference; used at reset.
    pub fn clear_aircraft(&mut self) {
        self.parked.clear();
        self.departing.clear();
        self.incoming.clear();
    }
}

fn insert_sorted(list: &mut AircraftList, id: AircraftId) {
    if let Err(position) = list.binary_search(&id) {
        list.insert(position, id);
    }
}

fn remove(list: &mut AircraftList, id: AircraftId) -> bool {
    match list.binary_search(&id) {
        Ok(position) => {
            list.remove(position);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port() -> Port {
        Port::new(PortId(0), &PortRecord::new("IST", 41.27, 28.75), Tier::High, 3)
    }

    #[test]
    fn lists_stay_sorted_and_deduplicated() {
        let mut port = port();
        port.park(AircraftId(3));
        port.park(AircraftId(1));
        port.park(AircraftId(3));
        assert_eq!(port.parked(), &[AircraftId(1), AircraftId(3)]);

        assert!(port.unpark(AircraftId(3)));
        assert!(!port.unpark(AircraftId(3)));
        assert_eq!(port.parked(), &[AircraftId(1)]);
    }

    #[test]
    fn clear_drops_all_references() {
        let mut port = port();
        port.park(AircraftId(0));
        port.add_departing(AircraftId(1));
        port.add_incoming(AircraftId(2));
        port.clear_aircraft();
        assert!(port.parked().is_empty());
        assert!(port.departing().is_empty());
        assert!(port.incoming().is_empty());
    }

    #[test]
    fn display_and_tier_defaults() {
        assert_eq!(PortId(4).to_string(), "P4");
        assert_eq!(Tier::default(), Tier::Medium);
        assert_eq!(port().code(), "IST");
    }
}
