//! Distance lookups between ports with a fixed fallback for unknown pairs.
use log::warn;
use serde::{Deserialize, Serialize};

use crate::data::DistanceTable;
use crate::port::PortId;

/// Dense port-to-port distance cache built from a code-keyed table.
///
/// Missing pairs are expected: reference data is fetched pair by pair and is
/// rarely complete. Lookups never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceProvider {
    num_ports: usize,
    known: Vec<Option<f64>>,
    default_distance: f64,
}

impl DistanceProvider {
    /// Build the cache for ports identified by `codes` (index = port id).
    ///
    /// A pair listed only in one direction serves both directions. Entries
    /// naming unknown codes or carrying non-positive distances are skipped.
    #[must_use]
    pub fn new(table: &DistanceTable, codes: &[&str], default_distance: f64) -> Self {
        let num_ports = codes.len();
        let mut known = vec![None; num_ports * num_ports];
        let index_of = |code: &str| codes.iter().position(|candidate| *candidate == code);

        for (from, row) in table {
            let Some(from_index) = index_of(from) else {
                warn!("distance table names unknown departure port {from:?}; skipping row");
                continue;
            };
            for (to, &distance) in row {
                let Some(to_index) = index_of(to) else {
                    warn!("distance table names unknown arrival port {to:?}; skipping entry");
                    continue;
                };
                if !distance.is_finite() || distance <= 0.0 {
                    warn!("ignoring non-positive distance {distance} for {from}->{to}");
                    continue;
                }
                known[from_index * num_ports + to_index] = Some(distance);
                let reverse = &mut known[to_index * num_ports + from_index];
                if reverse.is_none() {
                    *reverse = Some(distance);
                }
            }
        }

        Self {
            num_ports,
            known,
            default_distance,
        }
    }

    /// Distance between two ports, or the default when the pair is unknown.
    #[must_use]
    pub fn distance(&self, departure: PortId, arrival: PortId) -> f64 {
        self.lookup(departure, arrival)
            .unwrap_or(self.default_distance)
    }

    /// Whether the table carried a real figure for this pair.
    #[must_use]
    pub fn is_known(&self, departure: PortId, arrival: PortId) -> bool {
        self.lookup(departure, arrival).is_some()
    }

    #[must_use]
    pub const fn default_distance(&self) -> f64 {
        self.default_distance
    }

    fn lookup(&self, departure: PortId, arrival: PortId) -> Option<f64> {
        if departure.index() >= self.num_ports || arrival.index() >= self.num_ports {
            return None;
        }
        self.known[departure.index() * self.num_ports + arrival.index()]
    }
}
