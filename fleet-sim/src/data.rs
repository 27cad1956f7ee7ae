//! Static reference data handed to the engine: ports, distances and aircraft models.
//!
//! Fetching and persisting this data belongs to external loaders. The engine
//! only defines the plain structures, the JSON shapes it understands, and an
//! embedded demo dataset.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::DataError;

const DEFAULT_PORTS_DATA: &str = include_str!("../data/ports.json");
const DEFAULT_DISTANCES_DATA: &str = include_str!("../data/port_distances.json");
const DEFAULT_MODELS_DATA: &str = include_str!("../data/aircraft_models.json");

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "Latitude", alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "Longitude", alias = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Linear interpolation towards `other`; `t` is clamped into `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            latitude: self.latitude + (other.latitude - self.latitude) * t,
            longitude: self.longitude + (other.longitude - self.longitude) * t,
        }
    }

    fn is_valid(self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One port as supplied by reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub code: String,
    pub coordinate: Coordinate,
}

impl PortRecord {
    #[must_use]
    pub fn new(code: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            code: code.trim().to_string(),
            coordinate: Coordinate::new(latitude, longitude),
        }
    }
}

/// Fuel and seating figures for one aircraft model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftModel {
    /// Fuel fraction in `[0, 1]`.
    pub fuel: f64,
    pub capacity: u32,
}

/// Departure code -> arrival code -> distance.
pub type DistanceTable = BTreeMap<String, BTreeMap<String, f64>>;

/// Origin code -> destination code -> evaluation baseline passengers.
pub type BaselineTable = BTreeMap<String, BTreeMap<String, u32>>;

/// Model name -> model figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ModelCatalog {
    models: BTreeMap<String, AircraftModel>,
}

impl ModelCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Parse a `{ "A320": { "fuel": 1.0, "capacity": 180 } }` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a model has zero capacity
    /// or a fuel fraction outside `[0, 1]`.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the embedded model table.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded table fails validation.
    pub fn load_from_static() -> Result<Self, DataError> {
        Self::from_json(DEFAULT_MODELS_DATA)
    }

    pub fn insert(&mut self, name: &str, model: AircraftModel) {
        self.models.insert(name.to_string(), model);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AircraftModel> {
        self.models.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AircraftModel)> {
        self.models.iter().map(|(name, model)| (name.as_str(), model))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn validate(&self) -> Result<(), DataError> {
        for (name, model) in &self.models {
            if model.capacity == 0 {
                return Err(DataError::Model {
                    model: name.clone(),
                    field: "capacity",
                    value: 0.0,
                });
            }
            if !(0.0..=1.0).contains(&model.fuel) {
                return Err(DataError::Model {
                    model: name.clone(),
                    field: "fuel",
                    value: model.fuel,
                });
            }
        }
        Ok(())
    }
}

/// Everything the engine needs to build a simulation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceData {
    pub ports: Vec<PortRecord>,
    pub distances: DistanceTable,
    pub models: ModelCatalog,
    /// Fixed evaluation baselines; pairs not listed are drawn from the tier range.
    pub baselines: BaselineTable,
}

impl ReferenceData {
    /// Bundle reference data, rejecting duplicate codes and invalid coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if two ports share a code or a coordinate is out of range.
    pub fn new(
        ports: Vec<PortRecord>,
        distances: DistanceTable,
        models: ModelCatalog,
    ) -> Result<Self, DataError> {
        let mut seen = BTreeSet::new();
        for port in &ports {
            if !seen.insert(port.code.as_str()) {
                return Err(DataError::DuplicatePort(port.code.clone()));
            }
            if !port.coordinate.is_valid() {
                return Err(DataError::Coordinate {
                    code: port.code.clone(),
                    latitude: port.coordinate.latitude,
                    longitude: port.coordinate.longitude,
                });
            }
        }
        Ok(Self {
            ports,
            distances,
            models,
            baselines: BaselineTable::new(),
        })
    }

    /// Attach supplied evaluation baselines.
    #[must_use]
    pub fn with_baselines(mut self, baselines: BaselineTable) -> Self {
        self.baselines = baselines;
        self
    }

    /// Load the embedded demo dataset of domestic Turkish ports.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON fails to parse or validate.
    pub fn load_from_static() -> Result<Self, DataError> {
        Self::new(
            ports_from_json(DEFAULT_PORTS_DATA)?,
            distances_from_json(DEFAULT_DISTANCES_DATA)?,
            ModelCatalog::load_from_static()?,
        )
    }

    #[must_use]
    pub fn port_codes(&self) -> Vec<&str> {
        self.ports.iter().map(|port| port.code.as_str()).collect()
    }
}

/// Parse a `{ "IST": { "latitude": 41.27, "longitude": 28.75 } }` document.
///
/// Ports come back ordered by code so id assignment is stable.
///
/// # Errors
///
/// Returns an error if the JSON is malformed.
pub fn ports_from_json(json: &str) -> Result<Vec<PortRecord>, DataError> {
    let raw: BTreeMap<String, Coordinate> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|(code, coordinate)| PortRecord {
            code: code.trim().to_string(),
            coordinate,
        })
        .collect())
}

/// Parse a `{ "IST": { "ESB": 365.0 } }` document.
///
/// # Errors
///
/// Returns an error if the JSON is malformed.
pub fn distances_from_json(json: &str) -> Result<DistanceTable, DataError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a `{ "IST": { "ESB": 120 } }` baseline document.
///
/// # Errors
///
/// Returns an error if the JSON is malformed.
pub fn baselines_from_json(json: &str) -> Result<BaselineTable, DataError> {
    Ok(serde_json::from_str(json)?)
}
