use std::fs;
use std::path::{Path, PathBuf};

use fleet_sim::data::{baselines_from_json, distances_from_json, ports_from_json};
use fleet_sim::{
    BaselineTable, ConfigError, DataError, DistanceTable, ModelCatalog, PortRecord,
    ReferenceData, ReferenceLoader, SimConfig,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reads reference data from JSON files, falling back to the embedded
/// demo dataset for anything not given.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    pub ports: Option<PathBuf>,
    pub distances: Option<PathBuf>,
    pub models: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub baselines: Option<PathBuf>,
}

impl FileLoader {
    fn read(path: &Path) -> Result<String, LoadError> {
        fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ReferenceLoader for FileLoader {
    type Error = LoadError;

    fn load_ports(&self) -> Result<Vec<PortRecord>, Self::Error> {
        match &self.ports {
            Some(path) => Ok(ports_from_json(&Self::read(path)?)?),
            None => Ok(ReferenceData::load_from_static()?.ports),
        }
    }

    fn load_distances(&self) -> Result<DistanceTable, Self::Error> {
        match &self.distances {
            Some(path) => Ok(distances_from_json(&Self::read(path)?)?),
            // Custom ports without a distance table run on the default distance.
            None if self.ports.is_some() => Ok(DistanceTable::new()),
            None => Ok(ReferenceData::load_from_static()?.distances),
        }
    }

    fn load_models(&self) -> Result<ModelCatalog, Self::Error> {
        match &self.models {
            Some(path) => Ok(ModelCatalog::from_json(&Self::read(path)?)?),
            None => Ok(ModelCatalog::load_from_static()?),
        }
    }

    fn load_baselines(&self) -> Result<BaselineTable, Self::Error> {
        match &self.baselines {
            Some(path) => Ok(baselines_from_json(&Self::read(path)?)?),
            None => Ok(BaselineTable::new()),
        }
    }

    fn load_config(&self) -> Result<SimConfig, Self::Error> {
        match &self.config {
            Some(path) => Ok(SimConfig::from_json(&Self::read(path)?)?),
            None => Ok(SimConfig::default_config()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_sim::FleetEngine;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "fleet-loader-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_to_embedded_data() {
        let loader = FileLoader::default();
        assert!(!loader.load_ports().unwrap().is_empty());
        assert!(!loader.load_distances().unwrap().is_empty());
        assert!(!loader.load_models().unwrap().is_empty());
        assert_eq!(loader.load_config().unwrap(), SimConfig::default_config());
    }

    #[test]
    fn custom_ports_skip_embedded_distances() {
        let ports = temp_file(
            "ports",
            r#"{ "XXA": { "lat": 1.0, "lon": 2.0 }, "XXB": { "lat": 3.0, "lon": 4.0 } }"#,
        );
        let loader = FileLoader {
            ports: Some(ports),
            ..FileLoader::default()
        };
        assert_eq!(loader.load_ports().unwrap().len(), 2);
        assert!(loader.load_distances().unwrap().is_empty());
    }

    #[test]
    fn baseline_file_feeds_evaluation_demand() {
        let baselines = temp_file("baselines", r#"{ "ESB": { "IST": 222 } }"#);
        let config = temp_file(
            "eval-config",
            r#"{ "demand": { "mode": { "kind": "evaluation", "jitter": 0.0 } } }"#,
        );
        let loader = FileLoader {
            baselines: Some(baselines),
            config: Some(config),
            ..FileLoader::default()
        };
        assert_eq!(loader.load_baselines().unwrap()["ESB"]["IST"], 222);

        let sim = FleetEngine::new(loader).create_simulation().unwrap();
        let registry = sim.registry();
        let ist = registry.port_by_code("IST").unwrap().id();
        let esb = registry.port_by_code("ESB").unwrap();
        assert_eq!(esb.demand().baseline()[ist.index()], 222);
        assert_eq!(esb.demand().get(ist), 222);
        assert!(FileLoader::default().load_baselines().unwrap().is_empty());
    }

    #[test]
    fn missing_and_invalid_files_are_reported() {
        let loader = FileLoader {
            config: Some(PathBuf::from("/definitely/not/here.json")),
            ..FileLoader::default()
        };
        assert!(matches!(loader.load_config(), Err(LoadError::Io { .. })));

        let bad = temp_file("config", r#"{ "horizon": 0 }"#);
        let loader = FileLoader {
            config: Some(bad),
            ..FileLoader::default()
        };
        assert!(matches!(loader.load_config(), Err(LoadError::Config(_))));
    }
}
