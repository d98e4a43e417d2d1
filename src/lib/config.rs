use super::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use super::layers::{LayerSet, MapLayer};
use super::metrics::DEFAULT_SLOW_OPERATION;
use super::sample::DEFAULT_MAX_DENSITY;
use super::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;

/// Tunables of the optimizer. Every field has a default, so a config file
/// only needs to name what it changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub max_density: f64,
    pub slow_operation_ms: u64,
    /// replaces the built-in layer catalog when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<MapLayer>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            cache_capacity: DEFAULT_CAPACITY,
            max_density: DEFAULT_MAX_DENSITY,
            slow_operation_ms: DEFAULT_SLOW_OPERATION.as_millis() as u64,
            layers: None,
        }
    }
}

impl Config {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn slow_operation(&self) -> Duration {
        Duration::from_millis(self.slow_operation_ms)
    }

    pub fn layer_set(&self) -> LayerSet {
        match &self.layers {
            Some(layers) => LayerSet::new(layers.clone()),
            None => LayerSet::default(),
        }
    }
}
