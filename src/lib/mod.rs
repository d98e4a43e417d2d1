//! Zoom-aware preparation of map layer data: geometry simplification,
//! viewport filtering, density sampling and a ttl cache in front of it all.

use thiserror::Error;

pub mod cache;
pub mod config;
pub mod filter;
pub mod geo;
pub mod geojson;
pub mod layers;
pub mod metrics;
pub mod orchestrator;
pub mod output;
pub mod sample;
pub mod simplify;

#[cfg(test)]
mod test_helpers;

pub use self::cache::{GeometryCache, ManualClock, SystemClock};
pub use self::config::Config;
pub use self::geo::{features_bounds, Bounds, LatLng, LngLat};
pub use self::geojson::{load_features, GeoFeature, Geometry};
pub use self::layers::{LayerSet, MapLayer};
pub use self::orchestrator::LayerOrchestrator;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid GeoJSON document: {0}")]
    InvalidDocument(String),
    #[error("invalid bounds \"{0}\", expected south,west,north,east")]
    InvalidBounds(String),
    #[error("unknown layer \"{0}\"")]
    UnknownLayer(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a geometry cannot be processed. Features carrying one are passed
/// through unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("missing geometry")]
    MissingGeometry,
    #[error("missing coordinates")]
    MissingCoordinates,
    #[error("empty coordinates")]
    EmptyCoordinates,
    #[error("non-finite coordinate")]
    NonFiniteCoordinate,
}
