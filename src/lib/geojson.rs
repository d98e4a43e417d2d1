use super::geo::LngLat;
use super::{Error, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;

pub type Properties = Map<String, Value>;

/// Geometry payload of a feature.
///
/// Coordinates are optional so that fixture data with `null` or missing
/// coordinates still loads; the pipeline passes such features through.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        #[serde(default)]
        coordinates: Option<LngLat>,
    },
    MultiPoint {
        #[serde(default)]
        coordinates: Option<Vec<LngLat>>,
    },
    LineString {
        #[serde(default)]
        coordinates: Option<Vec<LngLat>>,
    },
    MultiLineString {
        #[serde(default)]
        coordinates: Option<Vec<Vec<LngLat>>>,
    },
    Polygon {
        #[serde(default)]
        coordinates: Option<Vec<Vec<LngLat>>>,
    },
    MultiPolygon {
        #[serde(default)]
        coordinates: Option<Vec<Vec<Vec<LngLat>>>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point { .. } => GeometryKind::Point,
            Geometry::MultiPoint { .. } => GeometryKind::MultiPoint,
            Geometry::LineString { .. } => GeometryKind::LineString,
            Geometry::MultiLineString { .. } => GeometryKind::MultiLineString,
            Geometry::Polygon { .. } => GeometryKind::Polygon,
            Geometry::MultiPolygon { .. } => GeometryKind::MultiPolygon,
        }
    }

    /// All positions of the geometry, or `None` when the coordinates are missing.
    pub fn positions(&self) -> Option<Vec<LngLat>> {
        let positions = match self {
            Geometry::Point { coordinates } => vec![(*coordinates)?],
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.as_ref()?.clone()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.as_ref()?.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .as_ref()?
                .iter()
                .flatten()
                .flatten()
                .copied()
                .collect(),
        };
        Some(positions)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions().map_or(0, |positions| positions.len())
    }
}

/// A map feature as it is handed to the renderer.
///
/// A `null` geometry is kept as `None` and passes through the pipeline
/// unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename = "Feature")]
pub struct GeoFeature {
    #[serde(
        default,
        deserialize_with = "id_as_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Properties,
}

fn id_as_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(id)) => Ok(id),
        Some(Value::Number(id)) => Ok(id.to_string()),
        Some(other) => Err(de::Error::custom(format!(
            "feature id must be a string or a number, got {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Properties, D::Error> {
    let properties = Option::<Properties>::deserialize(deserializer)?;
    Ok(properties.unwrap_or_default())
}

impl GeoFeature {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        GeoFeature {
            id: id.into(),
            geometry: Some(geometry),
            properties: Properties::new(),
        }
    }

    pub fn point(id: impl Into<String>, position: LngLat) -> Self {
        GeoFeature::new(
            id,
            Geometry::Point {
                coordinates: Some(position),
            },
        )
    }

    pub fn polygon(id: impl Into<String>, rings: Vec<Vec<LngLat>>) -> Self {
        GeoFeature::new(
            id,
            Geometry::Polygon {
                coordinates: Some(rings),
            },
        )
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(Geometry::kind)
    }

    pub fn positions(&self) -> Option<Vec<LngLat>> {
        self.geometry.as_ref()?.positions()
    }

    pub fn vertex_count(&self) -> usize {
        self.geometry.as_ref().map_or(0, Geometry::vertex_count)
    }
}

#[derive(Serialize)]
#[serde(tag = "type")]
pub struct FeatureCollection<'a> {
    pub features: &'a [GeoFeature],
}

fn collect_features(features: Vec<Value>) -> Vec<GeoFeature> {
    let total = features.len();
    let features: Vec<GeoFeature> = features
        .into_iter()
        .enumerate()
        .filter_map(|(idx, feature)| match serde_json::from_value(feature) {
            Ok(feature) => Some(feature),
            Err(err) => {
                log::warn!("skipping feature #{}: {}", idx, err);
                None
            }
        })
        .collect();
    if features.len() < total {
        log::warn!("skipped {} of {} features", total - features.len(), total);
    }
    features
}

/// Read the features of a GeoJSON document (a collection or a single feature).
///
/// Features of a collection that cannot be read are skipped with a warning,
/// the rest of the collection still loads.
pub fn load_features(reader: impl Read) -> Result<Vec<GeoFeature>> {
    let mut document: Value = serde_json::from_reader(reader)?;
    let kind = document.get("type").and_then(Value::as_str).map(String::from);
    let features = match kind.as_deref() {
        Some("FeatureCollection") => match document.get_mut("features").map(Value::take) {
            Some(Value::Array(features)) => collect_features(features),
            _ => {
                return Err(Error::InvalidDocument(
                    "FeatureCollection without a features array".into(),
                ))
            }
        },
        Some("Feature") => vec![serde_json::from_value(document)?],
        Some(other) => {
            return Err(Error::InvalidDocument(format!(
                "unsupported GeoJSON type \"{}\"",
                other
            )))
        }
        None => return Err(Error::InvalidDocument("missing GeoJSON type".into())),
    };
    log::debug!("loaded {} features", features.len());
    Ok(features)
}
