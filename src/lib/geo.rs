use super::geojson::GeoFeature;
use super::{Error, Result};
use geo::prelude::*;
use geo_types::{Coordinate, MultiPoint, Point};
use itertools::Itertools;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A position in GeoJSON order, `[longitude, latitude]`.
///
/// Extra members of a position (altitude) are ignored when reading.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct LngLat(pub f64, pub f64);

struct LngLatVisitor;

impl<'de> Visitor<'de> for LngLatVisitor {
    type Value = LngLat;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a position of at least two numbers")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<LngLat, A::Error> {
        let lng = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let lat = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}
        Ok(LngLat(lng, lat))
    }
}

impl<'de> Deserialize<'de> for LngLat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_seq(LngLatVisitor)
    }
}

/// A position in map-library order, `[latitude, longitude]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LatLng(pub f64, pub f64);

impl LngLat {
    pub fn lng(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }
}

impl LatLng {
    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lng(&self) -> f64 {
        self.1
    }
}

impl From<LngLat> for LatLng {
    fn from(position: LngLat) -> Self {
        LatLng(position.lat(), position.lng())
    }
}

impl From<LatLng> for LngLat {
    fn from(position: LatLng) -> Self {
        LngLat(position.lng(), position.lat())
    }
}

impl From<LngLat> for Coordinate<f64> {
    fn from(position: LngLat) -> Self {
        Coordinate {
            x: position.lng(),
            y: position.lat(),
        }
    }
}

impl From<Coordinate<f64>> for LngLat {
    fn from(coordinate: Coordinate<f64>) -> Self {
        LngLat(coordinate.x, coordinate.y)
    }
}

/// Viewport rectangle, `[[south, west], [north, east]]` on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(from = "[LatLng; 2]", into = "[LatLng; 2]")]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Bounds {
            south_west,
            north_east,
        }
    }

    pub fn south(&self) -> f64 {
        self.south_west.lat()
    }

    pub fn west(&self) -> f64 {
        self.south_west.lng()
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat()
    }

    pub fn east(&self) -> f64 {
        self.north_east.lng()
    }

    /// Inclusive on every edge.
    pub fn contains(&self, position: LngLat) -> bool {
        position.lng() >= self.west()
            && position.lng() <= self.east()
            && position.lat() >= self.south()
            && position.lat() <= self.north()
    }

    pub fn area(&self) -> f64 {
        ((self.north() - self.south()) * (self.east() - self.west())).abs()
    }

    pub(crate) fn key_suffix(&self) -> String {
        [self.south(), self.west(), self.north(), self.east()]
            .iter()
            .join("_")
    }
}

impl From<[LatLng; 2]> for Bounds {
    fn from(corners: [LatLng; 2]) -> Self {
        Bounds::new(corners[0], corners[1])
    }
}

impl From<Bounds> for [LatLng; 2] {
    fn from(bounds: Bounds) -> Self {
        [bounds.south_west, bounds.north_east]
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.south(),
            self.west(),
            self.north(),
            self.east()
        )
    }
}

/// Bounding box over every finite position of the features, `None` when
/// there is none.
pub fn features_bounds(features: &[GeoFeature]) -> Option<Bounds> {
    let points: MultiPoint<f64> = features
        .iter()
        .filter_map(GeoFeature::positions)
        .flatten()
        .filter(LngLat::is_finite)
        .map(|position| Point::from(Coordinate::<f64>::from(position)))
        .collect();
    let rect = points.bounding_rect()?;
    Some(Bounds::new(
        LatLng(rect.min().y, rect.min().x),
        LatLng(rect.max().y, rect.max().x),
    ))
}

/// Parses `south,west,north,east`.
impl FromStr for Bounds {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|_| Error::InvalidBounds(s.to_string()))?;
        match values.as_slice() {
            [south, west, north, east] if values.iter().all(|v| v.is_finite()) => Ok(
                Bounds::new(LatLng(*south, *west), LatLng(*north, *east)),
            ),
            _ => Err(Error::InvalidBounds(s.to_string())),
        }
    }
}
