use super::geo::{Bounds, LngLat};
use super::geojson::{GeoFeature, Geometry};
use super::GeometryError;

fn any_inside<'a>(mut positions: impl Iterator<Item = &'a LngLat>, bounds: &Bounds) -> bool {
    positions.any(|position| bounds.contains(*position))
}

/// Overlap test of a geometry against a viewport.
///
/// Points must lie inside the bounds. Every other kind counts as overlapping
/// when at least one of its vertices lies inside. A polygon that covers the
/// whole viewport without a vertex inside it is therefore dropped.
fn overlaps(geometry: &Geometry, bounds: &Bounds) -> Result<bool, GeometryError> {
    let missing = GeometryError::MissingCoordinates;
    let overlaps = match geometry {
        Geometry::Point { coordinates } => bounds.contains(coordinates.ok_or(missing)?),
        Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
            any_inside(coordinates.as_ref().ok_or(missing)?.iter(), bounds)
        }
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            any_inside(coordinates.as_ref().ok_or(missing)?.iter().flatten(), bounds)
        }
        Geometry::MultiPolygon { coordinates } => any_inside(
            coordinates.as_ref().ok_or(missing)?.iter().flatten().flatten(),
            bounds,
        ),
    };
    Ok(overlaps)
}

pub trait Filter {
    fn filter(&self, bounds: &Bounds) -> bool;
}

impl Filter for GeoFeature {
    fn filter(&self, bounds: &Bounds) -> bool {
        let geometry = self
            .geometry
            .as_ref()
            .ok_or(GeometryError::MissingGeometry);
        match geometry.and_then(|geometry| overlaps(geometry, bounds)) {
            Ok(overlaps) => overlaps,
            Err(err) => {
                log::warn!("error filtering feature {} by bounds: {}", self.id, err);
                true
            }
        }
    }
}

/// Keep the features that overlap the viewport.
///
/// Features whose coordinates cannot be evaluated are kept, so a broken
/// fixture shows up on the map instead of silently disappearing.
pub fn filter_by_bounds(features: &[GeoFeature], bounds: &Bounds) -> Vec<GeoFeature> {
    features
        .iter()
        .filter(|feature| feature.filter(bounds))
        .cloned()
        .collect()
}
