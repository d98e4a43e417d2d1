//! Zoom-based geometry simplification.
//!
//! Line and polygon vertices are decimated with Ramer-Douglas-Peucker via
//! `geo::Simplify`. The tolerance is picked from a fixed table of zoom bands.
//! Outside the high quality bands a radial-distance pass runs first, which is
//! cheaper and drops clusters of nearly identical vertices before RDP.

use super::geo::LngLat;
use super::geojson::{GeoFeature, Geometry};
use super::layers::{DISTRICT_LEVEL, STATE_LEVEL, VILLAGE_LEVEL};
use super::GeometryError;
use geo::prelude::*;
use geo_types::{Coordinate, LineString};

/// Closed rings need at least this many positions.
const MIN_RING_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub tolerance: f64,
    pub high_quality: bool,
}

/// Simplification tolerance (in degrees) for a zoom level.
///
/// | zoom         | tolerance | high quality |
/// |--------------|-----------|--------------|
/// | `<= 6`       | 0.01      | no           |
/// | `(6, 7]`     | 0.005     | no           |
/// | `(7, 10]`    | 0.002     | yes          |
/// | `> 10`       | 0.001     | yes          |
pub fn tolerance_for_zoom(zoom: f64) -> Tolerance {
    if zoom <= STATE_LEVEL {
        Tolerance {
            tolerance: 0.01,
            high_quality: false,
        }
    } else if zoom <= DISTRICT_LEVEL {
        Tolerance {
            tolerance: 0.005,
            high_quality: false,
        }
    } else if zoom <= VILLAGE_LEVEL {
        Tolerance {
            tolerance: 0.002,
            high_quality: true,
        }
    } else {
        Tolerance {
            tolerance: 0.001,
            high_quality: true,
        }
    }
}

fn squared_distance(a: LngLat, b: LngLat) -> f64 {
    let dx = a.lng() - b.lng();
    let dy = a.lat() - b.lat();
    dx * dx + dy * dy
}

/// Drop every vertex closer than `tolerance` to the previously kept one.
/// The first and the last vertex always survive.
pub fn radial_distance(line: &[LngLat], tolerance: f64) -> Vec<LngLat> {
    let (first, last) = match (line.first(), line.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return vec![],
    };
    let sq_tolerance = tolerance * tolerance;
    let mut kept = vec![first];
    let mut previous = first;
    for &position in &line[1..] {
        if squared_distance(position, previous) > sq_tolerance {
            kept.push(position);
            previous = position;
        }
    }
    if previous != last {
        kept.push(last);
    }
    kept
}

fn simplify_line(line: &[LngLat], tolerance: Tolerance) -> Vec<LngLat> {
    if line.len() <= 2 {
        return line.to_vec();
    }
    let prepared = if tolerance.high_quality {
        line.to_vec()
    } else {
        radial_distance(line, tolerance.tolerance)
    };
    let line_string: LineString<f64> = prepared.into_iter().map(Coordinate::<f64>::from).collect();
    line_string
        .simplify(&tolerance.tolerance)
        .0
        .into_iter()
        .map(LngLat::from)
        .collect()
}

fn simplify_ring(ring: &[LngLat], tolerance: Tolerance) -> Vec<LngLat> {
    let simplified = simplify_line(ring, tolerance);
    if simplified.len() < MIN_RING_LEN {
        return ring.to_vec();
    }
    simplified
}

fn simplify_rings(rings: &[Vec<LngLat>], tolerance: Tolerance) -> Vec<Vec<LngLat>> {
    rings
        .iter()
        .map(|ring| simplify_ring(ring, tolerance))
        .collect()
}

pub(crate) fn validate(geometry: &Geometry) -> Result<(), GeometryError> {
    let positions = geometry
        .positions()
        .ok_or(GeometryError::MissingCoordinates)?;
    if positions.is_empty() {
        return Err(GeometryError::EmptyCoordinates);
    }
    if !positions.iter().all(LngLat::is_finite) {
        return Err(GeometryError::NonFiniteCoordinate);
    }
    Ok(())
}

pub fn simplify_geometry(geometry: &Geometry, zoom: f64) -> Result<Geometry, GeometryError> {
    validate(geometry)?;
    let tolerance = tolerance_for_zoom(zoom);
    let simplified = match geometry {
        Geometry::LineString {
            coordinates: Some(line),
        } => Geometry::LineString {
            coordinates: Some(simplify_line(line, tolerance)),
        },
        Geometry::MultiLineString {
            coordinates: Some(lines),
        } => Geometry::MultiLineString {
            coordinates: Some(
                lines
                    .iter()
                    .map(|line| simplify_line(line, tolerance))
                    .collect(),
            ),
        },
        Geometry::Polygon {
            coordinates: Some(rings),
        } => Geometry::Polygon {
            coordinates: Some(simplify_rings(rings, tolerance)),
        },
        Geometry::MultiPolygon {
            coordinates: Some(polygons),
        } => Geometry::MultiPolygon {
            coordinates: Some(
                polygons
                    .iter()
                    .map(|rings| simplify_rings(rings, tolerance))
                    .collect(),
            ),
        },
        // points have nothing to decimate
        other => other.clone(),
    };
    Ok(simplified)
}

fn try_simplify(feature: &GeoFeature, zoom: f64) -> Result<GeoFeature, GeometryError> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or(GeometryError::MissingGeometry)?;
    Ok(GeoFeature {
        id: feature.id.clone(),
        geometry: Some(simplify_geometry(geometry, zoom)?),
        properties: feature.properties.clone(),
    })
}

/// Simplify a feature for the given zoom level.
///
/// Valid points pass through untouched. Features whose geometry cannot be
/// simplified are returned unchanged and a warning is logged; this never
/// fails.
pub fn simplify(feature: &GeoFeature, zoom: f64) -> GeoFeature {
    match try_simplify(feature, zoom) {
        Ok(simplified) => simplified,
        Err(err) => {
            log::warn!(
                "failed to simplify geometry for feature {}: {}",
                feature.id,
                err
            );
            feature.clone()
        }
    }
}

pub fn optimize_features(features: &[GeoFeature], zoom: f64) -> Vec<GeoFeature> {
    features
        .iter()
        .map(|feature| simplify(feature, zoom))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson::GeometryKind;
    use crate::test_helpers::{circle, square};

    #[test]
    fn tolerance_bands() {
        assert_eq!(tolerance_for_zoom(3.).tolerance, 0.01);
        assert_eq!(tolerance_for_zoom(6.).tolerance, 0.01);
        assert_eq!(tolerance_for_zoom(6.5).tolerance, 0.005);
        assert_eq!(tolerance_for_zoom(7.).high_quality, false);
        assert_eq!(tolerance_for_zoom(9.).tolerance, 0.002);
        assert_eq!(tolerance_for_zoom(10.).high_quality, true);
        assert_eq!(tolerance_for_zoom(10.5).tolerance, 0.001);
        assert_eq!(tolerance_for_zoom(18.).tolerance, 0.001);
    }

    #[test]
    fn tolerance_never_grows_with_zoom() {
        let zooms: Vec<f64> = (0..=40).map(|step| 6.25 + step as f64 * 0.25).collect();
        for pair in zooms.windows(2) {
            let coarse = tolerance_for_zoom(pair[0]).tolerance;
            let fine = tolerance_for_zoom(pair[1]).tolerance;
            assert!(fine <= coarse, "zoom {} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn radial_distance_keeps_endpoints() {
        let line = vec![
            LngLat(0., 0.),
            LngLat(0.001, 0.),
            LngLat(0.002, 0.),
            LngLat(0.5, 0.5),
            LngLat(0.5005, 0.5),
        ];
        let kept = radial_distance(&line, 0.01);
        assert_eq!(kept, vec![LngLat(0., 0.), LngLat(0.5, 0.5), LngLat(0.5005, 0.5)]);
        assert!(radial_distance(&[], 0.01).is_empty());
    }

    #[test]
    fn polygon_loses_vertices_at_low_zoom() {
        let feature = circle("district", LngLat(80., 20.), 1., 360);
        let original = feature.vertex_count();
        let state = simplify(&feature, 5.).vertex_count();
        let detailed = simplify(&feature, 12.).vertex_count();
        assert!(state < detailed, "{} < {}", state, detailed);
        assert!(detailed < original, "{} < {}", detailed, original);
        assert!(state >= MIN_RING_LEN);
    }

    #[test]
    fn kind_and_properties_survive() {
        let feature = circle("district", LngLat(80., 20.), 1., 90).with_property("name", "Mandla");
        let simplified = simplify(&feature, 6.);
        assert_eq!(simplified.kind(), Some(GeometryKind::Polygon));
        assert_eq!(simplified.id, "district");
        assert_eq!(simplified.properties, feature.properties);
    }

    #[test]
    fn small_ring_stays_closed() {
        let feature = square("plot", LngLat(80., 20.), 0.001);
        let simplified = simplify(&feature, 3.);
        assert_eq!(simplified, feature);
    }

    #[test]
    fn line_string_is_simplified() {
        let coordinates = (0..100)
            .map(|i| LngLat(i as f64 * 0.01, (i as f64 * 0.1).sin() * 0.0005))
            .collect();
        let feature = GeoFeature::new(
            "river",
            Geometry::LineString {
                coordinates: Some(coordinates),
            },
        );
        let simplified = simplify(&feature, 4.);
        assert_eq!(simplified.kind(), Some(GeometryKind::LineString));
        assert!(simplified.vertex_count() < 10);
    }

    #[test]
    fn point_passes_through() {
        let feature = GeoFeature::point("village", LngLat(80., 20.));
        assert_eq!(simplify(&feature, 3.), feature);
        assert_eq!(try_simplify(&feature, 3.), Ok(feature));
    }

    #[test]
    fn broken_point_is_reported() {
        let broken = GeoFeature::new("village", Geometry::Point { coordinates: None });
        assert_eq!(simplify(&broken, 3.), broken);
        assert_eq!(
            try_simplify(&broken, 3.),
            Err(GeometryError::MissingCoordinates)
        );
        let nan = GeoFeature::point("village", LngLat(std::f64::NAN, 20.));
        assert_eq!(
            try_simplify(&nan, 3.),
            Err(GeometryError::NonFiniteCoordinate)
        );
    }

    #[test]
    fn missing_geometry_passes_through() {
        let unmapped = GeoFeature {
            geometry: None,
            ..circle("unmapped", LngLat(80., 20.), 1., 90)
        };
        assert_eq!(simplify(&unmapped, 5.), unmapped);
        assert_eq!(
            try_simplify(&unmapped, 5.),
            Err(GeometryError::MissingGeometry)
        );
    }

    #[test]
    fn null_coordinates_pass_through() {
        let feature = GeoFeature::new("broken", Geometry::Polygon { coordinates: None });
        assert_eq!(simplify(&feature, 5.), feature);
        assert_eq!(
            simplify_geometry(feature.geometry.as_ref().unwrap(), 5.),
            Err(GeometryError::MissingCoordinates)
        );
    }

    #[test]
    fn empty_coordinates_pass_through() {
        let feature = GeoFeature::new(
            "empty",
            Geometry::MultiPolygon {
                coordinates: Some(vec![]),
            },
        );
        assert_eq!(simplify(&feature, 5.), feature);
        assert_eq!(
            simplify_geometry(feature.geometry.as_ref().unwrap(), 5.),
            Err(GeometryError::EmptyCoordinates)
        );
    }

    #[test]
    fn non_finite_coordinates_pass_through() {
        let ring = vec![
            LngLat(0., 0.),
            LngLat(std::f64::NAN, 0.),
            LngLat(1., 1.),
            LngLat(0., 0.),
        ];
        let feature = GeoFeature::polygon("nan", vec![ring]);
        let simplified = simplify(&feature, 5.);
        assert_eq!(simplified.vertex_count(), 4);
        assert_eq!(
            simplify_geometry(feature.geometry.as_ref().unwrap(), 5.),
            Err(GeometryError::NonFiniteCoordinate)
        );
    }

    #[test]
    fn batch() {
        let features = vec![
            GeoFeature::point("a", LngLat(80., 20.)),
            circle("b", LngLat(80., 20.), 1., 120),
        ];
        let optimized = optimize_features(&features, 5.);
        assert_eq!(optimized.len(), 2);
        assert_eq!(optimized[0], features[0]);
        assert!(optimized[1].vertex_count() < features[1].vertex_count());
    }
}
