use crate::geo::LngLat;
use crate::geojson::GeoFeature;
use std::f64::consts::PI;

/// Polygon approximating a circle with `n` vertices (plus the closing one).
pub fn circle(id: &str, center: LngLat, radius: f64, n: usize) -> GeoFeature {
    let mut ring: Vec<LngLat> = (0..n)
        .map(|i| {
            let angle = 2. * PI * i as f64 / n as f64;
            LngLat(
                center.lng() + radius * angle.cos(),
                center.lat() + radius * angle.sin(),
            )
        })
        .collect();
    ring.push(ring[0]);
    GeoFeature::polygon(id, vec![ring])
}

pub fn square(id: &str, south_west: LngLat, size: f64) -> GeoFeature {
    let LngLat(lng, lat) = south_west;
    let ring = vec![
        LngLat(lng, lat),
        LngLat(lng + size, lat),
        LngLat(lng + size, lat + size),
        LngLat(lng, lat + size),
        LngLat(lng, lat),
    ];
    GeoFeature::polygon(id, vec![ring])
}

/// `n` x `n` points spread evenly over a square cell grid.
pub fn grid_points(origin: LngLat, size: f64, n: usize) -> Vec<GeoFeature> {
    let step = size / n as f64;
    (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            let position = LngLat(
                origin.lng() + (i as f64 + 0.5) * step,
                origin.lat() + (j as f64 + 0.5) * step,
            );
            GeoFeature::point(format!("p_{}_{}", i, j), position)
        })
        .collect()
}

pub fn villages() -> Vec<GeoFeature> {
    vec![
        GeoFeature::point("kanha", LngLat(80.61, 22.33)).with_property("population", 1240),
        GeoFeature::point("mocha", LngLat(80.68, 22.27)).with_property("population", 860),
        GeoFeature::point("khatia", LngLat(80.57, 22.21)).with_property("population", 455),
    ]
}
