use super::filter::filter_by_bounds;
use super::geo::Bounds;
use super::geojson::GeoFeature;
use super::simplify::optimize_features;
use rand::Rng;

pub const DEFAULT_MAX_DENSITY: f64 = 100.;

/// Features per square degree of the viewport.
pub fn calculate_feature_density(features: &[GeoFeature], bounds: &Bounds) -> f64 {
    features.len() as f64 / bounds.area()
}

/// Bounds filter, then thin out the result when it is denser than
/// `max_density`, then simplify.
///
/// Each feature survives an independent Bernoulli trial with probability
/// `max_density / density`, so two calls may return different subsets. Pass a
/// seeded rng to get repeatable output.
pub fn adaptive_sample<R: Rng>(
    features: &[GeoFeature],
    zoom: f64,
    bounds: &Bounds,
    max_density: f64,
    rng: &mut R,
) -> Vec<GeoFeature> {
    let filtered = filter_by_bounds(features, bounds);
    let area = bounds.area();
    if !area.is_normal() {
        log::warn!("viewport {} has no usable area, skipping sampling", bounds);
        return optimize_features(&filtered, zoom);
    }

    let density = calculate_feature_density(&filtered, bounds);
    if density <= max_density {
        return optimize_features(&filtered, zoom);
    }

    let sample_ratio = max_density / density;
    let sampled: Vec<GeoFeature> = filtered
        .into_iter()
        .filter(|_| rng.gen::<f64>() < sample_ratio)
        .collect();
    log::debug!(
        "sampled {} features at density {:.1} (ratio {:.3})",
        sampled.len(),
        density,
        sample_ratio
    );
    optimize_features(&sampled, zoom)
}
