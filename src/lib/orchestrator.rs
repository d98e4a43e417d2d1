use super::cache::{CacheStats, Clock, Features, GeometryCache, SystemClock};
use super::config::Config;
use super::filter::filter_by_bounds;
use super::geo::Bounds;
use super::geojson::GeoFeature;
use super::layers::LayerSet;
use super::metrics::{PerformanceMetrics, PerformanceMonitor};
use super::sample::adaptive_sample;
use super::simplify::optimize_features;
use itertools::Itertools;
use rand::Rng;
use rayon::prelude::*;

const ADAPTIVE_SUFFIX: &str = "@adaptive";

fn process(
    source: &[GeoFeature],
    zoom: f64,
    bounds: Option<&Bounds>,
    gated: bool,
) -> Vec<GeoFeature> {
    if gated {
        return vec![];
    }
    match bounds {
        Some(bounds) => optimize_features(&filter_by_bounds(source, bounds), zoom),
        None => optimize_features(source, zoom),
    }
}

/// Owns the layer catalog and the geometry cache of one map view and hands
/// out render-ready feature lists.
pub struct LayerOrchestrator<C: Clock = SystemClock> {
    cache: GeometryCache<C>,
    layers: LayerSet,
    monitor: PerformanceMonitor,
    max_density: f64,
}

impl LayerOrchestrator<SystemClock> {
    pub fn new(config: &Config) -> Self {
        LayerOrchestrator::with_clock(config, SystemClock)
    }
}

impl Default for LayerOrchestrator<SystemClock> {
    fn default() -> Self {
        LayerOrchestrator::new(&Config::default())
    }
}

impl<C: Clock> LayerOrchestrator<C> {
    pub fn with_clock(config: &Config, clock: C) -> Self {
        LayerOrchestrator {
            cache: GeometryCache::with_clock(config.cache_ttl(), config.cache_capacity, clock),
            layers: config.layer_set(),
            monitor: PerformanceMonitor::new(config.slow_operation()),
            max_density: config.max_density,
        }
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerSet {
        &mut self.layers
    }

    fn is_data_gated(&self, layer_id: &str, zoom: f64) -> bool {
        self.layers
            .get(layer_id)
            .map_or(false, |layer| layer.is_data_gated(zoom))
    }

    /// Render-ready features of a layer at a zoom level, optionally limited to
    /// a viewport.
    ///
    /// Results are cached per zoom bucket and viewport: asking twice before the
    /// entry expires returns the very same list.
    pub fn get_optimized_layer_data(
        &mut self,
        layer_id: &str,
        zoom: f64,
        source: &[GeoFeature],
        bounds: Option<&Bounds>,
    ) -> Features {
        if let Some(cached) = self.cache.get(layer_id, zoom, bounds) {
            self.monitor.record_cache_hit();
            return cached;
        }
        self.monitor.record_cache_miss();

        let gated = self.is_data_gated(layer_id, zoom);
        if gated {
            log::debug!("layer {} produces no data at zoom {}", layer_id, zoom);
        }
        let name = format!("optimize:{}", layer_id);
        let (features, _) = self
            .monitor
            .measure(&name, || process(source, zoom, bounds, gated));
        self.monitor.record_features(source.len(), features.len());
        self.cache.set(layer_id, zoom, features, bounds)
    }

    /// Warm the cache for a set of zoom levels (without a viewport).
    ///
    /// Zoom levels falling into the same bucket are processed once, buckets
    /// that are cached already are skipped. The remaining levels are processed
    /// on the rayon pool and stored before this returns.
    pub fn preload_layer_data(&mut self, layer_id: &str, zoom_levels: &[f64], source: &[GeoFeature]) {
        let mut pending = vec![];
        for zoom in zoom_levels
            .iter()
            .copied()
            .unique_by(|zoom| zoom.floor() as i64)
        {
            if self.cache.contains(layer_id, zoom, None) {
                self.monitor.record_cache_hit();
                continue;
            }
            self.monitor.record_cache_miss();
            pending.push((zoom, self.is_data_gated(layer_id, zoom)));
        }
        if pending.is_empty() {
            return;
        }

        let name = format!("preload:{}", layer_id);
        let (processed, time) = self.monitor.measure(&name, || {
            pending
                .into_par_iter()
                .map(|(zoom, gated)| (zoom, process(source, zoom, None, gated)))
                .collect::<Vec<_>>()
        });
        log::debug!(
            "preloaded {} zoom levels of {} in {:?}",
            processed.len(),
            layer_id,
            time
        );
        for (zoom, features) in processed {
            self.monitor.record_features(source.len(), features.len());
            self.cache.set(layer_id, zoom, features, None);
        }
    }

    /// Density-limited features of a layer within a viewport.
    ///
    /// The sampled result is cached like the plain layer data, so repeated
    /// renders see one stable sample until the entry expires.
    pub fn get_adaptive_features<R: Rng>(
        &mut self,
        layer_id: &str,
        zoom: f64,
        source: &[GeoFeature],
        bounds: &Bounds,
        rng: &mut R,
    ) -> Features {
        let key = format!("{}{}", layer_id, ADAPTIVE_SUFFIX);
        if let Some(cached) = self.cache.get(&key, zoom, Some(bounds)) {
            self.monitor.record_cache_hit();
            return cached;
        }
        self.monitor.record_cache_miss();

        let gated = self.is_data_gated(layer_id, zoom);
        let max_density = self.max_density;
        let (features, _) = self.monitor.measure(&key, || {
            if gated {
                vec![]
            } else {
                adaptive_sample(source, zoom, bounds, max_density, rng)
            }
        });
        self.monitor.record_features(source.len(), features.len());
        self.cache.set(&key, zoom, features, Some(bounds))
    }

    pub fn clear_all_caches(&mut self) {
        log::info!("clearing {} cached layer entries", self.cache.len());
        self.cache.clear();
        self.monitor.reset();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.monitor.metrics()
    }
}

impl<C: Clock> Drop for LayerOrchestrator<C> {
    fn drop(&mut self) {
        log::debug!(
            "disposing layer orchestrator with {} cached entries",
            self.cache.len()
        );
    }
}
