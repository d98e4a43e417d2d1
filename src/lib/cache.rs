use super::geo::Bounds;
use super::geojson::GeoFeature;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 100;

pub type Features = Arc<Vec<GeoFeature>>;

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    elapsed_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            start: Instant::now(),
            elapsed_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

struct CacheEntry {
    features: Features,
    inserted_at: Instant,
    /// breaks ties between entries inserted at the same instant
    sequence: u64,
}

pub fn cache_key(layer_id: &str, zoom: f64, bounds: Option<&Bounds>) -> String {
    match bounds {
        Some(bounds) => format!("{}_{}_{}", layer_id, zoom.floor(), bounds.key_suffix()),
        None => format!("{}_{}", layer_id, zoom.floor()),
    }
}

/// Processed feature lists keyed by layer, zoom bucket and viewport.
///
/// Entries older than the ttl are dropped when they are looked up. When the
/// cache is full, inserting a new key evicts the entry with the oldest
/// insertion time (the earlier insertion when times are equal).
pub struct GeometryCache<C: Clock = SystemClock> {
    entries: HashMap<String, CacheEntry>,
    next_sequence: u64,
    ttl: Duration,
    capacity: usize,
    clock: C,
}

impl GeometryCache<SystemClock> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        GeometryCache::with_clock(ttl, capacity, SystemClock)
    }
}

impl Default for GeometryCache<SystemClock> {
    fn default() -> Self {
        GeometryCache::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl<C: Clock> GeometryCache<C> {
    pub fn with_clock(ttl: Duration, capacity: usize, clock: C) -> Self {
        GeometryCache {
            entries: HashMap::new(),
            next_sequence: 0,
            ttl,
            capacity,
            clock,
        }
    }

    pub fn get(&mut self, layer_id: &str, zoom: f64, bounds: Option<&Bounds>) -> Option<Features> {
        let key = cache_key(layer_id, zoom, bounds);
        self.get_key(&key)
    }

    pub fn contains(&mut self, layer_id: &str, zoom: f64, bounds: Option<&Bounds>) -> bool {
        self.get(layer_id, zoom, bounds).is_some()
    }

    fn get_key(&mut self, key: &str) -> Option<Features> {
        let now = self.clock.now();
        let inserted_at = self.entries.get(key)?.inserted_at;
        if now.duration_since(inserted_at) < self.ttl {
            return self.entries.get(key).map(|entry| entry.features.clone());
        }
        log::debug!("cache entry {} expired", key);
        self.entries.remove(key);
        None
    }

    pub fn set(
        &mut self,
        layer_id: &str,
        zoom: f64,
        features: Vec<GeoFeature>,
        bounds: Option<&Bounds>,
    ) -> Features {
        let key = cache_key(layer_id, zoom, bounds);
        let features = Arc::new(features);
        if self.capacity == 0 {
            return features;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        let entry = CacheEntry {
            features: features.clone(),
            inserted_at: self.clock.now(),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.entries.insert(key, entry);
        features
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.inserted_at, entry.sequence))
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            log::debug!("evicting cache entry {}", key);
            self.entries.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.capacity,
        }
    }
}
