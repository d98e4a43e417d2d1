use serde::Serialize;
use std::time::{Duration, Instant};

const MAX_SAMPLES: usize = 100;
const KEPT_SAMPLES: usize = 50;

pub const DEFAULT_SLOW_OPERATION: Duration = Duration::from_millis(100);

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub cache_hit_rate: f64,
    pub average_processing_ms: f64,
    pub total_features: usize,
    pub visible_features: usize,
}

/// Rolling timings and cache counters of the optimization pipeline.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    processing_times: Vec<Duration>,
    cache_hits: u64,
    cache_requests: u64,
    total_features: usize,
    visible_features: usize,
    slow_operation: Duration,
}

impl PerformanceMonitor {
    pub fn new(slow_operation: Duration) -> Self {
        PerformanceMonitor {
            processing_times: Vec::with_capacity(MAX_SAMPLES + 1),
            cache_hits: 0,
            cache_requests: 0,
            total_features: 0,
            visible_features: 0,
            slow_operation,
        }
    }

    pub fn record_processing_time(&mut self, time: Duration) {
        self.processing_times.push(time);
        if self.processing_times.len() > MAX_SAMPLES {
            let excess = self.processing_times.len() - KEPT_SAMPLES;
            self.processing_times.drain(..excess);
        }
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
        self.cache_requests += 1;
    }

    pub fn record_cache_miss(&mut self) {
        self.cache_requests += 1;
    }

    pub fn record_features(&mut self, total: usize, visible: usize) {
        self.total_features += total;
        self.visible_features += visible;
    }

    pub fn sample_count(&self) -> usize {
        self.processing_times.len()
    }

    /// Run `f`, record how long it took and warn when it was slow.
    pub fn measure<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> (T, Duration) {
        let start = Instant::now();
        let result = f();
        let time = start.elapsed();
        self.record_processing_time(time);
        if time > self.slow_operation {
            log::warn!(
                "slow operation \"{}\" took {:.2}ms",
                name,
                time.as_secs_f64() * 1000.
            );
        }
        (result, time)
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        let average_processing_ms = if self.processing_times.is_empty() {
            0.
        } else {
            let total: Duration = self.processing_times.iter().sum();
            total.as_secs_f64() * 1000. / self.processing_times.len() as f64
        };
        let cache_hit_rate = if self.cache_requests > 0 {
            self.cache_hits as f64 / self.cache_requests as f64
        } else {
            0.
        };
        PerformanceMetrics {
            cache_hit_rate,
            average_processing_ms,
            total_features: self.total_features,
            visible_features: self.visible_features,
        }
    }

    pub fn reset(&mut self) {
        self.processing_times.clear();
        self.cache_hits = 0;
        self.cache_requests = 0;
        self.total_features = 0;
        self.visible_features = 0;
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        PerformanceMonitor::new(DEFAULT_SLOW_OPERATION)
    }
}
