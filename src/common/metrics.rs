//! Write-path metrics
//!
//! Prometheus-compatible counters and a latency histogram for the
//! coordinator. One `WriteMetrics` is created per node and shared by `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Histogram bucket boundaries for latency measurements (in milliseconds)
const LATENCY_BUCKETS: [f64; 11] = [
    1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
];

/// A simple histogram implementation for latency tracking
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    boundaries: Vec<f64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Create a new histogram with default latency buckets
    pub fn new() -> Self {
        Self::with_buckets(&LATENCY_BUCKETS)
    }

    /// Create a histogram with custom bucket boundaries
    pub fn with_buckets(boundaries: &[f64]) -> Self {
        let buckets = (0..=boundaries.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            boundaries: boundaries.to_vec(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a value in the histogram
    pub fn observe(&self, value: f64) {
        let bucket_idx = self
            .boundaries
            .iter()
            .position(|&boundary| value <= boundary)
            .unwrap_or(self.boundaries.len());

        self.buckets[bucket_idx].fetch_add(1, Ordering::Relaxed);
        self.sum
            .fetch_add((value * 1000.0) as u64, Ordering::Relaxed); // Store as microseconds for precision
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Cumulative bucket counts, ending with the +Inf bucket
    pub fn get_buckets(&self) -> Vec<(f64, u64)> {
        let mut cumulative = 0u64;
        let mut result = Vec::with_capacity(self.boundaries.len() + 1);

        for (i, &boundary) in self.boundaries.iter().enumerate() {
            cumulative += self.buckets[i].load(Ordering::Relaxed);
            result.push((boundary, cumulative));
        }

        cumulative += self.buckets[self.boundaries.len()].load(Ordering::Relaxed);
        result.push((f64::INFINITY, cumulative));

        result
    }

    /// Get sum of all observed values
    pub fn sum(&self) -> f64 {
        self.sum.load(Ordering::Relaxed) as f64 / 1000.0
    }

    /// Get count of observations
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter for tracking event counts
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters kept by the coordinator and the replica writer
#[derive(Debug)]
pub struct WriteMetrics {
    pub write_requests: Counter,
    pub point_requests: Counter,
    pub write_ok: Counter,
    pub write_failed: Counter,
    pub write_timeouts: Counter,
    pub local_shard_writes: Counter,
    pub remote_shard_writes: Counter,
    pub shard_write_errors: Counter,
    pub write_latency: Histogram,
    start_time: Instant,
}

impl WriteMetrics {
    pub fn new() -> Self {
        Self {
            write_requests: Counter::new(),
            point_requests: Counter::new(),
            write_ok: Counter::new(),
            write_failed: Counter::new(),
            write_timeouts: Counter::new(),
            local_shard_writes: Counter::new(),
            remote_shard_writes: Counter::new(),
            shard_write_errors: Counter::new(),
            write_latency: Histogram::new(),
            start_time: Instant::now(),
        }
    }

    /// Record the end of one coordinator write call
    pub fn record_write(&self, duration: Duration, success: bool) {
        self.write_latency.observe(duration.as_secs_f64() * 1000.0);
        if success {
            self.write_ok.inc();
        } else {
            self.write_failed.inc();
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-compatible metrics output
    pub fn to_prometheus(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();

        let counters = [
            ("write_requests_total", "Coordinator write calls", &self.write_requests),
            ("point_requests_total", "Points submitted for writing", &self.point_requests),
            ("write_ok_total", "Writes that met their consistency level", &self.write_ok),
            ("write_failed_total", "Writes that failed", &self.write_failed),
            ("write_timeouts_total", "Owner writes cut off by the deadline", &self.write_timeouts),
            ("local_shard_writes_total", "Shard writes applied locally", &self.local_shard_writes),
            ("remote_shard_writes_total", "Shard writes sent to remote owners", &self.remote_shard_writes),
            ("shard_write_errors_total", "Failed owner writes", &self.shard_write_errors),
        ];

        // Writing into a String cannot fail
        for (name, help, counter) in counters {
            let _ = writeln!(out, "# HELP minits_{} {}", name, help);
            let _ = writeln!(out, "# TYPE minits_{} counter", name);
            let _ = writeln!(out, "minits_{} {}", name, counter.get());
        }

        out.push_str("# HELP minits_uptime_seconds Server uptime in seconds\n");
        out.push_str("# TYPE minits_uptime_seconds gauge\n");
        let _ = writeln!(out, "minits_uptime_seconds {}", self.uptime_seconds());

        out.push_str("# HELP minits_write_duration_ms Write duration in milliseconds\n");
        out.push_str("# TYPE minits_write_duration_ms histogram\n");
        for (le, count) in self.write_latency.get_buckets() {
            if le.is_infinite() {
                let _ = writeln!(out, "minits_write_duration_ms_bucket{{le=\"+Inf\"}} {}", count);
            } else {
                let _ = writeln!(out, "minits_write_duration_ms_bucket{{le=\"{}\"}} {}", le, count);
            }
        }
        let _ = writeln!(out, "minits_write_duration_ms_sum {}", self.write_latency.sum());
        let _ = writeln!(out, "minits_write_duration_ms_count {}", self.write_latency.count());

        out
    }
}

impl Default for WriteMetrics {
    fn default() -> Self {
        Self::new()
    }
}
