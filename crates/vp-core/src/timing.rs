//! Lightweight performance timing utilities.
//!
//! Measures where runtime is spent around predictor calls and mesh lookups.
//! Enabled via the `VP_TIMING` environment variable or programmatically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("VP_TIMING").is_ok()
}

/// Measures one call and records it into an accumulator when dropped.
pub struct ScopedTimer {
    sink: &'static AccumulatingTimer,
    start: Instant,
    enabled: bool,
}

impl ScopedTimer {
    pub fn start(sink: &'static AccumulatingTimer) -> Self {
        Self {
            sink,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if self.enabled {
            self.sink.record(self.start.elapsed().as_secs_f64());
        }
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    /// Create a new accumulating timer.
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    /// Reset the timer.
    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Predictor round-trip timers.
pub mod predictor_timing {
    use super::AccumulatingTimer;

    /// Runtime startup (interpreter launch + handshake)
    pub static RUNTIME_STARTUP: AccumulatingTimer = AccumulatingTimer::new();
    /// Batched (cl, re) point requests
    pub static POINT_BATCH_CALLS: AccumulatingTimer = AccumulatingTimer::new();
    /// Batched alpha-sweep requests used to build polar meshes
    pub static SWEEP_BATCH_CALLS: AccumulatingTimer = AccumulatingTimer::new();
    /// Interpolated lookups answered from a polar mesh
    pub static MESH_LOOKUPS: AccumulatingTimer = AccumulatingTimer::new();

    /// Print predictor timing summary.
    pub fn print_summary() {
        if !super::is_enabled() {
            return;
        }

        println!("\n=== Predictor Timing ===");
        for (label, timer) in [
            ("runtime startup", &RUNTIME_STARTUP),
            ("point batches", &POINT_BATCH_CALLS),
            ("sweep batches", &SWEEP_BATCH_CALLS),
            ("mesh lookups", &MESH_LOOKUPS),
        ] {
            let count = timer.count();
            if count > 0 {
                println!(
                    "{:<16} {} calls, {:.3}s total, {:.4}ms avg",
                    label,
                    count,
                    timer.total_seconds(),
                    timer.average_seconds() * 1000.0
                );
            }
        }
        println!("========================\n");
    }
}
