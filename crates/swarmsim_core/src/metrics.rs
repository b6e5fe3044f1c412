//! Optimization progress metrics and structured logging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use atomic_float::AtomicF32;

use crate::pso::GenerationSummary;

/// Counters and gauges for a running optimization.
pub struct OptimizerMetrics {
    generation_count: AtomicU64,
    evaluation_count: AtomicU64,
    best_fitness: AtomicF32,
    start_time: Instant,
}

impl Default for OptimizerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generation_count: AtomicU64::new(0),
            evaluation_count: AtomicU64::new(0),
            best_fitness: AtomicF32::new(f32::NEG_INFINITY),
            start_time: Instant::now(),
        }
    }

    /// Records a completed generation and logs it.
    pub fn record_generation(&self, summary: &GenerationSummary) {
        self.generation_count.fetch_add(1, Ordering::Relaxed);
        self.best_fitness.store(summary.best_fitness, Ordering::Relaxed);

        tracing::info!(
            generation = summary.generation,
            best_fitness = summary.best_fitness,
            mean_fitness = summary.mean_fitness,
            improved = summary.improved,
            "generation complete"
        );
    }

    /// Adds to the lifetime fitness-evaluation counter.
    pub fn record_evaluations(&self, count: u64) {
        self.evaluation_count.fetch_add(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn generation_count(&self) -> u64 {
        self.generation_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn evaluation_count(&self) -> u64 {
        self.evaluation_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn best_fitness(&self) -> f32 {
        self.best_fitness.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize tracing subscriber for logging.
pub fn init_logging() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::INFO)
            .finish(),
    )
    .ok();
}
