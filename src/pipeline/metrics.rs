// src/pipeline/metrics.rs
//
// Tick-level observability. Counters are shared with the scheduler's
// spawned tasks, so everything is atomic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct TaskMetrics {
    pub ticks_run: Arc<AtomicU64>,
    pub ticks_skipped_busy: Arc<AtomicU64>,
    pub ticks_skipped_no_frame: Arc<AtomicU64>,
    pub ticks_discarded: Arc<AtomicU64>,
    pub inference_failures: Arc<AtomicU64>,
    pub annotations_published: Arc<AtomicU64>,
    pub inference_time_us: Arc<AtomicU64>,
}

impl TaskMetrics {
    pub fn new() -> Self {
        Self {
            ticks_run: Arc::new(AtomicU64::new(0)),
            ticks_skipped_busy: Arc::new(AtomicU64::new(0)),
            ticks_skipped_no_frame: Arc::new(AtomicU64::new(0)),
            ticks_discarded: Arc::new(AtomicU64::new(0)),
            inference_failures: Arc::new(AtomicU64::new(0)),
            annotations_published: Arc::new(AtomicU64::new(0)),
            inference_time_us: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            ticks_run: self.ticks_run.load(Ordering::Relaxed),
            ticks_skipped_busy: self.ticks_skipped_busy.load(Ordering::Relaxed),
            ticks_skipped_no_frame: self.ticks_skipped_no_frame.load(Ordering::Relaxed),
            ticks_discarded: self.ticks_discarded.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            annotations_published: self.annotations_published.load(Ordering::Relaxed),
            last_inference_us: self.inference_time_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for TaskMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub face: TaskMetrics,
    pub clothing: TaskMetrics,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            face: TaskMetrics::new(),
            clothing: TaskMetrics::new(),
            started_at: Instant::now(),
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            face: self.face.summary(),
            clothing: self.clothing.summary(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskSummary {
    pub ticks_run: u64,
    pub ticks_skipped_busy: u64,
    pub ticks_skipped_no_frame: u64,
    pub ticks_discarded: u64,
    pub inference_failures: u64,
    pub annotations_published: u64,
    pub last_inference_us: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub face: TaskSummary,
    pub clothing: TaskSummary,
    pub elapsed_secs: f64,
}
