// src/pipeline/scheduler.rs
//
// Two independent periodic tasks gated by readiness. Overlap prevention
// is drop-not-queue: a tick that lands while the previous invocation of
// the same task is still in flight is skipped whole, bounding each model
// to one concurrent call.

use crate::error::{DetectionError, TickOutcome};
use crate::pipeline::{AnnotationPipeline, PipelineMetrics, TaskMetrics};
use crate::readiness::ReadinessGate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Decides whether a finished tick may publish. A result that completes
/// after the gate deactivated or the scheduler was torn down is discarded,
/// never published.
#[derive(Clone)]
pub struct PublishGuard {
    active: watch::Receiver<bool>,
    live: Arc<AtomicBool>,
}

impl PublishGuard {
    pub fn new(gate: &ReadinessGate) -> Self {
        Self {
            active: gate.subscribe(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn allows(&self) -> bool {
        *self.active.borrow() && self.live.load(Ordering::Acquire)
    }

    fn revoke(&self) {
        self.live.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    guard: PublishGuard,
    face_task: JoinHandle<()>,
    clothing_task: JoinHandle<()>,
}

impl Scheduler {
    pub fn start(
        face: Arc<dyn AnnotationPipeline>,
        clothing: Arc<dyn AnnotationPipeline>,
        gate: &ReadinessGate,
        face_cadence_ms: u64,
        clothing_cadence_ms: u64,
        metrics: &PipelineMetrics,
        guard: PublishGuard,
    ) -> Self {
        let face_task = tokio::spawn(run_task(
            face,
            Duration::from_millis(face_cadence_ms),
            gate.subscribe(),
            metrics.face.clone(),
        ));
        let clothing_task = tokio::spawn(run_task(
            clothing,
            Duration::from_millis(clothing_cadence_ms),
            gate.subscribe(),
            metrics.clothing.clone(),
        ));

        Self {
            guard,
            face_task,
            clothing_task,
        }
    }

    /// Cancel both timer loops. In-flight inference calls finish on their
    /// own tasks but the revoked guard keeps their results unpublished.
    pub async fn shutdown(self) {
        self.guard.revoke();
        self.face_task.abort();
        self.clothing_task.abort();
        let _ = self.face_task.await;
        let _ = self.clothing_task.await;
        info!("Scheduler stopped");
    }
}

async fn run_task(
    pipeline: Arc<dyn AnnotationPipeline>,
    period: Duration,
    mut active: watch::Receiver<bool>,
    metrics: TaskMetrics,
) {
    let busy = Arc::new(AtomicBool::new(false));

    loop {
        // Park until the gate activates.
        while !*active.borrow_and_update() {
            if active.changed().await.is_err() {
                return;
            }
        }

        info!(
            "{} task running every {}ms",
            pipeline.name(),
            period.as_millis()
        );
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = active.changed() => {
                    match changed {
                        Ok(()) => {
                            if !*active.borrow() {
                                info!("{} task halted: gate inactive", pipeline.name());
                                // Dropping the ticker cancels the pending timer.
                                break;
                            }
                        }
                        Err(_) => return,
                    }
                }
                _ = ticker.tick() => {
                    if pipeline.is_disabled() {
                        warn!("{} pipeline disabled, stopping task", pipeline.name());
                        return;
                    }
                    if busy
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                    {
                        // Previous invocation still in flight: drop, never queue.
                        metrics.ticks_skipped_busy.fetch_add(1, Ordering::Relaxed);
                        debug!("{} tick skipped: previous still running", pipeline.name());
                        continue;
                    }

                    let pipeline = Arc::clone(&pipeline);
                    let busy = Arc::clone(&busy);
                    let metrics = metrics.clone();
                    tokio::spawn(async move {
                        report(pipeline.name(), pipeline.tick().await, &metrics);
                        busy.store(false, Ordering::Release);
                    });
                }
            }
        }
    }
}

fn report(name: &str, result: Result<TickOutcome, DetectionError>, metrics: &TaskMetrics) {
    match result {
        Ok(TickOutcome::Published(count)) => {
            debug!("{} published {} annotations", name, count);
        }
        Ok(TickOutcome::SkippedNoFrame) => {}
        Ok(TickOutcome::Discarded) => {
            metrics.ticks_discarded.fetch_add(1, Ordering::Relaxed);
            debug!("{} result discarded: gate inactive or torn down", name);
        }
        Ok(TickOutcome::Disabled) => {}
        Err(DetectionError::ConfigMismatch { labels, outputs }) => {
            error!(
                "{} pipeline disabled: label catalog has {} entries but classifier emitted {}",
                name, labels, outputs
            );
        }
        Err(err) => {
            metrics.inference_failures.fetch_add(1, Ordering::Relaxed);
            warn!("{} tick failed: {}", name, err);
        }
    }
}
