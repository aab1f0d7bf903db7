// src/pipeline/mod.rs

pub mod clothing;
pub mod face;
pub mod metrics;
pub mod scheduler;
pub mod store;

pub use clothing::ClothingAnnotationPipeline;
pub use face::FaceAnnotationPipeline;
pub use metrics::{MetricsSummary, PipelineMetrics, TaskMetrics};
pub use scheduler::{PublishGuard, Scheduler};
pub use store::AnnotationStore;

use crate::error::{DetectionError, TickOutcome};
use async_trait::async_trait;

/// One periodically-invoked annotation producer. The scheduler only sees
/// this surface.
#[async_trait]
pub trait AnnotationPipeline: Send + Sync {
    fn name(&self) -> &'static str;

    /// Permanently out of service after a fatal failure.
    fn is_disabled(&self) -> bool {
        false
    }

    async fn tick(&self) -> Result<TickOutcome, DetectionError>;
}
