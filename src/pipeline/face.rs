// src/pipeline/face.rs
//
// Per tick: read the frame, detect faces with age/gender, rescale from
// the model's working resolution to display coordinates, publish.

use crate::error::{DetectionError, TickOutcome};
use crate::frame_source::FrameSource;
use crate::models::FaceDetectionModel;
use crate::pipeline::scheduler::PublishGuard;
use crate::pipeline::store::AnnotationStore;
use crate::pipeline::{AnnotationPipeline, TaskMetrics};
use crate::types::{Annotation, AnnotationKey, FaceAnnotation, PixelRect};
use async_trait::async_trait;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

pub struct FaceAnnotationPipeline {
    model: Box<dyn FaceDetectionModel>,
    source: Arc<dyn FrameSource>,
    store: Arc<AnnotationStore>,
    guard: PublishGuard,
    metrics: TaskMetrics,
}

impl FaceAnnotationPipeline {
    pub fn new(
        model: Box<dyn FaceDetectionModel>,
        source: Arc<dyn FrameSource>,
        store: Arc<AnnotationStore>,
        guard: PublishGuard,
        metrics: TaskMetrics,
    ) -> Self {
        Self {
            model,
            source,
            store,
            guard,
            metrics,
        }
    }
}

#[async_trait]
impl AnnotationPipeline for FaceAnnotationPipeline {
    fn name(&self) -> &'static str {
        "face"
    }

    async fn tick(&self) -> Result<TickOutcome, DetectionError> {
        // Descriptor is read fresh each tick; a missing or degenerate
        // frame is a silent skip, not an error.
        let descriptor = self.source.descriptor();
        if !descriptor.is_ready() {
            self.metrics
                .ticks_skipped_no_frame
                .fetch_add(1, Ordering::Relaxed);
            return Ok(TickOutcome::SkippedNoFrame);
        }
        let Some(frame) = self.source.frame() else {
            self.metrics
                .ticks_skipped_no_frame
                .fetch_add(1, Ordering::Relaxed);
            return Ok(TickOutcome::SkippedNoFrame);
        };

        self.metrics.ticks_run.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let raw = self
            .model
            .detect(&frame)
            .await
            .map_err(DetectionError::InferenceFailure)?;

        self.metrics
            .inference_time_us
            .store(started.elapsed().as_micros() as u64, Ordering::Relaxed);

        // Independent linear scale factors per axis: relative position is
        // preserved even when working and display aspect ratios differ.
        let (working_w, working_h) = self.model.working_resolution();
        let scale_x = frame.width as f32 / working_w as f32;
        let scale_y = frame.height as f32 / working_h as f32;

        // Detector ordering is preserved.
        let items: Vec<Annotation> = raw
            .into_iter()
            .map(|detection| {
                Annotation::Face(FaceAnnotation {
                    rect: PixelRect {
                        x: detection.bbox[0] * scale_x,
                        y: detection.bbox[1] * scale_y,
                        w: detection.bbox[2] * scale_x,
                        h: detection.bbox[3] * scale_y,
                    },
                    landmarks: detection
                        .landmarks
                        .into_iter()
                        .map(|(x, y)| (x * scale_x, y * scale_y))
                        .collect(),
                    age: detection.age,
                    gender: detection.gender,
                    gender_probability: detection.gender_probability,
                })
            })
            .collect();

        if !self.guard.allows() {
            return Ok(TickOutcome::Discarded);
        }

        let count = items.len();
        self.store
            .replace(AnnotationKey::Face, items, frame.timestamp_ms);
        self.metrics
            .annotations_published
            .fetch_add(count as u64, Ordering::Relaxed);

        Ok(TickOutcome::Published(count))
    }
}
