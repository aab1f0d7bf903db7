// src/pipeline/clothing.rs
//
// Per tick: build the transient normalized buffer, classify, threshold,
// place boxes, publish. The buffer is released on every exit path.

use crate::config::ClothingConfig;
use crate::error::{DetectionError, TickOutcome};
use crate::frame_source::FrameSource;
use crate::labels::LabelCatalog;
use crate::models::ClothingClassifierModel;
use crate::pipeline::scheduler::PublishGuard;
use crate::pipeline::store::AnnotationStore;
use crate::pipeline::{AnnotationPipeline, TaskMetrics};
use crate::placement::{self, PlacementPolicy};
use crate::preprocessing::build_input_tensor;
use crate::types::{Annotation, AnnotationKey, ClothingAnnotation};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[cfg(test)]
use std::sync::atomic::AtomicUsize;

pub struct ClothingAnnotationPipeline {
    model: Box<dyn ClothingClassifierModel>,
    catalog: LabelCatalog,
    placement: Box<dyn PlacementPolicy>,
    threshold: f32,
    working_resolution: u32,
    source: Arc<dyn FrameSource>,
    store: Arc<AnnotationStore>,
    guard: PublishGuard,
    metrics: TaskMetrics,
    /// Set on ConfigMismatch. Permanent: a catalog that disagrees with
    /// the classifier can never produce trustworthy labels.
    disabled: AtomicBool,
    #[cfg(test)]
    release_probe: Option<Arc<AtomicUsize>>,
}

impl ClothingAnnotationPipeline {
    pub fn new(
        model: Box<dyn ClothingClassifierModel>,
        catalog: LabelCatalog,
        config: &ClothingConfig,
        source: Arc<dyn FrameSource>,
        store: Arc<AnnotationStore>,
        guard: PublishGuard,
        metrics: TaskMetrics,
    ) -> Self {
        Self {
            model,
            catalog,
            placement: placement::from_config(&config.placement),
            threshold: config.threshold,
            working_resolution: config.working_resolution,
            source,
            store,
            guard,
            metrics,
            disabled: AtomicBool::new(false),
            #[cfg(test)]
            release_probe: None,
        }
    }

    #[cfg(test)]
    fn set_release_probe(&mut self, probe: Arc<AtomicUsize>) {
        self.release_probe = Some(probe);
    }
}

#[async_trait]
impl AnnotationPipeline for ClothingAnnotationPipeline {
    fn name(&self) -> &'static str {
        "clothing"
    }

    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    async fn tick(&self) -> Result<TickOutcome, DetectionError> {
        if self.is_disabled() {
            return Ok(TickOutcome::Disabled);
        }

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

        #[allow(unused_mut)]
        let mut tensor = build_input_tensor(&frame, self.working_resolution);
        #[cfg(test)]
        if let Some(probe) = &self.release_probe {
            tensor = tensor.with_release_probe(Arc::clone(probe));
        }

        let started = Instant::now();
        let result = self.model.classify(&tensor).await;

        // The tick exclusively owns the buffer; release it before any
        // publication or error propagation.
        drop(tensor);

        let probabilities = result.map_err(DetectionError::InferenceFailure)?;
        self.metrics
            .inference_time_us
            .store(started.elapsed().as_micros() as u64, Ordering::Relaxed);

        if probabilities.len() != self.catalog.len() {
            self.disabled.store(true, Ordering::Release);
            return Err(DetectionError::ConfigMismatch {
                labels: self.catalog.len(),
                outputs: probabilities.len(),
            });
        }

        // Strict inequality: a probability exactly at the threshold is
        // excluded. Output ordered by ascending label index.
        let mut items = Vec::new();
        for (index, &probability) in probabilities.iter().enumerate() {
            if probability <= self.threshold {
                continue;
            }
            let Some(label) = self.catalog.get(index) else {
                continue;
            };

            let nbox = self.placement.place(frame.width, frame.height);
            let rect = nbox.to_pixels(frame.width, frame.height);
            items.push(Annotation::Clothing(ClothingAnnotation {
                label: label.to_string(),
                probability: probability.clamp(0.0, 1.0),
                rect,
            }));
        }

        if !self.guard.allows() {
            return Ok(TickOutcome::Discarded);
        }

        let count = items.len();
        self.store
            .replace(AnnotationKey::Clothing, items, frame.timestamp_ms);
        self.metrics
            .annotations_published
            .fetch_add(count as u64, Ordering::Relaxed);

        Ok(TickOutcome::Published(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Corner, PlacementConfig, PlacementKind};
    use crate::models::InputTensor;
    use crate::readiness::{ReadinessGate, Subsystem};
    use crate::types::{Frame, FrameDescriptor};
    use anyhow::{anyhow, Result};

    struct FixedFrameSource {
        width: u32,
        height: u32,
    }

    impl FrameSource for FixedFrameSource {
        fn descriptor(&self) -> FrameDescriptor {
            FrameDescriptor {
                width: self.width,
                height: self.height,
                has_frame: true,
            }
        }

        fn frame(&self) -> Option<Frame> {
            Some(Frame {
                data: vec![128; (self.width * self.height * 3) as usize],
                width: self.width,
                height: self.height,
                timestamp_ms: 500.0,
            })
        }
    }

    struct StubClassifier {
        probabilities: Vec<f32>,
        fail: bool,
    }

    #[async_trait]
    impl ClothingClassifierModel for StubClassifier {
        async fn classify(&self, _input: &InputTensor) -> Result<Vec<f32>> {
            if self.fail {
                return Err(anyhow!("classifier exploded"));
            }
            Ok(self.probabilities.clone())
        }
    }

    fn active_guard() -> PublishGuard {
        let gate = ReadinessGate::new();
        gate.mark_ready(Subsystem::Models);
        gate.mark_ready(Subsystem::Video);
        gate.mark_ready(Subsystem::Backend);
        PublishGuard::new(&gate)
    }

    fn test_config(threshold: f32) -> ClothingConfig {
        ClothingConfig {
            threshold,
            working_resolution: 32,
            placement: PlacementConfig {
                policy: PlacementKind::FixedCorner,
                corner: Corner::BottomLeft,
                box_size_px: 100.0,
                margin_px: 10.0,
            },
        }
    }

    fn pipeline_with(
        classifier: StubClassifier,
        labels: Vec<&str>,
        threshold: f32,
        store: Arc<AnnotationStore>,
    ) -> ClothingAnnotationPipeline {
        ClothingAnnotationPipeline::new(
            Box::new(classifier),
            LabelCatalog::from_labels(labels.into_iter().map(String::from).collect()),
            &test_config(threshold),
            Arc::new(FixedFrameSource {
                width: 640,
                height: 480,
            }),
            store,
            active_guard(),
            TaskMetrics::new(),
        )
    }

    fn clothing_of(snapshot: &crate::types::AnnotationSnapshot) -> Vec<&ClothingAnnotation> {
        snapshot
            .items
            .iter()
            .map(|item| match item {
                Annotation::Clothing(c) => c,
                Annotation::Face(_) => panic!("unexpected face annotation"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_threshold_is_strictly_exclusive() {
        let store = Arc::new(AnnotationStore::new());
        // 0.4 exactly at the threshold must be excluded.
        let pipeline = pipeline_with(
            StubClassifier {
                probabilities: vec![0.4, 0.75, 0.400001],
                fail: false,
            },
            vec!["shirt", "pants", "hat"],
            0.4,
            Arc::clone(&store),
        );

        let outcome = pipeline.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Published(2));

        let snapshot = store.latest(AnnotationKey::Clothing);
        let items = clothing_of(&snapshot);
        assert_eq!(items.len(), 2);
        // Ascending label-index order.
        assert_eq!(items[0].label, "pants");
        assert_eq!(items[1].label, "hat");
    }

    #[tokio::test]
    async fn test_reference_geometry_for_shirt() {
        let store = Arc::new(AnnotationStore::new());
        let pipeline = pipeline_with(
            StubClassifier {
                probabilities: vec![0.75],
                fail: false,
            },
            vec!["shirt"],
            0.4,
            Arc::clone(&store),
        );

        pipeline.tick().await.unwrap();

        let snapshot = store.latest(AnnotationKey::Clothing);
        let items = clothing_of(&snapshot);
        assert_eq!(items[0].label, "shirt");
        assert!((items[0].probability - 0.75).abs() < 1e-6);
        // Bottom-left, 100px box, 10px margin on 640x480: y = 480 - 110.
        assert!((items[0].rect.x - 10.0).abs() < 1e-3);
        assert!((items[0].rect.y - 370.0).abs() < 1e-3);
        assert!((items[0].rect.w - 100.0).abs() < 1e-3);
        assert!((items[0].rect.h - 100.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_length_mismatch_disables_pipeline() {
        let store = Arc::new(AnnotationStore::new());
        let pipeline = pipeline_with(
            StubClassifier {
                probabilities: vec![0.9, 0.9],
                fail: false,
            },
            vec!["shirt", "pants", "hat"],
            0.4,
            Arc::clone(&store),
        );

        let result = pipeline.tick().await;
        assert!(matches!(
            result,
            Err(DetectionError::ConfigMismatch {
                labels: 3,
                outputs: 2
            })
        ));
        assert!(pipeline.is_disabled());

        // Permanently disabled: subsequent ticks never reach the model.
        let outcome = pipeline.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Disabled);
        assert!(store.latest(AnnotationKey::Clothing).items.is_empty());
    }

    #[tokio::test]
    async fn test_buffer_released_once_on_success_and_on_failure() {
        let probe = Arc::new(AtomicUsize::new(0));

        let mut ok_pipeline = pipeline_with(
            StubClassifier {
                probabilities: vec![0.9],
                fail: false,
            },
            vec!["shirt"],
            0.4,
            Arc::new(AnnotationStore::new()),
        );
        ok_pipeline.set_release_probe(Arc::clone(&probe));
        ok_pipeline.tick().await.unwrap();
        assert_eq!(probe.load(Ordering::Relaxed), 1);

        let mut failing_pipeline = pipeline_with(
            StubClassifier {
                probabilities: Vec::new(),
                fail: true,
            },
            vec!["shirt"],
            0.4,
            Arc::new(AnnotationStore::new()),
        );
        failing_pipeline.set_release_probe(Arc::clone(&probe));
        let result = failing_pipeline.tick().await;
        assert!(result.is_err());
        assert_eq!(probe.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_snapshot() {
        let store = Arc::new(AnnotationStore::new());
        let pipeline = pipeline_with(
            StubClassifier {
                probabilities: vec![0.9],
                fail: false,
            },
            vec!["shirt"],
            0.4,
            Arc::clone(&store),
        );
        pipeline.tick().await.unwrap();
        assert_eq!(store.latest(AnnotationKey::Clothing).items.len(), 1);

        let failing = pipeline_with(
            StubClassifier {
                probabilities: Vec::new(),
                fail: true,
            },
            vec!["shirt"],
            0.4,
            Arc::clone(&store),
        );
        assert!(failing.tick().await.is_err());
        assert_eq!(store.latest(AnnotationKey::Clothing).items.len(), 1);
    }
}
