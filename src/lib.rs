// src/lib.rs
//
// Live annotation core: two independently-cadenced inference pipelines
// (face age/gender, clothing labels) over a shared frame source, gated
// by composite readiness, publishing atomic snapshots for rendering.
//
// Signal flow:
//   ReadinessGate ──────────────► Scheduler
//   FrameSource ──► FaceAnnotationPipeline ────► AnnotationStore[face]
//               └─► ClothingAnnotationPipeline ► AnnotationStore[clothing]

pub mod config;
pub mod detectors;
pub mod error;
pub mod frame_source;
pub mod labels;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod placement;
pub mod preprocessing;
pub mod readiness;
pub mod types;

// Re-exports for ergonomic access from the binary and integration tests.
pub use config::Config;
pub use error::{DetectionError, TickOutcome};
pub use frame_source::{FrameSource, TestPatternSource};
pub use labels::LabelCatalog;
pub use loader::{init_backend, load_models, LoadedModels};
pub use models::{ClothingClassifierModel, FaceDetectionModel, InputTensor, RawFaceDetection};
pub use pipeline::{
    AnnotationPipeline, AnnotationStore, ClothingAnnotationPipeline, FaceAnnotationPipeline,
    PipelineMetrics, PublishGuard, Scheduler,
};
pub use placement::{FixedCornerPlacement, PlacementPolicy, RandomPlacement};
pub use readiness::{ReadinessGate, Subsystem, SubsystemState};
pub use types::{
    Annotation, AnnotationKey, AnnotationSnapshot, ClothingAnnotation, FaceAnnotation, Frame,
    FrameDescriptor, Gender, NormalizedBox, PixelRect,
};
