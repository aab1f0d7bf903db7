// src/main.rs

use anyhow::Result;
use face_attire_detection::{
    init_backend, load_models, AnnotationStore, ClothingAnnotationPipeline, Config,
    FaceAnnotationPipeline, FrameSource, PipelineMetrics, PublishGuard, ReadinessGate, Scheduler,
    Subsystem, TestPatternSource,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "face_attire_detection={},ort=warn",
            config.logging.level
        ))
        .init();

    info!("🎥 Face & Attire Annotation System Starting");
    info!("✓ Configuration loaded");
    info!(
        "Cadences: face={}ms clothing={}ms, clothing threshold={:.2}",
        config.schedule.cadence_face_ms,
        config.schedule.cadence_clothing_ms,
        config.clothing.threshold
    );

    let gate = Arc::new(ReadinessGate::new());
    let store = Arc::new(AnnotationStore::new());
    let metrics = PipelineMetrics::new();

    init_backend(&gate)?;

    let models = match load_models(&config.models, &gate) {
        Ok(models) => models,
        Err(err) => {
            error!("Cannot start without models: {:#}", err);
            return Err(err);
        }
    };

    // The camera is an external collaborator; the demo drives the full
    // pipeline from a generated test pattern instead.
    let source = Arc::new(TestPatternSource::new(
        config.video.width,
        config.video.height,
    ));
    gate.mark_ready(Subsystem::Video);
    info!(
        "✓ Frame source ready ({}x{})",
        config.video.width, config.video.height
    );

    // Stand-in for the renderer: log every published snapshot.
    store.subscribe(|key, snapshot| {
        info!(
            "{:?} snapshot: {} annotations @ {:.0}ms",
            key,
            snapshot.items.len(),
            snapshot.timestamp_ms
        );
    });

    let guard = PublishGuard::new(&gate);
    let face_pipeline = Arc::new(FaceAnnotationPipeline::new(
        models.face,
        Arc::clone(&source) as Arc<dyn FrameSource>,
        Arc::clone(&store),
        guard.clone(),
        metrics.face.clone(),
    ));
    let clothing_pipeline = Arc::new(ClothingAnnotationPipeline::new(
        models.clothing,
        models.labels,
        &config.clothing,
        Arc::clone(&source) as Arc<dyn FrameSource>,
        Arc::clone(&store),
        guard.clone(),
        metrics.clothing.clone(),
    ));

    let scheduler = Scheduler::start(
        face_pipeline,
        clothing_pipeline,
        &gate,
        config.schedule.cadence_face_ms,
        config.schedule.cadence_clothing_ms,
        &metrics,
        guard,
    );

    info!("Annotation pipeline running, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    scheduler.shutdown().await;

    let summary = metrics.summary();
    info!(
        "Face: {} ticks, {} busy-skips, {} failures, {} annotations",
        summary.face.ticks_run,
        summary.face.ticks_skipped_busy,
        summary.face.inference_failures,
        summary.face.annotations_published
    );
    info!(
        "Clothing: {} ticks, {} busy-skips, {} failures, {} annotations",
        summary.clothing.ticks_run,
        summary.clothing.ticks_skipped_busy,
        summary.clothing.inference_failures,
        summary.clothing.annotations_published
    );
    info!("Elapsed: {:.1}s", summary.elapsed_secs);

    Ok(())
}
