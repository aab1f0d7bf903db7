// src/loader.rs
//
// Startup loading. Builds both ORT sessions and the label catalog,
// driving the gate's subsystems through Loading → Ready or Failed.
// A load failure is surfaced once and never retried.

use crate::config::ModelsConfig;
use crate::detectors::{OnnxClothingClassifier, OnnxFaceDetector};
use crate::labels::LabelCatalog;
use crate::models::{ClothingClassifierModel, FaceDetectionModel};
use crate::readiness::{ReadinessGate, Subsystem};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub struct LoadedModels {
    pub face: Box<dyn FaceDetectionModel>,
    pub clothing: Box<dyn ClothingClassifierModel>,
    pub labels: LabelCatalog,
}

/// Initialize the shared inference backend. Independent of model loading:
/// the runtime can be up while weights are still on their way.
pub fn init_backend(gate: &ReadinessGate) -> Result<()> {
    match ort::init().with_name("face-attire-detection").commit() {
        Ok(_) => {
            gate.mark_ready(Subsystem::Backend);
            info!("✓ ONNX Runtime backend ready");
            Ok(())
        }
        Err(err) => {
            let err = anyhow::Error::from(err).context("failed to initialize ONNX Runtime");
            gate.mark_failed(Subsystem::Backend, &err);
            Err(err)
        }
    }
}

/// Load both models and the label metadata.
pub fn load_models(config: &ModelsConfig, gate: &ReadinessGate) -> Result<LoadedModels> {
    gate.begin_loading(Subsystem::Models);

    match try_load(config) {
        Ok(models) => {
            gate.mark_ready(Subsystem::Models);
            info!("✓ All models loaded");
            Ok(models)
        }
        Err(err) => {
            gate.mark_failed(Subsystem::Models, &err);
            Err(err)
        }
    }
}

fn try_load(config: &ModelsConfig) -> Result<LoadedModels> {
    let face = OnnxFaceDetector::new(
        &config.face_model_path,
        config.face_input_size,
        config.face_confidence_threshold,
        config.num_threads,
    )
    .context("face detection model")?;

    let clothing = OnnxClothingClassifier::new(&config.clothing_model_path, config.num_threads)
        .context("clothing classifier model")?;

    let labels = LabelCatalog::load(Path::new(&config.label_metadata_path))
        .context("clothing label metadata")?;

    Ok(LoadedModels {
        face: Box::new(face),
        clothing: Box::new(clothing),
        labels,
    })
}
