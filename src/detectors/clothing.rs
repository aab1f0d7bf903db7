// src/detectors/clothing.rs

use crate::models::{ClothingClassifierModel, InputTensor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Clothing classifier run through ONNX Runtime. Takes the normalized
/// NHWC buffer and returns a probability per catalog label.
pub struct OnnxClothingClassifier {
    session: Arc<Mutex<Session>>,
}

impl OnnxClothingClassifier {
    pub fn new(model_path: &str, num_threads: usize) -> Result<Self> {
        info!("Loading clothing classifier: {}", model_path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_threads)?
            .commit_from_file(model_path)
            .context("failed to load clothing classifier")?;

        info!("✓ Clothing classifier initialized");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
        })
    }
}

#[async_trait]
impl ClothingClassifierModel for OnnxClothingClassifier {
    async fn classify(&self, input: &InputTensor) -> Result<Vec<f32>> {
        let shape = input.shape();
        let data = input.data().to_vec();
        let session = Arc::clone(&self.session);

        let probabilities = tokio::task::spawn_blocking(move || -> Result<Vec<f32>> {
            let mut session = session.lock().expect("clothing session lock poisoned");

            let input_value = Value::from_array((shape.as_slice(), data.into_boxed_slice()))?;

            let outputs = session.run(ort::inputs!["input" => input_value])?;
            let (_, data) = outputs[0].try_extract_tensor::<f32>()?;
            Ok(data.to_vec())
        })
        .await
        .context("clothing inference task panicked")??;

        debug!("Classifier emitted {} probabilities", probabilities.len());
        Ok(probabilities)
    }
}
