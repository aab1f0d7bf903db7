// src/detectors/face.rs

use crate::models::{FaceDetectionModel, RawFaceDetection};
use crate::preprocessing::build_chw_input;
use crate::types::{Frame, Gender};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// Detector output rows: [x, y, w, h, score, 5 landmark pairs, age, gender]
const LANDMARK_COUNT: usize = 5;
const ROW_STRIDE: usize = 4 + 1 + LANDMARK_COUNT * 2 + 2;

/// Face detector with age/gender head, run through ONNX Runtime.
/// Boxes and landmarks come back in the model's working resolution.
pub struct OnnxFaceDetector {
    session: Arc<Mutex<Session>>,
    input_size: u32,
    confidence_threshold: f32,
}

impl OnnxFaceDetector {
    pub fn new(
        model_path: &str,
        input_size: u32,
        confidence_threshold: f32,
        num_threads: usize,
    ) -> Result<Self> {
        info!("Loading face detection model: {}", model_path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_threads)?
            .commit_from_file(model_path)
            .context("failed to load face detection model")?;

        info!("✓ Face detector initialized ({}x{})", input_size, input_size);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_size,
            confidence_threshold,
        })
    }
}

#[async_trait]
impl FaceDetectionModel for OnnxFaceDetector {
    fn working_resolution(&self) -> (u32, u32) {
        (self.input_size, self.input_size)
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<RawFaceDetection>> {
        let input = build_chw_input(frame, self.input_size, self.input_size);
        let session = Arc::clone(&self.session);
        let size = self.input_size as usize;

        let output = tokio::task::spawn_blocking(move || -> Result<Vec<f32>> {
            let mut session = session.lock().expect("face session lock poisoned");

            let shape = [1, 3, size, size];
            let input_value =
                Value::from_array((shape.as_slice(), input.into_boxed_slice()))?;

            let outputs = session.run(ort::inputs!["input" => input_value])?;
            let (_, data) = outputs[0].try_extract_tensor::<f32>()?;
            Ok(data.to_vec())
        })
        .await
        .context("face inference task panicked")??;

        let detections = parse_detections(&output, self.confidence_threshold);
        debug!("Detected {} faces", detections.len());
        Ok(detections)
    }
}

/// Parse flat output rows, preserving the detector's ordering.
fn parse_detections(output: &[f32], confidence_threshold: f32) -> Vec<RawFaceDetection> {
    let mut detections = Vec::new();

    for row in output.chunks_exact(ROW_STRIDE) {
        let confidence = row[4];
        if confidence < confidence_threshold {
            continue;
        }

        let landmarks = (0..LANDMARK_COUNT)
            .map(|i| (row[5 + i * 2], row[5 + i * 2 + 1]))
            .collect();

        let age = row[ROW_STRIDE - 2].max(0.0);
        let gender_score = row[ROW_STRIDE - 1].clamp(0.0, 1.0);
        let (gender, gender_probability) = if gender_score >= 0.5 {
            (Gender::Female, gender_score)
        } else {
            (Gender::Male, 1.0 - gender_score)
        };

        detections.push(RawFaceDetection {
            bbox: [row[0], row[1], row[2], row[3]],
            landmarks,
            confidence,
            age,
            gender,
            gender_probability,
        });
    }

    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(confidence: f32, age: f32, gender_score: f32) -> Vec<f32> {
        let mut row = vec![10.0, 20.0, 50.0, 60.0, confidence];
        row.extend((0..LANDMARK_COUNT * 2).map(|i| i as f32));
        row.push(age);
        row.push(gender_score);
        row
    }

    #[test]
    fn test_parse_filters_by_confidence() {
        let mut output = row(0.9, 31.0, 0.8);
        output.extend(row(0.2, 25.0, 0.3));

        let detections = parse_detections(&output, 0.5);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox, [10.0, 20.0, 50.0, 60.0]);
        assert_eq!(detections[0].gender, Gender::Female);
        assert!((detections[0].gender_probability - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_parse_clamps_age_and_gender() {
        let output = row(0.9, -3.0, 1.4);
        let detections = parse_detections(&output, 0.5);
        assert_eq!(detections[0].age, 0.0);
        assert_eq!(detections[0].gender_probability, 1.0);
    }

    #[test]
    fn test_male_probability_is_complement() {
        let output = row(0.9, 40.0, 0.1);
        let detections = parse_detections(&output, 0.5);
        assert_eq!(detections[0].gender, Gender::Male);
        assert!((detections[0].gender_probability - 0.9).abs() < 1e-6);
    }
}
