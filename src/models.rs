// src/models.rs
//
// Capability seams to the two inference models. Each pipeline owns its
// model handle exclusively, injected at construction.

use crate::types::{Frame, Gender};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One face as reported by the detector, in the model's working resolution.
#[derive(Debug, Clone)]
pub struct RawFaceDetection {
    /// [x, y, w, h] in working-resolution coordinates.
    pub bbox: [f32; 4],
    pub landmarks: Vec<(f32, f32)>,
    pub confidence: f32,
    pub age: f32,
    pub gender: Gender,
    pub gender_probability: f32,
}

#[async_trait]
pub trait FaceDetectionModel: Send + Sync {
    /// Fixed input size the detector operates at, distinct from the frame's
    /// display resolution.
    fn working_resolution(&self) -> (u32, u32);

    async fn detect(&self, frame: &Frame) -> Result<Vec<RawFaceDetection>>;
}

#[async_trait]
pub trait ClothingClassifierModel: Send + Sync {
    /// Probability vector aligned index-for-index with the label catalog.
    async fn classify(&self, input: &InputTensor) -> Result<Vec<f32>>;
}

/// Transient normalized image buffer handed to the classifier: one frame
/// resized to a square working resolution, intensities scaled to [0, 1],
/// leading batch dimension (NHWC `[1, size, size, 3]`).
///
/// Exclusively owned by the tick that created it and released when it goes
/// out of scope, on every exit path. The release probe makes that
/// observable from tests.
pub struct InputTensor {
    data: Vec<f32>,
    size: u32,
    release_probe: Option<Arc<AtomicUsize>>,
}

impl InputTensor {
    pub fn new(data: Vec<f32>, size: u32) -> Self {
        debug_assert_eq!(data.len(), (size * size * 3) as usize);
        Self {
            data,
            size,
            release_probe: None,
        }
    }

    /// Count releases into `probe`. Diagnostic hook; the counter is bumped
    /// exactly once, when the tensor is dropped.
    pub fn with_release_probe(mut self, probe: Arc<AtomicUsize>) -> Self {
        self.release_probe = Some(probe);
        self
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.size as usize, self.size as usize, 3]
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl Drop for InputTensor {
    fn drop(&mut self) {
        if let Some(probe) = &self.release_probe {
            probe.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_probe_fires_once() {
        let probe = Arc::new(AtomicUsize::new(0));
        let tensor =
            InputTensor::new(vec![0.0; 4 * 4 * 3], 4).with_release_probe(Arc::clone(&probe));
        assert_eq!(tensor.shape(), [1, 4, 4, 3]);
        assert_eq!(probe.load(Ordering::Relaxed), 0);

        drop(tensor);
        assert_eq!(probe.load(Ordering::Relaxed), 1);
    }
}
