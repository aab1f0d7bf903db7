// src/detectors/mod.rs

pub mod clothing;
pub mod face;

pub use clothing::OnnxClothingClassifier;
pub use face::OnnxFaceDetector;
