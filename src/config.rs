// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub clothing: ClothingConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub face_model_path: String,
    pub clothing_model_path: String,
    pub label_metadata_path: String,
    #[serde(default = "default_face_input_size")]
    pub face_input_size: u32,
    #[serde(default = "default_face_confidence")]
    pub face_confidence_threshold: f32,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub cadence_face_ms: u64,
    pub cadence_clothing_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cadence_face_ms: 100,
            cadence_clothing_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothingConfig {
    pub threshold: f32,
    pub working_resolution: u32,
    #[serde(default)]
    pub placement: PlacementConfig,
}

impl Default for ClothingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            working_resolution: 224,
            placement: PlacementConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    pub policy: PlacementKind,
    #[serde(default = "default_corner")]
    pub corner: Corner,
    #[serde(default = "default_box_size")]
    pub box_size_px: f32,
    #[serde(default = "default_margin")]
    pub margin_px: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            policy: PlacementKind::FixedCorner,
            corner: Corner::BottomLeft,
            box_size_px: default_box_size(),
            margin_px: default_margin(),
        }
    }
}

/// The classifier supplies no localization, so box placement is a policy
/// choice. `random` is a non-deterministic fallback; avoid it in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementKind {
    FixedCorner,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Out-of-range values fail here, at load time, never on a tick.
    pub fn validate(&self) -> Result<()> {
        if self.schedule.cadence_face_ms == 0 {
            bail!("cadence_face_ms must be > 0");
        }
        if self.schedule.cadence_clothing_ms == 0 {
            bail!("cadence_clothing_ms must be > 0");
        }
        if !(self.clothing.threshold > 0.0 && self.clothing.threshold < 1.0) {
            bail!(
                "clothing threshold must be inside (0, 1), got {}",
                self.clothing.threshold
            );
        }
        if self.clothing.working_resolution == 0 {
            bail!("working_resolution must be > 0");
        }
        if self.models.face_input_size == 0 {
            bail!("face_input_size must be > 0");
        }
        if self.video.width == 0 || self.video.height == 0 {
            bail!("video dimensions must be > 0");
        }
        Ok(())
    }
}

fn default_face_input_size() -> u32 {
    416
}

fn default_face_confidence() -> f32 {
    0.5
}

fn default_num_threads() -> usize {
    4
}

fn default_corner() -> Corner {
    Corner::BottomLeft
}

fn default_box_size() -> f32 {
    100.0
}

fn default_margin() -> f32 {
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            models: ModelsConfig {
                face_model_path: "models/face.onnx".into(),
                clothing_model_path: "models/clothing.onnx".into(),
                label_metadata_path: "models/metadata.json".into(),
                face_input_size: 416,
                face_confidence_threshold: 0.5,
                num_threads: 4,
            },
            schedule: ScheduleConfig::default(),
            clothing: ClothingConfig::default(),
            video: VideoConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let mut config = base_config();
        config.schedule.cadence_face_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_bounds_are_exclusive() {
        let mut config = base_config();
        config.clothing.threshold = 1.0;
        assert!(config.validate().is_err());

        config.clothing.threshold = 0.0;
        assert!(config.validate().is_err());

        config.clothing.threshold = 0.4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
models:
  face_model_path: "m/face.onnx"
  clothing_model_path: "m/clothing.onnx"
  label_metadata_path: "m/metadata.json"
clothing:
  threshold: 0.4
  working_resolution: 224
  placement:
    policy: random
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.schedule.cadence_face_ms, 100);
        assert_eq!(config.clothing.placement.policy, PlacementKind::Random);
        assert_eq!(config.clothing.placement.corner, Corner::BottomLeft);
        assert!(config.validate().is_ok());
    }
}
