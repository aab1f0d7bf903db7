// src/placement.rs
//
// The clothing classifier yields class probabilities only, no
// localization. Box placement is a pluggable policy standing in for a
// capability the model does not provide.

use crate::config::{Corner, PlacementConfig, PlacementKind};
use crate::types::NormalizedBox;
use rand::Rng;

pub trait PlacementPolicy: Send + Sync {
    /// Produce a normalized box for one classified label on a frame of the
    /// given pixel dimensions. Every component must land in [0, 1].
    fn place(&self, frame_width: u32, frame_height: u32) -> NormalizedBox;
}

/// Deterministic default: a fixed pixel-sized box anchored at a configured
/// corner with a pixel margin, normalized against the live frame.
pub struct FixedCornerPlacement {
    corner: Corner,
    box_size_px: f32,
    margin_px: f32,
}

impl FixedCornerPlacement {
    pub fn new(corner: Corner, box_size_px: f32, margin_px: f32) -> Self {
        Self {
            corner,
            box_size_px,
            margin_px,
        }
    }
}

impl PlacementPolicy for FixedCornerPlacement {
    fn place(&self, frame_width: u32, frame_height: u32) -> NormalizedBox {
        let fw = frame_width as f32;
        let fh = frame_height as f32;

        let w = (self.box_size_px / fw).min(1.0);
        let h = (self.box_size_px / fh).min(1.0);

        let near = |dim: f32| (self.margin_px / dim).clamp(0.0, 1.0);
        let far = |dim: f32, extent: f32| {
            ((dim - self.box_size_px - self.margin_px) / dim).clamp(0.0, 1.0 - extent)
        };

        let (x, y) = match self.corner {
            Corner::TopLeft => (near(fw), near(fh)),
            Corner::TopRight => (far(fw, w), near(fh)),
            Corner::BottomLeft => (near(fw), far(fh, h)),
            Corner::BottomRight => (far(fw, w), far(fh, h)),
        };

        NormalizedBox { x, y, w, h }
    }
}

/// Non-deterministic fallback: uniform position with the box kept fully
/// inside the frame. Avoid in production configurations.
pub struct RandomPlacement {
    box_size_px: f32,
}

impl RandomPlacement {
    pub fn new(box_size_px: f32) -> Self {
        Self { box_size_px }
    }
}

impl PlacementPolicy for RandomPlacement {
    fn place(&self, frame_width: u32, frame_height: u32) -> NormalizedBox {
        let fw = frame_width as f32;
        let fh = frame_height as f32;

        let w = (self.box_size_px / fw).min(1.0);
        let h = (self.box_size_px / fh).min(1.0);

        let mut rng = rand::rng();
        let max_x = (fw - self.box_size_px).max(0.0);
        let max_y = (fh - self.box_size_px).max(0.0);

        NormalizedBox {
            x: rng.random_range(0.0..=max_x) / fw,
            y: rng.random_range(0.0..=max_y) / fh,
            w,
            h,
        }
    }
}

/// Build the configured policy.
pub fn from_config(config: &PlacementConfig) -> Box<dyn PlacementPolicy> {
    match config.policy {
        PlacementKind::FixedCorner => Box::new(FixedCornerPlacement::new(
            config.corner,
            config.box_size_px,
            config.margin_px,
        )),
        PlacementKind::Random => Box::new(RandomPlacement::new(config.box_size_px)),
    }
}
