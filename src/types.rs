// src/types.rs

use serde::Serialize;

/// Current state of the frame source, read fresh on every tick.
/// Never cached across ticks; the source mutates underneath us.
#[derive(Debug, Clone, Copy)]
pub struct FrameDescriptor {
    pub width: u32,
    pub height: u32,
    pub has_frame: bool,
}

impl FrameDescriptor {
    /// A frame is usable only when present and non-degenerate.
    pub fn is_ready(&self) -> bool {
        self.has_frame && self.width > 0 && self.height > 0
    }
}

/// Raw RGB pixel snapshot (HWC, 3 bytes per pixel).
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: f64,
}

/// Bounding box with every component in [0, 1], relative to frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl NormalizedBox {
    /// Convert to pixel coordinates. This is the only way pixel rects are
    /// produced from normalized ones, never computed independently.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        PixelRect {
            x: self.x * frame_width as f32,
            y: self.y * frame_height as f32,
            w: self.w * frame_width as f32,
            h: self.h * frame_height as f32,
        }
    }

    pub fn is_normalized(&self) -> bool {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        in_unit(self.x) && in_unit(self.y) && in_unit(self.w) && in_unit(self.h)
    }
}

/// Axis-aligned rectangle in display pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    Male,
    Female,
}

/// One detected face with its demographic outputs, in display coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct FaceAnnotation {
    pub rect: PixelRect,
    pub landmarks: Vec<(f32, f32)>,
    pub age: f32,
    pub gender: Gender,
    pub gender_probability: f32,
}

/// One clothing label that cleared the probability threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ClothingAnnotation {
    pub label: String,
    pub probability: f32,
    pub rect: PixelRect,
}

#[derive(Debug, Clone, Serialize)]
pub enum Annotation {
    Face(FaceAnnotation),
    Clothing(ClothingAnnotation),
}

/// Which pipeline a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnnotationKey {
    Face,
    Clothing,
}

/// A complete published result set. Always replaced whole; readers never
/// observe a partially built list.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationSnapshot {
    pub items: Vec<Annotation>,
    pub timestamp_ms: f64,
}

impl AnnotationSnapshot {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            timestamp_ms: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_readiness() {
        let ready = FrameDescriptor {
            width: 640,
            height: 480,
            has_frame: true,
        };
        assert!(ready.is_ready());

        let no_frame = FrameDescriptor {
            has_frame: false,
            ..ready
        };
        assert!(!no_frame.is_ready());

        let zero_width = FrameDescriptor { width: 0, ..ready };
        assert!(!zero_width.is_ready());
    }

    #[test]
    fn test_pixel_rect_is_exact_scaling() {
        let nbox = NormalizedBox {
            x: 10.0 / 640.0,
            y: 370.0 / 480.0,
            w: 100.0 / 640.0,
            h: 100.0 / 480.0,
        };
        assert!(nbox.is_normalized());

        let rect = nbox.to_pixels(640, 480);
        assert!((rect.x - 10.0).abs() < 1e-3);
        assert!((rect.y - 370.0).abs() < 1e-3);
        assert!((rect.w - 100.0).abs() < 1e-3);
        assert!((rect.h - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_unit_box_is_rejected() {
        let nbox = NormalizedBox {
            x: -0.1,
            y: 0.5,
            w: 0.2,
            h: 0.2,
        };
        assert!(!nbox.is_normalized());
    }
}
