// src/frame_source.rs
//
// Seam to the video device. The camera itself is an external collaborator;
// the pipelines only ever see this trait.

use crate::types::{Frame, FrameDescriptor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub trait FrameSource: Send + Sync {
    /// Current dimensions and availability. Read fresh every tick.
    fn descriptor(&self) -> FrameDescriptor;

    /// Pixel snapshot of the current frame, or None when no frame is up yet.
    fn frame(&self) -> Option<Frame>;
}

/// Procedurally generated moving gradient. Stands in for a webcam so the
/// demo binary can run the full pipeline without a capture device.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    started_at: Instant,
    ready: AtomicBool,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            started_at: Instant::now(),
            ready: AtomicBool::new(true),
        }
    }

    /// Simulate the stream dropping (descriptor reports no frame).
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

impl FrameSource for TestPatternSource {
    fn descriptor(&self) -> FrameDescriptor {
        FrameDescriptor {
            width: self.width,
            height: self.height,
            has_frame: self.ready.load(Ordering::Acquire),
        }
    }

    fn frame(&self) -> Option<Frame> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }

        let elapsed_ms = self.started_at.elapsed().as_secs_f64() * 1000.0;
        let phase = (elapsed_ms / 10.0) as u32;

        let mut data = vec![0u8; (self.width * self.height * 3) as usize];
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = ((y * self.width + x) * 3) as usize;
                data[idx] = ((x + phase) % 256) as u8;
                data[idx + 1] = ((y + phase) % 256) as u8;
                data[idx + 2] = ((x + y) % 256) as u8;
            }
        }

        Some(Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp_ms: elapsed_ms,
        })
    }
}
