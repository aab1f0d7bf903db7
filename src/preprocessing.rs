// src/preprocessing.rs

use crate::models::InputTensor;
use crate::types::Frame;

/// Build the classifier input: resize to a square working resolution,
/// scale intensities to [0, 1], keep HWC order with a leading batch
/// dimension. Caller must have checked the frame is non-degenerate.
pub fn build_input_tensor(frame: &Frame, size: u32) -> InputTensor {
    let resized = resize_bilinear(
        &frame.data,
        frame.width as usize,
        frame.height as usize,
        size as usize,
        size as usize,
    );

    let data: Vec<f32> = resized.iter().map(|&v| v as f32 / 255.0).collect();
    InputTensor::new(data, size)
}

/// Preprocess a frame for the face detector: resize to the working
/// resolution, scale to [0, 1], convert HWC -> CHW.
pub fn build_chw_input(frame: &Frame, width: u32, height: u32) -> Vec<f32> {
    let dst_w = width as usize;
    let dst_h = height as usize;
    let resized = resize_bilinear(
        &frame.data,
        frame.width as usize,
        frame.height as usize,
        dst_w,
        dst_h,
    );

    let mut output = vec![0.0f32; 3 * dst_h * dst_w];
    for c in 0..3 {
        for h in 0..dst_h {
            for w in 0..dst_w {
                let hwc_idx = (h * dst_w + w) * 3 + c;
                let chw_idx = c * dst_h * dst_w + h * dst_w + w;
                output[chw_idx] = resized[hwc_idx] as f32 / 255.0;
            }
        }
    }
    output
}

/// Bilinear image resize
fn resize_bilinear(src: &[u8], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<u8> {
    let mut dst = vec![0u8; dst_h * dst_w * 3];

    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx as f32 * x_ratio;
            let sy = dy as f32 * y_ratio;

            let sx0 = sx.floor() as usize;
            let sy0 = sy.floor() as usize;
            let sx1 = (sx0 + 1).min(src_w - 1);
            let sy1 = (sy0 + 1).min(src_h - 1);

            let fx = sx - sx0 as f32;
            let fy = sy - sy0 as f32;

            for c in 0..3 {
                let p00 = src[(sy0 * src_w + sx0) * 3 + c] as f32;
                let p10 = src[(sy0 * src_w + sx1) * 3 + c] as f32;
                let p01 = src[(sy1 * src_w + sx0) * 3 + c] as f32;
                let p11 = src[(sy1 * src_w + sx1) * 3 + c] as f32;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                dst[(dy * dst_w + dx) * 3 + c] = val.round() as u8;
            }
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame {
            data: vec![value; (width * height * 3) as usize],
            width,
            height,
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_input_tensor_shape_and_scaling() {
        let frame = solid_frame(640, 480, 255);
        let tensor = build_input_tensor(&frame, 224);
        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        assert_eq!(tensor.data().len(), 224 * 224 * 3);
        assert!(tensor.data().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_intensities_land_in_unit_interval() {
        let frame = solid_frame(100, 100, 128);
        let tensor = build_input_tensor(&frame, 32);
        assert!(tensor
            .data()
            .iter()
            .all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_chw_input_size() {
        let frame = solid_frame(640, 480, 64);
        let input = build_chw_input(&frame, 416, 416);
        assert_eq!(input.len(), 3 * 416 * 416);
    }

    #[test]
    fn test_resize() {
        let src = vec![255u8; 100 * 100 * 3];
        let dst = resize_bilinear(&src, 100, 100, 50, 50);
        assert_eq!(dst.len(), 50 * 50 * 3);
        assert!(dst.iter().all(|&v| v == 255));
    }
}
