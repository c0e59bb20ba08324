// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use ndarray::Array4;

use sage_core::error::SageError;
use sage_core::im::SageImage;

/// Side length the encoder expects after resize and padding
pub const SAM_INPUT_SIZE: u32 = 1024;

// Standard SAM pixel normalization constants
pub const PIXEL_MEAN: [f32; 3] = [123.675, 116.28, 103.53];
pub const PIXEL_STD: [f32; 3] = [58.395, 57.12, 57.375];

/// Dimensions after resizing the longest side to the encoder input size
///
/// Returns the resized width, height, and the scale factor applied to both
/// axes. Coordinates in original image space multiply by the same factor.
pub fn resize_longest_side(width: u32, height: u32) -> (u32, u32, f32) {
    let longest = width.max(height).max(1);
    let scale = SAM_INPUT_SIZE as f32 / longest as f32;

    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);

    (new_w, new_h, scale)
}

/// Convert an image into a normalized NCHW encoder input tensor.
///
/// The image is resized so its longest side matches the encoder input
/// size, normalized per channel, and padded with zeros on the bottom and
/// right to a square tensor. Returns the tensor and the coordinate scale.
pub fn to_encoder_tensor(image: &SageImage) -> Result<(Array4<f32>, f32), SageError> {
    let (new_w, new_h, scale) = resize_longest_side(image.width(), image.height());
    let resized = image.resize(new_w, new_h)?;

    let size = SAM_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for (i, pixel) in resized.as_raw().chunks_exact(3).enumerate() {
        let x = i % new_w as usize;
        let y = i / new_w as usize;

        for c in 0..3 {
            tensor[[0, c, y, x]] = (pixel[c] as f32 - PIXEL_MEAN[c]) / PIXEL_STD[c];
        }
    }

    Ok((tensor, scale))
}

/// Map prompt coordinates from original image space to encoder input space
pub fn transform_points(points: &[[f32; 2]], scale: f32) -> Vec<[f32; 2]> {
    points
        .iter()
        .map(|point| [point[0] * scale, point[1] * scale])
        .collect()
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_resize_longest_side_landscape() {
        let (w, h, scale) = resize_longest_side(2048, 1024);

        assert_eq!(w, 1024);
        assert_eq!(h, 512);
        assert!((scale - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resize_longest_side_portrait() {
        let (w, h, scale) = resize_longest_side(512, 1024);

        assert_eq!(w, 512);
        assert_eq!(h, 1024);
        assert!((scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_longest_side_upscale() {
        let (w, h, _) = resize_longest_side(100, 50);

        assert_eq!(w, 1024);
        assert_eq!(h, 512);
    }

    #[test]
    fn test_to_encoder_tensor_shape() {
        let image = SageImage::new_from_u8(64, 32, 1, vec![128u8; 64 * 32]).unwrap();
        let (tensor, scale) = to_encoder_tensor(&image).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 1024, 1024]);
        assert!((scale - 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_encoder_tensor_pads_with_zeros() {
        let image = SageImage::new_from_u8(4, 2, 1, vec![255u8; 8]).unwrap();
        let (tensor, _) = to_encoder_tensor(&image).unwrap();

        // Bottom half of the tensor is padding
        assert_eq!(tensor[[0, 0, 1023, 0]], 0.0);
        assert_eq!(tensor[[0, 2, 600, 1023]], 0.0);
    }

    #[test]
    fn test_to_encoder_tensor_normalizes() {
        let image = SageImage::new_from_u8(1, 1, 1, vec![255u8]).unwrap();
        let (tensor, _) = to_encoder_tensor(&image).unwrap();

        let expected = (255.0 - PIXEL_MEAN[0]) / PIXEL_STD[0];
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-4);
    }

    #[test]
    fn test_transform_points() {
        let points = transform_points(&[[10.0, 20.0]], 0.5);
        assert_eq!(points, vec![[5.0, 10.0]]);
    }
}
