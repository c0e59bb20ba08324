// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::Path;

use fast_image_resize::{FilterType, PixelType, images::Image};
use image::{DynamicImage, ImageBuffer, Rgb, open as open_dynamic};
use npyz::{DType, NpyFile, TypeChar};

use crate::constant;
use crate::error::SageError;
use crate::im::SageBuffer;

/// A 3-channel u8 RGB image normalized for promptable segmentation.
///
/// All external image types are funneled through this struct so that the
/// model wrapper only ever sees 3-channel u8 data: grayscale inputs are
/// replicated across channels, images with more than three channels are
/// truncated to the first three, and float images with values in [0, 1]
/// are rescaled to [0, 255].
///
/// # Examples
///
/// ```
/// use image::{RgbImage, DynamicImage};
/// use sage_core::im::SageImage;
///
/// let rgb = RgbImage::new(10, 10);
/// let dynamic = DynamicImage::ImageRgb8(rgb);
/// let image = SageImage::new_from_default(dynamic);
///
/// assert_eq!(image.unwrap().channels(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SageImage {
    buffer: SageBuffer<u8>,
}

// >>> I/O METHODS

impl SageImage {
    /// Open a new image from a provided path
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    ///
    /// ```no_run
    /// use sage_core::im::SageImage;
    /// let image = SageImage::open("image.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SageImage, SageError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if let Some(ext) = extension {
            if ext == "npy" {
                if let Ok(bytes) = std::fs::read(&path) {
                    if let Ok(npy) = NpyFile::new(&bytes[..]) {
                        return Self::new_from_numpy(npy);
                    }
                }

                return Err(SageError::ImageReadError);
            }

            if constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
                if let Ok(image) = open_dynamic(&path) {
                    return Self::new_from_default(image);
                }

                return Err(SageError::ImageReadError);
            }
        }

        Err(SageError::ImageExtensionError)
    }

    /// Initialize a new image from a DynamicImage
    ///
    /// # Arguments
    ///
    /// * `image` - A grayscale, RGB, or RGBA DynamicImage
    ///
    /// # Examples
    ///
    /// ```
    /// use image::{GrayImage, DynamicImage};
    /// use sage_core::im::SageImage;
    ///
    /// let gray = GrayImage::new(10, 10);
    /// let dynamic = DynamicImage::ImageLuma8(gray);
    /// let image = SageImage::new_from_default(dynamic);
    /// ```
    pub fn new_from_default(image: DynamicImage) -> Result<SageImage, SageError> {
        let width = image.width();
        let height = image.height();

        match image {
            DynamicImage::ImageLuma8(buffer) => {
                Self::new_from_u8(width, height, 1, buffer.into_raw())
            }
            DynamicImage::ImageLumaA8(buffer) => Self::new_from_u8(
                width,
                height,
                1,
                buffer
                    .into_raw()
                    .chunks_exact(2)
                    .map(|pixel| pixel[0])
                    .collect(),
            ),
            DynamicImage::ImageRgb8(buffer) => {
                Self::new_from_u8(width, height, 3, buffer.into_raw())
            }
            DynamicImage::ImageRgba8(buffer) => Self::new_from_u8(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            ),
            DynamicImage::ImageLuma16(buffer) => Self::new_from_u8(
                width,
                height,
                1,
                buffer
                    .into_raw()
                    .into_iter()
                    .map(|pixel| (pixel >> 8) as u8)
                    .collect(),
            ),
            DynamicImage::ImageRgb16(buffer) => Self::new_from_u8(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .into_iter()
                    .map(|pixel| (pixel >> 8) as u8)
                    .collect(),
            ),
            DynamicImage::ImageRgba16(buffer) => Self::new_from_u8(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| {
                        [
                            (pixel[0] >> 8) as u8,
                            (pixel[1] >> 8) as u8,
                            (pixel[2] >> 8) as u8,
                        ]
                    })
                    .collect(),
            ),
            DynamicImage::ImageRgb32F(buffer) => {
                Self::new_from_f32(width, height, 3, buffer.into_raw())
            }
            DynamicImage::ImageRgba32F(buffer) => Self::new_from_f32(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            ),
            _ => Err(SageError::ImageError(
                "Unsupported dynamic image variant.",
            )),
        }
    }

    /// Initialize a new image from a numpy file
    ///
    /// Accepts u8, u16, and f32 arrays of shape (H, W) or (H, W, C).
    pub fn new_from_numpy(npy: NpyFile<&[u8]>) -> Result<SageImage, SageError> {
        let shape = npy.shape().to_vec();

        let (h, w, c) = match shape.len() {
            2 => (shape[0] as u32, shape[1] as u32, 1u32),
            3 => (shape[0] as u32, shape[1] as u32, shape[2] as u32),
            _ => {
                return Err(SageError::ImageError(
                    "Numpy array images must have an (H, W) or (H, W, C) shape.",
                ));
            }
        };

        match npy.dtype() {
            DType::Plain(x) => match (x.type_char(), x.size_field()) {
                (TypeChar::Uint, 1) => Self::new_from_u8(
                    w,
                    h,
                    c,
                    npy.into_vec::<u8>()
                        .map_err(|_| SageError::ImageReadError)?,
                ),
                (TypeChar::Uint, 2) => Self::new_from_u8(
                    w,
                    h,
                    c,
                    npy.into_vec::<u16>()
                        .map_err(|_| SageError::ImageReadError)?
                        .into_iter()
                        .map(|pixel| (pixel >> 8) as u8)
                        .collect(),
                ),
                (TypeChar::Float, 4) => Self::new_from_f32(
                    w,
                    h,
                    c,
                    npy.into_vec::<f32>()
                        .map_err(|_| SageError::ImageReadError)?,
                ),
                _ => Err(SageError::ImageError(
                    "Only u8, u16, and f32 numpy images are supported.",
                )),
            },
            _ => Err(SageError::ImageError(
                "Only plain numpy dtypes are supported for images.",
            )),
        }
    }
}

// <<< I/O METHODS

// >>> CONSTRUCTOR METHODS

impl SageImage {
    /// Initialize from raw u8 data with any channel count
    ///
    /// One- and two-channel data replicate the first channel to RGB (the
    /// second channel is treated as alpha and dropped); channel counts
    /// above three are truncated to the first three channels.
    pub fn new_from_u8(
        width: u32,
        height: u32,
        channels: u32,
        data: Vec<u8>,
    ) -> Result<SageImage, SageError> {
        if width * height * channels != data.len() as u32 {
            return Err(SageError::BufferSizeError);
        }

        let rgb: Vec<u8> = match channels {
            0 => return Err(SageError::ImageError("Image has zero channels.")),
            1 => data.into_iter().flat_map(|pixel| [pixel; 3]).collect(),
            2 => data
                .chunks_exact(2)
                .flat_map(|pixel| [pixel[0]; 3])
                .collect(),
            3 => data,
            c => data
                .chunks_exact(c as usize)
                .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                .collect(),
        };

        Ok(SageImage {
            buffer: SageBuffer::new(width, height, 3, rgb)?,
        })
    }

    /// Initialize from raw f32 data with any channel count
    ///
    /// Float data with a maximum value at or below 1.0 is rescaled to the
    /// [0, 255] range before casting; everything else is clamped and cast.
    pub fn new_from_f32(
        width: u32,
        height: u32,
        channels: u32,
        data: Vec<f32>,
    ) -> Result<SageImage, SageError> {
        if width * height * channels != data.len() as u32 {
            return Err(SageError::BufferSizeError);
        }

        let max = data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let scale = if max <= 1.0 { 255.0 } else { 1.0 };

        let bytes: Vec<u8> = data
            .into_iter()
            .map(|pixel| (pixel * scale).clamp(0.0, 255.0) as u8)
            .collect();

        Self::new_from_u8(width, height, channels, bytes)
    }
}

// <<< CONSTRUCTOR METHODS

// >>> PROPERTY METHODS

impl SageImage {
    /// Width of the image
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Height of the image
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Number of channels in the image (always 3)
    pub fn channels(&self) -> u32 {
        self.buffer.channels()
    }

    /// Returns a reference to the raw RGB data
    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Returns the raw RGB data
    pub fn into_raw(self) -> Vec<u8> {
        self.buffer.into_raw()
    }
}

// <<< PROPERTY METHODS

// >>> TRANSFORM METHODS

impl SageImage {
    /// Resize the image with SIMD-accelerated bilinear interpolation
    ///
    /// # Arguments
    ///
    /// * `width` - New width following resizing
    /// * `height` - New height following resizing
    pub fn resize(&self, width: u32, height: u32) -> Result<SageImage, SageError> {
        let source = DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(
                self.width(),
                self.height(),
                self.as_raw().to_vec(),
            )
            .ok_or(SageError::ImageError("Failed to resize image."))?,
        );

        let mut destination = Image::new(width, height, PixelType::U8x3);

        let mut resizer = fast_image_resize::Resizer::new();
        let option = fast_image_resize::ResizeOptions {
            algorithm: fast_image_resize::ResizeAlg::Convolution(FilterType::Bilinear),
            cropping: fast_image_resize::SrcCropping::None,
            mul_div_alpha: false,
        };

        resizer
            .resize(&source, &mut destination, &option)
            .map_err(|_| SageError::ImageError("Failed to resize image."))?;

        Ok(SageImage {
            buffer: SageBuffer::new(width, height, 3, destination.into_vec())?,
        })
    }
}

// <<< TRANSFORM METHODS

#[cfg(test)]
mod test {

    use super::*;
    use image::GrayImage;

    #[test]
    fn test_gray_replicated_to_rgb() {
        let mut gray = GrayImage::new(2, 2);
        gray.put_pixel(0, 0, image::Luma([7]));

        let image = SageImage::new_from_default(DynamicImage::ImageLuma8(gray)).unwrap();

        assert_eq!(image.channels(), 3);
        assert_eq!(&image.as_raw()[..3], &[7, 7, 7]);
    }

    #[test]
    fn test_two_channel_replicates_first() {
        let data = vec![7u8, 255, 9, 255];
        let image = SageImage::new_from_u8(2, 1, 2, data).unwrap();

        assert_eq!(image.as_raw(), &[7, 7, 7, 9, 9, 9]);
    }

    #[test]
    fn test_rgba_truncated_to_rgb() {
        let data = vec![1u8, 2, 3, 255, 4, 5, 6, 255];
        let image = SageImage::new_from_u8(2, 1, 4, data).unwrap();

        assert_eq!(image.as_raw(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_unit_float_rescaled() {
        let data = vec![0.0f32, 0.5, 1.0, 0.25];
        let image = SageImage::new_from_f32(2, 2, 1, data).unwrap();

        assert_eq!(&image.as_raw()[..3], &[0, 0, 0]);
        assert_eq!(&image.as_raw()[3..6], &[127, 127, 127]);
        assert_eq!(&image.as_raw()[6..9], &[255, 255, 255]);
    }

    #[test]
    fn test_large_float_not_rescaled() {
        let data = vec![0.0f32, 128.0, 300.0, 64.0];
        let image = SageImage::new_from_f32(2, 2, 1, data).unwrap();

        assert_eq!(image.as_raw()[3], 128);
        assert_eq!(image.as_raw()[6], 255);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        assert!(SageImage::new_from_u8(2, 2, 1, vec![0u8; 3]).is_err());
    }

    #[test]
    fn test_resize() {
        let image = SageImage::new_from_u8(4, 4, 1, vec![10u8; 16]).unwrap();
        let resized = image.resize(2, 2).unwrap();

        assert_eq!(resized.width(), 2);
        assert_eq!(resized.height(), 2);
        assert_eq!(resized.as_raw().len(), 12);
    }
}
