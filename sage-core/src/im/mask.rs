// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma, open as open_dynamic};
use npyz::{DType, NpyFile, TypeChar};

use crate::constant;
use crate::error::SageError;
use crate::im::SageBuffer;
use crate::io::write_numpy;

/// A single-channel float mask holding per-pixel model scores or logits
pub type ScoreMask = SageBuffer<f32>;

/// A single-channel u8 mask restricted to {0, 1}
pub type BinaryMask = SageBuffer<u8>;

/// Conversion of an arbitrary mask into a {0, 1} u8 binary mask.
///
/// Integer-valued masks are binarized by `value > 0` and float-valued
/// masks by `value > threshold`. The threshold argument is ignored for
/// integer masks.
pub trait ToBinary {
    fn to_binary(&self, threshold: f32) -> BinaryMask;
}

impl ToBinary for SageBuffer<f32> {
    fn to_binary(&self, threshold: f32) -> BinaryMask {
        // Length is preserved so the binary mask always matches dimensions
        let mut binary = BinaryMask::filled(self.width(), self.height(), self.channels(), 0u8);

        binary.buffer = self
            .iter()
            .map(|&v| if v > threshold { 1u8 } else { 0u8 })
            .collect();

        binary
    }
}

macro_rules! impl_to_binary_integer {
    ($($t:ty),*) => {
        $(
            impl ToBinary for SageBuffer<$t> {
                fn to_binary(&self, _threshold: f32) -> BinaryMask {
                    let mut binary = BinaryMask::filled(
                        self.width(),
                        self.height(),
                        self.channels(),
                        0u8,
                    );

                    binary.buffer = self
                        .iter()
                        .map(|&v| if v > 0 as $t { 1u8 } else { 0u8 })
                        .collect();

                    binary
                }
            }
        )*
    };
}

impl_to_binary_integer!(u8, u16, u32, i32, i64);

/// Open a binary mask from a .npy file or a common grayscale image format
///
/// Any non-zero pixel in the source is treated as foreground.
///
/// # Arguments
///
/// * `path` - A path to a mask with a valid extension
///
/// ```no_run
/// use sage_core::im::open_mask;
/// let mask = open_mask("mask.npy");
/// ```
pub fn open_mask<P: AsRef<Path>>(path: P) -> Result<BinaryMask, SageError> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    if let Some(ext) = extension {
        if ext == "npy" {
            if let Ok(bytes) = std::fs::read(&path) {
                if let Ok(npy) = NpyFile::new(&bytes[..]) {
                    return mask_from_numpy(npy);
                }
            }

            return Err(SageError::ImageReadError);
        }

        if constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
            if let Ok(image) = open_dynamic(&path) {
                return mask_from_dynamic(image);
            }

            return Err(SageError::ImageReadError);
        }
    }

    Err(SageError::ImageExtensionError)
}

fn mask_from_numpy(npy: NpyFile<&[u8]>) -> Result<BinaryMask, SageError> {
    let shape = npy.shape().to_vec();

    let (h, w) = match shape.len() {
        2 => (shape[0] as u32, shape[1] as u32),
        _ => {
            return Err(SageError::MaskError(
                "Numpy array masks must have an (H, W) shape.",
            ));
        }
    };

    match npy.dtype() {
        DType::Plain(x) => match (x.type_char(), x.size_field()) {
            (TypeChar::Uint, 1) => BinaryMask::new(
                w,
                h,
                1,
                npy.into_vec::<u8>()
                    .map_err(|_| SageError::ImageReadError)?,
            )
            .map(|m| m.to_binary(0.0)),
            (TypeChar::Uint, 2) => SageBuffer::<u16>::new(
                w,
                h,
                1,
                npy.into_vec::<u16>()
                    .map_err(|_| SageError::ImageReadError)?,
            )
            .map(|m| m.to_binary(0.0)),
            (TypeChar::Float, 4) => ScoreMask::new(
                w,
                h,
                1,
                npy.into_vec::<f32>()
                    .map_err(|_| SageError::ImageReadError)?,
            )
            .map(|m| m.to_binary(constant::DEFAULT_MASK_THRESHOLD)),
            _ => Err(SageError::MaskError(
                "Only u8, u16, and f32 numpy masks are supported.",
            )),
        },
        _ => Err(SageError::MaskError(
            "Only plain numpy dtypes are supported for masks.",
        )),
    }
}

fn mask_from_dynamic(mask: DynamicImage) -> Result<BinaryMask, SageError> {
    let width = mask.width();
    let height = mask.height();

    let gray = mask.into_luma8();

    BinaryMask::new(
        width,
        height,
        1,
        gray.into_raw()
            .into_iter()
            .map(|pixel| if pixel > 0 { 1u8 } else { 0u8 })
            .collect(),
    )
}

/// Save a binary mask to a .npy file or a common grayscale image format
///
/// Numpy output keeps the {0, 1} range with shape (H, W); dynamic image
/// formats scale foreground pixels to 255 for visibility.
///
/// # Arguments
///
/// * `mask` - A binary mask
/// * `path` - Output path with a valid extension
pub fn save_mask<P: AsRef<Path>>(mask: &BinaryMask, path: P) -> Result<(), SageError> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    if let Some(ext) = extension {
        if ext == "npy" {
            return write_numpy(
                path,
                mask.as_raw().to_vec(),
                vec![mask.height() as u64, mask.width() as u64],
            );
        }

        if constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
            ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(
                mask.width(),
                mask.height(),
                mask.iter().map(|&p| if p > 0 { 255u8 } else { 0u8 }).collect(),
            )
            .ok_or(SageError::ImageWriteError)?
            .save(path)
            .map_err(|_| SageError::ImageWriteError)?;

            return Ok(());
        }
    }

    Err(SageError::ImageExtensionError)
}
