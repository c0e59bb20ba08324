// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

// All currently supported image formats
pub const SUPPORTED_IMAGE_FORMATS: [&str; 18] = [
    "avif", "bmp", "dds", "hdr", "ico", "jpeg", "jpg", "exr", "png", "pbm", "pgm", "ppm", "qoi",
    "tga", "tif", "tiff", "webp", "npy",
];

// The currently supported common image formats
pub const IMAGE_DYNAMIC_FORMATS: [&str; 17] = [
    "avif", "bmp", "dds", "hdr", "ico", "jpeg", "jpg", "exr", "png", "pbm", "pgm", "ppm", "qoi",
    "tga", "tif", "tiff", "webp",
];

// Fractional part of the golden ratio used to space label hues
pub const GOLDEN_RATIO_CONJUGATE: f64 = 0.618033988749895;

// Fixed saturation and value for generated label colors
pub const LABEL_SATURATION: f32 = 0.8;
pub const LABEL_VALUE: f32 = 0.95;

// Default cutoff when binarizing float-valued masks
pub const DEFAULT_MASK_THRESHOLD: f32 = 0.5;

// Default prefix for generated mask names
pub const DEFAULT_MASK_PREFIX: &str = "mask";
