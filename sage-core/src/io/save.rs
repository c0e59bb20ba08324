// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constant::DEFAULT_MASK_PREFIX;
use crate::error::SageError;
use crate::im::{BinaryMask, save_mask};
use crate::ut::generate_unique_name;

/// Sidecar metadata written next to every persisted mask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskMetadata {
    pub score: f32,
    pub mask_id: usize,
    pub base_name: String,
    pub timestamp: String,
}

/// Persist binary masks with per-mask JSON metadata sidecars.
///
/// Mask i is written to `{base}_{i:03}.npy` with metadata in
/// `{base}_{i:03}_meta.json`. The base name defaults to a generated unique
/// name and is prefixed with the image name when one is given. The output
/// directory is created if it does not exist.
///
/// # Arguments
///
/// * `output` - Output directory
/// * `masks` - Binary masks to persist
/// * `scores` - Per-mask confidence scores, one per mask
/// * `base_name` - Optional file name base
/// * `image_name` - Optional source image stem used to prefix the base
///
/// Returns the paths of the written `.npy` mask files.
pub fn save_masks<P: AsRef<Path>>(
    output: P,
    masks: &[BinaryMask],
    scores: &[f32],
    base_name: Option<&str>,
    image_name: Option<&str>,
) -> Result<Vec<PathBuf>, SageError> {
    if masks.len() != scores.len() {
        return Err(SageError::OtherError(
            "Masks and scores must have the same length when saving".to_string(),
        ));
    }

    let output = output.as_ref();

    std::fs::create_dir_all(output).map_err(|err| SageError::DirError(err.to_string()))?;

    let base = match base_name {
        Some(base) => base.to_string(),
        None => generate_unique_name(DEFAULT_MASK_PREFIX),
    };

    let base = match image_name {
        Some(image) => format!("{}_{}", image, base),
        None => base,
    };

    let timestamp = chrono::Local::now().to_rfc3339();

    let mut paths = Vec::with_capacity(masks.len());

    for (i, (mask, score)) in masks.iter().zip(scores.iter()).enumerate() {
        let mask_path = output.join(format!("{}_{:03}.npy", base, i));
        let meta_path = output.join(format!("{}_{:03}_meta.json", base, i));

        save_mask(mask, &mask_path)?;

        let metadata = MaskMetadata {
            score: *score,
            mask_id: i,
            base_name: base.clone(),
            timestamp: timestamp.clone(),
        };

        let contents = serde_json::to_string_pretty(&metadata)
            .map_err(|err| SageError::OtherError(err.to_string()))?;

        std::fs::write(&meta_path, contents)
            .map_err(|err| SageError::OtherError(err.to_string()))?;

        paths.push(mask_path);
    }

    Ok(paths)
}

/// One image worth of masks in a batch persistence call
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub image_name: String,
    pub masks: Vec<BinaryMask>,
    pub scores: Vec<f32>,
}

/// Persist masks for many images in parallel
///
/// Returns a map from image name to the written mask paths.
pub fn batch_save_masks<P: AsRef<Path> + Sync>(
    output: P,
    items: &[BatchItem],
) -> Result<HashMap<String, Vec<PathBuf>>, SageError> {
    items
        .par_iter()
        .map(|item| {
            let paths = save_masks(
                &output,
                &item.masks,
                &item.scores,
                None,
                Some(&item.image_name),
            )?;

            Ok((item.image_name.clone(), paths))
        })
        .collect()
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::im::open_mask;

    fn mask_from(width: u32, height: u32, data: Vec<u8>) -> BinaryMask {
        BinaryMask::new(width, height, 1, data).unwrap()
    }

    #[test]
    fn test_save_masks() {
        let output = "TEST_SAVE_MASKS";

        let masks = vec![
            mask_from(2, 2, vec![1, 0, 0, 0]),
            mask_from(2, 2, vec![0, 0, 1, 1]),
        ];

        let paths = save_masks(output, &masks, &[0.9, 0.4], Some("run"), None).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("run_000.npy"));
        assert!(paths[1].ends_with("run_001.npy"));

        let opened = open_mask(&paths[1]).unwrap();
        assert_eq!(opened.as_raw(), &[0, 0, 1, 1]);

        let meta = std::fs::read_to_string(Path::new(output).join("run_001_meta.json")).unwrap();
        let meta: MaskMetadata = serde_json::from_str(&meta).unwrap();

        assert_eq!(meta.mask_id, 1);
        assert_eq!(meta.base_name, "run");
        assert!((meta.score - 0.4).abs() < 1e-6);

        std::fs::remove_dir_all(output).unwrap();
    }

    #[test]
    fn test_save_masks_image_prefix() {
        let output = "TEST_SAVE_MASKS_PREFIX";

        let masks = vec![mask_from(2, 2, vec![1, 0, 0, 0])];
        let paths = save_masks(output, &masks, &[0.5], Some("run"), Some("plate")).unwrap();

        assert!(paths[0].ends_with("plate_run_000.npy"));

        std::fs::remove_dir_all(output).unwrap();
    }

    #[test]
    fn test_save_masks_generated_base() {
        let output = "TEST_SAVE_MASKS_GENERATED";

        let masks = vec![mask_from(2, 2, vec![1, 0, 0, 0])];
        let paths = save_masks(output, &masks, &[0.5], None, None).unwrap();

        let name = paths[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("mask_"));

        std::fs::remove_dir_all(output).unwrap();
    }

    #[test]
    fn test_save_masks_length_mismatch() {
        let masks = vec![mask_from(2, 2, vec![1, 0, 0, 0])];

        assert!(save_masks("TEST_SAVE_MASKS_MISMATCH", &masks, &[], None, None).is_err());
    }

    #[test]
    fn test_batch_save_masks() {
        let output = "TEST_BATCH_SAVE_MASKS";

        let items = vec![
            BatchItem {
                image_name: "a".to_string(),
                masks: vec![mask_from(2, 2, vec![1, 0, 0, 0])],
                scores: vec![0.8],
            },
            BatchItem {
                image_name: "b".to_string(),
                masks: vec![mask_from(2, 2, vec![0, 1, 0, 0])],
                scores: vec![0.7],
            },
        ];

        let saved = batch_save_masks(output, &items).unwrap();

        assert_eq!(saved.len(), 2);
        assert_eq!(saved["a"].len(), 1);
        assert_eq!(saved["b"].len(), 1);

        std::fs::remove_dir_all(output).unwrap();
    }
}
