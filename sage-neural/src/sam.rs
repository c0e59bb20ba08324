// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::Path;

use ndarray::{Array1, Array2, Array3, Array4};
use ort::session::Session;

use sage_core::error::SageError;
use sage_core::im::{SageImage, ScoreMask};
use sage_core::ut::track::progress_log;
use sage_data::data::Weights;

use crate::device::{Device, build_session_with_fallback};
use crate::preprocess::{to_encoder_tensor, transform_points};

// Decoder point label conventions from promptable segmentation models
const LABEL_BOX_TOP_LEFT: f32 = 2.0;
const LABEL_BOX_BOTTOM_RIGHT: f32 = 3.0;
const LABEL_PADDING: f32 = -1.0;

/// A cached image embedding produced by the encoder
#[derive(Debug, Clone)]
pub struct ImageEmbedding {
    tensor: Array4<f32>,
    pub original_size: (u32, u32),
    pub scale: f32,
}

/// Candidate masks and confidence scores for one prompt
#[derive(Debug, Clone)]
pub struct Prediction {
    pub masks: Vec<ScoreMask>,
    pub scores: Vec<f32>,
    pub best: usize,
}

impl Prediction {
    /// The highest-confidence candidate mask
    pub fn best_mask(&self) -> &ScoreMask {
        &self.masks[self.best]
    }

    /// The confidence score of the best candidate
    pub fn best_score(&self) -> f32 {
        self.scores[self.best]
    }
}

/// A MobileSAM-style promptable segmentation model.
///
/// The predictor owns an image encoder and a prompt decoder session. An
/// image is embedded once with `set_image` and the cached embedding is
/// reused across any number of point/box prompts until the next image
/// replaces it.
pub struct SamPredictor {
    encoder: Session,
    decoder: Session,
    device: Device,
    embedding: Option<ImageEmbedding>,
}

impl SamPredictor {
    /// Load encoder and decoder models from disk
    ///
    /// If the requested device fails to initialize, loading is retried
    /// once on CPU before giving up.
    ///
    /// # Arguments
    ///
    /// * `encoder` - Path to the image encoder .onnx file
    /// * `decoder` - Path to the mask decoder .onnx file
    /// * `device` - Requested compute device
    /// * `verbose` - Print progress messages
    pub fn load<P: AsRef<Path>>(
        encoder: P,
        decoder: P,
        device: Device,
        verbose: bool,
    ) -> Result<SamPredictor, SageError> {
        progress_log("Loading segmentation model", verbose);

        let (encoder, landed) = build_session_with_fallback(&encoder, device, verbose)?;
        let (decoder, landed) = build_session_with_fallback(&decoder, landed, verbose)?;

        progress_log(
            format!("Segmentation model ready on {}", landed.name()).as_str(),
            verbose,
        );

        Ok(SamPredictor {
            encoder,
            decoder,
            device: landed,
            embedding: None,
        })
    }

    /// Download pre-trained MobileSAM weights if needed and load them
    pub fn from_pretrained(device: Device, verbose: bool) -> Result<SamPredictor, SageError> {
        let encoder = Weights::MobileSamEncoder;
        let decoder = Weights::MobileSamDecoder;

        encoder.download(verbose);
        decoder.download(verbose);

        Self::load(encoder.path(), decoder.path(), device, verbose)
    }

    /// The device inference actually runs on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Check whether an image embedding is cached
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    /// The cached embedding, if any
    pub fn embedding(&self) -> Option<&ImageEmbedding> {
        self.embedding.as_ref()
    }

    /// Embed an image, replacing any previously cached embedding.
    ///
    /// On failure the stale embedding stays cleared so later predictions
    /// fail fast instead of segmenting the wrong image.
    pub fn set_image(&mut self, image: &SageImage) -> Result<(), SageError> {
        self.embedding = None;

        let (tensor, scale) = to_encoder_tensor(image)?;

        let input = ort::value::Value::from_array(tensor)
            .map_err(|err| SageError::ModelError(err.to_string()))?;

        let input_name = self.encoder.inputs[0].name.clone();

        let outputs = self
            .encoder
            .run(ort::inputs![input_name.as_str() => input])
            .map_err(|err| SageError::ModelError(err.to_string()))?;

        let (shape, data) = outputs["image_embeddings"]
            .try_extract_tensor::<f32>()
            .map_err(|err| SageError::ModelError(err.to_string()))?;

        let shape: &[i64] = shape.as_ref();

        if shape.len() != 4 {
            return Err(SageError::ModelError(format!(
                "Expected a 4D image embedding, got {} dimensions",
                shape.len()
            )));
        }

        let tensor = Array4::from_shape_vec(
            (
                shape[0] as usize,
                shape[1] as usize,
                shape[2] as usize,
                shape[3] as usize,
            ),
            data.to_vec(),
        )
        .map_err(|err| SageError::ModelError(err.to_string()))?;

        let original_size = (image.height(), image.width());

        drop(outputs);

        self.embedding = Some(ImageEmbedding {
            tensor,
            original_size,
            scale,
        });

        Ok(())
    }

    /// Predict candidate masks from point prompts
    ///
    /// # Arguments
    ///
    /// * `points` - Point coordinates in (x, y) original image space
    /// * `labels` - Per-point labels (1 foreground, 0 background)
    /// * `multimask` - Return all candidates instead of only the best
    pub fn predict_from_points(
        &mut self,
        points: &[[f32; 2]],
        labels: &[u32],
        multimask: bool,
    ) -> Result<Prediction, SageError> {
        if points.is_empty() {
            return Err(SageError::PromptError(
                "At least one point is required for point prompts.",
            ));
        }

        if points.len() != labels.len() {
            return Err(SageError::PromptError(
                "Points and labels must have the same length.",
            ));
        }

        self.predict(None, points, labels, multimask)
    }

    /// Predict candidate masks from a bounding box prompt
    ///
    /// # Arguments
    ///
    /// * `bbox` - Box as [x_min, y_min, x_max, y_max] in image space
    /// * `multimask` - Return all candidates instead of only the best
    pub fn predict_from_box(
        &mut self,
        bbox: [f32; 4],
        multimask: bool,
    ) -> Result<Prediction, SageError> {
        validate_box(&bbox)?;
        self.predict(Some(bbox), &[], &[], multimask)
    }

    /// Predict candidate masks from a box combined with point prompts
    pub fn predict_from_box_and_points(
        &mut self,
        bbox: [f32; 4],
        points: &[[f32; 2]],
        labels: &[u32],
        multimask: bool,
    ) -> Result<Prediction, SageError> {
        validate_box(&bbox)?;

        if points.len() != labels.len() {
            return Err(SageError::PromptError(
                "Points and labels must have the same length.",
            ));
        }

        self.predict(Some(bbox), points, labels, multimask)
    }

    fn predict(
        &mut self,
        bbox: Option<[f32; 4]>,
        points: &[[f32; 2]],
        labels: &[u32],
        multimask: bool,
    ) -> Result<Prediction, SageError> {
        let embedding = self.embedding.as_ref().ok_or(SageError::ModelError(
            "No image embedding is cached. Call set_image before predicting.".to_string(),
        ))?;

        // Box corners become two decoder points with dedicated labels; a
        // padding point stands in when no box is present
        let mut coords: Vec<[f32; 2]> = Vec::with_capacity(points.len() + 2);
        let mut coord_labels: Vec<f32> = Vec::with_capacity(points.len() + 2);

        for (point, label) in points.iter().zip(labels.iter()) {
            coords.push(*point);
            coord_labels.push(*label as f32);
        }

        match bbox {
            Some([x_min, y_min, x_max, y_max]) => {
                coords.push([x_min, y_min]);
                coord_labels.push(LABEL_BOX_TOP_LEFT);
                coords.push([x_max, y_max]);
                coord_labels.push(LABEL_BOX_BOTTOM_RIGHT);
            }
            None => {
                coords.push([0.0, 0.0]);
                coord_labels.push(LABEL_PADDING);
            }
        }

        let coords = transform_points(&coords, embedding.scale);
        let n = coords.len();

        let point_coords = Array3::from_shape_vec(
            (1, n, 2),
            coords.into_iter().flatten().collect(),
        )
        .map_err(|err| SageError::ModelError(err.to_string()))?;

        let point_labels = Array2::from_shape_vec((1, n), coord_labels)
            .map_err(|err| SageError::ModelError(err.to_string()))?;

        let (height, width) = embedding.original_size;

        let embedding_value = ort::value::Value::from_array(embedding.tensor.clone())
            .map_err(|err| SageError::ModelError(err.to_string()))?;
        let coords_value = ort::value::Value::from_array(point_coords)
            .map_err(|err| SageError::ModelError(err.to_string()))?;
        let labels_value = ort::value::Value::from_array(point_labels)
            .map_err(|err| SageError::ModelError(err.to_string()))?;
        let mask_input_value =
            ort::value::Value::from_array(Array4::<f32>::zeros((1, 1, 256, 256)))
                .map_err(|err| SageError::ModelError(err.to_string()))?;
        let has_mask_value = ort::value::Value::from_array(Array1::<f32>::from_vec(vec![0.0]))
            .map_err(|err| SageError::ModelError(err.to_string()))?;
        let orig_size_value = ort::value::Value::from_array(Array1::<f32>::from_vec(vec![
            height as f32,
            width as f32,
        ]))
        .map_err(|err| SageError::ModelError(err.to_string()))?;

        let outputs = self
            .decoder
            .run(ort::inputs![
                "image_embeddings" => embedding_value,
                "point_coords" => coords_value,
                "point_labels" => labels_value,
                "mask_input" => mask_input_value,
                "has_mask_input" => has_mask_value,
                "orig_im_size" => orig_size_value,
            ])
            .map_err(|err| SageError::ModelError(err.to_string()))?;

        let (masks_shape, masks_data) = outputs["masks"]
            .try_extract_tensor::<f32>()
            .map_err(|err| SageError::ModelError(err.to_string()))?;

        let masks_shape: &[i64] = masks_shape.as_ref();

        if masks_shape.len() != 4 {
            return Err(SageError::ModelError(format!(
                "Expected 4D decoder masks, got {} dimensions",
                masks_shape.len()
            )));
        }

        let candidates = masks_shape[1] as usize;
        let mask_h = masks_shape[2] as usize;
        let mask_w = masks_shape[3] as usize;

        let (_, scores_data) = outputs["iou_predictions"]
            .try_extract_tensor::<f32>()
            .map_err(|err| SageError::ModelError(err.to_string()))?;

        let scores: Vec<f32> = scores_data.to_vec();

        let mut masks = split_candidates(candidates, mask_h, mask_w, masks_data)?;

        // First index wins score ties
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }

        if multimask {
            Ok(Prediction { masks, scores, best })
        } else {
            Ok(Prediction {
                masks: vec![masks.swap_remove(best)],
                scores: vec![scores[best]],
                best: 0,
            })
        }
    }
}

fn split_candidates(
    candidates: usize,
    mask_h: usize,
    mask_w: usize,
    data: &[f32],
) -> Result<Vec<ScoreMask>, SageError> {
    if candidates == 0 {
        return Err(SageError::ModelError(
            "Decoder returned zero candidate masks".to_string(),
        ));
    }

    let mut masks = Vec::with_capacity(candidates);

    for c in 0..candidates {
        let start = c * mask_h * mask_w;
        let end = start + mask_h * mask_w;

        let channel = data.get(start..end).ok_or_else(|| {
            SageError::ModelError("Decoder mask tensor is truncated".to_string())
        })?;

        masks.push(ScoreMask::new(
            mask_w as u32,
            mask_h as u32,
            1,
            channel.to_vec(),
        )?);
    }

    Ok(masks)
}

fn validate_box(bbox: &[f32; 4]) -> Result<(), SageError> {
    let [x_min, y_min, x_max, y_max] = *bbox;

    if !bbox.iter().all(|v| v.is_finite()) {
        return Err(SageError::PromptError("Box coordinates must be finite."));
    }

    if x_max <= x_min || y_max <= y_min {
        return Err(SageError::PromptError(
            "Box must satisfy x_min < x_max and y_min < y_max.",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_validate_box() {
        assert!(validate_box(&[0.0, 0.0, 10.0, 10.0]).is_ok());
        assert!(validate_box(&[10.0, 0.0, 10.0, 10.0]).is_err());
        assert!(validate_box(&[0.0, 5.0, 10.0, 5.0]).is_err());
        assert!(validate_box(&[0.0, f32::NAN, 10.0, 5.0]).is_err());
    }

    #[test]
    fn test_split_candidates() {
        let data = [0.0, 1.0, 2.0, 3.0];
        let masks = split_candidates(2, 1, 2, &data).unwrap();

        assert_eq!(masks.len(), 2);
        assert_eq!(masks[0].as_raw(), &[0.0, 1.0]);
        assert_eq!(masks[1].as_raw(), &[2.0, 3.0]);
    }

    #[test]
    fn test_split_candidates_zero_rejected() {
        assert!(split_candidates(0, 4, 4, &[]).is_err());
    }

    #[test]
    fn test_split_candidates_truncated_rejected() {
        assert!(split_candidates(2, 2, 2, &[0.0; 4]).is_err());
    }

    #[test]
    fn test_prediction_best_accessors() {
        let prediction = Prediction {
            masks: vec![
                ScoreMask::new(2, 1, 1, vec![0.0, 1.0]).unwrap(),
                ScoreMask::new(2, 1, 1, vec![1.0, 0.0]).unwrap(),
            ],
            scores: vec![0.3, 0.9],
            best: 1,
        };

        assert_eq!(prediction.best_score(), 0.9);
        assert_eq!(prediction.best_mask().as_raw(), &[1.0, 0.0]);
    }
}
