// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use sage_core::cv::{BoundaryOp, adjust_boundary};
use sage_core::error::SageError;
use sage_core::im::{LabelMap, Prompt, SageImage, ScoreMask, ToBinary};
use sage_core::io::save_masks;

use crate::sam::{Prediction, SamPredictor};

// Candidate masks are decoder logits; zero is the foreground boundary
const LOGIT_THRESHOLD: f32 = 0.0;

/// The narrow seam between an annotation session and a segmentation model
pub trait MaskPredictor {
    fn set_image(&mut self, image: &SageImage) -> Result<(), SageError>;

    fn predict(&mut self, prompt: &Prompt, multimask: bool) -> Result<Prediction, SageError>;
}

impl MaskPredictor for SamPredictor {
    fn set_image(&mut self, image: &SageImage) -> Result<(), SageError> {
        SamPredictor::set_image(self, image)
    }

    fn predict(&mut self, prompt: &Prompt, multimask: bool) -> Result<Prediction, SageError> {
        match (prompt.bbox, prompt.points.is_empty()) {
            (Some(bbox), true) => self.predict_from_box(bbox, multimask),
            (Some(bbox), false) => {
                self.predict_from_box_and_points(bbox, &prompt.points, &prompt.labels, multimask)
            }
            (None, false) => self.predict_from_points(&prompt.points, &prompt.labels, multimask),
            (None, true) => Err(SageError::PromptError(
                "Prompt must include points or a box.",
            )),
        }
    }
}

/// Annotation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoImage,
    ImageSet,
    Predicted,
    MaskAccepted,
}

/// An explicit annotation session over a promptable segmentation model.
///
/// The session owns the predictor, the pending candidate masks, and the
/// label map, and enforces the annotation lifecycle: an image must be set
/// before predicting and a prediction must exist before accepting a mask.
/// Predictions are serialized; a re-entrant predict call is rejected
/// rather than interleaved.
pub struct AnnotationSession<P: MaskPredictor> {
    predictor: P,
    state: SessionState,
    image_name: Option<String>,
    image_size: Option<(u32, u32)>,
    prediction: Option<Prediction>,
    selected: usize,
    labels: Option<LabelMap>,
    busy: bool,
}

impl<P: MaskPredictor> AnnotationSession<P> {
    pub fn new(predictor: P) -> Self {
        AnnotationSession {
            predictor,
            state: SessionState::NoImage,
            image_name: None,
            image_size: None,
            prediction: None,
            selected: 0,
            labels: None,
            busy: false,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Name of the image being annotated, if any
    pub fn image_name(&self) -> Option<&str> {
        self.image_name.as_deref()
    }

    /// The pending prediction, if any
    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    /// Index of the selected candidate mask
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The label map for the current image, if any
    pub fn labels(&self) -> Option<&LabelMap> {
        self.labels.as_ref()
    }

    /// Set the image to annotate.
    ///
    /// Clears any pending prediction. Accepted labels survive as long as
    /// the new image has the same dimensions; a size change resets the
    /// label map.
    pub fn set_image(&mut self, name: &str, image: &SageImage) -> Result<(), SageError> {
        self.prediction = None;
        self.selected = 0;

        if let Err(err) = self.predictor.set_image(image) {
            self.state = SessionState::NoImage;
            return Err(err);
        }

        let size = (image.width(), image.height());

        if self.image_size != Some(size) {
            self.labels = Some(LabelMap::new(size.0, size.1));
        }

        self.image_name = Some(name.to_string());
        self.image_size = Some(size);
        self.state = SessionState::ImageSet;

        Ok(())
    }

    /// Run the model on a prompt, replacing any pending prediction
    pub fn predict(&mut self, prompt: &Prompt, multimask: bool) -> Result<&Prediction, SageError> {
        if self.state == SessionState::NoImage {
            return Err(SageError::SessionError(
                "No image is set. Set an image before predicting.",
            ));
        }

        if prompt.is_empty() {
            return Err(SageError::PromptError(
                "Prompt must include points or a box.",
            ));
        }

        if self.busy {
            return Err(SageError::SessionError(
                "A prediction is already in progress.",
            ));
        }

        self.busy = true;
        let result = self.predictor.predict(prompt, multimask);
        self.busy = false;

        let prediction = result?;

        self.selected = prediction.best;
        self.state = SessionState::Predicted;

        Ok(self.prediction.insert(prediction))
    }

    /// Select a candidate mask from the pending prediction
    pub fn select_mask(&mut self, index: usize) -> Result<(), SageError> {
        let prediction = self.prediction.as_ref().ok_or(SageError::SessionError(
            "No prediction available. Run predict first.",
        ))?;

        if index >= prediction.masks.len() {
            return Err(SageError::SessionError(
                "Selected mask index is out of bounds.",
            ));
        }

        self.selected = index;
        Ok(())
    }

    /// Dilate or erode the selected candidate mask by one pixel
    pub fn adjust_boundary(&mut self, op: BoundaryOp) -> Result<(), SageError> {
        let selected = self.selected;

        let prediction = self.prediction.as_mut().ok_or(SageError::SessionError(
            "No prediction available. Run predict first.",
        ))?;

        let mask = &prediction.masks[selected];
        let adjusted = adjust_boundary(&mask.to_binary(LOGIT_THRESHOLD), op);

        // Adjusted candidates continue through the pipeline as {0, 1}
        // scores, which binarize back unchanged
        prediction.masks[selected] = ScoreMask::new(
            adjusted.width(),
            adjusted.height(),
            1,
            adjusted.iter().map(|&v| v as f32).collect(),
        )?;

        Ok(())
    }

    /// Accept the selected candidate mask under a label name
    pub fn accept_mask(&mut self, name: &str) -> Result<u32, SageError> {
        let selected = self.selected;

        let prediction = self.prediction.as_ref().ok_or(SageError::SessionError(
            "No prediction available. Run predict first.",
        ))?;

        let labels = self.labels.as_mut().ok_or(SageError::SessionError(
            "No label map available. Set an image first.",
        ))?;

        let binary = prediction.masks[selected].to_binary(LOGIT_THRESHOLD);
        let id = labels.accept_mask(&binary, name, selected)?;

        self.state = SessionState::MaskAccepted;

        Ok(id)
    }

    /// Drop the pending prediction while keeping accepted labels
    pub fn clear_annotations(&mut self) {
        self.prediction = None;
        self.selected = 0;

        if self.state != SessionState::NoImage {
            self.state = SessionState::ImageSet;
        }
    }

    /// Export label names and colors to a JSON file
    pub fn export_labels<Q: AsRef<Path>>(&self, path: Q) -> Result<(), SageError> {
        let labels = self.labels.as_ref().ok_or(SageError::SessionError(
            "No label map available. Set an image first.",
        ))?;

        labels.export_to_file(path, self.image_name.as_deref())
    }

    /// Persist the pending candidate masks with metadata sidecars
    pub fn save_masks<Q: AsRef<Path>>(
        &self,
        output: Q,
        base_name: Option<&str>,
    ) -> Result<Vec<PathBuf>, SageError> {
        let prediction = self.prediction.as_ref().ok_or(SageError::SessionError(
            "No prediction available. Run predict first.",
        ))?;

        let binary: Vec<_> = prediction
            .masks
            .iter()
            .map(|mask| mask.to_binary(LOGIT_THRESHOLD))
            .collect();

        save_masks(
            output,
            &binary,
            &prediction.scores,
            base_name,
            self.image_name.as_deref(),
        )
    }
}

#[cfg(test)]
mod test {

    use super::*;

    // A stub model that fills the prompted box and scores candidates by index
    struct StubPredictor {
        fail_set_image: bool,
        size: (u32, u32),
    }

    impl StubPredictor {
        fn new() -> Self {
            StubPredictor {
                fail_set_image: false,
                size: (0, 0),
            }
        }
    }

    impl MaskPredictor for StubPredictor {
        fn set_image(&mut self, image: &SageImage) -> Result<(), SageError> {
            if self.fail_set_image {
                return Err(SageError::ModelError("encoder failed".to_string()));
            }

            self.size = (image.width(), image.height());
            Ok(())
        }

        fn predict(&mut self, prompt: &Prompt, multimask: bool) -> Result<Prediction, SageError> {
            if prompt.is_empty() {
                return Err(SageError::PromptError(
                    "Prompt must include points or a box.",
                ));
            }

            let (w, h) = self.size;
            let candidates = if multimask { 3 } else { 1 };

            let mut masks = Vec::new();
            let mut scores = Vec::new();

            for c in 0..candidates {
                let mut data = vec![-1.0f32; (w * h) as usize];

                if let Some([x_min, y_min, x_max, y_max]) = prompt.bbox {
                    for y in (y_min as u32)..(y_max as u32).min(h) {
                        for x in (x_min as u32)..(x_max as u32).min(w) {
                            data[(y * w + x) as usize] = 1.0;
                        }
                    }
                }

                for point in &prompt.points {
                    let (x, y) = (point[0] as u32, point[1] as u32);
                    if x < w && y < h {
                        data[(y * w + x) as usize] = 1.0;
                    }
                }

                masks.push(ScoreMask::new(w, h, 1, data)?);
                scores.push(0.5 + c as f32 * 0.1);
            }

            let best = scores.len() - 1;

            Ok(Prediction { masks, scores, best })
        }
    }

    fn session_with_image() -> AnnotationSession<StubPredictor> {
        let mut session = AnnotationSession::new(StubPredictor::new());
        let image = SageImage::new_from_u8(4, 4, 1, vec![0u8; 16]).unwrap();
        session.set_image("test.png", &image).unwrap();
        session
    }

    fn point_prompt(x: f32, y: f32) -> Prompt {
        Prompt {
            points: vec![[x, y]],
            labels: vec![1],
            bbox: None,
        }
    }

    #[test]
    fn test_initial_state() {
        let session = AnnotationSession::new(StubPredictor::new());

        assert_eq!(session.state(), SessionState::NoImage);
        assert!(session.prediction().is_none());
        assert!(session.labels().is_none());
    }

    #[test]
    fn test_predict_without_image_rejected() {
        let mut session = AnnotationSession::new(StubPredictor::new());

        assert!(session.predict(&point_prompt(1.0, 1.0), true).is_err());
        assert_eq!(session.state(), SessionState::NoImage);
    }

    #[test]
    fn test_predict_empty_prompt_rejected() {
        let mut session = session_with_image();

        assert!(session.predict(&Prompt::default(), true).is_err());
    }

    #[test]
    fn test_predict_selects_best() {
        let mut session = session_with_image();

        session.predict(&point_prompt(1.0, 1.0), true).unwrap();

        assert_eq!(session.state(), SessionState::Predicted);
        assert_eq!(session.selected(), 2);
    }

    #[test]
    fn test_accept_without_prediction_rejected() {
        let mut session = session_with_image();

        assert!(session.accept_mask("cell").is_err());
        assert_eq!(session.state(), SessionState::ImageSet);
    }

    #[test]
    fn test_accept_mask_updates_labels() {
        let mut session = session_with_image();

        session.predict(&point_prompt(1.0, 1.0), true).unwrap();
        let id = session.accept_mask("cell").unwrap();

        assert_eq!(id, 1);
        assert_eq!(session.state(), SessionState::MaskAccepted);

        let labels = session.labels().unwrap();
        assert_eq!(labels.name_of(1), Some("cell"));
        assert_eq!(labels.raster().get(1, 1), Some(&1));
    }

    #[test]
    fn test_set_image_clears_prediction() {
        let mut session = session_with_image();

        session.predict(&point_prompt(1.0, 1.0), true).unwrap();
        session.accept_mask("cell").unwrap();

        let image = SageImage::new_from_u8(4, 4, 1, vec![0u8; 16]).unwrap();
        session.set_image("next.png", &image).unwrap();

        assert_eq!(session.state(), SessionState::ImageSet);
        assert!(session.prediction().is_none());
        assert_eq!(session.labels().unwrap().name_of(1), Some("cell"));
    }

    #[test]
    fn test_set_image_new_size_resets_labels() {
        let mut session = session_with_image();

        session.predict(&point_prompt(1.0, 1.0), true).unwrap();
        session.accept_mask("cell").unwrap();

        let image = SageImage::new_from_u8(8, 8, 1, vec![0u8; 64]).unwrap();
        session.set_image("bigger.png", &image).unwrap();

        assert!(session.labels().unwrap().is_empty());
    }

    #[test]
    fn test_set_image_failure_resets_state() {
        let mut session = session_with_image();
        session.predictor.fail_set_image = true;

        let image = SageImage::new_from_u8(4, 4, 1, vec![0u8; 16]).unwrap();

        assert!(session.set_image("broken.png", &image).is_err());
        assert_eq!(session.state(), SessionState::NoImage);
        assert!(session.predict(&point_prompt(1.0, 1.0), true).is_err());
    }

    #[test]
    fn test_select_mask_bounds() {
        let mut session = session_with_image();

        session.predict(&point_prompt(1.0, 1.0), true).unwrap();

        assert!(session.select_mask(0).is_ok());
        assert!(session.select_mask(3).is_err());
    }

    #[test]
    fn test_adjust_boundary_dilates_selected() {
        let mut session = session_with_image();

        session.predict(&point_prompt(1.0, 1.0), false).unwrap();
        session.adjust_boundary(BoundaryOp::Dilate).unwrap();

        let mask = session.prediction().unwrap().masks[0].to_binary(0.0);

        // The single prompted pixel grew into a 3x3 block
        assert_eq!(mask.as_raw().iter().filter(|&&v| v > 0).count(), 9);
    }

    #[test]
    fn test_clear_annotations_keeps_labels() {
        let mut session = session_with_image();

        session.predict(&point_prompt(1.0, 1.0), true).unwrap();
        session.accept_mask("cell").unwrap();
        session.clear_annotations();

        assert_eq!(session.state(), SessionState::ImageSet);
        assert!(session.prediction().is_none());
        assert_eq!(session.labels().unwrap().name_of(1), Some("cell"));
    }

    #[test]
    fn test_export_labels() {
        let path = "TEST_SESSION_EXPORT_LABELS.json";

        let mut session = session_with_image();
        session.predict(&point_prompt(1.0, 1.0), true).unwrap();
        session.accept_mask("cell").unwrap();
        session.export_labels(path).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let info: serde_json::Value = serde_json::from_str(&contents).unwrap();

        assert_eq!(info["labels"]["1"]["name"], "cell");
        assert_eq!(info["current_image"], "test.png");

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_save_masks() {
        let output = "TEST_SESSION_SAVE_MASKS";

        let mut session = session_with_image();
        session.predict(&point_prompt(1.0, 1.0), true).unwrap();

        let paths = session.save_masks(output, Some("run")).unwrap();

        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("test.png_run_000.npy"));

        std::fs::remove_dir_all(output).unwrap();
    }
}
