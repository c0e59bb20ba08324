// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;
use std::thread::JoinHandle;

use sage_core::error::SageError;

use crate::device::Device;
use crate::sam::SamPredictor;

/// Loads a segmentation model on a background thread.
///
/// Only one load runs at a time: calling `start` while a load is in
/// flight (or finished but not yet collected) is a no-op. The loaded
/// predictor is collected exactly once with `take`.
#[derive(Default)]
pub struct ModelLoader {
    handle: Option<JoinHandle<Result<SamPredictor, SageError>>>,
}

impl ModelLoader {
    pub fn new() -> Self {
        ModelLoader { handle: None }
    }

    /// Begin loading a model in the background
    ///
    /// # Arguments
    ///
    /// * `encoder` - Path to the image encoder .onnx file
    /// * `decoder` - Path to the mask decoder .onnx file
    /// * `device` - Requested compute device
    /// * `verbose` - Print progress messages
    pub fn start(&mut self, encoder: PathBuf, decoder: PathBuf, device: Device, verbose: bool) {
        if self.handle.is_some() {
            return;
        }

        self.handle = Some(std::thread::spawn(move || {
            SamPredictor::load(encoder, decoder, device, verbose)
        }));
    }

    /// Check whether a load is currently running
    pub fn is_loading(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Collect the loaded predictor, waiting for the load to finish.
    ///
    /// Returns `None` when no load was started.
    pub fn take(&mut self) -> Option<Result<SamPredictor, SageError>> {
        let handle = self.handle.take()?;

        match handle.join() {
            Ok(result) => Some(result),
            Err(_) => Some(Err(SageError::ModelError(
                "Model loading thread panicked".to_string(),
            ))),
        }
    }
}
