// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

pub mod device;
pub mod loader;
pub mod preprocess;
pub mod sam;
pub mod session;

pub use device::Device;
pub use loader::ModelLoader;
pub use sam::{ImageEmbedding, Prediction, SamPredictor};
pub use session::{AnnotationSession, MaskPredictor, SessionState};
