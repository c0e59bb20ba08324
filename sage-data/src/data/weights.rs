// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use crate::get_sage_cache;
use crate::request;

/// Available pre-trained model weights in the sage library.
pub enum Weights {
    MobileSamEncoder,
    MobileSamDecoder,
}

impl Weights {
    /// Select a weights from the available weights.
    pub fn select(weights_name: &str) -> Self {
        match weights_name {
            "mobile_sam_encoder" => Weights::MobileSamEncoder,
            "mobile_sam_decoder" => Weights::MobileSamDecoder,
            _ => {
                let msg = format!(
                    "[sage::data::weights] Weights {} not found. Available weights include: {}",
                    weights_name, "mobile_sam_encoder, mobile_sam_decoder."
                );
                eprintln!("{}", msg);
                std::process::exit(1);
            }
        }
    }

    /// Return an iterator over the enum members.
    pub fn iter() -> impl Iterator<Item = &'static Weights> {
        static WEIGHTS: [Weights; 2] = [Weights::MobileSamEncoder, Weights::MobileSamDecoder];

        WEIGHTS.iter()
    }

    /// Get the name of the model.
    pub fn model_name(&self) -> &str {
        match self {
            Weights::MobileSamEncoder => "mobile_sam_encoder",
            Weights::MobileSamDecoder => "mobile_sam_decoder",
        }
    }

    /// Get the file name of the cached ONNX model.
    fn file_name(&self) -> &str {
        match self {
            Weights::MobileSamEncoder => "mobile_sam.encoder.onnx",
            Weights::MobileSamDecoder => "mobile_sam.decoder.onnx",
        }
    }

    /// Get the direct download URL for the saved model.
    pub fn url(&self) -> &str {
        match self {
            Weights::MobileSamEncoder => {
                "https://huggingface.co/vietanhdev/segment-anything-onnx-models/resolve/main/mobile_sam.encoder.onnx"
            }
            Weights::MobileSamDecoder => {
                "https://huggingface.co/vietanhdev/segment-anything-onnx-models/resolve/main/mobile_sam.decoder.onnx"
            }
        }
    }

    /// Get the usage license for a model.
    pub fn license(&self) -> &str {
        match self {
            Weights::MobileSamEncoder => "Apache License 2.0",
            Weights::MobileSamDecoder => "Apache License 2.0",
        }
    }

    /// Get the authors of the model weights.
    pub fn data_authors(&self) -> &str {
        match self {
            Weights::MobileSamEncoder => "Kyung Hee University (MobileSAM)",
            Weights::MobileSamDecoder => "Kyung Hee University (MobileSAM)",
        }
    }

    /// Get the size of the model in GB.
    pub fn data_size(&self) -> &str {
        match self {
            Weights::MobileSamEncoder => "0.028",
            Weights::MobileSamDecoder => "0.017",
        }
    }

    /// Download the model to the sage cache.
    pub fn download(&self, verbose: bool) {
        let cache = get_sage_cache();
        let model_name = cache.join(self.file_name());
        if !model_name.exists() {
            request::download_file(self.url(), cache.as_path(), self.file_name(), !verbose)
                .unwrap();

            if !model_name.exists() {
                eprintln!("[sage::data::weights] Failed to download model weights.");
                std::process::exit(1);
            }
        }
    }

    /// Get path to model weights.
    pub fn path(&self) -> std::path::PathBuf {
        let cache = get_sage_cache();
        cache.join(self.file_name())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_weights_select() {
        let weights = Weights::select("mobile_sam_encoder");
        assert_eq!(weights.model_name(), "mobile_sam_encoder");
    }

    #[test]
    fn test_weights_iter() {
        assert_eq!(Weights::iter().count(), 2);
    }

    #[test]
    fn test_weights_path_in_cache() {
        let path = Weights::MobileSamDecoder.path();
        assert!(path.ends_with("mobile_sam.decoder.onnx"));
    }
}
