// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::Path;

use ort::execution_providers::{CUDAExecutionProvider, CoreMLExecutionProvider};
use ort::session::{Session, builder::GraphOptimizationLevel};

use sage_core::error::SageError;
use sage_core::ut::track::progress_log;

/// Compute device used for ONNX Runtime inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Auto,
    Cpu,
    Cuda,
    CoreMl,
}

impl Device {
    /// Select a device from its command-line name.
    pub fn select(device_name: &str) -> Self {
        match device_name {
            "auto" => Device::Auto,
            "cpu" => Device::Cpu,
            "cuda" => Device::Cuda,
            "coreml" => Device::CoreMl,
            _ => {
                let msg = format!(
                    "[sage::neural::device] Device {} not found. Available devices include: {}",
                    device_name, "auto, cpu, cuda, coreml."
                );
                eprintln!("{}", msg);
                std::process::exit(1);
            }
        }
    }

    /// Name of the device.
    pub fn name(&self) -> &str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::CoreMl => "coreml",
        }
    }

    /// Resolve Auto to a concrete platform device.
    ///
    /// Auto prefers CoreML on macOS and CUDA elsewhere; either lands on
    /// CPU through the retry-once fallback when unavailable.
    pub fn resolve(&self) -> Device {
        match self {
            Device::Auto => {
                if cfg!(target_os = "macos") {
                    Device::CoreMl
                } else {
                    Device::Cuda
                }
            }
            device => *device,
        }
    }
}

/// Build an ONNX Runtime session for a model on a requested device
///
/// # Arguments
///
/// * `path` - Path to an .onnx model file
/// * `device` - Requested compute device
pub fn build_session<P: AsRef<Path>>(path: P, device: Device) -> Result<Session, SageError> {
    let builder = Session::builder()
        .map_err(|err| SageError::ModelError(err.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|err| SageError::ModelError(err.to_string()))?
        .with_intra_threads(4)
        .map_err(|err| SageError::ModelError(err.to_string()))?;

    let builder = match device.resolve() {
        Device::Cuda => builder
            .with_execution_providers([CUDAExecutionProvider::default().build().error_on_failure()])
            .map_err(|err| SageError::ModelError(err.to_string()))?,
        Device::CoreMl => builder
            .with_execution_providers([
                CoreMLExecutionProvider::default().build().error_on_failure(),
            ])
            .map_err(|err| SageError::ModelError(err.to_string()))?,
        _ => builder,
    };

    builder
        .commit_from_file(path.as_ref())
        .map_err(|err| SageError::ModelError(err.to_string()))
}

/// Build a session, retrying once on CPU if the requested device fails
///
/// Returns the session together with the device it actually landed on.
pub fn build_session_with_fallback<P: AsRef<Path>>(
    path: P,
    device: Device,
    verbose: bool,
) -> Result<(Session, Device), SageError> {
    let resolved = device.resolve();

    match build_session(&path, resolved) {
        Ok(session) => Ok((session, resolved)),
        Err(err) if resolved != Device::Cpu => {
            progress_log(
                format!("Device {} unavailable, falling back to CPU", resolved.name()).as_str(),
                verbose,
            );

            let session = build_session(&path, Device::Cpu).map_err(|cpu_err| {
                SageError::ModelError(format!(
                    "Failed on {} ({}) and on CPU ({})",
                    resolved.name(),
                    err,
                    cpu_err
                ))
            })?;

            Ok((session, Device::Cpu))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_device_select() {
        assert_eq!(Device::select("cpu"), Device::Cpu);
        assert_eq!(Device::select("cuda"), Device::Cuda);
    }

    #[test]
    fn test_device_resolve_concrete() {
        assert_eq!(Device::Cpu.resolve(), Device::Cpu);
        assert_eq!(Device::Cuda.resolve(), Device::Cuda);
    }

    #[test]
    fn test_device_resolve_auto() {
        let resolved = Device::Auto.resolve();
        assert_ne!(resolved, Device::Auto);
    }

    #[test]
    fn test_build_session_missing_file() {
        assert!(build_session("MISSING_MODEL.onnx", Device::Cpu).is_err());
    }

    #[test]
    fn test_build_session_fallback_missing_file() {
        // A missing file fails on every device, including the CPU retry
        assert!(build_session_with_fallback("MISSING_MODEL.onnx", Device::Cuda, false).is_err());
    }
}
