// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::fmt;

#[derive(Debug, Clone)]
pub enum SageError {
    BufferSizeError,
    ChannelBoundsError,
    ImageError(&'static str),
    ImageReadError,
    ImageWriteError,
    ImageExtensionError,
    MaskError(&'static str),
    PromptError(&'static str),
    LabelError(String),
    SessionError(&'static str),
    ModelError(String),
    NoFileError(String),
    DirError(String),
    OtherError(String),
}

impl fmt::Display for SageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SageError::BufferSizeError => {
                write!(
                    f,
                    "[sage::BufferSizeError] The buffer does not match provided size"
                )
            }
            SageError::ChannelBoundsError => {
                write!(
                    f,
                    "[sage::ChannelBoundsError] The indexed channel is out of bounds."
                )
            }
            SageError::ImageError(message) => {
                write!(f, "[sage::ImageError] Failed to create image. {}", message)
            }
            SageError::ImageReadError => {
                write!(f, "[sage::ImageReadError] Failed to read image.")
            }
            SageError::ImageWriteError => {
                write!(f, "[sage::ImageWriteError] Failed to write image.")
            }
            SageError::ImageExtensionError => {
                write!(
                    f,
                    "[sage::ImageExtensionError] Could not detect a valid image extension for input."
                )
            }
            SageError::MaskError(message) => {
                write!(f, "[sage::MaskError] Failed to create mask. {}", message)
            }
            SageError::PromptError(message) => {
                write!(f, "[sage::PromptError] Invalid prompt. {}", message)
            }
            SageError::LabelError(message) => {
                write!(f, "[sage::LabelError] Label operation failed. {}", message)
            }
            SageError::SessionError(message) => {
                write!(f, "[sage::SessionError] {}", message)
            }
            SageError::ModelError(message) => {
                write!(f, "[sage::ModelError] {}", message)
            }
            SageError::NoFileError(message) => {
                write!(
                    f,
                    "[sage::NoFileError] File could not be found. {}.",
                    message
                )
            }
            SageError::DirError(message) => {
                write!(
                    f,
                    "[sage::DirError] Directory could not be read. {}.",
                    message
                )
            }
            SageError::OtherError(message) => {
                write!(f, "[sage::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for SageError {}
