//! Shared error types for the HEIC merge pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeicMergeError {
    #[error("Source format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("HEIF library error: {0}")]
    HeifError(#[from] libheif_rs::HeifError),
}

pub type Result<T> = std::result::Result<T, HeicMergeError>;
