//! Failure taxonomy for recognition requests.
//!
//! Every failure is terminal: it is detected, converted into a
//! [`FailurePayload`], and delivered on the same channel as the request.
//! Nothing is retried and nothing propagates past the plugin boundary as an
//! unhandled fault.

use serde::Serialize;
use thiserror::Error;

/// Terminal failure for a single recognition request.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Caller contract violation: the argument map or `imagePath` is missing
    /// or not a string. Raised before any filesystem or engine access.
    #[error("Missing imagePath")]
    InvalidArguments,
    /// No file exists at the supplied path.
    #[error("File does not exist: {0}")]
    FileNotFound(String),
    /// The file exists but could not be opened or read.
    #[error("Cannot read file: {0}")]
    FileReadError(String),
    /// Pixel dimensions could not be obtained from the image metadata.
    #[error("Failed to get image dimensions")]
    ImageInfoError(Option<String>),
    /// The engine ran but reported an error or returned an unusable result.
    #[error("Failed to recognize text")]
    OcrFailed(Option<String>),
    /// Submitting the image to the engine failed outright.
    #[error("Failed to process image: {0}")]
    OcrException(String),
}

impl RecognitionError {
    /// Wire code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::FileReadError(_) => "FILE_READ_ERROR",
            Self::ImageInfoError(_) => "IMAGE_INFO_ERROR",
            Self::OcrFailed(_) => "OCR_FAILED",
            Self::OcrException(_) => "OCR_EXCEPTION",
        }
    }

    /// Fixed human-readable message for this failure.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidArguments => "Missing imagePath",
            Self::FileNotFound(_) => "File does not exist",
            Self::FileReadError(_) => "Cannot read file",
            Self::ImageInfoError(_) => "Failed to get image dimensions",
            Self::OcrFailed(_) => "Failed to recognize text",
            Self::OcrException(_) => "Failed to process image",
        }
    }

    /// Optional details: the offending path or the underlying error
    /// description.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::InvalidArguments => None,
            Self::FileNotFound(path) => Some(path),
            Self::FileReadError(detail) | Self::OcrException(detail) => Some(detail),
            Self::ImageInfoError(detail) | Self::OcrFailed(detail) => detail.as_deref(),
        }
    }

    pub fn to_payload(&self) -> FailurePayload {
        FailurePayload {
            code: self.code().to_string(),
            message: self.message().to_string(),
            details: self.details().map(|d| d.to_string()),
        }
    }
}

/// Serialized failure form carried back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailurePayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
