//! Tauri commands for the plugin: the two recognition operations.
//!
//! Each command resolves with exactly one terminal result. The blocking
//! engine invocation runs in spawn_blocking so the command thread does not
//! stall while the helper process executes.

use std::sync::Arc;

use tauri::State;

use crate::engine::VisionEngine;
use crate::error::{FailurePayload, RecognitionError};
use crate::recognizer::{ImageTextRecognizer, TextRecord};

/// Recognizer shared across commands. The engine holds no per-request
/// state, so concurrent requests interleave freely.
pub struct RecognizerState(pub(crate) Arc<ImageTextRecognizer<VisionEngine>>);

/// Recognizes text in the image at `image_path`. Boxes are normalized
/// [0, 1] with a bottom-left origin.
#[tauri::command]
pub async fn recognize_text(
    state: State<'_, RecognizerState>,
    image_path: Option<String>,
) -> Result<Vec<TextRecord>, FailurePayload> {
    let Some(path) = image_path else {
        return Err(RecognitionError::InvalidArguments.to_payload());
    };
    let recognizer = state.0.clone();
    run_blocking(move || recognizer.recognize_text(&path)).await
}

/// Recognizes text in the image at `image_path`. Boxes are in pixel units
/// with a top-left origin, derived from the image's own dimensions.
#[tauri::command]
pub async fn recognize_text_with_position(
    state: State<'_, RecognizerState>,
    image_path: Option<String>,
) -> Result<Vec<TextRecord>, FailurePayload> {
    let Some(path) = image_path else {
        return Err(RecognitionError::InvalidArguments.to_payload());
    };
    let recognizer = state.0.clone();
    run_blocking(move || recognizer.recognize_text_with_position(&path)).await
}

async fn run_blocking(
    run: impl FnOnce() -> Result<Vec<TextRecord>, RecognitionError> + Send + 'static,
) -> Result<Vec<TextRecord>, FailurePayload> {
    tauri::async_runtime::spawn_blocking(run)
        .await
        .map_err(|e| {
            RecognitionError::OcrException(format!("recognition task failed: {e}")).to_payload()
        })?
        .map_err(|e| e.to_payload())
}
