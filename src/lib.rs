//! Tauri plugin exposing macOS Vision text recognition to host applications.
//!
//! Two operations, mirrored as plugin commands and as a method-call
//! dispatcher ([`handle_call`]) for hosts that bridge their own transport:
//!
//! - `recognize_text`: recognized lines with normalized [0, 1] boxes,
//!   origin at the bottom-left (the engine's native space).
//! - `recognize_text_with_position`: the same lines with boxes converted to
//!   pixel units, origin at the top-left.
//!
//! Failures come back as `{code, message, details}` payloads; the codes are
//! `INVALID_ARGUMENTS`, `FILE_NOT_FOUND`, `FILE_READ_ERROR`,
//! `IMAGE_INFO_ERROR`, `OCR_FAILED` and `OCR_EXCEPTION`. The engine always
//! runs with the fixed language preference zh-Hans, zh-Hant, en at the
//! accurate tier.

mod channel;
mod commands;
mod engine;
mod error;
mod recognizer;

pub use channel::{
    handle_call, MethodCall, MethodResponse, METHOD_RECOGNIZE_TEXT,
    METHOD_RECOGNIZE_TEXT_WITH_POSITION,
};
pub use engine::{
    EngineConfig, EngineError, NormalizedBox, Observation, RecognitionLevel,
    TextRecognitionEngine, VisionEngine, ENGINE_CONFIG,
};
pub use error::{FailurePayload, RecognitionError};
pub use recognizer::{ImageDimensions, ImageTextRecognizer, TextRecord};

use std::sync::Arc;

use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

/// Initializes the plugin: one shared recognizer plus the two commands.
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("vision-ocr")
        .invoke_handler(tauri::generate_handler![
            commands::recognize_text,
            commands::recognize_text_with_position
        ])
        .setup(|app, _api| {
            app.manage(commands::RecognizerState(Arc::new(
                ImageTextRecognizer::new(VisionEngine::new()),
            )));
            Ok(())
        })
        .build()
}
