//! Method-call dispatch for the plugin's wire contract.
//!
//! This is the framework-agnostic mirror of the command surface: two named
//! methods, a typed failure payload, and a distinct "not implemented"
//! response for anything else. Host code that carries requests over its own
//! transport (IPC bridge, socket) can decode them into [`MethodCall`] and
//! feed them straight into [`handle_call`].

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::TextRecognitionEngine;
use crate::error::{FailurePayload, RecognitionError};
use crate::recognizer::{ImageTextRecognizer, TextRecord};

pub const METHOD_RECOGNIZE_TEXT: &str = "recognizeText";
pub const METHOD_RECOGNIZE_TEXT_WITH_POSITION: &str = "recognizeTextWithPosition";

/// One decoded request: a method name and an optional argument map.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Option<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: Option<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Terminal response to one [`MethodCall`]. Exactly one is produced per
/// call; failures are payloads, unknown methods are not.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Vec<TextRecord>),
    Failure(FailurePayload),
    NotImplemented,
}

/// Dispatches one call to the recognizer and converts the outcome into the
/// wire response.
pub fn handle_call<E: TextRecognitionEngine>(
    recognizer: &ImageTextRecognizer<E>,
    call: &MethodCall,
) -> MethodResponse {
    match call.method.as_str() {
        METHOD_RECOGNIZE_TEXT => dispatch(call, |path| recognizer.recognize_text(path)),
        METHOD_RECOGNIZE_TEXT_WITH_POSITION => {
            dispatch(call, |path| recognizer.recognize_text_with_position(path))
        }
        other => {
            debug!(method = %other, "Method not implemented");
            MethodResponse::NotImplemented
        }
    }
}

fn dispatch(
    call: &MethodCall,
    run: impl FnOnce(&str) -> Result<Vec<TextRecord>, RecognitionError>,
) -> MethodResponse {
    // Argument validation happens before any filesystem or engine access.
    let Some(path) = image_path_arg(call.args.as_ref()) else {
        warn!(method = %call.method, "Call is missing a string imagePath argument");
        return MethodResponse::Failure(RecognitionError::InvalidArguments.to_payload());
    };
    match run(path) {
        Ok(records) => MethodResponse::Success(records),
        Err(err) => MethodResponse::Failure(err.to_payload()),
    }
}

fn image_path_arg(args: Option<&Value>) -> Option<&str> {
    args?.as_object()?.get("imagePath")?.as_str()
}
