//! Text recognition engine seam.
//!
//! All detection is delegated to a native engine behind
//! [`TextRecognitionEngine`]; on macOS that is the Vision framework driven by
//! a bundled Swift helper. The engine reports observations in its own
//! coordinate space: normalized [0, 1] with the origin at the bottom-left.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::VisionEngine;

use std::path::Path;

use thiserror::Error;

/// Recognition quality tier. The plugin always runs `Accurate`: correctness
/// over latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionLevel {
    Fast,
    Accurate,
}

impl RecognitionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Accurate => "accurate",
        }
    }
}

/// Engine configuration, passed explicitly into every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Language preference order handed to the engine.
    pub languages: &'static [&'static str],
    pub level: RecognitionLevel,
}

/// The one configuration the plugin ever uses: Simplified Chinese,
/// Traditional Chinese, then English, at the accurate tier. Fixed for the
/// lifetime of the process and never caller-overridable.
pub const ENGINE_CONFIG: EngineConfig = EngineConfig {
    languages: &["zh-Hans", "zh-Hant", "en"],
    level: RecognitionLevel::Accurate,
};

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine ran but reported an error or produced an unusable result.
    #[error("text recognition failed")]
    Recognition(Option<String>),
    /// The image could not be submitted to the engine at all.
    #[error("failed to process image: {0}")]
    Submit(String),
}

/// Normalized bounding box: [0, 1] coordinates, origin at the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected text region. `candidate` is the engine's top-ranked string;
/// observations without one yield no record.
#[derive(Debug, Clone)]
pub struct Observation {
    pub candidate: Option<String>,
    pub bounding_box: NormalizedBox,
}

/// Seam to the native recognition capability. One call, one ordered
/// observation list or one error; no streaming.
pub trait TextRecognitionEngine {
    fn recognize(
        &self,
        image: &Path,
        config: &EngineConfig,
    ) -> Result<Vec<Observation>, EngineError>;
}

#[cfg(not(target_os = "macos"))]
pub struct VisionEngine;

#[cfg(not(target_os = "macos"))]
impl VisionEngine {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "macos"))]
impl Default for VisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "macos"))]
impl TextRecognitionEngine for VisionEngine {
    fn recognize(
        &self,
        _image: &Path,
        _config: &EngineConfig,
    ) -> Result<Vec<Observation>, EngineError> {
        Err(EngineError::Submit(
            "text recognition is not supported on this platform".to_string(),
        ))
    }
}
