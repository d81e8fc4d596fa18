//! macOS engine backed by the Vision framework via a bundled Swift helper.
//!
//! The helper source is embedded in the crate and written to a temp file per
//! call, so the plugin needs no install step. It prints one JSON object with
//! an `observations` array; exit code 2 means the image could not be
//! submitted to Vision, 3 means recognition itself failed.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use super::{EngineConfig, EngineError, NormalizedBox, Observation, TextRecognitionEngine};

const HELPER_SOURCE: &str = include_str!("../../swift/recognize_text.swift");

const EXIT_SUBMIT_FAILED: i32 = 2;

pub struct VisionEngine;

impl VisionEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognitionEngine for VisionEngine {
    fn recognize(
        &self,
        image: &Path,
        config: &EngineConfig,
    ) -> Result<Vec<Observation>, EngineError> {
        let script = materialize_helper()?;
        debug!(
            script = %script.display(),
            image = %image.display(),
            languages = %config.languages.join(","),
            level = config.level.as_str(),
            "Running Vision helper"
        );

        let output = Command::new("swift")
            .arg(&script)
            .arg(image)
            .arg("--languages")
            .arg(config.languages.join(","))
            .arg("--level")
            .arg(config.level.as_str())
            .output()
            .map_err(|e| EngineError::Submit(format!("failed to execute swift helper: {e}")));

        if let Err(e) = fs::remove_file(&script) {
            warn!(error = %e, path = %script.display(), "Failed to remove helper script");
        }
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = (!stderr.is_empty()).then_some(stderr);
            return if output.status.code() == Some(EXIT_SUBMIT_FAILED) {
                Err(EngineError::Submit(detail.unwrap_or_else(|| {
                    "image could not be submitted to Vision".to_string()
                })))
            } else {
                Err(EngineError::Recognition(detail))
            };
        }

        parse_observations(&output.stdout)
    }
}

/// Writes the embedded helper to a unique temp path for one invocation.
fn materialize_helper() -> Result<PathBuf, EngineError> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| EngineError::Submit(format!("failed to get timestamp: {e}")))?
        .as_nanos();
    let path = env::temp_dir().join(format!("vision-ocr-helper-{nanos}.swift"));
    fs::write(&path, HELPER_SOURCE)
        .map_err(|e| EngineError::Submit(format!("failed to write helper script: {e}")))?;
    Ok(path)
}

fn parse_observations(stdout: &[u8]) -> Result<Vec<Observation>, EngineError> {
    let json: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| EngineError::Recognition(Some(format!("invalid helper output: {e}"))))?;

    let items = json
        .get("observations")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            EngineError::Recognition(Some(
                "helper output missing 'observations' array".to_string(),
            ))
        })?;

    let mut observations = Vec::with_capacity(items.len());
    for item in items {
        let candidate = item
            .get("text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        // Vision reports normalized coordinates; clamp to be safe.
        let x = coord(item, "x");
        let y = coord(item, "y");
        let width = coord(item, "width").min(1.0 - x);
        let height = coord(item, "height").min(1.0 - y);

        observations.push(Observation {
            candidate,
            bounding_box: NormalizedBox {
                x,
                y,
                width,
                height,
            },
        });
    }

    Ok(observations)
}

fn coord(item: &serde_json::Value, key: &str) -> f64 {
    item.get(key)
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_observations() {
        let stdout = br#"{"observations": [
            {"text": "hello", "x": 0.1, "y": 0.8, "width": 0.2, "height": 0.05},
            {"x": 0.5, "y": 0.5, "width": 0.1, "height": 0.1}
        ]}"#;
        let observations = parse_observations(stdout).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].candidate.as_deref(), Some("hello"));
        assert!((observations[0].bounding_box.x - 0.1).abs() < 1e-9);
        assert!(observations[1].candidate.is_none());
    }

    #[test]
    fn test_parse_observations_rejects_wrong_shape() {
        assert!(matches!(
            parse_observations(b"[]"),
            Err(EngineError::Recognition(Some(_)))
        ));
        assert!(matches!(
            parse_observations(b"not json"),
            Err(EngineError::Recognition(Some(_)))
        ));
    }

    #[test]
    fn test_coordinates_clamped() {
        let stdout = br#"{"observations": [
            {"text": "t", "x": -0.5, "y": 0.9, "width": 2.0, "height": 0.3}
        ]}"#;
        let observations = parse_observations(stdout).unwrap();
        let b = observations[0].bounding_box;
        assert_eq!(b.x, 0.0);
        assert!(b.width <= 1.0 - b.x);
        assert!(b.height <= 1.0 - b.y + 1e-9);
    }
}
