//! Image text recognizer: turns one (path, mode) pair into an ordered list
//! of text records or one typed failure.
//!
//! Per request the flow is linear: validate the path, read what the mode
//! needs (readability probe or pixel dimensions), invoke the engine with the
//! fixed configuration, map observations to records. Any failure
//! short-circuits into a terminal [`RecognitionError`]; there is no retry and
//! no shared state across requests.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{
    EngineConfig, EngineError, NormalizedBox, Observation, TextRecognitionEngine, ENGINE_CONFIG,
};
use crate::error::RecognitionError;

/// One recognized line with its bounding box.
///
/// Geometry is either normalized [0, 1] with a bottom-left origin
/// ([`ImageTextRecognizer::recognize_text`]) or pixel units with a top-left
/// origin ([`ImageTextRecognizer::recognize_text_with_position`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pixel dimensions read from the image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

pub struct ImageTextRecognizer<E> {
    engine: E,
    config: EngineConfig,
}

impl<E: TextRecognitionEngine> ImageTextRecognizer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: ENGINE_CONFIG,
        }
    }

    /// Recognizes text in the image at `image_path`, returning boxes in the
    /// engine's normalized bottom-left space.
    pub fn recognize_text(&self, image_path: &str) -> Result<Vec<TextRecord>, RecognitionError> {
        let path = Path::new(image_path);
        ensure_exists(path, image_path)?;
        probe_readable(path)?;

        let observations = self.run_engine(path)?;
        let records = map_observations(observations, |b| (b.x, b.y, b.width, b.height));
        info!(records = records.len(), "Recognition finished");
        Ok(records)
    }

    /// Recognizes text and converts each box to pixel units with a top-left
    /// origin, using the image's own pixel dimensions.
    pub fn recognize_text_with_position(
        &self,
        image_path: &str,
    ) -> Result<Vec<TextRecord>, RecognitionError> {
        let path = Path::new(image_path);
        ensure_exists(path, image_path)?;
        let dims = read_dimensions(path)?;

        let observations = self.run_engine(path)?;
        let records = map_observations(observations, |b| to_pixel_top_left(b, dims));
        info!(
            records = records.len(),
            width = dims.width,
            height = dims.height,
            "Recognition with positions finished"
        );
        Ok(records)
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    fn run_engine(&self, path: &Path) -> Result<Vec<Observation>, RecognitionError> {
        self.engine
            .recognize(path, &self.config)
            .map_err(|e| match e {
                EngineError::Recognition(detail) => RecognitionError::OcrFailed(detail),
                EngineError::Submit(detail) => RecognitionError::OcrException(detail),
            })
    }
}

/// Keeps only observations with a top candidate, in engine order, applying
/// `geometry` to each box.
fn map_observations(
    observations: Vec<Observation>,
    geometry: impl Fn(NormalizedBox) -> (f64, f64, f64, f64),
) -> Vec<TextRecord> {
    observations
        .into_iter()
        .filter_map(|observation| {
            let text = observation.candidate?;
            let (x, y, width, height) = geometry(observation.bounding_box);
            Some(TextRecord {
                text,
                x,
                y,
                width,
                height,
            })
        })
        .collect()
}

/// Converts a normalized bottom-left box to pixel units with a top-left
/// origin. The vertical flip is `(1 - y - height) * H`; getting it wrong
/// silently inverts every box.
fn to_pixel_top_left(b: NormalizedBox, dims: ImageDimensions) -> (f64, f64, f64, f64) {
    let w = f64::from(dims.width);
    let h = f64::from(dims.height);
    (b.x * w, (1.0 - b.y - b.height) * h, b.width * w, b.height * h)
}

fn ensure_exists(path: &Path, raw: &str) -> Result<(), RecognitionError> {
    if !path.exists() {
        return Err(RecognitionError::FileNotFound(raw.to_string()));
    }
    Ok(())
}

/// Best-effort readability check: opens the file and reads a small prefix
/// rather than the whole thing.
fn probe_readable(path: &Path) -> Result<(), RecognitionError> {
    let mut file =
        File::open(path).map_err(|e| RecognitionError::FileReadError(e.to_string()))?;
    let mut probe = [0u8; 16];
    let read = file
        .read(&mut probe)
        .map_err(|e| RecognitionError::FileReadError(e.to_string()))?;
    debug!(path = %path.display(), probe_bytes = read, "File is readable");
    Ok(())
}

/// Reads pixel dimensions from the image header without decoding the pixels.
fn read_dimensions(path: &Path) -> Result<ImageDimensions, RecognitionError> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| RecognitionError::ImageInfoError(Some(e.to_string())))?
        .with_guessed_format()
        .map_err(|e| RecognitionError::ImageInfoError(Some(e.to_string())))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| RecognitionError::ImageInfoError(Some(e.to_string())))?;
    if width == 0 || height == 0 {
        return Err(RecognitionError::ImageInfoError(None));
    }
    debug!(width, height, "Image dimensions read");
    Ok(ImageDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Behavior, FakeEngine};
    use crate::engine::RecognitionLevel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn observation(text: Option<&str>, x: f64, y: f64, width: f64, height: f64) -> Observation {
        Observation {
            candidate: text.map(|s| s.to_string()),
            bounding_box: NormalizedBox {
                x,
                y,
                width,
                height,
            },
        }
    }

    fn fixture_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"fixture bytes").unwrap();
        file
    }

    fn fixture_png(width: u32, height: u32) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        image::RgbaImage::new(width, height)
            .save_with_format(file.path(), image::ImageFormat::Png)
            .unwrap();
        file
    }

    #[test]
    fn test_missing_file_reported_with_path() {
        init_tracing();
        let engine = FakeEngine::with_observations(vec![]);
        let recognizer = ImageTextRecognizer::new(engine);

        let err = recognizer
            .recognize_text("/definitely/not/here.png")
            .unwrap_err();
        assert!(matches!(err, RecognitionError::FileNotFound(ref p) if p == "/definitely/not/here.png"));
        assert_eq!(recognizer.engine.call_count(), 0);

        let err = recognizer
            .recognize_text_with_position("/definitely/not/here.png")
            .unwrap_err();
        assert!(matches!(err, RecognitionError::FileNotFound(_)));
        assert_eq!(recognizer.engine.call_count(), 0);
    }

    #[test]
    fn test_normalized_geometry_passes_through() {
        let file = fixture_file();
        let engine = FakeEngine::with_observations(vec![observation(
            Some("hello"),
            0.1,
            0.8,
            0.2,
            0.05,
        )]);
        let recognizer = ImageTextRecognizer::new(engine);

        let records = recognizer
            .recognize_text(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "hello");
        assert!((records[0].x - 0.1).abs() < 1e-9);
        assert!((records[0].y - 0.8).abs() < 1e-9);
        assert!((records[0].width - 0.2).abs() < 1e-9);
        assert!((records[0].height - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_geometry_conversion() {
        init_tracing();
        let file = fixture_png(1000, 500);
        let engine = FakeEngine::with_observations(vec![observation(
            Some("line"),
            0.1,
            0.8,
            0.2,
            0.05,
        )]);
        let recognizer = ImageTextRecognizer::new(engine);

        let records = recognizer
            .recognize_text_with_position(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!((records[0].x - 100.0).abs() < 1e-6);
        assert!((records[0].y - 75.0).abs() < 1e-6);
        assert!((records[0].width - 200.0).abs() < 1e-6);
        assert!((records[0].height - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_conversion_law() {
        let dims = ImageDimensions {
            width: 640,
            height: 480,
        };
        let boxes = [
            (0.0, 0.0, 1.0, 1.0),
            (0.25, 0.5, 0.5, 0.25),
            (0.9, 0.05, 0.05, 0.9),
        ];
        for (nx, ny, nw, nh) in boxes {
            let (x, y, w, h) = to_pixel_top_left(
                NormalizedBox {
                    x: nx,
                    y: ny,
                    width: nw,
                    height: nh,
                },
                dims,
            );
            let rel = |a: f64, b: f64| (a - b).abs() <= 1e-6 * b.abs().max(1.0);
            assert!(rel(x, nx * 640.0));
            assert!(rel(y, (1.0 - ny - nh) * 480.0));
            assert!(rel(w, nw * 640.0));
            assert!(rel(h, nh * 480.0));
            assert!(w >= 0.0 && h >= 0.0);
        }
    }

    #[test]
    fn test_observations_without_candidate_are_skipped() {
        let file = fixture_file();
        let engine = FakeEngine::with_observations(vec![
            observation(Some("first"), 0.0, 0.0, 0.1, 0.1),
            observation(None, 0.2, 0.2, 0.1, 0.1),
            observation(Some("second"), 0.4, 0.4, 0.1, 0.1),
        ]);
        let recognizer = ImageTextRecognizer::new(engine);

        let records = recognizer
            .recognize_text(file.path().to_str().unwrap())
            .unwrap();
        let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn test_empty_observation_list_is_success() {
        let file = fixture_file();
        let recognizer = ImageTextRecognizer::new(FakeEngine::with_observations(vec![]));
        let records = recognizer
            .recognize_text(file.path().to_str().unwrap())
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_engine_errors_map_to_codes() {
        let file = fixture_file();
        let path = file.path().to_str().unwrap().to_string();

        let recognizer = ImageTextRecognizer::new(FakeEngine::new(Behavior::FailRecognition(
            Some("engine said no".to_string()),
        )));
        let err = recognizer.recognize_text(&path).unwrap_err();
        assert!(matches!(err, RecognitionError::OcrFailed(Some(ref d)) if d == "engine said no"));

        let recognizer = ImageTextRecognizer::new(FakeEngine::new(Behavior::FailSubmit(
            "bad image".to_string(),
        )));
        let err = recognizer.recognize_text(&path).unwrap_err();
        assert!(matches!(err, RecognitionError::OcrException(ref d) if d == "bad image"));
    }

    #[test]
    fn test_directory_path_fails_before_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap().to_string();
        let recognizer = ImageTextRecognizer::new(FakeEngine::with_observations(vec![]));

        // A directory passes the existence check; the readability probe then
        // fails with the OS description.
        let err = recognizer.recognize_text(&path).unwrap_err();
        assert!(matches!(err, RecognitionError::FileReadError(ref d) if !d.is_empty()));
        assert_eq!(recognizer.engine.call_count(), 0);

        let err = recognizer.recognize_text_with_position(&path).unwrap_err();
        assert!(matches!(err, RecognitionError::ImageInfoError(_)));
        assert_eq!(recognizer.engine.call_count(), 0);
    }

    #[test]
    fn test_undecodable_image_in_pixel_mode() {
        let file = fixture_file();
        let recognizer = ImageTextRecognizer::new(FakeEngine::with_observations(vec![]));
        let err = recognizer
            .recognize_text_with_position(file.path().to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, RecognitionError::ImageInfoError(_)));
        assert_eq!(recognizer.engine.call_count(), 0);
    }

    #[test]
    fn test_engine_receives_fixed_config() {
        let file = fixture_file();
        let recognizer = ImageTextRecognizer::new(FakeEngine::with_observations(vec![]));
        recognizer
            .recognize_text(file.path().to_str().unwrap())
            .unwrap();

        let (languages, level) = recognizer.engine.seen_config().unwrap();
        assert_eq!(languages, ["zh-Hans", "zh-Hant", "en"]);
        assert_eq!(level, RecognitionLevel::Accurate);
    }

    #[test]
    fn test_record_wire_shape() {
        let record = TextRecord {
            text: "你好".to_string(),
            x: 0.1,
            y: 0.8,
            width: 0.2,
            height: 0.05,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["text"], "你好");
        assert_eq!(json["x"], 0.1);

        let decoded: TextRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_repeat_invocations_are_identical() {
        let file = fixture_png(64, 32);
        let engine = FakeEngine::with_observations(vec![
            observation(Some("a"), 0.1, 0.1, 0.3, 0.2),
            observation(Some("b"), 0.5, 0.6, 0.2, 0.1),
        ]);
        let recognizer = ImageTextRecognizer::new(engine);
        let path = file.path().to_str().unwrap();

        let first = recognizer.recognize_text_with_position(path).unwrap();
        let second = recognizer.recognize_text_with_position(path).unwrap();
        assert_eq!(first, second);
    }
}
