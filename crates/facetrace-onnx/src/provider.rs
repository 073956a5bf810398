//! Wires the SCRFD detector and ArcFace recognizer behind the core
//! [`EmbeddingProvider`] trait.

use std::path::Path;

use facetrace_core::{Detection, EmbeddingProvider, FaceRegion, ProviderError};
use image::RgbImage;
use thiserror::Error;

use crate::detector::{DetectorError, FaceBox, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};

const DETECTOR_MODEL: &str = "det_10g.onnx";
const RECOGNIZER_MODEL: &str = "w600k_r50.onnx";

/// Startup failures: model files missing or unloadable. Fatal — a provider
/// that cannot load never produces a partial scan.
#[derive(Error, Debug)]
pub enum ProviderInitError {
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
}

/// ONNX-backed face detection + embedding provider.
pub struct OnnxProvider {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxProvider {
    /// Load both models from a directory (fail-fast).
    pub fn load(model_dir: &Path) -> Result<Self, ProviderInitError> {
        let detector = FaceDetector::load(&model_dir.join(DETECTOR_MODEL))?;
        let recognizer = FaceRecognizer::load(&model_dir.join(RECOGNIZER_MODEL))?;
        Ok(Self { detector, recognizer })
    }
}

impl EmbeddingProvider for OnnxProvider {
    /// Detect every face in the image and extract an embedding for each,
    /// in detector order (highest score first). No faces is an empty
    /// result, not an error.
    fn detect_and_encode(&mut self, image: &RgbImage) -> Result<Vec<Detection>, ProviderError> {
        let faces = self
            .detector
            .detect(image)
            .map_err(|e| ProviderError::Inference(e.to_string()))?;

        let mut detections = Vec::with_capacity(faces.len());
        for face in &faces {
            let embedding = self
                .recognizer
                .extract(image, face)
                .map_err(|e| ProviderError::Inference(e.to_string()))?;
            detections.push(Detection {
                region: clamp_region(face, image),
                embedding,
            });
        }

        tracing::debug!(faces = detections.len(), "image encoded");
        Ok(detections)
    }
}

/// Convert a detector box to a (top, right, bottom, left) pixel region
/// clamped to the image bounds.
fn clamp_region(face: &FaceBox, image: &RgbImage) -> FaceRegion {
    let (width, height) = image.dimensions();
    let clamp = |v: f32, max: u32| v.round().clamp(0.0, max as f32) as u32;
    FaceRegion {
        top: clamp(face.y1, height),
        right: clamp(face.x2, width),
        bottom: clamp(face.y2, height),
        left: clamp(face.x1, width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn face(x1: f32, y1: f32, x2: f32, y2: f32) -> FaceBox {
        FaceBox { x1, y1, x2, y2, score: 0.9, landmarks: [(0.0, 0.0); 5] }
    }

    #[test]
    fn test_clamp_region_inside_bounds() {
        let image = RgbImage::from_pixel(640, 480, Rgb([0, 0, 0]));
        let region = clamp_region(&face(10.4, 20.6, 100.0, 200.0), &image);
        assert_eq!(region.left, 10);
        assert_eq!(region.top, 21);
        assert_eq!(region.right, 100);
        assert_eq!(region.bottom, 200);
    }

    #[test]
    fn test_clamp_region_overflowing_box() {
        let image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let region = clamp_region(&face(-15.0, -3.0, 250.0, 120.0), &image);
        assert_eq!(region.left, 0);
        assert_eq!(region.top, 0);
        assert_eq!(region.right, 100);
        assert_eq!(region.bottom, 100);
    }
}
