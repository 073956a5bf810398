//! ArcFace face recognizer via ONNX Runtime.
//!
//! Produces 512-dimensional, L2-normalized embeddings from aligned RGB face
//! crops (w600k_r50 model).

use facetrace_core::Embedding;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

use crate::alignment::{self, ALIGNED_SIZE};
use crate::detector::FaceBox;

const PIXEL_MEAN: f32 = 127.5;
const PIXEL_STD: f32 = 127.5; // symmetric normalization, unlike SCRFD's 128.0
const EMBEDDING_DIM: usize = 512;
const MODEL_VERSION: &str = "w600k_r50";

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("model file not found: {0} — download from insightface and place in the model dir")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

pub struct FaceRecognizer {
    session: Session,
}

impl FaceRecognizer {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, RecognizerError> {
        if !model_path.exists() {
            return Err(RecognizerError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)
            .map_err(ort::Error::from)?
            .commit_from_file(model_path)?;

        tracing::info!(path = %model_path.display(), "loaded ArcFace model");
        Ok(Self { session })
    }

    /// Extract an embedding for one detected face.
    ///
    /// The face is warped to the canonical 112×112 position from its
    /// landmarks before inference; the result is L2-normalized so Euclidean
    /// distances between embeddings are comparable across runs.
    pub fn extract(&mut self, image: &RgbImage, face: &FaceBox) -> Result<Embedding, RecognizerError> {
        let aligned = alignment::align_face(image, &face.landmarks);
        let input = preprocess(&aligned);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RecognizerError::InferenceFailed(format!("embedding extraction: {e}")))?;

        if raw.len() != EMBEDDING_DIM {
            return Err(RecognizerError::InferenceFailed(format!(
                "expected {EMBEDDING_DIM}-dim embedding, got {}",
                raw.len()
            )));
        }

        let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        let values = if norm > 0.0 {
            raw.iter().map(|x| x / norm).collect()
        } else {
            raw.to_vec()
        };

        Ok(Embedding {
            values,
            model_version: Some(MODEL_VERSION.to_string()),
        })
    }
}

/// Convert an aligned 112×112 RGB crop into a normalized NCHW tensor.
fn preprocess(aligned: &RgbImage) -> Array4<f32> {
    let size = ALIGNED_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in aligned.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - PIXEL_MEAN) / PIXEL_STD;
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_preprocess_shape() {
        let aligned = RgbImage::from_pixel(ALIGNED_SIZE, ALIGNED_SIZE, Rgb([128, 128, 128]));
        let tensor = preprocess(&aligned);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_normalization_range() {
        // 0 maps to -1, 255 maps to +1.
        let mut aligned = RgbImage::from_pixel(ALIGNED_SIZE, ALIGNED_SIZE, Rgb([0, 0, 0]));
        aligned.put_pixel(5, 5, Rgb([255, 255, 255]));
        let tensor = preprocess(&aligned);
        assert!((tensor[[0, 0, 0, 0]] + 1.0).abs() < 1e-6);
        assert!((tensor[[0, 0, 5, 5]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_keeps_channels_distinct() {
        // Unlike a grayscale pipeline, the three channels carry real color.
        let aligned = RgbImage::from_pixel(ALIGNED_SIZE, ALIGNED_SIZE, Rgb([255, 0, 128]));
        let tensor = preprocess(&aligned);
        assert!((tensor[[0, 0, 10, 10]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 10, 10]] + 1.0).abs() < 1e-6);
        assert!(tensor[[0, 2, 10, 10]].abs() < 0.01);
    }
}
