use image::RgbImage;

use crate::error::ProviderError;
use crate::types::Detection;

/// Black-box face detection + embedding capability.
///
/// Given an image, returns zero or more detections in the provider's own
/// order. An image with no faces is an empty result, not an error.
/// Detection recall may vary run to run, but encoding a given detected
/// region is expected to be deterministic.
pub trait EmbeddingProvider {
    fn detect_and_encode(&mut self, image: &RgbImage) -> Result<Vec<Detection>, ProviderError>;
}
