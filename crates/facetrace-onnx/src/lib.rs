//! facetrace-onnx — ONNX-backed embedding provider.
//!
//! Uses SCRFD for face detection and ArcFace for embedding extraction, both
//! running via ONNX Runtime on CPU, wired together behind the core
//! [`EmbeddingProvider`](facetrace_core::EmbeddingProvider) trait.

pub mod alignment;
pub mod detector;
pub mod provider;
pub mod recognizer;

pub use detector::{DetectorError, FaceDetector};
pub use provider::{OnnxProvider, ProviderInitError};
pub use recognizer::{FaceRecognizer, RecognizerError};

use std::path::PathBuf;

/// Default directory for ONNX model files:
/// `$FACETRACE_MODEL_DIR`, else `$XDG_DATA_HOME/facetrace/models`,
/// else `~/.local/share/facetrace/models`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FACETRACE_MODEL_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facetrace/models")
}
