use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Face embedding vector (typically 512-dimensional, L2-normalized).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    /// Compute Euclidean distance to another embedding.
    ///
    /// This is the provider's native metric: on L2-normalized vectors it is
    /// monotonic with cosine distance and lives in [0, 2].
    pub fn distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Bounding box of one detected face, in pixel coordinates.
///
/// Edge order is (top, right, bottom, left), matching the convention of the
/// detection APIs this pipeline was built against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaceRegion {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// One detected face: its region and the embedding extracted from it.
/// Regions and embeddings are paired 1:1 within a unit.
#[derive(Debug, Clone)]
pub struct Detection {
    pub region: FaceRegion,
    pub embedding: Embedding,
}

/// The single embedding the whole run searches for.
///
/// Created once by [`resolve_target`](crate::scanner::resolve_target) and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TargetVector {
    embedding: Embedding,
    source: String,
}

impl TargetVector {
    pub(crate) fn new(embedding: Embedding, source: impl Into<String>) -> Self {
        Self { embedding, source: source.into() }
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    /// Path of the image the target vector was resolved from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Per-run scan settings, validated before any work begins.
#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    /// Maximum embedding distance for a positive match.
    pub threshold: f32,
    /// Process every nth frame in video mode (1 = every frame).
    pub frame_skip: u32,
    /// Persist a thumbnail of each matching frame.
    pub save_thumbnails: bool,
}

impl ScanSettings {
    /// Reject settings no scan should ever start with.
    pub fn validate(&self) -> Result<(), ScanError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ScanError::InvalidConfiguration(format!(
                "threshold must be a finite non-negative number, got {}",
                self.threshold
            )));
        }
        if self.frame_skip == 0 {
            return Err(ScanError::InvalidConfiguration(
                "frame-skip must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Where a match was found.
///
/// Serialized untagged so folder matches carry `filename`/`path` and video
/// matches carry `frameNumber`/`timestamp`, as consumers of the result
/// document expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum MatchSource {
    File {
        filename: String,
        path: String,
    },
    #[serde(rename_all = "camelCase")]
    Frame {
        frame_number: u64,
        timestamp: String,
    },
}

/// One confirmed occurrence of the target face. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    #[serde(flatten)]
    pub source: MatchSource,
    /// `max(0, 1 - distance)` — a monotonic, bounded proxy for match
    /// strength, not a calibrated probability.
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: Vec<f32>) -> Embedding {
        Embedding { values, model_version: None }
    }

    #[test]
    fn test_distance_identical() {
        let a = emb(vec![0.6, 0.8, 0.0]);
        assert!(a.distance(&a).abs() < 1e-6);
    }

    #[test]
    fn test_distance_unit_axes() {
        let a = emb(vec![1.0, 0.0]);
        let b = emb(vec![0.0, 1.0]);
        assert!((a.distance(&b) - 2.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = emb(vec![0.1, 0.2, 0.3]);
        let b = emb(vec![0.4, 0.0, -0.2]);
        assert!((a.distance(&b) - b.distance(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_settings_accepts_defaults() {
        let s = ScanSettings { threshold: 0.45, frame_skip: 5, save_thumbnails: false };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_settings_rejects_negative_threshold() {
        let s = ScanSettings { threshold: -0.1, frame_skip: 1, save_thumbnails: false };
        assert!(matches!(s.validate(), Err(ScanError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_settings_rejects_nan_threshold() {
        let s = ScanSettings { threshold: f32::NAN, frame_skip: 1, save_thumbnails: false };
        assert!(matches!(s.validate(), Err(ScanError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_settings_rejects_zero_frame_skip() {
        let s = ScanSettings { threshold: 0.6, frame_skip: 0, save_thumbnails: false };
        assert!(matches!(s.validate(), Err(ScanError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_match_record_video_serialization() {
        let record = MatchRecord {
            source: MatchSource::Frame { frame_number: 150, timestamp: "0:00:05".into() },
            confidence: 0.7,
            thumbnail_path: Some("out/thumbnails/match_frame_150.jpg".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["frameNumber"], 150);
        assert_eq!(json["timestamp"], "0:00:05");
        assert_eq!(json["thumbnailPath"], "out/thumbnails/match_frame_150.jpg");
    }

    #[test]
    fn test_match_record_file_serialization_omits_thumbnail() {
        let record = MatchRecord {
            source: MatchSource::File { filename: "a.jpg".into(), path: "corpus/a.jpg".into() },
            confidence: 1.0,
            thumbnail_path: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["filename"], "a.jpg");
        assert!(json.get("thumbnailPath").is_none());
    }
}
