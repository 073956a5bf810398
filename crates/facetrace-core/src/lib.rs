//! facetrace-core — Face-match scanning pipeline.
//!
//! Scans an image folder or an ordered frame sequence for occurrences of a
//! single target face. The pipeline is a single sequential pass: a frame
//! source feeds an embedding provider, the match evaluator compares every
//! embedding against the target vector under a distance threshold, and the
//! report assembler packages the accumulated matches into one [`ScanResult`].

pub mod error;
pub mod evaluator;
pub mod provider;
pub mod report;
pub mod sampling;
pub mod scanner;
pub mod source;
pub mod types;

pub use error::{ProviderError, ScanError, UnitError};
pub use evaluator::{evaluate, EmbeddingMatch};
pub use provider::EmbeddingProvider;
pub use report::{ReportSettings, ScanResult, SourceInfo};
pub use sampling::FrameSampler;
pub use scanner::{resolve_target, Scanner};
pub use source::{FrameDirSource, FrameSource, VideoFrame};
pub use types::{Detection, Embedding, FaceRegion, MatchRecord, MatchSource, ScanSettings, TargetVector};
