use thiserror::Error;

/// Fatal scan errors. Any of these aborts the run before or during setup;
/// no partial report is emitted.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no face found in target image {0} — make sure it's a clear face shot")]
    NoFaceInTarget(String),
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Recoverable per-unit errors. The orchestrator logs these, counts them,
/// and moves on to the next unit; they never abort a scan.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("could not decode {0}")]
    Decode(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors from an [`EmbeddingProvider`](crate::EmbeddingProvider).
///
/// Fatal when resolving the target; recoverable (unit-level) during a scan.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("inference failed: {0}")]
    Inference(String),
}
