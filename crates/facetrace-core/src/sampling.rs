//! Frame/image sampling policy and timestamp derivation.

use std::path::Path;

use crate::error::ScanError;

/// Image extensions accepted in folder mode (case-insensitive).
const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Substitute frame rate when a source reports zero or an unusable fps.
/// Timestamps stay defined instead of failing the run.
const FALLBACK_FPS: f64 = 30.0;

/// Video-mode frame sampler: process every nth frame.
///
/// Running the embedding provider on every frame of a long video is the
/// dominant cost, so frames are sampled at a fixed interval, trading
/// temporal resolution for throughput. The smallest interval that still
/// catches a transient face depends on how long the face stays on screen
/// relative to the frame rate; 5 is a workable default for talking-head
/// footage at common frame rates.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    every: u32,
}

impl FrameSampler {
    pub fn new(every: u32) -> Result<Self, ScanError> {
        if every == 0 {
            return Err(ScanError::InvalidConfiguration(
                "frame-skip must be at least 1".into(),
            ));
        }
        Ok(Self { every })
    }

    /// Whether the 1-based frame at `frame_number` should be processed.
    pub fn should_process(&self, frame_number: u64) -> bool {
        frame_number % u64::from(self.every) == 0
    }
}

/// Whether a path carries a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Derive an `H:MM:SS` timestamp for a frame.
///
/// Seconds are `floor(frame_number / fps)`. An fps that is zero, negative,
/// or non-finite falls back to [`FALLBACK_FPS`].
pub fn format_timestamp(frame_number: u64, fps: f64) -> String {
    let fps = if fps.is_finite() && fps > 0.0 { fps } else { FALLBACK_FPS };
    let total_secs = (frame_number as f64 / fps).floor() as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}
