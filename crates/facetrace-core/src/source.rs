//! Frame sources for video-mode scanning.
//!
//! Video decoding proper is out of scope; anything that can yield decoded
//! RGB frames in ascending frame order can implement [`FrameSource`].
//! [`FrameDirSource`] covers the common workflow of scanning frames already
//! extracted to a directory (e.g. by ffmpeg).

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::{ScanError, UnitError};
use crate::sampling::is_supported_image;

/// One decoded video frame. Frame numbers are 1-based and strictly
/// increasing within a source.
pub struct VideoFrame {
    pub number: u64,
    pub image: RgbImage,
}

/// Pull-based, finite, ordered sequence of decoded frames.
pub trait FrameSource {
    /// Reported frame rate. May be zero or garbage for broken containers;
    /// the orchestrator substitutes a fallback for timestamp purposes.
    fn fps(&self) -> f64;

    /// Next frame, or `None` when exhausted. A `Some(Err(_))` is one
    /// undecodable frame; the sequence continues past it.
    fn next_frame(&mut self) -> Option<Result<VideoFrame, UnitError>>;
}

/// Frames pre-extracted to a directory, ordered by filename.
///
/// Zero-padded frame filenames (ffmpeg's `frame_%06d.jpg` and friends) sort
/// into frame order lexicographically; frame numbers are assigned from the
/// sorted position, 1-based.
#[derive(Debug)]
pub struct FrameDirSource {
    frames: Vec<PathBuf>,
    cursor: usize,
    fps: f64,
}

impl FrameDirSource {
    pub fn open(dir: &Path, fps: f64) -> Result<Self, ScanError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ScanError::SourceUnavailable(format!("cannot open frames directory {}: {e}", dir.display()))
        })?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_supported_image(path))
            .collect();
        frames.sort();

        tracing::debug!(dir = %dir.display(), frames = frames.len(), "opened frame directory");
        Ok(Self { frames, cursor: 0, fps })
    }

    /// Number of frames the source will yield.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for FrameDirSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Option<Result<VideoFrame, UnitError>> {
        let path = self.frames.get(self.cursor)?.clone();
        self.cursor += 1;
        let number = self.cursor as u64;

        let result = match image::open(&path) {
            Ok(img) => Ok(VideoFrame { number, image: img.to_rgb8() }),
            Err(e) => Err(UnitError::Decode(format!("{}: {e}", path.display()))),
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn write_frame(dir: &Path, name: &str, value: u8) {
        let img = RgbImage::from_pixel(2, 2, Rgb([value, 0, 0]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_missing_directory_is_source_unavailable() {
        let err = FrameDirSource::open(Path::new("/nonexistent/frames"), 30.0).unwrap_err();
        assert!(matches!(err, ScanError::SourceUnavailable(_)));
    }

    #[test]
    fn test_frames_yielded_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_000002.png", 2);
        write_frame(dir.path(), "frame_000001.png", 1);
        write_frame(dir.path(), "frame_000003.png", 3);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = FrameDirSource::open(dir.path(), 24.0).unwrap();
        assert_eq!(source.len(), 3);

        let mut seen = Vec::new();
        while let Some(frame) = source.next_frame() {
            let frame = frame.unwrap();
            seen.push((frame.number, frame.image.get_pixel(0, 0)[0]));
        }
        assert_eq!(seen, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_corrupt_frame_yields_unit_error_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_000001.png", 1);
        std::fs::write(dir.path().join("frame_000002.png"), b"not an image").unwrap();
        write_frame(dir.path(), "frame_000003.png", 3);

        let mut source = FrameDirSource::open(dir.path(), 30.0).unwrap();
        assert!(source.next_frame().unwrap().is_ok());
        assert!(matches!(source.next_frame().unwrap(), Err(UnitError::Decode(_))));
        let third = source.next_frame().unwrap().unwrap();
        assert_eq!(third.number, 3);
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_empty_directory_is_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FrameDirSource::open(dir.path(), 30.0).unwrap();
        assert!(source.is_empty());
        assert!(source.next_frame().is_none());
    }
}
