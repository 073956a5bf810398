//! Scan orchestration: target resolution, the per-unit scan loop, and the
//! skip-and-continue policy for degraded inputs.
//!
//! A run is one sequential pass: resolve the target, iterate the frame
//! source in order, sample, detect + evaluate, accumulate match records,
//! assemble the report. Fatal errors ([`ScanError`]) abort before or during
//! setup; per-unit failures ([`UnitError`]) are counted and dropped so a
//! corrupt file in a large corpus never kills the scan.

use std::path::{Path, PathBuf};

use crate::error::{ScanError, UnitError};
use crate::evaluator::evaluate;
use crate::provider::EmbeddingProvider;
use crate::report::{self, ReportSettings, ScanResult, SourceInfo};
use crate::sampling::{format_timestamp, is_supported_image, FrameSampler};
use crate::source::{FrameSource, VideoFrame};
use crate::types::{MatchRecord, MatchSource, ScanSettings, TargetVector};

/// Resolve the target face: load the image, obtain its embeddings, select
/// the first one as the canonical target vector.
///
/// A target photo with several faces is ambiguous; the first detection in
/// provider order wins. That is a documented limitation, not a heuristic.
pub fn resolve_target<P: EmbeddingProvider>(
    provider: &mut P,
    path: &Path,
) -> Result<TargetVector, ScanError> {
    let image = image::open(path)
        .map_err(|e| {
            ScanError::SourceUnavailable(format!("cannot load target image {}: {e}", path.display()))
        })?
        .to_rgb8();

    let detections = provider.detect_and_encode(&image).map_err(|e| {
        ScanError::SourceUnavailable(format!("target image {}: {e}", path.display()))
    })?;

    let faces = detections.len();
    let first = detections
        .into_iter()
        .next()
        .ok_or_else(|| ScanError::NoFaceInTarget(path.display().to_string()))?;

    tracing::info!(path = %path.display(), faces, "target face resolved");
    Ok(TargetVector::new(first.embedding, path.display().to_string()))
}

/// Drives a frame source through the match evaluator and accumulates
/// match records. Owns the provider, the target vector, and the validated
/// settings for the lifetime of a run.
#[derive(Debug)]
pub struct Scanner<P> {
    provider: P,
    target: TargetVector,
    settings: ScanSettings,
}

impl<P: EmbeddingProvider> Scanner<P> {
    pub fn new(provider: P, target: TargetVector, settings: ScanSettings) -> Result<Self, ScanError> {
        settings.validate()?;
        Ok(Self { provider, target, settings })
    }

    /// Scan every supported image in a folder, in enumeration order.
    pub fn scan_folder(&mut self, folder: &Path) -> Result<ScanResult, ScanError> {
        let entries = std::fs::read_dir(folder).map_err(|e| {
            ScanError::SourceUnavailable(format!("cannot open image folder {}: {e}", folder.display()))
        })?;

        // Directory enumeration order is preserved end to end; match records
        // come out in this order, whatever the OS yields.
        let files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_supported_image(path))
            .collect();

        self.scan_files(folder, files)
    }

    /// Scan an explicit, ordered list of image files.
    ///
    /// [`scan_folder`](Self::scan_folder) delegates here after enumeration;
    /// callers that control ordering themselves use it directly.
    pub fn scan_files(&mut self, corpus: &Path, files: Vec<PathBuf>) -> Result<ScanResult, ScanError> {
        let mut matches = Vec::new();
        let mut units_scanned = 0u64;
        let mut units_skipped = 0u64;

        for path in files {
            units_scanned += 1;
            match self.scan_one_file(&path) {
                Ok(Some(record)) => matches.push(record),
                Ok(None) => {}
                Err(err) => {
                    // Deliberate discard: one bad unit never aborts a corpus
                    // scan. The skip surfaces only in the units_skipped count.
                    units_skipped += 1;
                    tracing::debug!(path = %path.display(), error = %err, "skipping unit");
                }
            }
        }

        tracing::info!(
            corpus = %corpus.display(),
            units_scanned,
            units_skipped,
            matches = matches.len(),
            "folder scan finished"
        );
        Ok(self.finalize(corpus, units_scanned, units_skipped, matches))
    }

    /// Scan one decoded frame sequence, sampling every nth frame.
    ///
    /// `output_dir` is required when thumbnails are enabled; matching frames
    /// are persisted under `<output_dir>/thumbnails/`.
    pub fn scan_video<S: FrameSource>(
        &mut self,
        mut source: S,
        corpus: &Path,
        output_dir: Option<&Path>,
    ) -> Result<ScanResult, ScanError> {
        let thumbnail_dir = if self.settings.save_thumbnails {
            let out = output_dir.ok_or_else(|| {
                ScanError::InvalidConfiguration(
                    "saving thumbnails requires an output directory".into(),
                )
            })?;
            let dir = out.join("thumbnails");
            std::fs::create_dir_all(&dir).map_err(|e| {
                ScanError::SourceUnavailable(format!(
                    "cannot create thumbnail directory {}: {e}",
                    dir.display()
                ))
            })?;
            Some(dir)
        } else {
            None
        };

        let sampler = FrameSampler::new(self.settings.frame_skip)?;
        let fps = source.fps();

        let mut matches = Vec::new();
        let mut units_scanned = 0u64;
        let mut units_skipped = 0u64;

        while let Some(item) = source.next_frame() {
            units_scanned += 1;
            let frame = match item {
                Ok(frame) => frame,
                Err(err) => {
                    // Deliberate discard, as in scan_files.
                    units_skipped += 1;
                    tracing::debug!(error = %err, "skipping undecodable frame");
                    continue;
                }
            };

            if !sampler.should_process(frame.number) {
                continue;
            }

            let detections = match self.provider.detect_and_encode(&frame.image) {
                Ok(detections) => detections,
                Err(err) => {
                    units_skipped += 1;
                    tracing::debug!(frame = frame.number, error = %err, "skipping frame");
                    continue;
                }
            };

            // Video mode enumerates every match in the frame, not just the first.
            let hits = evaluate(
                detections.iter().map(|d| &d.embedding),
                &self.target,
                self.settings.threshold,
            );
            if hits.is_empty() {
                continue;
            }

            let timestamp = format_timestamp(frame.number, fps);
            // One thumbnail per frame, shared by every match within it.
            let thumbnail_path = thumbnail_dir
                .as_deref()
                .and_then(|dir| save_thumbnail(dir, &frame));

            for hit in hits {
                tracing::info!(
                    frame = frame.number,
                    timestamp = %timestamp,
                    confidence = hit.confidence,
                    "match"
                );
                matches.push(MatchRecord {
                    source: MatchSource::Frame {
                        frame_number: frame.number,
                        timestamp: timestamp.clone(),
                    },
                    confidence: hit.confidence,
                    thumbnail_path: thumbnail_path.clone(),
                });
            }
        }

        tracing::info!(
            corpus = %corpus.display(),
            units_scanned,
            units_skipped,
            matches = matches.len(),
            "video scan finished"
        );
        Ok(self.finalize(corpus, units_scanned, units_skipped, matches))
    }

    /// Process a single image file: decode, detect, evaluate.
    ///
    /// Folder mode is one match per file — the first hit wins and the rest
    /// of the unit's embeddings are not reported.
    fn scan_one_file(&mut self, path: &Path) -> Result<Option<MatchRecord>, UnitError> {
        let image = image::open(path)
            .map_err(|e| UnitError::Decode(format!("{}: {e}", path.display())))?
            .to_rgb8();

        let detections = self.provider.detect_and_encode(&image)?;
        let hit = evaluate(
            detections.iter().map(|d| &d.embedding),
            &self.target,
            self.settings.threshold,
        )
        .into_iter()
        .next();

        Ok(hit.map(|hit| {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!(path = %path.display(), confidence = hit.confidence, "match");
            MatchRecord {
                source: MatchSource::File { filename, path: path.display().to_string() },
                confidence: hit.confidence,
                thumbnail_path: None,
            }
        }))
    }

    fn finalize(
        &self,
        corpus: &Path,
        units_scanned: u64,
        units_skipped: u64,
        matches: Vec<MatchRecord>,
    ) -> ScanResult {
        report::assemble(
            SourceInfo {
                target: self.target.source().to_string(),
                corpus: corpus.display().to_string(),
            },
            chrono::Utc::now().to_rfc3339(),
            units_scanned,
            units_skipped,
            matches,
            ReportSettings {
                threshold: self.settings.threshold,
                frame_skip: self.settings.frame_skip,
                save_thumbnails: self.settings.save_thumbnails,
            },
        )
    }
}

/// Persist a matching frame as `match_frame_{n}.jpg`.
///
/// A failed write is logged and the match is recorded without a reference;
/// the thumbnail is a side effect, never a reason to drop a match.
fn save_thumbnail(dir: &Path, frame: &VideoFrame) -> Option<String> {
    let path = dir.join(format!("match_frame_{}.jpg", frame.number));
    match frame.image.save(&path) {
        Ok(()) => Some(path.display().to_string()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "thumbnail write failed");
            None
        }
    }
}
