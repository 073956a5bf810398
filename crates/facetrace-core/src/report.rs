//! Report assembly: package run metadata, settings, and matches into the
//! terminal [`ScanResult`] artifact.

use serde::{Deserialize, Serialize};

use crate::types::MatchRecord;

/// What was scanned, and for whom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Path of the target face image.
    pub target: String,
    /// Path of the scanned corpus (folder or frame directory).
    pub corpus: String,
}

/// The effective settings a scan ran with, echoed into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub threshold: f32,
    pub frame_skip: u32,
    pub save_thumbnails: bool,
}

/// The sole externally visible output of a scan. Assembled once at the end
/// of a run; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub source: SourceInfo,
    /// RFC 3339 time the report was assembled.
    pub scanned_at: String,
    /// Units (files or frames) the scan consumed, including sampled-out and
    /// undecodable ones.
    pub units_scanned: u64,
    /// Units dropped for decode/inference failures. Skips are silent per
    /// unit; this count is the only operator-visible trace of them.
    pub units_skipped: u64,
    pub matches_found: usize,
    /// Matches in scan order: filename enumeration order or ascending frame
    /// number. Consumers depend on this ordering being stable.
    pub matches: Vec<MatchRecord>,
    pub settings: ReportSettings,
}

/// Pure aggregation — no recomputation, match order preserved as given.
pub fn assemble(
    source: SourceInfo,
    scanned_at: String,
    units_scanned: u64,
    units_skipped: u64,
    matches: Vec<MatchRecord>,
    settings: ReportSettings,
) -> ScanResult {
    ScanResult {
        source,
        scanned_at,
        units_scanned,
        units_skipped,
        matches_found: matches.len(),
        matches,
        settings,
    }
}
