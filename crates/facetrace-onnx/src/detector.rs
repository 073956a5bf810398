//! SCRFD face detector via ONNX Runtime.
//!
//! Runs the SCRFD (Sample and Computation Redistribution for Efficient Face
//! Detection) model on letterboxed RGB input and decodes its three
//! anchor-free stride levels, followed by NMS.

use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const INPUT_SIZE: u32 = 640;
const PIXEL_MEAN: f32 = 127.5;
const PIXEL_STD: f32 = 128.0;
const SCORE_THRESHOLD: f32 = 0.5;
const NMS_IOU_THRESHOLD: f32 = 0.4;
const STRIDES: [u32; 3] = [8, 16, 32];
const ANCHORS_PER_CELL: usize = 2;
const LANDMARK_COUNT: usize = 5;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download from insightface and place in the model dir")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// One face candidate in original-image pixel coordinates.
#[derive(Debug, Clone)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    /// Five-point landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: [(f32, f32); LANDMARK_COUNT],
}

/// Coordinate de-mapping info for the letterbox resize.
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    /// Map a point from letterboxed model space back to image space.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Output tensor indices for one stride: (score, bbox, kps).
type StrideOutputs = (usize, usize, usize);

pub struct FaceDetector {
    session: Session,
    /// Per-stride output indices for strides [8, 16, 32], discovered by
    /// name at load time with a positional fallback.
    output_map: [StrideOutputs; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)
            .map_err(ort::Error::from)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = %model_path.display(),
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        if output_names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        let output_map = map_outputs(&output_names);
        tracing::debug!(?output_map, "SCRFD output tensor mapping");

        Ok(Self { session, output_map })
    }

    /// Detect faces in an RGB image, highest score first.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectorError> {
        let (input, letterbox) = preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut candidates = Vec::new();
        for (slot, &stride) in STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.output_map[slot];
            let extract = |idx: usize, what: &str| {
                outputs[idx].try_extract_tensor::<f32>().map_err(|e| {
                    DetectorError::InferenceFailed(format!("{what} stride {stride}: {e}"))
                })
            };
            let (_, scores) = extract(score_idx, "scores")?;
            let (_, bboxes) = extract(bbox_idx, "bboxes")?;
            let (_, kps) = extract(kps_idx, "kps")?;

            candidates.extend(decode_stride(scores, bboxes, kps, stride, &letterbox));
        }

        Ok(nms(candidates, NMS_IOU_THRESHOLD))
    }
}

/// Letterbox-resize an RGB image into a normalized NCHW tensor.
///
/// The image is scaled to fit 640×640 preserving aspect ratio and centered;
/// padding stays at the value that normalizes to 0.
fn preprocess(image: &RgbImage) -> (Array4<f32>, Letterbox) {
    let (width, height) = image.dimensions();
    let side = INPUT_SIZE as f32;
    let scale = (side / width as f32).min(side / height as f32);

    let new_w = ((width as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
    let new_h = ((height as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let pad_left = (INPUT_SIZE - new_w) / 2;
    let pad_top = (INPUT_SIZE - new_h) / 2;

    let mut tensor =
        Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let tx = (x + pad_left) as usize;
        let ty = (y + pad_top) as usize;
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = (pixel[c] as f32 - PIXEL_MEAN) / PIXEL_STD;
        }
    }

    let letterbox = Letterbox {
        scale,
        pad_x: pad_left as f32,
        pad_y: pad_top as f32,
    };
    (tensor, letterbox)
}

/// Decode one stride level: anchor-free offsets relative to grid centers,
/// mapped back through the letterbox into image coordinates.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    kps: &[f32],
    stride: u32,
    letterbox: &Letterbox,
) -> Vec<FaceBox> {
    let grid = (INPUT_SIZE / stride) as usize;
    let s = stride as f32;
    let mut faces = Vec::new();

    for cell in 0..grid * grid {
        let anchor_cx = (cell % grid) as f32 * s;
        let anchor_cy = (cell / grid) as f32 * s;

        for anchor in 0..ANCHORS_PER_CELL {
            let idx = cell * ANCHORS_PER_CELL + anchor;
            let Some(&score) = scores.get(idx) else { continue };
            if score <= SCORE_THRESHOLD {
                continue;
            }

            let b = idx * 4;
            let k = idx * LANDMARK_COUNT * 2;
            if b + 4 > bboxes.len() || k + LANDMARK_COUNT * 2 > kps.len() {
                continue;
            }

            let (x1, y1) = letterbox.unmap(anchor_cx - bboxes[b] * s, anchor_cy - bboxes[b + 1] * s);
            let (x2, y2) =
                letterbox.unmap(anchor_cx + bboxes[b + 2] * s, anchor_cy + bboxes[b + 3] * s);

            let mut landmarks = [(0.0f32, 0.0f32); LANDMARK_COUNT];
            for (i, lm) in landmarks.iter_mut().enumerate() {
                *lm = letterbox.unmap(
                    anchor_cx + kps[k + 2 * i] * s,
                    anchor_cy + kps[k + 2 * i + 1] * s,
                );
            }

            faces.push(FaceBox { x1, y1, x2, y2, score, landmarks });
        }
    }

    faces
}

/// Non-maximum suppression. Keeps the highest-scoring candidate of each
/// overlapping cluster; output stays sorted by score descending.
fn nms(mut candidates: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<FaceBox> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| iou(k, &candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// Intersection-over-union of two face boxes.
fn iou(a: &FaceBox, b: &FaceBox) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;

    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    let union = area_a + area_b - intersection;

    if union > 0.0 { intersection / union } else { 0.0 }
}

/// Discover output tensor ordering by name.
///
/// SCRFD exports may carry named outputs ("score_8", "bbox_16", "kps_32",
/// ...) or opaque numeric names. Named tensors are mapped to their stride
/// slots; otherwise the standard positional layout is assumed:
/// [0-2] scores, [3-5] bboxes, [6-8] kps, each ordered by stride 8/16/32.
fn map_outputs(names: &[String]) -> [StrideOutputs; 3] {
    let find = |prefix: &str, stride: u32| {
        let wanted = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &wanted)
    };

    let fully_named = STRIDES.iter().all(|&stride| {
        ["score", "bbox", "kps"].iter().all(|p| find(p, stride).is_some())
    });

    if fully_named {
        tracing::debug!("SCRFD: name-based output mapping");
        std::array::from_fn(|slot| {
            let stride = STRIDES[slot];
            (
                find("score", stride).unwrap(),
                find("bbox", stride).unwrap(),
                find("kps", stride).unwrap(),
            )
        })
    } else {
        tracing::debug!(?names, "SCRFD: unrecognized output names, using positional mapping");
        [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
    }
}
