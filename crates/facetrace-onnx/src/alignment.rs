//! Face alignment via 4-DOF similarity transform.
//!
//! Warps a detected face to the canonical 112×112 ArcFace crop using the
//! five InsightFace reference landmarks and a least-squares estimate of
//! scale, rotation, and translation.

use image::RgbImage;

/// ArcFace reference landmarks for a 112×112 output:
/// left eye, right eye, nose, left mouth, right mouth.
const REFERENCE_LANDMARKS: [(f32, f32); 5] = [
    (38.2946, 51.6963),
    (73.5318, 51.5014),
    (56.0252, 71.7366),
    (41.5493, 92.3655),
    (70.7299, 92.2041),
];

pub const ALIGNED_SIZE: u32 = 112;

/// Align a detected face to the canonical 112×112 crop.
///
/// Out-of-bounds source pixels fill with black.
pub fn align_face(image: &RgbImage, landmarks: &[(f32, f32); 5]) -> RgbImage {
    let matrix = similarity_transform(landmarks, &REFERENCE_LANDMARKS);
    warp(image, &matrix, ALIGNED_SIZE)
}

/// Estimate the 2×3 similarity transform (4-DOF) taking `src` landmarks to
/// `dst` landmarks, as `[a, -b, tx, b, a, ty]` for the matrix
/// `[[a, -b, tx], [b, a, ty]]`.
fn similarity_transform(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> [f32; 6] {
    // Least squares over the overdetermined system; for each pair
    // (sx, sy) -> (dx, dy):
    //   sx * a - sy * b + tx = dx
    //   sy * a + sx * b + ty = dy
    let mut ata = [[0.0f32; 4]; 4];
    let mut atb = [0.0f32; 4];

    for i in 0..5 {
        let (sx, sy) = src[i];
        let (dx, dy) = dst[i];
        let rows = [([sx, -sy, 1.0, 0.0], dx), ([sy, sx, 0.0, 1.0], dy)];

        for (row, rhs) in rows {
            for j in 0..4 {
                for k in 0..4 {
                    ata[j][k] += row[j] * row[k];
                }
                atb[j] += row[j] * rhs;
            }
        }
    }

    let [a, b, tx, ty] = solve4(&ata, &atb);
    [a, -b, tx, b, a, ty]
}

/// Solve a 4×4 linear system by Gaussian elimination with partial pivoting.
fn solve4(ata: &[[f32; 4]; 4], atb: &[f32; 4]) -> [f32; 4] {
    let mut m = [[0.0f32; 5]; 4];
    for i in 0..4 {
        m[i][..4].copy_from_slice(&ata[i]);
        m[i][4] = atb[i];
    }

    for col in 0..4 {
        let pivot_row = (col..4)
            .max_by(|&a, &b| {
                m[a][col]
                    .abs()
                    .partial_cmp(&m[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            // Degenerate landmark geometry; identity keeps the warp defined.
            return [1.0, 0.0, 0.0, 0.0];
        }
        for row in (col + 1)..4 {
            let factor = m[row][col] / pivot;
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f32; 4];
    for i in (0..4).rev() {
        x[i] = m[i][4];
        for j in (i + 1)..4 {
            x[i] -= m[i][j] * x[j];
        }
        x[i] /= m[i][i];
    }
    x
}

/// Apply the inverse of a similarity transform to produce a square RGB
/// output, sampling with bilinear interpolation.
fn warp(image: &RgbImage, matrix: &[f32; 6], out_size: u32) -> RgbImage {
    let (a, tx, b, ty) = (matrix[0], matrix[2], matrix[3], matrix[5]);
    let (width, height) = image.dimensions();

    // Invert the rotation-scale block [[a, -b], [b, a]]; det = a² + b².
    let det = a * a + b * b;
    if det.abs() < 1e-12 {
        return RgbImage::new(out_size, out_size);
    }
    let ia = a / det;
    let ib = b / det;

    let sample = |x: i64, y: i64, c: usize| -> f32 {
        if x >= 0 && (x as u32) < width && y >= 0 && (y as u32) < height {
            image.get_pixel(x as u32, y as u32)[c] as f32
        } else {
            0.0
        }
    };

    let mut output = RgbImage::new(out_size, out_size);
    for oy in 0..out_size {
        for ox in 0..out_size {
            let dx = ox as f32 - tx;
            let dy = oy as f32 - ty;
            let sx = ia * dx + ib * dy;
            let sy = -ib * dx + ia * dy;

            let x0 = sx.floor() as i64;
            let y0 = sy.floor() as i64;
            let fx = sx - x0 as f32;
            let fy = sy - y0 as f32;

            let pixel = output.get_pixel_mut(ox, oy);
            for c in 0..3 {
                let value = sample(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                    + sample(x0 + 1, y0, c) * fx * (1.0 - fy)
                    + sample(x0, y0 + 1, c) * (1.0 - fx) * fy
                    + sample(x0 + 1, y0 + 1, c) * fx * fy;
                pixel[c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    output
}
