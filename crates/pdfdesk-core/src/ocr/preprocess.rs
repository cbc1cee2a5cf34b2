//! Image cleanup ahead of recognition.
//!
//! Three tiers trade speed for accuracy: `Fast` only drops color,
//! `Balanced` adds light blur and a global Otsu binarization, `Accurate`
//! adds denoising, adaptive thresholding, and skew correction.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{adaptive_threshold, otsu_level};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use tracing::debug;

use super::AccuracyMode;

/// Tilt below this is left alone; rotation resampling would cost more
/// detail than the correction recovers.
const DESKEW_THRESHOLD_DEGREES: f32 = 0.5;
/// Foreground pixels are subsampled past this count before hull
/// construction.
const MAX_SKEW_SAMPLES: usize = 20_000;
const BALANCED_BLUR_SIGMA: f32 = 1.0;
const ADAPTIVE_BLOCK_RADIUS: u32 = 10;

/// Applies the cleanup tier selected by an [`AccuracyMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Prepare a rasterized page for recognition.
    pub fn prepare(&self, img: &DynamicImage, mode: AccuracyMode) -> GrayImage {
        let gray = img.to_luma8();
        match mode {
            AccuracyMode::Fast => gray,
            AccuracyMode::Balanced => {
                let blurred = gaussian_blur_f32(&gray, BALANCED_BLUR_SIGMA);
                let level = otsu_level(&blurred);
                binarize(&blurred, level)
            }
            AccuracyMode::Accurate => {
                let denoised = median_filter(&gray, 1, 1);
                let binary = adaptive_threshold(&denoised, ADAPTIVE_BLOCK_RADIUS);
                let angle = estimate_skew(&binary);
                if angle.abs() > DESKEW_THRESHOLD_DEGREES {
                    debug!("deskewing by {:.2} degrees", -angle);
                    rotate_replicate(&binary, -angle)
                } else {
                    binary
                }
            }
        }
    }
}

/// Global threshold: everything above `level` becomes white, the rest black.
fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        px.0[0] = if px.0[0] > level { 255 } else { 0 };
    }
    out
}

/// Estimate page skew in degrees from the minimum-area rectangle around the
/// foreground (black) pixels of a binarized image. Returns 0.0 when there is
/// too little foreground to measure.
fn estimate_skew(binary: &GrayImage) -> f32 {
    let mut points: Vec<(f32, f32)> = binary
        .enumerate_pixels()
        .filter(|(_, _, px)| px.0[0] == 0)
        .map(|(x, y, _)| (x as f32, y as f32))
        .collect();

    if points.len() < 50 {
        return 0.0;
    }
    if points.len() > MAX_SKEW_SAMPLES {
        let stride = points.len() / MAX_SKEW_SAMPLES + 1;
        points = points.into_iter().step_by(stride).collect();
    }

    let hull = convex_hull(&mut points);
    if hull.len() < 3 {
        return 0.0;
    }
    min_area_rect_angle(&hull)
}

/// Monotone-chain convex hull. Points are sorted in place.
fn convex_hull(points: &mut [(f32, f32)]) -> Vec<(f32, f32)> {
    points.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let cross = |o: (f32, f32), a: (f32, f32), b: (f32, f32)| -> f32 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut hull: Vec<(f32, f32)> = Vec::with_capacity(points.len() + 1);
    for &p in points.iter() {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in points.iter().rev() {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Rotating calipers over the hull: the minimum-area bounding rectangle has
/// one side collinear with a hull edge. Returns the angle of the rectangle's
/// long side, folded into [-45, 45] degrees.
fn min_area_rect_angle(hull: &[(f32, f32)]) -> f32 {
    let mut best_area = f32::INFINITY;
    let mut best_angle = 0.0f32;

    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let (ex, ey) = (b.0 - a.0, b.1 - a.1);
        let len = (ex * ex + ey * ey).sqrt();
        if len < f32::EPSILON {
            continue;
        }
        let (ux, uy) = (ex / len, ey / len);

        let mut min_u = f32::INFINITY;
        let mut max_u = f32::NEG_INFINITY;
        let mut min_v = f32::INFINITY;
        let mut max_v = f32::NEG_INFINITY;
        for &(px, py) in hull {
            let u = px * ux + py * uy;
            let v = -px * uy + py * ux;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
        let width = max_u - min_u;
        let height = max_v - min_v;
        let area = width * height;
        if area < best_area {
            best_area = area;
            let edge_angle = uy.atan2(ux).to_degrees();
            // Report the orientation of the long side.
            best_angle = if width >= height {
                edge_angle
            } else {
                edge_angle + 90.0
            };
        }
    }

    // Fold into [-45, 45]: a page is never assumed to be rotated by more
    // than an eighth turn.
    let mut angle = best_angle % 180.0;
    if angle > 90.0 {
        angle -= 180.0;
    } else if angle < -90.0 {
        angle += 180.0;
    }
    if angle > 45.0 {
        angle -= 90.0;
    } else if angle < -45.0 {
        angle += 90.0;
    }
    angle
}

/// Rotate `angle_deg` degrees about the image center, keeping dimensions and
/// filling uncovered regions by replicating edge pixels. Samples with
/// Catmull-Rom bicubic interpolation.
fn rotate_replicate(img: &GrayImage, angle_deg: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let rad = angle_deg.to_radians();
    let (sin, cos) = rad.sin_cos();

    let mut out = GrayImage::new(w, h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        // Inverse mapping: where in the source does this output pixel come from.
        let sx = cx + dx * cos + dy * sin;
        let sy = cy - dx * sin + dy * cos;
        *px = Luma([sample_bicubic(img, sx, sy)]);
    }
    out
}

/// Catmull-Rom weight for a sample at distance `t` in [-2, 2].
fn cubic_weight(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

/// Bicubic sample at a fractional position, clamping out-of-range
/// coordinates to the nearest edge pixel.
fn sample_bicubic(img: &GrayImage, x: f32, y: f32) -> u8 {
    let (w, h) = img.dimensions();
    let clamp_get = |ix: i64, iy: i64| -> f32 {
        let cx = ix.clamp(0, w as i64 - 1) as u32;
        let cy = iy.clamp(0, h as i64 - 1) as u32;
        img.get_pixel(cx, cy).0[0] as f32
    };

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let mut acc = 0.0f32;
    let mut weight_sum = 0.0f32;
    for j in -1..=2i64 {
        let wy = cubic_weight(j as f32 - fy);
        for i in -1..=2i64 {
            let wx = cubic_weight(i as f32 - fx);
            let weight = wx * wy;
            acc += weight * clamp_get(x0 as i64 + i, y0 as i64 + j);
            weight_sum += weight;
        }
    }
    if weight_sum.abs() < f32::EPSILON {
        return clamp_get(x0 as i64, y0 as i64) as u8;
    }
    (acc / weight_sum).round().clamp(0.0, 255.0) as u8
}
