// Forbidden-region extraction: text, image, and matrix-code masks from a
// grayscale page. All kernel and area constants are expressed at the
// reference DPI and rescaled to the working DPI before use.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use super::mask::{Mask, threshold_below};
use super::{morphology, scale_area, scale_len};

/// Binarization threshold for ink candidates.
const THRESH_TEXT: u8 = 200;
/// Absolute-Laplacian threshold for high-variation (image) regions.
const THRESH_LAPL: u8 = 30;
/// Minimum connected-component area (ref-DPI px^2) kept in the image mask.
const MIN_IMAGE_AREA: u64 = 5000;
/// Minimum bounding-box area (ref-DPI px^2) for a matrix-code candidate.
const MIN_QR_AREA: u64 = 2000;
/// Intensity-variance floor distinguishing matrix codes from blank squares.
const VAR_QR: f64 = 1500.0;
/// Largest kernel side used by any pass, at reference DPI.
const MAX_KERNEL: u32 = 100;

/// The three forbidden-region masks of one page. Each shares the exact
/// dimensions of the source raster.
#[derive(Debug, Clone)]
pub struct ContentMasks {
    pub text: Mask,
    pub image: Mask,
    pub qr: Mask,
}

impl ContentMasks {
    /// Union of the three masks; the region the stamp must avoid.
    pub fn union(&self) -> Mask {
        let mut union = self.text.clone();
        union.union_with(&self.image);
        union.union_with(&self.qr);
        union
    }
}

/// Build the text, image, and matrix-code masks for a grayscale page.
///
/// Deterministic for identical input. Pages smaller than twice the largest
/// kernel in either axis cannot be analyzed morphologically; the builder
/// then marks the whole page forbidden, which forces the locator into its
/// degraded path.
pub fn build_content_masks(gray: &GrayImage, working_dpi: u32) -> ContentMasks {
    let (w, h) = (gray.width(), gray.height());
    let max_kernel = scale_len(MAX_KERNEL, working_dpi);
    if w < 2 * max_kernel || h < 2 * max_kernel {
        debug!(width = w, height = h, "page below morphology minimum, marking all forbidden");
        return ContentMasks {
            text: Mask::full(w, h),
            image: Mask::full(w, h),
            qr: Mask::full(w, h),
        };
    }

    let ink = threshold_below(gray, THRESH_TEXT);

    let text = text_mask(&ink, working_dpi);
    let image = image_mask(gray, &ink, working_dpi);
    let qr = qr_mask(gray, &ink, working_dpi);

    debug!(
        text_px = text.count_forbidden(),
        image_px = image.count_forbidden(),
        qr_px = qr.count_forbidden(),
        "content masks built"
    );

    ContentMasks { text, image, qr }
}

/// Text regions: three directional closings merge glyphs into line, column,
/// and isolated-glyph blobs, then a wide dilation forms the protective halo.
fn text_mask(ink: &Mask, dpi: u32) -> Mask {
    let lines = morphology::close(ink, scale_len(50, dpi), scale_len(3, dpi));
    let columns = morphology::close(ink, scale_len(3, dpi), scale_len(30, dpi));
    let glyphs = morphology::close(ink, scale_len(10, dpi), scale_len(10, dpi));

    let mut combined = lines;
    combined.union_with(&columns);
    combined.union_with(&glyphs);

    morphology::dilate(&combined, scale_len(50, dpi), scale_len(30, dpi))
}

/// Image regions: high absolute-Laplacian response filtered by component
/// area, plus long horizontal/vertical rules recovered by opening. Tables
/// and separators count as images for exclusion purposes.
fn image_mask(gray: &GrayImage, ink: &Mask, dpi: u32) -> Mask {
    let response = laplacian_mask(gray, THRESH_LAPL);
    let mut mask = keep_large_components(&response, scale_area(MIN_IMAGE_AREA, dpi));

    let h_rules = morphology::open(ink, scale_len(100, dpi), 1);
    let v_rules = morphology::open(ink, 1, scale_len(100, dpi));
    mask.union_with(&h_rules);
    mask.union_with(&v_rules);

    morphology::dilate(&mask, scale_len(60, dpi), scale_len(60, dpi))
}

/// Matrix-code regions: near-square convex quadrilaterals among the external
/// contours of the ink candidates, confirmed by high intensity variance.
fn qr_mask(gray: &GrayImage, ink: &Mask, dpi: u32) -> Mask {
    let (w, h) = (gray.width(), gray.height());
    let mut canvas = Mask::empty(w, h);
    let min_area = scale_area(MIN_QR_AREA, dpi);

    let contours = find_contours::<i32>(ink.as_image());
    for contour in &contours {
        if contour.border_type != BorderType::Outer || contour.points.len() < 4 {
            continue;
        }

        let perimeter = closed_polyline_length(&contour.points);
        let polygon = approximate_polygon_dp(&contour.points, 0.04 * perimeter, true);
        if polygon.len() != 4 || !is_convex(&polygon) {
            continue;
        }

        let (bx, by, bw, bh) = bounding_box(&contour.points);
        if bw == 0 || bh == 0 {
            continue;
        }
        let aspect = bw as f64 / bh as f64;
        if !(0.85..=1.15).contains(&aspect) {
            continue;
        }
        if (bw as u64) * (bh as u64) < min_area {
            continue;
        }
        if region_variance(gray, bx, by, bw, bh) <= VAR_QR {
            continue;
        }

        canvas.fill_rect(bx, by, bw, bh);
    }

    if canvas.count_forbidden() == 0 {
        return canvas;
    }
    morphology::dilate(&canvas, scale_len(80, dpi), scale_len(80, dpi))
}

/// Absolute 4-neighbor Laplacian thresholded into a mask. Border pixels have
/// no full neighborhood and stay free.
fn laplacian_mask(gray: &GrayImage, thresh: u8) -> Mask {
    let (w, h) = (gray.width(), gray.height());
    let mut mask = Mask::empty(w, h);
    if w < 3 || h < 3 {
        return mask;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = gray.get_pixel(x, y).0[0] as i32;
            let top = gray.get_pixel(x, y - 1).0[0] as i32;
            let bottom = gray.get_pixel(x, y + 1).0[0] as i32;
            let left = gray.get_pixel(x - 1, y).0[0] as i32;
            let right = gray.get_pixel(x + 1, y).0[0] as i32;

            let lap = (top + bottom + left + right - 4 * center).unsigned_abs();
            if lap > thresh as u32 {
                mask.set_forbidden(x, y);
            }
        }
    }
    mask
}

/// Keep only connected components whose pixel area reaches `min_area`.
/// Text noise produces many small high-Laplacian components; those belong
/// to the text mask, not here.
fn keep_large_components(mask: &Mask, min_area: u64) -> Mask {
    let (w, h) = (mask.width(), mask.height());
    let labels = connected_components(mask.as_image(), Connectivity::Eight, Luma([0u8]));

    let mut areas: Vec<u64> = Vec::new();
    for p in labels.pixels() {
        let label = p.0[0] as usize;
        if label == 0 {
            continue;
        }
        if label >= areas.len() {
            areas.resize(label + 1, 0);
        }
        areas[label] += 1;
    }

    let mut out = Mask::empty(w, h);
    for y in 0..h {
        for x in 0..w {
            let label = labels.get_pixel(x, y).0[0] as usize;
            if label != 0 && areas[label] >= min_area {
                out.set_forbidden(x, y);
            }
        }
    }
    out
}

fn closed_polyline_length(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let dx = (a.x - b.x) as f64;
        let dy = (a.y - b.y) as f64;
        length += (dx * dx + dy * dy).sqrt();
    }
    length
}

/// A polygon is convex when every consecutive edge pair turns the same way.
fn is_convex(polygon: &[Point<i32>]) -> bool {
    let n = polygon.len();
    if n < 4 {
        return false;
    }
    let mut sign = 0i64;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64
            - (b.y - a.y) as i64 * (c.x - b.x) as i64;
        if cross != 0 {
            if sign != 0 && (cross > 0) != (sign > 0) {
                return false;
            }
            sign = cross;
        }
    }
    true
}

fn bounding_box(points: &[Point<i32>]) -> (u32, u32, u32, u32) {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let x = min_x.max(0) as u32;
    let y = min_y.max(0) as u32;
    (x, y, (max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32)
}

/// Population variance of gray intensities inside a rectangle.
fn region_variance(gray: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> f64 {
    let x2 = (x + w).min(gray.width());
    let y2 = (y + h).min(gray.height());
    let count = ((x2 - x) as u64 * (y2 - y) as u64) as f64;
    if count == 0.0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for yy in y..y2 {
        for xx in x..x2 {
            let v = gray.get_pixel(xx, yy).0[0] as f64;
            sum += v;
            sum_sq += v * v;
        }
    }
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}
