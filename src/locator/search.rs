// Whitespace scan: size-descending search over the union integral mask with
// strided coarse passes, local refinement, and corner bias.

use tracing::debug;

use super::mask::IntegralMask;
use super::{Placement, PlacementQuality};
use crate::error::{Result, StampwiseError};

/// Search inputs, already rescaled to the working DPI.
pub(crate) struct SearchParams {
    /// Candidate square sides, strictly descending.
    pub sizes: Vec<u32>,
    /// Page-interior margin the square must keep on every side.
    pub margin: u32,
    /// Lower bound of the coarse scan stride.
    pub step_floor: u32,
    pub acceptable: f64,
    pub fallback: f64,
    pub prefer_corners: bool,
}

struct Candidate {
    size: u32,
    x: u32,
    y: u32,
    fraction: f64,
}

/// Find the best placement for the given forbidden-union integral.
///
/// Tries sizes largest first and returns the first acceptable hit. When no
/// size is acceptable, falls back to the largest size whose best candidate
/// stays under the fallback threshold, and past that to the global minimum
/// overlap, tagged degraded. Returns `PageTooSmall` only when not even the
/// smallest size fits inside the margins.
pub(crate) fn find_placement(integral: &IntegralMask, params: &SearchParams) -> Result<Placement> {
    let (w, h) = (integral.width(), integral.height());
    let fitting: Vec<u32> = params
        .sizes
        .iter()
        .copied()
        .filter(|&s| s + 2 * params.margin <= w && s + 2 * params.margin <= h)
        .collect();

    if fitting.is_empty() {
        let min_side = params.sizes.last().copied().unwrap_or(0) + 2 * params.margin;
        return Err(StampwiseError::PageTooSmall {
            width: w,
            height: h,
            min_side,
        });
    }

    let mut bests: Vec<Candidate> = Vec::with_capacity(fitting.len());

    for &size in &fitting {
        if params.prefer_corners
            && let Some(p) = corner_hit(integral, size, params)
        {
            return Ok(p);
        }

        let candidate = scan_size(integral, size, params);
        if candidate.fraction <= params.acceptable {
            debug!(size, x = candidate.x, y = candidate.y, overlap = candidate.fraction, "acceptable placement");
            return Ok(Placement {
                x: candidate.x,
                y: candidate.y,
                size,
                overlap_fraction: candidate.fraction,
                quality: PlacementQuality::Acceptable,
            });
        }
        bests.push(candidate);
    }

    // No acceptable hit at any size. Sizes were visited in descending order,
    // so the first fallback-grade candidate is also the largest.
    if let Some(c) = bests.iter().find(|c| c.fraction <= params.fallback) {
        debug!(size = c.size, overlap = c.fraction, "fallback placement");
        return Ok(Placement {
            x: c.x,
            y: c.y,
            size: c.size,
            overlap_fraction: c.fraction,
            quality: PlacementQuality::Fallback,
        });
    }

    let worst_case = bests
        .iter()
        .min_by(|a, b| a.fraction.total_cmp(&b.fraction))
        .expect("at least one fitting size was scanned");
    debug!(size = worst_case.size, overlap = worst_case.fraction, "degraded placement");
    Ok(Placement {
        x: worst_case.x,
        y: worst_case.y,
        size: worst_case.size,
        overlap_fraction: worst_case.fraction,
        quality: PlacementQuality::Degraded,
    })
}

/// Evaluate the four margin corners in preference order and return the first
/// acceptable one. Top-right wins over top-left, then the bottom pair.
fn corner_hit(integral: &IntegralMask, size: u32, params: &SearchParams) -> Option<Placement> {
    let (w, h) = (integral.width(), integral.height());
    let m = params.margin;
    let corners = [
        (w - m - size, m),
        (m, m),
        (w - m - size, h - m - size),
        (m, h - m - size),
    ];

    for (x, y) in corners {
        let fraction = integral.square_fraction(x, y, size);
        if fraction <= params.acceptable {
            debug!(size, x, y, overlap = fraction, "corner placement");
            return Some(Placement {
                x,
                y,
                size,
                overlap_fraction: fraction,
                quality: PlacementQuality::Acceptable,
            });
        }
    }
    None
}

/// Coarse strided scan over all valid positions for one size, then a step-1
/// refinement inside a one-stride window around the best coarse hit. Ties
/// keep the earliest candidate in row-major order, which makes the result
/// deterministic.
fn scan_size(integral: &IntegralMask, size: u32, params: &SearchParams) -> Candidate {
    let (w, h) = (integral.width(), integral.height());
    let m = params.margin;
    let x_max = w - m - size;
    let y_max = h - m - size;
    let step = params.step_floor.max(size / 16).max(1);

    let mut best_x = m;
    let mut best_y = m;
    let mut best_count = integral.rect_count(m, m, size, size);

    let mut y = m;
    while y <= y_max {
        let mut x = m;
        while x <= x_max {
            let count = integral.rect_count(x, y, size, size);
            if count < best_count {
                best_count = count;
                best_x = x;
                best_y = y;
            }
            x += step;
        }
        y += step;
    }

    // Refine locally at full resolution.
    let rx0 = best_x.saturating_sub(step).max(m);
    let ry0 = best_y.saturating_sub(step).max(m);
    let rx1 = (best_x + step).min(x_max);
    let ry1 = (best_y + step).min(y_max);
    for y in ry0..=ry1 {
        for x in rx0..=rx1 {
            let count = integral.rect_count(x, y, size, size);
            if count < best_count {
                best_count = count;
                best_x = x;
                best_y = y;
            }
        }
    }

    Candidate {
        size,
        x: best_x,
        y: best_y,
        fraction: best_count as f64 / (size as f64 * size as f64),
    }
}
