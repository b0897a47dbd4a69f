// Per-page whitespace locator: decides where and how large to draw the
// stamp so it never occludes page content. Pure and stateless per page;
// all parallelism lives in the pipeline.

pub mod content;
pub mod mask;
pub mod morphology;
mod search;

use image::RgbImage;
use serde::Serialize;

use crate::error::{Result, StampwiseError};
use content::ContentMasks;
use mask::{IntegralMask, Mask};

/// Reference DPI at which all pixel constants are expressed.
pub const REF_DPI: u32 = 200;
/// Smallest readable stamp side at reference DPI.
pub const SIZE_MIN: u32 = 90;
/// Largest stamp side at reference DPI.
pub const SIZE_MAX: u32 = 300;
/// Default candidate sides, largest first. A larger stamp always wins.
pub const DEFAULT_SIZES: [u32; 7] = [300, 260, 220, 180, 140, 110, 90];
/// Default page-interior margin at reference DPI.
pub const DEFAULT_MARGIN: u32 = 40;
/// Default overlap bound for an acceptable placement.
pub const DEFAULT_ACCEPTABLE_OVERLAP: f64 = 0.02;
/// Default overlap bound for a fallback placement.
pub const DEFAULT_FALLBACK_OVERLAP: f64 = 0.10;
/// Coarse scan stride floor at reference DPI.
const STEP_FLOOR: u32 = 8;

/// Scale a length constant from reference DPI to the working DPI, rounding
/// to the nearest pixel.
pub fn scale_len(value: u32, working_dpi: u32) -> u32 {
    ((value as u64 * working_dpi as u64 + (REF_DPI as u64 / 2)) / REF_DPI as u64) as u32
}

/// Scale an area constant (px^2) from reference DPI to the working DPI;
/// areas grow with the square of the linear factor.
pub fn scale_area(value: u64, working_dpi: u32) -> u64 {
    let ref_sq = REF_DPI as u64 * REF_DPI as u64;
    (value * working_dpi as u64 * working_dpi as u64 + ref_sq / 2) / ref_sq
}

/// One rasterized page: an immutable 8-bit RGB buffer at a known DPI.
#[derive(Debug, Clone)]
pub struct PageRaster {
    pixels: RgbImage,
}

impl PageRaster {
    /// Wrap a decoded RGB buffer. Zero-sized rasters are malformed input.
    pub fn new(pixels: RgbImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(StampwiseError::invalid_raster(format!(
                "zero-sized raster ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    /// Build from raw interleaved RGB bytes, rejecting buffers whose length
    /// does not match three channels per pixel.
    pub fn from_raw(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(StampwiseError::invalid_raster(format!(
                "RGB buffer of {} bytes does not match {}x{} (expected {})",
                rgb.len(),
                width,
                height,
                expected
            )));
        }
        let pixels = RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| StampwiseError::invalid_raster("RGB buffer construction failed"))?;
        Self::new(pixels)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Placement quality rank, ascending. A placement is acceptable when its
/// overlap stays at or under the acceptable bound, fallback up to the
/// fallback bound, degraded past that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlacementQuality {
    Degraded,
    Fallback,
    Acceptable,
}

/// A chosen stamp square in raster coordinates at the working DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub size: u32,
    /// Forbidden-pixel density inside the square, in `[0, 1]`.
    pub overlap_fraction: f64,
    pub quality: PlacementQuality,
}

impl Placement {
    /// Total order over placements: quality first, then size (bigger is
    /// better), then lower overlap.
    pub fn is_better_than(&self, other: &Placement) -> bool {
        (self.quality, self.size, -self.overlap_fraction)
            > (other.quality, other.size, -other.overlap_fraction)
    }

    /// Boundary form handed to the compositor and the result manifest.
    pub fn plan(&self, page_number: u32) -> StampPlan {
        StampPlan {
            page_number,
            x: self.x,
            y: self.y,
            size: self.size,
        }
    }
}

/// Output boundary type: where to draw the stamp on one page, in raster
/// pixels at the locator's working DPI. Translation to PDF user space is
/// the shell's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StampPlan {
    pub page_number: u32,
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// One diagnostics record per located page, handed to the debug sink.
/// Overlap figures are densities inside the chosen square, one per mask.
pub struct DebugEvent<'a> {
    pub width: u32,
    pub height: u32,
    pub text_mask: &'a Mask,
    pub image_mask: &'a Mask,
    pub qr_mask: &'a Mask,
    pub text_overlap: f64,
    pub image_overlap: f64,
    pub qr_overlap: f64,
    pub union_overlap: f64,
    pub placement: Placement,
}

/// Optional per-page diagnostics callback; the locator's only side channel.
pub type DebugSink = Box<dyn Fn(&DebugEvent<'_>) + Send + Sync>;

/// Locator tuning. All pixel-valued fields are at reference DPI and scale
/// with `working_dpi`.
pub struct LocatorOptions {
    pub working_dpi: u32,
    /// Overrides the default candidate sides; must be strictly descending
    /// and within `[SIZE_MIN, SIZE_MAX]` at reference DPI.
    pub size_sequence: Option<Vec<u32>>,
    pub acceptable_overlap: f64,
    pub fallback_overlap: f64,
    pub margin: u32,
    pub prefer_corners: bool,
    pub debug_sink: Option<DebugSink>,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            working_dpi: REF_DPI,
            size_sequence: None,
            acceptable_overlap: DEFAULT_ACCEPTABLE_OVERLAP,
            fallback_overlap: DEFAULT_FALLBACK_OVERLAP,
            margin: DEFAULT_MARGIN,
            prefer_corners: true,
            debug_sink: None,
        }
    }
}

impl LocatorOptions {
    fn validate(&self) -> Result<()> {
        if self.working_dpi == 0 {
            return Err(StampwiseError::config("working_dpi must be positive"));
        }
        if let Some(sizes) = &self.size_sequence {
            if sizes.is_empty() {
                return Err(StampwiseError::config("size_sequence cannot be empty"));
            }
            for pair in sizes.windows(2) {
                if pair[1] >= pair[0] {
                    return Err(StampwiseError::config(
                        "size_sequence must be strictly descending",
                    ));
                }
            }
            if sizes.iter().any(|&s| !(SIZE_MIN..=SIZE_MAX).contains(&s)) {
                return Err(StampwiseError::config(format!(
                    "size_sequence entries must lie in [{SIZE_MIN}, {SIZE_MAX}]"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.acceptable_overlap)
            || !(0.0..=1.0).contains(&self.fallback_overlap)
            || self.fallback_overlap < self.acceptable_overlap
        {
            return Err(StampwiseError::config(
                "overlap bounds must satisfy 0 <= acceptable <= fallback <= 1",
            ));
        }
        Ok(())
    }

    fn scaled_sizes(&self) -> Vec<u32> {
        self.size_sequence
            .as_deref()
            .unwrap_or(&DEFAULT_SIZES)
            .iter()
            .map(|&s| scale_len(s, self.working_dpi))
            .collect()
    }
}

/// Locate the stamp square for one rasterized page.
///
/// Builds the three content masks, searches their union for the largest
/// square under the overlap bounds, and reports the result. Degraded pages
/// still yield a placement; only malformed rasters and pages that cannot
/// hold the smallest stamp zone are refused.
pub fn locate_stamp(raster: &PageRaster, opts: &LocatorOptions) -> Result<Placement> {
    opts.validate()?;
    let gray = mask::luma(raster.as_rgb());
    let masks = content::build_content_masks(&gray, opts.working_dpi);
    locate_in_masks(&masks, opts)
}

/// Locate against pre-built content masks. `locate_stamp` delegates here;
/// exposed so callers can union external detections (e.g. OCR boxes) into
/// the text mask before searching.
pub fn locate_in_masks(masks: &ContentMasks, opts: &LocatorOptions) -> Result<Placement> {
    opts.validate()?;

    let union = masks.union();
    let integral = IntegralMask::build(&union);

    let params = search::SearchParams {
        sizes: opts.scaled_sizes(),
        margin: scale_len(opts.margin, opts.working_dpi),
        step_floor: scale_len(STEP_FLOOR, opts.working_dpi).max(1),
        acceptable: opts.acceptable_overlap,
        fallback: opts.fallback_overlap,
        prefer_corners: opts.prefer_corners,
    };

    let placement = search::find_placement(&integral, &params)?;

    if let Some(sink) = &opts.debug_sink {
        let event = DebugEvent {
            width: union.width(),
            height: union.height(),
            text_mask: &masks.text,
            image_mask: &masks.image,
            qr_mask: &masks.qr,
            text_overlap: mask_fraction(&masks.text, &placement),
            image_overlap: mask_fraction(&masks.image, &placement),
            qr_overlap: mask_fraction(&masks.qr, &placement),
            union_overlap: placement.overlap_fraction,
            placement,
        };
        sink(&event);
    }

    Ok(placement)
}

fn mask_fraction(mask: &Mask, placement: &Placement) -> f64 {
    IntegralMask::build(mask).square_fraction(placement.x, placement.y, placement.size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_len_rounds_to_nearest() {
        assert_eq!(scale_len(300, 300), 450);
        assert_eq!(scale_len(90, 300), 135);
        assert_eq!(scale_len(40, 150), 30);
        assert_eq!(scale_len(3, 200), 3);
    }

    #[test]
    fn scale_area_is_quadratic() {
        assert_eq!(scale_area(5000, 200), 5000);
        assert_eq!(scale_area(5000, 400), 20000);
        assert_eq!(scale_area(2000, 100), 500);
    }

    #[test]
    fn quality_rank_ascends() {
        assert!(PlacementQuality::Acceptable > PlacementQuality::Fallback);
        assert!(PlacementQuality::Fallback > PlacementQuality::Degraded);
    }

    #[test]
    fn placement_order_prefers_quality_then_size() {
        let a = Placement {
            x: 0,
            y: 0,
            size: 90,
            overlap_fraction: 0.0,
            quality: PlacementQuality::Acceptable,
        };
        let b = Placement {
            x: 0,
            y: 0,
            size: 300,
            overlap_fraction: 0.05,
            quality: PlacementQuality::Fallback,
        };
        assert!(a.is_better_than(&b));

        let c = Placement {
            size: 300,
            ..a
        };
        assert!(c.is_better_than(&a));
    }

    #[test]
    fn options_validation_rejects_bad_sequences() {
        let mut opts = LocatorOptions {
            size_sequence: Some(vec![200, 200]),
            ..Default::default()
        };
        assert!(opts.validate().is_err(), "non-descending");

        opts.size_sequence = Some(vec![400, 200]);
        assert!(opts.validate().is_err(), "out of range");

        opts.size_sequence = Some(vec![300, 150, 90]);
        assert!(opts.validate().is_ok());
    }
}
