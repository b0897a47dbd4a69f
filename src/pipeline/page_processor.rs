// Per-page processing: locate the stamp on a rendered raster, composite it,
// and encode the page for embedding. Pure CPU work, safe to fan out.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use tracing::{debug, warn};

use super::jpeg::{encode_rgb_to_jpeg, encode_rgba_to_jpeg};
use super::overlay;
use super::{PageRecord, PageStatus};
use crate::error::{Result, StampwiseError};
use crate::locator::{self, LocatorOptions, PageRaster, PlacementQuality};
use crate::stamp::Caption;
use crate::stamp::compositor::Compositor;

/// Shared, read-only inputs for every page of one job.
pub struct PageContext<'a> {
    pub working_dpi: u32,
    pub jpeg_quality: u8,
    pub prefix: &'a str,
    /// Piece number of the first page; later pages advance from it.
    pub base_index: u32,
    pub first_page_only: bool,
    pub margin: u32,
    pub acceptable_overlap: f64,
    pub fallback_overlap: f64,
    pub prefer_corners: bool,
    pub compositor: &'a Compositor,
    pub debug_dir: Option<&'a Path>,
}

impl PageContext<'_> {
    fn locator_options(&self, debug_sink: Option<locator::DebugSink>) -> LocatorOptions {
        LocatorOptions {
            working_dpi: self.working_dpi,
            size_sequence: None,
            acceptable_overlap: self.acceptable_overlap,
            fallback_overlap: self.fallback_overlap,
            margin: self.margin,
            prefer_corners: self.prefer_corners,
            debug_sink,
        }
    }
}

/// Single page processing result: the encoded page plus its manifest row.
pub struct ProcessedPage {
    pub page_index: u32,
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub record: PageRecord,
}

/// Process one rendered page: locate -> composite -> JPEG.
///
/// The locator refusing a page (`PageTooSmall`, `InvalidRaster`) is not a
/// job failure: the page is embedded unstamped and its manifest row says
/// why. Everything else propagates and fails the job.
pub fn process_page(page_index: u32, bitmap: RgbImage, ctx: &PageContext) -> Result<ProcessedPage> {
    let page_number = page_index + 1;
    let (width, height) = (bitmap.width(), bitmap.height());
    if width == 0 || height == 0 {
        return Err(StampwiseError::render(format!(
            "page {page_number} rendered to an empty bitmap"
        )));
    }

    if ctx.first_page_only && page_index > 0 {
        let jpeg = encode_rgb_to_jpeg(&bitmap, ctx.jpeg_quality)?;
        return Ok(ProcessedPage {
            page_index,
            jpeg,
            width,
            height,
            record: PageRecord {
                page_number,
                status: PageStatus::Skipped,
                reason: Some("first-page-only".to_string()),
                plan: None,
                overlap_fraction: None,
            },
        });
    }

    let debug_sink = ctx.debug_dir.map(|dir| debug_sink_for(dir, page_number, &bitmap));
    let opts = ctx.locator_options(debug_sink);
    let raster = PageRaster::new(bitmap)?;
    let located = locator::locate_stamp(&raster, &opts);

    let mut page = DynamicImage::ImageRgb8(raster.as_rgb().clone()).to_rgba8();
    let record = match located {
        Ok(placement) => {
            let plan = placement.plan(page_number);
            let caption = Caption::new(ctx.prefix, ctx.base_index + page_index);
            ctx.compositor.apply(&mut page, &plan, &caption);

            let status = if placement.quality == PlacementQuality::Degraded {
                warn!(
                    page = page_number,
                    overlap = placement.overlap_fraction,
                    "degraded placement, stamp overlaps content"
                );
                PageStatus::DegradedStamp
            } else {
                debug!(
                    page = page_number,
                    x = plan.x,
                    y = plan.y,
                    size = plan.size,
                    overlap = placement.overlap_fraction,
                    "stamp placed"
                );
                PageStatus::Stamped
            };
            PageRecord {
                page_number,
                status,
                reason: None,
                plan: Some(plan),
                overlap_fraction: Some(placement.overlap_fraction),
            }
        }
        Err(e @ (StampwiseError::PageTooSmall { .. } | StampwiseError::InvalidRaster(_))) => {
            warn!(page = page_number, error = %e, "page left unstamped");
            PageRecord {
                page_number,
                status: PageStatus::Skipped,
                reason: Some(e.to_string()),
                plan: None,
                overlap_fraction: None,
            }
        }
        Err(e) => return Err(e),
    };

    let jpeg = encode_rgba_to_jpeg(&page, ctx.jpeg_quality)?;
    Ok(ProcessedPage {
        page_index,
        jpeg,
        width,
        height,
        record,
    })
}

/// Debug capability: a sink that renders the canonical overlay PNG for one
/// page. Owns a copy of the raster so the closure stays `'static`.
fn debug_sink_for(dir: &Path, page_number: u32, bitmap: &RgbImage) -> locator::DebugSink {
    let base = bitmap.clone();
    let path: PathBuf = dir.join(format!("debug_page_{page_number:03}.png"));
    Box::new(move |event: &locator::DebugEvent<'_>| {
        if let Err(e) = overlay::write_overlay(&base, event, &path) {
            warn!(path = %path.display(), error = %e, "failed to write debug overlay");
        }
    })
}
