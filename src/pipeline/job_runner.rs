// Per-job driver: render pages in bounded batches, fan the pixel work out
// over a sized worker pool, then assemble the output PDF in page order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use super::page_processor::{PageContext, ProcessedPage, process_page};
use super::{Manifest, PageRecord};
use crate::error::{Result, StampwiseError};
use crate::pdf::writer::StampedPageWriter;
use crate::render::pdfium::Rasterizer;
use crate::stamp::compositor::Compositor;

/// Configuration for a single stamping job.
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub stamp_path: PathBuf,
    pub prefix: String,
    /// Piece number of the first page.
    pub index: u32,
    pub first_page_only: bool,
    /// Working DPI; 0 selects the adaptive tier.
    pub dpi: u32,
    /// Worker threads; 0 selects the adaptive tier.
    pub parallel_workers: usize,
    pub jpeg_quality: u8,
    pub margin: u32,
    pub acceptable_overlap: f64,
    pub fallback_overlap: f64,
    pub prefer_corners: bool,
    pub fonts_dir: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

/// Adaptive worker/DPI tiers by document size. Short documents afford a
/// higher analysis resolution; long ones trade it for throughput.
pub fn tune_for_page_count(pages: u32) -> (usize, u32) {
    if pages < 100 {
        (4, 250)
    } else if pages <= 300 {
        (8, 200)
    } else {
        (12, 150)
    }
}

/// Run one job: rasterize, locate, stamp, and write the output PDF.
///
/// Rendering stays sequential (pdfium is single-threaded); each rendered
/// batch is processed in parallel on the job's pool. Batches are sized to
/// the worker count, which also bounds in-flight page memory. The
/// cancellation flag is observed between batches only.
pub fn run_job(config: &JobConfig, cancel: &AtomicBool) -> Result<Manifest> {
    let rasterizer = Rasterizer::new()?;
    let total_pages = rasterizer.page_count(&config.input_path)?;
    if total_pages == 0 {
        return Err(StampwiseError::render(format!(
            "{} has no pages",
            config.input_path.display()
        )));
    }

    let (auto_workers, auto_dpi) = tune_for_page_count(total_pages);
    let workers = if config.parallel_workers > 0 {
        config.parallel_workers
    } else {
        auto_workers
    };
    let dpi = if config.dpi > 0 { config.dpi } else { auto_dpi };

    info!(
        input = %config.input_path.display(),
        pages = total_pages,
        workers,
        dpi,
        "starting job"
    );

    let compositor = Compositor::new(&config.stamp_path, config.fonts_dir.as_deref())?;
    if let Some(dir) = &config.debug_dir {
        std::fs::create_dir_all(dir)?;
    }

    let ctx = PageContext {
        working_dpi: dpi,
        jpeg_quality: config.jpeg_quality,
        prefix: &config.prefix,
        base_index: config.index,
        first_page_only: config.first_page_only,
        margin: config.margin,
        acceptable_overlap: config.acceptable_overlap,
        fallback_overlap: config.fallback_overlap,
        prefer_corners: config.prefer_corners,
        compositor: &compositor,
        debug_dir: config.debug_dir.as_deref(),
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| StampwiseError::config(format!("failed to build worker pool: {e}")))?;

    let mut processed: Vec<ProcessedPage> = Vec::with_capacity(total_pages as usize);
    let mut first = 0u32;
    while first < total_pages {
        if cancel.load(Ordering::Relaxed) {
            warn!(completed = processed.len(), "job cancelled, no further pages submitted");
            break;
        }

        let last = (first + workers as u32).min(total_pages);
        let mut batch = Vec::with_capacity((last - first) as usize);
        for page_index in first..last {
            batch.push((
                page_index,
                rasterizer.render_page(&config.input_path, page_index, dpi)?,
            ));
        }

        let batch_results: Result<Vec<ProcessedPage>> = pool.install(|| {
            batch
                .into_par_iter()
                .map(|(page_index, bitmap)| process_page(page_index, bitmap, &ctx))
                .collect()
        });
        processed.extend(batch_results?);

        first = last;
    }

    // Placements are emitted in page order regardless of completion order.
    processed.sort_by_key(|p| p.page_index);

    if processed.is_empty() {
        return Err(StampwiseError::pdf_write(
            "job cancelled before any page completed",
        ));
    }

    let mut writer = StampedPageWriter::new();
    for page in &processed {
        writer.write_image_page(&page.jpeg, page.width, page.height, dpi)?;
    }
    let pdf_bytes = writer.save_to_bytes()?;
    std::fs::write(&config.output_path, pdf_bytes)?;

    let records: Vec<PageRecord> = processed.into_iter().map(|p| p.record).collect();
    info!(
        output = %config.output_path.display(),
        pages = records.len(),
        "job finished"
    );

    Ok(Manifest {
        input: config.input_path.display().to_string(),
        output: config.output_path.display().to_string(),
        working_dpi: dpi,
        pages_processed: records.len(),
        pages: records,
    })
}
