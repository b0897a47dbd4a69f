// Rasterization collaborator. Binds pdfium once and renders pages to RGB
// buffers at the job's working DPI; pdfium itself is single-threaded, so a
// Rasterizer stays on the rendering thread and only its output crosses
// into the worker pool.

use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::Path;

use crate::error::{Result, StampwiseError};

/// A bound pdfium instance. Construct one per job and reuse it for every
/// page; binding the shared library is the expensive part.
///
/// The library is taken from `PDFIUM_DYNAMIC_LIB_PATH` when that variable
/// names a directory, otherwise from the system library search path.
pub struct Rasterizer {
    pdfium: Pdfium,
}

impl Rasterizer {
    pub fn new() -> Result<Self> {
        let bindings = match std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
            Ok(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
                    .map_err(|e| {
                        StampwiseError::render(format!(
                            "no usable pdfium library under PDFIUM_DYNAMIC_LIB_PATH={dir}: {e}"
                        ))
                    })?
            }
            Err(_) => Pdfium::bind_to_system_library().map_err(|e| {
                StampwiseError::render(format!(
                    "pdfium not found on the system library path \
                     (set PDFIUM_DYNAMIC_LIB_PATH to its directory): {e}"
                ))
            })?,
        };
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self, pdf_path: &Path) -> Result<u32> {
        Ok(self.open(pdf_path)?.pages().len() as u32)
    }

    /// Render one page (0-indexed) to an RGB raster at `dpi`. The raster
    /// keeps the page geometry: a point of user space becomes `dpi / 72`
    /// pixels. Fails when the document cannot be opened, the index is out
    /// of range, or pdfium refuses to render.
    pub fn render_page(&self, pdf_path: &Path, page_index: u32, dpi: u32) -> Result<RgbImage> {
        let document = self.open(pdf_path)?;
        let index = u16::try_from(page_index).map_err(|_| {
            StampwiseError::render(format!("page index {page_index} out of pdfium range"))
        })?;
        let page = document
            .pages()
            .get(index)
            .map_err(|e| StampwiseError::render(format!("no page {page_index}: {e}")))?;

        let scale = dpi as f32 / 72.0;
        let config = PdfRenderConfig::new()
            .set_target_width((page.width().value * scale).round() as i32)
            .set_target_height((page.height().value * scale).round() as i32);

        let bitmap = page.render_with_config(&config).map_err(|e| {
            StampwiseError::render(format!("render of page {page_index} failed: {e}"))
        })?;
        Ok(bitmap.as_image().to_rgb8())
    }

    fn open(&self, pdf_path: &Path) -> Result<PdfDocument<'_>> {
        self.pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
            StampwiseError::render(format!("cannot open {}: {e}", pdf_path.display()))
        })
    }
}
