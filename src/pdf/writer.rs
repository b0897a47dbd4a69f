// Output assembly: one full-page JPEG XObject per stamped page, collected
// under a shared Pages node and saved as a fresh document.

use lopdf::{Document, Object, Stream, dictionary};

use crate::error::{Result, StampwiseError};

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f64 = 72.0;

/// Builds the stamped output PDF page by page.
///
/// The Pages node is reserved up front; each `write_image_page` call adds
/// one page whose content is a single image draw, sized so the page keeps
/// the source geometry at the render DPI.
pub struct StampedPageWriter {
    doc: Document,
    pages_id: lopdf::ObjectId,
    kids: Vec<lopdf::ObjectId>,
}

impl Default for StampedPageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StampedPageWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Content stream drawing a full-page image: `q w 0 0 h 0 0 cm /Im0 Do Q`.
    pub fn build_page_content_stream(width_pts: f64, height_pts: f64) -> Vec<u8> {
        format!("q\n{width_pts:.4} 0 0 {height_pts:.4} 0 0 cm\n/Im0 Do\nQ\n").into_bytes()
    }

    /// Append one page backed by a JPEG of `width_px x height_px` rendered at
    /// `dpi`. The media box derives from the pixel size (`pts = px * 72 / dpi`).
    pub fn write_image_page(
        &mut self,
        jpeg_data: &[u8],
        width_px: u32,
        height_px: u32,
        dpi: u32,
    ) -> Result<lopdf::ObjectId> {
        if dpi == 0 {
            return Err(StampwiseError::pdf_write("page DPI must be positive"));
        }

        let width_pts = width_px as f64 * POINTS_PER_INCH / dpi as f64;
        let height_pts = height_px as f64 * POINTS_PER_INCH / dpi as f64;

        let image_id = self.doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width_px as i64,
                "Height" => height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg_data.to_vec(),
        )));

        let content = Self::build_page_content_stream(width_pts, height_pts);
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content)));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(width_pts as f32),
                Object::Real(height_pts as f32),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });

        self.kids.push(page_id);
        Ok(page_id)
    }

    /// Finalize the Pages/Catalog structure and serialize the document.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(StampwiseError::pdf_write("document has no pages"));
        }

        let kids: Vec<Object> = self.kids.iter().map(|&id| id.into()).collect();
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| StampwiseError::pdf_write(e.to_string()))?;
        Ok(buf)
    }
}
