use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

/// One stamping job: a source PDF, a stamp image, and the piece numbering.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    /// Path to the stamp raster (PNG with alpha).
    pub stamp: String,
    /// Piece-number prefix, e.g. "DOC" for "Pièce n° DOC-7".
    pub prefix: Option<String>,
    /// Piece number of the document's first page. Defaults to 1.
    pub index: Option<u32>,
    /// Stamp only the first page; the rest pass through unstamped.
    pub first_page_only: Option<bool>,
    /// Per-job DPI override.
    pub dpi: Option<u32>,
}
