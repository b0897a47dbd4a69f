use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Working DPI for detection and output. 0 picks the adaptive tier from
    /// the document's page count.
    pub dpi: u32,
    /// Worker threads per job. 0 picks the adaptive tier.
    pub parallel_workers: usize,
    /// JPEG quality of the embedded page images (1-100).
    pub jpeg_quality: u8,
    /// Page-interior margin in pixels at reference DPI.
    pub margin: u32,
    /// Overlap bound for an acceptable placement.
    pub acceptable_overlap: f64,
    /// Overlap bound for a fallback placement.
    pub fallback_overlap: f64,
    /// Evaluate the four page corners before the full scan.
    pub prefer_corners: bool,
    /// Directory holding the caption font. None stamps without a caption.
    pub fonts_dir: Option<PathBuf>,
    /// When set, one overlay PNG per page is written here.
    pub debug_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dpi: 0,
            parallel_workers: 0,
            jpeg_quality: 85,
            margin: crate::locator::DEFAULT_MARGIN,
            acceptable_overlap: crate::locator::DEFAULT_ACCEPTABLE_OVERLAP,
            fallback_overlap: crate::locator::DEFAULT_FALLBACK_OVERLAP,
            prefer_corners: true,
            fonts_dir: None,
            debug_dir: None,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::StampwiseError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
