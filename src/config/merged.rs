use std::path::PathBuf;

use super::job::Job;
use super::settings::Settings;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub prefix: String,
    pub index: u32,
    pub first_page_only: bool,
    pub dpi: u32,
    pub parallel_workers: usize,
    pub jpeg_quality: u8,
    pub margin: u32,
    pub acceptable_overlap: f64,
    pub fallback_overlap: f64,
    pub prefer_corners: bool,
    pub fonts_dir: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

impl MergedConfig {
    /// Job values win over settings where the job provides one.
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            prefix: job.prefix.clone().unwrap_or_default(),
            index: job.index.unwrap_or(1),
            first_page_only: job.first_page_only.unwrap_or(false),
            dpi: job.dpi.unwrap_or(settings.dpi),
            parallel_workers: settings.parallel_workers,
            jpeg_quality: settings.jpeg_quality,
            margin: settings.margin,
            acceptable_overlap: settings.acceptable_overlap,
            fallback_overlap: settings.fallback_overlap,
            prefer_corners: settings.prefer_corners,
            fonts_dir: settings.fonts_dir.clone(),
            debug_dir: settings.debug_dir.clone(),
        }
    }
}
