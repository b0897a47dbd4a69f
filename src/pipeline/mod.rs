// Page coordinator: drives rasterize -> locate -> composite -> encode per
// page and assembles the result manifest. All parallelism lives here; the
// locator core stays sequential and pure.

pub mod jpeg;
pub mod job_runner;
pub mod orchestrator;
pub mod overlay;
pub mod page_processor;

use serde::Serialize;

use crate::locator::StampPlan;

/// Outcome of one page, as reported in the job manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Stamped within the acceptable or fallback overlap bounds.
    Stamped,
    /// Stamped, but every candidate exceeded the fallback bound.
    DegradedStamp,
    /// Left unstamped; `reason` says why.
    Skipped,
}

/// One manifest row. Pages appear exactly once, in ascending page order.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub page_number: u32,
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<StampPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_fraction: Option<f64>,
}

/// Per-job result manifest, printed as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub input: String,
    pub output: String,
    pub working_dpi: u32,
    pub pages_processed: usize,
    pub pages: Vec<PageRecord>,
}
