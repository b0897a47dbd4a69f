// Multi-job driver.

use std::sync::atomic::AtomicBool;

use tracing::info;

use super::Manifest;
use crate::pipeline::job_runner::{JobConfig, run_job};

/// Run multiple jobs, collecting results.
/// One job failure does NOT prevent other jobs from running; cancellation
/// stops every job at its next page boundary.
pub fn run_all_jobs(jobs: &[JobConfig], cancel: &AtomicBool) -> Vec<crate::error::Result<Manifest>> {
    info!(job_count = jobs.len(), "starting job execution");
    let results: Vec<_> = jobs.iter().map(|job| run_job(job, cancel)).collect();
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(succeeded, failed, "all jobs finished");
    results
}
