use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use tracing_subscriber::EnvFilter;

use stampwise::config::job::JobFile;
use stampwise::config::merged::MergedConfig;
use stampwise::config::{self};
use stampwise::pipeline::job_runner::JobConfig;
use stampwise::pipeline::orchestrator::run_all_jobs;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: stampwise <jobs.yaml>...");
        eprintln!("  Stamp each page of the configured PDFs in detected whitespace.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("stampwise {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // Collect job configs from all job files.
    let mut job_configs: Vec<JobConfig> = Vec::new();

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Read and parse the job YAML file.
        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Paths in a job file are relative to the file itself, not to the
        // directory the CLI was launched from.
        let job_dir = job_file_path.parent().unwrap_or_else(|| Path::new("."));
        let against_job_dir = |raw: &str| {
            let p = PathBuf::from(raw);
            if p.is_absolute() { p } else { job_dir.join(p) }
        };

        for job in &job_file.jobs {
            let merged = MergedConfig::new(&settings, job);

            job_configs.push(JobConfig {
                input_path: against_job_dir(&job.input),
                output_path: against_job_dir(&job.output),
                stamp_path: against_job_dir(&job.stamp),
                prefix: merged.prefix,
                index: merged.index,
                first_page_only: merged.first_page_only,
                dpi: merged.dpi,
                parallel_workers: merged.parallel_workers,
                jpeg_quality: merged.jpeg_quality,
                margin: merged.margin,
                acceptable_overlap: merged.acceptable_overlap,
                fallback_overlap: merged.fallback_overlap,
                prefer_corners: merged.prefer_corners,
                fonts_dir: merged.fonts_dir,
                debug_dir: merged.debug_dir,
            });
        }
    }

    // Run all jobs through the pipeline.
    let cancel = AtomicBool::new(false);
    let results = run_all_jobs(&job_configs, &cancel);

    // Report results: one JSON manifest per job on stdout, errors on stderr.
    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(manifest) => {
                match serde_json::to_string(manifest) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("ERROR: Failed to serialize manifest: {e}");
                        has_error = true;
                    }
                }
                eprintln!(
                    "OK: {} -> {} ({} pages)",
                    manifest.input, manifest.output, manifest.pages_processed
                );
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    job_configs[i].input_path.display(),
                    job_configs[i].output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
