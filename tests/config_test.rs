// Settings and job file parsing tests.

use std::io::Write;

use stampwise::config::job::JobFile;
use stampwise::config::load_settings_for_job;
use stampwise::config::merged::MergedConfig;
use stampwise::config::settings::Settings;

// ============================================================
// 1. Settings deserialization
// ============================================================

#[test]
fn test_settings_full_yaml() {
    let yaml = r#"
dpi: 300
parallel_workers: 6
jpeg_quality: 92
margin: 60
acceptable_overlap: 0.01
fallback_overlap: 0.05
prefer_corners: false
fonts_dir: /opt/fonts
debug_dir: /tmp/stampwise-debug
"#;
    let settings = Settings::from_yaml(yaml).expect("should parse full settings");

    assert_eq!(settings.dpi, 300);
    assert_eq!(settings.parallel_workers, 6);
    assert_eq!(settings.jpeg_quality, 92);
    assert_eq!(settings.margin, 60);
    assert_eq!(settings.acceptable_overlap, 0.01);
    assert_eq!(settings.fallback_overlap, 0.05);
    assert!(!settings.prefer_corners);
    assert_eq!(settings.fonts_dir.as_deref().unwrap().to_str(), Some("/opt/fonts"));
    assert!(settings.debug_dir.is_some());
}

#[test]
fn test_settings_partial_yaml_keeps_defaults() {
    let settings = Settings::from_yaml("dpi: 250\n").expect("should parse partial settings");

    assert_eq!(settings.dpi, 250);
    assert_eq!(settings.parallel_workers, 0, "default: adaptive");
    assert_eq!(settings.jpeg_quality, 85);
    assert_eq!(settings.margin, 40);
    assert_eq!(settings.acceptable_overlap, 0.02);
    assert_eq!(settings.fallback_overlap, 0.10);
    assert!(settings.prefer_corners);
    assert!(settings.fonts_dir.is_none());
    assert!(settings.debug_dir.is_none());
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();

    assert_eq!(settings.dpi, 0, "adaptive by default");
    assert_eq!(settings.parallel_workers, 0, "adaptive by default");
    assert_eq!(settings.jpeg_quality, 85);
    assert_eq!(settings.margin, 40);
}

#[test]
fn test_settings_invalid_yaml_errors() {
    let result = Settings::from_yaml("dpi: [not, a, number]\n");
    assert!(result.is_err(), "should fail on malformed settings");
}

// ============================================================
// 2. Job file deserialization
// ============================================================

#[test]
fn test_job_file_minimal() {
    let yaml = r#"
jobs:
  - input: contract.pdf
    output: contract_stamped.pdf
    stamp: stamp.png
"#;
    let job_file: JobFile = serde_yml::from_str(yaml).expect("should parse job file");

    assert_eq!(job_file.jobs.len(), 1);
    let job = &job_file.jobs[0];
    assert_eq!(job.input, "contract.pdf");
    assert_eq!(job.output, "contract_stamped.pdf");
    assert_eq!(job.stamp, "stamp.png");
    assert!(job.prefix.is_none());
    assert!(job.index.is_none());
    assert!(job.first_page_only.is_none());
    assert!(job.dpi.is_none());
}

#[test]
fn test_job_file_full() {
    let yaml = r#"
jobs:
  - input: a.pdf
    output: a_out.pdf
    stamp: stamp.png
    prefix: DOC
    index: 7
    first_page_only: true
    dpi: 300
  - input: b.pdf
    output: b_out.pdf
    stamp: stamp.png
"#;
    let job_file: JobFile = serde_yml::from_str(yaml).expect("should parse job file");

    assert_eq!(job_file.jobs.len(), 2);
    let job = &job_file.jobs[0];
    assert_eq!(job.prefix.as_deref(), Some("DOC"));
    assert_eq!(job.index, Some(7));
    assert_eq!(job.first_page_only, Some(true));
    assert_eq!(job.dpi, Some(300));
}

#[test]
fn test_job_file_missing_stamp_errors() {
    let yaml = r#"
jobs:
  - input: a.pdf
    output: a_out.pdf
"#;
    let result: Result<JobFile, _> = serde_yml::from_str(yaml);
    assert!(result.is_err(), "stamp path is required");
}

// ============================================================
// 3. Merged configuration
// ============================================================

#[test]
fn test_merged_job_overrides_settings() {
    let settings = Settings::from_yaml("dpi: 200\n").expect("settings");
    let yaml = r#"
jobs:
  - input: a.pdf
    output: out.pdf
    stamp: s.png
    prefix: PC
    index: 3
    dpi: 150
"#;
    let job_file: JobFile = serde_yml::from_str(yaml).expect("job file");

    let merged = MergedConfig::new(&settings, &job_file.jobs[0]);
    assert_eq!(merged.dpi, 150, "job dpi wins");
    assert_eq!(merged.prefix, "PC");
    assert_eq!(merged.index, 3);
    assert!(!merged.first_page_only);
}

#[test]
fn test_merged_falls_back_to_settings() {
    let settings = Settings::from_yaml("dpi: 240\njpeg_quality: 70\n").expect("settings");
    let yaml = r#"
jobs:
  - input: a.pdf
    output: out.pdf
    stamp: s.png
"#;
    let job_file: JobFile = serde_yml::from_str(yaml).expect("job file");

    let merged = MergedConfig::new(&settings, &job_file.jobs[0]);
    assert_eq!(merged.dpi, 240);
    assert_eq!(merged.jpeg_quality, 70);
    assert_eq!(merged.prefix, "");
    assert_eq!(merged.index, 1, "first piece number defaults to 1");
}

// ============================================================
// 4. Settings discovery next to the job file
// ============================================================

#[test]
fn test_load_settings_for_job_reads_sibling_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings_path = dir.path().join("settings.yaml");
    let mut f = std::fs::File::create(&settings_path).expect("create settings");
    writeln!(f, "dpi: 275").expect("write settings");

    let job_path = dir.path().join("jobs.yaml");
    std::fs::File::create(&job_path).expect("create job file");

    let settings = load_settings_for_job(&job_path).expect("load settings");
    assert_eq!(settings.dpi, 275);
}

#[test]
fn test_load_settings_for_job_defaults_when_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let job_path = dir.path().join("jobs.yaml");
    std::fs::File::create(&job_path).expect("create job file");

    let settings = load_settings_for_job(&job_path).expect("load settings");
    assert_eq!(settings.dpi, 0);
    assert_eq!(settings.jpeg_quality, 85);
}
