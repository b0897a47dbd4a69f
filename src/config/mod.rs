pub mod job;
pub mod merged;
pub mod settings;

use settings::Settings;
use std::path::Path;

/// Load `settings.yaml` from the job file's directory, falling back to the
/// defaults when the file does not exist.
pub fn load_settings_for_job(job_file_path: &Path) -> crate::error::Result<Settings> {
    let dir = job_file_path.parent().ok_or_else(|| {
        crate::error::StampwiseError::config("Cannot determine job file directory")
    })?;

    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}
