use std::path::{Path, PathBuf};

use crate::core::{AppConfig, ConfigurationError};

/// Location of the composite video and its per-segment duration list.
#[derive(Debug, Clone)]
pub struct MediaAssets {
    pub media_path: PathBuf,
    pub durations_path: PathBuf,
}

impl MediaAssets {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            media_path: config.media_path(),
            durations_path: config.durations_path(),
        }
    }

    /// Reads the durations, then checks the video is present.
    pub fn load(&self) -> Result<Vec<f64>, ConfigurationError> {
        let durations = read_durations(&self.durations_path)?;
        verify_media(&self.media_path)?;
        log::info!(
            "Found {} segments in {} for {}",
            durations.len(),
            self.durations_path.display(),
            self.media_path.display()
        );
        Ok(durations)
    }
}

/// One duration in seconds per line. Blank lines are skipped; range checks
/// are left to [`crate::core::SegmentTable::build`].
pub fn read_durations(path: &Path) -> Result<Vec<f64>, ConfigurationError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::DurationFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_durations(&content, path)
}

fn parse_durations(content: &str, path: &Path) -> Result<Vec<f64>, ConfigurationError> {
    let mut durations = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        let duration = value.parse::<f64>().map_err(|_| ConfigurationError::MalformedDuration {
            path: path.to_path_buf(),
            line: i + 1,
            value: value.to_string(),
        })?;
        durations.push(duration);
    }
    Ok(durations)
}

pub fn verify_media(path: &Path) -> Result<(), ConfigurationError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigurationError::MissingMedia(path.to_path_buf()))
    }
}
