use std::path::{Path, PathBuf};

/// Directory name used under the home directory when none is configured
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "charles_output";

/// Where the log parser drops its JSON files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub output_dir: PathBuf,
}

impl DashboardConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Use the given directory, or `~/charles_output` when none was supplied
    pub fn with_override(output_dir: Option<PathBuf>) -> Self {
        output_dir.map(Self::new).unwrap_or_default()
    }

    pub fn default_output_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_OUTPUT_DIR_NAME)
    }

    /// Resolve a log file argument
    ///
    /// Paths that exist are used as given. A relative path that does not
    /// exist is looked up inside the output directory, so bare file names
    /// from `charlog list` work from anywhere.
    pub fn resolve_log(&self, file: &Path) -> PathBuf {
        if file.exists() || file.is_absolute() {
            return file.to_path_buf();
        }

        let candidate = self.output_dir.join(file);
        if candidate.exists() {
            tracing::debug!("Resolved {} to {}", file.display(), candidate.display());
            candidate
        } else {
            file.to_path_buf()
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::new(Self::default_output_dir())
    }
}
