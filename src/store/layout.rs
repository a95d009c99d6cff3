//! On-disk layout of the store

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::utils::{cleanup_temp_files, day_stamp};

/// Where the daily file and the snapshot queue live, and how they are named
///
/// ```text
/// <data_dir>/
///   delivery_requests_YYYYMMDD.xlsx          live daily file
///   snapshots/
///     delivery_requests_YYYYMMDD_HHMMSS_ffffff.xlsx
///   uploads/                                 optional attachments
/// ```
#[derive(Debug, Clone)]
pub struct StoreLayout {
    /// Directory holding the daily file
    pub data_dir: PathBuf,
    /// Prefix shared by daily and snapshot file names
    pub file_prefix: String,
    /// Spreadsheet extension, without the dot
    pub extension: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/tmp/saved_files"),
            file_prefix: "delivery_requests".to_string(),
            extension: "xlsx".to_string(),
        }
    }
}

impl StoreLayout {
    /// Layout rooted at `data_dir` with default naming
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Deterministic daily file name for `date`
    pub fn daily_name(&self, date: NaiveDate) -> String {
        format!("{}_{}.{}", self.file_prefix, day_stamp(date), self.extension)
    }

    pub fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join(self.daily_name(date))
    }

    /// Whether `name` carries the spreadsheet extension (case-insensitive)
    pub fn has_extension(&self, name: &str) -> bool {
        let suffix = format!(".{}", self.extension.to_ascii_lowercase());
        name.to_ascii_lowercase().ends_with(&suffix)
    }

    /// Create the directory tree and drop temp files from interrupted writes
    ///
    /// Returns the number of temp files removed.
    pub fn prepare(&self) -> io::Result<usize> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.snapshots_dir())?;
        fs::create_dir_all(self.uploads_dir())?;
        cleanup_temp_files(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_daily_name() {
        let layout = StoreLayout::new("/data");
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(layout.daily_name(date), "delivery_requests_20241231.xlsx");
        assert_eq!(
            layout.daily_path(date),
            Path::new("/data/delivery_requests_20241231.xlsx")
        );
    }

    #[test]
    fn test_has_extension_ignores_case() {
        let layout = StoreLayout::default();
        assert!(layout.has_extension("a.XLSX"));
        assert!(!layout.has_extension("a.csv"));
        assert!(!layout.has_extension("xlsx"));
    }

    #[test]
    fn test_prepare_creates_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(temp_dir.path().join("data"));
        fs::create_dir_all(layout.data_dir()).unwrap();
        fs::write(layout.data_dir().join(".stale.xlsx.tmp"), "x").unwrap();

        let cleaned = layout.prepare().unwrap();

        assert_eq!(cleaned, 1);
        assert!(layout.snapshots_dir().is_dir());
        assert!(layout.uploads_dir().is_dir());
    }
}
