use crate::{config::ParserConfig, errors::ParserError, metrics::ParserMetrics, ClassRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Names recovered by the pattern scanner when structural parsing fails
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackScan {
    pub classes: Vec<String>,
    pub methods: Vec<String>,
    pub fields: Vec<String>,
}

/// Information about a successfully extracted file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path to the source file
    pub file_path: PathBuf,

    /// Package declared by the file ("" if absent)
    pub package: String,

    /// Class records in declaration order (nested types follow their parent)
    pub classes: Vec<ClassRecord>,

    /// Encoding that decoded the file, if it was read from disk
    pub encoding: Option<String>,

    /// Present when the records came from the pattern scanner
    pub fallback: Option<FallbackScan>,

    /// Time taken to parse this file
    #[serde(with = "duration_serde")]
    pub parse_time: Duration,

    /// Number of lines in the file
    pub line_count: usize,

    /// File size in bytes
    pub byte_count: usize,
}

// Helper module for serializing Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: u64 = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl FileInfo {
    pub fn new(file_path: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            package: package.into(),
            classes: Vec::new(),
            encoding: None,
            fallback: None,
            parse_time: Duration::ZERO,
            line_count: 0,
            byte_count: 0,
        }
    }

    /// Total number of methods across all classes of the file
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    /// True when the structural parse failed and the pattern scanner was used
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Aggregate information about an extracted project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Information about each successfully extracted file, in input order
    pub files: Vec<FileInfo>,

    /// Total number of classes across all files
    pub total_classes: usize,

    /// Total number of methods across all files
    pub total_methods: usize,

    /// Total parse time for all files
    #[serde(with = "duration_serde")]
    pub total_parse_time: Duration,

    /// Files that failed to parse (path, error message)
    pub failed_files: Vec<(PathBuf, String)>,

    /// Files recovered only through the pattern scanner
    pub degraded_files: Vec<PathBuf>,
}

impl ProjectInfo {
    /// Fold one per-file outcome into the aggregate.
    pub fn record(&mut self, path: &Path, result: Result<FileInfo, ParserError>) {
        match result {
            Ok(info) => {
                self.total_classes += info.classes.len();
                self.total_methods += info.method_count();
                self.total_parse_time += info.parse_time;
                if info.is_degraded() {
                    self.degraded_files.push(info.file_path.clone());
                }
                self.files.push(info);
            }
            Err(e) => {
                self.failed_files.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    /// Total number of files processed (success + failure)
    pub fn total_files(&self) -> usize {
        self.files.len() + self.failed_files.len()
    }

    /// Success rate (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_files() == 0 {
            0.0
        } else {
            self.files.len() as f64 / self.total_files() as f64
        }
    }

    /// All class records, in file order
    pub fn classes(&self) -> impl Iterator<Item = &ClassRecord> {
        self.files.iter().flat_map(|f| f.classes.iter())
    }
}

/// Core trait that all source extractors implement
///
/// An extractor turns one source file into [`ClassRecord`]s. It never panics on
/// malformed input; failures are returned as [`ParserError`] values and the
/// caller decides whether to skip the file.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to support parallel extraction.
pub trait SourceExtractor: Send + Sync {
    /// Returns the language identifier (lowercase, e.g., "java")
    fn language(&self) -> &str;

    /// Returns supported file extensions (e.g., [".java"])
    fn file_extensions(&self) -> &[&str];

    /// Extract a single file from disk
    ///
    /// **Note on Metrics**: This method updates extractor metrics.
    ///
    /// # Errors
    /// Returns `ParserError` if:
    /// - File cannot be read or decoded
    /// - Source code has syntax errors and no fallback applies
    fn parse_file(&self, path: &Path) -> Result<FileInfo, ParserError>;

    /// Extract in-memory source
    ///
    /// **Note on Metrics**: This method does NOT update metrics, so that
    /// `parse_file()` can call it without double-counting.
    fn parse_source(&self, source: &str, file_path: &Path) -> Result<FileInfo, ParserError>;

    /// Extract multiple files (can be overridden for parallel extraction)
    ///
    /// One file's failure never aborts the batch.
    fn parse_files(&self, paths: &[PathBuf]) -> Result<ProjectInfo, ParserError> {
        let mut project = ProjectInfo::default();
        for path in paths {
            project.record(path, self.parse_file(path));
        }
        Ok(project)
    }

    /// Extract a directory recursively
    fn parse_directory(&self, dir: &Path) -> Result<ProjectInfo, ParserError> {
        let paths = self.discover_files(dir)?;
        self.parse_files(&paths)
    }

    /// Discover parseable files in a directory, sorted by path
    ///
    /// Default implementation walks the directory and filters by extension.
    fn discover_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ParserError> {
        use std::fs;

        let mut files = Vec::new();
        let extensions = self.file_extensions();

        fn walk_dir(
            dir: &Path,
            extensions: &[&str],
            files: &mut Vec<PathBuf>,
        ) -> Result<(), ParserError> {
            if !dir.is_dir() {
                return Ok(());
            }

            for entry in
                fs::read_dir(dir).map_err(|e| ParserError::IoError(dir.to_path_buf(), e))?
            {
                let entry = entry.map_err(|e| ParserError::IoError(dir.to_path_buf(), e))?;
                let path = entry.path();

                if path.is_dir() {
                    walk_dir(&path, extensions, files)?;
                } else if let Some(ext) = path.extension() {
                    let ext_str = format!(".{}", ext.to_string_lossy());
                    if extensions.contains(&ext_str.as_str()) {
                        files.push(path);
                    }
                }
            }

            Ok(())
        }

        walk_dir(dir, extensions, &mut files)?;
        if self.config().skip_tests {
            files.retain(|p| !is_test_source(p));
        }
        files.sort();
        Ok(files)
    }

    /// Check if this extractor can handle the given file
    fn can_parse(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_str = format!(".{}", ext.to_string_lossy());
            self.file_extensions().contains(&ext_str.as_str())
        } else {
            false
        }
    }

    /// Get extractor configuration
    fn config(&self) -> &ParserConfig;

    /// Get accumulated metrics
    fn metrics(&self) -> ParserMetrics;

    /// Reset metrics
    fn reset_metrics(&mut self);
}

fn is_test_source(path: &Path) -> bool {
    let in_test_dir = path
        .components()
        .any(|c| c.as_os_str() == "test" || c.as_os_str() == "tests");
    let test_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.ends_with("Test") || s.ends_with("Tests"))
        .unwrap_or(false);
    in_test_dir || test_name
}
