//! Implementation of the SourceExtractor trait for Java

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tiergraph_parser_api::{
    FileInfo, ParserConfig, ParserError, ParserMetrics, ProjectInfo, SourceEncoding,
    SourceExtractor,
};

use crate::cache::ParseCache;
use crate::decode::{decode_bytes, DecodedSource};
use crate::extractor;
use crate::fallback;

/// Java structural extractor implementing the SourceExtractor trait
pub struct JavaParser {
    config: ParserConfig,
    metrics: Mutex<ParserMetrics>,
    cache: ParseCache,
}

impl JavaParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            metrics: Mutex::new(ParserMetrics::default()),
            cache: ParseCache::new(),
        }
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    /// Read and decode a file, honoring the size limit and encoding list.
    pub fn read_source(&self, path: &Path) -> Result<DecodedSource, ParserError> {
        let metadata =
            fs::metadata(path).map_err(|e| ParserError::IoError(path.to_path_buf(), e))?;

        if metadata.len() as usize > self.config.max_file_size {
            return Err(ParserError::FileTooLarge(
                path.to_path_buf(),
                metadata.len() as usize,
            ));
        }

        let bytes = fs::read(path).map_err(|e| ParserError::IoError(path.to_path_buf(), e))?;
        decode_bytes(&bytes, &self.config.encodings, path)
    }

    fn update_metrics(&self, result: &Result<FileInfo, ParserError>, duration: Duration, cached: bool) {
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.files_attempted += 1;
        metrics.total_parse_time += duration;
        if cached {
            metrics.cache_hits += 1;
        }
        match result {
            Ok(info) => {
                metrics.files_succeeded += 1;
                metrics.total_classes += info.classes.len();
                metrics.total_methods += info.method_count();
                if info.is_degraded() {
                    metrics.files_degraded += 1;
                }
            }
            Err(_) => metrics.files_failed += 1,
        }
    }

    /// Structural extraction with the pattern scanner as a fallback.
    fn analyze_text(
        &self,
        text: &str,
        path: &Path,
        encoding: Option<SourceEncoding>,
    ) -> Result<FileInfo, ParserError> {
        let start = Instant::now();
        let result = match extractor::extract(text, path, &self.config) {
            Ok(info) => Ok(info),
            Err(e) if e.is_recoverable() && self.config.fallback_on_error => {
                warn!("{e}; using pattern fallback");
                Ok(self.degraded_info(text, path))
            }
            Err(e) => Err(e),
        };

        result.map(|mut info| {
            info.encoding = encoding.map(|e| e.label().to_string());
            info.parse_time = start.elapsed();
            info.line_count = text.lines().count();
            info.byte_count = text.len();
            info
        })
    }

    fn degraded_info(&self, text: &str, path: &Path) -> FileInfo {
        let path_str = path.display().to_string();
        let classes = fallback::skeletal_classes(text, &path_str);
        let package = classes.first().map(|c| c.package.clone()).unwrap_or_default();

        let mut info = FileInfo::new(path, package);
        info.classes = classes;
        info.fallback = Some(fallback::fallback_scan(text));
        info
    }

    fn parse_uncached(&self, path: &Path) -> Result<FileInfo, ParserError> {
        let decoded = self.read_source(path)?;
        self.analyze_text(&decoded.text, path, Some(decoded.encoding))
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for JavaParser {
    fn language(&self) -> &str {
        "java"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".java"]
    }

    fn parse_file(&self, path: &Path) -> Result<FileInfo, ParserError> {
        let start = Instant::now();
        let cached = self
            .cache
            .get_or_parse(path, || self.parse_uncached(path));

        let (result, hit) = match cached {
            Ok((info, hit)) => (Ok(FileInfo::clone(&info)), hit),
            Err(e) => (Err(e), false),
        };

        self.update_metrics(&result, start.elapsed(), hit);
        match &result {
            Ok(info) => debug!(
                "Parsed {} ({} classes{})",
                path.display(),
                info.classes.len(),
                if hit { ", cached" } else { "" }
            ),
            Err(e) => warn!("Skipping {}: {e}", path.display()),
        }
        result
    }

    fn parse_source(&self, source: &str, file_path: &Path) -> Result<FileInfo, ParserError> {
        self.analyze_text(source, file_path, None)
    }

    fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn metrics(&self) -> ParserMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset_metrics(&mut self) {
        *self.metrics.lock().unwrap_or_else(PoisonError::into_inner) = ParserMetrics::default();
    }

    fn parse_files(&self, paths: &[PathBuf]) -> Result<ProjectInfo, ParserError> {
        if self.config.parallel {
            self.parse_files_parallel(paths)
        } else {
            self.parse_files_sequential(paths)
        }
    }
}

impl JavaParser {
    /// Parse files sequentially
    fn parse_files_sequential(&self, paths: &[PathBuf]) -> Result<ProjectInfo, ParserError> {
        let mut project = ProjectInfo::default();
        for path in paths {
            project.record(path, self.parse_file(path));
        }
        Ok(project)
    }

    /// Parse files in parallel using rayon; results keep the input order
    fn parse_files_parallel(&self, paths: &[PathBuf]) -> Result<ProjectInfo, ParserError> {
        use rayon::prelude::*;

        // Configure thread pool if parallel_workers is specified
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(num_threads) = self.config.parallel_workers {
            builder = builder.num_threads(num_threads);
        }
        let pool = builder.build().map_err(|e| {
            ParserError::ParseError(PathBuf::new(), format!("Failed to create thread pool: {e}"))
        })?;

        let results: Vec<_> =
            pool.install(|| paths.par_iter().map(|path| self.parse_file(path)).collect());

        let mut project = ProjectInfo::default();
        for (path, result) in paths.iter().zip(results) {
            project.record(path, result);
        }
        Ok(project)
    }
}
