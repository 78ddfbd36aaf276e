//! Per-run cache of extracted files.
//!
//! Entries are keyed by path, modification time and length, so an edited
//! file misses the cache. Each entry is computed at most once even when
//! several workers ask for the same file concurrently; failed extractions are
//! not cached.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use tiergraph_parser_api::{FileInfo, ParserError, ParserResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

impl CacheKey {
    fn for_path(path: &Path) -> ParserResult<Self> {
        let metadata = fs::metadata(path).map_err(|e| ParserError::IoError(path.to_path_buf(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

type Slot = Arc<OnceCell<Arc<FileInfo>>>;

#[derive(Debug, Default)]
pub struct ParseCache {
    entries: Mutex<HashMap<CacheKey, Slot>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry for `path`, computing it with `parse` on a miss.
    ///
    /// The boolean is true when the entry was already present.
    pub fn get_or_parse<F>(&self, path: &Path, parse: F) -> ParserResult<(Arc<FileInfo>, bool)>
    where
        F: FnOnce() -> ParserResult<FileInfo>,
    {
        let key = CacheKey::for_path(path)?;
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop stale entries for this path
            entries.retain(|k, _| k.path != key.path || *k == key);
            Arc::clone(entries.entry(key).or_default())
        };

        if let Some(info) = slot.get() {
            return Ok((Arc::clone(info), true));
        }

        // The map lock is released: other files proceed while this one parses
        let mut computed = false;
        let info = slot.get_or_try_init(|| {
            computed = true;
            parse().map(Arc::new)
        })?;
        Ok((Arc::clone(info), !computed))
    }

    /// Number of computed entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_second_lookup_hits() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "class A {{}}").unwrap();
        let cache = ParseCache::new();

        let (first, hit) = cache
            .get_or_parse(file.path(), || Ok(FileInfo::new(file.path(), "p")))
            .unwrap();
        assert!(!hit);

        let (second, hit) = cache
            .get_or_parse(file.path(), || panic!("must not recompute"))
            .unwrap();
        assert!(hit);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_modified_file_misses() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "class A {{}}").unwrap();
        let cache = ParseCache::new();
        cache
            .get_or_parse(file.path(), || Ok(FileInfo::new(file.path(), "old")))
            .unwrap();

        writeln!(file, "class B {{}}").unwrap();
        file.flush().unwrap();
        let (info, hit) = cache
            .get_or_parse(file.path(), || Ok(FileInfo::new(file.path(), "new")))
            .unwrap();
        assert!(!hit);
        assert_eq!(info.package, "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let file = NamedTempFile::new().unwrap();
        let cache = ParseCache::new();
        let result = cache.get_or_parse(file.path(), || {
            Err(ParserError::Timeout(file.path().to_path_buf()))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());

        let (_, hit) = cache
            .get_or_parse(file.path(), || Ok(FileInfo::new(file.path(), "")))
            .unwrap();
        assert!(!hit);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let cache = ParseCache::new();
        let result = cache.get_or_parse(Path::new("/nonexistent/Nope.java"), || {
            Ok(FileInfo::new("Nope.java", ""))
        });
        assert!(matches!(result, Err(ParserError::IoError(_, _))));
    }
}
