//! Class lookup by simple or qualified name.
//!
//! Several files may declare classes with the same simple name. Every lookup
//! goes through [`TypeIndex::resolve`], which applies one policy:
//!
//! 1. exact fully-qualified match;
//! 2. an explicit import of the context class ending in `.Name`;
//! 3. a candidate in the context class's package;
//! 4. the last declared candidate.

use std::collections::{BTreeMap, HashMap};
use tiergraph_parser_api::{base_type, ClassRecord, FileInfo};

/// Owns every extracted class record of a build.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    classes: Vec<ClassRecord>,
    by_simple: HashMap<String, Vec<usize>>,
    by_qualified: HashMap<String, Vec<usize>>,
    by_file: BTreeMap<String, Vec<usize>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the classes of every file, in file order.
    pub fn from_files(files: &[FileInfo]) -> Self {
        let mut index = Self::new();
        for file in files {
            let path = file.file_path.display().to_string();
            index.by_file.entry(path).or_default();
            for class in &file.classes {
                index.insert(class.clone());
            }
        }
        index
    }

    pub fn insert(&mut self, class: ClassRecord) {
        let idx = self.classes.len();
        self.by_simple.entry(class.name.clone()).or_default().push(idx);
        self.by_qualified
            .entry(class.qualified_name())
            .or_default()
            .push(idx);
        self.by_file
            .entry(class.file_path.clone())
            .or_default()
            .push(idx);
        self.classes.push(class);
    }

    /// All classes in declaration order
    pub fn classes(&self) -> &[ClassRecord] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes declared in `file_path`
    pub fn classes_in_file(&self, file_path: &str) -> Vec<&ClassRecord> {
        self.by_file
            .get(file_path)
            .map(|ids| ids.iter().map(|&i| &self.classes[i]).collect())
            .unwrap_or_default()
    }

    /// Parsed files with their classes, sorted by path
    pub fn files(&self) -> impl Iterator<Item = (&str, Vec<&ClassRecord>)> {
        self.by_file.iter().map(move |(path, ids)| {
            (
                path.as_str(),
                ids.iter().map(|&i| &self.classes[i]).collect(),
            )
        })
    }

    /// Resolve a type name as seen from `context`.
    ///
    /// Generic arguments are ignored. A qualified name that is not declared
    /// in the project falls back to its simple name.
    pub fn resolve(&self, name: &str, context: Option<&ClassRecord>) -> Option<&ClassRecord> {
        let name = base_type(name);
        if name.is_empty() {
            return None;
        }

        if let Some(&idx) = self.by_qualified.get(name).and_then(|ids| ids.last()) {
            return Some(&self.classes[idx]);
        }

        let simple = name.rsplit('.').next().unwrap_or(name);
        let candidates = self.by_simple.get(simple)?;

        if let Some(context) = context {
            let suffix = format!(".{simple}");
            for import in context.imports.iter().filter(|i| i.ends_with(&suffix)) {
                if let Some(&idx) = candidates
                    .iter()
                    .rev()
                    .find(|&&i| self.classes[i].qualified_name() == *import)
                {
                    return Some(&self.classes[idx]);
                }
            }

            if let Some(&idx) = candidates
                .iter()
                .rev()
                .find(|&&i| self.classes[i].package == context.package)
            {
                return Some(&self.classes[idx]);
            }
        }

        candidates.last().map(|&idx| &self.classes[idx])
    }

    /// True when `name` resolves to a project class
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name, None).is_some()
    }
}
