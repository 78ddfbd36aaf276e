//! A complete analysis pass over a source tree.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tiergraph::CallChain;
use tiergraph_java::{namespace_of, scan_source_sql, InSourceSql, JavaParser};
use tiergraph_parser_api::{
    ClassRecord, FileInfo, ParserError, ParserMetrics, SourceExtractor, SqlQueryRecord,
};

use crate::builder::{CallGraphBuilder, CallRelation};
use crate::config::AnalysisConfig;
use crate::db_access::{DbAccessCorrelator, TableAccessInfo};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::sql_strategy::create_strategy;

/// A file that could not be extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Everything one run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub files_parsed: usize,
    pub skipped_files: Vec<SkippedFile>,
    /// Files extracted by the pattern fallback
    pub degraded_files: Vec<String>,
    pub classes: Vec<ClassRecord>,
    pub relations: Vec<CallRelation>,
    pub endpoints: Vec<Endpoint>,
    pub call_chains: Vec<CallChain>,
    pub circular_references: Vec<Vec<String>>,
    pub table_access: Vec<TableAccessInfo>,
    pub metrics: ParserMetrics,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Owns the parser (and its parse cache) and the call graph builder of one
/// analysis. Nothing is shared between runs.
pub struct AnalysisRun {
    config: AnalysisConfig,
    parser: JavaParser,
    builder: CallGraphBuilder,
}

impl AnalysisRun {
    pub fn new(config: AnalysisConfig) -> Self {
        let parser = JavaParser::with_config(config.parser.clone());
        Self {
            config,
            parser,
            builder: CallGraphBuilder::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn parser(&self) -> &JavaParser {
        &self.parser
    }

    /// The builder holding the graph of the last run
    pub fn builder(&self) -> &CallGraphBuilder {
        &self.builder
    }

    /// Analyze `roots` (source files or directories).
    ///
    /// `sql_records` are queries from mapper resources parsed elsewhere; for
    /// the `jdbc` and `jpa` wrapping types the sources are also scanned for
    /// SQL literals.
    ///
    /// # Errors
    ///
    /// Fails when a root does not exist or a directory cannot be read.
    /// Individual files that fail to extract are reported as skipped.
    pub fn run(&mut self, roots: &[PathBuf], sql_records: Vec<SqlQueryRecord>) -> Result<AnalysisReport> {
        let paths = self.discover(roots)?;
        info!("Analyzing {} Java files", paths.len());

        let project = self.parser.parse_files(&paths)?;
        let files_parsed = project.files.len();

        let mut queries = sql_records;
        if let Some(kind) = self.config.sql_wrapping_type.in_source() {
            queries.extend(self.scan_sources(&project.files, kind));
        }

        let skipped_files = project
            .failed_files
            .iter()
            .map(|(path, reason)| SkippedFile {
                path: path.display().to_string(),
                reason: reason.clone(),
            })
            .collect();
        let degraded_files = project
            .degraded_files
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let classes: Vec<ClassRecord> = project.classes().cloned().collect();

        self.builder.build_from_project(project);

        let table_access = DbAccessCorrelator::new(
            &self.builder,
            create_strategy(self.config.sql_wrapping_type),
        )
        .with_max_upstream_depth(self.config.max_upstream_depth)
        .analyze(&self.config.access_tables, &queries);

        let report = AnalysisReport {
            files_parsed,
            skipped_files,
            degraded_files,
            classes,
            relations: self.builder.call_relations(),
            endpoints: self.builder.endpoints().to_vec(),
            call_chains: self.builder.call_chains(None, self.config.max_chain_depth),
            circular_references: self.builder.detect_circular_references(),
            table_access,
            metrics: self.parser.metrics(),
        };
        info!(
            "Analysis complete: {} files, {} endpoints, {} chains, {} cycles, {} tables accessed",
            report.files_parsed,
            report.endpoints.len(),
            report.call_chains.len(),
            report.circular_references.len(),
            report.table_access.len()
        );
        Ok(report)
    }

    fn discover(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for root in roots {
            if root.is_dir() {
                paths.extend(self.parser.discover_files(root)?);
            } else if root.is_file() {
                if self.parser.can_parse(root) {
                    paths.push(root.clone());
                } else {
                    debug!("Ignoring non-Java file {}", root.display());
                }
            } else {
                let err = io::Error::new(io::ErrorKind::NotFound, "source root does not exist");
                return Err(ParserError::IoError(root.clone(), err).into());
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    fn scan_sources(&self, files: &[FileInfo], kind: InSourceSql) -> Vec<SqlQueryRecord> {
        let mut records = Vec::new();
        for file in files {
            let Some(namespace) = namespace_of(file) else {
                continue;
            };
            match self.parser.read_source(&file.file_path) {
                Ok(decoded) => {
                    let found = scan_source_sql(&decoded.text, &namespace, kind);
                    debug!("{}: {} in-source queries", file.file_path.display(), found.len());
                    records.extend(found);
                }
                Err(e) => warn!("Cannot rescan {} for SQL: {e}", file.file_path.display()),
            }
        }
        records
    }
}
