//! DB access correlation.
//!
//! For each configured table, the queries that reference the table and at
//! least one configured column are matched. Each match attributes files to
//! layers:
//!
//! - the query's owner class (namespace) under its own layer, or
//!   `Interface` when that layer is unknown;
//! - the declared result type's class under `DAO`;
//! - every caller reachable upstream from `Owner.queryId` in the call graph,
//!   under the caller's layer.
//!
//! A file is attributed to the first layer that claims it.

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tiergraph::{Direction, Layer};
use tiergraph_parser_api::{QueryKind, SqlQueryRecord};

use crate::builder::CallGraphBuilder;
use crate::config::TableTarget;
use crate::layer::classify_layer;
use crate::sql_strategy::SqlStrategy;

/// Layer key for owner classes whose own layer is unknown
pub const INTERFACE_LAYER: &str = "Interface";

/// Access summary of one configured table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAccessInfo {
    pub table_name: String,
    /// Configured columns observed in any matched query, sorted
    pub columns: Vec<String>,
    /// Every attributed file, sorted
    pub access_files: Vec<String>,
    /// Kind of the first matched query
    pub query_type: QueryKind,
    /// SQL of the first matched query
    pub sql_query: Option<String>,
    /// Layer with the most files
    pub layer: String,
    pub sql_queries: Vec<SqlQueryRecord>,
    /// Layer name to sorted file paths
    pub layer_files: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct LayerFiles {
    order: Vec<String>,
    files: HashMap<String, BTreeSet<String>>,
    claimed: BTreeSet<String>,
}

impl LayerFiles {
    /// Attribute `file` to `layer` unless some layer already holds it.
    fn add(&mut self, layer: &str, file: &str) -> bool {
        if file.is_empty() || !self.claimed.insert(file.to_string()) {
            return false;
        }
        if !self.files.contains_key(layer) {
            self.order.push(layer.to_string());
        }
        self.files
            .entry(layer.to_string())
            .or_default()
            .insert(file.to_string());
        true
    }

    /// Layer with the most files; ties go to the layer seen first.
    fn main_layer(&self) -> String {
        let mut best: Option<(&str, usize)> = None;
        for layer in &self.order {
            let count = self.files.get(layer).map_or(0, BTreeSet::len);
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((layer, count));
            }
        }
        best.map_or_else(|| Layer::Unknown.to_string(), |(layer, _)| layer.to_string())
    }

    fn all_files(&self) -> Vec<String> {
        self.claimed.iter().cloned().collect()
    }

    fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.files
            .into_iter()
            .map(|(layer, files)| (layer, files.into_iter().collect()))
            .collect()
    }
}

/// Joins configured tables, SQL query records and a built call graph.
pub struct DbAccessCorrelator<'a> {
    builder: &'a CallGraphBuilder,
    strategy: Box<dyn SqlStrategy>,
    max_upstream_depth: usize,
}

impl<'a> DbAccessCorrelator<'a> {
    pub fn new(builder: &'a CallGraphBuilder, strategy: Box<dyn SqlStrategy>) -> Self {
        Self {
            builder,
            strategy,
            max_upstream_depth: 20,
        }
    }

    pub fn with_max_upstream_depth(mut self, depth: usize) -> Self {
        self.max_upstream_depth = depth;
        self
    }

    /// One summary per table with at least one matching query, in configuration order.
    ///
    /// Returns nothing when the call graph has not been built.
    pub fn analyze(&self, tables: &[TableTarget], queries: &[SqlQueryRecord]) -> Vec<TableAccessInfo> {
        if !self.builder.is_built() {
            error!("Call graph has not been built; call build() before correlating DB access");
            return Vec::new();
        }

        let results: Vec<TableAccessInfo> = tables
            .iter()
            .filter(|t| !t.table_name.is_empty())
            .filter_map(|t| self.analyze_table(t, queries))
            .collect();
        info!(
            "DB access: {} of {} tables matched using {} strategy",
            results.len(),
            tables.len(),
            self.strategy.name()
        );
        results
    }

    /// Summary for one table, or `None` when no query matches it.
    pub fn analyze_table(&self, target: &TableTarget, queries: &[SqlQueryRecord]) -> Option<TableAccessInfo> {
        let matched = self.matching_queries(target, queries);
        let first = matched.first()?;

        let mut layers = LayerFiles::default();
        for query in &matched {
            debug!("{}: query {}.{} matches", target.table_name, query.namespace, query.id);

            if let Some(owner) = self.builder.class_by_name(&query.namespace) {
                let layer = classify_layer(owner, None);
                let key = if layer.is_known() {
                    layer.as_str()
                } else {
                    INTERFACE_LAYER
                };
                layers.add(key, &owner.file_path);
            }

            if let Some(result) = query
                .result_type
                .as_deref()
                .and_then(|name| self.builder.class_by_name(name))
            {
                layers.add(Layer::Dao.as_str(), &result.file_path);
            }

            if let Some(key) = query.method_key() {
                for (layer, file) in self.upstream_files(&key) {
                    layers.add(layer.as_str(), &file);
                }
            }
        }

        let info = TableAccessInfo {
            table_name: target.table_name.clone(),
            columns: self.used_columns(target, &matched),
            access_files: layers.all_files(),
            query_type: first.query_type,
            sql_query: Some(first.sql.clone()),
            layer: layers.main_layer(),
            sql_queries: matched.iter().map(|q| (*q).clone()).collect(),
            layer_files: BTreeMap::new(),
        };
        Some(TableAccessInfo {
            layer_files: layers.into_map(),
            ..info
        })
    }

    /// Queries referencing `target`'s table and at least one of its columns.
    pub fn matching_queries<'q>(
        &self,
        target: &TableTarget,
        queries: &'q [SqlQueryRecord],
    ) -> Vec<&'q SqlQueryRecord> {
        queries
            .iter()
            .filter(|q| !q.sql.trim().is_empty())
            .filter(|q| {
                self.strategy
                    .extract_table_names(&q.sql)
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&target.table_name))
            })
            .filter(|q| {
                self.columns_in(&q.sql, &target.table_name)
                    .iter()
                    .any(|c| target.columns.contains(c))
            })
            .collect()
    }

    fn columns_in(&self, sql: &str, table: &str) -> Vec<String> {
        self.strategy
            .extract_column_names(sql, table)
            .into_iter()
            .map(|c| c.to_lowercase())
            .collect()
    }

    fn used_columns(&self, target: &TableTarget, matched: &[&SqlQueryRecord]) -> Vec<String> {
        let used: BTreeSet<String> = matched
            .iter()
            .flat_map(|q| self.columns_in(&q.sql, &target.table_name))
            .filter(|c| target.columns.contains(c))
            .collect();
        used.into_iter().collect()
    }

    /// `(layer, file)` of every known-layer method that reaches `method_key`.
    ///
    /// The walk follows callers up to the configured depth and visits each
    /// method once. The start method itself is included.
    fn upstream_files(&self, method_key: &str) -> Vec<(Layer, String)> {
        let Some(graph) = self.builder.graph() else {
            return Vec::new();
        };
        let Some(start) = graph.node_id(method_key) else {
            debug!("{method_key} is not in the call graph");
            return Vec::new();
        };
        let visited = match graph.walk(start, Direction::Incoming, self.max_upstream_depth) {
            Ok(ids) => ids,
            Err(e) => {
                error!("Upstream walk from {method_key} failed: {e}");
                return Vec::new();
            }
        };

        visited
            .into_iter()
            .filter_map(|id| graph.node(id).ok())
            .filter_map(|node| {
                let layer = self.builder.layer_of(&node.signature);
                (layer.is_known() && !node.file_path.is_empty())
                    .then(|| (layer, node.file_path.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_strategy::{create_strategy, SqlWrappingType};
    use tiergraph_parser_api::{ClassRecord, FieldRecord, FileInfo, MethodRecord};

    fn file(path: &str, class: ClassRecord) -> FileInfo {
        let mut info = FileInfo::new(path, class.package.clone());
        info.classes = vec![class];
        info
    }

    fn built() -> CallGraphBuilder {
        let service = ClassRecord::new("OrderService", "com.shop.service", "OrderService.java")
            .with_field(FieldRecord::new("orderMapper", "OrderMapper"))
            .with_method(MethodRecord::new("find", "", "").with_call("orderMapper.selectById"))
            .with_method(MethodRecord::new("archive", "", "").with_call("orderMapper.deleteOld"));
        let mapper = ClassRecord::new("OrderMapper", "com.shop.mapper", "OrderMapper.java")
            .with_method(MethodRecord::new("selectById", "", ""))
            .with_method(MethodRecord::new("deleteOld", "", ""));
        let entity = ClassRecord::new("OrderRow", "com.shop.rows", "OrderRow.java");
        let mut builder = CallGraphBuilder::new();
        builder.build_from_parsed(vec![
            file("OrderService.java", service),
            file("OrderMapper.java", mapper),
            file("OrderRow.java", entity),
        ]);
        builder
    }

    fn correlator(builder: &CallGraphBuilder) -> DbAccessCorrelator<'_> {
        DbAccessCorrelator::new(builder, create_strategy(SqlWrappingType::MyBatis))
    }

    #[test]
    fn test_matching_requires_table_and_column() {
        let builder = built();
        let correlator = correlator(&builder);
        let target = TableTarget::new("orders", ["id", "status"]);
        let queries = vec![
            SqlQueryRecord::new("com.shop.mapper.OrderMapper", "selectById", "SELECT id, total FROM orders WHERE status = #{s}"),
            SqlQueryRecord::new("com.shop.mapper.OrderMapper", "totals", "SELECT total FROM orders"),
            SqlQueryRecord::new("com.shop.mapper.UserMapper", "byId", "SELECT id FROM users"),
            SqlQueryRecord::new("com.shop.mapper.OrderMapper", "empty", "  "),
        ];
        let matched = correlator.matching_queries(&target, &queries);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "selectById");
    }

    #[test]
    fn test_table_summary() {
        let builder = built();
        let correlator = correlator(&builder);
        let target = TableTarget::new("orders", ["id", "status"]);
        let queries = vec![SqlQueryRecord::new(
            "com.shop.mapper.OrderMapper",
            "selectById",
            "SELECT id, total FROM orders WHERE status = #{status}",
        )
        .with_result_type("com.shop.rows.OrderRow")];

        let info = correlator.analyze_table(&target, &queries).unwrap();
        assert_eq!(info.table_name, "orders");
        assert_eq!(info.columns, vec!["id", "status"]);
        assert_eq!(info.query_type, QueryKind::Select);
        assert_eq!(
            info.access_files,
            vec!["OrderMapper.java", "OrderRow.java", "OrderService.java"]
        );
        assert_eq!(info.layer_files["Mapper"], vec!["OrderMapper.java"]);
        assert_eq!(info.layer_files["DAO"], vec!["OrderRow.java"]);
        assert_eq!(info.layer_files["Service"], vec!["OrderService.java"]);
        // One file each: the first layer wins the tie
        assert_eq!(info.layer, "Mapper");
    }

    #[test]
    fn test_unmatched_tables_are_omitted() {
        let builder = built();
        let correlator = correlator(&builder);
        let tables = vec![
            TableTarget::new("orders", ["status"]),
            TableTarget::new("users", ["id"]),
        ];
        let queries = vec![SqlQueryRecord::new(
            "com.shop.mapper.OrderMapper",
            "deleteOld",
            "DELETE FROM orders WHERE status = 'OLD'",
        )];
        let results = correlator.analyze(&tables, &queries);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].table_name, "orders");
        assert_eq!(results[0].query_type, QueryKind::Delete);
    }

    #[test]
    fn test_unknown_owner_layer_is_interface() {
        let holder = ClassRecord::new("Queries", "app", "Queries.java")
            .with_method(MethodRecord::new("run", "", "").with_call("load"));
        let mut builder = CallGraphBuilder::new();
        builder.build_from_parsed(vec![file("Queries.java", holder)]);

        let target = TableTarget::new("orders", ["id"]);
        let queries = vec![SqlQueryRecord::new("app.Queries", "load", "SELECT id FROM orders")];
        let info = correlator(&builder).analyze_table(&target, &queries).unwrap();
        assert_eq!(info.layer_files[INTERFACE_LAYER], vec!["Queries.java"]);
        assert_eq!(info.layer, INTERFACE_LAYER);
    }

    #[test]
    fn test_not_built_returns_nothing() {
        let builder = CallGraphBuilder::new();
        let queries = vec![SqlQueryRecord::new("A", "b", "SELECT id FROM orders")];
        let results = correlator(&builder).analyze(&[TableTarget::new("orders", ["id"])], &queries);
        assert!(results.is_empty());
    }

    /// `OrderMapper.select` called through a chain of services, one per file
    fn service_chain(length: usize) -> CallGraphBuilder {
        let mapper = ClassRecord::new("OrderMapper", "com.shop.mapper", "OrderMapper.java")
            .with_method(MethodRecord::new("select", "", ""));
        let mut files = vec![file("OrderMapper.java", mapper)];
        for n in 1..=length {
            let callee = if n == 1 {
                "OrderMapper.select".to_string()
            } else {
                format!("Step{}Service.run", n - 1)
            };
            let name = format!("Step{n}Service");
            let path = format!("{name}.java");
            let class = ClassRecord::new(name, "com.shop.flow", path.clone())
                .with_method(MethodRecord::new("run", "", "").with_call(callee));
            files.push(file(&path, class));
        }
        let mut builder = CallGraphBuilder::new();
        builder.build_from_parsed(files);
        builder
    }

    #[test]
    fn test_upstream_walk_stops_at_depth() {
        let builder = service_chain(4);
        let target = TableTarget::new("orders", ["id"]);
        let queries = vec![SqlQueryRecord::new("com.shop.mapper.OrderMapper", "select", "SELECT id FROM orders")];

        let info = correlator(&builder)
            .with_max_upstream_depth(2)
            .analyze_table(&target, &queries)
            .unwrap();
        assert_eq!(info.layer_files["Mapper"], vec!["OrderMapper.java"]);
        assert_eq!(
            info.layer_files["Service"],
            vec!["Step1Service.java", "Step2Service.java"]
        );
        assert!(!info.access_files.contains(&"Step3Service.java".to_string()));
        assert_eq!(info.layer, "Service");

        let unbounded = correlator(&builder).analyze_table(&target, &queries).unwrap();
        assert_eq!(unbounded.layer_files["Service"].len(), 4);
    }

    #[test]
    fn test_file_reached_through_two_layers_is_counted_once() {
        // One file declares both a controller and the service it calls
        let controller = ClassRecord::new("OrderController", "com.shop", "Web.java")
            .with_method(MethodRecord::new("get", "", "").with_call("AuditService.log"));
        let service = ClassRecord::new("AuditService", "com.shop", "Web.java")
            .with_method(MethodRecord::new("log", "", "").with_call("OrderMapper.select"));
        let mapper = ClassRecord::new("OrderMapper", "com.shop.mapper", "OrderMapper.java")
            .with_method(MethodRecord::new("select", "", ""));
        let mut web = FileInfo::new("Web.java", "com.shop");
        web.classes = vec![controller, service];
        let mut builder = CallGraphBuilder::new();
        builder.build_from_parsed(vec![web, file("OrderMapper.java", mapper)]);

        let target = TableTarget::new("orders", ["id"]);
        let queries = vec![SqlQueryRecord::new("com.shop.mapper.OrderMapper", "select", "SELECT id FROM orders")];
        let info = correlator(&builder).analyze_table(&target, &queries).unwrap();

        assert_eq!(info.layer_files["Service"], vec!["Web.java"]);
        assert!(!info.layer_files.contains_key("Controller"));
        let listed = info.layer_files.values().flatten().filter(|f| *f == "Web.java").count();
        assert_eq!(listed, 1);
        assert_eq!(info.access_files, vec!["OrderMapper.java", "Web.java"]);
    }

    #[test]
    fn test_main_layer_tie_goes_to_first_recorded() {
        // Mapper (owner) and Service (caller) hold one file each
        let builder = service_chain(1);
        let target = TableTarget::new("orders", ["id"]);
        let queries = vec![SqlQueryRecord::new("com.shop.mapper.OrderMapper", "select", "SELECT id FROM orders")];
        let info = correlator(&builder).analyze_table(&target, &queries).unwrap();
        assert_eq!(info.layer_files.len(), 2);
        assert_eq!(info.layer, "Mapper");
    }

    #[test]
    fn test_main_layer_prefers_larger_then_earlier() {
        let mut layers = LayerFiles::default();
        assert_eq!(layers.main_layer(), "Unknown");

        assert!(layers.add("Mapper", "a.java"));
        assert!(layers.add("Service", "b.java"));
        assert!(!layers.add("Controller", "a.java"));
        assert_eq!(layers.main_layer(), "Mapper");

        layers.add("Service", "c.java");
        assert_eq!(layers.main_layer(), "Service");
        assert_eq!(layers.all_files(), vec!["a.java", "b.java", "c.java"]);
    }
}
