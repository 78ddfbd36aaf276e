//! Integration tests for the Java extractor

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tiergraph_java::{namespace_of, scan_jdbc_sql, JavaParser};
use tiergraph_parser_api::{ClassKind, ParserConfig, SourceExtractor};

const ORDER_APP: &str = include_str!("fixtures/order_app.java");

fn write(dir: &Path, relative: &str, content: &[u8]) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_parse_order_app_classes() {
    let parser = JavaParser::new();
    let info = parser
        .parse_source(ORDER_APP, Path::new("order_app.java"))
        .unwrap();

    assert_eq!(info.package, "com.shop.order");
    let names: Vec<_> = info.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["OrderController", "OrderService", "OrderMapper", "OrderStatus", "OrderQuery"]
    );

    let kinds: Vec<_> = info.classes.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ClassKind::Class,
            ClassKind::Class,
            ClassKind::Interface,
            ClassKind::Enum,
            ClassKind::Record
        ]
    );
    assert!(info
        .classes
        .iter()
        .all(|c| c.imports.contains(&"com.shop.order.mapper.OrderMapper".to_string())));
}

#[test]
fn test_parse_order_app_controller() {
    let parser = JavaParser::new();
    let info = parser
        .parse_source(ORDER_APP, Path::new("order_app.java"))
        .unwrap();
    let controller = &info.classes[0];

    assert_eq!(controller.annotations, vec!["RestController", "RequestMapping"]);
    assert_eq!(controller.raw_annotations[1], "@RequestMapping(\"/api/orders\")");
    assert_eq!(controller.fields[0].name, "orderService");
    assert_eq!(controller.fields[0].field_type, "OrderService");

    let get = controller.method("getOrder").unwrap();
    assert_eq!(get.raw_annotations, vec!["@GetMapping(\"/{id}\")"]);
    assert_eq!(get.parameters[0].name, "id");
    assert_eq!(get.method_calls, vec!["orderService.find"]);

    let search = controller.method("search").unwrap();
    assert_eq!(search.local_variables[0].name, "query");
    assert_eq!(search.local_variables[0].var_type, "OrderQuery");
    assert_eq!(search.method_calls, vec!["form.toQuery", "orderService.search"]);
}

#[test]
fn test_parse_order_app_service_calls() {
    let parser = JavaParser::new();
    let info = parser
        .parse_source(ORDER_APP, Path::new("order_app.java"))
        .unwrap();
    let service = &info.classes[1];

    assert_eq!(service.methods[0].name, "OrderService");
    assert_eq!(service.fields[0].access_modifier, "private");
    assert!(service.fields[0].is_final);

    let find = service.method("find").unwrap();
    assert_eq!(find.method_calls, vec!["audit", "orderMapper.selectById"]);

    let audit = service.method("audit").unwrap();
    assert_eq!(audit.access_modifier, "private");
    assert_eq!(audit.method_calls, vec!["AuditLog.write"]);

    let mapper = &info.classes[2];
    assert!(mapper.methods.iter().all(|m| m.is_abstract));
}

#[test]
fn test_parse_directory_sorted_and_skips_tests() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/main/java/b/B.java", b"package b; class B {}");
    write(dir.path(), "src/main/java/a/A.java", b"package a; class A {}");
    write(dir.path(), "src/test/java/a/ATest.java", b"package a; class ATest {}");
    write(dir.path(), "README.md", b"# docs");

    let parser = JavaParser::with_config(ParserConfig::fast());
    let project = parser.parse_directory(dir.path()).unwrap();

    let names: Vec<_> = project.classes().map(|c| c.qualified_name()).collect();
    assert_eq!(names, vec!["a.A", "b.B"]);
    assert_eq!(project.total_files(), 2);
    assert!(project.failed_files.is_empty());
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = TempDir::new().unwrap();
    for i in 0..12 {
        let src = format!("package p; class C{i} {{ void m() {{ helper{i}(); }} }}");
        write(dir.path(), &format!("C{i:02}.java"), src.as_bytes());
    }

    let sequential = JavaParser::new().parse_directory(dir.path()).unwrap();
    let parallel = JavaParser::with_config(ParserConfig::default().with_parallel(true))
        .parse_directory(dir.path())
        .unwrap();

    let seq_names: Vec<_> = sequential.classes().map(|c| c.name.clone()).collect();
    let par_names: Vec<_> = parallel.classes().map(|c| c.name.clone()).collect();
    assert_eq!(seq_names, par_names);
    assert_eq!(parallel.total_methods, 12);
}

#[test]
fn test_unreadable_and_broken_files_do_not_abort() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Good.java", b"class Good { void ok() {} }");
    write(dir.path(), "Broken.java", b"public class Broken { void m( { }");
    write(dir.path(), "Bytes.java", &[0xFF, 0xFE, 0x00, 0x81]);

    let parser = JavaParser::with_config(
        ParserConfig::default()
            .with_encodings(vec![tiergraph_parser_api::SourceEncoding::Utf8])
            .with_fallback(true),
    );
    let project = parser.parse_directory(dir.path()).unwrap();

    assert_eq!(project.files.len(), 2);
    assert_eq!(project.failed_files.len(), 1);
    assert!(project.failed_files[0].0.ends_with("Bytes.java"));
    assert!(project.failed_files[0].1.contains("No supported encoding"));
    assert_eq!(project.degraded_files.len(), 1);
    assert!(project.degraded_files[0].ends_with("Broken.java"));
}

#[test]
fn test_euc_kr_source_is_decoded() {
    let dir = TempDir::new().unwrap();
    let mut bytes = b"class Greeting { String hi() { return \"".to_vec();
    bytes.extend_from_slice(&[0xBE, 0xC8, 0xB3, 0xE7]); // "안녕"
    bytes.extend_from_slice(b"\"; } }");
    write(dir.path(), "Greeting.java", &bytes);

    let parser = JavaParser::new();
    let info = parser.parse_file(&dir.path().join("Greeting.java")).unwrap();
    assert_eq!(info.encoding.as_deref(), Some("euc-kr"));
    assert_eq!(info.classes[0].methods[0].name, "hi");
}

#[test]
fn test_file_too_large() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Big.java", &vec![b' '; 2048]);
    let parser = JavaParser::with_config(ParserConfig::default().with_max_file_size(1024));
    let result = parser.parse_file(&dir.path().join("Big.java"));
    assert!(matches!(
        result,
        Err(tiergraph_parser_api::ParserError::FileTooLarge(_, 2048))
    ));
}

#[test]
fn test_cache_hits_are_counted() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "A.java", b"class A { void a() { b(); } }");
    let path = dir.path().join("A.java");

    let parser = JavaParser::new();
    let first = parser.parse_file(&path).unwrap();
    let second = parser.parse_file(&path).unwrap();
    assert_eq!(first, second);

    let metrics = parser.metrics();
    assert_eq!(metrics.files_attempted, 2);
    assert_eq!(metrics.files_succeeded, 2);
    assert_eq!(metrics.cache_hits, 1);
    assert_eq!(parser.cache().len(), 1);
}

#[test]
fn test_jdbc_scan_uses_first_class_namespace() {
    let source = r#"
package com.shop.dao;

public class OrderDao {
    public void close(long id) throws SQLException {
        jdbc.executeUpdate("UPDATE orders SET status = 'CLOSED' WHERE id = ?");
    }
}
"#;
    let parser = JavaParser::new();
    let info = parser.parse_source(source, Path::new("OrderDao.java")).unwrap();
    let namespace = namespace_of(&info).unwrap();
    assert_eq!(namespace, "com.shop.dao.OrderDao");

    let records = scan_jdbc_sql(source, &namespace);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method_key().as_deref(), Some("OrderDao.close"));
}
