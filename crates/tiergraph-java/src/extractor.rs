//! AST extraction for Java source code

use std::path::Path;
use tiergraph_parser_api::{FileInfo, ParserConfig, ParserError, ParserResult};
use tree_sitter::{Node, Parser};

use crate::visitor::JavaVisitor;

/// Extract class records from Java source code.
///
/// A tree with error nodes is rejected with the position of the first error
/// unless `config.tolerate_syntax_errors` is set.
pub fn extract(source: &str, file_path: &Path, config: &ParserConfig) -> ParserResult<FileInfo> {
    let mut parser = Parser::new();
    let language = tree_sitter_java::language();
    parser
        .set_language(&language)
        .map_err(|e| ParserError::ParseError(file_path.to_path_buf(), e.to_string()))?;

    if let Some(timeout) = config.timeout_per_file {
        parser.set_timeout_micros(timeout.as_micros().min(u64::MAX as u128) as u64);
    }

    let tree = parser.parse(source, None).ok_or_else(|| {
        if config.timeout_per_file.is_some() {
            ParserError::Timeout(file_path.to_path_buf())
        } else {
            ParserError::ParseError(file_path.to_path_buf(), "Failed to parse".to_string())
        }
    })?;

    let root_node = tree.root_node();

    if root_node.has_error() && !config.tolerate_syntax_errors {
        let (line, column, message) = match first_error(root_node) {
            Some(node) => describe_error(node, source),
            None => (0, 0, "Syntax error".to_string()),
        };
        return Err(ParserError::SyntaxError(
            file_path.to_path_buf(),
            line,
            column,
            message,
        ));
    }

    let path_str = file_path.display().to_string();
    let mut visitor = JavaVisitor::new(source.as_bytes(), path_str);
    visitor.visit_node(root_node);
    let (package, classes) = visitor.finish();

    let mut info = FileInfo::new(file_path, package);
    info.classes = classes;
    info.line_count = source.lines().count();
    info.byte_count = source.len();
    Ok(info)
}

/// First ERROR or MISSING node in document order.
fn first_error(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn describe_error(node: Node, source: &str) -> (usize, usize, String) {
    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        let snippet: String = text.chars().take(40).collect();
        format!("unexpected `{}`", snippet.trim())
    };
    (pos.row + 1, pos.column + 1, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiergraph_parser_api::ClassKind;

    fn parse(source: &str) -> FileInfo {
        extract(source, Path::new("Test.java"), &ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_extract_simple_class() {
        let info = parse(
            r#"
public class HelloWorld {
    public static void main(String[] args) {
        System.out.println("Hello, World!");
    }
}
"#,
        );
        assert_eq!(info.package, "");
        assert_eq!(info.classes.len(), 1);
        let class = &info.classes[0];
        assert_eq!(class.name, "HelloWorld");
        let main = &class.methods[0];
        assert_eq!(main.name, "main");
        assert!(main.is_static);
        assert_eq!(main.access_modifier, "public");
        assert_eq!(main.parameters[0].param_type, "String[]");
        assert_eq!(main.method_calls, vec!["System.out.println"]);
    }

    #[test]
    fn test_extract_package_and_imports() {
        let info = parse(
            r#"
package com.example.app;

import java.util.List;
import java.util.concurrent.*;

public class App {
}
"#,
        );
        assert_eq!(info.package, "com.example.app");
        assert_eq!(
            info.classes[0].imports,
            vec!["java.util.List", "java.util.concurrent.*"]
        );
        assert_eq!(info.classes[0].qualified_name(), "com.example.app.App");
    }

    #[test]
    fn test_extract_annotations_and_supertypes() {
        let info = parse(
            r#"
@Service
@Transactional(readOnly = true)
public class OrderService extends BaseService<Order> implements OrderApi, Auditable {
}
"#,
        );
        let class = &info.classes[0];
        assert_eq!(class.annotations, vec!["Service", "Transactional"]);
        assert_eq!(
            class.raw_annotations,
            vec!["@Service", "@Transactional(readOnly = true)"]
        );
        assert_eq!(class.superclass.as_deref(), Some("BaseService"));
        assert_eq!(class.interfaces, vec!["OrderApi", "Auditable"]);
    }

    #[test]
    fn test_extract_fields() {
        let info = parse(
            r#"
public class Holder {
    @Autowired
    private OrderMapper orderMapper;
    protected static final int LIMIT = 10, OFFSET = 2;
    List<String> names;
}
"#,
        );
        let fields = &info.classes[0].fields;
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].name, "orderMapper");
        assert_eq!(fields[0].field_type, "OrderMapper");
        assert_eq!(fields[0].annotations, vec!["Autowired"]);
        assert_eq!(fields[0].access_modifier, "private");
        assert_eq!(fields[1].name, "LIMIT");
        assert!(fields[1].is_static && fields[1].is_final);
        assert_eq!(fields[1].initial_value.as_deref(), Some("10"));
        assert_eq!(fields[2].name, "OFFSET");
        assert_eq!(fields[3].field_type, "List");
        assert_eq!(fields[3].access_modifier, "package");
    }

    #[test]
    fn test_extract_locals_and_varargs() {
        let info = parse(
            r#"
public class Worker {
    public void run(String label, Object... args) {
        Map<String, Order> byId = new HashMap<>();
        for (Order o : orders) {
            o.touch();
        }
        try (Connection c = ds.getConnection()) {
            c.commit();
        } catch (IOException | SQLException e) {
            log.warn(e);
        }
    }
}
"#,
        );
        let run = &info.classes[0].methods[0];
        assert_eq!(run.parameters.len(), 2);
        assert!(!run.parameters[0].is_varargs);
        assert!(run.parameters[1].is_varargs);
        assert_eq!(run.parameters[1].param_type, "Object");

        let locals: Vec<_> = run
            .local_variables
            .iter()
            .map(|l| (l.name.as_str(), l.var_type.as_str()))
            .collect();
        assert_eq!(
            locals,
            vec![
                ("byId", "Map<String, Order>"),
                ("o", "Order"),
                ("c", "Connection"),
                ("e", "IOException | SQLException"),
            ]
        );
        assert_eq!(
            run.method_calls,
            vec!["o.touch", "ds.getConnection", "c.commit", "log.warn"]
        );
    }

    #[test]
    fn test_extract_interface_enum_record() {
        let info = parse(
            r#"
public interface OrderMapper extends BaseMapper<Order> {
    Order selectById(long id);
    default int count() { return 0; }
}

enum Status {
    OPEN, CLOSED;
    public boolean isOpen() { return this == OPEN; }
}

record Point(int x, int y) {
    Point {
        validate(x);
    }
}
"#,
        );
        assert_eq!(info.classes.len(), 3);

        let mapper = &info.classes[0];
        assert_eq!(mapper.kind, ClassKind::Interface);
        assert_eq!(mapper.interfaces, vec!["BaseMapper"]);
        assert!(mapper.methods[0].is_abstract);
        assert_eq!(mapper.methods[0].return_type, "Order");
        assert!(!mapper.methods[1].is_abstract);

        let status = &info.classes[1];
        assert_eq!(status.kind, ClassKind::Enum);
        assert_eq!(status.methods[0].name, "isOpen");

        let point = &info.classes[2];
        assert_eq!(point.kind, ClassKind::Record);
        let fields: Vec<_> = point.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "y"]);
        assert_eq!(point.methods[0].name, "Point");
        assert_eq!(point.methods[0].method_calls, vec!["validate"]);
    }

    #[test]
    fn test_extract_constructor_and_nested_class() {
        let info = parse(
            r#"
public class Outer {
    private final Repo repo;

    public Outer(Repo repo) {
        this.repo = repo;
        init();
    }

    static class Inner {
        void go() {}
    }
}
"#,
        );
        assert_eq!(info.classes.len(), 2);
        let outer = &info.classes[0];
        let ctor = &outer.methods[0];
        assert_eq!(ctor.name, "Outer");
        assert_eq!(ctor.return_type, "Outer");
        assert_eq!(ctor.method_calls, vec!["init"]);
        assert_eq!(info.classes[1].name, "Inner");
        assert_eq!(info.classes[1].methods[0].signature(), "Inner.go");
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let source = "public class Broken {\n    void m( {\n}\n";
        let err = extract(source, Path::new("Broken.java"), &ParserConfig::default()).unwrap_err();
        match err {
            ParserError::SyntaxError(path, line, column, _) => {
                assert_eq!(path, Path::new("Broken.java"));
                assert!(line >= 1);
                assert!(column >= 1);
            }
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn test_tolerated_syntax_error_keeps_classes() {
        let config = ParserConfig {
            tolerate_syntax_errors: true,
            ..ParserConfig::default()
        };
        let source = "public class Half {\n    void ok() { a.b(); }\n    void bad( {\n}\n";
        let info = extract(source, Path::new("Half.java"), &config).unwrap();
        assert!(info.classes.iter().any(|c| c.name == "Half"));
    }
}
