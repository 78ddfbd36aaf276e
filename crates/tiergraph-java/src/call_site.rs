//! Call-site normalization
//!
//! A `method_invocation` is reduced to `"receiver.method"` or `"method"`.
//! Only the immediate receiver survives: for `a.b().c()` the result is
//! `a.c`, since resolution downstream performs a one-hop type lookup on the
//! receiver. Intermediate chain segments are dropped on purpose.

use tiergraph_parser_api::base_type;
use tree_sitter::Node;

/// Collect normalized call sites under `node`, in source (preorder) order.
pub fn collect_calls(node: Node, source: &[u8]) -> Vec<String> {
    let mut calls = Vec::new();
    let mut stack = vec![node];

    while let Some(current) = stack.pop() {
        if current.kind() == "method_invocation" {
            if let Some(call) = normalize_call(current, source) {
                calls.push(call);
            }
        }

        let mut cursor = current.walk();
        let children: Vec<Node> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    calls
}

/// Normalize one `method_invocation` node.
pub fn normalize_call(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();

    let args_idx = children.iter().position(|c| c.kind() == "argument_list");
    let method_name = args_idx
        .filter(|&i| i > 0 && children[i - 1].kind() == "identifier")
        .map(|i| text(children[i - 1], source));

    let (Some(args_idx), Some(method_name)) = (args_idx, method_name) else {
        // No name before the arguments: defer to a nested invocation
        return children
            .iter()
            .filter(|c| c.kind() == "method_invocation")
            .find_map(|c| normalize_call(*c, source));
    };

    let mut parts: Vec<String> = Vec::new();
    for child in &children[..args_idx] {
        match child.kind() {
            "identifier" => {
                let ident = text(*child, source);
                if ident != "this" {
                    parts.push(ident);
                }
            }
            "field_access" => {
                if let Some(access) = field_access_text(*child, source) {
                    parts.push(access);
                }
            }
            "method_invocation" => {
                if let Some(nested) = normalize_call(*child, source) {
                    if let Some((object, _)) = nested.rsplit_once('.') {
                        if !object.is_empty() {
                            parts.push(object.to_string());
                        }
                    }
                }
            }
            "object_creation_expression" => {
                if let Some(ty) = child.child_by_field_name("type") {
                    parts.push(base_type(&text(ty, source)).to_string());
                }
            }
            _ => {}
        }
    }

    Some(match parts.len() {
        0 => method_name,
        1 if parts[0] == method_name => method_name,
        1 => format!("{}.{}", parts[0], method_name),
        n => format!("{}.{}", parts[..n - 1].join("."), method_name),
    })
}

/// `this.a.b` gives `a.b`; a bare `this` gives nothing.
fn field_access_text(node: Node, source: &[u8]) -> Option<String> {
    let mut parts = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                let ident = text(child, source);
                if ident != "this" {
                    parts.push(ident);
                }
            }
            "field_access" => {
                if let Some(nested) = field_access_text(child, source) {
                    parts.push(nested);
                }
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

fn text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn calls_in(body: &str) -> Vec<String> {
        let source = format!("class T {{ void m() {{ {body} }} }}");
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .unwrap();
        let tree = parser.parse(&source, None).unwrap();
        collect_calls(tree.root_node(), source.as_bytes())
    }

    #[test]
    fn test_bare_call() {
        assert_eq!(calls_in("validate(x);"), vec!["validate"]);
    }

    #[test]
    fn test_receiver_call() {
        assert_eq!(calls_in("orderService.find(id);"), vec!["orderService.find"]);
    }

    #[test]
    fn test_this_is_dropped() {
        assert_eq!(calls_in("this.save();"), vec!["save"]);
        assert_eq!(calls_in("this.vets.findAll();"), vec!["vets.findAll"]);
    }

    #[test]
    fn test_chain_keeps_immediate_receiver() {
        assert_eq!(
            calls_in("repo.findAll().stream();"),
            vec!["repo.stream", "repo.findAll"]
        );
    }

    #[test]
    fn test_static_field_receiver() {
        assert_eq!(calls_in("System.out.println(1);"), vec!["System.out.println"]);
    }

    #[test]
    fn test_object_creation_receiver() {
        assert_eq!(
            calls_in("new OrderValidator<String>().check(o);"),
            vec!["OrderValidator.check"]
        );
    }

    #[test]
    fn test_nested_argument_calls() {
        assert_eq!(
            calls_in("mapper.insert(builder.build());"),
            vec!["mapper.insert", "builder.build"]
        );
    }
}
