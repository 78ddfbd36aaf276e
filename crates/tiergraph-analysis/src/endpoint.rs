//! HTTP endpoint detection from request-mapping annotations.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tiergraph_parser_api::{ClassRecord, MethodRecord};

/// An externally reachable entry method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub http_method: String,
    pub method_signature: String,
    pub class_name: String,
    pub method_name: String,
    pub file_path: String,
}

static PATH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"value\s*=\s*["']([^"']+)["']"#,
        r#"path\s*=\s*["']([^"']+)["']"#,
        r#"\(\s*["']([^"']+)["']\s*\)"#,
        r#"\(\s*["']([^"']+)["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static METHOD_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bmethod\s*=\s*(\{[^}]*\}|[\w.]+)").unwrap());

const VERB_ANNOTATIONS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];

/// First path literal in an annotation's text (`value=`, `path=` or a bare string).
pub fn extract_path(annotation: &str) -> Option<String> {
    PATH_PATTERNS
        .iter()
        .filter_map(|re| re.captures(annotation))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .find(|path| !path.is_empty())
}

/// HTTP verb declared by an annotation, if it is a request mapping.
///
/// A generic `RequestMapping` takes its verbs from the `method` element;
/// several verbs are joined with `,` in declaration order. Without a
/// `method` element it means GET.
pub fn extract_http_method(annotation: &str) -> Option<String> {
    let name = annotation_name(annotation);
    if let Some((_, verb)) = VERB_ANNOTATIONS.iter().find(|(n, _)| *n == name) {
        return Some((*verb).to_string());
    }
    if name != "RequestMapping" {
        return None;
    }

    let verbs = request_methods(annotation);
    if verbs.is_empty() {
        Some("GET".to_string())
    } else {
        Some(verbs.join(","))
    }
}

/// Verbs listed in a `method = RequestMethod.X` or `method = {..}` element.
fn request_methods(annotation: &str) -> Vec<String> {
    let Some(value) = METHOD_ELEMENT.captures(annotation).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };
    value
        .as_str()
        .trim_matches(|c| c == '{' || c == '}')
        .split(',')
        .map(|item| item.trim().rsplit('.').next().unwrap_or_default().to_uppercase())
        .filter(|verb| !verb.is_empty())
        .collect()
}

/// Join a class base path and a method path with exactly one `/` between them.
pub fn combine_paths(class_path: &str, method_path: &str) -> String {
    match (class_path.is_empty(), method_path.is_empty()) {
        (true, true) => String::new(),
        (false, true) => class_path.to_string(),
        (true, false) => method_path.to_string(),
        (false, false) => {
            let class_slash = class_path.ends_with('/');
            let method_slash = method_path.starts_with('/');
            if class_slash && method_slash {
                format!("{}{}", class_path, &method_path[1..])
            } else if !class_slash && !method_slash {
                format!("{class_path}/{method_path}")
            } else {
                format!("{class_path}{method_path}")
            }
        }
    }
}

/// Base path from the first `RequestMapping` annotation on the class.
pub fn class_base_path(class: &ClassRecord) -> String {
    class
        .raw_annotations
        .iter()
        .find(|raw| annotation_name(raw).contains("RequestMapping"))
        .and_then(|raw| extract_path(raw))
        .unwrap_or_default()
}

/// Endpoint for `method`, if one of its annotations declares an HTTP verb.
///
/// The first verb-bearing annotation decides both the verb and the method path.
pub fn extract_endpoint(class: &ClassRecord, method: &MethodRecord, class_path: &str) -> Option<Endpoint> {
    let (http_method, method_path) = method.raw_annotations.iter().find_map(|raw| {
        extract_http_method(raw).map(|verb| (verb, extract_path(raw).unwrap_or_default()))
    })?;

    Some(Endpoint {
        path: combine_paths(class_path, &method_path),
        http_method,
        method_signature: format!("{}.{}", class.name, method.name),
        class_name: class.name.clone(),
        method_name: method.name.clone(),
        file_path: class.file_path.clone(),
    })
}

/// All endpoints declared by the classes, in class and method order.
pub fn identify_endpoints<'a>(classes: impl IntoIterator<Item = &'a ClassRecord>) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    for class in classes {
        let class_path = class_base_path(class);
        endpoints.extend(
            class
                .methods
                .iter()
                .filter_map(|method| extract_endpoint(class, method, &class_path)),
        );
    }
    endpoints
}

/// Simple name of an annotation from its source text (`@org.x.GetMapping("/a")` gives `GetMapping`).
fn annotation_name(raw: &str) -> &str {
    let head = raw.trim_start_matches('@');
    let head = head.split('(').next().unwrap_or(head).trim();
    head.rsplit('.').next().unwrap_or(head)
}
