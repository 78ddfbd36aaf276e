//! Pattern-based scanning for files that fail structural parsing.
//!
//! The scan recovers names only. It never extracts call sites.

use once_cell::sync::Lazy;
use regex::Regex;
use tiergraph_parser_api::{ClassRecord, FallbackScan, MethodRecord};

static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"class\s+(\w+)").unwrap());

pub(crate) static METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:public|private|protected)?\s+\w+\s+(\w+)\s*\(").unwrap());

static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:public|private|protected)?\s+\w+\s+(\w+)\s*[=;]").unwrap());

static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap());

const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "throw", "synchronized", "else",
    "try", "do", "case", "assert",
];

/// Scan class, method and field names with regular expressions.
pub fn fallback_scan(source: &str) -> FallbackScan {
    let names = |re: &Regex| -> Vec<String> {
        re.captures_iter(source)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    };

    FallbackScan {
        classes: names(&CLASS_RE),
        methods: names(&METHOD_RE),
        fields: names(&FIELD_RE),
    }
}

/// Build name-only class records from a degraded file.
///
/// Each method name is attached to the closest class header before it.
/// Methods found before the first class header are dropped.
pub fn skeletal_classes(source: &str, file_path: &str) -> Vec<ClassRecord> {
    let package = PACKAGE_RE
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let headers: Vec<(usize, &str)> = CLASS_RE
        .captures_iter(source)
        .filter_map(|c| c.get(1))
        .map(|m| (m.start(), m.as_str()))
        .collect();

    let mut classes: Vec<ClassRecord> = headers
        .iter()
        .map(|(_, name)| ClassRecord::new(*name, package.clone(), file_path))
        .collect();

    for caps in METHOD_RE.captures_iter(source) {
        let Some(name) = caps.get(1) else { continue };
        if KEYWORDS.contains(&name.as_str()) {
            continue;
        }
        let owner = headers.iter().rposition(|(start, _)| *start < name.start());
        if let Some(idx) = owner {
            let class = &mut classes[idx];
            if class.method(name.as_str()).is_none() {
                let method = MethodRecord::new(name.as_str(), class.name.clone(), file_path);
                class.methods.push(method);
            }
        }
    }

    classes
}
