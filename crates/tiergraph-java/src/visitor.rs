//! AST visitor for extracting Java class records

use tiergraph_parser_api::{
    base_type, ClassKind, ClassRecord, FieldRecord, LocalVariable, MethodRecord, Parameter,
};
use tree_sitter::Node;

use crate::call_site;

/// Keyword modifiers and annotations attached to one declaration
#[derive(Debug, Default)]
struct Modifiers {
    access: Option<&'static str>,
    is_static: bool,
    is_final: bool,
    is_abstract: bool,
    annotations: Vec<String>,
    raw_annotations: Vec<String>,
}

impl Modifiers {
    fn access_modifier(&self) -> String {
        self.access.unwrap_or("package").to_string()
    }
}

pub struct JavaVisitor<'a> {
    pub source: &'a [u8],
    pub file_path: String,
    pub package: String,
    pub imports: Vec<String>,
    pub classes: Vec<ClassRecord>,
}

impl<'a> JavaVisitor<'a> {
    pub fn new(source: &'a [u8], file_path: impl Into<String>) -> Self {
        Self {
            source,
            file_path: file_path.into(),
            package: String::new(),
            imports: Vec::new(),
            classes: Vec::new(),
        }
    }

    fn node_text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    /// Hand out the collected records; every class sees the file's imports.
    pub fn finish(mut self) -> (String, Vec<ClassRecord>) {
        for class in &mut self.classes {
            class.imports = self.imports.clone();
        }
        (self.package, self.classes)
    }

    pub fn visit_node(&mut self, node: Node) {
        let should_recurse = match node.kind() {
            "package_declaration" => {
                self.visit_package(node);
                false
            }
            "import_declaration" => {
                self.visit_import(node);
                false
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration" => {
                self.visit_type_declaration(node);
                false // visit_type_declaration handles the body itself
            }
            _ => true,
        };

        if should_recurse {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                self.visit_node(child);
            }
        }
    }

    fn visit_package(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
                self.package = self.node_text(child);
                break;
            }
        }
    }

    fn visit_import(&mut self, node: Node) {
        // import java.util.List;
        // import java.util.*;
        let mut cursor = node.walk();
        let mut imported = String::new();
        let mut is_wildcard = false;

        for child in node.children(&mut cursor) {
            match child.kind() {
                "scoped_identifier" | "identifier" => imported = self.node_text(child),
                "asterisk" => is_wildcard = true,
                _ => {}
            }
        }

        if !imported.is_empty() {
            if is_wildcard {
                imported.push_str(".*");
            }
            self.imports.push(imported);
        }
    }

    fn visit_type_declaration(&mut self, node: Node) {
        let Some(name) = node.child_by_field_name("name").map(|n| self.node_text(n)) else {
            return;
        };

        let kind = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "record_declaration" => ClassKind::Record,
            _ => ClassKind::Class,
        };

        let modifiers = self.extract_modifiers(node);
        let mut class = ClassRecord::new(&name, self.package.clone(), self.file_path.clone())
            .with_kind(kind);
        for annotation in modifiers.annotations {
            if !class.annotations.contains(&annotation) {
                class.annotations.push(annotation);
            }
        }
        class.raw_annotations = modifiers.raw_annotations;

        if let Some(superclass) = node.child_by_field_name("superclass") {
            class.superclass = superclass.named_child(0).map(|t| self.type_name(t));
        }
        class.interfaces = self.extract_interfaces(node);

        if kind == ClassKind::Record {
            if let Some(params) = node.child_by_field_name("parameters") {
                class.fields.extend(self.record_components(params));
            }
        }

        let body = node.child_by_field_name("body");
        if let Some(body) = body {
            for member in members(body) {
                match member.kind() {
                    "field_declaration" | "constant_declaration" => {
                        class.fields.extend(self.extract_fields(member));
                    }
                    "method_declaration"
                    | "constructor_declaration"
                    | "compact_constructor_declaration" => {
                        let in_interface = kind == ClassKind::Interface;
                        if let Some(method) = self.extract_method(member, &name, in_interface) {
                            class.methods.push(method);
                        }
                    }
                    _ => {}
                }
            }
        }

        self.classes.push(class);

        // Nested and local type declarations become records of their own
        if let Some(body) = body {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.visit_node(child);
            }
        }
    }

    fn extract_modifiers(&self, node: Node) -> Modifiers {
        let mut modifiers = Modifiers::default();
        let mut cursor = node.walk();
        let Some(list) = node.children(&mut cursor).find(|c| c.kind() == "modifiers") else {
            return modifiers;
        };

        let mut mod_cursor = list.walk();
        for modifier in list.children(&mut mod_cursor) {
            match modifier.kind() {
                "public" => modifiers.access = Some("public"),
                "private" => modifiers.access = Some("private"),
                "protected" => modifiers.access = Some("protected"),
                "static" => modifiers.is_static = true,
                "final" => modifiers.is_final = true,
                "abstract" => modifiers.is_abstract = true,
                "marker_annotation" | "annotation" => {
                    modifiers.raw_annotations.push(self.node_text(modifier));
                    self.collect_annotation_names(modifier, &mut modifiers.annotations);
                }
                _ => {}
            }
        }
        modifiers
    }

    /// Annotation names in preorder, including annotations nested in arguments.
    fn collect_annotation_names(&self, node: Node, names: &mut Vec<String>) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if matches!(current.kind(), "marker_annotation" | "annotation") {
                if let Some(name) = current.child_by_field_name("name") {
                    let text = self.node_text(name);
                    names.push(text.trim_start_matches('@').to_string());
                }
            }
            let mut cursor = current.walk();
            let children: Vec<Node> = current.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn extract_interfaces(&self, node: Node) -> Vec<String> {
        let mut interfaces = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "super_interfaces" && child.kind() != "extends_interfaces" {
                continue;
            }
            let mut list_cursor = child.walk();
            for list in child.named_children(&mut list_cursor) {
                if list.kind() != "type_list" {
                    continue;
                }
                let mut type_cursor = list.walk();
                for ty in list.named_children(&mut type_cursor) {
                    let name = self.type_name(ty);
                    if !name.is_empty() && !interfaces.contains(&name) {
                        interfaces.push(name);
                    }
                }
            }
        }
        interfaces
    }

    fn record_components(&self, params: Node) -> Vec<FieldRecord> {
        let mut fields = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if param.kind() != "formal_parameter" {
                continue;
            }
            let name = param.child_by_field_name("name").map(|n| self.node_text(n));
            let ty = param.child_by_field_name("type").map(|t| self.type_name(t));
            if let (Some(name), Some(ty)) = (name, ty) {
                fields.push(
                    FieldRecord::new(name, ty)
                        .with_access("private")
                        .final_field(),
                );
            }
        }
        fields
    }

    fn extract_fields(&self, node: Node) -> Vec<FieldRecord> {
        let modifiers = self.extract_modifiers(node);
        let field_type = node
            .child_by_field_name("type")
            .map(|t| self.type_name(t))
            .unwrap_or_default();

        let mut fields = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };

            let mut field = FieldRecord::new(self.node_text(name), field_type.clone())
                .with_access(modifiers.access_modifier())
                .with_annotations(modifiers.annotations.clone());
            if modifiers.is_static {
                field = field.static_field();
            }
            if modifiers.is_final {
                field = field.final_field();
            }
            if let Some(value) = declarator.child_by_field_name("value") {
                field = field.with_initial_value(self.node_text(value));
            }
            fields.push(field);
        }
        fields
    }

    fn extract_method(&self, node: Node, class_name: &str, in_interface: bool) -> Option<MethodRecord> {
        let is_constructor = node.kind() != "method_declaration";
        let name = match node.child_by_field_name("name") {
            Some(n) => self.node_text(n),
            None if is_constructor => class_name.to_string(),
            None => return None,
        };

        let modifiers = self.extract_modifiers(node);
        let body = node.child_by_field_name("body");

        let return_type = if is_constructor {
            class_name.to_string()
        } else {
            node.child_by_field_name("type")
                .map(|t| self.node_text(t))
                .unwrap_or_else(|| "void".to_string())
        };

        let mut method = MethodRecord::new(name, class_name, self.file_path.clone())
            .with_return_type(return_type)
            .with_access(modifiers.access_modifier());
        method.is_static = modifiers.is_static;
        method.is_final = modifiers.is_final;
        method.is_abstract =
            modifiers.is_abstract || (in_interface && body.is_none() && !modifiers.is_static);
        for annotation in modifiers.annotations {
            if !method.annotations.contains(&annotation) {
                method.annotations.push(annotation);
            }
        }
        method.raw_annotations = modifiers.raw_annotations;

        if let Some(params) = node.child_by_field_name("parameters") {
            method.parameters = self.extract_parameters(params);
        }

        if let Some(body) = body {
            method.local_variables = self.extract_locals(body);
            method.method_calls = call_site::collect_calls(body, self.source);
        }

        Some(method)
    }

    fn extract_parameters(&self, params: Node) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            match child.kind() {
                "formal_parameter" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let mut param_type = child
                        .child_by_field_name("type")
                        .map(|t| self.node_text(t))
                        .unwrap_or_default();
                    // `String args[]`
                    if let Some(dims) = child.child_by_field_name("dimensions") {
                        param_type.push_str(&self.node_text(dims));
                    }
                    parameters.push(Parameter::new(self.node_text(name), param_type));
                }
                "spread_parameter" => {
                    // Type ... declarator
                    let mut inner = child.walk();
                    let parts: Vec<Node> = child.named_children(&mut inner).collect();
                    let param_type = parts
                        .iter()
                        .find(|p| {
                            !matches!(p.kind(), "modifiers" | "variable_declarator" | "identifier")
                        })
                        .map(|t| self.node_text(*t))
                        .unwrap_or_default();
                    let name = parts
                        .iter()
                        .find_map(|p| match p.kind() {
                            "variable_declarator" => p.child_by_field_name("name"),
                            "identifier" => Some(*p),
                            _ => None,
                        })
                        .map(|n| self.node_text(n));
                    if let Some(name) = name {
                        parameters.push(Parameter::new(name, param_type).varargs());
                    }
                }
                _ => {}
            }
        }
        parameters
    }

    /// Locals declared anywhere in the body, in source order.
    fn extract_locals(&self, body: Node) -> Vec<LocalVariable> {
        let mut locals = Vec::new();
        let mut stack = vec![body];

        while let Some(node) = stack.pop() {
            match node.kind() {
                "local_variable_declaration" => {
                    let var_type = node
                        .child_by_field_name("type")
                        .map(|t| self.node_text(t))
                        .unwrap_or_default();
                    if !var_type.is_empty() {
                        let mut cursor = node.walk();
                        for declarator in node.children(&mut cursor) {
                            if declarator.kind() != "variable_declarator" {
                                continue;
                            }
                            if let Some(name) = declarator.child_by_field_name("name") {
                                locals.push(LocalVariable::new(self.node_text(name), var_type.clone()));
                            }
                        }
                    }
                }
                "enhanced_for_statement" | "resource" => {
                    let ty = node.child_by_field_name("type");
                    let name = node.child_by_field_name("name");
                    if let (Some(ty), Some(name)) = (ty, name) {
                        locals.push(LocalVariable::new(self.node_text(name), self.node_text(ty)));
                    }
                }
                "catch_formal_parameter" => {
                    let mut cursor = node.walk();
                    let catch_type = node.children(&mut cursor).find(|c| c.kind() == "catch_type");
                    let name = node.child_by_field_name("name");
                    if let (Some(ty), Some(name)) = (catch_type, name) {
                        locals.push(LocalVariable::new(self.node_text(name), self.node_text(ty)));
                    }
                }
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        locals
    }

    fn type_name(&self, node: Node) -> String {
        base_type(&self.node_text(node)).to_string()
    }
}

/// Member declarations of a class, interface, enum or record body.
fn members(body: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() == "enum_body_declarations" {
            let mut inner = child.walk();
            out.extend(child.named_children(&mut inner));
        } else {
            out.push(child);
        }
    }
    out
}
