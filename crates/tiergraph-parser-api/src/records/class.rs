use super::{FieldRecord, MethodRecord};
use serde::{Deserialize, Serialize};

/// Kind of type declaration a class record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
}

/// A class, interface, enum or record declaration.
///
/// Identity is `(package, name)`. Simple names are not unique across a
/// project; lookups by simple name are resolved by the type index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Simple name
    pub name: String,

    /// Package name ("" when the file has no package declaration)
    pub package: String,

    /// Superclass name, if any
    pub superclass: Option<String>,

    /// Implemented (or, for interfaces, extended) interfaces in declaration order
    pub interfaces: Vec<String>,

    /// Annotation names without the `@` marker, deduplicated in source order
    pub annotations: Vec<String>,

    /// Full annotation source text
    pub raw_annotations: Vec<String>,

    /// Import declarations of the enclosing file
    pub imports: Vec<String>,

    pub kind: ClassKind,

    pub fields: Vec<FieldRecord>,

    pub methods: Vec<MethodRecord>,

    /// Source file path
    pub file_path: String,
}

impl ClassRecord {
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            raw_annotations: Vec::new(),
            imports: Vec::new(),
            kind: ClassKind::Class,
            fields: Vec::new(),
            methods: Vec::new(),
            file_path: file_path.into(),
        }
    }

    /// `package.Name`, or just `Name` in the default package
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Last method with the given name (overloads collapse to the last one)
    pub fn method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().rev().find(|m| m.name == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    // Builder methods
    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_annotation(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.raw_annotations.push(format!("@{name}"));
        if !self.annotations.contains(&name) {
            self.annotations.push(name);
        }
        self
    }

    /// Attach an annotation whose full text carries arguments.
    pub fn with_raw_annotation(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        let name = name.into();
        if !self.annotations.contains(&name) {
            self.annotations.push(name);
        }
        self.raw_annotations.push(raw.into());
        self
    }

    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.imports.push(import.into());
        self
    }

    pub fn with_field(mut self, field: FieldRecord) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method, taking ownership of its class name and file path.
    pub fn with_method(mut self, mut method: MethodRecord) -> Self {
        method.class_name = self.name.clone();
        method.file_path = self.file_path.clone();
        self.methods.push(method);
        self
    }
}
