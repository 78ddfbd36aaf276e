use serde::{Deserialize, Serialize};

/// A field declared on a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Field name
    pub name: String,

    /// Declared type with generic parameters stripped
    #[serde(rename = "type")]
    pub field_type: String,

    /// Annotation names without the `@` marker
    pub annotations: Vec<String>,

    /// "public", "private", "protected" or "package"
    pub access_modifier: String,

    pub is_static: bool,

    pub is_final: bool,

    /// Initializer source text, if any
    pub initial_value: Option<String>,
}

impl FieldRecord {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            annotations: Vec::new(),
            access_modifier: "package".to_string(),
            is_static: false,
            is_final: false,
            initial_value: None,
        }
    }

    pub fn with_access(mut self, access: impl Into<String>) -> Self {
        self.access_modifier = access.into();
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<String>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn static_field(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn final_field(mut self) -> Self {
        self.is_final = true;
        self
    }
}
