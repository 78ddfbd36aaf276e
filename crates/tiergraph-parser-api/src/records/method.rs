use serde::{Deserialize, Serialize};

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Declared type as written in source
    #[serde(rename = "type")]
    pub param_type: String,

    /// Declared with `...`
    pub is_varargs: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            is_varargs: false,
        }
    }

    pub fn varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }
}

/// A local variable declared inside a method body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalVariable {
    pub name: String,

    #[serde(rename = "type")]
    pub var_type: String,
}

impl LocalVariable {
    pub fn new(name: impl Into<String>, var_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: var_type.into(),
        }
    }
}

/// A method or constructor declared on a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    /// Method name
    pub name: String,

    /// Return type as written ("void" when absent)
    pub return_type: String,

    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,

    /// Local variables in body order
    pub local_variables: Vec<LocalVariable>,

    /// "public", "private", "protected" or "package"
    pub access_modifier: String,

    pub is_static: bool,

    pub is_abstract: bool,

    pub is_final: bool,

    /// Annotation names without the `@` marker
    pub annotations: Vec<String>,

    /// Full annotation source text, e.g. `@GetMapping("/users")`
    pub raw_annotations: Vec<String>,

    /// Normalized call sites: `"receiver.method"` or `"method"`
    pub method_calls: Vec<String>,

    /// Simple name of the declaring class
    pub class_name: String,

    /// Source file of the declaring class
    pub file_path: String,
}

impl MethodRecord {
    pub fn new(
        name: impl Into<String>,
        class_name: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type: "void".to_string(),
            parameters: Vec::new(),
            local_variables: Vec::new(),
            access_modifier: "package".to_string(),
            is_static: false,
            is_abstract: false,
            is_final: false,
            annotations: Vec::new(),
            raw_annotations: Vec::new(),
            method_calls: Vec::new(),
            class_name: class_name.into(),
            file_path: file_path.into(),
        }
    }

    /// Graph key of this method: `ClassName.methodName`.
    ///
    /// Overloads share one signature.
    pub fn signature(&self) -> String {
        format!("{}.{}", self.class_name, self.name)
    }

    // Builder methods
    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn with_parameter(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_local(mut self, local: LocalVariable) -> Self {
        self.local_variables.push(local);
        self
    }

    pub fn with_annotation(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.raw_annotations.push(format!("@{name}"));
        self.annotations.push(name);
        self
    }

    /// Attach an annotation whose full text carries arguments.
    pub fn with_raw_annotation(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self.raw_annotations.push(raw.into());
        self
    }

    pub fn with_call(mut self, call: impl Into<String>) -> Self {
        self.method_calls.push(call.into());
        self
    }

    pub fn with_access(mut self, access: impl Into<String>) -> Self {
        self.access_modifier = access.into();
        self
    }

    pub fn abstract_method(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_uses_simple_class_name() {
        let method = MethodRecord::new("find", "OrderService", "OrderService.java");
        assert_eq!(method.signature(), "OrderService.find");
        assert_eq!(method.return_type, "void");
        assert_eq!(method.access_modifier, "package");
    }

    #[test]
    fn test_builder_collects_calls_and_annotations() {
        let method = MethodRecord::new("getOrder", "OrderController", "C.java")
            .with_raw_annotation("GetMapping", "@GetMapping(\"/orders\")")
            .with_parameter(Parameter::new("ids", "Long").varargs())
            .with_call("orderService.find");

        assert_eq!(method.annotations, vec!["GetMapping"]);
        assert_eq!(method.raw_annotations, vec!["@GetMapping(\"/orders\")"]);
        assert!(method.parameters[0].is_varargs);
        assert_eq!(method.method_calls, vec!["orderService.find"]);
    }

    #[test]
    fn test_wire_names() {
        let param = Parameter::new("id", "Long");
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "Long");
        assert_eq!(json["is_varargs"], false);
    }
}
