//! Layer classification.
//!
//! An ordered rule table; the first rule that matches decides. Every rule is
//! a case-insensitive substring test except the class-name rule, which is
//! case-sensitive.
//!
//! | rule | input | example |
//! |---|---|---|
//! | annotation | class + method annotations | `@RestController` gives Controller |
//! | class name | simple class name | `UserRepository` gives Repository |
//! | interface | implemented/extended interfaces | `JpaRepository` gives Repository |
//! | package | package name | `com.shop.mybatis` gives Mapper |
//! | field type | declared field types | `EntityManager` gives Repository |

use serde::{Deserialize, Serialize};
use tiergraph::Layer;
use tiergraph_parser_api::{ClassRecord, MethodRecord};

/// The rule that produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRule {
    Annotation,
    ClassName,
    Interface,
    Package,
    FieldType,
    Default,
}

const ANNOTATION_RULES: &[(&[&str], Layer)] = &[
    (&["controller"], Layer::Controller),
    (&["service"], Layer::Service),
    (&["mapper"], Layer::Mapper),
    (&["repository"], Layer::Repository),
    (&["entity", "table"], Layer::Entity),
];

const CLASS_NAME_RULES: &[(&[&str], Layer)] = &[
    (&["Controller", "RestController", "WebController"], Layer::Controller),
    (&["Service", "BusinessService", "ApplicationService"], Layer::Service),
    (
        &["Repository", "JpaRepository", "CrudRepository", "DAO", "Dao", "JdbcDao", "JdbcTemplateDao"],
        Layer::Repository,
    ),
    (&["Mapper", "MyBatisMapper", "SqlMapper"], Layer::Mapper),
    (&["Entity", "Domain", "Model", "POJO"], Layer::Entity),
];

const INTERFACE_RULES: &[(&[&str], Layer)] = &[
    (&["mapper", "sqlmapper"], Layer::Mapper),
    (
        &["repository", "jparepository", "crudrepository", "pagerepository"],
        Layer::Repository,
    ),
];

const PACKAGE_RULES: &[(&[&str], Layer)] = &[
    (&["controller", "web", "api"], Layer::Controller),
    (&["service", "business"], Layer::Service),
    (&["mapper", "mybatis"], Layer::Mapper),
    (&["repository", "jpa"], Layer::Repository),
    (&["dao", "data"], Layer::Dao),
    (&["entity", "domain", "model", "beans"], Layer::Entity),
];

const FIELD_TYPE_RULES: &[(&[&str], Layer)] = &[
    (&["entitymanager"], Layer::Repository),
    (&["sqlsession"], Layer::Mapper),
    (&["jdbctemplate", "datasource"], Layer::Dao),
];

fn first_match(rules: &[(&[&str], Layer)], text: &str) -> Option<Layer> {
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| text.contains(n)))
        .map(|(_, layer)| *layer)
}

/// Classify a method (or a whole class when `method` is `None`).
pub fn classify_layer(class: &ClassRecord, method: Option<&MethodRecord>) -> Layer {
    classify_layer_with_rule(class, method).0
}

/// Classify and report which rule decided.
pub fn classify_layer_with_rule(
    class: &ClassRecord,
    method: Option<&MethodRecord>,
) -> (Layer, LayerRule) {
    let annotations: Vec<String> = class
        .annotations
        .iter()
        .chain(method.into_iter().flat_map(|m| m.annotations.iter()))
        .map(|a| a.to_lowercase())
        .collect();
    // Layer order outranks annotation order
    for (needles, layer) in ANNOTATION_RULES {
        if annotations
            .iter()
            .any(|a| needles.iter().any(|n| a.contains(n)))
        {
            return (*layer, LayerRule::Annotation);
        }
    }

    if let Some(layer) = first_match(CLASS_NAME_RULES, &class.name) {
        return (layer, LayerRule::ClassName);
    }

    for interface in &class.interfaces {
        if let Some(layer) = first_match(INTERFACE_RULES, &interface.to_lowercase()) {
            return (layer, LayerRule::Interface);
        }
    }

    if let Some(layer) = first_match(PACKAGE_RULES, &class.package.to_lowercase()) {
        return (layer, LayerRule::Package);
    }

    for field in &class.fields {
        if let Some(layer) = first_match(FIELD_TYPE_RULES, &field.field_type.to_lowercase()) {
            return (layer, LayerRule::FieldType);
        }
    }

    (Layer::Unknown, LayerRule::Default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiergraph_parser_api::FieldRecord;

    fn class(name: &str, package: &str) -> ClassRecord {
        ClassRecord::new(name, package, format!("{name}.java"))
    }

    #[test]
    fn test_annotation_rule() {
        let cls = class("Billing", "app").with_annotation("Service");
        assert_eq!(
            classify_layer_with_rule(&cls, None),
            (Layer::Service, LayerRule::Annotation)
        );

        let entity = class("Invoice", "app").with_annotation("Table");
        assert_eq!(classify_layer(&entity, None), Layer::Entity);
    }

    #[test]
    fn test_annotation_layer_order() {
        // Controller outranks Service regardless of annotation order
        let cls = class("Billing", "app")
            .with_annotation("Service")
            .with_annotation("RestController");
        assert_eq!(classify_layer(&cls, None), Layer::Controller);
    }

    #[test]
    fn test_method_annotation_counts() {
        let cls = class("Billing", "app");
        let method = MethodRecord::new("load", "Billing", "Billing.java").with_annotation("Repository");
        assert_eq!(classify_layer(&cls, Some(&method)), Layer::Repository);
        assert_eq!(classify_layer(&cls, None), Layer::Unknown);
    }

    #[test]
    fn test_class_name_rule() {
        assert_eq!(
            classify_layer_with_rule(&class("UserRepository", "app"), None),
            (Layer::Repository, LayerRule::ClassName)
        );
        assert_eq!(classify_layer(&class("OrderDao", "app"), None), Layer::Repository);
        assert_eq!(classify_layer(&class("OrderMapper", "app"), None), Layer::Mapper);
        assert_eq!(classify_layer(&class("UserModel", "app"), None), Layer::Entity);
        // Case-sensitive
        assert_eq!(classify_layer(&class("Servicer", "app"), None), Layer::Service);
        assert_eq!(classify_layer(&class("microservice", "app"), None), Layer::Unknown);
    }

    #[test]
    fn test_interface_rule() {
        let cls = class("OrderStore", "app").with_interface("JpaRepository");
        assert_eq!(
            classify_layer_with_rule(&cls, None),
            (Layer::Repository, LayerRule::Interface)
        );
        let mapper = class("OrderStore", "app").with_interface("BaseSqlMapper");
        assert_eq!(classify_layer(&mapper, None), Layer::Mapper);
    }

    #[test]
    fn test_package_rule() {
        assert_eq!(
            classify_layer_with_rule(&class("Handler", "com.shop.web"), None),
            (Layer::Controller, LayerRule::Package)
        );
        assert_eq!(classify_layer(&class("Store", "com.shop.mybatis"), None), Layer::Mapper);
        assert_eq!(classify_layer(&class("Store", "com.shop.dao"), None), Layer::Dao);
        assert_eq!(classify_layer(&class("Order", "com.shop.beans"), None), Layer::Entity);
    }

    #[test]
    fn test_field_type_rule() {
        let cls = class("Store", "app").with_field(FieldRecord::new("em", "EntityManager"));
        assert_eq!(
            classify_layer_with_rule(&cls, None),
            (Layer::Repository, LayerRule::FieldType)
        );
        let jdbc = class("Store", "app").with_field(FieldRecord::new("jdbc", "JdbcTemplate"));
        assert_eq!(classify_layer(&jdbc, None), Layer::Dao);
        let session = class("Store", "app").with_field(FieldRecord::new("s", "SqlSessionTemplate"));
        assert_eq!(classify_layer(&session, None), Layer::Mapper);
    }

    #[test]
    fn test_default_is_unknown() {
        let cls = class("Helper", "util").with_field(FieldRecord::new("count", "int"));
        assert_eq!(
            classify_layer_with_rule(&cls, None),
            (Layer::Unknown, LayerRule::Default)
        );
    }
}
