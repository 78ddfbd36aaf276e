//! Structural records produced by extractors.
//!
//! Records are created once per file and are not mutated after extraction.

mod class;
mod field;
mod method;

pub use class::{ClassKind, ClassRecord};
pub use field::FieldRecord;
pub use method::{LocalVariable, MethodRecord, Parameter};

/// Strip generic parameters from a declared type (`List<User>` becomes `List`).
pub fn base_type(declared: &str) -> &str {
    match declared.find('<') {
        Some(idx) => declared[..idx].trim(),
        None => declared.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_strips_generics() {
        assert_eq!(base_type("List<User>"), "List");
        assert_eq!(base_type("Map<String, List<Order>>"), "Map");
        assert_eq!(base_type(" OrderMapper "), "OrderMapper");
        assert_eq!(base_type("int[]"), "int[]");
    }
}
