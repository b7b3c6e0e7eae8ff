// In: src/bridge/naming.rs

//! The exported symbol naming convention.
//!
//! The flat C symbol namespace has no overloading, so every (type, operation)
//! pair gets its own symbol, always prefixed by the concrete type name. Within a
//! type, symbols fall into one of three bands:
//!
//! | band      | shape           | example            |
//! |-----------|-----------------|--------------------|
//! | lifecycle | `T_new`, `T_delete` | `Cat_new`      |
//! | method    | `T_<method>`    | `Cat_scratch`      |
//! | operator  | `T___<op>`      | `Cat___mul_number` |
//!
//! The convention is applied uniformly to every exposed type. The generator
//! rejects any method whose symbol would land on a lifecycle name.

use crate::types::MethodKind;

pub const CONSTRUCTOR_NAME: &str = "new";
pub const DESTRUCTOR_NAME: &str = "delete";

/// Separator for the lifecycle and method bands.
pub const METHOD_SEPARATOR: &str = "_";
/// Separator for the operator band.
pub const OPERATOR_SEPARATOR: &str = "___";

pub fn constructor_symbol(type_name: &str) -> String {
    format!("{type_name}{METHOD_SEPARATOR}{CONSTRUCTOR_NAME}")
}

pub fn destructor_symbol(type_name: &str) -> String {
    format!("{type_name}{METHOD_SEPARATOR}{DESTRUCTOR_NAME}")
}

pub fn method_symbol(type_name: &str, method: &str, kind: MethodKind) -> String {
    let separator = match kind {
        MethodKind::Virtual | MethodKind::Own => METHOD_SEPARATOR,
        MethodKind::Operator => OPERATOR_SEPARATOR,
    };
    format!("{type_name}{separator}{method}")
}

/// Returns true if `name` is usable as a C identifier.
pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(constructor_symbol("Animal"), "Animal_new");
        assert_eq!(destructor_symbol("Cat"), "Cat_delete");
        assert_eq!(method_symbol("Cat", "scratch", MethodKind::Own), "Cat_scratch");
        assert_eq!(method_symbol("Animal", "eat", MethodKind::Virtual), "Animal_eat");
        assert_eq!(
            method_symbol("Cat", "mul_number", MethodKind::Operator),
            "Cat___mul_number"
        );
    }

    #[test]
    fn test_identifiers() {
        assert!(is_c_identifier("Cat"));
        assert!(is_c_identifier("_private2"));
        assert!(!is_c_identifier(""));
        assert!(!is_c_identifier("2cats"));
        assert!(!is_c_identifier("mul-number"));
    }
}
