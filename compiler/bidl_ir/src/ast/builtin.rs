//! The builtin type table.
//!
//! Builtin names resolve to themselves and are never registered in the
//! typenames registry.

/// All builtin type names.
pub const BUILTIN_TYPES: &[&str] = &[
    "void",
    "boolean",
    "byte",
    "char",
    "int",
    "long",
    "float",
    "double",
    "String",
    "CharSequence",
    "List",
    "Map",
    "IBinder",
    "FileDescriptor",
    "ParcelFileDescriptor",
];

/// Primitive value types (not `void`, not reference types).
const PRIMITIVES: &[&str] = &["boolean", "byte", "char", "int", "long", "float", "double"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Declared arity of generic builtins. Raw (argument-less) uses stay legal;
/// when arguments are given their count must match exactly.
pub fn generic_arity(name: &str) -> Option<usize> {
    match name {
        "List" => Some(1),
        "Map" => Some(2),
        _ => None,
    }
}

/// Binder kernel object; cannot be carried inside an array.
pub fn is_binder(name: &str) -> bool {
    name == "IBinder"
}

#[cfg(test)]
mod tests {
    #[test]
    fn classification() {
        assert!(super::is_builtin("String"));
        assert!(super::is_primitive("int"));
        assert!(!super::is_primitive("String"));
        assert_eq!(super::generic_arity("Map"), Some(2));
        assert_eq!(super::generic_arity("String"), None);
    }
}
