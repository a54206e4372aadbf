//! Type specifiers: references to builtin or defined types.

use super::annotation::{sorted_kinds, Annotation, AnnotationKind};
use super::builtin;
use crate::Location;
use std::fmt;

/// A reference to a type, as written in source.
///
/// Resolution is a one-way state transition: `unresolved -> resolved`,
/// recording the fully-qualified name. Attempting to resolve twice is a
/// contract violation between compiler passes and aborts the process.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeSpecifier {
    /// The name as written: simple (`Data`) or qualified (`p.Data`).
    unresolved_name: String,
    /// Fully-qualified name, recorded exactly once by the resolver.
    resolved: Option<String>,
    pub is_array: bool,
    /// Generic type arguments; empty for raw or non-generic references.
    pub type_args: Vec<TypeSpecifier>,
    pub annotations: Vec<Annotation>,
    pub location: Location,
}

impl TypeSpecifier {
    pub fn new(name: String, location: Location) -> Self {
        TypeSpecifier {
            unresolved_name: name,
            resolved: None,
            is_array: false,
            type_args: Vec::new(),
            annotations: Vec::new(),
            location,
        }
    }

    /// The name as written in source.
    pub fn unresolved_name(&self) -> &str {
        &self.unresolved_name
    }

    /// The effective name: fully-qualified if resolved, as-written otherwise.
    pub fn name(&self) -> &str {
        self.resolved.as_deref().unwrap_or(&self.unresolved_name)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Record the fully-qualified name.
    ///
    /// # Panics
    /// Panics if the specifier was already resolved — resolving twice means
    /// two passes disagree about pipeline ordering, which is fatal.
    pub fn resolve(&mut self, fully_qualified: String) {
        assert!(
            self.resolved.is_none(),
            "type specifier `{}` resolved twice (second resolution to `{fully_qualified}`)",
            self.unresolved_name
        );
        self.resolved = Some(fully_qualified);
    }

    /// The simple (last dotted segment) form of the written name.
    pub fn simple_name(&self) -> &str {
        self.unresolved_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.unresolved_name)
    }

    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        self.annotations.iter().any(|a| a.kind == kind)
    }

    pub fn is_nullable(&self) -> bool {
        self.has_annotation(AnnotationKind::Nullable)
    }

    pub fn is_utf8(&self) -> bool {
        self.has_annotation(AnnotationKind::Utf8) || self.has_annotation(AnnotationKind::Utf8InCpp)
    }

    /// Whether the effective name is a builtin type.
    pub fn is_builtin(&self) -> bool {
        builtin::is_builtin(self.name())
    }

    /// Whether this is a primitive value type (arrays excluded).
    pub fn is_primitive(&self) -> bool {
        !self.is_array && builtin::is_primitive(self.name())
    }

    pub fn is_void(&self) -> bool {
        !self.is_array && self.name() == "void"
    }

    pub fn is_string(&self) -> bool {
        self.name() == "String"
    }

    /// Whether this reference is generic (has explicit type arguments).
    pub fn is_generic(&self) -> bool {
        !self.type_args.is_empty()
    }

    /// The bare type without annotations: `name<args>[]`.
    pub fn bare_string(&self) -> String {
        let mut out = self.name().to_string();
        if !self.type_args.is_empty() {
            let args: Vec<String> = self.type_args.iter().map(|t| t.bare_string()).collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
        if self.is_array {
            out.push_str("[]");
        }
        out
    }

    /// Canonical annotated form used by the dumper and the compatibility
    /// checker: annotations in sorted order, then the bare type.
    pub fn canonical_string(&self) -> String {
        let mut out = String::new();
        for kind in sorted_kinds(&self.annotations) {
            out.push('@');
            out.push_str(kind.name());
            out.push(' ');
        }
        out.push_str(&self.bare_string());
        out
    }
}

impl fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bare_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn loc() -> Location {
        Location::new(Arc::from("t.bidl"), 1, 1)
    }

    #[test]
    fn resolution_is_one_way() {
        let mut ty = TypeSpecifier::new("Data".into(), loc());
        assert!(!ty.is_resolved());
        assert_eq!(ty.name(), "Data");
        ty.resolve("p.Data".into());
        assert!(ty.is_resolved());
        assert_eq!(ty.name(), "p.Data");
        assert_eq!(ty.unresolved_name(), "Data");
    }

    #[test]
    #[should_panic(expected = "resolved twice")]
    fn double_resolution_panics() {
        let mut ty = TypeSpecifier::new("Data".into(), loc());
        ty.resolve("p.Data".into());
        ty.resolve("q.Data".into());
    }

    #[test]
    fn canonical_string_sorts_annotations() {
        let mut ty = TypeSpecifier::new("String".into(), loc());
        ty.annotations
            .push(Annotation::new(AnnotationKind::Utf8InCpp, loc()));
        ty.annotations
            .push(Annotation::new(AnnotationKind::Nullable, loc()));
        assert_eq!(ty.canonical_string(), "@nullable @utf8InCpp String");
    }

    #[test]
    fn generic_array_rendering() {
        let mut ty = TypeSpecifier::new("List".into(), loc());
        ty.type_args
            .push(TypeSpecifier::new("String".into(), loc()));
        assert_eq!(ty.bare_string(), "List<String>");

        let mut arr = TypeSpecifier::new("int".into(), loc());
        arr.is_array = true;
        assert_eq!(arr.bare_string(), "int[]");
        assert!(!arr.is_primitive());
    }
}
