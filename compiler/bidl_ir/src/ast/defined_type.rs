//! Defined types and documents.
//!
//! `DefinedType` is a closed sum over the four declarable kinds; every use
//! site pattern-matches exhaustively instead of downcasting.

use super::annotation::{Annotation, AnnotationKind};
use super::member::{ConstantDecl, Method, VariableDecl};
use crate::{ConstExprId, Location, ValueType};
use std::fmt;
use std::sync::Arc;

/// An interface: ordered methods plus constants.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Interface {
    pub methods: Vec<Method>,
    pub constants: Vec<ConstantDecl>,
}

/// An unstructured parcelable: fields live outside the IDL, optionally
/// backed by an externally supplied native header.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct UnstructuredParcelable {
    pub cpp_header: Option<String>,
    /// Declared generic parameters (`parcelable Bar<T, U>;`).
    pub type_params: Option<Vec<String>>,
}

/// A structured parcelable: fields fully declared in the IDL. Field order
/// is semantically significant (wire layout); fields may only be appended.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StructuredParcelable {
    pub fields: Vec<VariableDecl>,
}

/// A single enumerator. `value` is `None` only between parsing and the
/// auto-fill pass; validation guarantees a value afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Enumerator {
    pub comment: Option<String>,
    pub name: String,
    pub value: Option<ConstExprId>,
    pub location: Location,
}

/// An enum declaration with its backing integer type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub enumerators: Vec<Enumerator>,
    /// Set by validation from `@Backing(type = "...")`; `int` by default.
    pub backing: ValueType,
}

impl Default for EnumDecl {
    fn default() -> Self {
        EnumDecl {
            enumerators: Vec::new(),
            backing: ValueType::Int32,
        }
    }
}

/// The kind-specific payload of a defined type.
#[derive(Clone, Debug, PartialEq)]
pub enum DefinedTypeKind {
    Interface(Interface),
    Parcelable(UnstructuredParcelable),
    StructuredParcelable(StructuredParcelable),
    Enum(EnumDecl),
}

impl DefinedTypeKind {
    /// The declaration keyword, for diagnostics and dumps.
    pub fn keyword(&self) -> &'static str {
        match self {
            DefinedTypeKind::Interface(_) => "interface",
            DefinedTypeKind::Parcelable(_) | DefinedTypeKind::StructuredParcelable(_) => {
                "parcelable"
            }
            DefinedTypeKind::Enum(_) => "enum",
        }
    }

    /// Discriminant equality for the compatibility checker's structural
    /// type-mismatch test (structured and unstructured parcelables are
    /// distinct kinds there).
    pub fn same_kind(&self, other: &DefinedTypeKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A type defined in one source unit.
#[derive(Clone, Debug, PartialEq)]
pub struct DefinedType {
    pub comment: Option<String>,
    pub annotations: Vec<Annotation>,
    pub name: String,
    /// Dot-separated package path segments; empty for the default package.
    pub package: Vec<String>,
    pub location: Location,
    /// True when registered from a preprocessed API index rather than a
    /// directly parsed source file. Loses name-resolution ties.
    pub from_preprocessed: bool,
    pub kind: DefinedTypeKind,
}

impl DefinedType {
    /// Fully-qualified dotted name.
    pub fn canonical_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package.join("."), self.name)
        }
    }

    pub fn package_string(&self) -> String {
        self.package.join(".")
    }

    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        self.annotations.iter().any(|a| a.kind == kind)
    }

    /// Whether the attached doc comment hides this type from public API
    /// surfaces. Matches `@hide` as a word, so `@hidever` does not count.
    pub fn is_hidden(&self) -> bool {
        comment_has_hide(self.comment.as_deref())
    }
}

impl fmt::Display for DefinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.keyword(), self.canonical_name())
    }
}

/// Check a doc comment for a `@hide` marker at a word boundary.
pub fn comment_has_hide(comment: Option<&str>) -> bool {
    let Some(text) = comment else {
        return false;
    };
    let mut rest = text;
    while let Some(pos) = rest.find("@hide") {
        let after = &rest[pos + "@hide".len()..];
        match after.bytes().next() {
            None => return true,
            Some(b) if !b.is_ascii_alphanumeric() && b != b'_' => return true,
            _ => rest = after,
        }
    }
    false
}

/// An import statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    /// Dotted qualified name.
    pub path: String,
    pub location: Location,
}

impl Import {
    /// The simple (last segment) name the import makes visible.
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// One parsed source unit: package, imports, and its defined types.
///
/// The grammar admits exactly one defined type per file; the parser still
/// collects extras so the "one type per file" rule can be reported as a
/// validation diagnostic rather than a parse failure.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub file: Arc<str>,
    pub package: Vec<String>,
    pub imports: Vec<Import>,
    pub defined_types: Vec<DefinedType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonical_name_with_and_without_package() {
        let loc = Location::new(Arc::from("t.bidl"), 1, 1);
        let mut ty = DefinedType {
            comment: None,
            annotations: Vec::new(),
            name: "IFoo".into(),
            package: vec!["foo".into(), "bar".into()],
            location: loc,
            from_preprocessed: false,
            kind: DefinedTypeKind::Interface(Interface::default()),
        };
        assert_eq!(ty.canonical_name(), "foo.bar.IFoo");
        ty.package.clear();
        assert_eq!(ty.canonical_name(), "IFoo");
    }

    #[test]
    fn hide_marker_requires_word_boundary() {
        assert!(comment_has_hide(Some("// comment @hide")));
        assert!(comment_has_hide(Some("/* @hide */")));
        assert!(comment_has_hide(Some("@hide")));
        assert!(!comment_has_hide(Some("/*@hide2*/")));
        assert!(!comment_has_hide(Some("no marker")));
        assert!(!comment_has_hide(None));
    }

    #[test]
    fn import_simple_name() {
        let loc = Location::new(Arc::from("t.bidl"), 1, 1);
        let import = Import {
            path: "foo.bar.Data".into(),
            location: loc,
        };
        assert_eq!(import.simple_name(), "Data");
    }
}
