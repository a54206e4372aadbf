//! Annotations and their closed parameter schemas.
//!
//! The annotation surface is a fixed set: unknown names or unknown/duplicate
//! parameter names are hard errors. For compatibility checking two
//! annotations are "the same" when their names match; parameters are not
//! compared.

use crate::{ConstExprId, Location};
use smallvec::SmallVec;
use std::fmt;

/// The closed set of annotation names.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AnnotationKind {
    Nullable,
    Utf8,
    Utf8InCpp,
    VintfStability,
    JavaOnlyStableParcelable,
    Backing,
    UnsupportedAppUsage,
}

impl AnnotationKind {
    pub fn name(self) -> &'static str {
        match self {
            AnnotationKind::Nullable => "nullable",
            AnnotationKind::Utf8 => "utf8",
            AnnotationKind::Utf8InCpp => "utf8InCpp",
            AnnotationKind::VintfStability => "VintfStability",
            AnnotationKind::JavaOnlyStableParcelable => "JavaOnlyStableParcelable",
            AnnotationKind::Backing => "Backing",
            AnnotationKind::UnsupportedAppUsage => "UnsupportedAppUsage",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nullable" => Some(AnnotationKind::Nullable),
            "utf8" => Some(AnnotationKind::Utf8),
            "utf8InCpp" => Some(AnnotationKind::Utf8InCpp),
            "VintfStability" => Some(AnnotationKind::VintfStability),
            "JavaOnlyStableParcelable" => Some(AnnotationKind::JavaOnlyStableParcelable),
            "Backing" => Some(AnnotationKind::Backing),
            "UnsupportedAppUsage" => Some(AnnotationKind::UnsupportedAppUsage),
            _ => None,
        }
    }

    /// The legal parameters of this annotation and their expected types.
    pub fn schema(self) -> &'static [(&'static str, ParamType)] {
        match self {
            AnnotationKind::Nullable
            | AnnotationKind::Utf8
            | AnnotationKind::Utf8InCpp
            | AnnotationKind::VintfStability
            | AnnotationKind::JavaOnlyStableParcelable => &[],
            AnnotationKind::Backing => &[("type", ParamType::Str)],
            AnnotationKind::UnsupportedAppUsage => &[
                ("expectedSignature", ParamType::Str),
                ("implicitMember", ParamType::Str),
                ("maxTargetSdk", ParamType::Int),
                ("publicAlternatives", ParamType::Str),
                ("trackingBug", ParamType::Long),
            ],
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Expected type of an annotation parameter value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParamType {
    Str,
    Int,
    Long,
}

/// A named annotation parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationParam {
    pub name: String,
    pub value: ConstExprId,
}

/// An `@name(param = value, ...)` annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub params: SmallVec<[AnnotationParam; 2]>,
    pub location: Location,
}

impl Annotation {
    pub fn new(kind: AnnotationKind, location: Location) -> Self {
        Annotation {
            kind,
            params: SmallVec::new(),
            location,
        }
    }

    pub fn param(&self, name: &str) -> Option<ConstExprId> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }
}

/// Ordering and equality on annotation lists, by name only.
///
/// Returns the kinds present in `annotations`, sorted by name, deduplicated.
/// This is the comparison key used by the compatibility checker and the
/// rendering order used by the dumper.
pub fn sorted_kinds(annotations: &[Annotation]) -> Vec<AnnotationKind> {
    let mut kinds: Vec<AnnotationKind> = annotations.iter().map(|a| a.kind).collect();
    kinds.sort_by_key(|k| k.name());
    kinds.dedup();
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn schema_shapes() {
        assert!(AnnotationKind::Nullable.schema().is_empty());
        assert_eq!(AnnotationKind::UnsupportedAppUsage.schema().len(), 5);
        assert_eq!(
            AnnotationKind::Backing.schema(),
            &[("type", ParamType::Str)]
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(AnnotationKind::from_name("Hide"), None);
        assert_eq!(
            AnnotationKind::from_name("nullable"),
            Some(AnnotationKind::Nullable)
        );
    }

    #[test]
    fn sorted_kinds_is_order_insensitive() {
        use std::sync::Arc;
        let loc = Location::new(Arc::from("t.bidl"), 1, 1);
        let a = vec![
            Annotation::new(AnnotationKind::Utf8InCpp, loc.clone()),
            Annotation::new(AnnotationKind::Nullable, loc.clone()),
        ];
        let b = vec![
            Annotation::new(AnnotationKind::Nullable, loc.clone()),
            Annotation::new(AnnotationKind::Utf8InCpp, loc),
        ];
        assert_eq!(sorted_kinds(&a), sorted_kinds(&b));
    }
}
