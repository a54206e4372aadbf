//! Front-end pipeline: load, resolve, auto-fill, validate.
//!
//! The passes run in a fixed order over one [`Typenames`] registry:
//!
//! 1. [`load_source`] / [`load_preprocessed`] parse and register documents;
//! 2. [`check_documents`] resolves every type reference, auto-fills
//!    enumerator values and transaction ids, and validates the result
//!    against the structural and backend rules.
//!
//! Each pass reports into the shared [`Diagnostics`] collector and keeps
//! going, so one run surfaces as many problems as it can.

mod autofill;
mod backend;
mod preprocessed;
mod resolve;
mod validate;

pub use backend::Backend;
pub use preprocessed::load_preprocessed;

use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_ir::{Location, Typenames};
use std::sync::Arc;

/// Options governing a compilation unit.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    pub backend: Backend,
    /// Reject unstructured parcelables entirely.
    pub structured: bool,
}

/// Parse one source file and register its types.
///
/// Duplicate canonical names are reported here; the parse itself reports its
/// own diagnostics. Returns false when the file did not parse.
pub fn load_source(
    source: &str,
    file: &Arc<str>,
    typenames: &mut Typenames,
    diagnostics: &mut Diagnostics,
) -> bool {
    let Some(document) = bidl_parse::parse_document(source, file, &mut typenames.arena, diagnostics)
    else {
        return false;
    };
    let duplicates = typenames.add_document(document);
    for canonical in duplicates {
        diagnostics.report(
            Diagnostic::error(ErrorCode::E2018, Location::generated(file))
                .with_message(format!("`{canonical}` is already defined")),
        );
    }
    true
}

/// Run the resolution, auto-fill, and validation passes over everything
/// registered so far.
pub fn check_documents(
    typenames: &mut Typenames,
    options: &CompileOptions,
    diagnostics: &mut Diagnostics,
) {
    resolve::resolve_all(typenames, diagnostics);
    autofill::fill_enum_values(typenames, diagnostics);
    autofill::assign_transaction_ids(typenames);
    validate::validate(typenames, options, diagnostics);
    tracing::debug!(
        errors = diagnostics.error_count(),
        types = typenames.iter_types().count(),
        "checked compilation unit"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidl_ir::{DefinedTypeKind, ValueType};
    use pretty_assertions::assert_eq;

    pub(crate) fn compile_with(
        sources: &[(&str, &str)],
        options: &CompileOptions,
    ) -> (Typenames, Diagnostics) {
        let mut typenames = Typenames::new();
        let mut diagnostics = Diagnostics::new();
        for (path, text) in sources {
            let file: Arc<str> = Arc::from(*path);
            load_source(text, &file, &mut typenames, &mut diagnostics);
        }
        check_documents(&mut typenames, options, &mut diagnostics);
        (typenames, diagnostics)
    }

    pub(crate) fn compile(sources: &[(&str, &str)]) -> (Typenames, Diagnostics) {
        compile_with(sources, &CompileOptions::default())
    }

    pub(crate) fn codes(diagnostics: &Diagnostics) -> Vec<ErrorCode> {
        diagnostics.errors().map(|d| d.code).collect()
    }

    #[test]
    fn clean_unit_produces_no_diagnostics() {
        let (typenames, diagnostics) = compile(&[
            (
                "p/IFoo.bidl",
                "package p; import p.Data; interface IFoo { Data get(); oneway void drop(); }",
            ),
            ("p/Data.bidl", "package p; parcelable Data { int count; }"),
        ]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        assert!(typenames.get("p.IFoo").is_some());
        assert!(typenames.get("p.Data").is_some());
    }

    #[test]
    fn cross_file_references_resolve_to_canonical_names() {
        let (typenames, diagnostics) = compile(&[
            ("p/IFoo.bidl", "package p; interface IFoo { Data get(); }"),
            ("p/Data.bidl", "package p; parcelable Data;"),
        ]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        let ty = typenames.get("p.IFoo").map(|t| &t.kind);
        let Some(DefinedTypeKind::Interface(iface)) = ty else {
            panic!("expected an interface");
        };
        assert_eq!(iface.methods[0].ret.name(), "p.Data");
    }

    #[test]
    fn duplicate_definitions_are_reported() {
        let (_, diagnostics) = compile(&[
            ("a/Data.bidl", "package p; parcelable Data;"),
            ("b/Data.bidl", "package p; parcelable Data;"),
        ]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E2018));
    }

    #[test]
    fn transaction_ids_are_assigned_sequentially() {
        let (typenames, diagnostics) = compile(&[(
            "p/IFoo.bidl",
            "package p; interface IFoo { void a(); void b(); }",
        )]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        let Some(DefinedTypeKind::Interface(iface)) = typenames.get("p.IFoo").map(|t| &t.kind)
        else {
            panic!("expected an interface");
        };
        let ids: Vec<i32> = iface
            .methods
            .iter()
            .filter_map(|m| m.id().map(|id| id.value))
            .collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(iface.methods.iter().all(|m| !m.has_explicit_id()));
    }

    #[test]
    fn enum_values_autofill_from_the_previous_enumerator() {
        let (typenames, diagnostics) = compile(&[(
            "p/E.bidl",
            "package p; enum E { A, B = 5, C }",
        )]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        let Some(DefinedTypeKind::Enum(decl)) = typenames.get("p.E").map(|t| &t.kind) else {
            panic!("expected an enum");
        };
        assert_eq!(decl.backing, ValueType::Int32);
        let mut evaluator = bidl_eval::Evaluator::new(&typenames.arena);
        let mut sink = Diagnostics::new();
        let values: Vec<i64> = decl
            .enumerators
            .iter()
            .map(|e| {
                let id = e.value.unwrap_or_else(|| panic!("value not filled"));
                match evaluator
                    .evaluate(id, &mut sink)
                    .map(|v| v.value)
                {
                    Some(bidl_eval::ConstValue::Int(v)) => v,
                    other => panic!("unexpected value {other:?}"),
                }
            })
            .collect();
        assert_eq!(values, vec![0, 5, 6]);
    }

    #[test]
    fn backing_annotation_sets_the_enum_type() {
        let (typenames, diagnostics) = compile(&[(
            "p/E.bidl",
            "package p; @Backing(type = \"byte\") enum E { A }",
        )]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        let Some(DefinedTypeKind::Enum(decl)) = typenames.get("p.E").map(|t| &t.kind) else {
            panic!("expected an enum");
        };
        assert_eq!(decl.backing, ValueType::Int8);
    }

    #[test]
    fn invalid_backing_type_is_rejected() {
        let (_, diagnostics) = compile(&[(
            "p/E.bidl",
            "package p; @Backing(type = \"float\") enum E { A }",
        )]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E2019));
    }
}
