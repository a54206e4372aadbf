//! Type-reference resolution.
//!
//! Every `TypeSpecifier` in every directly parsed document is resolved to a
//! fully-qualified name exactly once. Resolution outcomes are computed
//! against the immutable registry first and applied in a second pass, in the
//! same deterministic visit order.

use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_ir::{DefinedType, DefinedTypeKind, Resolution, TypeSpecifier, Typenames};
use rustc_hash::FxHashMap;

/// Visit every type specifier of a defined type, generic arguments included,
/// in declaration order.
pub(crate) fn for_each_spec<'a>(ty: &'a DefinedType, f: &mut impl FnMut(&'a TypeSpecifier)) {
    fn walk<'a>(spec: &'a TypeSpecifier, f: &mut impl FnMut(&'a TypeSpecifier)) {
        f(spec);
        for arg in &spec.type_args {
            walk(arg, f);
        }
    }
    match &ty.kind {
        DefinedTypeKind::Interface(iface) => {
            for method in &iface.methods {
                walk(&method.ret, f);
                for arg in method.args() {
                    walk(&arg.ty, f);
                }
            }
            for constant in &iface.constants {
                walk(&constant.ty, f);
            }
        }
        DefinedTypeKind::StructuredParcelable(parcelable) => {
            for field in &parcelable.fields {
                walk(&field.ty, f);
            }
        }
        DefinedTypeKind::Parcelable(_) | DefinedTypeKind::Enum(_) => {}
    }
}

/// Mutable counterpart of [`for_each_spec`]; must visit in the same order.
fn for_each_spec_mut(ty: &mut DefinedType, f: &mut impl FnMut(&mut TypeSpecifier)) {
    fn walk(spec: &mut TypeSpecifier, f: &mut impl FnMut(&mut TypeSpecifier)) {
        f(spec);
        for arg in &mut spec.type_args {
            walk(arg, f);
        }
    }
    match &mut ty.kind {
        DefinedTypeKind::Interface(iface) => {
            for method in &mut iface.methods {
                walk(&mut method.ret, f);
                for arg in method.args_mut() {
                    walk(&mut arg.ty, f);
                }
            }
            for constant in &mut iface.constants {
                walk(&mut constant.ty, f);
            }
        }
        DefinedTypeKind::StructuredParcelable(parcelable) => {
            for field in &mut parcelable.fields {
                walk(&mut field.ty, f);
            }
        }
        DefinedTypeKind::Parcelable(_) | DefinedTypeKind::Enum(_) => {}
    }
}

/// Resolve every specifier in every document.
pub(crate) fn resolve_all(typenames: &mut Typenames, diagnostics: &mut Diagnostics) {
    for doc_idx in 0..typenames.documents().len() {
        report_import_conflicts(typenames, doc_idx, diagnostics);

        let document = &typenames.documents()[doc_idx];
        let package = document.package.clone();
        let imports = document.imports.clone();

        // Phase 1: compute outcomes against the immutable registry.
        let mut outcomes: Vec<Option<String>> = Vec::new();
        for ty in &typenames.documents()[doc_idx].defined_types {
            if ty.from_preprocessed {
                continue;
            }
            for_each_spec(ty, &mut |spec| {
                let outcome = match typenames.resolve_name(
                    &package,
                    &imports,
                    spec.unresolved_name(),
                ) {
                    Resolution::Resolved(canonical) => Some(canonical),
                    Resolution::Ambiguous(candidates) => {
                        diagnostics.report(
                            Diagnostic::error(ErrorCode::E2002, spec.location.clone())
                                .with_message(format!(
                                    "ambiguous type `{}`",
                                    spec.unresolved_name()
                                ))
                                .with_note(format!("candidates: {}", candidates.join(", "))),
                        );
                        None
                    }
                    Resolution::Unresolved => {
                        diagnostics.report(
                            Diagnostic::error(ErrorCode::E2001, spec.location.clone())
                                .with_message(format!(
                                    "unknown type `{}`",
                                    spec.unresolved_name()
                                ))
                                .with_note("did you forget an import?"),
                        );
                        None
                    }
                };
                outcomes.push(outcome);
            });
        }

        // Phase 2: apply, zipping the identical visit order.
        let mut outcomes = outcomes.into_iter();
        for ty in &mut typenames.documents_mut()[doc_idx].defined_types {
            if ty.from_preprocessed {
                continue;
            }
            for_each_spec_mut(ty, &mut |spec| {
                if let Some(Some(canonical)) = outcomes.next() {
                    spec.resolve(canonical);
                }
            });
        }
    }
}

/// Two imports bringing the same simple name from different paths make every
/// use of that name ambiguous.
fn report_import_conflicts(
    typenames: &Typenames,
    doc_idx: usize,
    diagnostics: &mut Diagnostics,
) {
    let imports = &typenames.documents()[doc_idx].imports;
    let mut seen: FxHashMap<String, String> = FxHashMap::default();
    for import in imports {
        if let Some(existing) = seen.get(import.simple_name()) {
            if *existing != import.path {
                diagnostics.report(
                    Diagnostic::error(ErrorCode::E3001, import.location.clone())
                        .with_message(format!(
                            "import `{}` conflicts with `{existing}`",
                            import.path
                        )),
                );
            }
            continue;
        }
        seen.insert(import.simple_name().to_string(), import.path.clone());
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::{codes, compile};
    use bidl_diagnostic::ErrorCode;

    #[test]
    fn unknown_type_is_reported_at_its_use() {
        let (_, diagnostics) = compile(&[(
            "p/IFoo.bidl",
            "package p; interface IFoo { Missing get(); }",
        )]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E2001));
        assert!(diagnostics.render().contains("unknown type `Missing`"));
    }

    #[test]
    fn conflicting_imports_are_reported() {
        let (_, diagnostics) = compile(&[
            (
                "p/IFoo.bidl",
                "package p; import q.Data; import r.Data; interface IFoo { Data get(); }",
            ),
            ("q/Data.bidl", "package q; parcelable Data;"),
            ("r/Data.bidl", "package r; parcelable Data;"),
        ]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E3001));
        assert!(reported.contains(&ErrorCode::E2002));
    }

    #[test]
    fn unique_global_simple_name_resolves_without_an_import() {
        let (typenames, diagnostics) = compile(&[
            ("p/IFoo.bidl", "package p; interface IFoo { void f(in Data d); }"),
            ("q/Data.bidl", "package q; parcelable Data;"),
        ]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        let ty = typenames.get("p.IFoo");
        assert!(ty.is_some());
    }

    #[test]
    fn generic_arguments_resolve_too() {
        let (_, diagnostics) = compile(&[(
            "p/IFoo.bidl",
            "package p; interface IFoo { void f(in List<Missing> xs); }",
        )]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E2001));
    }
}
