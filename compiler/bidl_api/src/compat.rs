//! API compatibility checking.
//!
//! Compares two checked registries, old and new, and reports every backward
//! incompatibility: removed or reshaped types, removed or changed methods,
//! changed constant and enumerator values, and structured parcelable field
//! changes (fields are positional wire state, so they may only be appended).
//!
//! Matching is by canonical text: method signatures, canonical type strings,
//! and rendered constant values. Additions never fail the check.

use crate::dump::{typed_value_text, value_text};
use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_eval::Evaluator;
use bidl_ir::{
    sorted_kinds, AnnotationKind, DefinedType, DefinedTypeKind, EnumDecl, Interface, Location,
    StructuredParcelable, Typenames,
};

/// Check that `new` is backward compatible with `old`.
///
/// Returns true when no incompatibility was reported.
pub fn check_api(old: &Typenames, new: &Typenames, diagnostics: &mut Diagnostics) -> bool {
    let before = diagnostics.error_count();
    let mut cx = Compare {
        old_eval: Evaluator::new(&old.arena),
        new_eval: Evaluator::new(&new.arena),
        old,
        new,
        diagnostics,
    };

    let mut old_types: Vec<&DefinedType> = old.iter_types().collect();
    old_types.sort_by_key(|t| t.canonical_name());
    for old_ty in old_types {
        cx.compare_type(old_ty);
    }

    let ok = before == diagnostics.error_count();
    tracing::debug!(compatible = ok, "api compatibility check finished");
    ok
}

struct Compare<'a> {
    old: &'a Typenames,
    new: &'a Typenames,
    old_eval: Evaluator<'a>,
    new_eval: Evaluator<'a>,
    diagnostics: &'a mut Diagnostics,
}

impl Compare<'_> {
    fn error(&mut self, code: ErrorCode, location: &Location, message: String) {
        self.diagnostics
            .report(Diagnostic::error(code, location.clone()).with_message(message));
    }

    fn compare_type(&mut self, old_ty: &DefinedType) {
        let canonical = old_ty.canonical_name();
        let Some(new_ty) = self.new.get(&canonical) else {
            self.error(
                ErrorCode::E7001,
                &old_ty.location,
                format!("type `{canonical}` was removed"),
            );
            return;
        };

        if !old_ty.kind.same_kind(&new_ty.kind) {
            self.error(
                ErrorCode::E7002,
                &new_ty.location,
                format!("`{canonical}` is no longer the same kind of declaration"),
            );
            return;
        }

        // Annotations are compared as name sets; `@nullable` is excluded
        // from the comparison.
        let relevant = |kinds: &[bidl_ir::Annotation]| -> Vec<AnnotationKind> {
            sorted_kinds(kinds)
                .into_iter()
                .filter(|k| *k != AnnotationKind::Nullable)
                .collect()
        };
        if relevant(&old_ty.annotations) != relevant(&new_ty.annotations) {
            self.error(
                ErrorCode::E7007,
                &new_ty.location,
                format!("annotations of `{canonical}` changed"),
            );
        }

        match (&old_ty.kind, &new_ty.kind) {
            (DefinedTypeKind::Interface(old_iface), DefinedTypeKind::Interface(new_iface)) => {
                self.compare_interfaces(&canonical, old_iface, new_iface, new_ty);
            }
            (
                DefinedTypeKind::StructuredParcelable(old_p),
                DefinedTypeKind::StructuredParcelable(new_p),
            ) => {
                self.compare_fields(&canonical, old_p, new_p, new_ty);
            }
            (DefinedTypeKind::Enum(old_decl), DefinedTypeKind::Enum(new_decl)) => {
                self.compare_enums(&canonical, old_decl, new_decl, new_ty);
            }
            // Unstructured parcelables have no checkable surface beyond
            // their kind and annotations.
            _ => {}
        }
    }

    fn compare_interfaces(
        &mut self,
        canonical: &str,
        old_iface: &Interface,
        new_iface: &Interface,
        new_ty: &DefinedType,
    ) {
        for old_method in &old_iface.methods {
            let signature = old_method.signature();
            let Some(new_method) = new_iface
                .methods
                .iter()
                .find(|m| m.signature() == signature)
            else {
                self.error(
                    ErrorCode::E7003,
                    &new_ty.location,
                    format!("method `{canonical}.{signature}` was removed or changed"),
                );
                continue;
            };

            if new_method.oneway != old_method.oneway {
                self.error(
                    ErrorCode::E7003,
                    &new_method.location,
                    format!("`{canonical}.{signature}` changed its oneway-ness"),
                );
            }
            if new_method.ret.canonical_string() != old_method.ret.canonical_string() {
                self.error(
                    ErrorCode::E7003,
                    &new_method.location,
                    format!(
                        "return type of `{canonical}.{signature}` changed from `{}` to `{}`",
                        old_method.ret.canonical_string(),
                        new_method.ret.canonical_string()
                    ),
                );
            }
            let old_id = old_method.id().map(|id| id.value);
            let new_id = new_method.id().map(|id| id.value);
            if old_id != new_id {
                self.error(
                    ErrorCode::E7003,
                    &new_method.location,
                    format!("transaction id of `{canonical}.{signature}` changed"),
                );
            }
            for (old_arg, new_arg) in old_method.args().iter().zip(new_method.args()) {
                if old_arg.canonical_string() != new_arg.canonical_string() {
                    self.error(
                        ErrorCode::E7003,
                        &new_arg.location,
                        format!(
                            "argument `{}` of `{canonical}.{signature}` changed from `{}` to `{}`",
                            old_arg.name,
                            old_arg.canonical_string(),
                            new_arg.canonical_string()
                        ),
                    );
                }
            }
        }

        for old_constant in &old_iface.constants {
            let Some(new_constant) = new_iface
                .constants
                .iter()
                .find(|c| c.name == old_constant.name)
            else {
                self.error(
                    ErrorCode::E7004,
                    &new_ty.location,
                    format!("constant `{canonical}.{}` was removed", old_constant.name),
                );
                continue;
            };

            if new_constant.ty.canonical_string() != old_constant.ty.canonical_string() {
                self.error(
                    ErrorCode::E7004,
                    &new_constant.location,
                    format!("type of constant `{canonical}.{}` changed", old_constant.name),
                );
                continue;
            }
            let old_value = value_text(
                &mut self.old_eval,
                &self.old.arena,
                old_constant.value,
                old_constant.ty.name(),
                old_constant.ty.is_array,
                self.diagnostics,
            );
            let new_value = value_text(
                &mut self.new_eval,
                &self.new.arena,
                new_constant.value,
                new_constant.ty.name(),
                new_constant.ty.is_array,
                self.diagnostics,
            );
            if old_value != new_value {
                self.error(
                    ErrorCode::E7004,
                    &new_constant.location,
                    format!(
                        "value of constant `{canonical}.{}` changed from {old_value} to {new_value}",
                        old_constant.name
                    ),
                );
            }
        }
    }

    /// Field order is wire layout: names, types, and defaults must match
    /// positionally, and fields may only be appended.
    fn compare_fields(
        &mut self,
        canonical: &str,
        old_p: &StructuredParcelable,
        new_p: &StructuredParcelable,
        new_ty: &DefinedType,
    ) {
        if new_p.fields.len() < old_p.fields.len() {
            self.error(
                ErrorCode::E7005,
                &new_ty.location,
                format!(
                    "`{canonical}` dropped fields ({} -> {})",
                    old_p.fields.len(),
                    new_p.fields.len()
                ),
            );
        }

        for (position, (old_field, new_field)) in
            old_p.fields.iter().zip(&new_p.fields).enumerate()
        {
            if old_field.name != new_field.name {
                self.error(
                    ErrorCode::E7005,
                    &new_field.location,
                    format!(
                        "field {position} of `{canonical}` renamed from `{}` to `{}`",
                        old_field.name, new_field.name
                    ),
                );
                continue;
            }
            if old_field.ty.canonical_string() != new_field.ty.canonical_string() {
                self.error(
                    ErrorCode::E7005,
                    &new_field.location,
                    format!(
                        "type of field `{canonical}.{}` changed from `{}` to `{}`",
                        old_field.name,
                        old_field.ty.canonical_string(),
                        new_field.ty.canonical_string()
                    ),
                );
            }
            let old_default = old_field.default.map(|id| {
                value_text(
                    &mut self.old_eval,
                    &self.old.arena,
                    id,
                    old_field.ty.name(),
                    old_field.ty.is_array,
                    self.diagnostics,
                )
            });
            let new_default = new_field.default.map(|id| {
                value_text(
                    &mut self.new_eval,
                    &self.new.arena,
                    id,
                    new_field.ty.name(),
                    new_field.ty.is_array,
                    self.diagnostics,
                )
            });
            if old_default != new_default {
                self.error(
                    ErrorCode::E7005,
                    &new_field.location,
                    format!("default of field `{canonical}.{}` changed", old_field.name),
                );
            }
        }
    }

    fn compare_enums(
        &mut self,
        canonical: &str,
        old_decl: &EnumDecl,
        new_decl: &EnumDecl,
        new_ty: &DefinedType,
    ) {
        if old_decl.backing != new_decl.backing {
            self.error(
                ErrorCode::E7008,
                &new_ty.location,
                format!(
                    "backing type of `{canonical}` changed from `{}` to `{}`",
                    old_decl.backing, new_decl.backing
                ),
            );
        }

        for old_enumerator in &old_decl.enumerators {
            let Some(new_enumerator) = new_decl
                .enumerators
                .iter()
                .find(|e| e.name == old_enumerator.name)
            else {
                self.error(
                    ErrorCode::E7006,
                    &new_ty.location,
                    format!(
                        "enumerator `{canonical}.{}` was removed",
                        old_enumerator.name
                    ),
                );
                continue;
            };

            let old_value = old_enumerator.value.map(|id| {
                typed_value_text(
                    &mut self.old_eval,
                    &self.old.arena,
                    id,
                    old_decl.backing,
                    false,
                    self.diagnostics,
                )
            });
            let new_value = new_enumerator.value.map(|id| {
                typed_value_text(
                    &mut self.new_eval,
                    &self.new.arena,
                    id,
                    new_decl.backing,
                    false,
                    self.diagnostics,
                )
            });
            if old_value != new_value {
                self.error(
                    ErrorCode::E7006,
                    &new_enumerator.location,
                    format!(
                        "value of enumerator `{canonical}.{}` changed",
                        old_enumerator.name
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidl_check::CompileOptions;
    use std::sync::Arc;

    fn unit(sources: &[(&str, &str)]) -> Typenames {
        let mut typenames = Typenames::new();
        let mut diagnostics = Diagnostics::new();
        for (path, text) in sources {
            let file: Arc<str> = Arc::from(*path);
            bidl_check::load_source(text, &file, &mut typenames, &mut diagnostics);
        }
        bidl_check::check_documents(
            &mut typenames,
            &CompileOptions::default(),
            &mut diagnostics,
        );
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        typenames
    }

    fn compare(old: &[(&str, &str)], new: &[(&str, &str)]) -> (bool, Diagnostics) {
        let old = unit(old);
        let new = unit(new);
        let mut diagnostics = Diagnostics::new();
        let ok = check_api(&old, &new, &mut diagnostics);
        (ok, diagnostics)
    }

    fn codes(diagnostics: &Diagnostics) -> Vec<ErrorCode> {
        diagnostics.errors().map(|d| d.code).collect()
    }

    #[test]
    fn identical_units_are_compatible() {
        let sources = [
            (
                "p/IFoo.bidl",
                "package p; interface IFoo { const int K = 3; Data get(in int id); }",
            ),
            ("p/Data.bidl", "package p; parcelable Data { int count; }"),
        ];
        let (ok, diagnostics) = compare(&sources, &sources);
        assert!(ok, "{}", diagnostics.render());
    }

    #[test]
    fn additions_are_compatible() {
        let (ok, diagnostics) = compare(
            &[
                ("p/I.bidl", "package p; interface I { void a(); }"),
                ("p/D.bidl", "package p; parcelable D { int x; }"),
            ],
            &[
                ("p/I.bidl", "package p; interface I { void a(); void b(); const int K = 1; }"),
                ("p/D.bidl", "package p; parcelable D { int x; long added; }"),
                ("p/E.bidl", "package p; enum E { A }"),
            ],
        );
        assert!(ok, "{}", diagnostics.render());
    }

    #[test]
    fn removed_type_is_incompatible() {
        let (ok, diagnostics) = compare(
            &[
                ("p/I.bidl", "package p; interface I { void a(); }"),
                ("p/D.bidl", "package p; parcelable D { int x; }"),
            ],
            &[("p/I.bidl", "package p; interface I { void a(); }")],
        );
        assert!(!ok);
        assert_eq!(codes(&diagnostics), vec![ErrorCode::E7001]);
    }

    #[test]
    fn kind_change_is_incompatible() {
        let (ok, diagnostics) = compare(
            &[("p/D.bidl", "package p; parcelable D { int x; }")],
            &[("p/D.bidl", "package p; parcelable D;")],
        );
        assert!(!ok);
        assert_eq!(codes(&diagnostics), vec![ErrorCode::E7002]);
    }

    #[test]
    fn method_changes_are_incompatible() {
        // `a` changed its signature (counts as a removal), `b` changed its
        // return type; `d` is a compatible addition.
        let (ok, diagnostics) = compare(
            &[(
                "p/I.bidl",
                "package p; interface I { void a(in int x); int b(); void c(); }",
            )],
            &[(
                "p/I.bidl",
                "package p; interface I { void a(in long x); long b(); void c(); void d(); }",
            )],
        );
        assert!(!ok);
        let reported = codes(&diagnostics);
        assert_eq!(
            reported.iter().filter(|c| **c == ErrorCode::E7003).count(),
            2
        );
    }

    #[test]
    fn implicit_id_shifts_are_caught() {
        // Inserting a method before `b` renumbers it.
        let (ok, diagnostics) = compare(
            &[("p/I.bidl", "package p; interface I { void a(); void b(); }")],
            &[("p/I.bidl", "package p; interface I { void a(); void inserted(); void b(); }")],
        );
        assert!(!ok);
        assert!(codes(&diagnostics).contains(&ErrorCode::E7003));

        // An explicit renumbering is just as incompatible.
        let (ok, diagnostics) = compare(
            &[("p/I.bidl", "package p; interface I { void a() = 10; }")],
            &[("p/I.bidl", "package p; interface I { void a() = 11; }")],
        );
        assert!(!ok);
        assert!(codes(&diagnostics).contains(&ErrorCode::E7003));
    }

    #[test]
    fn constant_value_changes_are_caught() {
        let (ok, diagnostics) = compare(
            &[("p/I.bidl", "package p; interface I { const int K = 1 << 4; }")],
            &[("p/I.bidl", "package p; interface I { const int K = 17; }")],
        );
        assert!(!ok);
        assert!(codes(&diagnostics).contains(&ErrorCode::E7004));

        // Same value through a different expression is fine.
        let (ok, diagnostics) = compare(
            &[("p/I.bidl", "package p; interface I { const int K = 1 << 4; }")],
            &[("p/I.bidl", "package p; interface I { const int K = 16; }")],
        );
        assert!(ok, "{}", diagnostics.render());
    }

    #[test]
    fn field_changes_are_positional() {
        let (ok, diagnostics) = compare(
            &[("p/D.bidl", "package p; parcelable D { int x; long y; byte z = 1; }")],
            &[("p/D.bidl", "package p; parcelable D { int x; long renamed; byte z = 2; }")],
        );
        assert!(!ok);
        assert_eq!(
            codes(&diagnostics)
                .iter()
                .filter(|c| **c == ErrorCode::E7005)
                .count(),
            2
        );

        let (ok, diagnostics) = compare(
            &[("p/D.bidl", "package p; parcelable D { int x; long y; }")],
            &[("p/D.bidl", "package p; parcelable D { int x; }")],
        );
        assert!(!ok);
        assert!(codes(&diagnostics).contains(&ErrorCode::E7005));
    }

    #[test]
    fn enum_changes_are_caught() {
        let (ok, diagnostics) = compare(
            &[("p/E.bidl", "package p; enum E { A, B, C }")],
            &[(
                "p/E.bidl",
                "package p; @Backing(type = \"long\") enum E { A, C }",
            )],
        );
        assert!(!ok);
        let reported = codes(&diagnostics);
        // Backing change, annotation change, removed B, and C shifting
        // from 2 to 1.
        assert!(reported.contains(&ErrorCode::E7008));
        assert!(reported.contains(&ErrorCode::E7007));
        assert_eq!(
            reported.iter().filter(|c| **c == ErrorCode::E7006).count(),
            2
        );
    }

    #[test]
    fn reordered_enumerators_with_stable_values_are_compatible() {
        let (ok, diagnostics) = compare(
            &[("p/E.bidl", "package p; enum E { FOO = 1, BAR = 2 }")],
            &[("p/E.bidl", "package p; enum E { BAR = 2, FOO = 1 }")],
        );
        assert!(ok, "{}", diagnostics.render());
    }

    #[test]
    fn argument_direction_changes_are_incompatible() {
        let (ok, diagnostics) = compare(
            &[("p/I.bidl", "package p; interface I { void f(in String[] s); }")],
            &[("p/I.bidl", "package p; interface I { void f(out String[] s); }")],
        );
        assert!(!ok);
        assert!(codes(&diagnostics).contains(&ErrorCode::E7003));
    }

    #[test]
    fn annotation_order_does_not_matter() {
        let (ok, diagnostics) = compare(
            &[(
                "p/D.bidl",
                "package p; @JavaOnlyStableParcelable @VintfStability parcelable D;",
            )],
            &[(
                "p/D.bidl",
                "package p; @VintfStability @JavaOnlyStableParcelable parcelable D;",
            )],
        );
        assert!(ok, "{}", diagnostics.render());
    }

    #[test]
    fn nullable_is_ignored_on_type_annotations_but_not_on_arguments() {
        let (ok, diagnostics) = compare(
            &[("p/I.bidl", "package p; interface I { void f(in String s); }")],
            &[("p/I.bidl", "package p; @VintfStability interface I { void f(in @nullable String s); }")],
        );
        assert!(!ok);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E7007));
        assert!(reported.contains(&ErrorCode::E7003));
    }
}
