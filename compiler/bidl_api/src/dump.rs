//! Canonical API dumps.
//!
//! Each defined type is rendered to its own file at
//! `<package path>/<Name>.bidl`, in a normalized form: sorted annotations,
//! fully evaluated constant values, and explicit enumerator values. A dump
//! is valid source, so it can be reloaded and compared; dumping a reloaded
//! dump reproduces it byte for byte.

use bidl_diagnostic::Diagnostics;
use bidl_eval::Evaluator;
use bidl_ir::{
    sorted_kinds, Annotation, ConstArena, DefinedType, DefinedTypeKind, ParamType, Typenames,
    ValueType,
};
use std::path::PathBuf;

/// One rendered dump file, relative to the dump root.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Render every directly parsed type, sorted by canonical name.
///
/// Evaluation problems in constant values are reported to `diagnostics`; the
/// offending value falls back to its source expression text so the dump is
/// still complete.
pub fn dump_api(typenames: &Typenames, diagnostics: &mut Diagnostics) -> Vec<ApiFile> {
    let mut evaluator = Evaluator::new(&typenames.arena);
    let mut types: Vec<&DefinedType> = typenames
        .iter_types()
        .filter(|t| !t.from_preprocessed)
        .collect();
    types.sort_by_key(|t| t.canonical_name());

    let mut files = Vec::with_capacity(types.len());
    for ty in types {
        let contents = render_type(ty, &typenames.arena, &mut evaluator, diagnostics);
        let mut path: PathBuf = ty.package.iter().collect();
        path.push(format!("{}.bidl", ty.name));
        files.push(ApiFile { path, contents });
    }
    tracing::debug!(files = files.len(), "dumped api");
    files
}

const BANNER_TEXT: &str = "THIS FILE IS IMMUTABLE. DO NOT EDIT IN ANY CASE.";

fn render_type(
    ty: &DefinedType,
    arena: &ConstArena,
    evaluator: &mut Evaluator<'_>,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut out = String::new();
    let rule = "/".repeat(79);
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("// {BANNER_TEXT:<74}//\n"));
    out.push_str(&rule);
    out.push('\n');

    if !ty.package.is_empty() {
        out.push_str(&format!("package {};\n", ty.package_string()));
    }
    if ty.is_hidden() {
        out.push_str("/* @hide */\n");
    }
    for line in annotation_lines(&ty.annotations, evaluator, diagnostics) {
        out.push_str(&line);
        out.push('\n');
    }

    match &ty.kind {
        DefinedTypeKind::Interface(iface) => {
            out.push_str(&format!("interface {} {{\n", ty.name));
            for constant in &iface.constants {
                if bidl_ir::comment_has_hide(constant.comment.as_deref()) {
                    out.push_str("  /* @hide */\n");
                }
                let value = value_text(
                    evaluator,
                    arena,
                    constant.value,
                    constant.ty.name(),
                    constant.ty.is_array,
                    diagnostics,
                );
                out.push_str(&format!(
                    "  const {} {} = {};\n",
                    constant.ty.canonical_string(),
                    constant.name,
                    value
                ));
            }
            for method in &iface.methods {
                if bidl_ir::comment_has_hide(method.comment.as_deref()) {
                    out.push_str("  /* @hide */\n");
                }
                let args: Vec<String> =
                    method.args().iter().map(|a| a.canonical_string()).collect();
                let oneway = if method.oneway { "oneway " } else { "" };
                let id = match method.id() {
                    Some(id) if id.explicit => format!(" = {}", id.value),
                    _ => String::new(),
                };
                out.push_str(&format!(
                    "  {oneway}{} {}({}){id};\n",
                    method.ret.canonical_string(),
                    method.name,
                    args.join(", ")
                ));
            }
            out.push_str("}\n");
        }
        DefinedTypeKind::Parcelable(parcelable) => {
            out.push_str(&format!("parcelable {}", ty.name));
            if let Some(params) = &parcelable.type_params {
                out.push_str(&format!("<{}>", params.join(", ")));
            }
            if let Some(header) = &parcelable.cpp_header {
                out.push_str(&format!(" cpp_header \"{header}\""));
            }
            out.push_str(";\n");
        }
        DefinedTypeKind::StructuredParcelable(parcelable) => {
            out.push_str(&format!("parcelable {} {{\n", ty.name));
            for field in &parcelable.fields {
                if bidl_ir::comment_has_hide(field.comment.as_deref()) {
                    out.push_str("  /* @hide */\n");
                }
                match field.default {
                    Some(default) => {
                        let value = value_text(
                            evaluator,
                            arena,
                            default,
                            field.ty.name(),
                            field.ty.is_array,
                            diagnostics,
                        );
                        out.push_str(&format!(
                            "  {} {} = {};\n",
                            field.ty.canonical_string(),
                            field.name,
                            value
                        ));
                    }
                    None => {
                        out.push_str(&format!(
                            "  {} {};\n",
                            field.ty.canonical_string(),
                            field.name
                        ));
                    }
                }
            }
            out.push_str("}\n");
        }
        DefinedTypeKind::Enum(decl) => {
            out.push_str(&format!("enum {} {{\n", ty.name));
            for enumerator in &decl.enumerators {
                if bidl_ir::comment_has_hide(enumerator.comment.as_deref()) {
                    out.push_str("  /* @hide */\n");
                }
                // Auto-fill guarantees a value on checked input.
                match enumerator.value {
                    Some(value) => {
                        let text =
                            typed_value_text(evaluator, arena, value, decl.backing, false, diagnostics);
                        out.push_str(&format!("  {} = {text},\n", enumerator.name));
                    }
                    None => out.push_str(&format!("  {},\n", enumerator.name)),
                }
            }
            out.push_str("}\n");
        }
    }
    out
}

/// Render the annotation block in sorted-by-name order, parameters sorted
/// too, so textual comparison of dumps is order-insensitive.
fn annotation_lines(
    annotations: &[Annotation],
    evaluator: &mut Evaluator<'_>,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let mut lines = Vec::new();
    for kind in sorted_kinds(annotations) {
        let Some(annotation) = annotations.iter().find(|a| a.kind == kind) else {
            continue;
        };
        let mut text = format!("@{kind}");
        if !annotation.params.is_empty() {
            let mut params: Vec<_> = annotation.params.iter().collect();
            params.sort_by(|a, b| a.name.cmp(&b.name));
            let mut rendered = Vec::new();
            for param in params {
                let Some((_, expected)) = annotation
                    .kind
                    .schema()
                    .iter()
                    .find(|(name, _)| *name == param.name)
                else {
                    continue;
                };
                let target = match expected {
                    ParamType::Str => ValueType::Str,
                    ParamType::Int => ValueType::Int32,
                    ParamType::Long => ValueType::Int64,
                };
                if let Some(value) = evaluator.render_as(param.value, target, false, diagnostics)
                {
                    rendered.push(format!("{}={}", param.name, value));
                }
            }
            text.push('(');
            text.push_str(&rendered.join(", "));
            text.push(')');
        }
        lines.push(text);
    }
    lines
}

/// Canonical text of a constant value against a declared type name.
///
/// Falls back to the source expression when the declared type is not a
/// literal type or the value does not evaluate; in both cases validation has
/// already reported the real problem.
pub(crate) fn value_text(
    evaluator: &mut Evaluator<'_>,
    arena: &ConstArena,
    value: bidl_ir::ConstExprId,
    type_name: &str,
    is_array: bool,
    diagnostics: &mut Diagnostics,
) -> String {
    match bidl_eval::literal_value_type(type_name) {
        Some(target) => typed_value_text(evaluator, arena, value, target, is_array, diagnostics),
        None => arena.display(value),
    }
}

pub(crate) fn typed_value_text(
    evaluator: &mut Evaluator<'_>,
    arena: &ConstArena,
    value: bidl_ir::ConstExprId,
    target: ValueType,
    target_is_array: bool,
    diagnostics: &mut Diagnostics,
) -> String {
    evaluator
        .render_as(value, target, target_is_array, diagnostics)
        .unwrap_or_else(|| arena.display(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidl_check::CompileOptions;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn checked_unit(sources: &[(&str, &str)]) -> Typenames {
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

    fn dump(sources: &[(&str, &str)]) -> Vec<ApiFile> {
        let typenames = checked_unit(sources);
        let mut diagnostics = Diagnostics::new();
        let files = dump_api(&typenames, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        files
    }

    #[test]
    fn interface_dump_is_normalized() {
        let files = dump(&[(
            "p/IFoo.bidl",
            "package p; interface IFoo { \
               const int FLAGS = 1 << 4; \
               oneway void drop(in int token); \
               String name(in @utf8InCpp @nullable String hint, out byte[] raw); \
             }",
        )]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, PathBuf::from("p/IFoo.bidl"));

        let rule = "/".repeat(79);
        let banner = format!("// {BANNER_TEXT}{}//", " ".repeat(74 - BANNER_TEXT.len()));
        assert_eq!(banner.len(), 79);
        let expected = format!(
            "{rule}\n\
             {banner}\n\
             {rule}\n\
             package p;\n\
             interface IFoo {{\n\
             \x20 const int FLAGS = 16;\n\
             \x20 oneway void drop(in int token);\n\
             \x20 String name(in @nullable @utf8InCpp String hint, out byte[] raw);\n\
             }}\n"
        );
        assert_eq!(files[0].contents, expected);
    }

    #[test]
    fn enum_values_are_made_explicit() {
        let files = dump(&[(
            "p/Mode.bidl",
            "package p; @Backing(type = \"byte\") enum Mode { OFF, ON, AUTO = 10, TURBO }",
        )]);
        let contents = &files[0].contents;
        assert!(contents.contains("@Backing(type=\"byte\")"));
        assert!(contents.contains("  OFF = 0,\n  ON = 1,\n  AUTO = 10,\n  TURBO = 11,\n"));
    }

    #[test]
    fn hidden_types_and_members_keep_their_marker() {
        let files = dump(&[(
            "p/Data.bidl",
            "package p; /** @hide */ parcelable Data { int count; /** @hide */ long stamp = 1000 * 1000; }",
        )]);
        let contents = &files[0].contents;
        assert!(contents.contains("/* @hide */\nparcelable Data {"));
        assert!(contents.contains("  /* @hide */\n  long stamp = 1000000;\n"));
    }

    #[test]
    fn explicit_transaction_ids_survive_while_implicit_ones_stay_implicit() {
        let files = dump(&[(
            "p/I.bidl",
            "package p; interface I { void a() = 2; void b() = 7; }",
        )]);
        assert!(files[0].contents.contains("  void a() = 2;\n  void b() = 7;\n"));

        let files = dump(&[("p/I.bidl", "package p; interface I { void a(); void b(); }")]);
        assert!(files[0].contents.contains("  void a();\n  void b();\n"));
    }

    #[test]
    fn unstructured_forms_round_trip() {
        let files = dump(&[
            ("p/Plain.bidl", "package p; parcelable Plain;"),
            ("p/Pair.bidl", "package p; parcelable Pair<A, B>;"),
            (
                "p/Native.bidl",
                "package p; parcelable Native cpp_header \"native.h\";",
            ),
        ]);
        let by_name: Vec<&str> = files
            .iter()
            .filter_map(|f| f.contents.lines().last())
            .collect();
        assert_eq!(
            by_name,
            vec![
                "parcelable Native cpp_header \"native.h\";",
                "parcelable Pair<A, B>;",
                "parcelable Plain;",
            ]
        );
    }

    #[test]
    fn dumping_a_reloaded_dump_is_identity() {
        let first = dump(&[
            (
                "p/IFoo.bidl",
                "package p; import p.Mode; /** @hide */ interface IFoo { \
                   const String GREETING = \"hi\" + \" there\"; \
                   Mode next(in Mode current, in List<String> tags); \
                 }",
            ),
            ("p/Mode.bidl", "package p; enum Mode { A, B = 4, C }"),
        ]);

        let reloaded: Vec<(String, String)> = first
            .iter()
            .map(|f| (f.path.to_string_lossy().into_owned(), f.contents.clone()))
            .collect();
        let sources: Vec<(&str, &str)> = reloaded
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_str()))
            .collect();
        let second = dump(&sources);
        assert_eq!(first, second);
    }
}
