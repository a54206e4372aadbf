//! Structural, constant, and backend validation.
//!
//! Runs after resolution and auto-fill, entirely over immutable documents;
//! constant values flow through the shared evaluator so each expression is
//! computed (and each broken one reported) once.

use crate::resolve::for_each_spec;
use crate::CompileOptions;
use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_eval::{check_assignable, literal_value_type, Evaluator};
use bidl_ir::{
    builtin, AnnotationKind, ConstantDecl, ConstExprId, DefinedType, DefinedTypeKind, EnumDecl,
    Interface, Location, ParamType, StructuredParcelable, TypeSpecifier, Typenames,
    UnstructuredParcelable, ValueType, VariableDecl, MAX_USER_TRANSACTION_ID,
    MIN_USER_TRANSACTION_ID,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Names beginning with this prefix are reserved for generated code.
const RESERVED_PREFIX: &str = "_bidl";

pub(crate) fn validate(
    typenames: &Typenames,
    options: &CompileOptions,
    diagnostics: &mut Diagnostics,
) {
    let mut cx = Context {
        typenames,
        options,
        evaluator: Evaluator::new(&typenames.arena),
        diagnostics,
    };
    for document in typenames.documents() {
        for ty in &document.defined_types {
            if ty.from_preprocessed {
                continue;
            }
            cx.validate_type(ty);
        }
    }
}

struct Context<'a> {
    typenames: &'a Typenames,
    options: &'a CompileOptions,
    evaluator: Evaluator<'a>,
    diagnostics: &'a mut Diagnostics,
}

impl Context<'_> {
    fn error(&mut self, code: ErrorCode, location: &Location, message: String) {
        self.diagnostics
            .report(Diagnostic::error(code, location.clone()).with_message(message));
    }

    fn validate_type(&mut self, ty: &DefinedType) {
        self.check_declared_name(&ty.name, &ty.location);
        self.check_type_annotations(ty);

        match &ty.kind {
            DefinedTypeKind::Interface(iface) => self.validate_interface(ty, iface),
            DefinedTypeKind::Parcelable(parcelable) => {
                self.validate_unstructured(ty, parcelable);
            }
            DefinedTypeKind::StructuredParcelable(parcelable) => {
                self.validate_structured(parcelable);
            }
            DefinedTypeKind::Enum(decl) => self.validate_enum(decl),
        }
    }

    fn check_type_annotations(&mut self, ty: &DefinedType) {
        for annotation in &ty.annotations {
            let legal = match annotation.kind {
                AnnotationKind::VintfStability | AnnotationKind::UnsupportedAppUsage => true,
                AnnotationKind::JavaOnlyStableParcelable => {
                    matches!(ty.kind, DefinedTypeKind::Parcelable(_))
                }
                AnnotationKind::Backing => matches!(ty.kind, DefinedTypeKind::Enum(_)),
                AnnotationKind::Nullable | AnnotationKind::Utf8 | AnnotationKind::Utf8InCpp => {
                    false
                }
            };
            if !legal {
                self.error(
                    ErrorCode::E2022,
                    &annotation.location,
                    format!(
                        "`@{}` cannot be applied to {} `{}`",
                        annotation.kind,
                        ty.kind.keyword(),
                        ty.name
                    ),
                );
            }
        }
        self.check_annotation_params(ty);
    }

    /// Annotation parameter value types, everywhere on the declaration.
    fn check_annotation_params(&mut self, ty: &DefinedType) {
        let mut annotations: Vec<_> = ty.annotations.clone();
        for_each_spec(ty, &mut |spec| annotations.extend(spec.annotations.iter().cloned()));

        for annotation in &annotations {
            for param in &annotation.params {
                let Some((_, expected)) = annotation
                    .kind
                    .schema()
                    .iter()
                    .find(|(name, _)| *name == param.name)
                else {
                    continue;
                };
                let Some(value) = self.evaluator.evaluate(param.value, self.diagnostics) else {
                    continue;
                };
                let ok = match expected {
                    ParamType::Str => value.ty == ValueType::Str,
                    ParamType::Int => check_assignable(&value, ValueType::Int32, false).is_ok(),
                    ParamType::Long => check_assignable(&value, ValueType::Int64, false).is_ok(),
                };
                if !ok {
                    let expected_name = match expected {
                        ParamType::Str => "a string",
                        ParamType::Int => "an int",
                        ParamType::Long => "a long",
                    };
                    self.error(
                        ErrorCode::E1009,
                        &annotation.location,
                        format!(
                            "parameter `{}` of `@{}` expects {expected_name}",
                            param.name, annotation.kind
                        ),
                    );
                }
            }
        }
    }

    fn check_declared_name(&mut self, name: &str, location: &Location) {
        if name.starts_with(RESERVED_PREFIX) {
            self.error(
                ErrorCode::E2017,
                location,
                format!("`{name}` uses the reserved prefix `{RESERVED_PREFIX}`"),
            );
        }
        if self.options.backend.reserved_words().contains(&name) {
            self.error(
                ErrorCode::E5004,
                location,
                format!(
                    "`{name}` is a reserved word in the {} backend",
                    self.options.backend
                ),
            );
        }
    }

    /// Legality of one type use. Recurses into generic arguments.
    fn validate_spec(&mut self, spec: &TypeSpecifier, void_allowed: bool) {
        for annotation in &spec.annotations {
            if !matches!(
                annotation.kind,
                AnnotationKind::Nullable | AnnotationKind::Utf8 | AnnotationKind::Utf8InCpp
            ) {
                self.error(
                    ErrorCode::E2022,
                    &annotation.location,
                    format!("`@{}` cannot be applied to a type use", annotation.kind),
                );
            }
        }

        let name = spec.name();

        if name == "void" && (!void_allowed || spec.is_array || spec.is_generic()) {
            self.error(
                ErrorCode::E2021,
                &spec.location,
                "`void` is only valid as a method return type".to_string(),
            );
        }

        if spec.is_nullable() && !spec.is_array {
            let is_enum = self
                .typenames
                .get(name)
                .is_some_and(|t| matches!(t.kind, DefinedTypeKind::Enum(_)));
            if spec.is_primitive() || is_enum || name == "void" {
                self.error(
                    ErrorCode::E2005,
                    &spec.location,
                    format!("`@nullable` cannot be applied to `{}`", spec.bare_string()),
                );
            }
        }

        if spec.is_utf8() && !spec.is_string() {
            self.error(
                ErrorCode::E2006,
                &spec.location,
                format!(
                    "`@utf8`/`@utf8InCpp` require a String type, not `{}`",
                    spec.bare_string()
                ),
            );
        }

        if spec.is_array {
            let is_interface = self
                .typenames
                .get(name)
                .is_some_and(|t| matches!(t.kind, DefinedTypeKind::Interface(_)));
            if builtin::is_binder(name) || is_interface {
                self.error(
                    ErrorCode::E2008,
                    &spec.location,
                    format!("arrays of binder type `{name}` are not supported"),
                );
            }
            if name == "List" && self.options.backend.rejects_list_array() {
                self.error(
                    ErrorCode::E5002,
                    &spec.location,
                    format!(
                        "`List` cannot be an array element for the {} backend",
                        self.options.backend
                    ),
                );
            }
        }

        if spec.is_generic() {
            if spec.is_resolved() {
                let arity = if builtin::is_builtin(name) {
                    builtin::generic_arity(name)
                } else {
                    self.typenames.get(name).and_then(|t| match &t.kind {
                        DefinedTypeKind::Parcelable(p) => {
                            p.type_params.as_ref().map(Vec::len)
                        }
                        _ => None,
                    })
                };
                match arity {
                    None => self.error(
                        ErrorCode::E2004,
                        &spec.location,
                        format!("`{name}` does not accept generic arguments"),
                    ),
                    Some(expected) if expected != spec.type_args.len() => self.error(
                        ErrorCode::E2003,
                        &spec.location,
                        format!(
                            "`{name}` expects {expected} generic argument(s), got {}",
                            spec.type_args.len()
                        ),
                    ),
                    Some(_) => {}
                }
            }

            if name == "Map" {
                if let Some(key) = spec.type_args.first() {
                    if !key.is_string() || key.is_array {
                        self.error(
                            ErrorCode::E2007,
                            &key.location,
                            format!("Map keys must be String, not `{}`", key.bare_string()),
                        );
                    }
                }
            }

            for arg in &spec.type_args {
                if arg.is_primitive() {
                    self.error(
                        ErrorCode::E5003,
                        &arg.location,
                        format!(
                            "primitive type `{}` cannot be a generic argument",
                            arg.bare_string()
                        ),
                    );
                }
                self.validate_spec(arg, false);
            }
        }
    }

    fn validate_interface(&mut self, ty: &DefinedType, iface: &Interface) {
        let mut method_names = FxHashSet::default();
        for method in &iface.methods {
            if !method_names.insert(method.name.as_str()) {
                self.error(
                    ErrorCode::E2012,
                    &method.location,
                    format!("duplicate method `{}`", method.name),
                );
            }
            self.check_declared_name(&method.name, &method.location);
            self.validate_spec(&method.ret, true);

            if method.oneway && !method.ret.is_void() {
                self.error(
                    ErrorCode::E2009,
                    &method.location,
                    format!("oneway method `{}` must return void", method.name),
                );
            }
            if method.oneway && method.out_args().next().is_some() {
                self.error(
                    ErrorCode::E2010,
                    &method.location,
                    format!("oneway method `{}` cannot have out parameters", method.name),
                );
            }

            let mut arg_names = FxHashSet::default();
            for arg in method.args() {
                if !arg_names.insert(arg.name.as_str()) {
                    self.error(
                        ErrorCode::E2011,
                        &arg.location,
                        format!("duplicate argument `{}`", arg.name),
                    );
                }
                self.check_declared_name(&arg.name, &arg.location);
                self.validate_spec(&arg.ty, false);
            }

            let meta_collision = (method.name == "getInterfaceVersion"
                && method.args().is_empty())
                || (method.name == "getTransactionName"
                    && method.args().len() == 1
                    && method.args()[0].ty.bare_string() == "int");
            if meta_collision {
                self.error(
                    ErrorCode::E4004,
                    &method.location,
                    format!(
                        "`{}` collides with a reserved meta-method signature",
                        method.signature()
                    ),
                );
            }
        }

        self.check_transaction_ids(ty, iface);

        let mut constant_names = FxHashSet::default();
        for constant in &iface.constants {
            if !constant_names.insert(constant.name.as_str()) {
                self.error(
                    ErrorCode::E2013,
                    &constant.location,
                    format!("duplicate constant `{}`", constant.name),
                );
            }
            self.check_declared_name(&constant.name, &constant.location);
            self.validate_spec(&constant.ty, false);
            self.check_constant(constant);
        }
    }

    fn check_transaction_ids(&mut self, ty: &DefinedType, iface: &Interface) {
        let explicit = iface
            .methods
            .iter()
            .filter(|m| m.has_explicit_id())
            .count();
        if explicit > 0 && explicit != iface.methods.len() {
            self.error(
                ErrorCode::E4003,
                &ty.location,
                format!(
                    "`{}` assigns transaction ids to {explicit} of {} methods; assign all or none",
                    ty.name,
                    iface.methods.len()
                ),
            );
        }

        let mut seen: FxHashMap<i32, String> = FxHashMap::default();
        for method in &iface.methods {
            let Some(id) = method.id() else {
                continue;
            };
            if id.explicit
                && !(MIN_USER_TRANSACTION_ID..=MAX_USER_TRANSACTION_ID).contains(&id.value)
            {
                self.error(
                    ErrorCode::E4002,
                    &method.location,
                    format!(
                        "transaction id {} is outside the user range {MIN_USER_TRANSACTION_ID}..={MAX_USER_TRANSACTION_ID}",
                        id.value
                    ),
                );
            }
            if let Some(previous) = seen.insert(id.value, method.name.clone()) {
                self.error(
                    ErrorCode::E4001,
                    &method.location,
                    format!(
                        "transaction id {} is already used by `{previous}`",
                        id.value
                    ),
                );
            }
        }
    }

    /// Interface constants may only be byte, int, long, or String.
    fn check_constant(&mut self, constant: &ConstantDecl) {
        let name = constant.ty.name();
        let allowed = matches!(name, "byte" | "int" | "long" | "String")
            && !constant.ty.is_array
            && !constant.ty.is_generic();
        if !allowed {
            self.error(
                ErrorCode::E2014,
                &constant.location,
                format!(
                    "constant `{}` must be declared byte, int, long, or String, not `{}`",
                    constant.name,
                    constant.ty.bare_string()
                ),
            );
            return;
        }
        let Some(target) = literal_value_type(name) else {
            return;
        };
        self.check_value_fits(constant.value, target, false, &constant.location, &constant.name);
    }

    fn check_value_fits(
        &mut self,
        value: ConstExprId,
        target: ValueType,
        target_is_array: bool,
        location: &Location,
        name: &str,
    ) {
        let Some(evaluated) = self.evaluator.evaluate(value, self.diagnostics) else {
            return;
        };
        if let Err(message) = check_assignable(&evaluated, target, target_is_array) {
            self.error(ErrorCode::E2015, location, format!("`{name}`: {message}"));
        }
    }

    fn validate_structured(&mut self, parcelable: &StructuredParcelable) {
        let mut field_names = FxHashSet::default();
        for field in &parcelable.fields {
            if !field_names.insert(field.name.as_str()) {
                self.error(
                    ErrorCode::E2011,
                    &field.location,
                    format!("duplicate field `{}`", field.name),
                );
            }
            self.check_declared_name(&field.name, &field.location);
            self.validate_spec(&field.ty, false);
            if let Some(default) = field.default {
                self.check_field_default(field, default);
            }
        }
    }

    fn check_field_default(&mut self, field: &VariableDecl, default: ConstExprId) {
        match literal_value_type(field.ty.name()) {
            Some(target) if !field.ty.is_generic() => {
                self.check_value_fits(
                    default,
                    target,
                    field.ty.is_array,
                    &field.location,
                    &field.name,
                );
            }
            _ => self.error(
                ErrorCode::E2014,
                &field.location,
                format!(
                    "field `{}` of type `{}` cannot have a default value",
                    field.name,
                    field.ty.bare_string()
                ),
            ),
        }
    }

    fn validate_unstructured(&mut self, ty: &DefinedType, parcelable: &UnstructuredParcelable) {
        if self.options.structured {
            self.error(
                ErrorCode::E5005,
                &ty.location,
                format!("`{}` is unstructured; structured mode forbids it", ty.name),
            );
        }
        if self.options.backend.requires_native_header() && parcelable.cpp_header.is_none() {
            self.error(
                ErrorCode::E5001,
                &ty.location,
                format!(
                    "`{}` needs a cpp_header declaration for the {} backend",
                    ty.name, self.options.backend
                ),
            );
        }
        if let Some(params) = &parcelable.type_params {
            let mut seen = FxHashSet::default();
            for param in params {
                if !seen.insert(param.as_str()) {
                    self.error(
                        ErrorCode::E2016,
                        &ty.location,
                        format!("duplicate generic parameter `{param}`"),
                    );
                }
            }
        }
    }

    fn validate_enum(&mut self, decl: &EnumDecl) {
        let mut names = FxHashSet::default();
        for enumerator in &decl.enumerators {
            if !names.insert(enumerator.name.as_str()) {
                self.error(
                    ErrorCode::E2020,
                    &enumerator.location,
                    format!("duplicate enumerator `{}`", enumerator.name),
                );
            }
            self.check_declared_name(&enumerator.name, &enumerator.location);
            if let Some(value) = enumerator.value {
                self.check_value_fits(
                    value,
                    decl.backing,
                    false,
                    &enumerator.location,
                    &enumerator.name,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::{codes, compile, compile_with};
    use crate::{Backend, CompileOptions};
    use bidl_diagnostic::ErrorCode;

    fn cpp() -> CompileOptions {
        CompileOptions {
            backend: Backend::Cpp,
            structured: false,
        }
    }

    #[test]
    fn oneway_rules() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { oneway int bad(); oneway void worse(out String[] s); }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2009));
        assert!(reported.contains(&ErrorCode::E2010));
    }

    #[test]
    fn duplicate_members() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void f(); void f(); void g(in int a, in int a); \
             const int K = 1; const int K = 2; }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2012));
        assert!(reported.contains(&ErrorCode::E2011));
        assert!(reported.contains(&ErrorCode::E2013));
    }

    #[test]
    fn nullable_misuse() {
        let (_, diagnostics) = compile(&[
            ("p/I.bidl", "package p; interface I { void f(in @nullable int x, in @nullable E e); }"),
            ("p/E.bidl", "package p; enum E { A }"),
        ]);
        assert_eq!(
            codes(&diagnostics)
                .iter()
                .filter(|c| **c == ErrorCode::E2005)
                .count(),
            2
        );
    }

    #[test]
    fn nullable_arrays_are_fine() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void f(in @nullable int[] xs, in @nullable String s); }",
        )]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
    }

    #[test]
    fn utf8_requires_string() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void f(in @utf8InCpp int x); }",
        )]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E2006));
    }

    #[test]
    fn map_keys_and_primitive_generic_arguments() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void f(in Map<int, String> m, in List<int> xs); }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2007));
        assert!(reported.contains(&ErrorCode::E5003));
    }

    #[test]
    fn generic_arity() {
        let (_, diagnostics) = compile(&[
            ("p/I.bidl", "package p; interface I { void f(in List<String, String> xs, in Data<String> d); }"),
            ("p/Data.bidl", "package p; parcelable Data;"),
        ]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2003));
        assert!(reported.contains(&ErrorCode::E2004));
    }

    #[test]
    fn generic_parcelables_take_arguments() {
        let (_, diagnostics) = compile(&[
            ("p/I.bidl", "package p; interface I { void f(in Pair<String, String> p); }"),
            ("p/Pair.bidl", "package p; parcelable Pair<A, B>;"),
        ]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
    }

    #[test]
    fn binder_arrays_are_rejected() {
        let (_, diagnostics) = compile(&[
            ("p/I.bidl", "package p; interface I { void f(in IBinder[] binders, in ICallback[] cbs); }"),
            ("p/ICallback.bidl", "package p; interface ICallback { void done(); }"),
        ]);
        assert_eq!(
            codes(&diagnostics)
                .iter()
                .filter(|c| **c == ErrorCode::E2008)
                .count(),
            2
        );
    }

    #[test]
    fn void_is_return_only() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void f(in void x); }",
        )]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E2021));
    }

    #[test]
    fn constant_types_and_ranges() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { const float F = 1.5f; const byte B = 300; const String S = \"ok\"; }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2014));
        assert!(reported.contains(&ErrorCode::E2015));
    }

    #[test]
    fn transaction_id_rules() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void a() = 1; void b(); }",
        )]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E4003));

        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void a() = 1; void b() = 1; void c() = 16777115; }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E4001));
        assert!(reported.contains(&ErrorCode::E4002));
    }

    #[test]
    fn meta_method_signatures_are_reserved() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { int getInterfaceVersion(); String getTransactionName(in int id); }",
        )]);
        assert_eq!(
            codes(&diagnostics)
                .iter()
                .filter(|c| **c == ErrorCode::E4004)
                .count(),
            2
        );

        // Different argument types do not collide.
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { String getTransactionName(in long id); }",
        )]);
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
    }

    #[test]
    fn reserved_prefix_and_words() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; interface I { void _bidl_internal(); void f(in int synchronized); }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2017));
        assert!(reported.contains(&ErrorCode::E5004));
    }

    #[test]
    fn cpp_backend_legality() {
        let (_, diagnostics) = compile_with(
            &[
                ("p/Data.bidl", "package p; parcelable Data;"),
                ("p/I.bidl", "package p; interface I { void f(in List<String>[] xs); }"),
            ],
            &cpp(),
        );
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E5001));
        assert!(reported.contains(&ErrorCode::E5002));

        let (_, diagnostics) = compile_with(
            &[("p/Data.bidl", "package p; parcelable Data cpp_header \"data.h\";")],
            &cpp(),
        );
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
    }

    #[test]
    fn structured_mode_rejects_unstructured_parcelables() {
        let options = CompileOptions {
            backend: Backend::Java,
            structured: true,
        };
        let (_, diagnostics) =
            compile_with(&[("p/Data.bidl", "package p; parcelable Data;")], &options);
        assert!(codes(&diagnostics).contains(&ErrorCode::E5005));
    }

    #[test]
    fn annotations_are_site_checked() {
        let (_, diagnostics) = compile(&[(
            "p/I.bidl",
            "package p; @Backing(type = \"int\") @nullable interface I { @VintfStability String f(); }",
        )]);
        assert_eq!(
            codes(&diagnostics)
                .iter()
                .filter(|c| **c == ErrorCode::E2022)
                .count(),
            3
        );
    }

    #[test]
    fn annotation_parameter_types_are_checked() {
        let (_, diagnostics) = compile(&[(
            "p/Data.bidl",
            "package p; @UnsupportedAppUsage(maxTargetSdk = \"not an int\") parcelable Data;",
        )]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E1009));
    }

    #[test]
    fn duplicate_generic_parameters() {
        let (_, diagnostics) = compile(&[("p/Pair.bidl", "package p; parcelable Pair<T, T>;")]);
        assert!(codes(&diagnostics).contains(&ErrorCode::E2016));
    }

    #[test]
    fn enumerators_must_fit_the_backing_type() {
        let (_, diagnostics) = compile(&[(
            "p/E.bidl",
            "package p; @Backing(type = \"byte\") enum E { A = 200, A = 1 }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2015));
        assert!(reported.contains(&ErrorCode::E2020));
    }

    #[test]
    fn field_defaults_are_type_checked() {
        let (_, diagnostics) = compile(&[(
            "p/D.bidl",
            "package p; parcelable D { byte small = 300; int[] xs = {1, \"two\"}; }",
        )]);
        let reported = codes(&diagnostics);
        assert!(reported.contains(&ErrorCode::E2015));
        assert!(reported.contains(&ErrorCode::E6004));
    }
}
