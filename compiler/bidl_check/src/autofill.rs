//! Auto-fill passes: enumerator values and transaction ids.
//!
//! Both run before validation so downstream passes (and the API dumper) can
//! rely on every enumerator having a value and every method having an id.

use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_ir::{
    AnnotationKind, ConstExpr, ConstExprId, ConstExprKind, BinaryOp, DefinedTypeKind, Location,
    Typenames, ValueType,
};

/// Give every enumerator a value and set the enum's backing type.
///
/// A missing first value is the literal 0; any later missing value is the
/// expression `previous + 1`, built as a real arena node so it flows through
/// ordinary evaluation.
pub(crate) fn fill_enum_values(typenames: &mut Typenames, diagnostics: &mut Diagnostics) {
    let (documents, arena) = typenames.documents_and_arena_mut();
    for document in documents.iter_mut() {
        for ty in &mut document.defined_types {
            let DefinedTypeKind::Enum(decl) = &mut ty.kind else {
                continue;
            };

            if let Some(backing) = ty
                .annotations
                .iter()
                .find(|a| a.kind == AnnotationKind::Backing)
            {
                match backing.param("type").map(|id| &arena.get(id).kind) {
                    Some(ConstExprKind::Str(raw)) => {
                        decl.backing = match &raw[1..raw.len() - 1] {
                            "byte" => ValueType::Int8,
                            "int" => ValueType::Int32,
                            "long" => ValueType::Int64,
                            other => {
                                diagnostics.report(
                                    Diagnostic::error(
                                        ErrorCode::E2019,
                                        backing.location.clone(),
                                    )
                                    .with_message(format!(
                                        "invalid enum backing type `{other}`"
                                    ))
                                    .with_note("legal backing types: byte, int, long"),
                                );
                                decl.backing
                            }
                        };
                    }
                    Some(_) => {
                        diagnostics.report(
                            Diagnostic::error(ErrorCode::E2019, backing.location.clone())
                                .with_message("backing type must be a string literal"),
                        );
                    }
                    None => {
                        diagnostics.report(
                            Diagnostic::error(ErrorCode::E2019, backing.location.clone())
                                .with_message("`@Backing` requires a `type` parameter"),
                        );
                    }
                }
            }

            let mut previous: Option<ConstExprId> = None;
            for enumerator in &mut decl.enumerators {
                if enumerator.value.is_none() {
                    let location = enumerator.location.clone();
                    let value = match previous {
                        None => alloc_int(arena, 0, location),
                        Some(prev) => {
                            let one = alloc_int(arena, 1, location.clone());
                            arena.alloc(ConstExpr {
                                kind: ConstExprKind::Binary {
                                    op: BinaryOp::Add,
                                    lhs: prev,
                                    rhs: one,
                                },
                                location,
                            })
                        }
                    };
                    enumerator.value = Some(value);
                }
                previous = enumerator.value;
            }
        }
    }
}

fn alloc_int(
    arena: &mut bidl_ir::ConstArena,
    value: i64,
    location: Location,
) -> ConstExprId {
    arena.alloc(ConstExpr {
        kind: ConstExprKind::Int {
            value,
            width: ValueType::Int8,
        },
        location,
    })
}

/// Assign sequential transaction ids to interfaces that use none explicitly.
///
/// Interfaces with a partial explicit assignment are left alone; validation
/// rejects them.
pub(crate) fn assign_transaction_ids(typenames: &mut Typenames) {
    for document in typenames.documents_mut() {
        for ty in &mut document.defined_types {
            let DefinedTypeKind::Interface(iface) = &mut ty.kind else {
                continue;
            };
            if iface.methods.iter().any(bidl_ir::Method::has_explicit_id) {
                continue;
            }
            for (index, method) in iface.methods.iter_mut().enumerate() {
                method.assign_id(index as i32);
            }
        }
    }
}
