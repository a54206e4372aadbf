//! Lazy, memoized constant-expression evaluation.
//!
//! The [`Evaluator`] walks arena-allocated expression nodes on demand and
//! memoizes per [`ConstExprId`], so shared subexpressions evaluate once and
//! an erroneous expression is reported once no matter how many declarations
//! reference it. Results are explicit [`Evaluated`] values; nothing is
//! cached inside the AST.
//!
//! Numeric semantics are C-like: integral promotion to `int`, the usual
//! arithmetic conversions, wrapping overflow, and total shifts. Operators
//! accept boolean and integral operands only; chars and floats are literal
//! values that never participate in computation, and strings support `+`
//! concatenation only.

mod operators;

use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_ir::{
    fits, is_valid_string_literal, BinaryOp, ConstArena, ConstExprId, ConstExprKind, Location,
    UnaryOp, ValueType,
};
use operators::{arithmetic, compare, promote, shift, usual_arithmetic, wrap};
use rustc_hash::FxHashMap;

/// The payload of an evaluated constant.
///
/// Booleans, chars, and all integral widths share the `Int` representation;
/// [`Evaluated::ty`] tells them apart.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(i64),
    /// Raw string literal text including the surrounding quotes.
    Str(String),
    /// Raw float literal text, never computed with.
    Float(String),
    Array(Vec<Evaluated>),
}

/// A fully evaluated constant expression: final (promoted) type plus value.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluated {
    pub ty: ValueType,
    pub value: ConstValue,
}

impl Evaluated {
    fn int(ty: ValueType, value: i64) -> Self {
        Evaluated {
            ty,
            value: ConstValue::Int(value),
        }
    }

    fn boolean(value: bool) -> Self {
        Evaluated::int(ValueType::Bool, i64::from(value))
    }

    /// The integral payload.
    ///
    /// # Panics
    /// Panics when the value is not numeric; callers check `ty` first.
    fn as_int(&self) -> i64 {
        match self.value {
            ConstValue::Int(v) => v,
            _ => panic!("`{}` value holds a non-integral payload", self.ty),
        }
    }
}

/// Type domains for operand dispatch and array homogeneity.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Domain {
    Bool,
    Integral,
    Char,
    Str,
    Float,
    Array,
}

fn domain(ty: ValueType) -> Domain {
    match ty {
        ValueType::Bool => Domain::Bool,
        ValueType::Int8 | ValueType::Int32 | ValueType::Int64 => Domain::Integral,
        ValueType::Char => Domain::Char,
        ValueType::Str => Domain::Str,
        ValueType::Float => Domain::Float,
        ValueType::Array => Domain::Array,
    }
}

/// Bool and the integral widths compute through the shared `i64` path.
/// Char literals evaluate and render on their own but never participate in
/// operator evaluation.
fn is_numeric(ty: ValueType) -> bool {
    matches!(domain(ty), Domain::Bool | Domain::Integral)
}

/// Map a builtin type name to the value type constants of that type carry.
pub fn literal_value_type(name: &str) -> Option<ValueType> {
    match name {
        "boolean" => Some(ValueType::Bool),
        "byte" => Some(ValueType::Int8),
        "int" => Some(ValueType::Int32),
        "long" => Some(ValueType::Int64),
        "char" => Some(ValueType::Char),
        "String" => Some(ValueType::Str),
        "float" => Some(ValueType::Float),
        _ => None,
    }
}

enum EvalError {
    /// A contained error was already reported (parse-poisoned node or a
    /// failed subexpression).
    Silent,
    Diag(Box<Diagnostic>),
}

type EvalResult = Result<Evaluated, EvalError>;

fn fail(code: ErrorCode, location: &Location, message: String) -> EvalError {
    EvalError::Diag(Box::new(
        Diagnostic::error(code, location.clone()).with_message(message),
    ))
}

/// Memoizing evaluator over one constant arena.
pub struct Evaluator<'a> {
    arena: &'a ConstArena,
    memo: FxHashMap<ConstExprId, Option<Evaluated>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(arena: &'a ConstArena) -> Self {
        Evaluator {
            arena,
            memo: FxHashMap::default(),
        }
    }

    /// Evaluate an expression, reporting problems on first encounter only.
    ///
    /// `None` means the expression (or a subexpression) is invalid; the
    /// cause is already in the collector.
    pub fn evaluate(
        &mut self,
        id: ConstExprId,
        diagnostics: &mut Diagnostics,
    ) -> Option<Evaluated> {
        if let Some(cached) = self.memo.get(&id) {
            return cached.clone();
        }
        let outcome = match self.eval(id, diagnostics) {
            Ok(value) => Some(value),
            Err(EvalError::Silent) => None,
            Err(EvalError::Diag(diag)) => {
                diagnostics.report(*diag);
                None
            }
        };
        self.memo.insert(id, outcome.clone());
        outcome
    }

    /// Evaluate and render against a declared type. Reports E6003 when the
    /// value is not assignable to the target.
    pub fn render_as(
        &mut self,
        id: ConstExprId,
        target: ValueType,
        target_is_array: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let value = self.evaluate(id, diagnostics)?;
        match render(&value, target, target_is_array) {
            Ok(text) => Some(text),
            Err(message) => {
                diagnostics.report(
                    Diagnostic::error(ErrorCode::E6003, self.arena.get(id).location.clone())
                        .with_message(message),
                );
                None
            }
        }
    }

    fn eval(&mut self, id: ConstExprId, diagnostics: &mut Diagnostics) -> EvalResult {
        let node = self.arena.get(id);
        match &node.kind {
            ConstExprKind::Bool(b) => Ok(Evaluated::boolean(*b)),
            ConstExprKind::Int { value, width } => Ok(Evaluated::int(*width, *value)),
            ConstExprKind::Char(c) => {
                Ok(Evaluated::int(ValueType::Char, i64::from(u32::from(*c))))
            }
            ConstExprKind::Str(raw) => {
                if is_valid_string_literal(raw) {
                    Ok(Evaluated {
                        ty: ValueType::Str,
                        value: ConstValue::Str(raw.clone()),
                    })
                } else {
                    Err(fail(
                        ErrorCode::E6005,
                        &node.location,
                        format!("malformed string literal {raw}"),
                    ))
                }
            }
            ConstExprKind::Float(text) => Ok(Evaluated {
                ty: ValueType::Float,
                value: ConstValue::Float(text.clone()),
            }),
            ConstExprKind::Invalid => Err(EvalError::Silent),
            ConstExprKind::Array(elems) => self.eval_array(elems, diagnostics),
            ConstExprKind::Unary { op, operand } => {
                self.eval_unary(*op, *operand, &node.location, diagnostics)
            }
            ConstExprKind::Binary { op, lhs, rhs } => {
                self.eval_binary(id, *op, *lhs, *rhs, &node.location, diagnostics)
            }
        }
    }

    /// The first element establishes the array's domain; every later element
    /// must stay in it.
    fn eval_array(
        &mut self,
        elems: &[ConstExprId],
        diagnostics: &mut Diagnostics,
    ) -> EvalResult {
        let mut values = Vec::with_capacity(elems.len());
        let mut first: Option<ValueType> = None;
        for &elem in elems {
            let value = self
                .evaluate(elem, diagnostics)
                .ok_or(EvalError::Silent)?;
            match first {
                None => first = Some(value.ty),
                Some(first_ty) if domain(first_ty) != domain(value.ty) => {
                    return Err(fail(
                        ErrorCode::E6004,
                        &self.arena.get(elem).location,
                        format!(
                            "array elements have incompatible types: `{first_ty}` and `{}`",
                            value.ty
                        ),
                    ));
                }
                Some(_) => {}
            }
            values.push(value);
        }
        Ok(Evaluated {
            ty: ValueType::Array,
            value: ConstValue::Array(values),
        })
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: ConstExprId,
        location: &Location,
        diagnostics: &mut Diagnostics,
    ) -> EvalResult {
        let value = self
            .evaluate(operand, diagnostics)
            .ok_or(EvalError::Silent)?;
        match (op, domain(value.ty)) {
            // All four unary operators accept boolean and integral operands:
            // `!` is logical negation over the 0/1 payload, the rest compute
            // over it at the promoted width.
            (UnaryOp::Not, Domain::Bool | Domain::Integral) => {
                Ok(Evaluated::boolean(value.as_int() == 0))
            }
            (UnaryOp::Plus, Domain::Float) => Ok(value),
            (UnaryOp::Minus, Domain::Float) => {
                let ConstValue::Float(text) = &value.value else {
                    panic!("float value holds a non-float payload");
                };
                let negated = match text.strip_prefix('-') {
                    Some(stripped) => stripped.to_string(),
                    None => format!("-{text}"),
                };
                Ok(Evaluated {
                    ty: ValueType::Float,
                    value: ConstValue::Float(negated),
                })
            }
            (UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot, Domain::Integral | Domain::Bool) => {
                let promoted = promote(value.ty);
                let v = value.as_int();
                let computed = match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => v.wrapping_neg(),
                    _ => !v,
                };
                Ok(Evaluated::int(promoted, wrap(computed, promoted)))
            }
            _ => Err(fail(
                ErrorCode::E6002,
                location,
                format!("operator `{op}` cannot be applied to `{}`", value.ty),
            )),
        }
    }

    fn eval_binary(
        &mut self,
        id: ConstExprId,
        op: BinaryOp,
        lhs: ConstExprId,
        rhs: ConstExprId,
        location: &Location,
        diagnostics: &mut Diagnostics,
    ) -> EvalResult {
        let l = self.evaluate(lhs, diagnostics).ok_or(EvalError::Silent)?;
        let r = self.evaluate(rhs, diagnostics).ok_or(EvalError::Silent)?;

        if l.ty == ValueType::Str && r.ty == ValueType::Str && op == BinaryOp::Add {
            let (ConstValue::Str(a), ConstValue::Str(b)) = (&l.value, &r.value) else {
                panic!("string value holds a non-string payload");
            };
            let concatenated =
                format!("\"{}{}\"", &a[1..a.len() - 1], &b[1..b.len() - 1]);
            return Ok(Evaluated {
                ty: ValueType::Str,
                value: ConstValue::Str(concatenated),
            });
        }

        if is_numeric(l.ty) && is_numeric(r.ty) {
            let (lv, rv) = (l.as_int(), r.as_int());
            if op.is_logical() {
                let truth = match op {
                    BinaryOp::LogicalOr => lv != 0 || rv != 0,
                    _ => lv != 0 && rv != 0,
                };
                return Ok(Evaluated::boolean(truth));
            }
            if op.is_comparison() {
                return Ok(Evaluated::boolean(compare(op, lv, rv)));
            }
            if op.is_shift() {
                let promoted = promote(l.ty);
                return Ok(Evaluated::int(promoted, shift(op, lv, promoted, rv)));
            }
            if matches!(op, BinaryOp::Div | BinaryOp::Mod) && rv == 0 {
                let verb = if op == BinaryOp::Div {
                    "division"
                } else {
                    "modulo"
                };
                return Err(fail(
                    ErrorCode::E6001,
                    location,
                    format!("{verb} by zero: `{}`", self.arena.display(id)),
                ));
            }
            let result_ty = usual_arithmetic(l.ty, r.ty);
            return Ok(Evaluated::int(
                result_ty,
                wrap(arithmetic(op, lv, rv), result_ty),
            ));
        }

        Err(fail(
            ErrorCode::E6002,
            location,
            format!(
                "operator `{op}` cannot be applied to `{}` and `{}`",
                l.ty, r.ty
            ),
        ))
    }
}

/// Check that an evaluated value is assignable to a declared type.
pub fn check_assignable(
    value: &Evaluated,
    target: ValueType,
    target_is_array: bool,
) -> Result<(), String> {
    render(value, target, target_is_array).map(|_| ())
}

/// Render an evaluated value against a declared type: the canonical text the
/// API dumper and the compatibility checker compare.
pub fn render(
    value: &Evaluated,
    target: ValueType,
    target_is_array: bool,
) -> Result<String, String> {
    if target_is_array {
        let ConstValue::Array(elems) = &value.value else {
            return Err(format!(
                "expected an array of `{target}`, got `{}`",
                value.ty
            ));
        };
        let rendered: Result<Vec<String>, String> =
            elems.iter().map(|e| render(e, target, false)).collect();
        return Ok(format!("{{{}}}", rendered?.join(", ")));
    }

    match target {
        ValueType::Bool => {
            if value.ty != ValueType::Bool {
                return Err(mismatch(target, value.ty));
            }
            Ok((value.as_int() != 0).to_string())
        }
        ValueType::Int8 | ValueType::Int32 | ValueType::Int64 => {
            if !(value.ty.is_integral() || value.ty == ValueType::Char) {
                return Err(mismatch(target, value.ty));
            }
            let v = value.as_int();
            if !fits(v, target) {
                return Err(format!("value {v} out of range for `{target}`"));
            }
            Ok(v.to_string())
        }
        ValueType::Char => {
            if value.ty != ValueType::Char {
                return Err(mismatch(target, value.ty));
            }
            let c = char::from_u32(value.as_int() as u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            Ok(format!("'{c}'"))
        }
        ValueType::Str => match &value.value {
            ConstValue::Str(raw) if value.ty == ValueType::Str => Ok(raw.clone()),
            _ => Err(mismatch(target, value.ty)),
        },
        ValueType::Float => match &value.value {
            ConstValue::Float(raw) if value.ty == ValueType::Float => Ok(raw.clone()),
            _ => Err(mismatch(target, value.ty)),
        },
        ValueType::Array => Err("nested arrays are not supported".to_string()),
    }
}

fn mismatch(target: ValueType, actual: ValueType) -> String {
    format!("expected `{target}`, got a `{actual}` value")
}
