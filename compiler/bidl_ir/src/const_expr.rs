//! Constant-expression node model.
//!
//! Constant expressions are flattened into a `ConstArena` and referenced by
//! `ConstExprId` — no boxed trees. The arena is owned by the `Typenames`
//! registry so that every expression of one compilation unit shares a single
//! id space (the evaluator memoizes per id).
//!
//! Leaf literal values are parsed eagerly when the node is built; composite
//! nodes (unary, binary, array) are evaluated lazily by `bidl_eval`.

use crate::Location;
use std::fmt;

/// Index of a constant expression inside a `ConstArena`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ConstExprId(u32);

impl ConstExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The type domain of constant values.
///
/// `declared type` and `final (promoted) type` of an expression both draw
/// from this set; they can legitimately differ (e.g. a `byte + byte`
/// expression has final type `Int32` after integral promotion).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ValueType {
    Bool,
    Int8,
    Int32,
    Int64,
    Char,
    Str,
    Float,
    Array,
}

impl ValueType {
    pub fn is_integral(self) -> bool {
        matches!(self, ValueType::Int8 | ValueType::Int32 | ValueType::Int64)
    }

    /// Bool and the integral types evaluate through the shared numeric path.
    pub fn is_numeric(self) -> bool {
        self == ValueType::Bool || self.is_integral()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "boolean",
            ValueType::Int8 => "byte",
            ValueType::Int32 => "int",
            ValueType::Int64 => "long",
            ValueType::Char => "char",
            ValueType::Str => "String",
            ValueType::Float => "float",
            ValueType::Array => "array",
        };
        write!(f, "{name}")
    }
}

/// Unary constant operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Binary constant operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    /// Comparison operators always yield boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    /// Logical operators always yield boolean.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalOr | BinaryOp::LogicalAnd)
    }

    /// Shift operators promote only the left operand.
    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A constant expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstExpr {
    pub kind: ConstExprKind,
    pub location: Location,
}

/// Constant expression variants.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstExprKind {
    Bool(bool),
    /// Integer literal or propagated integral value. `width` is the type
    /// inferred at parse time (smallest fit, or forced by suffix).
    Int {
        value: i64,
        width: ValueType,
    },
    Char(char),
    /// Raw text including the surrounding double quotes.
    Str(String),
    /// Raw literal text, rendered verbatim; never participates in generic
    /// binary evaluation.
    Float(String),
    Array(Vec<ConstExprId>),
    Unary {
        op: UnaryOp,
        operand: ConstExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ConstExprId,
        rhs: ConstExprId,
    },
    /// Placeholder produced when literal parsing failed; structurally
    /// invalid, poisons everything that contains it.
    Invalid,
}

/// Arena of constant-expression nodes.
///
/// One arena per `Typenames` registry; ids are stable for the lifetime of
/// the registry and serve as memoization keys in the evaluator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstArena {
    exprs: Vec<ConstExpr>,
}

impl ConstArena {
    pub fn new() -> Self {
        ConstArena { exprs: Vec::new() }
    }

    pub fn alloc(&mut self, expr: ConstExpr) -> ConstExprId {
        let id = ConstExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn get(&self, id: ConstExprId) -> &ConstExpr {
        &self.exprs[id.index()]
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Render the canonical source text of an expression.
    ///
    /// Used in diagnostics (e.g. division by zero reports the whole
    /// offending expression) and by the dumper for non-evaluated literals.
    pub fn display(&self, id: ConstExprId) -> String {
        match &self.get(id).kind {
            ConstExprKind::Bool(b) => b.to_string(),
            ConstExprKind::Int { value, .. } => value.to_string(),
            ConstExprKind::Char(c) => format!("'{c}'"),
            ConstExprKind::Str(raw) | ConstExprKind::Float(raw) => raw.clone(),
            ConstExprKind::Array(elems) => {
                let inner: Vec<String> = elems.iter().map(|e| self.display(*e)).collect();
                format!("{{{}}}", inner.join(", "))
            }
            ConstExprKind::Unary { op, operand } => {
                format!("{}{}", op.symbol(), self.display(*operand))
            }
            ConstExprKind::Binary { op, lhs, rhs } => {
                format!("({} {} {})", self.display(*lhs), op.symbol(), self.display(*rhs))
            }
            ConstExprKind::Invalid => "<invalid>".to_string(),
        }
    }

    /// True if the right-hand side of a division/modulo is the literal zero.
    pub fn is_zero_literal(&self, id: ConstExprId) -> bool {
        matches!(self.get(id).kind, ConstExprKind::Int { value: 0, .. })
    }
}

/// Failure modes of integer-literal parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntLiteralError {
    /// Value does not fit in 64 bits.
    OutOfRange,
    /// Text is not a valid integer literal at all.
    Malformed,
}

impl fmt::Display for IntLiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntLiteralError::OutOfRange => write!(f, "integer literal out of range"),
            IntLiteralError::Malformed => write!(f, "malformed integer literal"),
        }
    }
}

/// Parse an integer literal into a value and its inferred type.
///
/// Rules:
/// - `l`/`L` suffix forces `long`; `u8` suffix forces `byte`.
/// - decimal literals pick the smallest signed width that fits
///   (byte, then int, then long);
/// - hex (`0x`) and binary (`0b`) literals are parsed as unsigned and
///   typed by bit width: 32 bits or fewer reinterprets as `int`
///   (so `0xffffffff` is `-1`), otherwise `long`.
pub fn parse_integer_literal(text: &str) -> Result<(i64, ValueType), IntLiteralError> {
    let (body, forced) = if let Some(stripped) = text.strip_suffix("u8") {
        (stripped, Some(ValueType::Int8))
    } else if let Some(stripped) = text.strip_suffix(['l', 'L']) {
        (stripped, Some(ValueType::Int64))
    } else {
        (text, None)
    };

    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return parse_radix_literal(hex, 16, forced);
    }
    if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        return parse_radix_literal(bin, 2, forced);
    }

    let value: i64 = body
        .parse()
        .map_err(|_| classify_decimal_failure(body))?;
    let ty = forced.unwrap_or_else(|| smallest_width(value));
    if !fits(value, ty) {
        return Err(IntLiteralError::OutOfRange);
    }
    Ok((value, ty))
}

fn parse_radix_literal(
    digits: &str,
    radix: u32,
    forced: Option<ValueType>,
) -> Result<(i64, ValueType), IntLiteralError> {
    if digits.is_empty() {
        return Err(IntLiteralError::Malformed);
    }
    let unsigned =
        u64::from_str_radix(digits, radix).map_err(|_| IntLiteralError::OutOfRange)?;
    // Unsigned-by-bit-width typing: a 32-bit pattern reinterprets as int.
    let (value, ty) = if unsigned <= u64::from(u32::MAX) {
        (i64::from(unsigned as u32 as i32), ValueType::Int32)
    } else {
        (unsigned as i64, ValueType::Int64)
    };
    match forced {
        None => Ok((value, ty)),
        Some(f) if fits(value, f) => Ok((value, f)),
        Some(ValueType::Int64) => Ok((value, ValueType::Int64)),
        Some(_) => Err(IntLiteralError::OutOfRange),
    }
}

fn classify_decimal_failure(body: &str) -> IntLiteralError {
    if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        IntLiteralError::OutOfRange
    } else {
        IntLiteralError::Malformed
    }
}

/// Smallest signed width that can represent `value`.
fn smallest_width(value: i64) -> ValueType {
    if i8::try_from(value).is_ok() {
        ValueType::Int8
    } else if i32::try_from(value).is_ok() {
        ValueType::Int32
    } else {
        ValueType::Int64
    }
}

/// Whether `value` is representable in integral type `ty`.
pub fn fits(value: i64, ty: ValueType) -> bool {
    match ty {
        ValueType::Int8 => i8::try_from(value).is_ok(),
        ValueType::Int32 => i32::try_from(value).is_ok(),
        ValueType::Int64 => true,
        _ => false,
    }
}

/// Validate a raw string literal: must begin and end with a double quote.
pub fn is_valid_string_literal(raw: &str) -> bool {
    raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"')
}
