//! Numeric operator semantics.
//!
//! C-like promotion with the undefined corners pinned down: every integral
//! computation happens in `i64` and is wrapped back to the final type, and
//! shifts are total (negative counts shift the other way, counts at or past
//! the width saturate).

use bidl_ir::{BinaryOp, ValueType};

/// Integral promotion: everything narrower than `int` computes as `int`.
pub(crate) fn promote(ty: ValueType) -> ValueType {
    match ty {
        ValueType::Int64 => ValueType::Int64,
        _ => ValueType::Int32,
    }
}

/// Usual arithmetic conversion: the wider promoted operand wins.
pub(crate) fn usual_arithmetic(lhs: ValueType, rhs: ValueType) -> ValueType {
    if promote(lhs) == ValueType::Int64 || promote(rhs) == ValueType::Int64 {
        ValueType::Int64
    } else {
        ValueType::Int32
    }
}

/// Wrap an `i64` computation result into the value range of `ty`.
pub(crate) fn wrap(value: i64, ty: ValueType) -> i64 {
    match ty {
        ValueType::Int8 => i64::from(value as i8),
        ValueType::Int32 => i64::from(value as i32),
        _ => value,
    }
}

fn bit_width(ty: ValueType) -> u32 {
    match ty {
        ValueType::Int8 => 8,
        ValueType::Int32 => 32,
        _ => 64,
    }
}

/// Total shift on a value already wrapped to `ty`.
///
/// A negative count shifts in the opposite direction by its magnitude. A
/// count at or past the width yields the sign-extension fixpoint: 0 for
/// left shifts and non-negative right shifts, -1 for right shifts of a
/// negative value.
pub(crate) fn shift(op: BinaryOp, value: i64, ty: ValueType, count: i64) -> i64 {
    let (op, magnitude) = if count < 0 {
        let flipped = match op {
            BinaryOp::Shl => BinaryOp::Shr,
            _ => BinaryOp::Shl,
        };
        (flipped, count.unsigned_abs())
    } else {
        (op, count.unsigned_abs())
    };

    let width = u64::from(bit_width(ty));
    if magnitude >= width {
        return match op {
            BinaryOp::Shl => 0,
            _ => {
                if value < 0 {
                    -1
                } else {
                    0
                }
            }
        };
    }

    let shifted = match op {
        BinaryOp::Shl => value.wrapping_shl(magnitude as u32),
        _ => value >> magnitude,
    };
    wrap(shifted, ty)
}

/// Wrapping integral arithmetic in `i64`. Division by zero must be rejected
/// before calling.
pub(crate) fn arithmetic(op: BinaryOp, lhs: i64, rhs: i64) -> i64 {
    match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div => lhs.wrapping_div(rhs),
        BinaryOp::Mod => lhs.wrapping_rem(rhs),
        BinaryOp::BitAnd => lhs & rhs,
        BinaryOp::BitOr => lhs | rhs,
        BinaryOp::BitXor => lhs ^ rhs,
        other => panic!("`{other}` is not an arithmetic operator"),
    }
}

/// Comparison on converted integral values.
pub(crate) fn compare(op: BinaryOp, lhs: i64, rhs: i64) -> bool {
    match op {
        BinaryOp::Eq => lhs == rhs,
        BinaryOp::NotEq => lhs != rhs,
        BinaryOp::Lt => lhs < rhs,
        BinaryOp::LtEq => lhs <= rhs,
        BinaryOp::Gt => lhs > rhs,
        BinaryOp::GtEq => lhs >= rhs,
        other => panic!("`{other}` is not a comparison operator"),
    }
}
