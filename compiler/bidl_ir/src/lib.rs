//! bidl IR - the grammar-independent semantic model.
//!
//! This crate contains the core data structures for the bidl compiler:
//! - Spans and `Location`s for source positions
//! - Tokens and `TokenList` for lexer output
//! - The AST node model (type specifiers, annotations, methods, constants,
//!   defined-type variants)
//! - The constant-expression arena
//! - The `Typenames` registry owning every defined type
//!
//! # Design
//!
//! - Defined types form a closed sum type; use sites pattern-match
//!   exhaustively instead of downcasting.
//! - Constant expressions are flattened into an arena and referenced by id.
//! - Cross-references between types are name lookups through `Typenames`,
//!   never pointers.

pub mod ast;
mod const_expr;
mod span;
mod token;
mod typenames;

pub use ast::*;
pub use const_expr::{
    fits, is_valid_string_literal, parse_integer_literal, BinaryOp, ConstArena, ConstExpr,
    ConstExprId, ConstExprKind, IntLiteralError, UnaryOp, ValueType,
};
pub use span::{LineIndex, Location, Span};
pub use token::{Token, TokenKind, TokenList};
pub use typenames::{Resolution, TypeHandle, Typenames};
