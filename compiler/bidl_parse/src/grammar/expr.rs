//! Constant-expression parsing.
//!
//! Precedence climbing over the C operator table. Nodes are allocated into
//! the shared arena; parenthesized groups reuse the inner node (the arena's
//! canonical rendering re-parenthesizes every binary node anyway).

use crate::{ParseResult, Parser};
use bidl_diagnostic::{Diagnostic, ErrorCode};
use bidl_ir::{
    parse_integer_literal, BinaryOp, ConstExpr, ConstExprId, ConstExprKind, Location, TokenKind,
    UnaryOp,
};

/// Binding power per binary operator, loosest first.
fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::PipePipe => (BinaryOp::LogicalOr, 1),
        TokenKind::AmpAmp => (BinaryOp::LogicalAnd, 2),
        TokenKind::Pipe => (BinaryOp::BitOr, 3),
        TokenKind::Caret => (BinaryOp::BitXor, 4),
        TokenKind::Amp => (BinaryOp::BitAnd, 5),
        TokenKind::EqEq => (BinaryOp::Eq, 6),
        TokenKind::NotEq => (BinaryOp::NotEq, 6),
        TokenKind::Lt => (BinaryOp::Lt, 7),
        TokenKind::LtEq => (BinaryOp::LtEq, 7),
        TokenKind::Gt => (BinaryOp::Gt, 7),
        TokenKind::GtEq => (BinaryOp::GtEq, 7),
        TokenKind::Shl => (BinaryOp::Shl, 8),
        TokenKind::Shr => (BinaryOp::Shr, 8),
        TokenKind::Plus => (BinaryOp::Add, 9),
        TokenKind::Minus => (BinaryOp::Sub, 9),
        TokenKind::Star => (BinaryOp::Mul, 10),
        TokenKind::Slash => (BinaryOp::Div, 10),
        TokenKind::Percent => (BinaryOp::Mod, 10),
        _ => return None,
    })
}

impl Parser<'_> {
    pub(crate) fn const_expr(&mut self) -> ParseResult<ConstExprId> {
        self.binary_expr(0)
    }

    /// Left-associative precedence climbing.
    fn binary_expr(&mut self, min_bp: u8) -> ParseResult<ConstExprId> {
        let mut lhs = self.unary_expr()?;
        while let Some((op, bp)) = binary_op(self.cursor.current_kind()) {
            if bp < min_bp {
                break;
            }
            let location = self.current_location();
            self.cursor.advance();
            let rhs = self.binary_expr(bp + 1)?;
            lhs = self.arena.alloc(ConstExpr {
                kind: ConstExprKind::Binary { op, lhs, rhs },
                location,
            });
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> ParseResult<ConstExprId> {
        let op = match self.cursor.current_kind() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let location = self.current_location();
            self.cursor.advance();
            let operand = self.unary_expr()?;
            return Ok(self.arena.alloc(ConstExpr {
                kind: ConstExprKind::Unary { op, operand },
                location,
            }));
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> ParseResult<ConstExprId> {
        let location = self.current_location();
        let kind = self.cursor.current_kind().clone();
        match kind {
            TokenKind::True => {
                self.cursor.advance();
                Ok(self.alloc_leaf(ConstExprKind::Bool(true), location))
            }
            TokenKind::False => {
                self.cursor.advance();
                Ok(self.alloc_leaf(ConstExprKind::Bool(false), location))
            }
            TokenKind::Int(text) => {
                self.cursor.advance();
                Ok(self.integer_literal(&text, location))
            }
            TokenKind::Char(c) => {
                self.cursor.advance();
                Ok(self.alloc_leaf(ConstExprKind::Char(c), location))
            }
            TokenKind::Str(raw) => {
                self.cursor.advance();
                Ok(self.alloc_leaf(ConstExprKind::Str(raw), location))
            }
            TokenKind::Float(text) => {
                self.cursor.advance();
                Ok(self.alloc_leaf(ConstExprKind::Float(text), location))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.const_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBrace => self.array_literal(location),
            _ => Err(self.unexpected("a constant expression")),
        }
    }

    /// '{' (const_expr (',' const_expr)* ','?)? '}'
    fn array_literal(&mut self, location: Location) -> ParseResult<ConstExprId> {
        self.expect(TokenKind::LBrace)?;
        let mut elems = Vec::new();
        while !self.cursor.check(&TokenKind::RBrace) {
            elems.push(self.const_expr()?);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.alloc_leaf(ConstExprKind::Array(elems), location))
    }

    /// Parse an integer literal token into a typed leaf. A malformed or
    /// out-of-range literal is reported and degrades to an `Invalid` node,
    /// which poisons any expression containing it but not the rest of the
    /// file.
    fn integer_literal(&mut self, text: &str, location: Location) -> ConstExprId {
        match parse_integer_literal(text) {
            Ok((value, width)) => {
                self.alloc_leaf(ConstExprKind::Int { value, width }, location)
            }
            Err(err) => {
                self.diagnostics.report(
                    Diagnostic::error(ErrorCode::E1003, location.clone())
                        .with_message(format!("invalid integer literal `{text}`: {err}")),
                );
                self.alloc_leaf(ConstExprKind::Invalid, location)
            }
        }
    }

    fn alloc_leaf(&mut self, kind: ConstExprKind, location: Location) -> ConstExprId {
        self.arena.alloc(ConstExpr { kind, location })
    }
}
