//! Token cursor for navigating the token stream.
//!
//! Provides low-level token access, lookahead, and consumption. The cursor
//! owns the token list because closing nested generic argument lists has to
//! rewrite a `>>` token into a single remaining `>` in place.

use bidl_ir::{Span, Token, TokenKind, TokenList};

/// Cursor over a lexed token stream.
///
/// Invariant: the position is always valid; the last token is `Eof` and the
/// cursor never advances past it.
pub struct Cursor {
    tokens: TokenList,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: TokenList) -> Self {
        assert!(!tokens.is_empty(), "token stream must end with Eof");
        Cursor { tokens, pos: 0 }
    }

    /// Get the current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Get the current token's kind.
    #[inline]
    pub fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    /// Get the current token's span.
    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// The comment attached to the current token, if any.
    pub fn current_comment(&self) -> Option<String> {
        self.current().comment.as_deref().map(str::to_string)
    }

    /// Check if at end of the token stream.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Move past the current token. Never advances past `Eof`.
    #[inline]
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Check if the current token equals `kind` (payload-free kinds only).
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Check if the current token is an identifier.
    #[inline]
    pub fn check_ident(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(_))
    }

    /// Consume the current token if it equals `kind`.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Split the current `>>` token into two `>`, consuming the first.
    ///
    /// After the call the current token is a `>` covering the second half of
    /// the original span. Used when a nested generic argument list closes
    /// (`Map<String, List<String>>`).
    ///
    /// # Panics
    /// Panics if the current token is not `>>`.
    pub fn split_shr(&mut self) {
        let pos = self.pos;
        let token = self
            .tokens
            .get_mut(pos)
            .unwrap_or_else(|| panic!("cursor position {pos} out of bounds"));
        assert!(
            matches!(token.kind, TokenKind::Shr),
            "split_shr on a non-`>>` token"
        );
        token.kind = TokenKind::Gt;
        token.span = Span::new(token.span.start + 1, token.span.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidl_lexer::lex;
    use pretty_assertions::assert_eq;

    #[test]
    fn advance_stops_at_eof() {
        let mut cursor = Cursor::new(lex("a").tokens);
        assert!(cursor.check_ident());
        cursor.advance();
        assert!(cursor.is_at_end());
        cursor.advance();
        assert!(cursor.is_at_end());
    }

    #[test]
    fn split_shr_leaves_a_gt() {
        let mut cursor = Cursor::new(lex(">>").tokens);
        assert!(cursor.check(&TokenKind::Shr));
        cursor.split_shr();
        assert!(cursor.check(&TokenKind::Gt));
        assert_eq!(cursor.current_span(), Span::new(1, 2));
        cursor.advance();
        assert!(cursor.is_at_end());
    }
}
