//! Lexer for bidl using logos.
//!
//! Produces a `TokenList` for the parser. Comments are trivia but are
//! attached to the token that follows them, because a declaration's doc
//! comment (and its `@hide` marker) is the last comment written directly
//! above it.

use bidl_ir::{Span, Token, TokenKind, TokenList};
use logos::Logos;

/// Raw token from logos (before conversion to `TokenKind`).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
    BlockComment,

    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("parcelable")]
    Parcelable,
    #[token("enum")]
    Enum,
    #[token("oneway")]
    Oneway,
    #[token("const")]
    Const,
    #[token("in")]
    In,
    #[token("out")]
    Out,
    #[token("inout")]
    Inout,
    #[token("cpp_header")]
    CppHeader,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("@")]
    At,

    #[token("==")]
    EqEq,
    #[token("=")]
    Assign,
    #[token("!=")]
    NotEq,
    #[token("<<")]
    Shl,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">>")]
    Shr,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&&")]
    AmpAmp,
    #[token("&")]
    Amp,
    #[token("||")]
    PipePipe,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,

    // Float before integer so `1.5` never lexes as `1` `.` `5`.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?f?")]
    Float,

    // Hex, binary, then decimal integers; raw text kept so the parser can
    // apply suffix and width rules.
    #[regex(r"0[xX][0-9a-fA-F]*(u8|[lL])?")]
    #[regex(r"0[bB][01]*(u8|[lL])?")]
    #[regex(r"[0-9]+(u8|[lL])?")]
    Int,

    // String literal, raw text including quotes.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // Char literal.
    #[regex(r"'([^'\\\n]|\\.)'")]
    Char,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// A lexical error: a stretch of source no token matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub span: Span,
    pub text: String,
}

/// Lexer output: the token stream plus any lexical errors.
#[derive(Debug, Default)]
pub struct LexOutput {
    pub tokens: TokenList,
    pub errors: Vec<LexError>,
}

/// Lex source text into a `TokenList`. The stream always ends with `Eof`.
pub fn lex(source: &str) -> LexOutput {
    let mut out = LexOutput::default();
    let mut lexer = RawToken::lexer(source);
    let mut pending_comment: Option<Box<str>> = None;

    while let Some(result) = lexer.next() {
        let span = Span::from_range(lexer.span());
        let slice = lexer.slice();

        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                out.errors.push(LexError {
                    span,
                    text: slice.to_string(),
                });
                continue;
            }
        };

        match raw {
            RawToken::LineComment | RawToken::BlockComment => {
                pending_comment = Some(slice.into());
                continue;
            }
            _ => {}
        }

        let kind = convert(raw, slice);
        let mut token = Token::new(kind, span);
        token.comment = pending_comment.take();
        out.tokens.push(token);
    }

    let eof_offset = source.len() as u32;
    out.tokens
        .push(Token::new(TokenKind::Eof, Span::new(eof_offset, eof_offset)));
    out
}

fn convert(raw: RawToken, slice: &str) -> TokenKind {
    match raw {
        RawToken::Package => TokenKind::Package,
        RawToken::Import => TokenKind::Import,
        RawToken::Interface => TokenKind::Interface,
        RawToken::Parcelable => TokenKind::Parcelable,
        RawToken::Enum => TokenKind::Enum,
        RawToken::Oneway => TokenKind::Oneway,
        RawToken::Const => TokenKind::Const,
        RawToken::In => TokenKind::In,
        RawToken::Out => TokenKind::Out,
        RawToken::Inout => TokenKind::Inout,
        RawToken::CppHeader => TokenKind::CppHeader,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Dot => TokenKind::Dot,
        RawToken::At => TokenKind::At,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::Assign => TokenKind::Assign,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Shl => TokenKind::Shl,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Shr => TokenKind::Shr,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Bang => TokenKind::Bang,
        RawToken::Tilde => TokenKind::Tilde,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::Amp => TokenKind::Amp,
        RawToken::PipePipe => TokenKind::PipePipe,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Caret => TokenKind::Caret,
        RawToken::Float => TokenKind::Float(slice.to_string()),
        RawToken::Int => TokenKind::Int(slice.to_string()),
        RawToken::Str => TokenKind::Str(slice.to_string()),
        RawToken::Char => TokenKind::Char(unescape_char(slice)),
        RawToken::Ident => TokenKind::Ident(slice.to_string()),
        RawToken::LineComment | RawToken::BlockComment => {
            // Filtered before conversion.
            unreachable!("comments are trivia")
        }
    }
}

/// Unescape the body of a char literal (`'x'` or `'\n'`).
fn unescape_char(slice: &str) -> char {
    let body = &slice[1..slice.len() - 1];
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some('\\'), Some(esc)) => match esc {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            other => other,
        },
        (Some(c), _) => c,
        // The regex guarantees a non-empty body.
        (None, _) => unreachable!("empty char literal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidl_ir::TokenKind as T;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).tokens.iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn lexes_an_interface_skeleton() {
        let toks = kinds("package p; interface IFoo { void foo(); }");
        assert_eq!(
            toks,
            vec![
                T::Package,
                T::Ident("p".into()),
                T::Semicolon,
                T::Interface,
                T::Ident("IFoo".into()),
                T::LBrace,
                T::Ident("void".into()),
                T::Ident("foo".into()),
                T::LParen,
                T::RParen,
                T::Semicolon,
                T::RBrace,
                T::Eof,
            ]
        );
    }

    #[test]
    fn integer_literals_keep_raw_text() {
        let toks = kinds("1 0xff 0b101 3l 200u8");
        assert_eq!(
            toks,
            vec![
                T::Int("1".into()),
                T::Int("0xff".into()),
                T::Int("0b101".into()),
                T::Int("3l".into()),
                T::Int("200u8".into()),
                T::Eof,
            ]
        );
    }

    #[test]
    fn floats_and_strings() {
        let toks = kinds(r#"1.5f "Hello""#);
        assert_eq!(
            toks,
            vec![
                T::Float("1.5f".into()),
                T::Str("\"Hello\"".into()),
                T::Eof,
            ]
        );
    }

    #[test]
    fn char_unescaping() {
        let toks = kinds(r"'a' '\n'");
        assert_eq!(toks, vec![T::Char('a'), T::Char('\n'), T::Eof]);
    }

    #[test]
    fn shift_tokens() {
        let toks = kinds("1 << 2 >> 3");
        assert_eq!(
            toks,
            vec![
                T::Int("1".into()),
                T::Shl,
                T::Int("2".into()),
                T::Shr,
                T::Int("3".into()),
                T::Eof,
            ]
        );
    }

    #[test]
    fn comment_attaches_to_next_token() {
        let out = lex("// comment @hide\ninterface IFoo {}");
        let first = out.tokens.get(0).cloned();
        let token = first.unwrap_or_else(|| panic!("missing token"));
        assert_eq!(token.kind, T::Interface);
        assert_eq!(token.comment.as_deref(), Some("// comment @hide"));
    }

    #[test]
    fn block_comment_with_stars() {
        let out = lex("/* @hide **/ parcelable Data;");
        let token = out.tokens.get(0).cloned();
        let token = token.unwrap_or_else(|| panic!("missing token"));
        assert_eq!(token.comment.as_deref(), Some("/* @hide **/"));
        assert!(out.errors.is_empty());
    }

    #[test]
    fn ends_in_single_line_comment() {
        let out = lex("package p; interface IFoo {} // comment");
        assert!(out.errors.is_empty());
        let last = out.tokens.get(out.tokens.len() - 1).cloned();
        assert_eq!(last.map(|t| t.kind), Some(T::Eof));
    }

    #[test]
    fn invalid_characters_are_reported() {
        let out = lex("interface $ {}");
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].text, "$");
    }
}
