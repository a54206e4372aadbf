//! Tokens and `TokenList` for lexer output.

use crate::Span;
use std::fmt;

/// Token kind for the bidl surface syntax.
///
/// Builtin type names (`int`, `String`, `List`, ...) are ordinary
/// identifiers; only structural words are keywords.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    Package,
    Import,
    Interface,
    Parcelable,
    Enum,
    Oneway,
    Const,
    In,
    Out,
    Inout,
    CppHeader,
    True,
    False,

    /// Identifier (including builtin type names).
    Ident(String),
    /// Integer literal, raw text kept for width/suffix analysis.
    Int(String),
    /// Float literal, raw text kept verbatim.
    Float(String),
    /// Character literal, already unescaped.
    Char(char),
    /// String literal, raw text including the surrounding quotes.
    Str(String),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Assign,
    At,

    // Operators (also used as generic brackets: Lt/Gt)
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    Shl,
    Shr,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,

    Eof,
}

impl TokenKind {
    /// Human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Int(text) | TokenKind::Float(text) => format!("literal `{text}`"),
            TokenKind::Char(c) => format!("literal `'{c}'`"),
            TokenKind::Str(text) => format!("literal `{text}`"),
            TokenKind::Eof => "end of file".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    /// Source symbol for punctuation/keyword kinds.
    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Package => "package",
            TokenKind::Import => "import",
            TokenKind::Interface => "interface",
            TokenKind::Parcelable => "parcelable",
            TokenKind::Enum => "enum",
            TokenKind::Oneway => "oneway",
            TokenKind::Const => "const",
            TokenKind::In => "in",
            TokenKind::Out => "out",
            TokenKind::Inout => "inout",
            TokenKind::CppHeader => "cpp_header",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Assign => "=",
            TokenKind::At => "@",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::Amp => "&",
            TokenKind::AmpAmp => "&&",
            TokenKind::Pipe => "|",
            TokenKind::PipePipe => "||",
            TokenKind::Caret => "^",
            _ => "",
        }
    }
}

/// A token with its source span and the comment that immediately precedes it.
///
/// Comment attachment mirrors how declarations pick up their doc comment:
/// the last comment directly before a declaration's first token belongs to
/// that declaration (used for `@hide` propagation through API dumps).
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub comment: Option<Box<str>>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token {
            kind,
            span,
            comment: None,
        }
    }
}

/// Lexed token stream. The last token is always `Eof`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Mutable access, used by the parser to split a `>>` token into two
    /// `>` when closing nested generic argument lists.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Token> {
        self.tokens.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
