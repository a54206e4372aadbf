//! Recursive-descent parser for bidl source files.
//!
//! [`parse_document`] turns one source file into a [`Document`], allocating
//! constant expressions into the shared [`ConstArena`] and reporting problems
//! into a [`Diagnostics`] collector. Syntax errors abort the document (the
//! rest of a malformed file is rarely parseable in a useful way); malformed
//! literals are reported but poison only the expression that contains them.

mod cursor;
mod grammar;

use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_ir::{ConstArena, Document, Import, LineIndex, Location, Span, TokenKind};
use cursor::Cursor;
use std::sync::Arc;

pub(crate) type ParseResult<T> = Result<T, Diagnostic>;

/// Parse one source file.
///
/// Returns `None` when the file could not be parsed at all; the cause is in
/// the collector. A returned document may still carry diagnostics (extra
/// defined types, malformed literals).
pub fn parse_document(
    source: &str,
    file: &Arc<str>,
    arena: &mut ConstArena,
    diagnostics: &mut Diagnostics,
) -> Option<Document> {
    let lexed = bidl_lexer::lex(source);
    let line_index = LineIndex::new(source);
    if !lexed.errors.is_empty() {
        for err in &lexed.errors {
            diagnostics.report(
                Diagnostic::error(
                    ErrorCode::E0001,
                    Location::from_span(file, &line_index, err.span),
                )
                .with_message(format!("unrecognized character(s) `{}`", err.text)),
            );
        }
        return None;
    }

    let mut parser = Parser {
        cursor: Cursor::new(lexed.tokens),
        file: Arc::clone(file),
        line_index,
        arena,
        diagnostics: &mut *diagnostics,
    };
    match parser.document() {
        Ok(document) => {
            tracing::debug!(
                file = %file,
                types = document.defined_types.len(),
                "parsed document"
            );
            Some(document)
        }
        Err(diag) => {
            diagnostics.report(diag);
            None
        }
    }
}

/// Parser state for one source file.
pub(crate) struct Parser<'a> {
    pub(crate) cursor: Cursor,
    pub(crate) file: Arc<str>,
    pub(crate) line_index: LineIndex,
    pub(crate) arena: &'a mut ConstArena,
    pub(crate) diagnostics: &'a mut Diagnostics,
}

impl Parser<'_> {
    /// document := package? import* defined_type*
    fn document(&mut self) -> ParseResult<Document> {
        let package = if self.cursor.eat(&TokenKind::Package) {
            let (segments, _) = self.qualified_name()?;
            self.expect(TokenKind::Semicolon)?;
            segments
        } else {
            Vec::new()
        };

        let mut imports = Vec::new();
        while self.cursor.check(&TokenKind::Import) {
            let location = self.current_location();
            self.cursor.advance();
            let (segments, _) = self.qualified_name()?;
            self.expect(TokenKind::Semicolon)?;
            imports.push(Import {
                path: segments.join("."),
                location,
            });
        }

        let mut defined_types = Vec::new();
        while !self.cursor.is_at_end() {
            defined_types.push(self.defined_type(&package)?);
        }

        // One defined type per file. Extras parse fine, so they are reported
        // without aborting: downstream passes can still look at them.
        if defined_types.is_empty() {
            self.diagnostics.report(
                Diagnostic::error(ErrorCode::E1005, self.current_location())
                    .with_message("expected a type declaration"),
            );
        } else if defined_types.len() > 1 {
            let first = defined_types[0].canonical_name();
            for extra in &defined_types[1..] {
                self.diagnostics.report(
                    Diagnostic::error(ErrorCode::E1004, extra.location.clone())
                        .with_message(format!(
                            "`{}` must be declared in its own file",
                            extra.name
                        ))
                        .with_note(format!("this file already declares `{first}`")),
                );
            }
        }

        Ok(Document {
            file: Arc::clone(&self.file),
            package,
            imports,
            defined_types,
        })
    }

    /// ident ('.' ident)*, returning the segments and the covering span.
    pub(crate) fn qualified_name(&mut self) -> ParseResult<(Vec<String>, Span)> {
        let (first, mut span) = self.expect_ident()?;
        let mut segments = vec![first];
        while self.cursor.eat(&TokenKind::Dot) {
            let (next, next_span) = self.expect_ident()?;
            span = span.merge(next_span);
            segments.push(next);
        }
        Ok((segments, span))
    }

    pub(crate) fn location(&self, span: Span) -> Location {
        Location::from_span(&self.file, &self.line_index, span)
    }

    pub(crate) fn current_location(&self) -> Location {
        self.location(self.cursor.current_span())
    }

    /// E1001 at the current token.
    pub(crate) fn unexpected(&self, expected: &str) -> Diagnostic {
        Diagnostic::error(ErrorCode::E1001, self.current_location()).with_message(format!(
            "expected {expected}, found {}",
            self.cursor.current_kind().describe()
        ))
    }

    /// Consume a payload-free token kind or fail with E1001.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Span> {
        if self.cursor.check(&kind) {
            let span = self.cursor.current_span();
            self.cursor.advance();
            Ok(span)
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    /// Consume an identifier or fail with E1002.
    pub(crate) fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        if let TokenKind::Ident(name) = self.cursor.current_kind() {
            let name = name.clone();
            let span = self.cursor.current_span();
            self.cursor.advance();
            return Ok((name, span));
        }
        Err(
            Diagnostic::error(ErrorCode::E1002, self.current_location()).with_message(format!(
                "expected identifier, found {}",
                self.cursor.current_kind().describe()
            )),
        )
    }

    /// Consume a string literal, returning its unquoted body.
    pub(crate) fn string_literal(&mut self) -> ParseResult<String> {
        if let TokenKind::Str(raw) = self.cursor.current_kind() {
            let body = raw[1..raw.len() - 1].to_string();
            self.cursor.advance();
            return Ok(body);
        }
        Err(self.unexpected("a string literal"))
    }
}
