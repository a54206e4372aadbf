//! Preprocessed API indexes.
//!
//! A preprocessed file is a flat list of declarations, one per entry: the
//! kind keyword followed by a fully-qualified dotted name, for example
//! `parcelable android.graphics.Rect;`. Types registered this way carry no
//! body, resolve like any other type, and lose name-resolution ties to types
//! parsed from source.

use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_ir::{
    DefinedType, DefinedTypeKind, Document, EnumDecl, Interface, LineIndex, Location, Span,
    Token, TokenKind, Typenames, UnstructuredParcelable,
};
use std::sync::Arc;

/// Parse a preprocessed index and register its entries.
///
/// Returns false (after reporting) on the first malformed entry; these files
/// are machine-generated, so recovery is not worth the trouble.
pub fn load_preprocessed(
    text: &str,
    file: &Arc<str>,
    typenames: &mut Typenames,
    diagnostics: &mut Diagnostics,
) -> bool {
    let output = bidl_lexer::lex(text);
    let line_index = LineIndex::new(text);
    if !output.errors.is_empty() {
        for error in &output.errors {
            diagnostics.report(
                Diagnostic::error(
                    ErrorCode::E0001,
                    Location::from_span(file, &line_index, error.span),
                )
                .with_message(format!("unrecognized character(s) `{}`", error.text)),
            );
        }
        return false;
    }

    let mut entries = Entries {
        tokens: output.tokens.iter().collect(),
        pos: 0,
        file,
        line_index: &line_index,
    };

    let mut defined_types = Vec::new();
    loop {
        let token = entries.current();
        let kind = match &token.kind {
            TokenKind::Eof => break,
            TokenKind::Interface => DefinedTypeKind::Interface(Interface::default()),
            TokenKind::Parcelable => {
                DefinedTypeKind::Parcelable(UnstructuredParcelable::default())
            }
            TokenKind::Enum => DefinedTypeKind::Enum(EnumDecl::default()),
            other => {
                diagnostics.report(entries.unexpected(
                    "`interface`, `parcelable`, or `enum`",
                    other,
                    token.span,
                ));
                return false;
            }
        };
        entries.pos += 1;

        let Some((mut segments, span)) = entries.qualified_name(diagnostics) else {
            return false;
        };
        let token = entries.current();
        if token.kind != TokenKind::Semicolon {
            diagnostics.report(entries.unexpected("`;`", &token.kind, token.span));
            return false;
        }
        entries.pos += 1;

        // Last segment is the simple name; the rest is the package.
        let name = match segments.pop() {
            Some(name) => name,
            None => return false,
        };
        defined_types.push(DefinedType {
            comment: None,
            annotations: Vec::new(),
            name,
            package: segments,
            location: Location::from_span(file, &line_index, span),
            from_preprocessed: true,
            kind,
        });
    }

    tracing::debug!(file = %file, entries = defined_types.len(), "loaded preprocessed index");

    let document = Document {
        file: Arc::clone(file),
        package: Vec::new(),
        imports: Vec::new(),
        defined_types,
    };
    for canonical in typenames.add_document(document) {
        diagnostics.report(
            Diagnostic::error(ErrorCode::E2018, Location::generated(file))
                .with_message(format!("`{canonical}` is already defined")),
        );
    }
    true
}

struct Entries<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    file: &'a Arc<str>,
    line_index: &'a LineIndex,
}

impl Entries<'_> {
    /// The lexer guarantees a trailing `Eof`, so the clamp never fires in
    /// practice.
    fn current(&self) -> &Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn unexpected(&self, expected: &str, found: &TokenKind, span: Span) -> Diagnostic {
        Diagnostic::error(
            ErrorCode::E1001,
            Location::from_span(self.file, self.line_index, span),
        )
        .with_message(format!("expected {expected}, found {}", found.describe()))
    }

    fn qualified_name(&mut self, diagnostics: &mut Diagnostics) -> Option<(Vec<String>, Span)> {
        let mut segments = Vec::new();
        let mut span;
        match &self.current().kind {
            TokenKind::Ident(name) => {
                segments.push(name.clone());
                span = self.current().span;
                self.pos += 1;
            }
            other => {
                diagnostics.report(self.unexpected("an identifier", other, self.current().span));
                return None;
            }
        }
        while self.current().kind == TokenKind::Dot {
            self.pos += 1;
            match &self.current().kind {
                TokenKind::Ident(name) => {
                    segments.push(name.clone());
                    span = span.merge(self.current().span);
                    self.pos += 1;
                }
                other => {
                    diagnostics
                        .report(self.unexpected("an identifier", other, self.current().span));
                    return None;
                }
            }
        }
        Some((segments, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidl_diagnostic::Diagnostics;
    use bidl_ir::Typenames;
    use pretty_assertions::assert_eq;

    fn load(text: &str) -> (Typenames, Diagnostics, bool) {
        let mut typenames = Typenames::new();
        let mut diagnostics = Diagnostics::new();
        let file: Arc<str> = Arc::from("preprocessed.bidl");
        let ok = load_preprocessed(text, &file, &mut typenames, &mut diagnostics);
        (typenames, diagnostics, ok)
    }

    #[test]
    fn registers_each_entry_under_its_canonical_name() {
        let (typenames, diagnostics, ok) = load(
            "parcelable android.graphics.Rect;\n\
             interface android.os.IServiceManager;\n\
             enum android.app.Mode;\n",
        );
        assert!(ok, "{}", diagnostics.render());
        assert!(diagnostics.is_empty());

        let rect = typenames.get("android.graphics.Rect");
        assert!(matches!(
            rect.map(|t| &t.kind),
            Some(DefinedTypeKind::Parcelable(_))
        ));
        assert_eq!(rect.map(|t| t.from_preprocessed), Some(true));
        assert!(typenames.get("android.os.IServiceManager").is_some());
        assert!(matches!(
            typenames.get("android.app.Mode").map(|t| &t.kind),
            Some(DefinedTypeKind::Enum(_))
        ));
    }

    #[test]
    fn malformed_entries_abort_the_load() {
        let (_, diagnostics, ok) = load("parcelable android..Rect;");
        assert!(!ok);
        assert!(diagnostics.has_errors());

        let (_, diagnostics, ok) = load("typedef Foo;");
        assert!(!ok);
        assert!(diagnostics
            .render()
            .contains("expected `interface`, `parcelable`, or `enum`"));
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let (_, diagnostics, ok) = load("parcelable a.Rect interface b.IFoo;");
        assert!(!ok);
        assert!(diagnostics.render().contains("expected `;`"));
    }

    #[test]
    fn preprocessed_entries_lose_to_direct_parses() {
        let mut typenames = Typenames::new();
        let mut diagnostics = Diagnostics::new();
        let index: Arc<str> = Arc::from("preprocessed.bidl");
        assert!(load_preprocessed(
            "parcelable p.Data;",
            &index,
            &mut typenames,
            &mut diagnostics
        ));

        let source: Arc<str> = Arc::from("p/Data.bidl");
        assert!(crate::load_source(
            "package p; parcelable Data { int count; }",
            &source,
            &mut typenames,
            &mut diagnostics
        ));
        assert!(!diagnostics.has_errors(), "{}", diagnostics.render());
        assert_eq!(
            typenames.get("p.Data").map(|t| t.from_preprocessed),
            Some(false)
        );
    }
}
