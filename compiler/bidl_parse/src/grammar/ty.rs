//! Annotations and type specifiers.

use crate::{ParseResult, Parser};
use bidl_diagnostic::{Diagnostic, ErrorCode};
use bidl_ir::{Annotation, AnnotationKind, AnnotationParam, TokenKind, TypeSpecifier};

impl Parser<'_> {
    pub(crate) fn annotation_list(&mut self) -> ParseResult<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.cursor.check(&TokenKind::At) {
            annotations.push(self.annotation()?);
        }
        Ok(annotations)
    }

    /// annotation := '@' ident ('(' param '=' const_expr (',' ...)* ')')?
    ///
    /// The annotation name and its parameter names are schema-checked here;
    /// parameter value types need constant evaluation and are checked later.
    fn annotation(&mut self) -> ParseResult<Annotation> {
        let at_span = self.expect(TokenKind::At)?;
        let (name, name_span) = self.expect_ident()?;
        let location = self.location(at_span.merge(name_span));
        let Some(kind) = AnnotationKind::from_name(&name) else {
            return Err(Diagnostic::error(ErrorCode::E1006, location)
                .with_message(format!("unknown annotation `@{name}`")));
        };

        let mut annotation = Annotation::new(kind, location);
        if self.cursor.eat(&TokenKind::LParen) {
            if !self.cursor.check(&TokenKind::RParen) {
                loop {
                    let (param, param_span) = self.expect_ident()?;
                    let param_location = self.location(param_span);
                    self.expect(TokenKind::Assign)?;
                    let value = self.const_expr()?;
                    if !kind.schema().iter().any(|(legal, _)| *legal == param) {
                        return Err(Diagnostic::error(ErrorCode::E1007, param_location)
                            .with_message(format!(
                                "annotation `@{}` has no parameter `{param}`",
                                kind.name()
                            )));
                    }
                    if annotation.params.iter().any(|p| p.name == param) {
                        return Err(Diagnostic::error(ErrorCode::E1008, param_location)
                            .with_message(format!(
                                "duplicate parameter `{param}` on `@{}`",
                                kind.name()
                            )));
                    }
                    annotation.params.push(AnnotationParam { name: param, value });
                    if !self.cursor.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen)?;
        }
        Ok(annotation)
    }

    /// type := annotation* qualified_name ('<' type (',' type)* '>')? '[]'?
    pub(crate) fn type_specifier(&mut self) -> ParseResult<TypeSpecifier> {
        let annotations = self.annotation_list()?;
        let (segments, span) = self.qualified_name()?;
        let mut ty = TypeSpecifier::new(segments.join("."), self.location(span));
        ty.annotations = annotations;
        if self.cursor.check(&TokenKind::Lt) {
            ty.type_args = self.type_args()?;
        }
        if self.cursor.eat(&TokenKind::LBracket) {
            self.expect(TokenKind::RBracket)?;
            ty.is_array = true;
        }
        Ok(ty)
    }

    fn type_args(&mut self) -> ParseResult<Vec<TypeSpecifier>> {
        self.expect(TokenKind::Lt)?;
        let mut args = Vec::new();
        loop {
            args.push(self.type_specifier()?);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.close_generic()?;
        Ok(args)
    }

    /// Close a generic argument list. A `>>` closing two nested lists at once
    /// is split in place; the remaining `>` closes the outer list.
    fn close_generic(&mut self) -> ParseResult<()> {
        if self.cursor.eat(&TokenKind::Gt) {
            Ok(())
        } else if self.cursor.check(&TokenKind::Shr) {
            self.cursor.split_shr();
            Ok(())
        } else {
            Err(self.unexpected("`>`"))
        }
    }
}
