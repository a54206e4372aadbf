//! Defined types and their members.

use crate::{ParseResult, Parser};
use bidl_diagnostic::{Diagnostic, ErrorCode};
use bidl_ir::{
    parse_integer_literal, Annotation, Argument, ConstantDecl, DefinedType, DefinedTypeKind,
    Direction, EnumDecl, Enumerator, Interface, Method, StructuredParcelable, TokenKind,
    UnstructuredParcelable, VariableDecl,
};

impl Parser<'_> {
    /// defined_type := annotation* (interface | parcelable | enum)
    ///
    /// The doc comment belongs to the declaration's first token, which is the
    /// `@` of the leading annotation when there is one.
    pub(crate) fn defined_type(&mut self, package: &[String]) -> ParseResult<DefinedType> {
        let comment = self.cursor.current_comment();
        let annotations = self.annotation_list()?;
        match self.cursor.current_kind() {
            TokenKind::Interface => self.interface(comment, annotations, package),
            TokenKind::Parcelable => self.parcelable(comment, annotations, package),
            TokenKind::Enum => self.enum_decl(comment, annotations, package),
            _ => Err(self.unexpected("`interface`, `parcelable`, or `enum`")),
        }
    }

    /// interface := 'interface' ident '{' (constant | method)* '}'
    fn interface(
        &mut self,
        comment: Option<String>,
        annotations: Vec<Annotation>,
        package: &[String],
    ) -> ParseResult<DefinedType> {
        self.expect(TokenKind::Interface)?;
        let (name, name_span) = self.expect_ident()?;
        let location = self.location(name_span);
        self.expect(TokenKind::LBrace)?;

        let mut interface = Interface::default();
        while !self.cursor.check(&TokenKind::RBrace) {
            if self.cursor.is_at_end() {
                return Err(self.unexpected("`}`"));
            }
            if self.cursor.check(&TokenKind::Const) {
                interface.constants.push(self.constant_decl()?);
            } else {
                interface.methods.push(self.method()?);
            }
        }
        self.cursor.advance();

        Ok(DefinedType {
            comment,
            annotations,
            name,
            package: package.to_vec(),
            location,
            from_preprocessed: false,
            kind: DefinedTypeKind::Interface(interface),
        })
    }

    /// constant := 'const' type ident '=' const_expr ';'
    fn constant_decl(&mut self) -> ParseResult<ConstantDecl> {
        let comment = self.cursor.current_comment();
        let location = self.current_location();
        self.expect(TokenKind::Const)?;
        let ty = self.type_specifier()?;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.const_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(ConstantDecl {
            comment,
            ty,
            name,
            value,
            location,
        })
    }

    /// method := 'oneway'? type ident '(' arguments ')' ('=' INT)? ';'
    fn method(&mut self) -> ParseResult<Method> {
        let comment = self.cursor.current_comment();
        let location = self.current_location();
        let oneway = self.cursor.eat(&TokenKind::Oneway);
        let ret = self.type_specifier()?;
        let (name, _) = self.expect_ident()?;

        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.cursor.check(&TokenKind::RParen) {
            loop {
                args.push(self.argument()?);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let explicit_id = if self.cursor.eat(&TokenKind::Assign) {
            Some(self.transaction_id()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Method::new(
            comment,
            oneway,
            ret,
            name,
            args,
            explicit_id,
            location,
        ))
    }

    /// argument := ('in' | 'out' | 'inout')? type ident
    fn argument(&mut self) -> ParseResult<Argument> {
        let location = self.current_location();
        let (direction, direction_explicit) = if self.cursor.eat(&TokenKind::In) {
            (Direction::In, true)
        } else if self.cursor.eat(&TokenKind::Out) {
            (Direction::Out, true)
        } else if self.cursor.eat(&TokenKind::Inout) {
            (Direction::Inout, true)
        } else {
            (Direction::In, false)
        };
        let ty = self.type_specifier()?;
        let (name, _) = self.expect_ident()?;
        Ok(Argument {
            direction,
            direction_explicit,
            ty,
            name,
            location,
        })
    }

    /// An explicit transaction id. Range checking against the user-assignable
    /// window happens later; here the literal only has to fit `int`.
    fn transaction_id(&mut self) -> ParseResult<i32> {
        let TokenKind::Int(text) = self.cursor.current_kind() else {
            return Err(self.unexpected("a transaction id"));
        };
        let text = text.clone();
        let location = self.current_location();
        self.cursor.advance();
        match parse_integer_literal(&text) {
            Ok((value, _)) => i32::try_from(value).map_err(|_| {
                Diagnostic::error(ErrorCode::E1003, location)
                    .with_message(format!("transaction id `{text}` does not fit in `int`"))
            }),
            Err(err) => Err(Diagnostic::error(ErrorCode::E1003, location)
                .with_message(format!("invalid integer literal `{text}`: {err}"))),
        }
    }

    /// The three parcelable declaration forms:
    ///
    ///   parcelable Name ';'                      unstructured
    ///   parcelable Name '<' params '>' ';'       unstructured, generic
    ///   parcelable Name 'cpp_header' STR ';'     unstructured, native header
    ///   parcelable Name '{' fields '}'           structured
    ///
    /// A dotted name is legal only for the unstructured forms and extends
    /// the file's package.
    fn parcelable(
        &mut self,
        comment: Option<String>,
        annotations: Vec<Annotation>,
        package: &[String],
    ) -> ParseResult<DefinedType> {
        self.expect(TokenKind::Parcelable)?;
        let (mut segments, name_span) = self.qualified_name()?;
        let location = self.location(name_span);
        let name = segments
            .pop()
            .unwrap_or_else(|| panic!("qualified name has at least one segment"));
        let dotted = !segments.is_empty();
        let mut package = package.to_vec();
        package.append(&mut segments);

        let kind = if self.cursor.eat(&TokenKind::Semicolon) {
            DefinedTypeKind::Parcelable(UnstructuredParcelable::default())
        } else if self.cursor.check(&TokenKind::Lt) {
            self.cursor.advance();
            let mut params = Vec::new();
            loop {
                let (param, _) = self.expect_ident()?;
                params.push(param);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt)?;
            self.expect(TokenKind::Semicolon)?;
            DefinedTypeKind::Parcelable(UnstructuredParcelable {
                cpp_header: None,
                type_params: Some(params),
            })
        } else if self.cursor.eat(&TokenKind::CppHeader) {
            let header = self.string_literal()?;
            self.expect(TokenKind::Semicolon)?;
            DefinedTypeKind::Parcelable(UnstructuredParcelable {
                cpp_header: Some(header),
                type_params: None,
            })
        } else if self.cursor.check(&TokenKind::LBrace) {
            if dotted {
                return Err(Diagnostic::error(ErrorCode::E1002, location)
                    .with_message("structured parcelable name must be a simple identifier"));
            }
            self.cursor.advance();
            let mut fields = Vec::new();
            while !self.cursor.check(&TokenKind::RBrace) {
                if self.cursor.is_at_end() {
                    return Err(self.unexpected("`}`"));
                }
                fields.push(self.field()?);
            }
            self.cursor.advance();
            DefinedTypeKind::StructuredParcelable(StructuredParcelable { fields })
        } else {
            return Err(self.unexpected("`;`, `<`, `cpp_header`, or `{`"));
        };

        Ok(DefinedType {
            comment,
            annotations,
            name,
            package,
            location,
            from_preprocessed: false,
            kind,
        })
    }

    /// field := type ident ('=' const_expr)? ';'
    fn field(&mut self) -> ParseResult<VariableDecl> {
        let comment = self.cursor.current_comment();
        let location = self.current_location();
        let ty = self.type_specifier()?;
        let (name, _) = self.expect_ident()?;
        let default = if self.cursor.eat(&TokenKind::Assign) {
            Some(self.const_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(VariableDecl {
            comment,
            ty,
            name,
            default,
            location,
        })
    }

    /// enum := 'enum' ident '{' enumerator (',' enumerator)* ','? '}'
    ///
    /// Values are optional; the auto-fill pass supplies missing ones. The
    /// backing type starts at its default and is set from `@Backing` later.
    fn enum_decl(
        &mut self,
        comment: Option<String>,
        annotations: Vec<Annotation>,
        package: &[String],
    ) -> ParseResult<DefinedType> {
        self.expect(TokenKind::Enum)?;
        let (name, name_span) = self.expect_ident()?;
        let location = self.location(name_span);
        self.expect(TokenKind::LBrace)?;

        let mut decl = EnumDecl::default();
        while !self.cursor.check(&TokenKind::RBrace) {
            let comment = self.cursor.current_comment();
            let enum_location = self.current_location();
            let (enum_name, _) = self.expect_ident()?;
            let value = if self.cursor.eat(&TokenKind::Assign) {
                Some(self.const_expr()?)
            } else {
                None
            };
            decl.enumerators.push(Enumerator {
                comment,
                name: enum_name,
                value,
                location: enum_location,
            });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(DefinedType {
            comment,
            annotations,
            name,
            package: package.to_vec(),
            location,
            from_preprocessed: false,
            kind: DefinedTypeKind::Enum(decl),
        })
    }
}
