//! Type expression parsing.

use super::{ParseResult, Parser};
use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// True if the current token can begin a type.
    pub(super) fn at_type_start(&self) -> bool {
        self.at_any(&[
            TokenKind::Ident,
            TokenKind::Star,
            TokenKind::LBracket,
            TokenKind::Map,
            TokenKind::Struct,
            TokenKind::Interface,
            TokenKind::LParen,
            TokenKind::Func,
            TokenKind::Chan,
        ])
    }

    pub(super) fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current().span.start;
        match self.current().kind {
            TokenKind::Ident => {
                let rel = self.parse_type_name()?;
                Ok(TypeExpr::new(TypeExprKind::Name(rel), self.span_from(start)))
            }
            TokenKind::Star => {
                self.advance();
                let elem = self.parse_type()?;
                Ok(TypeExpr::new(
                    TypeExprKind::Pointer(Box::new(elem)),
                    self.span_from(start),
                ))
            }
            TokenKind::LBracket => {
                self.advance();
                if self.eat(TokenKind::RBracket) {
                    let elem = self.parse_type()?;
                    return Ok(TypeExpr::new(
                        TypeExprKind::Slice(Box::new(elem)),
                        self.span_from(start),
                    ));
                }
                if self.at(TokenKind::Ellipsis) {
                    return Err(self.not_yet_implemented("[...]T array length"));
                }
                let len = self.with_composite_lit(|p| p.parse_expr())?;
                self.expect(TokenKind::RBracket)?;
                let elem = self.parse_type()?;
                Ok(TypeExpr::new(
                    TypeExprKind::Array {
                        len: Box::new(len),
                        elem: Box::new(elem),
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Map => {
                self.advance();
                self.expect(TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.parse_type()?;
                Ok(TypeExpr::new(
                    TypeExprKind::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            TokenKind::LParen => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(TokenKind::RParen)?;
                Ok(ty)
            }
            TokenKind::Func => Err(self.not_yet_implemented("function types")),
            TokenKind::Chan | TokenKind::Arrow => Err(self.not_yet_implemented("channel types")),
            _ => Err(SyntaxError::ExpectedType.at_with_message(
                self.current().span,
                format!("expected type, found {}", self.current().kind.as_str()),
            )),
        }
    }

    /// `T` or `pkg.T` when `pkg` is an imported package name.
    pub(super) fn parse_type_name(&mut self) -> ParseResult<Relation> {
        let first = self.parse_ident()?;
        if self.imported.contains(&first.symbol) && self.at(TokenKind::Dot) {
            self.advance();
            let name = self.parse_ident()?;
            return Ok(Relation::new(name, Some(first)));
        }
        Ok(Relation::new(first, None))
    }

    fn parse_struct_type(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current().span.start;
        self.expect(TokenKind::Struct)?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            if !self.at(TokenKind::Ident) {
                return Err(SyntaxError::ExpectedStructField.at(self.current().span));
            }
            let names = self.parse_ident_list()?;
            let ty = self.parse_type()?;
            for name in names {
                fields.push(FieldDecl {
                    name,
                    ty: ty.clone(),
                });
            }
            self.expect_semi()?;
        }
        self.expect(TokenKind::RBrace)?;
        Ok(TypeExpr::new(TypeExprKind::Struct(fields), self.span_from(start)))
    }

    fn parse_interface_type(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current().span.start;
        self.expect(TokenKind::Interface)?;
        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            if !self.at(TokenKind::Ident) {
                return Err(SyntaxError::ExpectedInterfaceMethod.at(self.current().span));
            }
            let name = self.parse_ident()?;
            if !self.at(TokenKind::LParen) {
                return Err(self.not_yet_implemented("embedded interfaces"));
            }
            let sig = self.parse_func_sig()?;
            methods.push(MethodSpec { name, sig });
            self.expect_semi()?;
        }
        self.expect(TokenKind::RBrace)?;
        Ok(TypeExpr::new(
            TypeExprKind::Interface(methods),
            self.span_from(start),
        ))
    }
}
