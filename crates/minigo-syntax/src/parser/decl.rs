//! Declaration parsing.

use super::{FuncState, ParseResult, Parser};
use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_top_level_decl(&mut self, decls: &mut Vec<Decl>) -> ParseResult<()> {
        match self.current().kind {
            TokenKind::Var => decls.push(Decl::Var(self.parse_var_decl()?)),
            TokenKind::Const => decls.push(Decl::Const(self.parse_const_decl()?)),
            TokenKind::Type => {
                for decl in self.parse_type_decl()? {
                    decls.push(Decl::Type(decl));
                }
            }
            TokenKind::Func => decls.push(Decl::Func(self.parse_func_decl()?)),
            TokenKind::Import => {
                return Err(SyntaxError::UnexpectedToken
                    .at_with_message(self.current().span, "imports must precede other declarations"))
            }
            _ => return Err(self.error_expected("declaration")),
        }
        self.expect_semi()
    }

    /// `var spec` or `var ( spec; ... )`
    pub(super) fn parse_var_decl(&mut self) -> ParseResult<VarDecl> {
        let start = self.current().span.start;
        self.expect(TokenKind::Var)?;
        let mut specs = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                specs.push(self.parse_var_spec()?);
                self.expect_semi()?;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_var_spec()?);
        }
        Ok(VarDecl {
            specs,
            span: self.span_from(start),
        })
    }

    /// `a, b T = x, y`
    pub(super) fn parse_var_spec(&mut self) -> ParseResult<VarSpec> {
        let start = self.current().span.start;
        let names = self.parse_ident_list()?;
        let ty = if self.at(TokenKind::Assign) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let values = if self.eat(TokenKind::Assign) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        if ty.is_none() && values.is_empty() {
            return Err(SyntaxError::ExpectedType.at(self.current().span));
        }
        if values.len() > 1 && values.len() != names.len() {
            return Err(SyntaxError::AssignmentCountMismatch.at_with_message(
                self.span_from(start),
                format!(
                    "assignment count mismatch: {} variables but {} values",
                    names.len(),
                    values.len()
                ),
            ));
        }
        let vars = vec![None; names.len()];
        Ok(VarSpec {
            names,
            ty,
            values,
            vars,
            span: self.span_from(start),
        })
    }

    /// `const X = e` or a group. Inside a group an omitted value repeats the
    /// previous expression and type, with `iota` advanced.
    pub(super) fn parse_const_decl(&mut self) -> ParseResult<ConstDecl> {
        let start = self.current().span.start;
        self.expect(TokenKind::Const)?;
        let mut specs: Vec<ConstSpec> = Vec::new();
        if self.eat(TokenKind::LParen) {
            let mut iota = 0;
            while !self.at(TokenKind::RParen) {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                let spec = self.parse_const_spec(iota, specs.last())?;
                specs.push(spec);
                iota += 1;
                self.expect_semi()?;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_const_spec(0, None)?);
        }
        Ok(ConstDecl {
            specs,
            span: self.span_from(start),
        })
    }

    fn parse_const_spec(&mut self, iota: i64, prev: Option<&ConstSpec>) -> ParseResult<ConstSpec> {
        let start = self.current().span.start;
        let name = self.parse_ident()?;
        let explicit_ty = if self.at_any(&[TokenKind::Assign, TokenKind::Semicolon, TokenKind::RParen]) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let (ty, value) = if self.eat(TokenKind::Assign) {
            (explicit_ty, self.parse_expr()?)
        } else {
            match prev {
                Some(prev) => (
                    explicit_ty.or_else(|| prev.ty.clone()),
                    prev.value.clone(),
                ),
                None => return Err(SyntaxError::MissingConstValue.at(name.span)),
            }
        };
        Ok(ConstSpec {
            name,
            ty,
            value,
            iota,
            id: None,
            span: self.span_from(start),
        })
    }

    /// `type T U` or `type ( T U; ... )`
    pub(super) fn parse_type_decl(&mut self) -> ParseResult<Vec<TypeDecl>> {
        self.expect(TokenKind::Type)?;
        let mut decls = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                decls.push(self.parse_type_spec()?);
                self.expect_semi()?;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            decls.push(self.parse_type_spec()?);
        }
        Ok(decls)
    }

    fn parse_type_spec(&mut self) -> ParseResult<TypeDecl> {
        let start = self.current().span.start;
        let name = self.parse_ident()?;
        let ty = self.parse_type()?;
        Ok(TypeDecl {
            name,
            ty,
            id: None,
            span: self.span_from(start),
        })
    }

    /// `func [(recv T)] name(params) results [body]`
    fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        let start = self.current().span.start;
        self.expect(TokenKind::Func)?;

        let receiver = if self.at(TokenKind::LParen) {
            let recv_start = self.advance().span.start;
            let name = self.parse_ident()?;
            let ty = self.parse_type()?;
            self.expect(TokenKind::RParen)?;
            Some(Param {
                name,
                ty,
                variadic: false,
                var: None,
                span: self.span_from(recv_start),
            })
        } else {
            None
        };

        let name = self.parse_ident()?;
        let sig = self.parse_func_sig()?;

        let defer_label = self.ctx.new_label();
        let func_name = self.ctx.interner.name(name.symbol).to_owned();
        let saved = self.func.replace(FuncState {
            name: func_name,
            defer_count: 0,
        });
        let body = if self.at(TokenKind::LBrace) {
            Some(self.parse_block())
        } else {
            None
        };
        let state = std::mem::replace(&mut self.func, saved);
        let body = body.transpose()?;
        let defer_count = state.map_or(0, |s| s.defer_count);

        Ok(FuncDecl {
            receiver,
            name,
            sig,
            body,
            defer_label,
            defer_count,
            func: None,
            span: self.span_from(start),
        })
    }

    /// `(a, b int, rest ...string) (int, error)`
    pub(super) fn parse_func_sig(&mut self) -> ParseResult<FuncSig> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let start = self.current().span.start;
            let names = self.parse_ident_list()?;
            let variadic = self.eat(TokenKind::Ellipsis);
            let mut ty = self.parse_type()?;
            if variadic {
                if names.len() != 1 || !self.at(TokenKind::RParen) {
                    return Err(SyntaxError::UnexpectedToken.at_with_message(
                        self.span_from(start),
                        "can only use ... with final parameter",
                    ));
                }
                let span = ty.span;
                ty = TypeExpr::new(TypeExprKind::Slice(Box::new(ty)), span);
            }
            let span = self.span_from(start);
            for name in names {
                params.push(Param {
                    name,
                    ty: ty.clone(),
                    variadic,
                    var: None,
                    span,
                });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let results = if self.eat(TokenKind::LParen) {
            let mut results = Vec::new();
            while !self.at(TokenKind::RParen) {
                results.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            results
        } else if self.at_type_start() {
            vec![self.parse_type()?]
        } else {
            Vec::new()
        };

        Ok(FuncSig { params, results })
    }

    pub(super) fn parse_block(&mut self) -> ParseResult<Block> {
        let start = self.current().span.start;
        self.expect(TokenKind::LBrace)?;
        let stmts = self.parse_stmt_list()?;
        self.expect(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: self.span_from(start),
        })
    }
}
