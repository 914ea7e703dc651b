//! Expression parsing using precedence climbing.

use minigo_common::BytePos;

use super::{ParseResult, Parser};
use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::{TokenKind, TokenValue};

/// Binding power of a binary operator token, or `None` if the token does
/// not continue a binary expression.
fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::OrOr => (BinaryOp::OrOr, 1),
        TokenKind::AndAnd => (BinaryOp::AndAnd, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::NotEq => (BinaryOp::Ne, 3),
        TokenKind::Lt => (BinaryOp::Lt, 3),
        TokenKind::LtEq => (BinaryOp::Le, 3),
        TokenKind::Gt => (BinaryOp::Gt, 3),
        TokenKind::GtEq => (BinaryOp::Ge, 3),
        TokenKind::Plus => (BinaryOp::Add, 4),
        TokenKind::Minus => (BinaryOp::Sub, 4),
        TokenKind::Slash => (BinaryOp::Div, 5),
        TokenKind::Percent => (BinaryOp::Rem, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        _ => return None,
    })
}

fn is_bitwise_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Amp
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::Shl
            | TokenKind::Shr
            | TokenKind::AmpCaret
    )
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_binary_expr(1)
    }

    pub(super) fn parse_expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let start = self.current().span.start;
        let mut left = self.parse_unary_expr()?;
        loop {
            let kind = self.current().kind;
            if is_bitwise_op(kind) {
                return Err(self.not_yet_implemented(&format!("operator {}", kind.as_str())));
            }
            let Some((op, prec)) = binary_op(kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary_expr(prec + 1)?;
            left = Expr::new(
                ExprKind::Binary(Box::new(BinaryExpr { op, left, right })),
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current().span.start;
        let op = match self.current().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Amp => UnaryOp::Addr,
            TokenKind::Star => UnaryOp::Deref,
            TokenKind::Plus => {
                self.advance();
                return self.parse_unary_expr();
            }
            TokenKind::Caret => return Err(self.not_yet_implemented("bitwise complement")),
            TokenKind::Arrow => return Err(self.not_yet_implemented("channel receive")),
            _ => return self.parse_primary_expr(),
        };
        self.advance();
        let operand = self.parse_unary_expr()?;
        Ok(Expr::new(
            ExprKind::Unary(op, Box::new(operand)),
            self.span_from(start),
        ))
    }

    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current().span.start;
        let operand = self.parse_operand()?;
        self.parse_postfix(operand, start)
    }

    fn parse_operand(&mut self) -> ParseResult<Expr> {
        let start = self.current().span.start;
        match self.current().kind {
            TokenKind::IntLit | TokenKind::CharLit | TokenKind::StringLit => {
                let token = self.advance();
                let kind = match token.value {
                    TokenValue::Int(n) => ExprKind::IntLit(n),
                    TokenValue::Char(c) => ExprKind::CharLit(c),
                    TokenValue::Str { text, len } => ExprKind::StringLit(StringLit { text, len }),
                    _ => return Err(SyntaxError::ExpectedExpr.at(token.span)),
                };
                Ok(Expr::new(kind, token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.with_composite_lit(|p| p.parse_expr())?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident => self.parse_ident_operand(),
            TokenKind::LBracket | TokenKind::Map | TokenKind::Struct | TokenKind::Interface => {
                let ty = self.parse_type()?;
                if self.at(TokenKind::LBrace) {
                    self.parse_composite_lit(ty, start)
                } else if self.eat(TokenKind::LParen) {
                    let arg = self.with_composite_lit(|p| p.parse_expr())?;
                    self.eat(TokenKind::Comma);
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::new(
                        ExprKind::Conversion(Box::new(ty), Box::new(arg)),
                        self.span_from(start),
                    ))
                } else {
                    Err(self.error_expected("'{' or '(' after type"))
                }
            }
            TokenKind::Func => {
                if self.func.is_none() {
                    Err(SyntaxError::FuncOutsideFunction.at(self.current().span))
                } else {
                    Err(self.not_yet_implemented("function literals"))
                }
            }
            kind => Err(SyntaxError::ExpectedExpr.at_with_message(
                self.current().span,
                format!("expected expression, found {}", kind.as_str()),
            )),
        }
    }

    /// Identifier-led operands: `__func__`, `make(...)`, `pkg.Name`, a plain
    /// name, or a composite literal `T{...}`.
    fn parse_ident_operand(&mut self) -> ParseResult<Expr> {
        let start = self.current().span.start;
        let token = self.advance();
        let text = token.ident();

        if text == "__func__" {
            if let Some(func) = &self.func {
                let name = func.name.clone();
                let len = name.len();
                return Ok(Expr::new(
                    ExprKind::StringLit(StringLit { text: name, len }),
                    token.span,
                ));
            }
        }
        if text == "make" && self.at(TokenKind::LParen) {
            return self.parse_make(start);
        }

        let first = self.make_ident(&token);
        let rel = if self.imported.contains(&first.symbol) && self.at(TokenKind::Dot) {
            self.advance();
            let name = self.parse_ident()?;
            Relation::new(name, Some(first))
        } else {
            Relation::new(first, None)
        };

        if self.at(TokenKind::LBrace) && !self.no_composite_lit {
            let ty = TypeExpr::new(TypeExprKind::Name(rel), self.span_from(start));
            return self.parse_composite_lit(ty, start);
        }
        Ok(Expr::new(ExprKind::Ident(rel), self.span_from(start)))
    }

    fn parse_make(&mut self, start: BytePos) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let ty = self.parse_type()?;
        let mut args = Vec::new();
        while self.eat(TokenKind::Comma) {
            if self.at(TokenKind::RParen) {
                break;
            }
            args.push(self.with_composite_lit(|p| p.parse_expr())?);
        }
        self.expect(TokenKind::RParen)?;
        Ok(Expr::new(
            ExprKind::Make(Box::new(MakeExpr { ty, args })),
            self.span_from(start),
        ))
    }

    /// Selector chains, calls, index and slice expressions and type
    /// assertions, applied left to right.
    fn parse_postfix(&mut self, mut expr: Expr, start: BytePos) -> ParseResult<Expr> {
        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    if self.eat(TokenKind::LParen) {
                        if self.at(TokenKind::Type) {
                            if !self.accept_type_guard {
                                return Err(SyntaxError::UnexpectedToken.at_with_message(
                                    self.current().span,
                                    "use of .(type) outside type switch",
                                ));
                            }
                            self.advance();
                            self.expect(TokenKind::RParen)?;
                            self.saw_type_guard = true;
                            return Ok(expr);
                        }
                        let ty = self.parse_type()?;
                        self.expect(TokenKind::RParen)?;
                        expr = Expr::new(
                            ExprKind::TypeAssert(Box::new(expr), Box::new(ty)),
                            self.span_from(start),
                        );
                        continue;
                    }
                    let name = self.parse_ident()?;
                    if self.at(TokenKind::LParen) {
                        let (args, spread) = self.parse_call_args()?;
                        expr = Expr::new(
                            ExprKind::MethodCall(Box::new(MethodCallExpr {
                                receiver: expr,
                                method: name,
                                args,
                                spread,
                                target: None,
                            })),
                            self.span_from(start),
                        );
                    } else {
                        expr = Expr::new(
                            ExprKind::Selector(Box::new(expr), name),
                            self.span_from(start),
                        );
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.with_composite_lit(|p| p.parse_index_or_slice(expr, start))?;
                }
                TokenKind::LParen => {
                    let (args, spread) = self.parse_call_args()?;
                    expr = Expr::new(
                        ExprKind::Call(Box::new(CallExpr {
                            func: expr,
                            args,
                            spread,
                        })),
                        self.span_from(start),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    /// After `[`: `x[i]`, `x[lo:hi]`, `x[:hi]`, `x[lo:]` or `x[lo:hi:max]`.
    fn parse_index_or_slice(&mut self, expr: Expr, start: BytePos) -> ParseResult<Expr> {
        let low = if self.at(TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        if self.eat(TokenKind::RBracket) {
            let Some(index) = low else {
                return Err(SyntaxError::ExpectedExpr.at(self.current().span));
            };
            return Ok(Expr::new(
                ExprKind::Index(Box::new(expr), Box::new(index)),
                self.span_from(start),
            ));
        }

        self.expect(TokenKind::Colon)?;
        let high = if self.at_any(&[TokenKind::RBracket, TokenKind::Colon]) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let max = if self.eat(TokenKind::Colon) {
            if high.is_none() {
                return Err(SyntaxError::ExpectedExpr.at_with_message(
                    self.current().span,
                    "middle index required in 3-index slice",
                ));
            }
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::Slice(Box::new(SliceExpr {
                expr,
                low,
                high,
                max,
            })),
            self.span_from(start),
        ))
    }

    /// `(a, b, rest...)`. Returns the arguments and whether the last one
    /// was spread.
    fn parse_call_args(&mut self) -> ParseResult<(Vec<Expr>, bool)> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        let mut spread = false;
        self.with_composite_lit(|p| {
            while !p.at(TokenKind::RParen) {
                args.push(p.parse_expr()?);
                if p.eat(TokenKind::Ellipsis) {
                    spread = true;
                    p.eat(TokenKind::Comma);
                    break;
                }
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RParen)?;
        Ok((args, spread))
    }

    /// `T{...}` where `T` has already been parsed. The element form is
    /// chosen from the literal's type: keyed pairs for maps, positional
    /// values for slices and arrays, and for named or struct types field
    /// names when the first element is `name:`.
    fn parse_composite_lit(&mut self, ty: TypeExpr, start: BytePos) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        let elems = self.with_composite_lit(|p| {
            let elems = match &ty.kind {
                TypeExprKind::Map { key, value } => {
                    let mut pairs = Vec::new();
                    while !p.at(TokenKind::RBrace) {
                        let k = p.parse_composite_elem(Some(key.as_ref()))?;
                        if !p.eat(TokenKind::Colon) {
                            return Err(SyntaxError::ExpectedCompositeKey.at(p.current().span));
                        }
                        let v = p.parse_composite_elem(Some(value.as_ref()))?;
                        pairs.push((k, v));
                        if !p.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    CompositeElems::Map(pairs)
                }
                TypeExprKind::Slice(elem) | TypeExprKind::Array { elem, .. } => {
                    let mut values = Vec::new();
                    while !p.at(TokenKind::RBrace) {
                        values.push(p.parse_composite_elem(Some(elem.as_ref()))?);
                        if !p.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    CompositeElems::Positional(values)
                }
                _ => {
                    if p.at(TokenKind::Ident) && p.peek_kind() == TokenKind::Colon {
                        let mut fields = Vec::new();
                        while !p.at(TokenKind::RBrace) {
                            let name = p.parse_ident()?;
                            if !p.eat(TokenKind::Colon) {
                                return Err(SyntaxError::ExpectedCompositeKey.at(p.current().span));
                            }
                            let value = p.parse_expr()?;
                            fields.push(FieldInit { name, value });
                            if !p.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                        CompositeElems::Fields(fields)
                    } else if p.at(TokenKind::RBrace) {
                        CompositeElems::Fields(Vec::new())
                    } else {
                        let mut values = Vec::new();
                        while !p.at(TokenKind::RBrace) {
                            values.push(p.parse_composite_elem(None)?);
                            if !p.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                        CompositeElems::Positional(values)
                    }
                }
            };
            Ok(elems)
        })?;
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::new(
            ExprKind::CompositeLit(Box::new(CompositeLit { ty, elems })),
            self.span_from(start),
        ))
    }

    /// An element value. A bare `{...}` takes the element type; for a
    /// pointer element type it stands for `&T{...}`.
    fn parse_composite_elem(&mut self, elem_ty: Option<&TypeExpr>) -> ParseResult<Expr> {
        if !self.at(TokenKind::LBrace) {
            return self.parse_expr();
        }
        let start = self.current().span.start;
        let Some(elem_ty) = elem_ty else {
            return Err(SyntaxError::ExpectedExpr.at_with_message(
                self.current().span,
                "missing type in composite literal",
            ));
        };
        if let TypeExprKind::Pointer(inner) = &elem_ty.kind {
            let lit = self.parse_composite_lit((**inner).clone(), start)?;
            return Ok(Expr::new(
                ExprKind::Unary(UnaryOp::Addr, Box::new(lit)),
                self.span_from(start),
            ));
        }
        self.parse_composite_lit(elem_ty.clone(), start)
    }
}
