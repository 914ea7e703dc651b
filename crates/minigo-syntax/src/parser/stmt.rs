//! Statement parsing.

use super::{Breakable, ParseResult, Parser};
use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::TokenKind;

/// A simple statement, or the header of a range loop when one was allowed.
enum SimpleOrRange {
    Simple(Stmt),
    Range(RangeClause),
}

fn op_assign_binary(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::PlusAssign => BinaryOp::Add,
        TokenKind::MinusAssign => BinaryOp::Sub,
        TokenKind::StarAssign => BinaryOp::Mul,
        TokenKind::SlashAssign => BinaryOp::Div,
        TokenKind::PercentAssign => BinaryOp::Rem,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    /// Statements up to the closing `}` of a block or the next `case`/`default`.
    pub(super) fn parse_stmt_list(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            if self.at_any(&[
                TokenKind::RBrace,
                TokenKind::Case,
                TokenKind::Default,
                TokenKind::Eof,
            ]) {
                break;
            }
            stmts.push(self.parse_stmt()?);
            if !self.at_any(&[TokenKind::Case, TokenKind::Default]) {
                self.expect_semi()?;
            }
        }
        Ok(stmts)
    }

    pub(super) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current().span.start;
        let kind = match self.current().kind {
            TokenKind::Var => {
                if self.peek_kind() == TokenKind::LParen {
                    return Err(self.not_yet_implemented("grouped local var declarations"));
                }
                self.advance();
                StmtKind::Var(self.parse_var_spec()?)
            }
            TokenKind::Const => StmtKind::Const(self.parse_const_decl()?),
            TokenKind::Type => {
                let mut decls = self.parse_type_decl()?;
                if decls.len() != 1 {
                    return Err(SyntaxError::NotYetImplemented
                        .at_with_message(self.span_from(start), "not yet implemented: grouped local types"));
                }
                match decls.pop() {
                    Some(decl) => StmtKind::Type(decl),
                    None => return Err(SyntaxError::ExpectedType.at(self.span_from(start))),
                }
            }
            TokenKind::For => return self.parse_for_stmt(),
            TokenKind::If => return self.parse_if_stmt(),
            TokenKind::Switch => return self.parse_switch_stmt(),
            TokenKind::Return => {
                self.advance();
                let results = if self.at_any(&[TokenKind::Semicolon, TokenKind::RBrace]) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                StmtKind::Return(ReturnStmt { results })
            }
            TokenKind::Break => {
                self.advance();
                self.reject_branch_label()?;
                match self.breakables.last() {
                    Some(b) => StmtKind::Break(b.id),
                    None => return Err(SyntaxError::BreakOutsideLoop.at(self.span_from(start))),
                }
            }
            TokenKind::Continue => {
                self.advance();
                self.reject_branch_label()?;
                match self.breakables.iter().rev().find(|b| b.is_loop) {
                    Some(b) => StmtKind::Continue(b.id),
                    None => return Err(SyntaxError::ContinueOutsideLoop.at(self.span_from(start))),
                }
            }
            TokenKind::Defer => {
                self.advance();
                let call = self.parse_expr()?;
                if !matches!(call.kind, ExprKind::Call(_) | ExprKind::MethodCall(_)) {
                    return Err(SyntaxError::UnexpectedToken
                        .at_with_message(call.span, "expression in defer must be function call"));
                }
                let index = match self.func.as_mut() {
                    Some(func) => {
                        func.defer_count += 1;
                        func.defer_count - 1
                    }
                    None => return Err(SyntaxError::FuncOutsideFunction.at(call.span)),
                };
                StmtKind::Defer(DeferStmt { call, index })
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Semicolon => StmtKind::Empty,
            TokenKind::Fallthrough => {
                if self.in_case > 0 {
                    return Err(self.not_yet_implemented("fallthrough"));
                }
                return Err(SyntaxError::UnexpectedToken
                    .at_with_message(self.current().span, "fallthrough statement out of place"));
            }
            TokenKind::Go => return Err(self.not_yet_implemented("go statements")),
            TokenKind::Goto => return Err(self.not_yet_implemented("goto")),
            TokenKind::Select => return Err(self.not_yet_implemented("select")),
            TokenKind::Func => return Err(self.not_yet_implemented("nested function declarations")),
            TokenKind::Ident if self.peek_kind() == TokenKind::Colon => {
                return Err(self.not_yet_implemented("labeled statements"))
            }
            _ => return self.parse_simple_stmt(),
        };
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    fn reject_branch_label(&self) -> ParseResult<()> {
        if self.at(TokenKind::Ident) {
            return Err(self.not_yet_implemented("branch labels"));
        }
        Ok(())
    }

    pub(super) fn parse_simple_stmt(&mut self) -> ParseResult<Stmt> {
        match self.parse_simple_stmt_or_range(false)? {
            SimpleOrRange::Simple(stmt) => Ok(stmt),
            SimpleOrRange::Range(clause) => Err(SyntaxError::InvalidRangeClause.at(clause.expr.span)),
        }
    }

    /// Expression, assignment, short variable declaration, `x op= y`,
    /// `x++`/`x--`, or with `allow_range` the `k, v := range x` header.
    fn parse_simple_stmt_or_range(&mut self, allow_range: bool) -> ParseResult<SimpleOrRange> {
        let start = self.current().span.start;

        if allow_range && self.eat(TokenKind::Range) {
            let expr = self.parse_expr()?;
            return Ok(SimpleOrRange::Range(RangeClause {
                key: None,
                value: None,
                define: false,
                expr,
            }));
        }

        let lefts = self.parse_expr_list()?;
        let kind = self.current().kind;
        match kind {
            TokenKind::Assign | TokenKind::ColonAssign => {
                self.advance();
                let define = kind == TokenKind::ColonAssign;
                if define {
                    if let Some(bad) = lefts.iter().find(|e| e.as_relation().is_none()) {
                        return Err(SyntaxError::ExpectedIdent
                            .at_with_message(bad.span, "non-name on left side of :="));
                    }
                }
                if allow_range && self.eat(TokenKind::Range) {
                    return self.finish_range_clause(lefts, define);
                }
                let rights = self.parse_expr_list()?;
                let assign = AssignStmt {
                    lefts,
                    rights,
                    op: None,
                };
                let kind = if define {
                    StmtKind::ShortVarDecl(assign)
                } else {
                    StmtKind::Assign(assign)
                };
                Ok(SimpleOrRange::Simple(Stmt {
                    kind,
                    span: self.span_from(start),
                }))
            }
            k if k.is_op_assign() => {
                let Some(op) = op_assign_binary(k) else {
                    return Err(self.not_yet_implemented(&format!("operator {}", k.as_str())));
                };
                if lefts.len() != 1 {
                    return Err(SyntaxError::AssignmentCountMismatch.at_with_message(
                        self.span_from(start),
                        format!("unexpected {}, expected := or = or comma", k.as_str()),
                    ));
                }
                self.advance();
                let right = self.parse_expr()?;
                let left = lefts.into_iter().next().ok_or_else(|| self.error_expected("operand"))?;
                let span = self.span_from(start);
                let rhs = Expr::new(
                    ExprKind::Binary(Box::new(BinaryExpr {
                        op,
                        left: left.clone(),
                        right,
                    })),
                    span,
                );
                Ok(SimpleOrRange::Simple(Stmt {
                    kind: StmtKind::Assign(AssignStmt {
                        lefts: vec![left],
                        rights: vec![rhs],
                        op: Some(op),
                    }),
                    span,
                }))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.advance();
                let operand = self.single_expr(lefts)?;
                Ok(SimpleOrRange::Simple(Stmt {
                    kind: StmtKind::IncDec(IncDecStmt {
                        operand,
                        inc: kind == TokenKind::PlusPlus,
                    }),
                    span: self.span_from(start),
                }))
            }
            _ => {
                let expr = self.single_expr(lefts)?;
                Ok(SimpleOrRange::Simple(Stmt {
                    kind: StmtKind::Expr(expr),
                    span: self.span_from(start),
                }))
            }
        }
    }

    fn single_expr(&self, exprs: Vec<Expr>) -> ParseResult<Expr> {
        if exprs.len() != 1 {
            return Err(self.error_expected("':=' or '=' after expression list"));
        }
        exprs
            .into_iter()
            .next()
            .ok_or_else(|| SyntaxError::ExpectedExpr.at(self.current().span))
    }

    fn finish_range_clause(&mut self, lefts: Vec<Expr>, define: bool) -> ParseResult<SimpleOrRange> {
        if lefts.is_empty() || lefts.len() > 2 {
            return Err(SyntaxError::InvalidRangeClause.at(self.current().span));
        }
        let expr = self.parse_expr()?;
        let mut lefts = lefts.into_iter();
        Ok(SimpleOrRange::Range(RangeClause {
            key: lefts.next(),
            value: lefts.next(),
            define,
            expr,
        }))
    }

    fn parse_for_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current().span.start;
        self.expect(TokenKind::For)?;
        let id = self.new_loop_id();

        let clause = if self.at(TokenKind::LBrace) {
            ForClause::Cond {
                init: None,
                cond: None,
                post: None,
            }
        } else {
            self.without_composite_lit(|p| p.parse_for_header())?
        };

        self.breakables.push(Breakable { id, is_loop: true });
        let body = self.parse_block();
        self.breakables.pop();
        let body = body?;

        Ok(Stmt {
            kind: StmtKind::For(ForStmt { id, clause, body }),
            span: self.span_from(start),
        })
    }

    fn parse_for_header(&mut self) -> ParseResult<ForClause> {
        let init = if self.at(TokenKind::Semicolon) {
            None
        } else {
            match self.parse_simple_stmt_or_range(true)? {
                SimpleOrRange::Range(clause) => return Ok(ForClause::Range(clause)),
                SimpleOrRange::Simple(stmt) => Some(stmt),
            }
        };

        if self.at(TokenKind::LBrace) {
            // `for cond {}`
            let cond = match init {
                Some(Stmt {
                    kind: StmtKind::Expr(e),
                    ..
                }) => e,
                Some(stmt) => {
                    return Err(SyntaxError::ExpectedExpr
                        .at_with_message(stmt.span, "expected for loop condition"))
                }
                None => return Err(self.error_expected("for loop condition")),
            };
            return Ok(ForClause::Cond {
                init: None,
                cond: Some(cond),
                post: None,
            });
        }

        self.expect(TokenKind::Semicolon)?;
        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let post = if self.at(TokenKind::LBrace) {
            None
        } else {
            Some(Box::new(self.parse_simple_stmt()?))
        };
        Ok(ForClause::Cond {
            init: init.map(Box::new),
            cond,
            post,
        })
    }

    fn parse_if_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current().span.start;
        self.expect(TokenKind::If)?;

        let (init, cond) = self.without_composite_lit(|p| {
            let first = p.parse_simple_stmt()?;
            if p.eat(TokenKind::Semicolon) {
                let cond = p.parse_expr()?;
                Ok((Some(Box::new(first)), cond))
            } else {
                match first.kind {
                    StmtKind::Expr(cond) => Ok((None, cond)),
                    _ => Err(SyntaxError::ExpectedExpr
                        .at_with_message(first.span, "expected condition after if")),
                }
            }
        })?;

        let then = self.parse_block()?;
        let els = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) {
                Some(Box::new(self.parse_if_stmt()?))
            } else {
                let block_start = self.current().span.start;
                let block = self.parse_block()?;
                Some(Box::new(Stmt {
                    kind: StmtKind::Block(block),
                    span: self.span_from(block_start),
                }))
            }
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If(IfStmt {
                init,
                cond,
                then,
                els,
            }),
            span: self.span_from(start),
        })
    }

    fn parse_switch_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current().span.start;
        self.expect(TokenKind::Switch)?;
        let id = self.new_loop_id();

        let header = if self.at(TokenKind::LBrace) {
            None
        } else {
            let saved = (self.accept_type_guard, self.saw_type_guard);
            self.accept_type_guard = true;
            self.saw_type_guard = false;
            let header = self.without_composite_lit(|p| p.parse_simple_stmt());
            let is_type_switch = self.saw_type_guard;
            (self.accept_type_guard, self.saw_type_guard) = saved;
            let header = header?;
            if self.at(TokenKind::Semicolon) {
                return Err(self.not_yet_implemented("switch init statements"));
            }
            Some((header, is_type_switch))
        };

        self.expect(TokenKind::LBrace)?;
        self.breakables.push(Breakable { id, is_loop: false });
        let kind = match header {
            Some((header, true)) => self.parse_type_switch_body(id, header),
            Some((header, false)) => match header.kind {
                StmtKind::Expr(tag) => self.parse_value_switch_body(id, Some(tag)),
                _ => Err(SyntaxError::ExpectedExpr.at_with_message(header.span, "expected switch expression")),
            },
            None => self.parse_value_switch_body(id, None),
        };
        self.breakables.pop();
        let kind = kind?;
        self.expect(TokenKind::RBrace)?;

        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_value_switch_body(&mut self, id: LoopId, tag: Option<Expr>) -> ParseResult<StmtKind> {
        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            let start = self.current().span.start;
            let (values, is_default) = if self.eat(TokenKind::Case) {
                (self.parse_expr_list()?, false)
            } else if self.eat(TokenKind::Default) {
                (Vec::new(), true)
            } else {
                return Err(self.error_expected("case or default"));
            };
            self.expect(TokenKind::Colon)?;
            let body = self.parse_case_body()?;
            cases.push(CaseClause {
                values,
                is_default,
                body,
                span: self.span_from(start),
            });
        }
        Ok(StmtKind::Switch(SwitchStmt { id, tag, cases }))
    }

    fn parse_type_switch_body(&mut self, id: LoopId, header: Stmt) -> ParseResult<StmtKind> {
        let (binding, subject) = match header.kind {
            StmtKind::Expr(subject) => (None, subject),
            StmtKind::ShortVarDecl(assign) if assign.lefts.len() == 1 && assign.rights.len() == 1 => {
                let mut lefts = assign.lefts.into_iter();
                let mut rights = assign.rights.into_iter();
                match (lefts.next(), rights.next()) {
                    (Some(left), Some(subject)) => {
                        let binding = left.as_relation().map(|rel| rel.name());
                        (binding, subject)
                    }
                    _ => return Err(SyntaxError::ExpectedExpr.at(header.span)),
                }
            }
            _ => {
                return Err(SyntaxError::UnexpectedToken
                    .at_with_message(header.span, "malformed type switch guard"))
            }
        };

        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            let start = self.current().span.start;
            let (types, is_default) = if self.eat(TokenKind::Case) {
                let mut types = vec![self.parse_case_type()?];
                while self.eat(TokenKind::Comma) {
                    types.push(self.parse_case_type()?);
                }
                (types, false)
            } else if self.eat(TokenKind::Default) {
                (Vec::new(), true)
            } else {
                return Err(self.error_expected("case or default"));
            };
            self.expect(TokenKind::Colon)?;
            let body = self.parse_case_body()?;
            cases.push(TypeCaseClause {
                types,
                is_default,
                body,
                var: None,
                span: self.span_from(start),
            });
        }
        Ok(StmtKind::TypeSwitch(TypeSwitchStmt {
            id,
            binding,
            subject,
            cases,
        }))
    }

    /// A type in a type switch case; `nil` yields `None`.
    fn parse_case_type(&mut self) -> ParseResult<Option<TypeExpr>> {
        if self.at(TokenKind::Ident) && self.current().ident() == "nil" {
            self.advance();
            return Ok(None);
        }
        self.parse_type().map(Some)
    }

    fn parse_case_body(&mut self) -> ParseResult<Vec<Stmt>> {
        self.in_case += 1;
        let body = self.parse_stmt_list();
        self.in_case -= 1;
        body
    }
}
