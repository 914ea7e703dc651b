//! Recursive descent parser.
//!
//! Converts a token stream into a [`File`]. Binary expressions use
//! precedence climbing over a fixed table. Parsing stops at the first error.
//!
//! Beyond syntax, the parser tracks a little per-file state that later
//! phases rely on:
//! - the enclosing function (for `__func__`, defer numbering and the
//!   defer-handler label)
//! - the stack of breakable constructs, so `break`/`continue` carry their target
//! - the package names introduced by imports, so `pkg.Name` becomes a
//!   single qualified relation

mod decl;
mod expr;
mod stmt;
mod types;

use std::collections::HashSet;

use minigo_common::{CompilationContext, Diagnostic, Ident, Span, Symbol};

use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::{Token, TokenKind, TokenValue};
use crate::token_stream::TokenStream;

pub type ParseResult<T> = Result<T, Diagnostic>;

/// Per-function parse state.
struct FuncState {
    name: String,
    defer_count: u32,
}

#[derive(Clone, Copy)]
struct Breakable {
    id: LoopId,
    is_loop: bool,
}

pub struct Parser<'a> {
    tokens: TokenStream,
    ctx: &'a mut CompilationContext,
    imported: HashSet<Symbol>,
    func: Option<FuncState>,
    breakables: Vec<Breakable>,
    next_loop_id: u32,
    /// Set while parsing `if`/`for`/`switch` headers, where `x {` opens a block.
    no_composite_lit: bool,
    /// Depth of `case` bodies being parsed.
    in_case: u32,
    /// Allows `x.(type)` while parsing a switch header.
    accept_type_guard: bool,
    saw_type_guard: bool,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, ctx: &'a mut CompilationContext) -> Self {
        Self {
            tokens: TokenStream::new(tokens),
            ctx,
            imported: HashSet::new(),
            func: None,
            breakables: Vec::new(),
            next_loop_id: 0,
            no_composite_lit: false,
            in_case: 0,
            accept_type_guard: false,
            saw_type_guard: false,
        }
    }

    /// Parses a complete source file.
    pub fn parse_file(&mut self) -> ParseResult<File> {
        let start = self.current().span.start;

        if !self.at(TokenKind::Package) {
            return Err(SyntaxError::ExpectedPackage.at(self.current().span));
        }
        self.advance();
        let package = self.parse_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            self.parse_import_decl(&mut imports)?;
        }

        let mut decls = Vec::new();
        while !self.at_eof() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            self.parse_top_level_decl(&mut decls)?;
        }

        let end = self.current().span.end;
        Ok(File {
            package,
            imports,
            decls,
            span: Span::new(start, end),
        })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> ParseResult<()> {
        self.expect(TokenKind::Import)?;
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                let spec = self.parse_import_spec()?;
                imports.push(spec);
            }
            self.expect(TokenKind::RParen)?;
        } else {
            let spec = self.parse_import_spec()?;
            imports.push(spec);
        }
        self.expect_semi()
    }

    fn parse_import_spec(&mut self) -> ParseResult<ImportSpec> {
        let token = self.expect(TokenKind::StringLit)?;
        let TokenValue::Str { text, .. } = token.value else {
            return Err(self.error_expected("import path"));
        };
        let base = text.rsplit('/').next().unwrap_or(&text).to_owned();
        let name = self.ctx.interner.intern(&base);
        self.imported.insert(name);
        Ok(ImportSpec {
            path: text,
            name,
            span: token.span,
        })
    }

    // =========================================================================
    // Token manipulation
    // =========================================================================

    #[inline]
    fn current(&self) -> &Token {
        self.tokens.peek()
    }

    #[inline]
    fn advance(&mut self) -> Token {
        self.tokens.read()
    }

    #[inline]
    fn at(&self, kind: TokenKind) -> bool {
        self.tokens.peek_kind() == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.tokens.peek_kind())
    }

    /// Kind of the token after the current one.
    #[inline]
    fn peek_kind(&self) -> TokenKind {
        self.tokens.nth(1).kind
    }

    #[inline]
    fn at_eof(&self) -> bool {
        self.tokens.is_eof()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(&format!("'{}'", kind.as_str())))
        }
    }

    /// A terminator may be omitted before `)` or `}`.
    fn expect_semi(&mut self) -> ParseResult<()> {
        if self.eat(TokenKind::Semicolon) || self.at_any(&[TokenKind::RParen, TokenKind::RBrace]) {
            Ok(())
        } else {
            Err(self.error_expected("';'"))
        }
    }

    /// End of the most recently consumed token.
    fn prev_end(&self) -> minigo_common::BytePos {
        self.tokens
            .last()
            .map(|t| t.span.end)
            .unwrap_or(self.current().span.start)
    }

    fn span_from(&self, start: minigo_common::BytePos) -> Span {
        Span::new(start, self.prev_end())
    }

    fn make_ident(&mut self, token: &Token) -> Ident {
        let symbol = self.ctx.interner.intern(token.ident());
        Ident::new(symbol, token.span)
    }

    fn new_loop_id(&mut self) -> LoopId {
        self.next_loop_id += 1;
        LoopId(self.next_loop_id)
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error_expected(&self, expected: &str) -> Diagnostic {
        let token = self.current();
        SyntaxError::UnexpectedToken.at_with_message(
            token.span,
            format!("expected {}, found {}", expected, token.kind.as_str()),
        )
    }

    fn not_yet_implemented(&self, what: &str) -> Diagnostic {
        SyntaxError::NotYetImplemented
            .at_with_message(self.current().span, format!("not yet implemented: {}", what))
    }

    // =========================================================================
    // Helper parsers
    // =========================================================================

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        if self.at(TokenKind::Ident) {
            let token = self.advance();
            Ok(self.make_ident(&token))
        } else {
            Err(SyntaxError::ExpectedIdent.at_with_message(
                self.current().span,
                format!("expected identifier, found {}", self.current().kind.as_str()),
            ))
        }
    }

    fn parse_ident_list(&mut self) -> ParseResult<Vec<Ident>> {
        let mut idents = vec![self.parse_ident()?];
        while self.eat(TokenKind::Comma) {
            idents.push(self.parse_ident()?);
        }
        Ok(idents)
    }

    /// Runs `f` with composite literals allowed again, as inside parentheses.
    fn with_composite_lit<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.no_composite_lit, false);
        let result = f(self);
        self.no_composite_lit = saved;
        result
    }

    /// Runs `f` with composite literals disabled, for statement headers.
    fn without_composite_lit<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.no_composite_lit, true);
        let result = f(self);
        self.no_composite_lit = saved;
        result
    }
}

#[cfg(test)]
mod tests;
