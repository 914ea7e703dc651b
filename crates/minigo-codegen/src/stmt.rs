//! Statement lowering.

use minigo_analysis::{GtypeKind, RuntimeFn, Width};
use minigo_common::{GtypeId, Span};
use minigo_syntax::ast::{
    Block, ForClause, ForStmt, IfStmt, RangeClause, ReturnStmt, Stmt, StmtKind, SwitchStmt,
    TypeSwitchStmt,
};

use crate::context::{reg_width, CodegenContext};
use crate::error::{CodegenError, ErrorKind, Result};
use crate::func::LoopContext;

/// What a `range` loop walks over.
#[derive(Debug, Clone, Copy)]
enum RangeKind {
    /// Slices, strings and arrays: a base pointer and a length.
    Indexed { elem: GtypeId, elem_size: u32 },
    Map { key: GtypeId, value: GtypeId },
}

impl<'a> CodegenContext<'a> {
    /// Emits a block one nesting level deeper than the code around it.
    pub fn emit_block(&mut self, block: &'a Block) -> Result<()> {
        self.out.indent();
        self.emit_stmts(&block.stmts)?;
        self.out.dedent();
        Ok(())
    }

    pub fn emit_stmts(&mut self, stmts: &'a [Stmt]) -> Result<()> {
        for stmt in stmts {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn emit_stmt(&mut self, stmt: &'a Stmt) -> Result<()> {
        self.set_position(stmt.span);
        if let Some(name) = stmt_comment(&stmt.kind) {
            self.out.comment(name);
        }
        match &stmt.kind {
            StmtKind::Empty | StmtKind::Const(_) | StmtKind::Type(_) => Ok(()),
            StmtKind::Var(spec) => self.emit_var_spec(spec),
            StmtKind::Expr(e) => self.emit_call_expr(e),
            StmtKind::Assign(a) | StmtKind::ShortVarDecl(a) => self.emit_assign(a, stmt.span),
            StmtKind::IncDec(s) => self.emit_incdec(s),
            StmtKind::Block(b) => self.emit_block(b),
            StmtKind::If(s) => self.emit_if(s),
            StmtKind::For(s) => self.emit_for(s),
            StmtKind::Switch(s) => self.emit_switch(s, stmt.span),
            StmtKind::TypeSwitch(s) => self.emit_type_switch(s, stmt.span),
            StmtKind::Return(r) => self.emit_return(r, stmt.span),
            StmtKind::Break(id) => {
                let label = self
                    .func
                    .break_label(*id)
                    .ok_or_else(|| CodegenError::new(ErrorKind::InvalidBreak, stmt.span))?;
                self.out.jump("jmp", label);
                Ok(())
            }
            StmtKind::Continue(id) => {
                let label = self
                    .func
                    .continue_label(*id)
                    .ok_or_else(|| CodegenError::new(ErrorKind::InvalidContinue, stmt.span))?;
                self.out.jump("jmp", label);
                Ok(())
            }
            StmtKind::Defer(d) => {
                let flag = self
                    .func
                    .add_defer(d.index, &d.call)
                    .ok_or_else(|| CodegenError::internal("defer outside its function", stmt.span))?;
                self.out.load_number(1);
                self.out.store_local(Width::Narrow, flag);
                Ok(())
            }
        }
    }

    fn emit_if(&mut self, s: &'a IfStmt) -> Result<()> {
        if let Some(init) = &s.init {
            self.emit_stmt(init)?;
        }
        let (els, end) = (self.new_label(), self.new_label());
        self.emit_expr(&s.cond)?;
        self.out.emit("TEST_IT");
        self.out.jump("je", els);
        self.emit_block(&s.then)?;
        self.out.jump("jmp", end);
        self.out.label(els);
        if let Some(e) = &s.els {
            self.emit_stmt(e)?;
        }
        self.out.label(end);
        Ok(())
    }

    fn emit_for(&mut self, s: &'a ForStmt) -> Result<()> {
        match &s.clause {
            ForClause::Cond { init, cond, post } => {
                if let Some(init) = init {
                    self.emit_stmt(init)?;
                }
                let (top, next, end) = (self.new_label(), self.new_label(), self.new_label());
                self.out.label(top);
                if let Some(cond) = cond {
                    self.emit_expr(cond)?;
                    self.out.emit("TEST_IT");
                    self.out.jump("je", end);
                }
                self.func.push_loop(LoopContext {
                    id: s.id,
                    break_label: end,
                    continue_label: Some(next),
                });
                self.emit_block(&s.body)?;
                self.func.pop_loop();
                self.out.label(next);
                if let Some(post) = post {
                    self.emit_stmt(post)?;
                }
                self.out.jump("jmp", top);
                self.out.label(end);
                Ok(())
            }
            ForClause::Range(range) => self.emit_range(s, range),
        }
    }

    fn range_kind(&self, range: &RangeClause) -> Result<RangeKind> {
        let program = self.program;
        let ty = self.ty(&range.expr)?;
        let indexed = |elem: GtypeId| RangeKind::Indexed {
            elem,
            elem_size: self.size(elem),
        };
        Ok(match program.kind(ty) {
            GtypeKind::String => indexed(program.types.byte),
            GtypeKind::Slice(elem) | GtypeKind::Array { elem, .. } => indexed(*elem),
            GtypeKind::Map { key, value } => RangeKind::Map {
                key: *key,
                value: *value,
            },
            GtypeKind::Pointer(p) => match program.kind(*p) {
                GtypeKind::Array { elem, .. } => indexed(*elem),
                _ => return Err(CodegenError::internal("range over a non-array pointer", range.expr.span)),
            },
            _ => return Err(CodegenError::internal("range over a non-iterable value", range.expr.span)),
        })
    }

    /// Loads the walked value into frame slots: `(base, len)` for indexed
    /// kinds, where `len` is `None` for maps, whose length is re-read.
    fn emit_range_source(&mut self, range: &RangeClause) -> Result<(i32, Option<i32>)> {
        let program = self.program;
        let ty = self.ty(&range.expr)?;
        let base = self.func.alloc_temp(24);
        let array_len = match program.kind(ty) {
            GtypeKind::Array { len, .. } => Some(len.unwrap_or(0)),
            GtypeKind::Pointer(p) => match program.kind(*p) {
                GtypeKind::Array { len, .. } => Some(len.unwrap_or(0)),
                _ => None,
            },
            GtypeKind::Map { .. } => {
                self.emit_expr(&range.expr)?;
                self.out.store_local(Width::Narrow, base);
                return Ok((base, None));
            }
            _ => None,
        };
        match array_len {
            Some(len) => {
                if program.is_pointer(ty) {
                    self.emit_expr(&range.expr)?;
                } else {
                    self.emit_address(&range.expr)?;
                }
                self.out.store_local(Width::Narrow, base);
                self.out.load_number(len);
                self.out.store_local(Width::Narrow, base + 8);
            }
            None => {
                self.emit_expr(&range.expr)?;
                self.out.store_local(Width::Wide, base);
            }
        }
        Ok((base, Some(base + 8)))
    }

    fn emit_range(&mut self, s: &'a ForStmt, range: &'a RangeClause) -> Result<()> {
        let kind = self.range_kind(range)?;
        let (base, len) = self.emit_range_source(range)?;
        let index = self.func.alloc_temp(8);
        self.out.load_number(0);
        self.out.store_local(Width::Narrow, index);

        let (top, next, end) = (self.new_label(), self.new_label(), self.new_label());
        self.out.label(top);
        self.out.load_local(Width::Narrow, index);
        self.out.push(Width::Narrow);
        match len {
            Some(len) => self.out.load_local(Width::Narrow, len),
            None => {
                self.out.load_local(Width::Narrow, base);
                self.emit_map_len();
            }
        }
        self.out.push(Width::Narrow);
        self.out.emit("CMP_FROM_STACK setl");
        self.out.emit("TEST_IT");
        self.out.jump("je", end);

        match kind {
            RangeKind::Indexed { elem, elem_size } => {
                if let Some(key) = &range.key {
                    self.out.load_local(Width::Narrow, index);
                    self.store_to(key, self.program.types.int)?;
                }
                if let Some(value) = &range.value {
                    self.out.load_local(Width::Narrow, base);
                    self.out.push(Width::Narrow);
                    self.out.load_local(Width::Narrow, index);
                    self.out.emit(format_args!("IMUL_NUMBER {}", elem_size));
                    self.out.push(Width::Narrow);
                    self.out.emit("SUM_FROM_STACK");
                    self.load_from_rax(elem);
                    self.store_to(value, elem)?;
                }
            }
            RangeKind::Map { key: kt, value: vt } => {
                let entry = self.func.alloc_temp(8);
                self.emit_entry_addr(base, index);
                self.out.store_local(Width::Narrow, entry);
                if let Some(key) = &range.key {
                    self.load_entry_key(entry, kt);
                    self.store_to(key, kt)?;
                }
                if let Some(value) = &range.value {
                    self.load_entry_value(entry, vt);
                    self.store_to(value, vt)?;
                }
            }
        }

        self.func.push_loop(LoopContext {
            id: s.id,
            break_label: end,
            continue_label: Some(next),
        });
        self.emit_block(&s.body)?;
        self.func.pop_loop();
        self.out.label(next);
        self.out.load_local(Width::Narrow, index);
        self.out.add_number(1);
        self.out.store_local(Width::Narrow, index);
        self.out.jump("jmp", top);
        self.out.label(end);
        Ok(())
    }

    fn emit_switch(&mut self, s: &'a SwitchStmt, span: Span) -> Result<()> {
        let end = self.new_label();
        let subject = match &s.tag {
            Some(tag) => {
                let ty = self.ty(tag)?;
                let w = self.width(ty);
                if !matches!(w, Width::Byte | Width::Narrow) && !self.program.is_string(ty) {
                    let name = self.type_name(ty);
                    return Err(CodegenError::not_yet_implemented(&format!("switch on {} values", name), span));
                }
                let slot = self.temp_for(w);
                self.emit_expr(tag)?;
                self.out.store_local(reg_width(w), slot);
                Some((slot, ty))
            }
            None => None,
        };

        let labels: Vec<_> = s.cases.iter().map(|_| self.new_label()).collect();
        let mut default = None;
        for (case, &label) in s.cases.iter().zip(&labels) {
            if case.is_default {
                default = Some(label);
            }
            for value in &case.values {
                match subject {
                    Some((slot, ty)) if self.program.is_string(ty) => {
                        self.out.load_local(Width::Wide, slot);
                        self.out.push(Width::Wide);
                        self.emit_value_as(value, ty)?;
                        self.out.push(Width::Wide);
                        self.call_runtime(RuntimeFn::Strcmp);
                        self.out.push(Width::Narrow);
                        self.out.load_number(0);
                        self.out.push(Width::Narrow);
                        self.out.emit("CMP_FROM_STACK sete");
                    }
                    Some((slot, ty)) => {
                        self.out.load_local(Width::Narrow, slot);
                        self.out.push(Width::Narrow);
                        self.emit_value_as(value, ty)?;
                        self.out.push(Width::Narrow);
                        self.out.emit("CMP_FROM_STACK sete");
                    }
                    None => self.emit_expr(value)?,
                }
                self.out.emit("TEST_IT");
                self.out.jump("jne", label);
            }
        }
        self.out.jump("jmp", default.unwrap_or(end));

        self.func.push_loop(LoopContext {
            id: s.id,
            break_label: end,
            continue_label: None,
        });
        for (case, &label) in s.cases.iter().zip(&labels) {
            self.out.label(label);
            self.out.indent();
            self.emit_stmts(&case.body)?;
            self.out.jump("jmp", end);
            self.out.dedent();
        }
        self.func.pop_loop();
        self.out.label(end);
        Ok(())
    }

    fn emit_type_switch(&mut self, s: &'a TypeSwitchStmt, span: Span) -> Result<()> {
        let end = self.new_label();
        let subject = self.func.alloc_temp(24);
        self.emit_expr(&s.subject)?;
        self.out.store_local(Width::Wide, subject);

        let labels: Vec<_> = s.cases.iter().map(|_| self.new_label()).collect();
        let mut default = None;
        for (case, &label) in s.cases.iter().zip(&labels) {
            if case.is_default {
                default = Some(label);
            }
            for ty in &case.types {
                self.out.load_local(Width::Narrow, subject + 8);
                match ty {
                    None => {
                        self.out.emit("TEST_IT");
                        self.out.jump("je", label);
                    }
                    Some(t) => {
                        let target = t.gtype.ok_or_else(|| CodegenError::new(ErrorKind::MissingType, t.span))?;
                        self.emit_type_match(target, span)?;
                        self.out.emit("TEST_IT");
                        self.out.jump("jne", label);
                    }
                }
            }
        }
        self.out.jump("jmp", default.unwrap_or(end));

        self.func.push_loop(LoopContext {
            id: s.id,
            break_label: end,
            continue_label: None,
        });
        for (case, &label) in s.cases.iter().zip(&labels) {
            self.out.label(label);
            self.out.indent();
            if let Some(var) = case.var {
                let ty = self.var_type(var, case.span)?;
                if self.program.is_interface(ty) {
                    self.out.load_local(Width::Wide, subject);
                } else {
                    self.out.load_local(Width::Narrow, subject);
                    self.load_from_rax(ty);
                }
                let place = self.var_place(var, case.span)?;
                self.store_place(&place, ty);
            }
            self.emit_stmts(&case.body)?;
            self.out.jump("jmp", end);
            self.out.dedent();
        }
        self.func.pop_loop();
        self.out.label(end);
        Ok(())
    }

    /// Results go to the return slots, then control passes to the defer
    /// handler, which ends every function.
    fn emit_return(&mut self, ret: &'a ReturnStmt, span: Span) -> Result<()> {
        let results = self.func.results.clone();
        if results.iter().any(|&r| self.width(r) == Width::Aggregate) {
            return Err(CodegenError::not_yet_implemented("struct and array results", span));
        }
        if let ([call], true) = (ret.results.as_slice(), results.len() > 1) {
            let got = self.call_results(call)?;
            self.emit_call_expr(call)?;
            self.push_results(&got);
            let mut slots = Vec::with_capacity(got.len());
            for (&rt, &want) in got.iter().zip(&results) {
                self.out.pop(reg_width(self.width(rt)));
                self.convert_results(rt, want, span)?;
                let slot = self.temp_for(self.width(want));
                self.out.store_local(reg_width(self.width(want)), slot);
                slots.push(slot);
            }
            for (&slot, &want) in slots.iter().zip(&results) {
                let w = reg_width(self.width(want));
                self.out.load_local(w, slot);
                self.out.push(w);
            }
        } else {
            for (value, &want) in ret.results.iter().zip(&results) {
                self.emit_value_as(value, want)?;
                self.out.push(reg_width(self.width(want)));
            }
        }
        self.pop_results(&results);
        let label = self.func.defer_label;
        self.out.jump("jmp", label);
        Ok(())
    }

    fn convert_results(&mut self, from: GtypeId, to: GtypeId, span: Span) -> Result<()> {
        if self.program.is_interface(to) && !self.program.is_interface(from) {
            self.emit_to_interface(from, span)?;
        }
        Ok(())
    }

    /// Pops pushed results, last one first, into the return slots.
    fn pop_results(&mut self, results: &[GtypeId]) {
        let mut next = 0;
        let mut slots = Vec::with_capacity(results.len());
        for &r in results {
            let words = self.width(r).words();
            slots.push(next..next + words);
            next += words;
        }
        for range in slots.into_iter().rev() {
            for k in range.rev() {
                self.out.emit(format_args!("POP_TO_RET {}", k));
            }
        }
    }
}

/// Comment line announcing a statement; nested blocks and declarations
/// without code get none.
fn stmt_comment(kind: &StmtKind) -> Option<&'static str> {
    Some(match kind {
        StmtKind::Empty | StmtKind::Const(_) | StmtKind::Type(_) | StmtKind::Block(_) => return None,
        StmtKind::Var(_) => "var",
        StmtKind::Expr(_) => "call",
        StmtKind::Assign(a) if a.op.is_some() => "op assignment",
        StmtKind::Assign(_) => "assignment",
        StmtKind::ShortVarDecl(_) => "short var decl",
        StmtKind::IncDec(s) if s.inc => "increment",
        StmtKind::IncDec(_) => "decrement",
        StmtKind::If(_) => "if",
        StmtKind::For(f) if matches!(f.clause, ForClause::Range(_)) => "for range",
        StmtKind::For(_) => "for",
        StmtKind::Switch(_) => "switch",
        StmtKind::TypeSwitch(_) => "type switch",
        StmtKind::Return(_) => "return",
        StmtKind::Break(_) => "break",
        StmtKind::Continue(_) => "continue",
        StmtKind::Defer(_) => "defer",
    })
}
