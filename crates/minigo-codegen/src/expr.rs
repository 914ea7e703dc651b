//! Expression lowering.
//!
//! A narrow or byte value ends up in `%rax`, a wide value in `%rax %rbx
//! %rcx`, and an aggregate as its address in `%rax`.

use minigo_analysis::{ConstKind, ConstValue, GtypeKind, RuntimeFn, Width};
use minigo_common::{ConstId, Entity, GtypeId, Span};
use minigo_syntax::ast::{
    BinaryExpr, BinaryOp, CompositeElems, CompositeLit, Expr, ExprKind, SliceExpr, UnaryOp,
};

use crate::context::{reg_width, CodegenContext, Place};
use crate::error::{CodegenError, ErrorKind, Result};

impl CodegenContext<'_> {
    pub fn emit_expr(&mut self, e: &Expr) -> Result<()> {
        match &e.kind {
            ExprKind::IntLit(n) => self.out.load_number(*n),
            ExprKind::CharLit(c) => self.out.load_number(*c as i64),
            ExprKind::StringLit(s) => self.load_string(&s.text, s.len),
            ExprKind::Ident(rel) => match rel.entity() {
                Some(Entity::Var(v)) => {
                    let ty = self.var_type(v, e.span)?;
                    let place = self.var_place(v, e.span)?;
                    self.load_place(&place, self.width(ty));
                }
                Some(Entity::Const(c)) => self.emit_const(c, e)?,
                Some(Entity::Func(_)) => {
                    return Err(CodegenError::not_yet_implemented("function values", e.span))
                }
                _ => {
                    let name = self.name(rel.name().symbol).to_owned();
                    return Err(CodegenError::undefined(&name, e.span));
                }
            },
            ExprKind::Unary(op, x) => self.emit_unary(*op, x, e)?,
            ExprKind::Binary(b) => self.emit_binary(b, e.span)?,
            ExprKind::Call(call) => self.emit_call(call, e)?,
            ExprKind::MethodCall(m) => self.emit_method_call(m, e.span)?,
            ExprKind::Selector(..) => {
                let ty = self.ty(e)?;
                match self.place_of(e)? {
                    Place::Indirect => {
                        self.emit_address(e)?;
                        self.load_from_rax(ty);
                    }
                    place => self.load_place(&place, self.width(ty)),
                }
            }
            ExprKind::Index(base, index) => {
                let program = self.program;
                let bt = self.ty(base)?;
                if let GtypeKind::Map { key, value } = program.kind(bt) {
                    let (key, value) = (*key, *value);
                    self.emit_map_get(base, index, key, value)?;
                } else {
                    let ty = self.ty(e)?;
                    self.emit_address(e)?;
                    self.load_from_rax(ty);
                }
            }
            ExprKind::Slice(s) => self.emit_slice_expr(s, e.span)?,
            ExprKind::TypeAssert(x, t) => {
                let target = t.gtype.ok_or_else(|| CodegenError::new(ErrorKind::MissingType, t.span))?;
                self.emit_type_assert(x, target, false, e.span)?;
            }
            ExprKind::CompositeLit(lit) => self.emit_composite(lit, e.span)?,
            ExprKind::Make(m) => {
                let ty = m.ty.gtype.ok_or_else(|| CodegenError::new(ErrorKind::MissingType, m.ty.span))?;
                self.emit_make(ty, &m.args, e.span)?;
            }
            ExprKind::Conversion(t, x) => {
                let target = t.gtype.ok_or_else(|| CodegenError::new(ErrorKind::MissingType, t.span))?;
                self.emit_conversion(target, x)?;
            }
        }
        Ok(())
    }

    /// Evaluates `e` for storing where a `target` is expected: `nil` becomes
    /// the zero value and concrete values headed for an interface are boxed.
    pub fn emit_value_as(&mut self, e: &Expr, target: GtypeId) -> Result<()> {
        if self.is_nil(e) {
            self.out.load_empty(self.width(target));
            return Ok(());
        }
        self.emit_expr(e)?;
        let vt = self.ty(e)?;
        if self.program.is_interface(target) && !self.program.is_interface(vt) {
            self.emit_to_interface(vt, e.span)?;
        }
        Ok(())
    }

    fn emit_const(&mut self, c: ConstId, e: &Expr) -> Result<()> {
        let constant = &self.program.consts[c];
        match (&constant.value, constant.kind) {
            (_, ConstKind::Nil) => {
                let w = e.ty.map_or(Width::Narrow, |t| self.width(t));
                self.out.load_empty(w);
            }
            (Some(ConstValue::Int(n)), _) => self.out.load_number(*n),
            (Some(ConstValue::Bool(b)), _) => self.out.load_number(*b as i64),
            (Some(ConstValue::Str { text, len }), _) => {
                let (text, len) = (text.clone(), *len);
                self.load_string(&text, len);
            }
            (None, _) => {
                let name = self.name(constant.name).to_owned();
                return Err(CodegenError::internal(&format!("constant {} has no value", name), e.span));
            }
        }
        Ok(())
    }

    fn emit_unary(&mut self, op: UnaryOp, x: &Expr, e: &Expr) -> Result<()> {
        match op {
            UnaryOp::Neg => {
                self.emit_expr(x)?;
                self.out.emit("NEGATE");
            }
            UnaryOp::Not => {
                self.emit_expr(x)?;
                self.out.emit("LOGICAL_NOT");
            }
            UnaryOp::Addr => self.emit_address(x)?,
            UnaryOp::Deref => {
                self.emit_expr(x)?;
                let ty = self.ty(e)?;
                self.load_from_rax(ty);
            }
        }
        Ok(())
    }

    // === Places ===

    /// A place known without run-time address arithmetic, if `e` has one.
    pub fn place_of(&self, e: &Expr) -> Result<Place> {
        match &e.kind {
            ExprKind::Ident(rel) => match rel.entity() {
                Some(Entity::Var(v)) => self.var_place(v, e.span),
                _ => Ok(Place::Indirect),
            },
            ExprKind::Selector(base, field) => {
                let bt = self.ty(base)?;
                if self.program.is_pointer(bt) {
                    return Ok(Place::Indirect);
                }
                let offset = self.field_offset(bt, field.symbol, e.span)?;
                Ok(match self.place_of(base)? {
                    Place::Local(off) => Place::Local(off + offset as i32),
                    Place::Global(sym, off) => Place::Global(sym, off + offset),
                    Place::Indirect => Place::Indirect,
                })
            }
            _ => Ok(Place::Indirect),
        }
    }

    pub fn field_offset(&self, ty: GtypeId, field: minigo_common::Symbol, span: Span) -> Result<u32> {
        match self.program.field(ty, field) {
            Some((_, Some(offset))) => Ok(offset),
            Some((_, None)) => Err(CodegenError::internal("struct has no layout", span)),
            None => {
                let name = self.name(field).to_owned();
                Err(CodegenError::undefined(&name, span))
            }
        }
    }

    /// Computes the address of an addressable expression into `%rax`.
    pub fn emit_address(&mut self, e: &Expr) -> Result<()> {
        match &e.kind {
            ExprKind::Ident(_) => {
                let place = self.place_of(e)?;
                if place == Place::Indirect {
                    return Err(CodegenError::new(ErrorKind::InvalidAssignTarget, e.span));
                }
                self.load_place_addr(&place);
            }
            ExprKind::Selector(base, field) => {
                let bt = self.ty(base)?;
                let offset = self.field_offset(bt, field.symbol, e.span)?;
                if self.program.is_pointer(bt) {
                    self.emit_expr(base)?;
                } else {
                    self.emit_address(base)?;
                }
                self.out.add_number(offset as i64);
            }
            ExprKind::Index(base, index) => {
                let program = self.program;
                let bt = self.ty(base)?;
                let elem = self.ty(e)?;
                match program.kind(bt) {
                    GtypeKind::Map { .. } => {
                        return Err(CodegenError::new(ErrorKind::InvalidAssignTarget, e.span))
                    }
                    GtypeKind::Array { .. } => self.emit_address(base)?,
                    _ => self.emit_expr(base)?,
                }
                self.out.push(Width::Narrow);
                self.emit_expr(index)?;
                self.out.emit(format_args!("IMUL_NUMBER {}", self.size(elem)));
                self.out.push(Width::Narrow);
                self.out.emit("SUM_FROM_STACK");
            }
            ExprKind::Unary(UnaryOp::Deref, p) => self.emit_expr(p)?,
            ExprKind::CompositeLit(lit) => {
                let ty = self.ty(e)?;
                self.emit_composite(lit, e.span)?;
                if self.width(ty) != Width::Aggregate {
                    self.emit_box(ty)?;
                }
            }
            _ => {
                let ty = self.ty(e)?;
                if self.width(ty) != Width::Aggregate {
                    return Err(CodegenError::new(ErrorKind::InvalidAssignTarget, e.span));
                }
                self.emit_expr(e)?;
            }
        }
        Ok(())
    }

    /// Copies the value in registers to a fresh heap cell and leaves its
    /// address in `%rax`.
    pub fn emit_box(&mut self, ty: GtypeId) -> Result<()> {
        let w = self.width(ty);
        let size = self.size(ty).max(8);
        if w == Width::Aggregate {
            let cell = self.func.alloc_temp(8);
            self.out.push(Width::Narrow);
            self.malloc_const(size);
            self.out.store_local(Width::Narrow, cell);
            self.out.push(Width::Narrow);
            self.out.copy_from_stack(size);
            self.out.load_local(Width::Narrow, cell);
        } else {
            self.out.push(reg_width(w));
            self.malloc_const(size);
            self.out.push(Width::Narrow);
            self.out.store_indirect(w);
        }
        Ok(())
    }

    // === Operators ===

    fn emit_binary(&mut self, b: &BinaryExpr, span: Span) -> Result<()> {
        match b.op {
            BinaryOp::AndAnd | BinaryOp::OrOr => return self.emit_logical(b),
            op if op.is_comparison() => return self.emit_comparison(b, span),
            _ => {}
        }
        self.emit_expr(&b.left)?;
        self.emit_arith_rest(b, span)
    }

    /// Finishes an arithmetic operator whose left operand is already in
    /// registers.
    pub fn emit_arith_rest(&mut self, b: &BinaryExpr, span: Span) -> Result<()> {
        let ty = self.ty(&b.left).or_else(|_| self.ty(&b.right))?;
        if self.program.is_string(ty) {
            // Only + is defined on strings.
            self.out.push(Width::Wide);
            self.emit_expr(&b.right)?;
            self.out.push(Width::Wide);
            self.call_runtime(RuntimeFn::Strcat);
            return Ok(());
        }
        self.out.push(Width::Narrow);
        self.emit_expr(&b.right)?;
        self.out.push(Width::Narrow);
        let op = match b.op {
            BinaryOp::Add => "SUM_FROM_STACK",
            BinaryOp::Sub => "SUB_FROM_STACK",
            BinaryOp::Mul => "IMUL_FROM_STACK",
            BinaryOp::Div => "DIV_FROM_STACK",
            BinaryOp::Rem => "MOD_FROM_STACK",
            op => {
                return Err(CodegenError::internal(
                    &format!("unexpected operator {}", op.as_str()),
                    span,
                ))
            }
        };
        self.out.emit(op);
        Ok(())
    }

    fn emit_logical(&mut self, b: &BinaryExpr) -> Result<()> {
        let short = self.new_label();
        let end = self.new_label();
        // && stops at the first false operand, || at the first true one.
        let (jump, short_value) = match b.op {
            BinaryOp::AndAnd => ("je", 0),
            _ => ("jne", 1),
        };
        self.emit_expr(&b.left)?;
        self.out.emit("TEST_IT");
        self.out.jump(jump, short);
        self.emit_expr(&b.right)?;
        self.out.emit("TEST_IT");
        self.out.jump(jump, short);
        self.out.load_number(1 - short_value);
        self.out.jump("jmp", end);
        self.out.label(short);
        self.out.load_number(short_value);
        self.out.label(end);
        Ok(())
    }

    fn emit_comparison(&mut self, b: &BinaryExpr, span: Span) -> Result<()> {
        let set = match b.op {
            BinaryOp::Eq => "sete",
            BinaryOp::Ne => "setne",
            BinaryOp::Lt => "setl",
            BinaryOp::Gt => "setg",
            BinaryOp::Le => "setle",
            _ => "setge",
        };
        let (left_nil, right_nil) = (self.is_nil(&b.left), self.is_nil(&b.right));
        if left_nil || right_nil {
            let other = if left_nil { &b.right } else { &b.left };
            self.emit_nil_word(other)?;
            self.out.push(Width::Narrow);
            self.out.load_number(0);
            self.out.push(Width::Narrow);
            self.out.emit(format_args!("CMP_FROM_STACK {}", set));
            return Ok(());
        }
        let ty = self.ty(&b.left)?;
        match self.width(ty) {
            Width::Byte | Width::Narrow => {
                self.emit_expr(&b.left)?;
                self.out.push(Width::Narrow);
                self.emit_expr(&b.right)?;
                self.out.push(Width::Narrow);
            }
            Width::Wide if self.program.is_string(ty) => {
                self.emit_strcmp(&b.left, &b.right, ty)?;
                self.out.push(Width::Narrow);
                self.out.load_number(0);
                self.out.push(Width::Narrow);
            }
            _ => {
                let name = self.type_name(ty);
                return Err(CodegenError::not_yet_implemented(
                    &format!("comparison of {} values", name),
                    span,
                ));
            }
        }
        self.out.emit(format_args!("CMP_FROM_STACK {}", set));
        Ok(())
    }

    /// `iruntime.strcmp(left, right)` into `%rax`: zero when equal.
    pub fn emit_strcmp(&mut self, left: &Expr, right: &Expr, ty: GtypeId) -> Result<()> {
        self.emit_value_as(left, ty)?;
        self.out.push(Width::Wide);
        self.emit_value_as(right, ty)?;
        self.out.push(Width::Wide);
        self.call_runtime(RuntimeFn::Strcmp);
        Ok(())
    }

    /// Loads the word that is zero exactly when `e` is nil: the type id of
    /// an interface, the pointer of a slice, or the value itself.
    fn emit_nil_word(&mut self, e: &Expr) -> Result<()> {
        self.emit_expr(e)?;
        let ty = self.ty(e)?;
        if self.width(ty) == Width::Wide {
            let tmp = self.func.alloc_temp(24);
            self.out.store_local(Width::Wide, tmp);
            let word = if self.program.is_interface(ty) { 8 } else { 0 };
            self.out.load_local(Width::Narrow, tmp + word);
        }
        Ok(())
    }

    // === Slicing ===

    fn emit_slice_expr(&mut self, s: &SliceExpr, span: Span) -> Result<()> {
        let bt = self.ty(&s.expr)?;
        let (elem_size, array_len, is_string) = match self.program.kind(bt) {
            GtypeKind::String => (1, None, true),
            GtypeKind::Slice(elem) => (self.size(*elem), None, false),
            GtypeKind::Array { elem, len } => (self.size(*elem), Some(len.unwrap_or(0)), false),
            GtypeKind::Pointer(p) => match self.program.kind(*p) {
                GtypeKind::Array { elem, len } => (self.size(*elem), Some(len.unwrap_or(0)), false),
                _ => return Err(CodegenError::internal("slice of non-array pointer", span)),
            },
            _ => return Err(CodegenError::internal("slice of unsliceable value", span)),
        };

        // The operand as pointer, length and capacity.
        let base = self.func.alloc_temp(24);
        match array_len {
            Some(len) => {
                if self.program.is_pointer(bt) {
                    self.emit_expr(&s.expr)?;
                } else {
                    self.emit_address(&s.expr)?;
                }
                self.out.store_local(Width::Narrow, base);
                self.out.load_number(len);
                self.out.store_local(Width::Narrow, base + 8);
                self.out.store_local(Width::Narrow, base + 16);
            }
            None => {
                self.emit_expr(&s.expr)?;
                self.out.store_local(Width::Wide, base);
            }
        }

        let low = self.slice_bound(s.low.as_ref(), None)?;
        let high = self.slice_bound(s.high.as_ref(), Some(base + 8))?;
        let max = self.slice_bound(s.max.as_ref(), Some(base + 16))?;

        // ptr + low*size
        self.out.load_local(Width::Narrow, base);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, low);
        self.out.emit(format_args!("IMUL_NUMBER {}", elem_size));
        self.out.push(Width::Narrow);
        self.out.emit("SUM_FROM_STACK");
        self.out.push(Width::Narrow);
        // high - low
        self.out.load_local(Width::Narrow, high);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, low);
        self.out.push(Width::Narrow);
        self.out.emit("SUB_FROM_STACK");
        self.out.push(Width::Narrow);
        // max - low; a string's capacity is its length
        if is_string {
            self.out.push(Width::Narrow);
        } else {
            self.out.load_local(Width::Narrow, max);
            self.out.push(Width::Narrow);
            self.out.load_local(Width::Narrow, low);
            self.out.push(Width::Narrow);
            self.out.emit("SUB_FROM_STACK");
            self.out.push(Width::Narrow);
        }
        self.out.pop(Width::Wide);
        Ok(())
    }

    /// Evaluates a slice bound into a frame slot; a missing bound is 0 or
    /// the word at `default`.
    fn slice_bound(&mut self, bound: Option<&Expr>, default: Option<i32>) -> Result<i32> {
        let slot = self.func.alloc_temp(8);
        match (bound, default) {
            (Some(e), _) => self.emit_expr(e)?,
            (None, Some(off)) => self.out.load_local(Width::Narrow, off),
            (None, None) => self.out.load_number(0),
        }
        self.out.store_local(Width::Narrow, slot);
        Ok(slot)
    }

    // === Composite literals ===

    /// Structs and arrays are built in a fresh zeroed heap block whose
    /// address is left in `%rax`; slices yield their three words; maps a
    /// header pointer.
    pub fn emit_composite(&mut self, lit: &CompositeLit, span: Span) -> Result<()> {
        let ty = lit.ty.gtype.ok_or_else(|| CodegenError::new(ErrorKind::MissingType, lit.ty.span))?;
        match (self.program.kind(ty).clone(), &lit.elems) {
            (GtypeKind::Struct(fields), elems) => {
                let base = self.func.alloc_temp(8);
                let size = self.size(ty);
                self.malloc_const(size);
                self.out.store_local(Width::Narrow, base);
                self.out.zero_at_rax(size);
                match elems {
                    CompositeElems::Fields(inits) => {
                        for init in inits {
                            let Some(field) = fields.iter().find(|f| f.name == init.name.symbol) else {
                                let name = self.name(init.name.symbol).to_owned();
                                return Err(CodegenError::undefined(&name, init.name.span));
                            };
                            self.emit_value_as(&init.value, field.ty)?;
                            self.store_at(base, field.offset.unwrap_or(0), field.ty);
                        }
                    }
                    CompositeElems::Positional(values) => {
                        for (value, field) in values.iter().zip(&fields) {
                            self.emit_value_as(value, field.ty)?;
                            self.store_at(base, field.offset.unwrap_or(0), field.ty);
                        }
                    }
                    CompositeElems::Map(_) => {
                        return Err(CodegenError::internal("key-value pairs in struct literal", span))
                    }
                }
                self.out.load_local(Width::Narrow, base);
            }
            (GtypeKind::Array { elem, .. }, CompositeElems::Positional(values)) => {
                let base = self.func.alloc_temp(8);
                let size = self.size(ty);
                let elem_size = self.size(elem);
                self.malloc_const(size);
                self.out.store_local(Width::Narrow, base);
                self.out.zero_at_rax(size);
                for (i, value) in values.iter().enumerate() {
                    self.emit_value_as(value, elem)?;
                    self.store_at(base, i as u32 * elem_size, elem);
                }
                self.out.load_local(Width::Narrow, base);
            }
            (GtypeKind::Slice(elem), CompositeElems::Positional(values)) => {
                self.emit_slice_of(elem, values)?;
            }
            (GtypeKind::Map { key, value }, elems) => {
                self.emit_make(ty, &[], span)?;
                if let CompositeElems::Map(pairs) = elems {
                    let header = self.func.alloc_temp(8);
                    self.out.store_local(Width::Narrow, header);
                    for (k, v) in pairs {
                        self.emit_value_as(v, value)?;
                        self.emit_map_store_into(header, k, key, value)?;
                    }
                    self.out.load_local(Width::Narrow, header);
                }
            }
            _ => {
                let name = self.type_name(ty);
                return Err(CodegenError::internal(&format!("composite literal of {}", name), span));
            }
        }
        Ok(())
    }

    /// A new slice holding `values`, in `%rax %rbx %rcx`.
    pub fn emit_slice_of(&mut self, elem: GtypeId, values: &[Expr]) -> Result<()> {
        if values.is_empty() {
            self.out.load_empty(Width::Wide);
            return Ok(());
        }
        let n = values.len() as i64;
        let elem_size = self.size(elem);
        let base = self.func.alloc_temp(8);
        self.malloc_const(elem_size * values.len() as u32);
        self.out.store_local(Width::Narrow, base);
        for (i, value) in values.iter().enumerate() {
            self.emit_value_as(value, elem)?;
            self.store_at(base, i as u32 * elem_size, elem);
        }
        self.out.load_local(Width::Narrow, base);
        self.out.push(Width::Narrow);
        self.out.load_number(n);
        self.out.push(Width::Narrow);
        self.out.push(Width::Narrow);
        self.out.pop(Width::Wide);
        Ok(())
    }

    // === Make and conversions ===

    pub fn emit_make(&mut self, ty: GtypeId, args: &[Expr], span: Span) -> Result<()> {
        match self.program.kind(ty).clone() {
            GtypeKind::Map { .. } => {
                // The hint only sizes the first growth; an empty header grows on demand.
                self.malloc_const(24);
                self.out.zero_at_rax(24);
            }
            GtypeKind::Slice(elem) => {
                let elem_size = self.size(elem);
                let len = self.func.alloc_temp(8);
                let cap = self.func.alloc_temp(8);
                let Some(first) = args.first() else {
                    return Err(CodegenError::internal("make of a slice without a length", span));
                };
                self.emit_expr(first)?;
                self.out.store_local(Width::Narrow, len);
                match args.get(1) {
                    Some(c) => self.emit_expr(c)?,
                    None => self.out.load_local(Width::Narrow, len),
                }
                self.out.store_local(Width::Narrow, cap);
                self.out.emit(format_args!("IMUL_NUMBER {}", elem_size));
                self.malloc_dynamic();
                self.out.push(Width::Narrow);
                self.out.load_local(Width::Narrow, len);
                self.out.push(Width::Narrow);
                self.out.load_local(Width::Narrow, cap);
                self.out.push(Width::Narrow);
                self.out.pop(Width::Wide);
            }
            _ => {
                let name = self.type_name(ty);
                return Err(CodegenError::internal(&format!("make of {}", name), span));
            }
        }
        Ok(())
    }

    pub fn emit_conversion(&mut self, target: GtypeId, x: &Expr) -> Result<()> {
        if self.is_nil(x) {
            self.out.load_empty(self.width(target));
            return Ok(());
        }
        self.emit_value_as(x, target)?;
        let from = self.ty(x)?;
        if self.width(target) == Width::Byte && self.width(from) != Width::Byte {
            self.out.emit("movzbq %al, %rax");
        }
        if self.program.is_string(target) && !self.program.is_string(from) {
            // A string's capacity word mirrors its length.
            self.out.emit("movq %rbx, %rcx");
        }
        Ok(())
    }
}
