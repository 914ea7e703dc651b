//! Codegen context - program-wide generation state and the helpers every
//! lowering module shares.

use indexmap::{IndexMap, IndexSet};
use minigo_analysis::{Program, RuntimeFn, Width};
use minigo_common::{AsmLabel, CompilationContext, GtypeId, Span, Symbol, VarId};
use minigo_syntax::ast::Expr;

use crate::emit::Emitter;
use crate::error::{CodegenError, ErrorKind, Result};
use crate::func::FuncBuilder;

/// Where a variable or a field of one lives, when that is known without
/// computing an address at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Place {
    Local(i32),
    Global(String, u32),
    /// Anything else: the address is computed into `%rax`.
    Indirect,
}

/// Register width of a value: bytes travel as full words.
pub(crate) fn reg_width(w: Width) -> Width {
    match w {
        Width::Byte => Width::Narrow,
        w => w,
    }
}

pub struct CodegenContext<'a> {
    pub program: &'a Program,
    pub ctx: &'a mut CompilationContext,
    pub out: Emitter,
    pub func: FuncBuilder<'a>,

    /// String literal text to its `.S<n>` index.
    strings: IndexMap<String, usize>,
    /// Method names that need a `.MN_<name>` label.
    method_names: IndexSet<String>,
}

impl<'a> CodegenContext<'a> {
    pub fn new(program: &'a Program, ctx: &'a mut CompilationContext, emit_position: bool) -> Self {
        let label = ctx.new_label();
        Self {
            program,
            ctx,
            out: Emitter::new(emit_position),
            func: FuncBuilder::new("", Vec::new(), label),
            strings: IndexMap::new(),
            method_names: IndexSet::new(),
        }
    }

    // === Names ===

    pub fn new_label(&mut self) -> AsmLabel {
        self.ctx.new_label()
    }

    pub fn name(&self, sym: Symbol) -> &str {
        self.ctx.interner.name(sym)
    }

    pub fn func_symbol(&self, f: minigo_common::FuncId) -> String {
        self.program.func_symbol(f, &self.ctx.interner)
    }

    pub fn global_symbol(&self, v: VarId) -> String {
        self.program.global_symbol(v, &self.ctx.interner)
    }

    pub fn type_name(&self, ty: GtypeId) -> String {
        self.program.type_name(ty, &self.ctx.interner)
    }

    pub fn type_id(&self, ty: GtypeId, span: Span) -> Result<u32> {
        self.program.type_id(ty, &self.ctx.interner).ok_or_else(|| {
            CodegenError::internal(&format!("no type id for {}", self.type_name(ty)), span)
        })
    }

    /// `.S<n>` for a string literal, written as it appears in the source.
    pub fn string_label(&mut self, text: &str) -> String {
        let next = self.strings.len();
        let index = *self.strings.entry(text.to_owned()).or_insert(next);
        format!(".S{}", index)
    }

    pub fn strings(&self) -> impl Iterator<Item = (usize, &str)> {
        self.strings.iter().map(|(text, &i)| (i, text.as_str()))
    }

    pub fn method_name_label(&mut self, name: &str) -> String {
        self.method_names.insert(name.to_owned());
        format!(".MN_{}", name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.method_names.iter().map(String::as_str)
    }

    pub fn set_position(&mut self, span: Span) {
        let source_map = &self.ctx.source_map;
        self.out.set_position(|| source_map.format_span(span));
    }

    // === Types ===

    pub fn ty(&self, e: &Expr) -> Result<GtypeId> {
        e.ty.ok_or_else(|| CodegenError::new(ErrorKind::MissingType, e.span))
    }

    pub fn width(&self, ty: GtypeId) -> Width {
        self.program.width(ty)
    }

    pub fn size(&self, ty: GtypeId) -> u32 {
        self.program.size(ty)
    }

    pub fn var_type(&self, var: VarId, span: Span) -> Result<GtypeId> {
        self.program.vars[var]
            .gtype()
            .ok_or_else(|| CodegenError::new(ErrorKind::MissingType, span))
    }

    pub fn is_nil(&self, e: &Expr) -> bool {
        matches!(
            e.as_relation().and_then(|r| r.entity()),
            Some(minigo_common::Entity::Const(c)) if c == self.program.nil
        )
    }

    pub fn is_blank(&self, e: &Expr) -> bool {
        e.as_relation()
            .is_some_and(|r| r.name().symbol == self.program.blank)
    }

    // === Frame helpers ===

    /// A scratch slot wide enough for a value of width `w` in registers.
    pub fn temp_for(&mut self, w: Width) -> i32 {
        match w {
            Width::Wide => self.func.alloc_temp(24),
            _ => self.func.alloc_temp(8),
        }
    }

    /// Where variable `var` lives.
    pub fn var_place(&self, var: VarId, span: Span) -> Result<Place> {
        if self.program.vars[var].is_global() {
            return Ok(Place::Global(self.global_symbol(var), 0));
        }
        match self.func.local(var) {
            Some(off) => Ok(Place::Local(off)),
            None => {
                let name = self.name(self.program.vars[var].name).to_owned();
                Err(CodegenError::undefined(&name, span))
            }
        }
    }

    /// Loads the value at a known place. Aggregates load their address.
    pub fn load_place(&mut self, place: &Place, w: Width) {
        match (place, w) {
            (Place::Local(off), Width::Aggregate) => self.out.load_local_addr(*off),
            (Place::Local(off), w) => self.out.load_local(w, *off),
            (Place::Global(sym, off), Width::Aggregate) => self.out.load_global_addr(sym, *off),
            (Place::Global(sym, off), w) => self.out.load_global(w, sym, *off),
            (Place::Indirect, Width::Aggregate) => {}
            (Place::Indirect, w) => self.out.load_deref(w),
        }
    }

    pub fn load_place_addr(&mut self, place: &Place) {
        match place {
            Place::Local(off) => self.out.load_local_addr(*off),
            Place::Global(sym, off) => self.out.load_global_addr(sym, *off),
            Place::Indirect => {}
        }
    }

    /// Stores the value in registers to a known place. For aggregates the
    /// registers hold the source address and the bytes are copied.
    pub fn store_place(&mut self, place: &Place, ty: GtypeId) {
        let w = self.width(ty);
        match (place, w) {
            (Place::Indirect, _) => {}
            (place, Width::Aggregate) => {
                let size = self.size(ty);
                self.out.push(Width::Narrow);
                self.load_place_addr(place);
                self.out.push(Width::Narrow);
                self.out.copy_from_stack(size);
            }
            (Place::Local(off), w) => self.out.store_local(w, *off),
            (Place::Global(sym, off), w) => self.out.store_global(w, sym, *off),
        }
    }

    /// Stores the value in registers at `offset` bytes past the address
    /// held in the frame slot `base`.
    pub fn store_at(&mut self, base: i32, offset: u32, ty: GtypeId) {
        let (w, size) = (self.width(ty), self.size(ty));
        self.out.push(reg_width(w));
        self.out.load_local(Width::Narrow, base);
        self.out.add_number(offset as i64);
        self.out.push(Width::Narrow);
        match w {
            Width::Aggregate => self.out.copy_from_stack(size),
            w => self.out.store_indirect(w),
        }
    }

    /// Loads a value of type `ty` from the address in `%rax`.
    pub fn load_from_rax(&mut self, ty: GtypeId) {
        match self.width(ty) {
            Width::Aggregate => {}
            w => self.out.load_deref(w),
        }
    }

    // === Calls ===

    /// Moves `words` pushed words into argument slots `0..words`.
    pub fn pop_args(&mut self, words: u32) {
        for k in (0..words).rev() {
            self.out.emit(format_args!("POP_TO_ARG {}", k));
        }
    }

    /// Calls a runtime primitive whose arguments are already pushed.
    pub fn call_runtime(&mut self, f: RuntimeFn) {
        self.pop_args(f.words().0);
        self.out.funcall(&f.symbol());
    }

    pub fn malloc_const(&mut self, size: u32) {
        self.out.load_number(size as i64);
        self.malloc_dynamic();
    }

    /// Allocates the number of bytes in `%rax`.
    pub fn malloc_dynamic(&mut self) {
        self.out.push(Width::Narrow);
        self.call_runtime(RuntimeFn::Malloc);
    }

    pub fn load_string(&mut self, text: &str, len: usize) {
        let label = self.string_label(text);
        self.out.emit(format_args!("LOAD_STRING_LITERAL {} {}", label, len));
    }

    pub fn panic_with(&mut self, message: &str) {
        self.load_string(message, message.len());
        self.out.push(Width::Wide);
        self.call_runtime(RuntimeFn::Panic);
    }
}
