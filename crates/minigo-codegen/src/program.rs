//! Whole-program output: functions, interface thunks, the `main` entry and
//! the data section.

use minigo_analysis::{FuncKind, Width};
use minigo_common::{FuncId, Span, VarId};
use minigo_syntax::ast::{Decl, FuncDecl};
use tracing::{debug, trace};

use crate::context::CodegenContext;
use crate::emit::Emitter;
use crate::error::{CodegenError, ErrorKind, Result};
use crate::func::FuncBuilder;

/// Symbol of the program entry.
pub const ENTRY_SYMBOL: &str = "main";

impl<'a> CodegenContext<'a> {
    /// Generates every function of every package, then the entry, and
    /// returns the data section followed by the text.
    pub fn emit_program(&mut self, main: FuncId) -> Result<String> {
        let program = self.program;
        for pkg in &program.packages {
            debug!(package = %pkg.path, "generating package");
            for file in &pkg.files {
                for decl in &file.decls {
                    if let Decl::Func(fd) = decl {
                        self.emit_func(fd)?;
                    }
                }
            }
        }
        self.emit_thunks();
        self.emit_entry(main)?;

        let text = std::mem::replace(&mut self.out, Emitter::new(false));
        self.emit_data();
        let data = std::mem::replace(&mut self.out, Emitter::new(false));
        let mut asm = data.finish();
        asm.push_str(&text.finish());
        Ok(asm)
    }

    fn emit_func(&mut self, decl: &'a FuncDecl) -> Result<()> {
        let (Some(f), Some(body)) = (decl.func, decl.body.as_ref()) else {
            return Ok(());
        };
        let program = self.program;
        let func = &program.funcs[f];
        let sym = self.func_symbol(f);
        trace!(func = %sym, "generating function");
        self.func = FuncBuilder::new(&sym, func.results.clone(), decl.defer_label);

        self.out.blank();
        self.out.label(&sym);
        self.set_position(decl.span);
        self.out.emit("FUNC_PROLOGUE");
        let alloc_at = self.out.pos();
        self.out.emit("STACK_ALLOC 0");

        self.emit_params(f)?;
        for &var in &func.locals {
            if self.func.local(var).is_none() {
                let ty = self.var_type(var, decl.span)?;
                self.func.define_local(var, self.size(ty));
            }
        }
        for flag in self.func.alloc_defer_flags(func.defer_count) {
            self.out.load_number(0);
            self.out.store_local(Width::Narrow, flag);
        }

        self.emit_block(body)?;
        self.emit_defer_handler()?;
        let frame = self.func.frame_size();
        self.out.patch(alloc_at, format_args!("STACK_ALLOC {}", frame));
        Ok(())
    }

    /// Moves incoming arguments, receiver first, into their frame slots.
    fn emit_params(&mut self, f: FuncId) -> Result<()> {
        let program = self.program;
        let func = &program.funcs[f];
        let mut widths = Vec::with_capacity(func.param_vars.len());
        if let FuncKind::Method { recv, pointer } = func.kind {
            widths.push(if pointer { Width::Narrow } else { self.width(recv) });
        }
        widths.extend(func.params.iter().map(|&p| self.width(p)));

        let mut slot = 0;
        for (var, w) in func.param_vars.iter().zip(widths) {
            if let Some(var) = *var {
                self.emit_param(var, w, slot, func.span)?;
            }
            slot += w.words();
        }
        Ok(())
    }

    fn emit_param(&mut self, var: VarId, w: Width, slot: u32, span: Span) -> Result<()> {
        let ty = self.var_type(var, span)?;
        let size = self.size(ty);
        let off = self.func.define_local(var, size);
        match w {
            Width::Aggregate => {
                self.out.emit(format_args!("LOAD_ARG {}", slot));
                self.out.push(Width::Narrow);
                self.out.load_local_addr(off);
                self.out.push(Width::Narrow);
                self.out.copy_from_stack(size);
            }
            w => {
                for k in 0..w.words() {
                    self.out.emit(format_args!("STORE_ARG_TO_LOCAL {} {}", slot + k, off + 8 * k as i32));
                }
            }
        }
        Ok(())
    }

    /// Every return jumps here. Flagged deferred calls run last first,
    /// with the return slots saved around them.
    fn emit_defer_handler(&mut self) -> Result<()> {
        self.out.label(self.func.defer_label);
        let defers = self.func.defers_lifo();
        if !defers.is_empty() {
            let words: u32 = self
                .func
                .results
                .iter()
                .map(|&r| self.width(r).words())
                .sum();
            for k in 0..words {
                self.out.emit(format_args!("PUSH_RET {}", k));
            }
            for d in defers {
                let skip = self.new_label();
                self.out.load_local(Width::Narrow, d.flag);
                self.out.emit("TEST_IT");
                self.out.jump("je", skip);
                self.emit_call_expr(d.call)?;
                self.out.label(skip);
            }
            for k in (0..words).rev() {
                self.out.emit(format_args!("POP_TO_RET {}", k));
            }
        }
        self.out.emit("FUNC_EPILOGUE");
        Ok(())
    }

    /// `main`: global initializers and `init` of each package in order,
    /// then `main.main`.
    fn emit_entry(&mut self, main: FuncId) -> Result<()> {
        let program = self.program;
        let label = self.new_label();
        self.func = FuncBuilder::new(ENTRY_SYMBOL, Vec::new(), label);
        self.out.blank();
        self.out.label(ENTRY_SYMBOL);
        self.out.emit("FUNC_PROLOGUE");
        let alloc_at = self.out.pos();
        self.out.emit("STACK_ALLOC 0");

        for pkg in &program.packages {
            for init in &pkg.init_order {
                let Some(Decl::Var(decl)) = pkg
                    .files
                    .get(init.file)
                    .and_then(|file| file.decls.get(init.decl))
                else {
                    return Err(CodegenError::internal("global initializer out of range", pkg_span(pkg)));
                };
                let Some(spec) = decl.specs.get(init.spec) else {
                    return Err(CodegenError::internal("global initializer out of range", decl.span));
                };
                self.set_position(spec.span);
                self.emit_var_spec(spec)?;
            }
            if let Some(init) = pkg.init {
                let sym = self.func_symbol(init);
                self.out.funcall(&sym);
            }
        }
        let sym = self.func_symbol(main);
        self.out.funcall(&sym);
        self.out.load_number(0);
        self.out.emit("FUNC_EPILOGUE");
        let frame = self.func.frame_size();
        self.out.patch(alloc_at, format_args!("STACK_ALLOC {}", frame));
        Ok(())
    }

    fn emit_data(&mut self) {
        let strings: Vec<(usize, String)> = self.strings().map(|(i, s)| (i, s.to_owned())).collect();
        for (i, text) in strings {
            self.out.label(format_args!(".S{}", i));
            self.out.directive(format_args!(".string \"{}\"", text));
        }
        self.emit_type_tables();
        self.emit_method_names();

        let program = self.program;
        for pkg in &program.packages {
            for &var in &pkg.globals {
                let size = program.vars[var].gtype().map_or(8, |t| self.size(t).max(8));
                let sym = self.global_symbol(var);
                self.out.label(&sym);
                self.out.directive(format_args!(".zero {}", size));
            }
        }
    }
}

fn pkg_span(pkg: &minigo_analysis::Package) -> Span {
    pkg.files
        .first()
        .map_or(Span::dummy(), |f| f.package.span)
}

/// `MissingMain` when the program has no `main.main`.
pub(crate) fn missing_main() -> CodegenError {
    CodegenError::new(ErrorKind::MissingMain, Span::dummy())
}
