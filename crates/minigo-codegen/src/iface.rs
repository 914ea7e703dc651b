//! Interfaces.
//!
//! An interface value is three words: a pointer to a heap copy of the
//! dynamic value, the dynamic type id, and the address of the type's
//! descriptor `.T<id>`. A nil interface is all zeros.
//!
//! A descriptor holds the id, the name and a method table. Method tables
//! pair a method name label with a thunk, which receives the data pointer
//! as its first argument and calls the method with the receiver it expects.

use minigo_analysis::{FuncKind, Width};
use minigo_common::{FuncId, GtypeId, Span};
use minigo_syntax::ast::Expr;

use crate::context::{reg_width, CodegenContext};
use crate::error::Result;

/// A method reachable through an interface holding a given dynamic type.
#[derive(Debug, Clone)]
pub struct ThunkEntry {
    pub method: String,
    pub func: FuncId,
    pub symbol: String,
}

impl CodegenContext<'_> {
    /// Wraps the concrete value of type `vt` in registers into an interface.
    pub fn emit_to_interface(&mut self, vt: GtypeId, span: Span) -> Result<()> {
        let id = self.type_id(vt, span)?;
        self.emit_box(vt)?;
        self.out.push(Width::Narrow);
        self.out.load_number(id as i64);
        self.out.push(Width::Narrow);
        self.out.emit(format_args!("LOAD_TYPE_DESCRIPTOR .T{}", id));
        self.out.push(Width::Narrow);
        self.out.pop(Width::Wide);
        Ok(())
    }

    /// `x.(T)`. Without `want_ok` a failed assertion panics; with it the
    /// zero value is produced and the returned slot holds the "ok" flag.
    pub fn emit_type_assert(&mut self, x: &Expr, target: GtypeId, want_ok: bool, span: Span) -> Result<Option<i32>> {
        let iface = self.func.alloc_temp(24);
        let ok = want_ok.then(|| self.func.alloc_temp(8));
        self.emit_expr(x)?;
        self.out.store_local(Width::Wide, iface);
        self.out.load_local(Width::Narrow, iface + 8);
        self.emit_type_match(target, span)?;

        let (fail, end) = (self.new_label(), self.new_label());
        let w = self.width(target);
        self.out.emit("TEST_IT");
        self.out.jump("je", fail);
        if self.program.is_interface(target) {
            self.out.load_local(Width::Wide, iface);
        } else {
            self.out.load_local(Width::Narrow, iface);
            self.load_from_rax(target);
        }
        if let Some(ok) = ok {
            self.out.push(reg_width(w));
            self.out.load_number(1);
            self.out.store_local(Width::Narrow, ok);
            self.out.pop(reg_width(w));
        }
        self.out.jump("jmp", end);

        self.out.label(fail);
        match ok {
            Some(ok) => {
                self.out.load_number(0);
                self.out.store_local(Width::Narrow, ok);
            }
            None => {
                let message = format!("interface conversion: interface is not {}", self.type_name(target));
                self.panic_with(&message);
            }
        }
        if w == Width::Aggregate {
            let size = self.size(target);
            self.malloc_const(size);
            self.out.zero_at_rax(size);
        } else {
            self.out.load_empty(w);
        }
        self.out.label(end);
        Ok(ok)
    }

    /// With a dynamic type id in `%rax`, leaves 1 in `%rax` if it is
    /// `target` (or, for an interface, implements it) and 0 otherwise.
    pub fn emit_type_match(&mut self, target: GtypeId, span: Span) -> Result<()> {
        let program = self.program;
        let Some(methods) = program.interface_methods(target) else {
            let id = self.type_id(target, span)?;
            self.out.emit(format_args!("TYPE_ID_EQUALS {}", id));
            return Ok(());
        };
        if methods.is_empty() {
            // Anything but nil.
            self.out.push(Width::Narrow);
            self.out.load_number(0);
            self.out.push(Width::Narrow);
            self.out.emit("CMP_FROM_STACK setne");
            return Ok(());
        }
        let ids: Vec<u32> = program
            .type_ids
            .iter()
            .filter(|&(_, _, ty)| program.implements(ty, target))
            .map(|(id, _, _)| id)
            .collect();
        if ids.is_empty() {
            self.out.load_number(0);
            return Ok(());
        }
        let subject = self.func.alloc_temp(8);
        let (yes, end) = (self.new_label(), self.new_label());
        self.out.store_local(Width::Narrow, subject);
        for id in ids {
            self.out.load_local(Width::Narrow, subject);
            self.out.emit(format_args!("TYPE_ID_EQUALS {}", id));
            self.out.emit("TEST_IT");
            self.out.jump("jne", yes);
        }
        self.out.load_number(0);
        self.out.jump("jmp", end);
        self.out.label(yes);
        self.out.load_number(1);
        self.out.label(end);
        Ok(())
    }

    /// Methods callable on a value of dynamic type `ty`, with their thunk
    /// symbols. Pointer-receiver methods need a pointer type.
    pub fn thunks_of(&self, id: u32, ty: GtypeId) -> Vec<ThunkEntry> {
        let program = self.program;
        let Some((named, is_ptr)) = program.named_receiver(ty) else {
            return Vec::new();
        };
        program
            .methods
            .methods_of(named)
            .filter(|(_, entry)| is_ptr || !entry.pointer_receiver)
            .map(|(name, entry)| ThunkEntry {
                method: self.name(name).to_owned(),
                func: entry.func,
                symbol: format!("{}$iface{}", self.func_symbol(entry.func), id),
            })
            .collect()
    }

    /// Emits the thunks of every type that has a runtime id.
    pub fn emit_thunks(&mut self) {
        let program = self.program;
        for (id, _, ty) in program.type_ids.iter() {
            let is_ptr = program.is_pointer(ty);
            for thunk in self.thunks_of(id, ty) {
                self.emit_thunk(&thunk, is_ptr);
            }
        }
    }

    fn emit_thunk(&mut self, thunk: &ThunkEntry, dynamic_is_ptr: bool) {
        let program = self.program;
        let func = &program.funcs[thunk.func];
        let (recv, pointer_receiver) = match func.kind {
            FuncKind::Method { recv, pointer } => (recv, pointer),
            _ => return,
        };
        let param_words: u32 = func.params.iter().map(|&p| self.width(p).words()).sum();

        self.out.blank();
        self.out.label(&thunk.symbol);
        self.out.emit("FUNC_PROLOGUE");
        self.out.emit("LOAD_ARG 0");
        if dynamic_is_ptr {
            // The data pointer points at the stored pointer.
            self.out.load_deref(Width::Narrow);
        }
        let recv_w = if pointer_receiver {
            Width::Narrow
        } else {
            self.load_from_rax(recv);
            reg_width(self.width(recv))
        };
        self.out.push(recv_w);
        for k in 1..=param_words {
            self.out.emit(format_args!("LOAD_ARG {}", k));
            self.out.push(Width::Narrow);
        }
        self.pop_args(recv_w.words() + param_words);
        let sym = self.func_symbol(thunk.func);
        self.out.funcall(&sym);
        self.out.emit("FUNC_EPILOGUE");
    }

    /// Emits `.T<id>`, `.TN<id>` and `.MT<id>` for every type with a runtime
    /// id. Must run after [`emit_thunks`](Self::emit_thunks) so both agree on
    /// the method sets.
    pub fn emit_type_tables(&mut self) {
        let program = self.program;
        for (id, name, ty) in program.type_ids.iter() {
            let thunks = self.thunks_of(id, ty);
            self.out.label(format_args!(".T{}", id));
            self.out.directive(format_args!(".quad {}", id));
            self.out.directive(format_args!(".quad .TN{}", id));
            if thunks.is_empty() {
                self.out.directive(".quad 0");
            } else {
                self.out.directive(format_args!(".quad .MT{}", id));
            }
            self.out.label(format_args!(".TN{}", id));
            self.out.directive(format_args!(".string \"{}\"", name));
            if !thunks.is_empty() {
                self.out.label(format_args!(".MT{}", id));
                for thunk in &thunks {
                    let label = self.method_name_label(&thunk.method);
                    self.out.directive(format_args!(".quad {}", label));
                    self.out.directive(format_args!(".quad {}", thunk.symbol));
                }
                self.out.directive(".quad 0");
            }
        }
    }

    pub fn emit_method_names(&mut self) {
        let names: Vec<String> = self.method_names().map(str::to_owned).collect();
        for name in names {
            self.out.label(format_args!(".MN_{}", name));
            self.out.directive(format_args!(".string \"{}\"", name));
        }
    }
}
