//! Calls, method calls and builtins.
//!
//! Arguments are pushed left to right, then popped in reverse into the
//! argument slots. A single result comes back in `%rax` (or `%rax %rbx
//! %rcx`); further results stay in the return slots.

use minigo_analysis::{Builtin, FuncKind, GtypeKind, RuntimeFn, Width};
use minigo_common::{Entity, FuncId, GtypeId, Span};
use minigo_syntax::ast::{CallExpr, Expr, ExprKind, MethodCallExpr, MethodTarget};

use crate::context::{reg_width, CodegenContext};
use crate::error::{CodegenError, ErrorKind, Result};

impl CodegenContext<'_> {
    /// Emits a call of any kind, statement or value.
    pub fn emit_call_expr(&mut self, e: &Expr) -> Result<()> {
        match &e.kind {
            ExprKind::Call(call) => self.emit_call(call, e),
            ExprKind::MethodCall(m) => self.emit_method_call(m, e.span),
            _ => self.emit_expr(e),
        }
    }

    pub fn emit_call(&mut self, call: &CallExpr, e: &Expr) -> Result<()> {
        let span = e.span;
        match call.func.as_relation().and_then(|r| r.entity()) {
            Some(Entity::Type(t)) => {
                let Some(arg) = call.args.first() else {
                    return Err(CodegenError::internal("conversion without an argument", span));
                };
                self.emit_conversion(t, arg)
            }
            Some(Entity::Func(f)) => {
                let program = self.program;
                let func = &program.funcs[f];
                match func.kind {
                    FuncKind::Builtin(b) => self.emit_builtin(b, call, span),
                    FuncKind::Extern => {
                        let mut words = 0;
                        for arg in &call.args {
                            self.emit_expr(arg)?;
                            let w = self.width(self.ty(arg)?);
                            self.out.push(reg_width(w));
                            words += w.words();
                        }
                        self.pop_args(words);
                        let sym = self.func_symbol(f);
                        self.out.funcall(&sym);
                        Ok(())
                    }
                    FuncKind::User | FuncKind::Method { .. } => {
                        let sym = self.func_symbol(f);
                        self.out.comment(format_args!("call {}", sym));
                        let words = self.push_args(&func.params, func.variadic, &call.args, call.spread)?;
                        self.pop_args(words);
                        self.out.funcall(&sym);
                        Ok(())
                    }
                }
            }
            Some(Entity::Var(_)) => Err(CodegenError::not_yet_implemented(
                "calls through function values",
                span,
            )),
            _ => Err(CodegenError::internal("call of a non-function", span)),
        }
    }

    /// Pushes call arguments converted to the parameter types. Extra
    /// arguments of a variadic call are gathered into a new slice. Returns
    /// the number of words pushed.
    pub fn push_args(
        &mut self,
        params: &[GtypeId],
        variadic: bool,
        args: &[Expr],
        spread: bool,
    ) -> Result<u32> {
        let fixed = if variadic && !spread { params.len().saturating_sub(1) } else { params.len() };
        let mut words = 0;
        for (arg, &param) in args.iter().zip(&params[..fixed]) {
            self.emit_value_as(arg, param)?;
            let w = self.width(param);
            self.out.push(reg_width(w));
            words += w.words();
        }
        if variadic && !spread {
            let last = params[params.len() - 1];
            let elem = self.program.elem(last).unwrap_or(last);
            self.emit_slice_of(elem, args.get(fixed..).unwrap_or(&[]))?;
            self.out.push(Width::Wide);
            words += 3;
        }
        Ok(words)
    }

    pub fn emit_method_call(&mut self, m: &MethodCallExpr, span: Span) -> Result<()> {
        match m.target {
            Some(MethodTarget::Static { func, pointer_receiver }) => {
                self.emit_static_method_call(m, func, pointer_receiver)
            }
            Some(MethodTarget::Interface) => self.emit_interface_call(m, span),
            None => Err(CodegenError::internal("method call was not checked", span)),
        }
    }

    fn emit_static_method_call(&mut self, m: &MethodCallExpr, f: FuncId, pointer_receiver: bool) -> Result<()> {
        let program = self.program;
        let func = &program.funcs[f];
        let rt = self.ty(&m.receiver)?;
        let through_ptr = program.is_pointer(rt);
        let sym = self.func_symbol(f);
        self.out.comment(format_args!("call {}", sym));
        let mut words = 1;
        if pointer_receiver {
            if through_ptr {
                self.emit_expr(&m.receiver)?;
            } else {
                self.emit_address(&m.receiver)?;
            }
            self.out.push(Width::Narrow);
        } else {
            let recv = match func.kind {
                FuncKind::Method { recv, .. } => recv,
                _ => rt,
            };
            let w = self.width(recv);
            self.emit_expr(&m.receiver)?;
            if through_ptr {
                self.load_from_rax(recv);
            }
            self.out.push(reg_width(w));
            words = w.words();
        }
        words += self.push_args(&func.params, func.variadic, &m.args, m.spread)?;
        self.pop_args(words);
        self.out.funcall(&sym);
        Ok(())
    }

    /// The interface's data pointer goes first; the method's thunk for the
    /// dynamic type turns it into the receiver the method expects.
    fn emit_interface_call(&mut self, m: &MethodCallExpr, span: Span) -> Result<()> {
        let program = self.program;
        let rt = self.ty(&m.receiver)?;
        let sig = program
            .interface_methods(rt)
            .and_then(|methods| methods.iter().find(|s| s.name == m.method.symbol))
            .ok_or_else(|| {
                let name = self.name(m.method.symbol).to_owned();
                CodegenError::undefined(&name, span)
            })?;
        let name = self.name(m.method.symbol).to_owned();
        self.out.comment(format_args!("interface call {}", name));
        let iface = self.func.alloc_temp(24);
        self.emit_expr(&m.receiver)?;
        self.out.store_local(Width::Wide, iface);
        self.out.load_local(Width::Narrow, iface);
        self.out.push(Width::Narrow);
        let words = 1 + self.push_args(&sig.params, sig.variadic, &m.args, m.spread)?;
        self.pop_args(words);
        self.out.load_local(Width::Wide, iface);
        let label = self.method_name_label(&name);
        self.out.emit(format_args!("LOAD_METHOD_ADDR {}", label));
        self.out.emit("CALL_INDIRECT");
        Ok(())
    }

    /// After a call, pushes its results so the first one is on top and
    /// each pops with its own width.
    pub fn push_results(&mut self, results: &[GtypeId]) {
        let mut slots = Vec::with_capacity(results.len());
        let mut next = 0;
        for &r in results {
            let words = self.width(r).words();
            slots.push(next..next + words);
            next += words;
        }
        for range in slots.into_iter().rev() {
            for k in range {
                self.out.emit(format_args!("PUSH_RET {}", k));
            }
        }
    }

    /// Result types of a call expression.
    pub fn call_results(&self, e: &Expr) -> Result<Vec<GtypeId>> {
        match &e.kind {
            ExprKind::Call(call) => match call.func.as_relation().and_then(|r| r.entity()) {
                Some(Entity::Func(f)) => Ok(self.program.func_results(f).to_vec()),
                _ => Ok(e.ty.into_iter().collect()),
            },
            ExprKind::MethodCall(m) => match m.target {
                Some(MethodTarget::Static { func, .. }) => Ok(self.program.func_results(func).to_vec()),
                _ => {
                    let rt = self.ty(&m.receiver)?;
                    Ok(self
                        .program
                        .interface_methods(rt)
                        .and_then(|ms| ms.iter().find(|s| s.name == m.method.symbol))
                        .map(|s| s.results.clone())
                        .unwrap_or_default())
                }
            },
            _ => Ok(e.ty.into_iter().collect()),
        }
    }

    // === Builtins ===

    fn emit_builtin(&mut self, b: Builtin, call: &CallExpr, span: Span) -> Result<()> {
        match b {
            Builtin::Len | Builtin::Cap => {
                let arg = call
                    .args
                    .first()
                    .ok_or_else(|| CodegenError::internal("len without an argument", span))?;
                self.emit_len_cap(b == Builtin::Len, arg)
            }
            Builtin::Append => self.emit_append(call, span),
            Builtin::Panic => {
                let arg = call
                    .args
                    .first()
                    .ok_or_else(|| CodegenError::internal("panic without an argument", span))?;
                self.emit_expr(arg)?;
                self.out.push(Width::Wide);
                self.call_runtime(RuntimeFn::Panic);
                Ok(())
            }
            Builtin::Print | Builtin::Println => {
                let newline = b == Builtin::Println;
                for (i, arg) in call.args.iter().enumerate() {
                    if newline && i > 0 {
                        self.print_literal(" ");
                    }
                    self.emit_print(arg)?;
                }
                if newline {
                    self.print_literal("\\n");
                }
                Ok(())
            }
        }
    }

    fn emit_len_cap(&mut self, len: bool, arg: &Expr) -> Result<()> {
        let program = self.program;
        let ty = self.ty(arg)?;
        let array = match program.kind(ty) {
            GtypeKind::Pointer(p) => program.kind(*p),
            kind => kind,
        };
        match array {
            GtypeKind::Array { len, .. } => self.out.load_number(len.unwrap_or(0)),
            GtypeKind::Map { .. } => {
                self.emit_expr(arg)?;
                self.emit_map_len();
            }
            _ => {
                self.emit_expr(arg)?;
                let tmp = self.func.alloc_temp(24);
                self.out.store_local(Width::Wide, tmp);
                self.out.load_local(Width::Narrow, tmp + if len { 8 } else { 16 });
            }
        }
        Ok(())
    }

    fn emit_append(&mut self, call: &CallExpr, span: Span) -> Result<()> {
        let Some((first, rest)) = call.args.split_first() else {
            return Err(CodegenError::internal("append without a slice", span));
        };
        let st = self.ty(first)?;
        let elem = self
            .program
            .elem(st)
            .ok_or_else(|| CodegenError::new(ErrorKind::MissingType, first.span))?;
        let elem_size = self.size(elem);
        self.emit_expr(first)?;
        if call.spread {
            if let Some(other) = rest.first() {
                self.out.push(Width::Wide);
                self.emit_expr(other)?;
                self.out.push(Width::Wide);
                self.out.load_number(elem_size as i64);
                self.out.push(Width::Narrow);
                self.call_runtime(RuntimeFn::AppendSlice);
            }
            return Ok(());
        }
        for value in rest {
            self.out.push(Width::Wide);
            self.emit_value_as(value, elem)?;
            match RuntimeFn::append_for(elem_size).filter(|_| self.width(elem) != Width::Aggregate) {
                Some(f) => {
                    self.out.push(reg_width(self.width(elem)));
                    self.call_runtime(f);
                }
                None => {
                    // One element, appended as a slice of length one.
                    self.out.push(Width::Narrow);
                    self.out.load_number(1);
                    self.out.push(Width::Narrow);
                    self.out.push(Width::Narrow);
                    self.out.load_number(elem_size as i64);
                    self.out.push(Width::Narrow);
                    self.call_runtime(RuntimeFn::AppendSlice);
                }
            }
        }
        Ok(())
    }

    fn print_literal(&mut self, text: &str) {
        let len = if text == "\\n" { 1 } else { text.len() };
        self.load_string(text, len);
        self.out.push(Width::Wide);
        self.call_runtime(RuntimeFn::PrintString);
    }

    fn emit_print(&mut self, arg: &Expr) -> Result<()> {
        let ty = self.ty(arg)?;
        if self.program.is_string(ty) {
            self.emit_expr(arg)?;
            self.out.push(Width::Wide);
            self.call_runtime(RuntimeFn::PrintString);
        } else if self.program.is_bool(ty) {
            let (no, end) = (self.new_label(), self.new_label());
            self.emit_expr(arg)?;
            self.out.emit("TEST_IT");
            self.out.jump("je", no);
            self.load_string("true", 4);
            self.out.jump("jmp", end);
            self.out.label(no);
            self.load_string("false", 5);
            self.out.label(end);
            self.out.push(Width::Wide);
            self.call_runtime(RuntimeFn::PrintString);
        } else {
            self.emit_expr(arg)?;
            self.out.push(Width::Narrow);
            self.call_runtime(RuntimeFn::PrintInt);
        }
        Ok(())
    }
}
