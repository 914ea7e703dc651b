//! Assignments and `var` declarations.

use minigo_analysis::{GtypeKind, Width};
use minigo_common::{GtypeId, Span, VarId};
use minigo_syntax::ast::{AssignStmt, Expr, ExprKind, IncDecStmt, VarSpec};

use crate::context::{reg_width, CodegenContext, Place};
use crate::error::{CodegenError, Result};

/// Left-hand side of an assignment.
#[derive(Debug, Clone, Copy)]
pub enum Target<'e> {
    Expr(&'e Expr),
    Var(VarId, Span),
    /// `_`
    Discard,
}

impl CodegenContext<'_> {
    /// Stores the value in registers, already of type `ty`, into `target`.
    pub fn store_to(&mut self, target: &Expr, ty: GtypeId) -> Result<()> {
        if self.is_blank(target) {
            return Ok(());
        }
        if let ExprKind::Index(base, key) = &target.kind {
            if self.is_map_index(target)? {
                return self.emit_map_store(base, key);
            }
        }
        match self.place_of(target)? {
            Place::Indirect => {
                let w = self.width(ty);
                let size = self.size(ty);
                self.out.push(reg_width(w));
                self.emit_address(target)?;
                self.out.push(Width::Narrow);
                match w {
                    Width::Aggregate => self.out.copy_from_stack(size),
                    w => self.out.store_indirect(w),
                }
            }
            place => self.store_place(&place, ty),
        }
        Ok(())
    }

    fn is_map_index(&self, e: &Expr) -> Result<bool> {
        match &e.kind {
            ExprKind::Index(base, _) => {
                let bt = self.ty(base)?;
                Ok(matches!(self.program.kind(bt), GtypeKind::Map { .. }))
            }
            _ => Ok(false),
        }
    }

    /// Whether `target` is reached through a computed address, which
    /// [`emit_update`](Self::emit_update) then evaluates only once.
    fn updates_in_place(&self, target: &Expr) -> Result<bool> {
        Ok(self.place_of(target)? == Place::Indirect && !self.is_map_index(target)?)
    }

    /// Loads `target`, lets `apply` turn the value in registers into the
    /// new one and stores it back, computing the address once.
    fn emit_update(
        &mut self,
        target: &Expr,
        ty: GtypeId,
        apply: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let w = self.width(ty);
        self.emit_address(target)?;
        self.out.push(Width::Narrow);
        self.out.load_deref(w);
        apply(self)?;
        self.out.push_under(reg_width(w));
        self.out.store_indirect(w);
        Ok(())
    }

    fn store_target(&mut self, target: Target<'_>, ty: GtypeId) -> Result<()> {
        match target {
            Target::Expr(e) => self.store_to(e, ty),
            Target::Var(var, span) => {
                let place = self.var_place(var, span)?;
                self.store_place(&place, ty);
                Ok(())
            }
            Target::Discard => Ok(()),
        }
    }

    /// Type a value must have to be stored into `target`; a discarded value
    /// keeps its own type.
    fn target_type(&self, target: Target<'_>, value: Option<GtypeId>, span: Span) -> Result<Option<GtypeId>> {
        Ok(match target {
            Target::Expr(e) => e.ty.or(value),
            Target::Var(var, _) => Some(self.var_type(var, span)?),
            Target::Discard => value,
        })
    }

    /// Converts the value of type `from` in registers for a `to` slot.
    fn convert_in_registers(&mut self, from: GtypeId, to: GtypeId, span: Span) -> Result<()> {
        if self.program.is_interface(to) && !self.program.is_interface(from) {
            self.emit_to_interface(from, span)?;
        }
        Ok(())
    }

    pub fn emit_assign(&mut self, assign: &AssignStmt, span: Span) -> Result<()> {
        if let (Some(_), [left], [right]) = (assign.op, &assign.lefts[..], &assign.rights[..]) {
            if let ExprKind::Binary(b) = &right.kind {
                if self.updates_in_place(left)? {
                    let ty = self.ty(left)?;
                    return self.emit_update(left, ty, |cg| cg.emit_arith_rest(b, right.span));
                }
            }
        }
        let targets: Vec<Target<'_>> = assign
            .lefts
            .iter()
            .map(|l| if self.is_blank(l) { Target::Discard } else { Target::Expr(l) })
            .collect();
        self.assign_values(&targets, &assign.rights, span)
    }

    /// The three assignment shapes: one value per target, a call with one
    /// result per target, and the comma-ok forms.
    fn assign_values(&mut self, targets: &[Target<'_>], rights: &[Expr], span: Span) -> Result<()> {
        if targets.len() == rights.len() {
            return self.assign_parallel(targets, rights, span);
        }
        let [single] = rights else {
            return Err(CodegenError::internal("assignment count mismatch", span));
        };
        match &single.kind {
            ExprKind::Call(_) | ExprKind::MethodCall(_) => self.assign_call_results(targets, single, span),
            ExprKind::TypeAssert(x, t) => {
                let target = t.gtype.ok_or_else(|| CodegenError::internal("untyped assertion", t.span))?;
                let ok = self
                    .emit_type_assert(x, target, true, single.span)?
                    .ok_or_else(|| CodegenError::internal("assertion without ok", span))?;
                self.assign_comma_ok(targets, target, ok, span)
            }
            ExprKind::Index(base, key) => {
                let bt = self.ty(base)?;
                let GtypeKind::Map { key: kt, value: vt } = self.program.kind(bt).clone() else {
                    return Err(CodegenError::internal("comma-ok index of a non-map", span));
                };
                let ok = self.emit_map_get(base, key, kt, vt)?;
                self.assign_comma_ok(targets, vt, ok, span)
            }
            _ => Err(CodegenError::internal("assignment count mismatch", span)),
        }
    }

    fn assign_parallel(&mut self, targets: &[Target<'_>], rights: &[Expr], span: Span) -> Result<()> {
        if let ([target], [value]) = (targets, rights) {
            let Some(tt) = self.target_type(*target, value.ty, span)? else {
                // A discarded call without results.
                return self.emit_call_expr(value);
            };
            self.emit_value_as(value, tt)?;
            return self.store_target(*target, tt);
        }

        // Every value is evaluated before any target is written.
        let mut saved = Vec::with_capacity(rights.len());
        for (target, value) in targets.iter().zip(rights) {
            let Some(tt) = self.target_type(*target, value.ty, span)? else {
                self.emit_call_expr(value)?;
                saved.push(None);
                continue;
            };
            self.emit_value_as(value, tt)?;
            let slot = self.snapshot(tt);
            saved.push(Some((slot, tt)));
        }
        for (target, slot) in targets.iter().zip(saved) {
            if let Some((slot, tt)) = slot {
                match self.width(tt) {
                    Width::Aggregate => self.out.load_local_addr(slot),
                    w => self.out.load_local(reg_width(w), slot),
                }
                self.store_target(*target, tt)?;
            }
        }
        Ok(())
    }

    /// Parks the value in registers in a new frame slot. Aggregates are
    /// copied into the slot.
    fn snapshot(&mut self, ty: GtypeId) -> i32 {
        match self.width(ty) {
            Width::Aggregate => {
                let size = self.size(ty);
                let slot = self.func.alloc_temp(size);
                self.out.push(Width::Narrow);
                self.out.load_local_addr(slot);
                self.out.push(Width::Narrow);
                self.out.copy_from_stack(size);
                slot
            }
            w => {
                let slot = self.temp_for(w);
                self.out.store_local(reg_width(w), slot);
                slot
            }
        }
    }

    fn assign_call_results(&mut self, targets: &[Target<'_>], call: &Expr, span: Span) -> Result<()> {
        let results = self.call_results(call)?;
        if results.len() != targets.len() {
            return Err(CodegenError::internal("call result count mismatch", span));
        }
        if results.iter().any(|&r| self.width(r) == Width::Aggregate) {
            return Err(CodegenError::not_yet_implemented("struct and array results", span));
        }
        self.emit_call_expr(call)?;
        self.push_results(&results);
        for (target, &rt) in targets.iter().zip(&results) {
            self.out.pop(reg_width(self.width(rt)));
            let tt = self.target_type(*target, Some(rt), span)?.unwrap_or(rt);
            self.convert_in_registers(rt, tt, span)?;
            self.store_target(*target, tt)?;
        }
        Ok(())
    }

    /// With the value of type `vt` in registers and "ok" in the frame slot
    /// `ok`, stores both.
    fn assign_comma_ok(&mut self, targets: &[Target<'_>], vt: GtypeId, ok: i32, span: Span) -> Result<()> {
        let [value, flag] = targets else {
            return Err(CodegenError::internal("comma-ok form needs two targets", span));
        };
        let tt = self.target_type(*value, Some(vt), span)?.unwrap_or(vt);
        self.convert_in_registers(vt, tt, span)?;
        self.store_target(*value, tt)?;
        self.out.load_local(Width::Narrow, ok);
        let bool_ty = self.program.types.bool;
        let ft = self.target_type(*flag, Some(bool_ty), span)?.unwrap_or(bool_ty);
        self.store_target(*flag, ft)
    }

    /// `var a, b T = x, y`, local or global. Without values the variables
    /// are reset to their zero value.
    pub fn emit_var_spec(&mut self, spec: &VarSpec) -> Result<()> {
        let targets: Vec<Target<'_>> = spec
            .vars
            .iter()
            .zip(&spec.names)
            .map(|(var, name)| match var {
                Some(v) => Target::Var(*v, name.span),
                None => Target::Discard,
            })
            .collect();
        if spec.values.is_empty() {
            for target in targets {
                if let Target::Var(var, span) = target {
                    self.zero_var(var, span)?;
                }
            }
            return Ok(());
        }
        self.assign_values(&targets, &spec.values, spec.span)
    }

    pub fn zero_var(&mut self, var: VarId, span: Span) -> Result<()> {
        let ty = self.var_type(var, span)?;
        let place = self.var_place(var, span)?;
        match self.width(ty) {
            Width::Aggregate => {
                let size = self.size(ty);
                self.load_place_addr(&place);
                self.out.zero_at_rax(size);
            }
            w => {
                self.out.load_empty(w);
                self.store_place(&place, ty);
            }
        }
        Ok(())
    }

    pub fn emit_incdec(&mut self, s: &IncDecStmt) -> Result<()> {
        let ty = self.ty(&s.operand)?;
        let step = if s.inc { "ADD_NUMBER 1" } else { "SUB_NUMBER 1" };
        if self.updates_in_place(&s.operand)? {
            return self.emit_update(&s.operand, ty, |cg| {
                cg.out.emit(step);
                Ok(())
            });
        }
        self.emit_expr(&s.operand)?;
        self.out.emit(step);
        self.store_to(&s.operand, ty)
    }
}

