//! Type inference and annotation.
//!
//! Walks every global initializer and function body, stores the static type
//! of each expression in [`Expr::ty`], picks the dispatch target of method
//! calls, gives types to variables declared without one, and runs the type
//! checks at the point of use.
//!
//! Globals declared without a type are inferred by a fixed-point loop in
//! insertion order: an initializer that mentions a global whose type isn't
//! known yet is retried on the next round. Locals are inferred in
//! statement order.

use minigo_common::{ConstId, Diagnostic, Entity, FuncId, GtypeId, Ident, Span, SymbolInterner, VarId};
use minigo_syntax::ast::*;
use tracing::{debug, trace};

use crate::errors::TypeError;
use crate::program::{Builtin, ConstKind, FuncKind, GlobalInit, Program, VarType};
use crate::types::GtypeKind;

enum Fail {
    /// Depends on a global whose type is not known yet.
    Pending(VarId),
    Fatal(Diagnostic),
}

impl From<Diagnostic> for Fail {
    fn from(d: Diagnostic) -> Self {
        Fail::Fatal(d)
    }
}

type Result<T> = std::result::Result<T, Fail>;

/// Infers and annotates one package.
pub(crate) fn check_package(
    program: &mut Program,
    interner: &SymbolInterner,
    files: &mut [File],
) -> std::result::Result<(), Diagnostic> {
    let mut checker = Checker {
        program,
        interner,
        func: None,
        globals_phase: true,
    };
    checker.infer_globals(files)?;
    checker.globals_phase = false;
    for file in files.iter_mut() {
        for decl in &mut file.decls {
            if let Decl::Func(f) = decl {
                checker.check_func(f).map_err(|e| checker.fatal(e))?;
            }
        }
    }
    Ok(())
}

/// Every global `var` spec of a package, in declaration order.
pub(crate) fn global_specs(files: &[File]) -> Vec<GlobalInit> {
    let mut specs = Vec::new();
    for (fi, file) in files.iter().enumerate() {
        for (di, decl) in file.decls.iter().enumerate() {
            if let Decl::Var(d) = decl {
                for si in 0..d.specs.len() {
                    specs.push(GlobalInit {
                        file: fi,
                        decl: di,
                        spec: si,
                    });
                }
            }
        }
    }
    specs
}

pub(crate) fn global_spec_mut(files: &mut [File], at: GlobalInit) -> Option<&mut VarSpec> {
    match &mut files[at.file].decls[at.decl] {
        Decl::Var(d) => d.specs.get_mut(at.spec),
        _ => None,
    }
}

struct Checker<'a> {
    program: &'a mut Program,
    interner: &'a SymbolInterner,
    func: Option<FuncId>,
    globals_phase: bool,
}

impl Checker<'_> {
    fn fatal(&self, fail: Fail) -> Diagnostic {
        match fail {
            Fail::Fatal(d) => d,
            Fail::Pending(var) => self.cannot_infer(var),
        }
    }

    fn cannot_infer(&self, var: VarId) -> Diagnostic {
        let v = &self.program.vars[var];
        TypeError::CannotInfer.named_at(v.span, self.interner.name(v.name))
    }

    fn type_name(&self, ty: GtypeId) -> String {
        self.program.type_name(ty, self.interner)
    }

    // ==================== Globals ====================

    fn infer_globals(&mut self, files: &mut [File]) -> std::result::Result<(), Diagnostic> {
        let mut pending = global_specs(files);
        let mut round = 0;
        while !pending.is_empty() {
            round += 1;
            let mut waiting = Vec::new();
            let mut blocked_on = None;
            for at in pending.iter().copied() {
                let Some(spec) = global_spec_mut(files, at) else {
                    continue;
                };
                match self.check_var_spec(spec) {
                    Ok(()) => {}
                    Err(Fail::Pending(var)) => {
                        blocked_on.get_or_insert(var);
                        waiting.push(at);
                    }
                    Err(Fail::Fatal(d)) => return Err(d),
                }
            }
            if waiting.len() == pending.len() {
                if let Some(var) = blocked_on {
                    return Err(self.cannot_infer(var));
                }
            }
            pending = waiting;
        }
        debug!(rounds = round, "globals inferred");
        Ok(())
    }

    // ==================== Functions ====================

    fn check_func(&mut self, decl: &mut FuncDecl) -> Result<()> {
        let (Some(id), Some(body)) = (decl.func, decl.body.as_mut()) else {
            return Ok(());
        };
        trace!(func = self.interner.name(decl.name.symbol), "checking body");
        self.func = Some(id);
        self.check_stmts(&mut body.stmts)?;
        self.func = None;
        let locals = self.program.funcs[id].locals.clone();
        for var in locals {
            if self.program.vars[var].ty == VarType::Dependent {
                return Err(Fail::Fatal(self.cannot_infer(var)));
            }
        }
        Ok(())
    }

    fn check_stmts(&mut self, stmts: &mut [Stmt]) -> Result<()> {
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<()> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Empty
            | StmtKind::Break(_)
            | StmtKind::Continue(_)
            | StmtKind::Const(_)
            | StmtKind::Type(_) => Ok(()),
            StmtKind::Var(spec) => self.check_var_spec(spec),
            StmtKind::Expr(e) => {
                self.check_expr(e)?;
                Ok(())
            }
            StmtKind::Assign(a) => self.check_assign_stmt(a, span),
            StmtKind::ShortVarDecl(a) => self.check_define(a, span),
            StmtKind::IncDec(s) => {
                let t = self.check_value(&mut s.operand)?;
                self.require_integer(t, s.operand.span)?;
                self.require_addressable(&s.operand)?;
                Ok(())
            }
            StmtKind::Block(b) => self.check_stmts(&mut b.stmts),
            StmtKind::If(s) => {
                if let Some(init) = &mut s.init {
                    self.check_stmt(init)?;
                }
                self.check_condition(&mut s.cond)?;
                self.check_stmts(&mut s.then.stmts)?;
                if let Some(els) = &mut s.els {
                    self.check_stmt(els)?;
                }
                Ok(())
            }
            StmtKind::For(f) => {
                match &mut f.clause {
                    ForClause::Cond { init, cond, post } => {
                        if let Some(init) = init {
                            self.check_stmt(init)?;
                        }
                        if let Some(cond) = cond {
                            self.check_condition(cond)?;
                        }
                        if let Some(post) = post {
                            self.check_stmt(post)?;
                        }
                    }
                    ForClause::Range(r) => self.check_range(r, span)?,
                }
                self.check_stmts(&mut f.body.stmts)
            }
            StmtKind::Switch(s) => {
                let tag = match &mut s.tag {
                    Some(tag) => Some((self.check_value(tag)?, self.is_untyped(tag))),
                    None => None,
                };
                for case in &mut s.cases {
                    for value in &mut case.values {
                        match tag {
                            Some((tag_ty, tag_untyped)) => {
                                let vt = self.check_value(value)?;
                                self.check_comparable(tag_ty, tag_untyped, vt, value, value.span)?;
                            }
                            None => self.check_condition(value)?,
                        }
                    }
                    self.check_stmts(&mut case.body)?;
                }
                Ok(())
            }
            StmtKind::TypeSwitch(s) => self.check_type_switch(s),
            StmtKind::Return(r) => self.check_return(r, span),
            StmtKind::Defer(d) => match d.call.kind {
                ExprKind::Call(_) | ExprKind::MethodCall(_) => {
                    self.check_expr(&mut d.call)?;
                    Ok(())
                }
                _ => Err(TypeError::InvalidOperation
                    .at_with_message(d.call.span, "expression in defer must be a function call")
                    .into()),
            },
        }
    }

    fn check_condition(&mut self, cond: &mut Expr) -> Result<()> {
        let t = self.check_value(cond)?;
        match t {
            Some(t) if self.program.is_bool(t) => Ok(()),
            _ => Err(TypeError::NonBoolCondition.at(cond.span).into()),
        }
    }

    /// `var` specs, global or local.
    fn check_var_spec(&mut self, spec: &mut VarSpec) -> Result<()> {
        let declared = spec.ty.as_ref().and_then(|t| t.gtype);
        if spec.values.is_empty() {
            return Ok(());
        }
        let types = self.rhs_types(spec.names.len(), &mut spec.values, spec.span)?;
        for (i, vt) in types.iter().enumerate() {
            let value = (spec.values.len() == types.len()).then(|| &spec.values[i]);
            match declared {
                Some(target) => self.check_assignable(value, *vt, target, spec.span)?,
                None => {
                    if let Some(var) = spec.vars[i] {
                        let ty = self.default_type(value, *vt, spec.names[i].span)?;
                        self.program.vars[var].ty = VarType::Known(ty);
                    }
                }
            }
        }
        Ok(())
    }

    /// `a, b := x, y`
    fn check_define(&mut self, assign: &mut AssignStmt, span: Span) -> Result<()> {
        let types = self.rhs_types(assign.lefts.len(), &mut assign.rights, span)?;
        for (i, vt) in types.iter().enumerate() {
            let value = (assign.rights.len() == types.len()).then(|| &assign.rights[i]);
            let left = &mut assign.lefts[i];
            let Some(Entity::Var(var)) = left.as_relation().and_then(Relation::entity) else {
                continue;
            };
            match self.program.vars[var].ty {
                VarType::Dependent => {
                    let ty = self.default_type(value, *vt, left.span)?;
                    self.program.vars[var].ty = VarType::Known(ty);
                    left.ty = Some(ty);
                }
                VarType::Known(target) => {
                    left.ty = Some(target);
                    self.check_assignable(value, *vt, target, left.span)?;
                }
            }
        }
        Ok(())
    }

    /// `a, b = x, y`
    fn check_assign_stmt(&mut self, assign: &mut AssignStmt, span: Span) -> Result<()> {
        let mut targets = Vec::with_capacity(assign.lefts.len());
        for left in &mut assign.lefts {
            if self.is_blank(left) {
                targets.push(None);
                continue;
            }
            let t = self.check_value(left)?;
            self.require_addressable(left)?;
            targets.push(t);
        }
        let types = self.rhs_types(assign.lefts.len(), &mut assign.rights, span)?;
        for (i, vt) in types.iter().enumerate() {
            let value = (assign.rights.len() == types.len()).then(|| &assign.rights[i]);
            match targets[i] {
                Some(target) => self.check_assignable(value, *vt, target, assign.lefts[i].span)?,
                None => {
                    if vt.is_none() && value.is_some_and(|v| self.is_nil(v)) {
                        return Err(TypeError::UntypedNil.at(span).into());
                    }
                }
            }
        }
        Ok(())
    }

    fn check_range(&mut self, range: &mut RangeClause, span: Span) -> Result<()> {
        let t = self
            .check_value(&mut range.expr)?
            .ok_or_else(|| TypeError::NotIterable.at(range.expr.span))?;
        let int = self.program.types.int;
        let (key_ty, value_ty) = match self.program.kind(t).clone() {
            GtypeKind::Slice(elem) | GtypeKind::Array { elem, .. } => (int, elem),
            GtypeKind::String => (int, self.program.types.byte),
            GtypeKind::Map { key, value } => (key, value),
            GtypeKind::Pointer(p) => match self.program.kind(p).clone() {
                GtypeKind::Array { elem, .. } => (int, elem),
                _ => return Err(TypeError::NotIterable.at(range.expr.span).into()),
            },
            _ => {
                let name = self.type_name(t);
                return Err(TypeError::NotIterable
                    .at_with_message(span, format!("cannot range over {}", name))
                    .into());
            }
        };
        let define = range.define;
        for (target, ty) in [(&mut range.key, key_ty), (&mut range.value, value_ty)] {
            let Some(target) = target else {
                continue;
            };
            if define {
                if let Some(Entity::Var(var)) = target.as_relation().and_then(Relation::entity) {
                    self.program.vars[var].ty = VarType::Known(ty);
                }
                target.ty = Some(ty);
            } else if !self.is_blank(target) {
                let tt = self.check_value(target)?;
                self.require_addressable(target)?;
                if let Some(tt) = tt {
                    self.check_types(ty, tt, target.span)?;
                }
            }
        }
        Ok(())
    }

    fn check_type_switch(&mut self, s: &mut TypeSwitchStmt) -> Result<()> {
        let subject = self.check_value(&mut s.subject)?;
        let subject = match subject {
            Some(t) if self.program.is_interface(t) => t,
            _ => return Err(TypeError::NotAnInterface.at(s.subject.span).into()),
        };
        for case in &mut s.cases {
            for ty in case.types.iter().flatten() {
                let Some(t) = ty.gtype else { continue };
                self.check_assert_possible(subject, t, ty.span)?;
            }
            if let Some(var) = case.var {
                let ty = match case.types.as_slice() {
                    [Some(ty)] => ty.gtype.unwrap_or(subject),
                    _ => subject,
                };
                self.program.vars[var].ty = VarType::Known(ty);
            }
            self.check_stmts(&mut case.body)?;
        }
        Ok(())
    }

    fn check_return(&mut self, ret: &mut ReturnStmt, span: Span) -> Result<()> {
        let Some(func) = self.func else {
            return Ok(());
        };
        let expected = self.program.funcs[func].results.clone();
        if ret.results.len() == 1 && expected.len() > 1 && is_call(&ret.results[0]) {
            let got = self.call_results(&mut ret.results[0])?;
            if got.len() != expected.len() {
                return Err(self.result_count(span, expected.len(), got.len()).into());
            }
            for (g, e) in got.iter().zip(&expected) {
                self.check_types(*g, *e, ret.results[0].span)?;
            }
            return Ok(());
        }
        if ret.results.len() != expected.len() {
            return Err(self.result_count(span, expected.len(), ret.results.len()).into());
        }
        for (value, target) in ret.results.iter_mut().zip(&expected) {
            let vt = self.check_value(value)?;
            self.check_assignable(Some(&*value), vt, *target, value.span)?;
        }
        Ok(())
    }

    fn result_count(&self, span: Span, want: usize, have: usize) -> Diagnostic {
        TypeError::WrongResultCount.at_with_message(
            span,
            format!("wrong number of return values: want {}, have {}", want, have),
        )
    }

    /// Types of the right-hand side of an assignment to `count` targets,
    /// including the multi-value call and comma-ok forms.
    fn rhs_types(
        &mut self,
        count: usize,
        rights: &mut [Expr],
        span: Span,
    ) -> Result<Vec<Option<GtypeId>>> {
        if rights.len() == count {
            let mut types = Vec::with_capacity(count);
            for r in rights.iter_mut() {
                types.push(self.check_value(r)?);
            }
            return Ok(types);
        }
        if let [single] = rights {
            if is_call(single) {
                let results = self.call_results(single)?;
                if results.len() == count {
                    return Ok(results.into_iter().map(Some).collect());
                }
                return Err(self.count_mismatch(span, count, results.len()).into());
            }
            if count == 2 && self.is_comma_ok_form(single)? {
                let t = self.check_value(single)?;
                return Ok(vec![t, Some(self.program.types.bool)]);
            }
        }
        Err(self.count_mismatch(span, count, rights.len()).into())
    }

    fn count_mismatch(&self, span: Span, want: usize, have: usize) -> Diagnostic {
        TypeError::AssignCountMismatch.at_with_message(
            span,
            format!("assignment mismatch: {} variables but {} values", want, have),
        )
    }

    /// Map index or type assertion, which may yield a second `ok` value.
    fn is_comma_ok_form(&mut self, e: &mut Expr) -> Result<bool> {
        match &mut e.kind {
            ExprKind::TypeAssert(..) => Ok(true),
            ExprKind::Index(base, _) => {
                let bt = self.check_value(base)?;
                Ok(bt.is_some_and(|t| matches!(self.program.kind(t), GtypeKind::Map { .. })))
            }
            _ => Ok(false),
        }
    }

    // ==================== Type checks ====================

    fn is_blank(&self, e: &Expr) -> bool {
        e.as_relation()
            .is_some_and(|r| r.name().symbol == self.program.blank)
    }

    fn is_nil(&self, e: &Expr) -> bool {
        e.as_relation()
            .and_then(Relation::entity)
            .is_some_and(|en| en == Entity::Const(self.program.nil))
    }

    fn const_is_untyped(&self, c: ConstId) -> bool {
        let k = &self.program.consts[c];
        match k.kind {
            ConstKind::Iota => true,
            ConstKind::User => !k.explicit_type,
            _ => false,
        }
    }

    /// Literals, constants declared without a type, and operations on
    /// them. These adapt to the type they are used with.
    fn is_untyped(&self, e: &Expr) -> bool {
        match &e.kind {
            ExprKind::IntLit(_) | ExprKind::CharLit(_) | ExprKind::StringLit(_) => true,
            ExprKind::Ident(rel) => match rel.entity() {
                Some(Entity::Const(c)) => c != self.program.nil && self.const_is_untyped(c),
                _ => false,
            },
            ExprKind::Unary(UnaryOp::Neg | UnaryOp::Not, x) => self.is_untyped(x),
            ExprKind::Binary(b) => self.is_untyped(&b.left) && self.is_untyped(&b.right),
            _ => false,
        }
    }

    /// Type a variable gets from its initializer.
    fn default_type(&self, value: Option<&Expr>, vt: Option<GtypeId>, span: Span) -> Result<GtypeId> {
        match vt {
            Some(t) => Ok(t),
            None if value.is_some_and(|v| self.is_nil(v)) => Err(TypeError::UntypedNil.at(span).into()),
            None => Err(TypeError::NoValue.at(span).into()),
        }
    }

    /// Checks that `value` (of type `vt`) may be stored where `target` is
    /// expected. `value` is `None` for the results of a multi-value call.
    fn check_assignable(
        &self,
        value: Option<&Expr>,
        vt: Option<GtypeId>,
        target: GtypeId,
        span: Span,
    ) -> Result<()> {
        let Some(vt) = vt else {
            if value.is_some_and(|v| self.is_nil(v)) {
                return if self.accepts_nil(target) {
                    Ok(())
                } else {
                    let name = self.type_name(target);
                    Err(TypeError::MismatchedTypes
                        .at_with_message(span, format!("cannot use nil as {} value", name))
                        .into())
                };
            }
            return Err(TypeError::NoValue.at(span).into());
        };
        if value.is_some_and(|v| self.is_untyped(v)) && self.untyped_fits(vt, target) {
            return Ok(());
        }
        self.check_types(vt, target, span)
    }

    fn accepts_nil(&self, t: GtypeId) -> bool {
        matches!(
            self.program.kind(t),
            GtypeKind::Pointer(_) | GtypeKind::Slice(_) | GtypeKind::Map { .. } | GtypeKind::Interface(_)
        )
    }

    /// An untyped constant of default type `vt` used as a `target`.
    fn untyped_fits(&self, vt: GtypeId, target: GtypeId) -> bool {
        if self.program.is_interface(target) {
            return self.program.implements(vt, target);
        }
        match self.program.kind(vt) {
            GtypeKind::Int | GtypeKind::Byte => self.program.is_integer(target),
            GtypeKind::String => self.program.is_string(target),
            GtypeKind::Bool => self.program.is_bool(target),
            _ => false,
        }
    }

    fn check_types(&self, vt: GtypeId, target: GtypeId, span: Span) -> Result<()> {
        if self.program.assignable(vt, target) {
            return Ok(());
        }
        if self.program.is_interface(target) {
            if let Some(missing) = self.program.missing_method(vt, target) {
                return Err(TypeError::MissingMethod
                    .at_with_message(
                        span,
                        format!(
                            "{} does not implement {} (missing method {})",
                            self.type_name(vt),
                            self.type_name(target),
                            self.interner.name(missing)
                        ),
                    )
                    .into());
            }
        }
        Err(TypeError::MismatchedTypes
            .at_with_message(
                span,
                format!(
                    "cannot use {} as {} value",
                    self.type_name(vt),
                    self.type_name(target)
                ),
            )
            .into())
    }

    fn check_assert_possible(&self, iface: GtypeId, target: GtypeId, span: Span) -> Result<()> {
        if self.program.is_interface(target) {
            return Ok(());
        }
        match self.program.missing_method(target, iface) {
            None => Ok(()),
            Some(m) => Err(TypeError::MissingMethod
                .at_with_message(
                    span,
                    format!(
                        "impossible type assertion: {} does not implement {} (missing method {})",
                        self.type_name(target),
                        self.type_name(iface),
                        self.interner.name(m)
                    ),
                )
                .into()),
        }
    }

    fn require_integer(&self, t: Option<GtypeId>, span: Span) -> Result<()> {
        match t {
            Some(t) if self.program.is_integer(t) => Ok(()),
            _ => Err(TypeError::InvalidOperation
                .at_with_message(span, "operand must be an integer")
                .into()),
        }
    }

    fn is_addressable(&self, e: &Expr) -> bool {
        match &e.kind {
            ExprKind::Ident(rel) => matches!(rel.entity(), Some(Entity::Var(_))),
            ExprKind::Selector(..) | ExprKind::Index(..) => true,
            ExprKind::Unary(UnaryOp::Deref, _) => true,
            _ => false,
        }
    }

    fn require_addressable(&self, e: &Expr) -> Result<()> {
        if self.is_addressable(e) {
            Ok(())
        } else {
            Err(TypeError::InvalidOperation
                .at_with_message(e.span, "cannot assign to expression")
                .into())
        }
    }

    /// Operands of `==`, `<` and switch cases.
    fn check_comparable(
        &self,
        lt: Option<GtypeId>,
        left_untyped: bool,
        rt: Option<GtypeId>,
        right: &Expr,
        span: Span,
    ) -> Result<()> {
        match (lt, rt) {
            (Some(l), Some(r)) => {
                if left_untyped && self.untyped_fits(l, r) {
                    return Ok(());
                }
                if self.is_untyped(right) && self.untyped_fits(r, l) {
                    return Ok(());
                }
                if self.program.assignable(r, l) || self.program.assignable(l, r) {
                    return Ok(());
                }
                Err(TypeError::MismatchedTypes
                    .at_with_message(
                        span,
                        format!(
                            "mismatched types {} and {}",
                            self.type_name(l),
                            self.type_name(r)
                        ),
                    )
                    .into())
            }
            (Some(t), None) | (None, Some(t)) if self.accepts_nil(t) => Ok(()),
            _ => Err(TypeError::InvalidOperation
                .at_with_message(span, "invalid comparison")
                .into()),
        }
    }

    // ==================== Expressions ====================

    /// Checks an expression used as a single value. Calls must return
    /// exactly one result.
    fn check_value(&mut self, e: &mut Expr) -> Result<Option<GtypeId>> {
        if is_call(e) {
            let results = self.call_results(e)?;
            return match results.as_slice() {
                [t] => Ok(Some(*t)),
                [] => Err(TypeError::NoValue
                    .at_with_message(e.span, "function call used as value has no result")
                    .into()),
                _ => Err(TypeError::AssignCountMismatch
                    .at_with_message(e.span, "multiple-value call in single-value context")
                    .into()),
            };
        }
        self.check_expr(e)
    }

    /// Result types of a call or method call. Sets `e.ty` to the first.
    fn call_results(&mut self, e: &mut Expr) -> Result<Vec<GtypeId>> {
        let span = e.span;
        let results = match &mut e.kind {
            ExprKind::Call(call) => Some(self.check_call(call, span)?),
            ExprKind::MethodCall(m) => Some(self.check_method_call(m, span)?),
            _ => None,
        };
        let Some(results) = results else {
            return Ok(self.check_expr(e)?.into_iter().collect());
        };
        e.ty = results.first().copied();
        Ok(results)
    }

    fn check_expr(&mut self, e: &mut Expr) -> Result<Option<GtypeId>> {
        let span = e.span;
        let ty = match &mut e.kind {
            ExprKind::IntLit(_) | ExprKind::CharLit(_) => Some(self.program.types.int),
            ExprKind::StringLit(_) => Some(self.program.types.string),
            ExprKind::Ident(rel) => self.check_ident(rel, span)?,
            ExprKind::Unary(op, operand) => self.check_unary(*op, operand, span)?,
            ExprKind::Binary(b) => Some(self.check_binary(b, span)?),
            ExprKind::Call(call) => self.check_call(call, span)?.first().copied(),
            ExprKind::MethodCall(m) => self.check_method_call(m, span)?.first().copied(),
            ExprKind::Selector(base, field) => Some(self.check_selector(base, *field, span)?),
            ExprKind::Index(base, index) => Some(self.check_index(base, index, span)?),
            ExprKind::Slice(s) => Some(self.check_slice(s, span)?),
            ExprKind::TypeAssert(x, ty) => {
                let xt = self.check_value(x)?;
                let iface = match xt {
                    Some(t) if self.program.is_interface(t) => t,
                    _ => return Err(TypeError::NotAnInterface.at(x.span).into()),
                };
                let target = ty.gtype.ok_or_else(|| TypeError::NotAType.at(ty.span))?;
                self.check_assert_possible(iface, target, ty.span)?;
                Some(target)
            }
            ExprKind::CompositeLit(lit) => Some(self.check_composite(lit, span)?),
            ExprKind::Make(m) => Some(self.check_make(m, span)?),
            ExprKind::Conversion(ty, arg) => {
                let target = ty.gtype.ok_or_else(|| TypeError::NotAType.at(ty.span))?;
                self.check_conversion(target, arg, span)?;
                Some(target)
            }
        };
        e.ty = ty;
        Ok(ty)
    }

    fn check_ident(&mut self, rel: &Relation, span: Span) -> Result<Option<GtypeId>> {
        let name = rel.name();
        match rel.entity() {
            None => {
                if name.symbol == self.program.blank {
                    return Err(TypeError::InvalidOperation
                        .at_with_message(span, "cannot use _ as value")
                        .into());
                }
                Err(TypeError::Undefined
                    .named_at(span, self.interner.name(name.symbol))
                    .into())
            }
            Some(Entity::Var(v)) => match self.program.vars[v].ty {
                VarType::Known(t) => Ok(Some(t)),
                VarType::Dependent if self.globals_phase && self.program.vars[v].is_global() => {
                    Err(Fail::Pending(v))
                }
                VarType::Dependent => Err(Fail::Fatal(self.cannot_infer(v))),
            },
            Some(Entity::Const(c)) => {
                if c == self.program.nil {
                    return Ok(None);
                }
                if c == self.program.iota {
                    return Err(TypeError::InvalidOperation
                        .at_with_message(span, "cannot use iota outside constant declaration")
                        .into());
                }
                Ok(self.program.consts[c].ty)
            }
            Some(Entity::Type(_)) => Err(TypeError::TypeNotValue
                .named_at(span, self.interner.name(name.symbol))
                .into()),
            Some(Entity::Func(_)) => Err(TypeError::NotYetImplemented
                .named_at(span, "function values")
                .into()),
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &mut Expr, span: Span) -> Result<Option<GtypeId>> {
        let t = self.check_value(operand)?;
        match op {
            UnaryOp::Neg => {
                self.require_integer(t, operand.span)?;
                Ok(t)
            }
            UnaryOp::Not => match t {
                Some(t) if self.program.is_bool(t) => Ok(Some(t)),
                _ => Err(TypeError::InvalidOperation
                    .at_with_message(span, "operator ! not defined on operand")
                    .into()),
            },
            UnaryOp::Addr => {
                let t = t.ok_or_else(|| TypeError::InvalidOperation.at_with_message(span, "cannot take address of nil"))?;
                if !self.is_addressable(operand) && !matches!(operand.kind, ExprKind::CompositeLit(_)) {
                    return Err(TypeError::InvalidOperation
                        .at_with_message(span, "cannot take address of expression")
                        .into());
                }
                Ok(Some(self.program.pointer_to(t)))
            }
            UnaryOp::Deref => match t.and_then(|t| match self.program.kind(t) {
                GtypeKind::Pointer(elem) => Some(*elem),
                _ => None,
            }) {
                Some(elem) => Ok(Some(elem)),
                None => Err(TypeError::NotAPointer.at(span).into()),
            },
        }
    }

    fn check_binary(&mut self, b: &mut BinaryExpr, span: Span) -> Result<GtypeId> {
        let lt = self.check_value(&mut b.left)?;
        let rt = self.check_value(&mut b.right)?;
        let bool_ty = self.program.types.bool;
        if b.op.is_logical() {
            for (t, e) in [(lt, &b.left), (rt, &b.right)] {
                if !t.is_some_and(|t| self.program.is_bool(t)) {
                    return Err(TypeError::InvalidOperation
                        .at_with_message(e.span, format!("operator {} requires boolean operands", b.op.as_str()))
                        .into());
                }
            }
            return Ok(bool_ty);
        }
        if b.op.is_comparison() {
            let left_untyped = self.is_untyped(&b.left);
            self.check_comparable(lt, left_untyped, rt, &b.right, span)?;
            if !matches!(b.op, BinaryOp::Eq | BinaryOp::Ne) {
                let ordered = lt.or(rt).is_some_and(|t| {
                    self.program.is_integer(t) || self.program.is_string(t)
                });
                if !ordered {
                    return Err(TypeError::InvalidOperation
                        .at_with_message(span, format!("operator {} not defined on operands", b.op.as_str()))
                        .into());
                }
            }
            return Ok(bool_ty);
        }
        let (Some(l), Some(r)) = (lt, rt) else {
            return Err(TypeError::InvalidOperation
                .at_with_message(span, format!("operator {} not defined on nil", b.op.as_str()))
                .into());
        };
        let left_untyped = self.is_untyped(&b.left);
        let result = if left_untyped { r } else { l };
        let operands_ok = if left_untyped || self.is_untyped(&b.right) {
            let (typed, untyped) = if left_untyped { (r, l) } else { (l, r) };
            self.untyped_fits(untyped, typed)
        } else {
            self.program.identical(l, r)
        };
        if !operands_ok {
            return Err(TypeError::MismatchedTypes
                .at_with_message(
                    span,
                    format!(
                        "mismatched types {} and {}",
                        self.type_name(l),
                        self.type_name(r)
                    ),
                )
                .into());
        }
        let defined = match b.op {
            BinaryOp::Add => self.program.is_integer(result) || self.program.is_string(result),
            _ => self.program.is_integer(result),
        };
        if !defined {
            let name = self.type_name(result);
            return Err(TypeError::InvalidOperation
                .at_with_message(span, format!("operator {} not defined on {}", b.op.as_str(), name))
                .into());
        }
        Ok(result)
    }

    fn check_selector(&mut self, base: &mut Expr, field: Ident, span: Span) -> Result<GtypeId> {
        let bt = self
            .check_value(base)?
            .ok_or_else(|| TypeError::NotAStruct.at(base.span))?;
        if let Some((ty, _)) = self.program.field(bt, field.symbol) {
            return Ok(ty);
        }
        let is_struct = |t| matches!(self.program.kind(t), GtypeKind::Struct(_));
        let through_ptr = self.program.elem(bt).filter(|_| self.program.is_pointer(bt));
        if is_struct(bt) || through_ptr.is_some_and(is_struct) {
            let name = self.interner.name(field.symbol);
            return Err(TypeError::UnknownField.named_at(field.span, name).into());
        }
        if self.program.named_receiver(bt).is_some_and(|(n, _)| {
            self.program.methods.lookup(n, field.symbol).is_some()
        }) {
            return Err(TypeError::NotYetImplemented.named_at(span, "method values").into());
        }
        let name = self.type_name(bt);
        Err(TypeError::NotAStruct
            .at_with_message(base.span, format!("{} is not a struct", name))
            .into())
    }

    fn check_index(&mut self, base: &mut Expr, index: &mut Expr, span: Span) -> Result<GtypeId> {
        let bt = self
            .check_value(base)?
            .ok_or_else(|| TypeError::NotIndexable.at(base.span))?;
        let it = self.check_value(index)?;
        let elem = match self.program.kind(bt).clone() {
            GtypeKind::Map { key, value } => {
                self.check_assignable(Some(&*index), it, key, index.span)?;
                return Ok(value);
            }
            GtypeKind::String => self.program.types.byte,
            GtypeKind::Slice(elem) | GtypeKind::Array { elem, .. } => elem,
            GtypeKind::Pointer(p) => match self.program.kind(p) {
                GtypeKind::Array { elem, .. } => *elem,
                _ => return Err(TypeError::NotIndexable.at(span).into()),
            },
            _ => {
                let name = self.type_name(bt);
                return Err(TypeError::NotIndexable
                    .at_with_message(span, format!("cannot index {}", name))
                    .into());
            }
        };
        self.require_integer(it, index.span)?;
        Ok(elem)
    }

    fn check_slice(&mut self, s: &mut SliceExpr, span: Span) -> Result<GtypeId> {
        let bt = self
            .check_value(&mut s.expr)?
            .ok_or_else(|| TypeError::NotSliceable.at(s.expr.span))?;
        for bound in [&mut s.low, &mut s.high, &mut s.max].into_iter().flatten() {
            let t = self.check_value(bound)?;
            self.require_integer(t, bound.span)?;
        }
        match self.program.kind(bt).clone() {
            GtypeKind::String if s.max.is_some() => Err(TypeError::NotSliceable
                .at_with_message(span, "3-index slice of string")
                .into()),
            GtypeKind::String | GtypeKind::Slice(_) => Ok(bt),
            GtypeKind::Array { elem, .. } => {
                if !self.is_addressable(&s.expr) {
                    return Err(TypeError::NotSliceable
                        .at_with_message(span, "cannot slice unaddressable array")
                        .into());
                }
                Ok(self.program.slice_of(elem))
            }
            GtypeKind::Pointer(p) => match self.program.kind(p).clone() {
                GtypeKind::Array { elem, .. } => Ok(self.program.slice_of(elem)),
                _ => Err(TypeError::NotSliceable.at(span).into()),
            },
            _ => Err(TypeError::NotSliceable.at(span).into()),
        }
    }

    fn check_composite(&mut self, lit: &mut CompositeLit, span: Span) -> Result<GtypeId> {
        let ty = lit
            .ty
            .gtype
            .ok_or_else(|| TypeError::NotAType.at(lit.ty.span))?;
        match (self.program.kind(ty).clone(), &mut lit.elems) {
            (GtypeKind::Struct(fields), CompositeElems::Fields(inits)) => {
                for init in inits.iter_mut() {
                    let Some(field) = fields.iter().find(|f| f.name == init.name.symbol) else {
                        let name = self.interner.name(init.name.symbol);
                        return Err(TypeError::UnknownField.named_at(init.name.span, name).into());
                    };
                    let vt = self.check_value(&mut init.value)?;
                    self.check_assignable(Some(&init.value), vt, field.ty, init.value.span)?;
                }
            }
            (GtypeKind::Struct(fields), CompositeElems::Positional(values)) => {
                if !values.is_empty() && values.len() != fields.len() {
                    return Err(TypeError::WrongArgCount
                        .at_with_message(span, "wrong number of values in struct literal")
                        .into());
                }
                for (value, field) in values.iter_mut().zip(&fields) {
                    let vt = self.check_value(value)?;
                    self.check_assignable(Some(&*value), vt, field.ty, value.span)?;
                }
            }
            (GtypeKind::Slice(elem), CompositeElems::Positional(values))
            | (GtypeKind::Array { elem, len: None }, CompositeElems::Positional(values)) => {
                self.check_elements(values, elem)?;
            }
            (GtypeKind::Array { elem, len: Some(n) }, CompositeElems::Positional(values)) => {
                if values.len() as i64 > n {
                    return Err(TypeError::InvalidOperation
                        .at_with_message(span, format!("array index {} out of bounds [0:{}]", n, n))
                        .into());
                }
                self.check_elements(values, elem)?;
            }
            (GtypeKind::Map { key, value }, CompositeElems::Map(pairs)) => {
                for (k, v) in pairs.iter_mut() {
                    let kt = self.check_value(k)?;
                    self.check_assignable(Some(&*k), kt, key, k.span)?;
                    let vt = self.check_value(v)?;
                    self.check_assignable(Some(&*v), vt, value, v.span)?;
                }
            }
            (GtypeKind::Map { .. }, CompositeElems::Positional(values)) if values.is_empty() => {}
            _ => {
                let name = self.type_name(ty);
                return Err(TypeError::InvalidOperation
                    .at_with_message(span, format!("invalid composite literal of type {}", name))
                    .into());
            }
        }
        Ok(ty)
    }

    fn check_elements(&mut self, values: &mut [Expr], elem: GtypeId) -> Result<()> {
        for value in values {
            let vt = self.check_value(value)?;
            self.check_assignable(Some(&*value), vt, elem, value.span)?;
        }
        Ok(())
    }

    fn check_make(&mut self, m: &mut MakeExpr, span: Span) -> Result<GtypeId> {
        let ty = m.ty.gtype.ok_or_else(|| TypeError::NotAType.at(m.ty.span))?;
        let allowed = match self.program.kind(ty) {
            GtypeKind::Slice(_) => 1..=2,
            GtypeKind::Map { .. } => 0..=1,
            _ => {
                let name = self.type_name(ty);
                return Err(TypeError::InvalidMake
                    .at_with_message(span, format!("cannot make {}", name))
                    .into());
            }
        };
        if !allowed.contains(&m.args.len()) {
            return Err(TypeError::InvalidMake
                .at_with_message(span, "wrong number of arguments to make")
                .into());
        }
        for arg in &mut m.args {
            let t = self.check_value(arg)?;
            self.require_integer(t, arg.span)?;
        }
        Ok(ty)
    }

    fn check_conversion(&mut self, target: GtypeId, arg: &mut Expr, span: Span) -> Result<()> {
        let at = self.check_value(arg)?;
        let Some(at) = at else {
            if self.is_nil(arg) && self.accepts_nil(target) {
                return Ok(());
            }
            return Err(TypeError::InvalidConversion.at(span).into());
        };
        if self.program.is_interface(target) {
            return self.check_types(at, target, span);
        }
        let p = &*self.program;
        let ok = p.identical(p.underlying(at), p.underlying(target))
            || (p.is_integer(at) && p.is_integer(target))
            || (p.is_string(target) && is_byte_slice(p, at))
            || (is_byte_slice(p, target) && p.is_string(at))
            || (self.is_untyped(arg) && self.untyped_fits(at, target));
        if ok {
            Ok(())
        } else {
            Err(TypeError::InvalidConversion
                .at_with_message(
                    span,
                    format!("cannot convert {} to {}", self.type_name(at), self.type_name(target)),
                )
                .into())
        }
    }

    // ==================== Calls ====================

    fn check_call(&mut self, call: &mut CallExpr, span: Span) -> Result<Vec<GtypeId>> {
        let entity = call.func.as_relation().and_then(Relation::entity);
        match entity {
            Some(Entity::Type(t)) => {
                if call.args.len() != 1 || call.spread {
                    return Err(TypeError::WrongArgCount
                        .at_with_message(span, "conversion takes exactly one argument")
                        .into());
                }
                self.check_conversion(t, &mut call.args[0], span)?;
                Ok(vec![t])
            }
            Some(Entity::Func(f)) => {
                let func = &self.program.funcs[f];
                match func.kind {
                    FuncKind::Builtin(b) => self.check_builtin(b, call, span),
                    FuncKind::Extern => {
                        let results = func.results.clone();
                        for arg in &mut call.args {
                            self.check_value(arg)?;
                        }
                        Ok(results)
                    }
                    FuncKind::User | FuncKind::Method { .. } => {
                        let params = func.params.clone();
                        let results = func.results.clone();
                        let variadic = func.variadic;
                        self.check_args(&params, variadic, &mut call.args, call.spread, span)?;
                        Ok(results)
                    }
                }
            }
            Some(Entity::Var(_)) => Err(TypeError::NotYetImplemented
                .named_at(span, "calls through function values")
                .into()),
            Some(Entity::Const(_)) | None => {
                Err(TypeError::NotCallable.at(call.func.span).into())
            }
        }
    }

    fn check_args(
        &mut self,
        params: &[GtypeId],
        variadic: bool,
        args: &mut [Expr],
        spread: bool,
        span: Span,
    ) -> Result<()> {
        if args.len() == 1 && params.len() > 1 && is_call(&args[0]) {
            return Err(TypeError::NotYetImplemented
                .named_at(span, "multi-value call as arguments")
                .into());
        }
        if spread && !variadic {
            return Err(TypeError::InvalidOperation
                .at_with_message(span, "cannot use ... in call to non-variadic function")
                .into());
        }
        let fixed = if variadic && !spread { params.len() - 1 } else { params.len() };
        let count_ok = if variadic && !spread {
            args.len() >= fixed
        } else {
            args.len() == params.len()
        };
        if !count_ok {
            let what = if args.len() < fixed { "not enough" } else { "too many" };
            return Err(TypeError::WrongArgCount
                .at_with_message(span, format!("{} arguments in call", what))
                .into());
        }
        for (i, arg) in args.iter_mut().enumerate() {
            let target = if i < fixed {
                params[i]
            } else {
                // Extra arguments of a variadic call fill the trailing slice.
                let last = params[params.len() - 1];
                self.program.elem(last).unwrap_or(last)
            };
            let at = self.check_value(arg)?;
            self.check_assignable(Some(&*arg), at, target, arg.span)?;
        }
        Ok(())
    }

    fn check_builtin(&mut self, b: Builtin, call: &mut CallExpr, span: Span) -> Result<Vec<GtypeId>> {
        let int = self.program.types.int;
        let bad_arg = |msg: String| Fail::Fatal(TypeError::InvalidBuiltinArg.at_with_message(span, msg));
        match b {
            Builtin::Len | Builtin::Cap => {
                let [arg] = call.args.as_mut_slice() else {
                    return Err(bad_arg(format!("{} takes exactly one argument", b.name())));
                };
                let t = self.check_value(arg)?;
                let ok = t.is_some_and(|t| match self.program.kind(t) {
                    GtypeKind::Slice(_) | GtypeKind::Array { .. } => true,
                    GtypeKind::String | GtypeKind::Map { .. } => b == Builtin::Len,
                    GtypeKind::Pointer(p) => {
                        matches!(self.program.kind(*p), GtypeKind::Array { .. })
                    }
                    _ => false,
                });
                if !ok {
                    return Err(bad_arg(format!("invalid argument for {}", b.name())));
                }
                Ok(vec![int])
            }
            Builtin::Append => {
                let Some((first, rest)) = call.args.split_first_mut() else {
                    return Err(bad_arg("append needs a slice".to_owned()));
                };
                let st = self.check_value(first)?;
                let (st, elem) = match st.map(|t| (t, self.program.kind(t).clone())) {
                    Some((t, GtypeKind::Slice(elem))) => (t, elem),
                    _ => return Err(bad_arg("first argument to append must be a slice".to_owned())),
                };
                if call.spread {
                    let [other] = rest else {
                        return Err(bad_arg("can only use ... with one extra argument".to_owned()));
                    };
                    let ot = self.check_value(other)?;
                    let ok = ot.is_some_and(|ot| {
                        self.program.identical(ot, st)
                            || self.program.elem(ot).is_some_and(|e| {
                                self.program.is_slice(ot) && self.program.identical(e, elem)
                            })
                            || (self.program.is_string(ot)
                                && matches!(self.program.kind(elem), GtypeKind::Byte))
                    });
                    if !ok {
                        return Err(bad_arg("mismatched argument to append".to_owned()));
                    }
                } else {
                    self.check_elements(rest, elem)?;
                }
                Ok(vec![st])
            }
            Builtin::Panic => {
                let [arg] = call.args.as_mut_slice() else {
                    return Err(bad_arg("panic takes exactly one argument".to_owned()));
                };
                let t = self.check_value(arg)?;
                let ok = t.is_some_and(|t| self.program.is_string(t) || self.program.is_interface(t));
                if !ok {
                    return Err(bad_arg("panic argument must be a string or an interface".to_owned()));
                }
                Ok(Vec::new())
            }
            Builtin::Print | Builtin::Println => {
                for arg in &mut call.args {
                    let t = self.check_value(arg)?;
                    let printable = t.is_some_and(|t| {
                        matches!(
                            self.program.kind(t),
                            GtypeKind::Int
                                | GtypeKind::Byte
                                | GtypeKind::Bool
                                | GtypeKind::String
                                | GtypeKind::Pointer(_)
                        )
                    });
                    if !printable {
                        return Err(Fail::Fatal(
                            TypeError::InvalidBuiltinArg
                                .at_with_message(arg.span, format!("cannot {} this value", b.name())),
                        ));
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    fn check_method_call(&mut self, m: &mut MethodCallExpr, span: Span) -> Result<Vec<GtypeId>> {
        let rt = self
            .check_value(&mut m.receiver)?
            .ok_or_else(|| TypeError::InvalidOperation.at_with_message(m.receiver.span, "method call on nil"))?;
        let method = m.method.symbol;

        if let Some((named, is_ptr)) = self.program.named_receiver(rt) {
            if let Some(entry) = self.program.methods.lookup(named, method) {
                if entry.pointer_receiver && !is_ptr && !self.is_addressable(&m.receiver) {
                    return Err(TypeError::InvalidOperation
                        .at_with_message(span, "cannot call pointer method on non-addressable value")
                        .into());
                }
                let func = &self.program.funcs[entry.func];
                let (params, results, variadic) =
                    (func.params.clone(), func.results.clone(), func.variadic);
                self.check_args(&params, variadic, &mut m.args, m.spread, span)?;
                m.target = Some(MethodTarget::Static {
                    func: entry.func,
                    pointer_receiver: entry.pointer_receiver,
                });
                return Ok(results);
            }
        }

        if let Some(methods) = self.program.interface_methods(rt) {
            if let Some(sig) = methods.iter().find(|s| s.name == method).cloned() {
                self.check_args(&sig.params, sig.variadic, &mut m.args, m.spread, span)?;
                m.target = Some(MethodTarget::Interface);
                return Ok(sig.results);
            }
        }

        let msg = format!(
            "{}.{} undefined (type {} has no method {})",
            self.type_name(rt),
            self.interner.name(method),
            self.type_name(rt),
            self.interner.name(method)
        );
        Err(TypeError::UnknownMethod.at_with_message(m.method.span, msg).into())
    }
}

fn is_call(e: &Expr) -> bool {
    matches!(e.kind, ExprKind::Call(_) | ExprKind::MethodCall(_))
        && !is_conversion_call(e)
}

fn is_conversion_call(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Call(c) => matches!(
            c.func.as_relation().and_then(Relation::entity),
            Some(Entity::Type(_))
        ),
        _ => false,
    }
}

fn is_byte_slice(program: &Program, t: GtypeId) -> bool {
    match program.kind(t) {
        GtypeKind::Slice(e) => matches!(program.kind(*e), GtypeKind::Byte),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;
    use minigo_syntax::parse_source;

    use super::*;
    use crate::analyze_package;

    fn analyze(src: &str) -> std::result::Result<(Program, CompilationContext, usize), Vec<Diagnostic>> {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let file = parse_source(&mut ctx, "a.go", src).unwrap();
        let name = ctx.interner.intern("main");
        match analyze_package(&mut program, &ctx.interner, name, "main", vec![file]) {
            Ok(index) => Ok((program, ctx, index)),
            Err(mut sink) => Err(sink.take()),
        }
    }

    fn error_code(src: &str) -> u16 {
        match analyze(src) {
            Ok(_) => panic!("expected an error"),
            Err(diags) => diags[0].code.unwrap_or(0),
        }
    }

    fn global_type(src: &str, index: usize) -> String {
        let (program, ctx, pkg) = analyze(src).unwrap();
        let var = program.packages[pkg].globals[index];
        program.type_name(program.vars[var].gtype().unwrap(), &ctx.interner)
    }

    #[test]
    fn test_global_forward_reference() {
        let src = "package main\nvar x = y + 1\nvar y = 5\nfunc main() {}\n";
        assert_eq!(global_type(src, 0), "int");
    }

    #[test]
    fn test_global_inference_chain() {
        let src = "package main\n\
                   var a = b\n\
                   var b = c[0]\n\
                   var c = []string{\"x\"}\n\
                   func main() {}\n";
        assert_eq!(global_type(src, 0), "string");
        assert_eq!(global_type(src, 2), "[]string");
    }

    #[test]
    fn test_global_cycle_is_fatal() {
        let src = "package main\nvar a = b\nvar b = a\nfunc main() {}\n";
        assert_eq!(error_code(src), TypeError::CannotInfer.code());
    }

    #[test]
    fn test_expression_types() {
        let src = "package main\n\
                   type T struct { name string; next *T }\n\
                   var t T\n\
                   var s = \"abc\"\n\
                   var b = s[1]\n\
                   var p = &t\n\
                   var n = p.next.name\n\
                   var m = map[string]int{\"a\": 1}\n\
                   var v = m[\"a\"]\n\
                   var arr [3]int\n\
                   var sl = arr[1:]\n\
                   var l = len(sl) * 2\n\
                   func main() {}\n";
        let expected = ["main.T", "string", "byte", "*main.T", "string", "map[string]int", "int", "[3]int", "[]int", "int"];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(global_type(src, i), *want, "global {}", i);
        }
    }

    #[test]
    fn test_multi_value_forms() {
        let (program, ctx, pkg) = analyze(
            "package main\n\
             func two() (int, string) { return 1, \"a\" }\n\
             var m map[string]bool\n\
             var e error\n\
             func main() {\n\
               a, b := two()\n\
               v, ok := m[\"k\"]\n\
               s, ok2 := e.(*Err)\n\
               println(a, b, v, ok, s, ok2)\n\
             }\n\
             type Err struct{}\n\
             func (e *Err) Error() string { return \"\" }\n",
        )
        .unwrap();
        let main = program.packages[pkg].funcs[1];
        let types: Vec<_> = program.funcs[main]
            .locals
            .iter()
            .map(|&v| program.type_name(program.vars[v].gtype().unwrap(), &ctx.interner))
            .collect();
        assert_eq!(types, vec!["int", "string", "bool", "bool", "*main.Err", "bool"]);
    }

    #[test]
    fn test_single_valued_call_in_pair_is_an_error() {
        let src = "package main\n\
                   func f() int { return 1 }\n\
                   func main() { a, b := f(); println(a, b) }\n";
        assert_eq!(error_code(src), TypeError::AssignCountMismatch.code());
        let src = "package main\n\
                   func f() (int, int) { return 1, 2 }\n\
                   var a, b = 1, f()\n\
                   func main() {}\n";
        assert_eq!(error_code(src), TypeError::AssignCountMismatch.code());
    }

    #[test]
    fn test_method_targets() {
        let (program, _, pkg) = analyze(
            "package main\n\
             type Shape interface { Area() int }\n\
             type Sq struct { w int }\n\
             func (s *Sq) Area() int { return s.w * s.w }\n\
             func main() {\n\
               var sq Sq\n\
               var sh Shape = &sq\n\
               println(sq.Area(), sh.Area())\n\
             }\n",
        )
        .unwrap();
        let file = &program.packages[pkg].files[0];
        let Some(Decl::Func(main)) = file.decls.last() else {
            panic!("main missing");
        };
        let body = &main.body.as_ref().unwrap().stmts;
        let StmtKind::Expr(call) = &body[2].kind else {
            panic!("println missing");
        };
        let ExprKind::Call(call) = &call.kind else {
            panic!("not a call");
        };
        let targets: Vec<_> = call
            .args
            .iter()
            .map(|a| match &a.kind {
                ExprKind::MethodCall(m) => m.target,
                _ => None,
            })
            .collect();
        assert!(matches!(
            targets[0],
            Some(MethodTarget::Static { pointer_receiver: true, .. })
        ));
        assert_eq!(targets[1], Some(MethodTarget::Interface));
    }

    #[test]
    fn test_type_errors() {
        let cases = [
            ("var x int = \"s\"", TypeError::MismatchedTypes),
            ("var x = 1 + \"s\"", TypeError::MismatchedTypes),
            ("var x = nil", TypeError::UntypedNil),
            ("type T struct{}\nvar t T\nvar x = t.f", TypeError::UnknownField),
            ("var i = 3\nvar x = i.f", TypeError::NotAStruct),
            ("var x = len(3)", TypeError::InvalidBuiltinArg),
            ("var x = make(int)", TypeError::InvalidMake),
            ("var x = *3", TypeError::NotAPointer),
            ("var e error = 5", TypeError::MissingMethod),
            ("var x = string(true)", TypeError::InvalidConversion),
        ];
        for (decl, want) in cases {
            let src = format!("package main\n{}\nfunc main() {{}}\n", decl);
            assert_eq!(error_code(&src), want.code(), "{}", decl);
        }
    }

    #[test]
    fn test_statement_errors() {
        let cases = [
            ("if 1 {}", TypeError::NonBoolCondition),
            ("for _, c := range 5 { _ = c }", TypeError::NotIterable),
            ("return 1", TypeError::WrongResultCount),
            ("x := nil; _ = x", TypeError::UntypedNil),
            ("f := 1; f()", TypeError::NotYetImplemented),
        ];
        for (stmt, want) in cases {
            let src = format!("package main\nfunc main() {{ {} }}\n", stmt);
            assert_eq!(error_code(&src), want.code(), "{}", stmt);
        }
    }

    #[test]
    fn test_range_and_type_switch_bindings() {
        let (program, ctx, pkg) = analyze(
            "package main\n\
             func main() {\n\
               var x interface{}\n\
               for i, c := range \"hi\" { println(i, c) }\n\
               switch v := x.(type) {\n\
               case int: println(v)\n\
               case string, bool: _ = v\n\
               }\n\
             }\n",
        )
        .unwrap();
        let main = program.packages[pkg].funcs[0];
        let types: Vec<_> = program.funcs[main]
            .locals
            .iter()
            .map(|&v| program.type_name(program.vars[v].gtype().unwrap(), &ctx.interner))
            .collect();
        assert_eq!(types, vec!["interface{}", "int", "byte", "int", "interface{}"]);
    }
}
