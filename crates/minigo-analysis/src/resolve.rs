//! Name resolution.
//!
//! Pass (a) walks each file in order. Declarations are entered into the
//! package or block scope when they are reached, and every name is looked up
//! at its point of use through the block stack, the package scope and the
//! universe. A type name that isn't declared yet becomes an alias type
//! holding the unresolved relation.
//!
//! Pass (b) runs after each file and again after the whole package. It
//! retries every unresolved relation (in the AST, in alias types, in constant
//! expressions and in array lengths) against the package scope. Names still
//! unresolved after the last retry are reported together.

use std::collections::BTreeMap;

use minigo_common::{
    ConstId, DiagnosticSink, Entity, FuncId, GtypeId, Ident, ScopeId, Span, Symbol, SymbolInterner,
    VarId,
};
use minigo_syntax::ast::*;
use minigo_syntax::visit::{self, VisitMut};
use tracing::trace;

use crate::errors::TypeError;
use crate::methods::PendingMethod;
use crate::program::{ConstKind, Constant, FuncKind, Function, Program, VarKind, VarType, Variable};
use crate::scope::Scope;
use crate::types::{Field, GtypeKind, MethodSig};

/// What pass (a) collected about a package.
#[derive(Debug, Default)]
pub(crate) struct Declared {
    pub globals: Vec<VarId>,
    pub consts: Vec<ConstId>,
    pub funcs: Vec<FuncId>,
    pub init: Option<FuncId>,
    pub methods: Vec<PendingMethod>,
}

pub(crate) struct Resolver<'a> {
    program: &'a mut Program,
    interner: &'a SymbolInterner,
    pkg_name: Symbol,
    pkg_scope: ScopeId,
    blocks: Vec<Scope>,
    func: Option<FuncId>,
    init_sym: Option<Symbol>,
    local_types: u32,
    declared: Declared,
    errors: DiagnosticSink,
}

impl<'a> Resolver<'a> {
    pub fn new(
        program: &'a mut Program,
        interner: &'a SymbolInterner,
        pkg_name: Symbol,
        pkg_scope: ScopeId,
    ) -> Self {
        Self {
            program,
            interner,
            pkg_name,
            pkg_scope,
            blocks: Vec::new(),
            func: None,
            init_sym: interner.get("init"),
            local_types: 0,
            declared: Declared::default(),
            errors: DiagnosticSink::new(),
        }
    }

    /// Pass (a) over one file.
    pub fn resolve_file(&mut self, file: &mut File) {
        for import in &file.imports {
            if self.program.package_index(import.name).is_none() {
                self.errors
                    .emit(TypeError::UnknownPackage.named_at(import.span, &import.path));
            }
        }
        for decl in &mut file.decls {
            match decl {
                Decl::Var(d) => {
                    for spec in &mut d.specs {
                        self.resolve_var_spec(spec, VarKind::Global);
                    }
                }
                Decl::Const(d) => self.resolve_const_decl(d),
                Decl::Type(d) => self.resolve_type_decl(d),
                Decl::Func(f) => self.resolve_func(f),
            }
        }
    }

    pub fn finish(self) -> (Declared, DiagnosticSink) {
        (self.declared, self.errors)
    }

    fn is_blank(&self, name: Ident) -> bool {
        name.symbol == self.program.blank
    }

    fn name(&self, sym: Symbol) -> &str {
        self.interner.name(sym)
    }

    /// Declares `name` in the innermost block, or in the package scope at
    /// the top level.
    fn declare(&mut self, name: Ident, entity: Entity) {
        if self.is_blank(name) {
            return;
        }
        let result = match self.blocks.last_mut() {
            Some(block) => block.declare(name.symbol, entity),
            None => self.program.scopes[self.pkg_scope].declare(name.symbol, entity),
        };
        if result.is_err() {
            let msg = self.name(name.symbol).to_owned();
            self.errors.emit(TypeError::Redeclared.named_at(name.span, &msg));
        }
    }

    fn new_var(&mut self, name: Ident, ty: VarType, kind: VarKind) -> VarId {
        let id = self.program.vars.insert(Variable {
            name: name.symbol,
            ty,
            kind,
            pkg: self.pkg_name,
            span: name.span,
        });
        match kind {
            VarKind::Global => self.declared.globals.push(id),
            VarKind::Local => {
                if let Some(f) = self.func {
                    self.program.funcs[f].locals.push(id);
                }
            }
            VarKind::Param => {}
        }
        id
    }

    fn with_block(&mut self, f: impl FnOnce(&mut Self)) {
        self.blocks.push(Scope::new(None));
        f(self);
        self.blocks.pop();
    }

    // ==================== Declarations ====================

    fn resolve_var_spec(&mut self, spec: &mut VarSpec, kind: VarKind) {
        let ty = spec.ty.as_mut().map(|t| self.resolve_type(t));
        for value in &mut spec.values {
            self.visit_expr(value);
        }
        let var_ty = ty.map_or(VarType::Dependent, VarType::Known);
        for (i, &name) in spec.names.iter().enumerate() {
            if self.is_blank(name) {
                continue;
            }
            let id = self.new_var(name, var_ty, kind);
            self.declare(name, Entity::Var(id));
            spec.vars[i] = Some(id);
        }
    }

    fn resolve_const_decl(&mut self, decl: &mut ConstDecl) {
        for spec in &mut decl.specs {
            let ty = spec.ty.as_mut().map(|t| self.resolve_type(t));
            self.visit_expr(&mut spec.value);
            let id = self.program.consts.insert(Constant {
                name: spec.name.symbol,
                kind: ConstKind::User,
                ty,
                explicit_type: ty.is_some(),
                value: None,
                expr: Some(spec.value.clone()),
                iota: spec.iota,
                span: spec.name.span,
            });
            self.declare(spec.name, Entity::Const(id));
            spec.id = Some(id);
            self.declared.consts.push(id);
        }
    }

    fn resolve_type_decl(&mut self, decl: &mut TypeDecl) {
        let local = if self.blocks.is_empty() {
            None
        } else {
            self.local_types += 1;
            Some(self.local_types)
        };
        let named = self.program.new_type(GtypeKind::Named {
            name: decl.name.symbol,
            pkg: self.pkg_name,
            underlying: None,
            local,
        });
        // Declared before its definition so it can refer to itself.
        self.declare(decl.name, Entity::Type(named));
        decl.id = Some(named);
        let target = self.resolve_type(&mut decl.ty);
        if let GtypeKind::Named { underlying, .. } = &mut self.program.gtypes[named].kind {
            *underlying = Some(target);
        }
    }

    fn resolve_func(&mut self, decl: &mut FuncDecl) {
        let receiver = decl
            .receiver
            .as_mut()
            .map(|r| (self.resolve_type(&mut r.ty), r.ty.span));
        let params: Vec<GtypeId> = decl
            .sig
            .params
            .iter_mut()
            .map(|p| self.resolve_type(&mut p.ty))
            .collect();
        let results: Vec<GtypeId> = decl
            .sig
            .results
            .iter_mut()
            .map(|r| self.resolve_type(r))
            .collect();

        let mut func = Function::new(decl.name.symbol, self.pkg_name, FuncKind::User, decl.span);
        func.variadic = decl.sig.params.last().is_some_and(|p| p.variadic);
        func.params = params;
        func.results = results;
        func.has_body = decl.body.is_some();
        func.defer_label = Some(decl.defer_label);
        func.defer_count = decl.defer_count;
        let id = self.program.funcs.insert(func);
        decl.func = Some(id);
        self.declared.funcs.push(id);

        if let Some((recv_ty, span)) = receiver {
            self.declared.methods.push(PendingMethod {
                func: id,
                receiver: recv_ty,
                span,
            });
        } else if Some(decl.name.symbol) == self.init_sym {
            if self.declared.init.is_some() {
                self.errors
                    .emit(TypeError::Redeclared.named_at(decl.name.span, "init"));
            }
            self.declared.init = Some(id);
        } else {
            self.declare(decl.name, Entity::Func(id));
        }

        let Some(body) = &mut decl.body else {
            return;
        };
        trace!(func = self.name(decl.name.symbol), "resolving body");
        self.func = Some(id);
        self.blocks.push(Scope::new(None));
        let mut param_vars = Vec::new();
        let all_params = decl.receiver.iter_mut().chain(decl.sig.params.iter_mut());
        for param in all_params {
            let ty = param.ty.gtype.map_or(VarType::Dependent, VarType::Known);
            if self.is_blank(param.name) {
                param_vars.push(None);
                continue;
            }
            let var = self.new_var(param.name, ty, VarKind::Param);
            self.declare(param.name, Entity::Var(var));
            param.var = Some(var);
            param_vars.push(Some(var));
        }
        self.program.funcs[id].param_vars = param_vars;
        // The body shares the parameters' block.
        for stmt in &mut body.stmts {
            self.visit_stmt(stmt);
        }
        self.blocks.pop();
        self.func = None;
    }

    // ==================== Names ====================

    fn resolve_relation(&mut self, rel: &mut Relation) {
        if rel.is_resolved() {
            return;
        }
        let name = rel.name();
        if self.is_blank(name) {
            return;
        }
        if let Some(pkg) = rel.pkg() {
            let Some(index) = self.program.package_index(pkg.symbol) else {
                let msg = self.name(pkg.symbol).to_owned();
                self.errors.emit(TypeError::UnknownPackage.named_at(pkg.span, &msg));
                return;
            };
            let scope = self.program.packages[index].scope;
            match self.program.scopes[scope].lookup_local(name.symbol) {
                Some(entity) => rel.resolve(entity),
                None => {
                    let full = format!("{}.{}", self.name(pkg.symbol), self.name(name.symbol));
                    self.errors
                        .emit(TypeError::UndefinedQualified.named_at(pkg.span.to(name.span), &full));
                }
            }
            return;
        }
        for block in self.blocks.iter().rev() {
            if let Some(entity) = block.lookup_local(name.symbol) {
                rel.resolve(entity);
                return;
            }
        }
        if let Some(entity) = self.program.lookup(self.pkg_scope, name.symbol) {
            rel.resolve(entity);
        }
    }

    /// Resolves a type expression to a type, creating composite types as
    /// needed. Stores the result in `ty.gtype`.
    fn resolve_type(&mut self, ty: &mut TypeExpr) -> GtypeId {
        if let Some(id) = ty.gtype {
            return id;
        }
        let span = ty.span;
        let id = match &mut ty.kind {
            TypeExprKind::Name(rel) => {
                self.resolve_relation(rel);
                match rel.entity() {
                    Some(Entity::Type(t)) => t,
                    Some(_) => {
                        let msg = self.name(rel.name().symbol).to_owned();
                        self.errors.emit(TypeError::NotAType.named_at(span, &msg));
                        self.program.types.int
                    }
                    // Already reported.
                    None if rel.pkg().is_some() => self.program.types.int,
                    None => {
                        let alias = self.program.new_type(GtypeKind::Alias(rel.clone()));
                        self.program.pending_aliases.push(alias);
                        alias
                    }
                }
            }
            TypeExprKind::Pointer(elem) => {
                let elem = self.resolve_type(elem);
                self.program.pointer_to(elem)
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.resolve_type(elem);
                self.program.slice_of(elem)
            }
            TypeExprKind::Array { len, elem } => {
                self.visit_expr(len);
                let elem = self.resolve_type(elem);
                let known = match len.kind {
                    ExprKind::IntLit(n) => Some(n),
                    _ => None,
                };
                let id = self.program.new_type(GtypeKind::Array { elem, len: known });
                if known.is_none() {
                    self.program.pending_array_lens.push((id, (**len).clone()));
                }
                id
            }
            TypeExprKind::Map { key, value } => {
                let key = self.resolve_type(key);
                let value = self.resolve_type(value);
                self.program.new_type(GtypeKind::Map { key, value })
            }
            TypeExprKind::Struct(decls) => {
                let mut fields: Vec<Field> = Vec::with_capacity(decls.len());
                for decl in decls.iter_mut() {
                    let fty = self.resolve_type(&mut decl.ty);
                    if fields.iter().any(|f| f.name == decl.name.symbol) {
                        let msg = self.name(decl.name.symbol).to_owned();
                        self.errors
                            .emit(TypeError::Redeclared.named_at(decl.name.span, &msg));
                    }
                    fields.push(Field {
                        name: decl.name.symbol,
                        ty: fty,
                        offset: None,
                    });
                }
                self.program.new_type(GtypeKind::Struct(fields))
            }
            TypeExprKind::Interface(specs) => {
                let mut methods = Vec::with_capacity(specs.len());
                for spec in specs.iter_mut() {
                    let params = spec
                        .sig
                        .params
                        .iter_mut()
                        .map(|p| self.resolve_type(&mut p.ty))
                        .collect();
                    let results = spec
                        .sig
                        .results
                        .iter_mut()
                        .map(|r| self.resolve_type(r))
                        .collect();
                    methods.push(MethodSig {
                        name: spec.name.symbol,
                        params,
                        results,
                        variadic: spec.sig.params.last().is_some_and(|p| p.variadic),
                    });
                }
                self.program.new_type(GtypeKind::Interface(methods))
            }
        };
        ty.gtype = Some(id);
        id
    }

    // ==================== Statements ====================

    fn declare_local(&mut self, name: Ident) -> Option<VarId> {
        if self.is_blank(name) {
            return None;
        }
        let id = self.new_var(name, VarType::Dependent, VarKind::Local);
        self.declare(name, Entity::Var(id));
        Some(id)
    }

    fn resolve_short_var_decl(&mut self, assign: &mut AssignStmt, span: Span) {
        for right in &mut assign.rights {
            self.visit_expr(right);
        }
        let mut any_new = false;
        for left in &mut assign.lefts {
            let ExprKind::Ident(rel) = &mut left.kind else {
                self.errors.emit(TypeError::InvalidOperation.at_with_message(
                    left.span,
                    "non-name on left side of :=",
                ));
                continue;
            };
            let name = rel.name();
            if self.is_blank(name) {
                continue;
            }
            let existing = self
                .blocks
                .last()
                .and_then(|b| b.lookup_local(name.symbol))
                .and_then(Entity::as_var);
            match existing {
                Some(var) => rel.resolve(Entity::Var(var)),
                None => {
                    if let Some(var) = self.declare_local(name) {
                        rel.resolve(Entity::Var(var));
                        any_new = true;
                    }
                }
            }
        }
        if !any_new {
            self.errors.emit(TypeError::NoNewVariables.at(span));
        }
    }

    fn resolve_range_target(&mut self, target: &mut Expr, define: bool) {
        if !define {
            self.visit_expr(target);
            return;
        }
        if let ExprKind::Ident(rel) = &mut target.kind {
            if let Some(var) = self.declare_local(rel.name()) {
                rel.resolve(Entity::Var(var));
            }
        }
    }
}

impl VisitMut for Resolver<'_> {
    fn visit_relation(&mut self, rel: &mut Relation, _span: Span) {
        self.resolve_relation(rel);
    }

    fn visit_type_expr(&mut self, ty: &mut TypeExpr) {
        self.resolve_type(ty);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Var(spec) => self.resolve_var_spec(spec, VarKind::Local),
            StmtKind::Const(d) => self.resolve_const_decl(d),
            StmtKind::Type(d) => self.resolve_type_decl(d),
            StmtKind::ShortVarDecl(a) => self.resolve_short_var_decl(a, span),
            StmtKind::Block(b) => self.with_block(|r| visit::walk_block(r, b)),
            StmtKind::If(s) => self.with_block(|r| {
                if let Some(init) = &mut s.init {
                    r.visit_stmt(init);
                }
                r.visit_expr(&mut s.cond);
                r.with_block(|r| visit::walk_block(r, &mut s.then));
                if let Some(els) = &mut s.els {
                    r.visit_stmt(els);
                }
            }),
            StmtKind::For(f) => self.with_block(|r| {
                match &mut f.clause {
                    ForClause::Cond { init, cond, post } => {
                        if let Some(init) = init {
                            r.visit_stmt(init);
                        }
                        if let Some(cond) = cond {
                            r.visit_expr(cond);
                        }
                        if let Some(post) = post {
                            r.visit_stmt(post);
                        }
                    }
                    ForClause::Range(range) => {
                        r.visit_expr(&mut range.expr);
                        let define = range.define;
                        if let Some(key) = &mut range.key {
                            r.resolve_range_target(key, define);
                        }
                        if let Some(value) = &mut range.value {
                            r.resolve_range_target(value, define);
                        }
                    }
                }
                r.with_block(|r| visit::walk_block(r, &mut f.body));
            }),
            StmtKind::Switch(s) => {
                if let Some(tag) = &mut s.tag {
                    self.visit_expr(tag);
                }
                for case in &mut s.cases {
                    for value in &mut case.values {
                        self.visit_expr(value);
                    }
                    self.with_block(|r| {
                        for stmt in &mut case.body {
                            r.visit_stmt(stmt);
                        }
                    });
                }
            }
            StmtKind::TypeSwitch(s) => {
                self.visit_expr(&mut s.subject);
                let binding = s.binding;
                for case in &mut s.cases {
                    for ty in case.types.iter_mut().flatten() {
                        self.resolve_type(ty);
                    }
                    self.with_block(|r| {
                        if let Some(name) = binding {
                            case.var = r.declare_local(name);
                        }
                        for stmt in &mut case.body {
                            r.visit_stmt(stmt);
                        }
                    });
                }
            }
            _ => visit::walk_stmt(self, stmt),
        }
    }
}

// ==================== Pass (b) ====================

/// Retries unresolved, unqualified relations against a package scope.
struct Retry<'a> {
    program: &'a Program,
    scope: ScopeId,
}

impl VisitMut for Retry<'_> {
    fn visit_relation(&mut self, rel: &mut Relation, _span: Span) {
        if rel.is_resolved() || rel.pkg().is_some() || rel.name().symbol == self.program.blank {
            return;
        }
        if let Some(entity) = self.program.lookup(self.scope, rel.name().symbol) {
            rel.resolve(entity);
        }
    }
}

/// Pass (b) over one file.
pub(crate) fn retry_file(program: &Program, scope: ScopeId, file: &mut File) {
    visit::walk_file(&mut Retry { program, scope }, file);
}

/// Pass (b) over everything outside the AST that holds relations: alias
/// types, constant expressions and array lengths.
pub(crate) fn retry_pending(program: &mut Program, scope: ScopeId, consts: &[ConstId]) {
    let mut aliases = std::mem::take(&mut program.pending_aliases);
    let mut lens = std::mem::take(&mut program.pending_array_lens);
    let mut exprs: Vec<(ConstId, Expr)> = consts
        .iter()
        .filter_map(|&c| program.consts[c].expr.take().map(|e| (c, e)))
        .collect();
    let mut alias_rels: Vec<(GtypeId, Relation)> = aliases
        .iter()
        .filter_map(|&a| match &program.gtypes[a].kind {
            GtypeKind::Alias(rel) => Some((a, rel.clone())),
            _ => None,
        })
        .collect();
    {
        let mut retry = Retry {
            program: &*program,
            scope,
        };
        for (_, rel) in &mut alias_rels {
            let span = rel.name().span;
            retry.visit_relation(rel, span);
        }
        for (_, expr) in &mut lens {
            retry.visit_expr(expr);
        }
        for (_, expr) in &mut exprs {
            retry.visit_expr(expr);
        }
    }
    for (alias, rel) in alias_rels {
        program.gtypes[alias].kind = GtypeKind::Alias(rel);
    }
    for (c, expr) in exprs {
        program.consts[c].expr = Some(expr);
    }
    program.pending_array_lens = lens;
    aliases.retain(|&a| matches!(&program.gtypes[a].kind, GtypeKind::Alias(rel) if !rel.is_resolved()));
    // Resolved aliases are kept in the arena; only the retry list shrinks.
    program.pending_aliases.append(&mut aliases);
}

/// Gathers every name still unresolved.
struct Unresolved {
    blank: Symbol,
    names: BTreeMap<(u32, u32), Symbol>,
}

impl VisitMut for Unresolved {
    fn visit_relation(&mut self, rel: &mut Relation, _span: Span) {
        let name = rel.name();
        // Qualified misses were reported when they were seen.
        if rel.is_resolved() || rel.pkg().is_some() || name.symbol == self.blank {
            return;
        }
        self.names
            .insert((name.span.start.0, name.span.end.0), name.symbol);
    }
}

/// Reports every relation still unresolved after the last retry, and every
/// alias that resolved to something other than a type.
pub(crate) fn report_unresolved(
    program: &mut Program,
    interner: &SymbolInterner,
    files: &mut [File],
    consts: &[ConstId],
    errors: &mut DiagnosticSink,
) {
    let mut collector = Unresolved {
        blank: program.blank,
        names: BTreeMap::new(),
    };
    for file in files.iter_mut() {
        visit::walk_file(&mut collector, file);
    }
    for (_, expr) in program.pending_array_lens.iter_mut() {
        collector.visit_expr(expr);
    }
    for &c in consts {
        if let Some(expr) = program.consts[c].expr.as_mut() {
            collector.visit_expr(expr);
        }
    }
    for &alias in &program.pending_aliases {
        if let GtypeKind::Alias(rel) = &program.gtypes[alias].kind {
            let name = rel.name();
            collector
                .names
                .insert((name.span.start.0, name.span.end.0), name.symbol);
        }
    }
    for ((start, end), sym) in collector.names {
        errors.emit(TypeError::Undefined.named_at(start..end, interner.name(sym)));
    }

    for (_, gtype) in program.gtypes.iter() {
        if let GtypeKind::Alias(Relation::Resolved { name, entity }) = &gtype.kind {
            if !matches!(entity, Entity::Type(_)) {
                errors.emit(TypeError::NotAType.named_at(name.span, interner.name(name.symbol)));
            }
        }
    }
    program.pending_aliases.clear();
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;
    use minigo_syntax::parse_source;

    use super::*;
    use crate::analyze_package;

    fn resolve_err(src: &str) -> Vec<(u16, String)> {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let file = parse_source(&mut ctx, "a.go", src).unwrap();
        let name = ctx.interner.intern("main");
        let sink = analyze_package(&mut program, &ctx.interner, name, "main", vec![file]).unwrap_err();
        sink.iter()
            .map(|d| (d.code.unwrap_or(0), d.message.clone()))
            .collect()
    }

    fn resolve_ok(src: &str) -> (Program, CompilationContext) {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let file = parse_source(&mut ctx, "a.go", src).unwrap();
        let name = ctx.interner.intern("main");
        analyze_package(&mut program, &ctx.interner, name, "main", vec![file]).unwrap();
        (program, ctx)
    }

    #[test]
    fn test_forward_references_across_declarations() {
        let (program, ctx) = resolve_ok(
            "package main\n\
             func main() { var p *Point = newPoint(); println(p.x) }\n\
             func newPoint() *Point { return &Point{x: origin} }\n\
             type Point struct { x int; next *Point }\n\
             const origin = 0\n",
        );
        let pkg = &program.packages[0];
        let f = pkg.funcs[1];
        let results = &program.funcs[f].results;
        assert_eq!(
            program.type_name(results[0], &ctx.interner),
            "*main.Point"
        );
    }

    #[test]
    fn test_all_unresolved_names_are_reported() {
        let errors = resolve_err(
            "package main\n\
             func main() { a := missing1; println(a, missing2) }\n\
             var g Unknown\n",
        );
        let messages: Vec<_> = errors.iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(
            messages,
            vec!["undefined: missing1", "undefined: missing2", "undefined: Unknown"]
        );
        assert!(errors.iter().all(|(code, _)| *code == 2000));
    }

    #[test]
    fn test_blank_is_never_resolved() {
        let (program, _) = resolve_ok(
            "package main\n\
             func pair() (int, int) { return 1, 2 }\n\
             func main() { _, b := pair(); _ = b }\n",
        );
        assert_eq!(program.packages[0].funcs.len(), 2);
    }

    #[test]
    fn test_locals_are_block_scoped() {
        let errors = resolve_err(
            "package main\n\
             func main() { if true { x := 1; _ = x }; println(x) }\n",
        );
        assert_eq!(errors, vec![(2000, "undefined: x".to_owned())]);
    }

    #[test]
    fn test_redeclaration() {
        let errors = resolve_err(
            "package main\n\
             var x int\n\
             func x() {}\n\
             func main() {}\n",
        );
        assert_eq!(errors[0].0, TypeError::Redeclared.code());
    }

    #[test]
    fn test_short_var_decl_needs_a_new_name() {
        let errors = resolve_err("package main\nfunc main() { a := 1; a := 2; _ = a }\n");
        assert_eq!(errors[0].0, TypeError::NoNewVariables.code());
    }

    #[test]
    fn test_short_var_decl_reuses_existing() {
        let (program, ctx) = resolve_ok(
            "package main\n\
             func two() (int, string) { return 1, \"\" }\n\
             func main() { a := 0; a, b := two(); println(a, b) }\n",
        );
        let main = program.packages[0].funcs[1];
        let names: Vec<_> = program.funcs[main]
            .locals
            .iter()
            .map(|&v| ctx.interner.name(program.vars[v].name).to_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_import() {
        let errors = resolve_err("package main\nimport \"nowhere\"\nfunc main() {}\n");
        assert_eq!(errors[0].0, TypeError::UnknownPackage.code());
    }
}
