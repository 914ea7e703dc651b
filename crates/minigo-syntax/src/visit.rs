//! Mutable walk over the AST.
//!
//! Implementors override the `visit_*` hooks they care about and call the
//! matching `walk_*` function to keep descending. The default hooks visit
//! every [`Relation`] in the tree, including the names inside type
//! expressions and array length expressions.

use minigo_common::Span;

use crate::ast::*;

pub trait VisitMut {
    fn visit_relation(&mut self, _rel: &mut Relation, _span: Span) {}

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_type_expr(&mut self, ty: &mut TypeExpr) {
        walk_type_expr(self, ty);
    }
}

pub fn walk_file<V: VisitMut + ?Sized>(v: &mut V, file: &mut File) {
    for decl in &mut file.decls {
        walk_decl(v, decl);
    }
}

pub fn walk_decl<V: VisitMut + ?Sized>(v: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Var(d) => {
            for spec in &mut d.specs {
                walk_var_spec(v, spec);
            }
        }
        Decl::Const(d) => walk_const_decl(v, d),
        Decl::Type(d) => v.visit_type_expr(&mut d.ty),
        Decl::Func(f) => {
            if let Some(recv) = &mut f.receiver {
                v.visit_type_expr(&mut recv.ty);
            }
            walk_sig(v, &mut f.sig);
            if let Some(body) = &mut f.body {
                walk_block(v, body);
            }
        }
    }
}

fn walk_var_spec<V: VisitMut + ?Sized>(v: &mut V, spec: &mut VarSpec) {
    if let Some(ty) = &mut spec.ty {
        v.visit_type_expr(ty);
    }
    for value in &mut spec.values {
        v.visit_expr(value);
    }
}

fn walk_const_decl<V: VisitMut + ?Sized>(v: &mut V, decl: &mut ConstDecl) {
    for spec in &mut decl.specs {
        if let Some(ty) = &mut spec.ty {
            v.visit_type_expr(ty);
        }
        v.visit_expr(&mut spec.value);
    }
}

fn walk_sig<V: VisitMut + ?Sized>(v: &mut V, sig: &mut FuncSig) {
    for p in &mut sig.params {
        v.visit_type_expr(&mut p.ty);
    }
    for r in &mut sig.results {
        v.visit_type_expr(r);
    }
}

pub fn walk_block<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Empty | StmtKind::Break(_) | StmtKind::Continue(_) => {}
        StmtKind::Var(spec) => walk_var_spec(v, spec),
        StmtKind::Const(d) => walk_const_decl(v, d),
        StmtKind::Type(d) => v.visit_type_expr(&mut d.ty),
        StmtKind::Expr(e) => v.visit_expr(e),
        StmtKind::Assign(a) | StmtKind::ShortVarDecl(a) => {
            for e in a.lefts.iter_mut().chain(a.rights.iter_mut()) {
                v.visit_expr(e);
            }
        }
        StmtKind::IncDec(s) => v.visit_expr(&mut s.operand),
        StmtKind::Block(b) => walk_block(v, b),
        StmtKind::If(s) => {
            if let Some(init) = &mut s.init {
                v.visit_stmt(init);
            }
            v.visit_expr(&mut s.cond);
            walk_block(v, &mut s.then);
            if let Some(els) = &mut s.els {
                v.visit_stmt(els);
            }
        }
        StmtKind::For(f) => {
            match &mut f.clause {
                ForClause::Cond { init, cond, post } => {
                    if let Some(init) = init {
                        v.visit_stmt(init);
                    }
                    if let Some(cond) = cond {
                        v.visit_expr(cond);
                    }
                    if let Some(post) = post {
                        v.visit_stmt(post);
                    }
                }
                ForClause::Range(r) => {
                    v.visit_expr(&mut r.expr);
                    if let Some(k) = &mut r.key {
                        v.visit_expr(k);
                    }
                    if let Some(val) = &mut r.value {
                        v.visit_expr(val);
                    }
                }
            }
            walk_block(v, &mut f.body);
        }
        StmtKind::Switch(s) => {
            if let Some(tag) = &mut s.tag {
                v.visit_expr(tag);
            }
            for case in &mut s.cases {
                for value in &mut case.values {
                    v.visit_expr(value);
                }
                for stmt in &mut case.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        StmtKind::TypeSwitch(s) => {
            v.visit_expr(&mut s.subject);
            for case in &mut s.cases {
                for ty in case.types.iter_mut().flatten() {
                    v.visit_type_expr(ty);
                }
                for stmt in &mut case.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        StmtKind::Return(r) => {
            for e in &mut r.results {
                v.visit_expr(e);
            }
        }
        StmtKind::Defer(d) => v.visit_expr(&mut d.call),
    }
}

pub fn walk_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    let span = expr.span;
    match &mut expr.kind {
        ExprKind::IntLit(_) | ExprKind::CharLit(_) | ExprKind::StringLit(_) => {}
        ExprKind::Ident(rel) => v.visit_relation(rel, span),
        ExprKind::Unary(_, e) => v.visit_expr(e),
        ExprKind::Binary(b) => {
            v.visit_expr(&mut b.left);
            v.visit_expr(&mut b.right);
        }
        ExprKind::Call(c) => {
            v.visit_expr(&mut c.func);
            for a in &mut c.args {
                v.visit_expr(a);
            }
        }
        ExprKind::MethodCall(m) => {
            v.visit_expr(&mut m.receiver);
            for a in &mut m.args {
                v.visit_expr(a);
            }
        }
        ExprKind::Selector(base, _) => v.visit_expr(base),
        ExprKind::Index(base, index) => {
            v.visit_expr(base);
            v.visit_expr(index);
        }
        ExprKind::Slice(s) => {
            v.visit_expr(&mut s.expr);
            for bound in [&mut s.low, &mut s.high, &mut s.max].into_iter().flatten() {
                v.visit_expr(bound);
            }
        }
        ExprKind::TypeAssert(e, ty) => {
            v.visit_expr(e);
            v.visit_type_expr(ty);
        }
        ExprKind::CompositeLit(lit) => {
            v.visit_type_expr(&mut lit.ty);
            match &mut lit.elems {
                CompositeElems::Fields(fields) => {
                    for f in fields {
                        v.visit_expr(&mut f.value);
                    }
                }
                CompositeElems::Positional(elems) => {
                    for e in elems {
                        v.visit_expr(e);
                    }
                }
                CompositeElems::Map(pairs) => {
                    for (k, val) in pairs {
                        v.visit_expr(k);
                        v.visit_expr(val);
                    }
                }
            }
        }
        ExprKind::Make(m) => {
            v.visit_type_expr(&mut m.ty);
            for a in &mut m.args {
                v.visit_expr(a);
            }
        }
        ExprKind::Conversion(ty, e) => {
            v.visit_type_expr(ty);
            v.visit_expr(e);
        }
    }
}

pub fn walk_type_expr<V: VisitMut + ?Sized>(v: &mut V, ty: &mut TypeExpr) {
    let span = ty.span;
    match &mut ty.kind {
        TypeExprKind::Name(rel) => v.visit_relation(rel, span),
        TypeExprKind::Pointer(e) | TypeExprKind::Slice(e) => v.visit_type_expr(e),
        TypeExprKind::Array { len, elem } => {
            v.visit_expr(len);
            v.visit_type_expr(elem);
        }
        TypeExprKind::Map { key, value } => {
            v.visit_type_expr(key);
            v.visit_type_expr(value);
        }
        TypeExprKind::Struct(fields) => {
            for f in fields {
                v.visit_type_expr(&mut f.ty);
            }
        }
        TypeExprKind::Interface(methods) => {
            for m in methods {
                walk_sig(v, &mut m.sig);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;

    use super::*;
    use crate::parse_source;

    #[derive(Default)]
    struct NameCollector {
        names: Vec<Span>,
    }

    impl VisitMut for NameCollector {
        fn visit_relation(&mut self, _rel: &mut Relation, span: Span) {
            self.names.push(span);
        }
    }

    #[test]
    fn test_visits_value_and_type_names() {
        let mut ctx = CompilationContext::new();
        let src = "package main\n\
                   type T struct { a [N]byte; b *U }\n\
                   func f(x T) int { return len(x.a) + y }\n";
        let mut file = parse_source(&mut ctx, "a.go", src).unwrap();
        let mut collector = NameCollector::default();
        walk_file(&mut collector, &mut file);
        let names: Vec<_> = collector
            .names
            .iter()
            .map(|s| ctx.source_map.span_text(*s).unwrap_or_default().to_owned())
            .collect();
        assert_eq!(names, vec!["N", "byte", "U", "T", "int", "len", "x", "y"]);
    }
}
