//! Structural dump of the AST, one node per line, indented by depth.
//!
//! Used by `minigo parse` and by tests that want to compare tree shapes.

use std::fmt::Write;

use minigo_common::{Ident, SymbolInterner};

use crate::ast::*;

pub struct AstDumper<'a> {
    interner: &'a SymbolInterner,
    out: String,
    depth: usize,
}

impl<'a> AstDumper<'a> {
    pub fn new(interner: &'a SymbolInterner) -> Self {
        Self {
            interner,
            out: String::new(),
            depth: 0,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn name(&self, ident: Ident) -> &'a str {
        self.interner.name(ident.symbol)
    }

    fn relation(&self, rel: &Relation) -> String {
        match rel.pkg() {
            Some(pkg) => format!("{}.{}", self.name(pkg), self.name(rel.name())),
            None => self.name(rel.name()).to_owned(),
        }
    }

    pub fn file(&mut self, file: &File) {
        self.line(format!("package {}", self.name(file.package)));
        for import in &file.imports {
            self.line(format!("import {:?}", import.path));
        }
        for decl in &file.decls {
            self.decl(decl);
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(d) => {
                for spec in &d.specs {
                    self.var_spec(spec);
                }
            }
            Decl::Const(d) => self.const_decl(d),
            Decl::Type(d) => self.type_decl(d),
            Decl::Func(f) => self.func_decl(f),
        }
    }

    fn var_spec(&mut self, spec: &VarSpec) {
        let names: Vec<_> = spec.names.iter().map(|n| self.name(*n)).collect();
        let ty = spec.ty.as_ref().map(|t| self.type_string(t));
        match ty {
            Some(ty) => self.line(format!("var {} {}", names.join(", "), ty)),
            None => self.line(format!("var {}", names.join(", "))),
        }
        self.nested(|d| {
            for value in &spec.values {
                d.expr(value);
            }
        });
    }

    fn const_decl(&mut self, decl: &ConstDecl) {
        for spec in &decl.specs {
            self.line(format!("const {} (iota {})", self.name(spec.name), spec.iota));
            self.nested(|d| d.expr(&spec.value));
        }
    }

    fn type_decl(&mut self, decl: &TypeDecl) {
        let ty = self.type_string(&decl.ty);
        self.line(format!("type {} {}", self.name(decl.name), ty));
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        let mut header = String::from("func ");
        if let Some(recv) = &func.receiver {
            let _ = write!(header, "({} {}) ", self.name(recv.name), self.type_string(&recv.ty));
        }
        header.push_str(self.name(func.name));
        header.push_str(&self.sig_string(&func.sig));
        if func.defer_count > 0 {
            let _ = write!(header, " [defers {}]", func.defer_count);
        }
        self.line(header);
        if let Some(body) = &func.body {
            self.nested(|d| d.stmts(&body.stmts));
        }
    }

    fn sig_string(&self, sig: &FuncSig) -> String {
        let params: Vec<_> = sig
            .params
            .iter()
            .map(|p| {
                let prefix = if p.variadic { "..." } else { "" };
                format!("{} {}{}", self.name(p.name), prefix, self.type_string(&p.ty))
            })
            .collect();
        let results: Vec<_> = sig.results.iter().map(|t| self.type_string(t)).collect();
        match results.len() {
            0 => format!("({})", params.join(", ")),
            1 => format!("({}) {}", params.join(", "), results[0]),
            _ => format!("({}) ({})", params.join(", "), results.join(", ")),
        }
    }

    /// Single-line rendering of a type expression.
    pub fn type_string(&self, ty: &TypeExpr) -> String {
        match &ty.kind {
            TypeExprKind::Name(rel) => self.relation(rel),
            TypeExprKind::Pointer(elem) => format!("*{}", self.type_string(elem)),
            TypeExprKind::Array { len, elem } => {
                let len = match &len.kind {
                    ExprKind::IntLit(n) => n.to_string(),
                    _ => "N".to_owned(),
                };
                format!("[{}]{}", len, self.type_string(elem))
            }
            TypeExprKind::Slice(elem) => format!("[]{}", self.type_string(elem)),
            TypeExprKind::Map { key, value } => {
                format!("map[{}]{}", self.type_string(key), self.type_string(value))
            }
            TypeExprKind::Struct(fields) => {
                let fields: Vec<_> = fields
                    .iter()
                    .map(|f| format!("{} {}", self.name(f.name), self.type_string(&f.ty)))
                    .collect();
                format!("struct{{{}}}", fields.join("; "))
            }
            TypeExprKind::Interface(methods) => {
                let methods: Vec<_> = methods
                    .iter()
                    .map(|m| format!("{}{}", self.name(m.name), self.sig_string(&m.sig)))
                    .collect();
                format!("interface{{{}}}", methods.join("; "))
            }
        }
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Empty => self.line("empty"),
            StmtKind::Var(spec) => self.var_spec(spec),
            StmtKind::Const(decl) => self.const_decl(decl),
            StmtKind::Type(decl) => self.type_decl(decl),
            StmtKind::Expr(e) => {
                self.line("expr");
                self.nested(|d| d.expr(e));
            }
            StmtKind::Assign(a) => self.assign("assign", a),
            StmtKind::ShortVarDecl(a) => self.assign("define", a),
            StmtKind::IncDec(s) => {
                self.line(if s.inc { "inc" } else { "dec" });
                self.nested(|d| d.expr(&s.operand));
            }
            StmtKind::Block(b) => {
                self.line("block");
                self.nested(|d| d.stmts(&b.stmts));
            }
            StmtKind::If(s) => {
                self.line("if");
                self.nested(|d| {
                    if let Some(init) = &s.init {
                        d.stmt(init);
                    }
                    d.expr(&s.cond);
                    d.line("then");
                    d.nested(|d| d.stmts(&s.then.stmts));
                    if let Some(els) = &s.els {
                        d.line("else");
                        d.nested(|d| d.stmt(els));
                    }
                });
            }
            StmtKind::For(f) => self.for_stmt(f),
            StmtKind::Switch(s) => {
                self.line(format!("switch #{}", s.id.0));
                self.nested(|d| {
                    if let Some(tag) = &s.tag {
                        d.expr(tag);
                    }
                    for case in &s.cases {
                        d.line(if case.is_default { "default" } else { "case" });
                        d.nested(|d| {
                            for v in &case.values {
                                d.expr(v);
                            }
                            d.stmts(&case.body);
                        });
                    }
                });
            }
            StmtKind::TypeSwitch(s) => {
                let binding = s.binding.map(|b| self.name(b)).unwrap_or("_");
                self.line(format!("typeswitch #{} {}", s.id.0, binding));
                self.nested(|d| {
                    d.expr(&s.subject);
                    for case in &s.cases {
                        if case.is_default {
                            d.line("default");
                        } else {
                            let types: Vec<_> = case
                                .types
                                .iter()
                                .map(|t| t.as_ref().map_or("nil".to_owned(), |t| d.type_string(t)))
                                .collect();
                            d.line(format!("case {}", types.join(", ")));
                        }
                        d.nested(|d| d.stmts(&case.body));
                    }
                });
            }
            StmtKind::Return(r) => {
                self.line("return");
                self.nested(|d| {
                    for e in &r.results {
                        d.expr(e);
                    }
                });
            }
            StmtKind::Break(id) => self.line(format!("break #{}", id.0)),
            StmtKind::Continue(id) => self.line(format!("continue #{}", id.0)),
            StmtKind::Defer(d) => {
                self.line(format!("defer {}", d.index));
                self.nested(|dd| dd.expr(&d.call));
            }
        }
    }

    fn assign(&mut self, label: &str, a: &AssignStmt) {
        self.line(label);
        self.nested(|d| {
            for e in &a.lefts {
                d.expr(e);
            }
            d.line("=");
            for e in &a.rights {
                d.expr(e);
            }
        });
    }

    fn for_stmt(&mut self, f: &ForStmt) {
        match &f.clause {
            ForClause::Cond { init, cond, post } => {
                self.line(format!("for #{}", f.id.0));
                self.nested(|d| {
                    if let Some(init) = init {
                        d.stmt(init);
                    }
                    if let Some(cond) = cond {
                        d.expr(cond);
                    }
                    if let Some(post) = post {
                        d.stmt(post);
                    }
                    d.line("body");
                    d.nested(|d| d.stmts(&f.body.stmts));
                });
            }
            ForClause::Range(r) => {
                let op = if r.define { ":=" } else { "=" };
                self.line(format!("for-range #{} {}", f.id.0, op));
                self.nested(|d| {
                    if let Some(k) = &r.key {
                        d.expr(k);
                    }
                    if let Some(v) = &r.value {
                        d.expr(v);
                    }
                    d.line("range");
                    d.nested(|d| d.expr(&r.expr));
                    d.line("body");
                    d.nested(|d| d.stmts(&f.body.stmts));
                });
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::IntLit(n) => self.line(format!("int {}", n)),
            ExprKind::CharLit(c) => self.line(format!("char {}", c)),
            ExprKind::StringLit(s) => self.line(format!("string \"{}\"", s.text)),
            ExprKind::Ident(rel) => self.line(format!("ident {}", self.relation(rel))),
            ExprKind::Unary(op, operand) => {
                self.line(format!("unary {}", op.as_str()));
                self.nested(|d| d.expr(operand));
            }
            ExprKind::Binary(b) => {
                self.line(format!("binary {}", b.op.as_str()));
                self.nested(|d| {
                    d.expr(&b.left);
                    d.expr(&b.right);
                });
            }
            ExprKind::Call(c) => {
                self.line(if c.spread { "call ..." } else { "call" });
                self.nested(|d| {
                    d.expr(&c.func);
                    for a in &c.args {
                        d.expr(a);
                    }
                });
            }
            ExprKind::MethodCall(m) => {
                self.line(format!("methodcall {}", self.name(m.method)));
                self.nested(|d| {
                    d.expr(&m.receiver);
                    for a in &m.args {
                        d.expr(a);
                    }
                });
            }
            ExprKind::Selector(base, field) => {
                self.line(format!("selector {}", self.name(*field)));
                self.nested(|d| d.expr(base));
            }
            ExprKind::Index(base, index) => {
                self.line("index");
                self.nested(|d| {
                    d.expr(base);
                    d.expr(index);
                });
            }
            ExprKind::Slice(s) => {
                self.line("slice");
                self.nested(|d| {
                    d.expr(&s.expr);
                    for (label, bound) in [("low", &s.low), ("high", &s.high), ("max", &s.max)] {
                        if let Some(bound) = bound {
                            d.line(label);
                            d.nested(|d| d.expr(bound));
                        }
                    }
                });
            }
            ExprKind::TypeAssert(base, ty) => {
                self.line(format!("assert {}", self.type_string(ty)));
                self.nested(|d| d.expr(base));
            }
            ExprKind::CompositeLit(lit) => {
                self.line(format!("composite {}", self.type_string(&lit.ty)));
                self.nested(|d| match &lit.elems {
                    CompositeElems::Fields(fields) => {
                        for f in fields {
                            d.line(format!("{}:", d.name(f.name)));
                            d.nested(|d| d.expr(&f.value));
                        }
                    }
                    CompositeElems::Positional(values) => {
                        for v in values {
                            d.expr(v);
                        }
                    }
                    CompositeElems::Map(pairs) => {
                        for (k, v) in pairs {
                            d.line("entry");
                            d.nested(|d| {
                                d.expr(k);
                                d.expr(v);
                            });
                        }
                    }
                });
            }
            ExprKind::Make(m) => {
                self.line(format!("make {}", self.type_string(&m.ty)));
                self.nested(|d| {
                    for a in &m.args {
                        d.expr(a);
                    }
                });
            }
            ExprKind::Conversion(ty, e) => {
                self.line(format!("convert {}", self.type_string(ty)));
                self.nested(|d| d.expr(e));
            }
        }
    }
}

/// Dumps a whole file.
pub fn dump_file(file: &File, interner: &SymbolInterner) -> String {
    let mut dumper = AstDumper::new(interner);
    dumper.file(file);
    dumper.finish()
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;

    use super::*;

    #[test]
    fn test_dump_function() {
        let mut ctx = CompilationContext::new();
        let file = crate::parse_source(
            &mut ctx,
            "t.go",
            "package main\nfunc add(a, b int) int {\nreturn a + b\n}\n",
        )
        .unwrap();
        let out = dump_file(&file, &ctx.interner);
        let expected = "\
package main
func add(a int, b int) int
  return
    binary +
      ident a
      ident b
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_types() {
        let mut ctx = CompilationContext::new();
        let file = crate::parse_source(
            &mut ctx,
            "t.go",
            "package p\ntype M map[string][]*T\ntype S struct { a [4]byte }\n",
        )
        .unwrap();
        let out = dump_file(&file, &ctx.interner);
        assert!(out.contains("type M map[string][]*T"));
        assert!(out.contains("type S struct{a [4]byte}"));
    }
}
