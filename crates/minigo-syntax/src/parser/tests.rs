use minigo_common::CompilationContext;

use crate::ast::*;
use crate::errors::SyntaxError;

fn parse_ok(src: &str) -> (File, CompilationContext) {
    let mut ctx = CompilationContext::new();
    let file = crate::parse_source(&mut ctx, "test.go", src)
        .unwrap_or_else(|d| panic!("parse failed: {}", d));
    (file, ctx)
}

fn parse_err(src: &str) -> u16 {
    let mut ctx = CompilationContext::new();
    match crate::parse_source(&mut ctx, "test.go", src) {
        Ok(_) => panic!("expected parse error"),
        Err(d) => d.code.unwrap_or(0),
    }
}

fn func_body<'f>(file: &'f File, name: &str, ctx: &CompilationContext) -> &'f [Stmt] {
    for decl in &file.decls {
        if let Decl::Func(f) = decl {
            if ctx.interner.name(f.name.symbol) == name {
                return &f.body.as_ref().expect("body").stmts;
            }
        }
    }
    panic!("no function {}", name)
}

#[test]
fn test_package_and_imports() {
    let (file, ctx) = parse_ok("package main\nimport \"os\"\nimport (\n\"fmt\"\n\"lib/strings\"\n)\n");
    assert_eq!(ctx.interner.name(file.package.symbol), "main");
    let names: Vec<_> = file.imports.iter().map(|i| ctx.interner.name(i.name)).collect();
    assert_eq!(names, vec!["os", "fmt", "strings"]);
    assert_eq!(file.imports[2].path, "lib/strings");
}

#[test]
fn test_missing_package_clause() {
    assert_eq!(parse_err("func main() {}"), SyntaxError::ExpectedPackage.code());
}

#[test]
fn test_const_group_iota_repeats_previous() {
    let (file, _) = parse_ok("package p\nconst (\nA = iota\nB\nC\n)\n");
    let Decl::Const(decl) = &file.decls[0] else {
        panic!("expected const");
    };
    assert_eq!(decl.specs.len(), 3);
    assert_eq!(decl.specs[2].iota, 2);
    assert!(matches!(decl.specs[2].value.kind, ExprKind::Ident(_)));
}

#[test]
fn test_var_count_mismatch() {
    assert_eq!(
        parse_err("package p\nvar a, b = 1, 2, 3\n"),
        SyntaxError::AssignmentCountMismatch.code()
    );
}

#[test]
fn test_multi_var_with_call() {
    let (file, _) = parse_ok("package p\nvar a, b = f()\n");
    let Decl::Var(decl) = &file.decls[0] else {
        panic!("expected var");
    };
    assert_eq!(decl.specs[0].names.len(), 2);
    assert_eq!(decl.specs[0].values.len(), 1);
    assert_eq!(decl.specs[0].vars.len(), 2);
}

#[test]
fn test_func_signature() {
    let (file, _) = parse_ok("package p\nfunc f(a, b int, rest ...string) (int, error) { return 0, nil }\n");
    let Decl::Func(f) = &file.decls[0] else {
        panic!("expected func");
    };
    assert_eq!(f.sig.params.len(), 3);
    assert!(f.sig.params[2].variadic);
    assert!(matches!(f.sig.params[2].ty.kind, TypeExprKind::Slice(_)));
    assert_eq!(f.sig.results.len(), 2);
}

#[test]
fn test_variadic_must_be_last() {
    assert_eq!(
        parse_err("package p\nfunc f(a ...int, b int) {}\n"),
        SyntaxError::UnexpectedToken.code()
    );
}

#[test]
fn test_method_receiver_and_defer_label() {
    let (file, _) = parse_ok(
        "package p\ntype T struct { x, y int }\nfunc (t *T) Get() int { defer g(); defer h(); return t.x }\nfunc g() {}\n",
    );
    let Decl::Func(get) = &file.decls[1] else {
        panic!("expected func");
    };
    let recv = get.receiver.as_ref().expect("receiver");
    assert!(matches!(recv.ty.kind, TypeExprKind::Pointer(_)));
    assert_eq!(get.defer_count, 2);
    let Decl::Func(g) = &file.decls[2] else {
        panic!("expected func");
    };
    assert_ne!(get.defer_label, g.defer_label);
    assert_eq!(g.defer_count, 0);
}

#[test]
fn test_struct_fields_grouped() {
    let (file, _) = parse_ok("package p\ntype T struct {\na, b int\nc string\n}\n");
    let Decl::Type(t) = &file.decls[0] else {
        panic!("expected type");
    };
    let TypeExprKind::Struct(fields) = &t.ty.kind else {
        panic!("expected struct");
    };
    assert_eq!(fields.len(), 3);
}

#[test]
fn test_interface_methods() {
    let (file, _) = parse_ok("package p\ntype S interface {\nString() string\nLen(x int) int\n}\n");
    let Decl::Type(t) = &file.decls[0] else {
        panic!("expected type");
    };
    let TypeExprKind::Interface(methods) = &t.ty.kind else {
        panic!("expected interface");
    };
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[1].sig.params.len(), 1);
}

#[test]
fn test_precedence() {
    let (file, ctx) = parse_ok("package p\nfunc f() { x := 1 + 2 * 3 - 4 }\n");
    let body = func_body(&file, "f", &ctx);
    let StmtKind::ShortVarDecl(assign) = &body[0].kind else {
        panic!("expected :=");
    };
    // (1 + (2 * 3)) - 4
    let ExprKind::Binary(outer) = &assign.rights[0].kind else {
        panic!("expected binary");
    };
    assert_eq!(outer.op, BinaryOp::Sub);
    let ExprKind::Binary(inner) = &outer.left.kind else {
        panic!("expected binary");
    };
    assert_eq!(inner.op, BinaryOp::Add);
    assert!(matches!(&inner.right.kind, ExprKind::Binary(b) if b.op == BinaryOp::Mul));
}

#[test]
fn test_logical_binds_loosest() {
    let (file, ctx) = parse_ok("package p\nfunc f() { ok := a < b && c || d }\n");
    let body = func_body(&file, "f", &ctx);
    let StmtKind::ShortVarDecl(assign) = &body[0].kind else {
        panic!("expected :=");
    };
    assert!(matches!(&assign.rights[0].kind, ExprKind::Binary(b) if b.op == BinaryOp::OrOr));
}

#[test]
fn test_bitwise_is_not_implemented() {
    assert_eq!(
        parse_err("package p\nfunc f() { x := a | b }\n"),
        SyntaxError::NotYetImplemented.code()
    );
}

#[test]
fn test_selector_chain() {
    let (file, ctx) = parse_ok("package p\nfunc f() { a.b.c().d[0] = 1 }\n");
    let body = func_body(&file, "f", &ctx);
    let StmtKind::Assign(assign) = &body[0].kind else {
        panic!("expected =");
    };
    let ExprKind::Index(base, _) = &assign.lefts[0].kind else {
        panic!("expected index");
    };
    let ExprKind::Selector(call, field) = &base.kind else {
        panic!("expected selector");
    };
    assert_eq!(ctx.interner.name(field.symbol), "d");
    assert!(matches!(call.kind, ExprKind::MethodCall(_)));
}

#[test]
fn test_slice_forms() {
    let (file, ctx) = parse_ok("package p\nfunc f() {\na := s[:2]\nb := s[1:]\nc := s[1:2:3]\nd := s[i]\n}\n");
    let body = func_body(&file, "f", &ctx);
    let slice = |i: usize| match &body[i].kind {
        StmtKind::ShortVarDecl(a) => match &a.rights[0].kind {
            ExprKind::Slice(s) => (s.low.is_some(), s.high.is_some(), s.max.is_some()),
            _ => panic!("expected slice"),
        },
        _ => panic!("expected :="),
    };
    assert_eq!(slice(0), (false, true, false));
    assert_eq!(slice(1), (true, false, false));
    assert_eq!(slice(2), (true, true, true));
    assert!(matches!(&body[3].kind, StmtKind::ShortVarDecl(a) if matches!(a.rights[0].kind, ExprKind::Index(..))));
}

#[test]
fn test_composite_literals() {
    let (file, ctx) = parse_ok(
        "package p\nfunc f() {\na := T{x: 1, y: 2}\nb := []int{1, 2, 3}\nc := map[string]int{\"a\": 1}\nd := &T{}\ne := []*T{{x: 1}}\n}\n",
    );
    let body = func_body(&file, "f", &ctx);
    let lit = |i: usize| match &body[i].kind {
        StmtKind::ShortVarDecl(a) => a.rights[0].clone(),
        _ => panic!("expected :="),
    };
    assert!(matches!(&lit(0).kind, ExprKind::CompositeLit(c) if matches!(&c.elems, CompositeElems::Fields(f) if f.len() == 2)));
    assert!(matches!(&lit(1).kind, ExprKind::CompositeLit(c) if matches!(&c.elems, CompositeElems::Positional(v) if v.len() == 3)));
    assert!(matches!(&lit(2).kind, ExprKind::CompositeLit(c) if matches!(&c.elems, CompositeElems::Map(p) if p.len() == 1)));
    assert!(matches!(&lit(3).kind, ExprKind::Unary(UnaryOp::Addr, _)));
    let ExprKind::CompositeLit(outer) = &lit(4).kind else {
        panic!("expected literal");
    };
    let CompositeElems::Positional(values) = &outer.elems else {
        panic!("expected positional");
    };
    assert!(matches!(values[0].kind, ExprKind::Unary(UnaryOp::Addr, _)));
}

#[test]
fn test_no_composite_literal_in_if_header() {
    let (file, ctx) = parse_ok("package p\nfunc f() { if x == y { return } }\n");
    let body = func_body(&file, "f", &ctx);
    assert!(matches!(body[0].kind, StmtKind::If(_)));
}

#[test]
fn test_conversions_and_make() {
    let (file, ctx) = parse_ok("package p\nfunc f() {\nb := []byte(s)\nm := make(map[string]int)\nxs := make([]int, 0, 8)\n}\n");
    let body = func_body(&file, "f", &ctx);
    assert!(matches!(&body[0].kind, StmtKind::ShortVarDecl(a) if matches!(a.rights[0].kind, ExprKind::Conversion(..))));
    assert!(matches!(&body[1].kind, StmtKind::ShortVarDecl(a) if matches!(&a.rights[0].kind, ExprKind::Make(m) if m.args.is_empty())));
    assert!(matches!(&body[2].kind, StmtKind::ShortVarDecl(a) if matches!(&a.rights[0].kind, ExprKind::Make(m) if m.args.len() == 2)));
}

#[test]
fn test_qualified_identifier() {
    let (file, ctx) = parse_ok("package p\nimport \"os\"\nfunc f() { os.Exit(1) }\n");
    let body = func_body(&file, "f", &ctx);
    let StmtKind::Expr(call) = &body[0].kind else {
        panic!("expected expr stmt");
    };
    let ExprKind::Call(call) = &call.kind else {
        panic!("expected call");
    };
    let rel = call.func.as_relation().expect("relation");
    assert_eq!(ctx.interner.name(rel.name().symbol), "Exit");
    assert_eq!(rel.pkg().map(|p| ctx.interner.name(p.symbol).to_owned()), Some("os".to_owned()));
}

#[test]
fn test_func_name_literal() {
    let (file, ctx) = parse_ok("package p\nfunc hello() { s := __func__ }\n");
    let body = func_body(&file, "hello", &ctx);
    let StmtKind::ShortVarDecl(a) = &body[0].kind else {
        panic!("expected :=");
    };
    assert!(matches!(&a.rights[0].kind, ExprKind::StringLit(s) if s.text == "hello" && s.len == 5));
}

#[test]
fn test_for_forms() {
    let (file, ctx) = parse_ok(
        "package p\nfunc f() {\nfor {}\nfor x < 3 {}\nfor i := 0; i < 10; i++ {}\nfor i, v := range xs {}\nfor range xs {}\n}\n",
    );
    let body = func_body(&file, "f", &ctx);
    let clause = |i: usize| match &body[i].kind {
        StmtKind::For(f) => f.clause.clone(),
        _ => panic!("expected for"),
    };
    assert!(matches!(clause(0), ForClause::Cond { init: None, cond: None, post: None }));
    assert!(matches!(clause(1), ForClause::Cond { init: None, cond: Some(_), post: None }));
    assert!(matches!(clause(2), ForClause::Cond { init: Some(_), cond: Some(_), post: Some(_) }));
    assert!(matches!(clause(3), ForClause::Range(RangeClause { key: Some(_), value: Some(_), define: true, .. })));
    assert!(matches!(clause(4), ForClause::Range(RangeClause { key: None, value: None, .. })));
}

#[test]
fn test_break_continue_targets() {
    let (file, ctx) = parse_ok(
        "package p\nfunc f() {\nfor {\nswitch x {\ncase 1:\nbreak\ndefault:\ncontinue\n}\n}\n}\n",
    );
    let body = func_body(&file, "f", &ctx);
    let StmtKind::For(for_stmt) = &body[0].kind else {
        panic!("expected for");
    };
    let StmtKind::Switch(sw) = &for_stmt.body.stmts[0].kind else {
        panic!("expected switch");
    };
    assert!(matches!(sw.cases[0].body[0].kind, StmtKind::Break(id) if id == sw.id));
    assert!(matches!(sw.cases[1].body[0].kind, StmtKind::Continue(id) if id == for_stmt.id));
    assert!(sw.cases[1].is_default);
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(parse_err("package p\nfunc f() { break }\n"), SyntaxError::BreakOutsideLoop.code());
    assert_eq!(
        parse_err("package p\nfunc f() { switch { default: continue } }\n"),
        SyntaxError::ContinueOutsideLoop.code()
    );
}

#[test]
fn test_type_switch() {
    let (file, ctx) = parse_ok(
        "package p\nfunc f() {\nswitch v := x.(type) {\ncase int, string:\nprint(v)\ncase nil:\ndefault:\n}\n}\n",
    );
    let body = func_body(&file, "f", &ctx);
    let StmtKind::TypeSwitch(ts) = &body[0].kind else {
        panic!("expected type switch");
    };
    assert!(ts.binding.is_some());
    assert_eq!(ts.cases.len(), 3);
    assert_eq!(ts.cases[0].types.len(), 2);
    assert!(ts.cases[1].types[0].is_none());
    assert!(ts.cases[2].is_default);
}

#[test]
fn test_type_guard_outside_switch() {
    assert_eq!(
        parse_err("package p\nfunc f() { y := x.(type) }\n"),
        SyntaxError::UnexpectedToken.code()
    );
}

#[test]
fn test_op_assign_desugars() {
    let (file, ctx) = parse_ok("package p\nfunc f() { x += 2 }\n");
    let body = func_body(&file, "f", &ctx);
    let StmtKind::Assign(a) = &body[0].kind else {
        panic!("expected =");
    };
    assert!(matches!(&a.rights[0].kind, ExprKind::Binary(b) if b.op == BinaryOp::Add));
    assert_eq!(a.op, Some(BinaryOp::Add));
}

#[test]
fn test_if_else_chain_with_init() {
    let (file, ctx) = parse_ok(
        "package p\nfunc f() {\nif v, ok := m[k]; ok {\n} else if x {\n} else {\n}\n}\n",
    );
    let body = func_body(&file, "f", &ctx);
    let StmtKind::If(stmt) = &body[0].kind else {
        panic!("expected if");
    };
    assert!(stmt.init.is_some());
    let els = stmt.els.as_ref().expect("else");
    let StmtKind::If(inner) = &els.kind else {
        panic!("expected else if");
    };
    assert!(matches!(inner.els.as_deref(), Some(Stmt { kind: StmtKind::Block(_), .. })));
}

#[test]
fn test_spread_call() {
    let (file, ctx) = parse_ok("package p\nfunc f() { g(a, xs...) }\n");
    let body = func_body(&file, "f", &ctx);
    assert!(matches!(&body[0].kind, StmtKind::Expr(e) if matches!(&e.kind, ExprKind::Call(c) if c.spread && c.args.len() == 2)));
}

#[test]
fn test_array_type_with_const_length() {
    let (file, _) = parse_ok("package p\nvar buf [N + 1]byte\n");
    let Decl::Var(decl) = &file.decls[0] else {
        panic!("expected var");
    };
    assert!(matches!(
        decl.specs[0].ty.as_ref().map(|t| &t.kind),
        Some(TypeExprKind::Array { .. })
    ));
}

#[test]
fn test_unsupported_statements() {
    assert_eq!(parse_err("package p\nfunc f() { go g() }\n"), SyntaxError::NotYetImplemented.code());
    assert_eq!(parse_err("package p\nfunc f() { x := func() {} }\n"), SyntaxError::NotYetImplemented.code());
    assert_eq!(
        parse_err("package p\nfunc f() { switch { case true: fallthrough } }\n"),
        SyntaxError::NotYetImplemented.code()
    );
}

#[test]
fn test_defer_requires_call() {
    assert_eq!(parse_err("package p\nfunc f() { defer x }\n"), SyntaxError::UnexpectedToken.code());
}
