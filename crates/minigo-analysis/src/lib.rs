//! Semantic analysis for minigo.
//!
//! Packages are analyzed one at a time, in dependency order. Each package
//! goes through these phases:
//!
//! 1. **Resolution, pass (a)** ([`resolve`]): declares package-level names
//!    as their declarations are reached and resolves every name at its
//!    point of use. Type names not declared yet become alias types.
//! 2. **Resolution, pass (b)**: once every file has been through pass (a),
//!    retries everything still unresolved in each file, then in the pending
//!    declarations, against the complete package scope, and reports
//!    whatever is left, all at once.
//! 3. **Methods** ([`methods`]): records methods under their receiver type.
//! 4. **Constants** ([`consts`]): folds constant expressions and array
//!    lengths.
//! 5. **Inference** ([`infer`]): types every expression, infers variables
//!    declared without a type and checks operands at their point of use.
//! 6. **Layout** ([`layout`]): sizes and field offsets.
//! 7. **Initialization order** ([`initorder`]) and **runtime type ids**
//!    ([`typeids`]).
//!
//! Everything lands in one [`Program`] shared by all packages.

pub mod consts;
pub mod errors;
pub mod infer;
pub mod initorder;
pub mod layout;
pub mod methods;
pub mod program;
pub mod resolve;
pub mod runtime;
pub mod scope;
pub mod typeids;
pub mod types;
pub mod universe;

use minigo_common::{DiagnosticResult, DiagnosticSink, Entity, FuncId, Span, Symbol, SymbolInterner};
use minigo_syntax::ast::File;
use tracing::{debug, info};

pub use errors::TypeError;
pub use methods::{MethodEntry, MethodRegistry};
pub use program::{
    BasicTypes, Builtin, ConstKind, ConstValue, Constant, FuncKind, Function, GlobalInit, Package,
    Program, VarKind, VarType, Variable,
};
pub use runtime::RuntimeFn;
pub use scope::Scope;
pub use typeids::TypeIds;
pub use types::{Field, Gtype, GtypeKind, MethodSig, Width};

/// Analyzes the files of one package and adds it to `program`.
///
/// Every package the files import must have been analyzed already. Returns
/// the index of the new package in [`Program::packages`].
#[tracing::instrument(skip_all, fields(package = path))]
pub fn analyze_package(
    program: &mut Program,
    interner: &SymbolInterner,
    name: Symbol,
    path: &str,
    mut files: Vec<File>,
) -> DiagnosticResult<usize> {
    let mut errors = DiagnosticSink::new();
    if program.package_index(name).is_some() {
        let span = files.first().map_or(Span::dummy(), |f| f.package.span);
        errors.emit(TypeError::Redeclared.at_with_message(
            span,
            format!("package {} analyzed twice", interner.name(name)),
        ));
        return Err(errors);
    }
    let scope = program.scopes.insert(Scope::new(Some(program.universe)));

    // Pass (a) over every file, then a retry of each file.
    let mut resolver = resolve::Resolver::new(program, interner, name, scope);
    for file in files.iter_mut() {
        resolver.resolve_file(file);
    }
    let (declared, resolve_errors) = resolver.finish();
    errors.extend(resolve_errors);
    for file in files.iter_mut() {
        resolve::retry_file(program, scope, file);
    }

    // Pass (b) over the whole package.
    resolve::retry_pending(program, scope, &declared.consts);
    resolve::report_unresolved(program, interner, &mut files, &declared.consts, &mut errors);
    if errors.has_errors() {
        return Err(errors);
    }
    debug!(
        globals = declared.globals.len(),
        funcs = declared.funcs.len(),
        "resolved"
    );

    let fatal = |d| DiagnosticSink::from(d);
    methods::attach_methods(program, interner, &declared.methods).map_err(fatal)?;
    consts::evaluate_package(program, interner, &declared.consts).map_err(fatal)?;
    infer::check_package(program, interner, &mut files).map_err(fatal)?;
    layout::layout_package(program, interner, &files, &declared.funcs).map_err(fatal)?;
    let init_order = initorder::order_globals(interner, &mut files).map_err(fatal)?;
    typeids::assign_type_ids(program, interner);

    let index = program.packages.len();
    program.packages.push(Package {
        name,
        path: path.to_owned(),
        scope,
        files,
        globals: declared.globals,
        consts: declared.consts,
        funcs: declared.funcs,
        init: declared.init,
        init_order,
    });
    program.package_index.insert(name, index);
    info!(package = path, types = program.type_ids.len(), "analyzed");
    Ok(index)
}

/// The `main` function of package `main`.
pub fn main_func(program: &Program, interner: &SymbolInterner) -> Option<FuncId> {
    let main = interner.get("main")?;
    let pkg = program.package_by_name(main)?;
    match program.scopes[pkg.scope].lookup_local(main) {
        Some(Entity::Func(f)) => Some(f),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;
    use minigo_syntax::parse_source;

    use super::*;

    #[test]
    fn test_packages_in_dependency_order() {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);

        let lib = parse_source(
            &mut ctx,
            "lib/lib.go",
            "package lib\n\
             type Point struct { X int; Y int }\n\
             func (p *Point) Sum() int { return p.X + p.Y }\n\
             func New(x int) *Point { return &Point{X: x, Y: x} }\n\
             var Origin Point\n",
        )
        .unwrap();
        let lib_name = ctx.interner.intern("lib");
        let lib_index = analyze_package(&mut program, &ctx.interner, lib_name, "lib", vec![lib]).unwrap();
        assert_eq!(lib_index, 0);

        let main = parse_source(
            &mut ctx,
            "main.go",
            "package main\n\
             import \"lib\"\n\
             var p = lib.New(3)\n\
             func main() { println(p.Sum(), lib.Origin.X) }\n",
        )
        .unwrap();
        let main_name = ctx.interner.intern("main");
        let main_index = analyze_package(&mut program, &ctx.interner, main_name, "main", vec![main]).unwrap();
        assert_eq!(main_index, 1);

        let p = program.packages[main_index].globals[0];
        let ty = program.vars[p].gtype().unwrap();
        assert_eq!(program.type_name(ty, &ctx.interner), "*lib.Point");
        assert!(main_func(&program, &ctx.interner).is_some());
    }

    #[test]
    fn test_package_spanning_two_files() {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let a = parse_source(&mut ctx, "a.go", "package main\nvar total = count * size\nfunc main() { println(total) }\n").unwrap();
        let b = parse_source(&mut ctx, "b.go", "package main\nconst size = 4\nvar count = len(names)\nvar names = []string{\"a\", \"b\"}\n").unwrap();
        let name = ctx.interner.intern("main");
        let index = analyze_package(&mut program, &ctx.interner, name, "main", vec![a, b]).unwrap();
        let package = &program.packages[index];
        assert_eq!(package.files.len(), 2);
        let first = package.init_order[0];
        assert_eq!((first.file, first.decl), (1, 2));
    }
}
