//! Global initialization order.
//!
//! Globals are initialized in declaration order, except that a spec whose
//! initializer mentions another global of the same package runs after the
//! spec declaring that global.

use std::collections::HashMap;

use minigo_common::{Diagnostic, Entity, Span, SymbolInterner, VarId};
use minigo_syntax::ast::{File, Relation};
use minigo_syntax::visit::{walk_expr, VisitMut};

use crate::errors::TypeError;
use crate::infer::{global_spec_mut, global_specs};
use crate::program::GlobalInit;

#[derive(Default)]
struct GlobalRefs {
    vars: Vec<VarId>,
}

impl VisitMut for GlobalRefs {
    fn visit_relation(&mut self, rel: &mut Relation, _span: Span) {
        if let Some(Entity::Var(v)) = rel.entity() {
            if !self.vars.contains(&v) {
                self.vars.push(v);
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

struct Sorter {
    specs: Vec<GlobalInit>,
    deps: Vec<Vec<usize>>,
    /// First declared name and its span, per spec.
    names: Vec<(String, Span)>,
    marks: Vec<Mark>,
    order: Vec<GlobalInit>,
}

impl Sorter {
    fn visit(&mut self, index: usize) -> Result<(), Diagnostic> {
        match self.marks[index] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                let (name, span) = &self.names[index];
                return Err(TypeError::InitializationCycle.named_at(*span, name));
            }
            Mark::Unvisited => {}
        }
        self.marks[index] = Mark::Visiting;
        for dep in self.deps[index].clone() {
            self.visit(dep)?;
        }
        self.marks[index] = Mark::Done;
        self.order.push(self.specs[index]);
        Ok(())
    }
}

/// Orders the global `var` specs of a package for initialization.
pub(crate) fn order_globals(
    interner: &SymbolInterner,
    files: &mut [File],
) -> Result<Vec<GlobalInit>, Diagnostic> {
    let specs = global_specs(files);
    let mut owner: HashMap<VarId, usize> = HashMap::new();
    let mut refs = Vec::with_capacity(specs.len());
    let mut names = Vec::with_capacity(specs.len());
    for (index, &at) in specs.iter().enumerate() {
        let Some(spec) = global_spec_mut(files, at) else {
            refs.push(Vec::new());
            names.push((String::new(), Span::dummy()));
            continue;
        };
        for var in spec.vars.iter().flatten() {
            owner.insert(*var, index);
        }
        let mut collector = GlobalRefs::default();
        for value in &mut spec.values {
            walk_expr(&mut collector, value);
        }
        refs.push(collector.vars);
        names.push(match spec.names.first() {
            Some(n) => (interner.name(n.symbol).to_owned(), n.span),
            None => (String::new(), spec.span),
        });
    }
    let deps: Vec<Vec<usize>> = refs
        .iter()
        .enumerate()
        .map(|(index, vars)| {
            vars.iter()
                .filter_map(|v| owner.get(v).copied())
                .filter(|&dep| dep != index)
                .collect()
        })
        .collect();
    let count = specs.len();
    let mut sorter = Sorter {
        specs,
        deps,
        names,
        marks: vec![Mark::Unvisited; count],
        order: Vec::with_capacity(count),
    };
    for index in 0..count {
        sorter.visit(index)?;
    }
    Ok(sorter.order)
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;
    use minigo_syntax::parse_source;

    use crate::analyze_package;
    use crate::program::Program;

    fn init_names(src: &str) -> Result<Vec<String>, u16> {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let file = parse_source(&mut ctx, "a.go", src).unwrap();
        let name = ctx.interner.intern("main");
        let pkg = match analyze_package(&mut program, &ctx.interner, name, "main", vec![file]) {
            Ok(pkg) => pkg,
            Err(mut sink) => return Err(sink.take()[0].code.unwrap_or(0)),
        };
        let package = &program.packages[pkg];
        Ok(package
            .init_order
            .iter()
            .map(|at| match &package.files[at.file].decls[at.decl] {
                minigo_syntax::ast::Decl::Var(d) => {
                    ctx.interner.name(d.specs[at.spec].names[0].symbol).to_owned()
                }
                _ => String::new(),
            })
            .collect())
    }

    #[test]
    fn test_dependencies_first() {
        let order = init_names(
            "package main\n\
             var a = b + c\n\
             var b = c * 2\n\
             var c = 1\n\
             var d = 4\n\
             func main() {}\n",
        )
        .unwrap();
        assert_eq!(order, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_declaration_order_without_dependencies() {
        let order = init_names("package main\nvar x, y = 1, 2\nvar z int\nfunc main() {}\n").unwrap();
        assert_eq!(order, vec!["x", "z"]);
    }

    #[test]
    fn test_typed_cycle_is_an_error() {
        let src = "package main\nvar a int = b\nvar b int = a\nfunc main() {}\n";
        assert_eq!(init_names(src), Err(crate::errors::TypeError::InitializationCycle.code()));
    }
}
