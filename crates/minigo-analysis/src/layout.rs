//! Sizes, field offsets and call frame limits.

use minigo_common::{ArenaKey, Diagnostic, FuncId, GtypeId, Span, SymbolInterner};
use minigo_syntax::ast::{Decl, File, StmtKind};
use tracing::debug;

use crate::errors::TypeError;
use crate::program::{FuncKind, Program};
use crate::types::{align_to, GtypeKind, Width, STRUCT_ALIGN, WIDE, WORD};

/// Most argument words a call may pass, receiver included.
pub const MAX_ARG_WORDS: u32 = 12;

/// Most result words a call may return.
pub const MAX_RESULT_WORDS: u32 = 6;

/// Lays out every type declared by the package, then every other type
/// created so far, then checks the signatures of `funcs`.
pub(crate) fn layout_package(
    program: &mut Program,
    interner: &SymbolInterner,
    files: &[File],
    funcs: &[FuncId],
) -> Result<(), Diagnostic> {
    let mut layout = Layout {
        program,
        interner,
        stack: Vec::new(),
    };
    for file in files {
        for decl in &file.decls {
            if let Decl::Type(t) = decl {
                if let Some(id) = t.id {
                    layout.size_of(id, t.span)?;
                }
            }
            if let Decl::Func(f) = decl {
                for stmt in f.body.iter().flat_map(|b| &b.stmts) {
                    if let StmtKind::Type(t) = &stmt.kind {
                        if let Some(id) = t.id {
                            layout.size_of(id, t.span)?;
                        }
                    }
                }
            }
        }
    }
    layout_all(layout.program, interner)?;
    for &func in funcs {
        check_signature(layout.program, interner, func)?;
    }
    Ok(())
}

/// Lays out any type that has no size yet.
pub(crate) fn layout_all(program: &mut Program, interner: &SymbolInterner) -> Result<(), Diagnostic> {
    let mut layout = Layout {
        program,
        interner,
        stack: Vec::new(),
    };
    let total = layout.program.gtypes.len();
    for index in 0..total {
        let id = GtypeId::from_usize(index);
        layout.size_of(id, Span::dummy())?;
    }
    debug!(types = total, "layout done");
    Ok(())
}

struct Layout<'a> {
    program: &'a mut Program,
    interner: &'a SymbolInterner,
    /// Types whose size is being computed.
    stack: Vec<GtypeId>,
}

impl Layout<'_> {
    fn size_of(&mut self, id: GtypeId, span: Span) -> Result<u32, Diagnostic> {
        let id = self.program.canon(id);
        if let Some(size) = self.program.gtypes[id].size {
            return Ok(size);
        }
        if self.stack.contains(&id) {
            let name = self.program.type_name(id, self.interner);
            return Err(TypeError::RecursiveType.named_at(span, &name));
        }
        self.stack.push(id);
        let size = match self.program.gtypes[id].kind.clone() {
            GtypeKind::Int | GtypeKind::Bool | GtypeKind::Pointer(_) | GtypeKind::Map { .. } => WORD,
            GtypeKind::Byte => 1,
            GtypeKind::String | GtypeKind::Slice(_) | GtypeKind::Interface(_) => WIDE,
            GtypeKind::Array { elem, len } => {
                let elem_size = self.size_of(elem, span)?;
                u32::try_from(len.unwrap_or(0))
                    .ok()
                    .and_then(|n| elem_size.checked_mul(n))
                    .ok_or_else(|| self.too_large(id, span))?
            }
            GtypeKind::Struct(mut fields) => {
                let mut offset: u32 = 0;
                for field in &mut fields {
                    let size = self.size_of(field.ty, span)?;
                    offset = align_to(offset, self.align_of(field.ty));
                    field.offset = Some(offset);
                    offset = offset
                        .checked_add(size)
                        .ok_or_else(|| self.too_large(id, span))?;
                }
                self.program.gtypes[id].kind = GtypeKind::Struct(fields);
                align_to(offset, STRUCT_ALIGN)
            }
            GtypeKind::Named {
                underlying: Some(u),
                ..
            } => self.size_of(u, span)?,
            GtypeKind::Named {
                underlying: None, ..
            }
            | GtypeKind::Alias(_) => 0,
        };
        self.stack.pop();
        self.program.gtypes[id].size = Some(size);
        Ok(size)
    }

    fn too_large(&self, id: GtypeId, span: Span) -> Diagnostic {
        let name = self.program.type_name(id, self.interner);
        TypeError::TypeTooLarge.named_at(span, &name)
    }

    fn align_of(&self, id: GtypeId) -> u32 {
        match self.program.kind(id) {
            GtypeKind::Byte => 1,
            GtypeKind::Array { elem, .. } => self.align_of(*elem),
            _ => WORD,
        }
    }
}

/// Number of words a value of `ty` takes as an argument.
pub fn arg_words(program: &Program, ty: GtypeId) -> u32 {
    program.width(ty).words()
}

fn check_signature(program: &Program, interner: &SymbolInterner, id: FuncId) -> Result<(), Diagnostic> {
    let func = &program.funcs[id];
    let receiver = match func.kind {
        FuncKind::Method { pointer: true, .. } => 1,
        FuncKind::Method { recv, .. } => arg_words(program, recv),
        _ => 0,
    };
    let args: u32 = receiver + func.params.iter().map(|&p| arg_words(program, p)).sum::<u32>();
    let name = interner.name(func.name);
    if args > MAX_ARG_WORDS {
        return Err(TypeError::TooManyArgWords.at_with_message(
            func.span,
            format!("{} takes {} argument words, at most {} are supported", name, args, MAX_ARG_WORDS),
        ));
    }
    if func.results.iter().any(|&r| program.width(r) == Width::Aggregate) {
        return Err(TypeError::NotYetImplemented.named_at(func.span, "struct and array results"));
    }
    let results: u32 = func.results.iter().map(|&r| arg_words(program, r)).sum();
    if results > MAX_RESULT_WORDS {
        return Err(TypeError::TooManyResultWords.at_with_message(
            func.span,
            format!("{} returns {} words, at most {} are supported", name, results, MAX_RESULT_WORDS),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;
    use minigo_syntax::parse_source;

    use super::*;
    use crate::analyze_package;

    fn analyze(src: &str) -> Result<(Program, CompilationContext), Vec<Diagnostic>> {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let file = parse_source(&mut ctx, "a.go", src).unwrap();
        let name = ctx.interner.intern("main");
        match analyze_package(&mut program, &ctx.interner, name, "main", vec![file]) {
            Ok(_) => Ok((program, ctx)),
            Err(mut sink) => Err(sink.take()),
        }
    }

    fn named(program: &Program, ctx: &CompilationContext, name: &str) -> GtypeId {
        let sym = ctx.interner.get(name).unwrap();
        let pkg = &program.packages[0];
        match program.lookup(pkg.scope, sym) {
            Some(minigo_common::Entity::Type(t)) => t,
            other => panic!("{} is {:?}", name, other),
        }
    }

    fn offsets(program: &Program, ty: GtypeId) -> Vec<u32> {
        match program.kind(ty) {
            GtypeKind::Struct(fields) => fields.iter().map(|f| f.offset.unwrap()).collect(),
            _ => panic!("not a struct"),
        }
    }

    #[test]
    fn test_struct_layout() {
        let (program, ctx) = analyze(
            "package main\n\
             type A struct { b byte; n int; c byte; s string }\n\
             type B struct { x byte; y byte; arr [3]byte; p *B }\n\
             type C struct { a A; tail [2]int }\n\
             func main() {}\n",
        )
        .unwrap();
        let a = named(&program, &ctx, "A");
        assert_eq!(offsets(&program, a), vec![0, 8, 16, 24]);
        assert_eq!(program.size(a), 48);

        let b = named(&program, &ctx, "B");
        assert_eq!(offsets(&program, b), vec![0, 1, 2, 8]);
        assert_eq!(program.size(b), 16);

        let c = named(&program, &ctx, "C");
        assert_eq!(offsets(&program, c), vec![0, 48]);
        assert_eq!(program.size(c), 64);
    }

    #[test]
    fn test_scalar_sizes() {
        let mut interner = SymbolInterner::new();
        let mut program = Program::new(&mut interner);
        layout_all(&mut program, &interner).unwrap();
        let t = program.types;
        assert_eq!(program.size(t.int), 8);
        assert_eq!(program.size(t.byte), 1);
        assert_eq!(program.size(t.bool), 8);
        assert_eq!(program.size(t.string), 24);
        assert_eq!(program.size(t.error), 24);
    }

    #[test]
    fn test_recursive_struct_is_an_error() {
        let diags = analyze("package main\ntype T struct { next T }\nfunc main() {}\n").unwrap_err();
        assert_eq!(diags[0].code, Some(TypeError::RecursiveType.code()));
        let diags =
            analyze("package main\ntype T struct { a [2]U }\ntype U struct { t T }\nfunc main() {}\n")
                .unwrap_err();
        assert_eq!(diags[0].code, Some(TypeError::RecursiveType.code()));
    }

    #[test]
    fn test_oversized_array_is_an_error() {
        let diags = analyze("package main\nvar big [1099511627776]int\nfunc main() {}\n").unwrap_err();
        assert_eq!(diags[0].code, Some(TypeError::TypeTooLarge.code()));
        let diags =
            analyze("package main\ntype T struct { a [268435456]int; b [268435456]int }\nfunc main() {}\n")
                .unwrap_err();
        assert_eq!(diags[0].code, Some(TypeError::TypeTooLarge.code()));
    }

    #[test]
    fn test_argument_word_limit() {
        let ok = "package main\nfunc f(a, b, c, d string) {}\nfunc main() {}\n";
        assert!(analyze(ok).is_ok());
        let too_many = "package main\nfunc f(a, b, c, d string, e int) {}\nfunc main() {}\n";
        let diags = analyze(too_many).unwrap_err();
        assert_eq!(diags[0].code, Some(TypeError::TooManyArgWords.code()));
        let results = "package main\nfunc f() (string, string, int) { return \"\", \"\", 0 }\nfunc main() {}\n";
        let diags = analyze(results).unwrap_err();
        assert_eq!(diags[0].code, Some(TypeError::TooManyResultWords.code()));
    }
}
