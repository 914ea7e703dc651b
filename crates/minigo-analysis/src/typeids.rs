//! Runtime type ids.
//!
//! Every distinct dynamic type gets a small integer that interface values
//! carry at run time. Types are keyed by canonical name, so the same type
//! written in two packages shares one id, while a type declared in a function
//! body is told apart by its ordinal. Ids start at 1; 0 is the type id of a
//! nil interface.

use indexmap::IndexMap;
use minigo_common::{ArenaKey, GtypeId, SymbolInterner};

use crate::program::Program;
use crate::types::GtypeKind;

#[derive(Debug, Default)]
pub struct TypeIds {
    /// Canonical name to the first type seen with that name.
    by_name: IndexMap<String, GtypeId>,
    /// Number of arena entries already scanned.
    scanned: usize,
}

impl TypeIds {
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn id_of_name(&self, name: &str) -> Option<u32> {
        self.by_name.get_index_of(name).map(|i| i as u32 + 1)
    }

    /// `(id, canonical name, type)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str, GtypeId)> {
        self.by_name
            .iter()
            .enumerate()
            .map(|(i, (name, &ty))| (i as u32 + 1, name.as_str(), ty))
    }
}

impl Program {
    /// Runtime id of a non-interface type.
    pub fn type_id(&self, ty: GtypeId, interner: &SymbolInterner) -> Option<u32> {
        self.type_ids.id_of_name(&self.type_name(ty, interner))
    }
}

/// Gives an id to every type created since the last call, in arena order.
pub(crate) fn assign_type_ids(program: &mut Program, interner: &SymbolInterner) {
    let start = program.type_ids.scanned;
    let total = program.gtypes.len();
    for index in start..total {
        let id = GtypeId::from_usize(index);
        if program.canon(id) != id {
            continue;
        }
        let skip = match &program.gtypes[id].kind {
            GtypeKind::Alias(_) | GtypeKind::Interface(_) => true,
            GtypeKind::Named { underlying, .. } => {
                underlying.is_none() || program.is_interface(id)
            }
            _ => false,
        };
        if skip {
            continue;
        }
        let name = program.type_name(id, interner);
        program.type_ids.by_name.entry(name).or_insert(id);
    }
    program.type_ids.scanned = total;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_deduplicated_by_name() {
        let mut interner = SymbolInterner::new();
        let mut program = Program::new(&mut interner);
        let int = program.types.int;
        let p1 = program.new_type(GtypeKind::Pointer(int));
        let p2 = program.new_type(GtypeKind::Pointer(int));
        assign_type_ids(&mut program, &interner);

        let id1 = program.type_id(p1, &interner).unwrap();
        let id2 = program.type_id(p2, &interner).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(program.type_id(int, &interner), Some(1));
        // error is an interface and gets no id.
        assert_eq!(program.type_id(program.types.error, &interner), None);
        let ids: Vec<_> = program.type_ids.iter().map(|(id, _, _)| id).collect();
        assert!(ids.iter().zip(ids.iter().skip(1)).all(|(a, b)| a < b));
        assert_eq!(ids.first(), Some(&1));
    }

    #[test]
    fn test_local_type_gets_its_own_id() {
        use minigo_common::CompilationContext;
        use minigo_syntax::parse_source;

        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let file = parse_source(
            &mut ctx,
            "main.go",
            "package main\n\
             type T struct { a int }\n\
             func main() {\n\
             type T int\n\
             var x T\n\
             var y interface{} = x\n\
             println(x, y != nil)\n\
             }\n",
        )
        .unwrap();
        let name = ctx.interner.intern("main");
        crate::analyze_package(&mut program, &ctx.interner, name, "main", vec![file]).unwrap();

        let t = ctx.interner.get("T").unwrap();
        let named: Vec<_> = program
            .gtypes
            .iter()
            .filter(|(_, g)| matches!(g.kind, GtypeKind::Named { name, .. } if name == t))
            .map(|(id, _)| id)
            .collect();
        assert_eq!(named.len(), 2);
        assert_eq!(program.type_name(named[0], &ctx.interner), "main.T");
        assert_eq!(program.type_name(named[1], &ctx.interner), "main.T.1");
        let ids: Vec<_> = named
            .iter()
            .map(|&ty| program.type_id(ty, &ctx.interner).unwrap())
            .collect();
        assert_ne!(ids[0], ids[1]);
    }
}
