//! Method registry.
//!
//! Methods are not declared in any scope. Each one is recorded under its
//! receiver's named type, with one level of pointer stripped, once every
//! type name of the package has been resolved.

use std::collections::HashMap;

use indexmap::IndexMap;
use minigo_common::{Diagnostic, FuncId, GtypeId, Span, Symbol, SymbolInterner};

use crate::errors::TypeError;
use crate::program::{FuncKind, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodEntry {
    pub func: FuncId,
    pub pointer_receiver: bool,
}

/// Named type to its methods, in declaration order.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<GtypeId, IndexMap<Symbol, MethodEntry>>,
}

impl MethodRegistry {
    pub fn lookup(&self, named: GtypeId, name: Symbol) -> Option<MethodEntry> {
        self.methods.get(&named)?.get(&name).copied()
    }

    /// Methods of `named` in declaration order.
    pub fn methods_of(&self, named: GtypeId) -> impl Iterator<Item = (Symbol, MethodEntry)> + '_ {
        self.methods
            .get(&named)
            .into_iter()
            .flat_map(|m| m.iter().map(|(&name, &entry)| (name, entry)))
    }

    pub fn has_methods(&self, named: GtypeId) -> bool {
        self.methods.get(&named).is_some_and(|m| !m.is_empty())
    }

    fn insert(&mut self, named: GtypeId, name: Symbol, entry: MethodEntry) -> bool {
        let table = self.methods.entry(named).or_default();
        if table.contains_key(&name) {
            return false;
        }
        table.insert(name, entry);
        true
    }
}

/// A method waiting for its receiver type to be resolved.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingMethod {
    pub func: FuncId,
    /// Receiver type as written, possibly `*T`.
    pub receiver: GtypeId,
    pub span: Span,
}

/// Records every method of a package under its receiver type.
pub(crate) fn attach_methods(
    program: &mut Program,
    interner: &SymbolInterner,
    pending: &[PendingMethod],
) -> Result<(), Diagnostic> {
    for m in pending {
        let Some((named, pointer)) = program.named_receiver(m.receiver) else {
            let name = program.type_name(m.receiver, interner);
            return Err(TypeError::UndefinedReceiverType.named_at(m.span, &name));
        };
        if program.is_interface(named) || program.is_pointer(named) {
            let name = program.type_name(named, interner);
            return Err(TypeError::InvalidOperation
                .at_with_message(m.span, format!("invalid receiver type {}", name)));
        }
        let func = &mut program.funcs[m.func];
        func.kind = FuncKind::Method {
            recv: named,
            pointer,
        };
        let name = func.name;
        let entry = MethodEntry {
            func: m.func,
            pointer_receiver: pointer,
        };
        if !program.methods.insert(named, name, entry) {
            let full = format!(
                "{}.{}",
                program.type_name(named, interner),
                interner.name(name)
            );
            return Err(TypeError::DuplicateMethod.named_at(m.span, &full));
        }
        if program.field(named, name).is_some() {
            return Err(TypeError::DuplicateMethod.at_with_message(
                m.span,
                format!("field and method with the same name {}", interner.name(name)),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keeps_declaration_order() {
        let mut interner = SymbolInterner::new();
        let b = interner.intern("b");
        let a = interner.intern("a");
        let mut reg = MethodRegistry::default();
        let t = GtypeId::new(7);
        assert!(reg.insert(t, b, MethodEntry { func: FuncId::new(1), pointer_receiver: true }));
        assert!(reg.insert(t, a, MethodEntry { func: FuncId::new(2), pointer_receiver: false }));
        assert!(!reg.insert(t, a, MethodEntry { func: FuncId::new(3), pointer_receiver: false }));
        let names: Vec<_> = reg.methods_of(t).map(|(n, _)| n).collect();
        assert_eq!(names, vec![b, a]);
        assert_eq!(reg.lookup(t, a).map(|e| e.func), Some(FuncId::new(2)));
        assert!(!reg.has_methods(GtypeId::new(8)));
    }
}
