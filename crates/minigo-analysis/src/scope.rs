//! Lexical scopes.
//!
//! ```text
//! Universe scope (predeclared types, constants, builtins)
//!     └── Package scope (shared by every file of the package)
//!             └── Block scopes (function body, if/for/switch, case clauses)
//! ```
//!
//! The universe and package scopes live in the program's scope arena. Block
//! scopes are short-lived and kept on a stack by the resolver.

use std::collections::HashMap;

use minigo_common::{ConstId, Entity, FuncId, GtypeId, ScopeId, Symbol, VarId};

/// A scope with separate tables for each kind of name.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    vars: HashMap<Symbol, VarId>,
    consts: HashMap<Symbol, ConstId>,
    types: HashMap<Symbol, GtypeId>,
    funcs: HashMap<Symbol, FuncId>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            ..Default::default()
        }
    }

    /// Looks a name up in this scope only.
    pub fn lookup_local(&self, name: Symbol) -> Option<Entity> {
        if let Some(&v) = self.vars.get(&name) {
            return Some(Entity::Var(v));
        }
        if let Some(&c) = self.consts.get(&name) {
            return Some(Entity::Const(c));
        }
        if let Some(&t) = self.types.get(&name) {
            return Some(Entity::Type(t));
        }
        self.funcs.get(&name).map(|&f| Entity::Func(f))
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.lookup_local(name).is_some()
    }

    /// Declares `name`. Returns the existing entity if the name is already
    /// declared in this scope.
    pub fn declare(&mut self, name: Symbol, entity: Entity) -> Result<(), Entity> {
        if let Some(existing) = self.lookup_local(name) {
            return Err(existing);
        }
        match entity {
            Entity::Var(v) => {
                self.vars.insert(name, v);
            }
            Entity::Const(c) => {
                self.consts.insert(name, c);
            }
            Entity::Type(t) => {
                self.types.insert(name, t);
            }
            Entity::Func(f) => {
                self.funcs.insert(name, f);
            }
        }
        Ok(())
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn funcs(&self) -> impl Iterator<Item = (Symbol, FuncId)> + '_ {
        self.funcs.iter().map(|(&s, &f)| (s, f))
    }

    pub fn types(&self) -> impl Iterator<Item = (Symbol, GtypeId)> + '_ {
        self.types.iter().map(|(&s, &t)| (s, t))
    }
}

#[cfg(test)]
mod tests {
    use minigo_common::SymbolInterner;

    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut interner = SymbolInterner::new();
        let x = interner.intern("x");
        let t = interner.intern("T");
        let mut scope = Scope::new(None);
        scope.declare(x, Entity::Var(VarId::new(0))).unwrap();
        scope.declare(t, Entity::Type(GtypeId::new(3))).unwrap();
        assert_eq!(scope.lookup_local(x), Some(Entity::Var(VarId::new(0))));
        assert_eq!(scope.lookup_local(t), Some(Entity::Type(GtypeId::new(3))));
        assert_eq!(scope.var_count(), 1);
    }

    #[test]
    fn test_redeclaration_across_tables() {
        let mut interner = SymbolInterner::new();
        let x = interner.intern("x");
        let mut scope = Scope::new(None);
        scope.declare(x, Entity::Const(ConstId::new(1))).unwrap();
        let err = scope.declare(x, Entity::Func(FuncId::new(2))).unwrap_err();
        assert_eq!(err, Entity::Const(ConstId::new(1)));
    }
}
