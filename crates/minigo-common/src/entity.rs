//! Handles to semantic entities.
//!
//! The parser records references to names as relations; once a relation is
//! resolved it points at one of these entities. The arenas that own them
//! live in the analysis crate.

use crate::define_key;

define_key! {
    /// A global or local variable (parameters included).
    pub struct VarId;
    /// A named constant, including the predeclared `true`, `false`, `iota`, `nil`.
    pub struct ConstId;
    /// A user function, method, builtin or extern.
    pub struct FuncId;
    /// A type in the program-wide type table.
    pub struct GtypeId;
    /// A long-lived scope (universe and package scopes).
    pub struct ScopeId;
}

/// What a resolved name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    Var(VarId),
    Const(ConstId),
    Type(GtypeId),
    Func(FuncId),
}

impl Entity {
    pub fn kind_name(self) -> &'static str {
        match self {
            Entity::Var(_) => "variable",
            Entity::Const(_) => "constant",
            Entity::Type(_) => "type",
            Entity::Func(_) => "function",
        }
    }

    pub fn as_var(self) -> Option<VarId> {
        match self {
            Entity::Var(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_type(self) -> Option<GtypeId> {
        match self {
            Entity::Type(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_func(self) -> Option<FuncId> {
        match self {
            Entity::Func(id) => Some(id),
            _ => None,
        }
    }
}
