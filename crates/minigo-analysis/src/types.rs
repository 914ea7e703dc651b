//! Type descriptors.
//!
//! Every type in a program is a [`Gtype`] in one arena and is referred to by
//! [`GtypeId`]. Named types carry their package and underlying type; a type
//! name that was not declared yet when it was first mentioned becomes an
//! [`GtypeKind::Alias`] holding the pending relation, and every lookup goes
//! through [`crate::Program::canon`] to see through it.
//!
//! Sizes and struct offsets are `None` until layout has run.

use minigo_common::{GtypeId, Symbol};
use minigo_syntax::ast::Relation;

/// Size of a machine word.
pub const WORD: u32 = 8;

/// Size of strings, slices and interfaces.
pub const WIDE: u32 = 24;

/// Struct sizes are rounded up to this.
pub const STRUCT_ALIGN: u32 = 16;

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Symbol,
    pub ty: GtypeId,
    pub offset: Option<u32>,
}

/// A method signature in an interface.
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub name: Symbol,
    pub params: Vec<GtypeId>,
    pub results: Vec<GtypeId>,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub enum GtypeKind {
    Int,
    Byte,
    Bool,
    String,
    Pointer(GtypeId),
    /// `len` is `None` until its constant expression has been evaluated.
    Array {
        elem: GtypeId,
        len: Option<i64>,
    },
    Slice(GtypeId),
    Map {
        key: GtypeId,
        value: GtypeId,
    },
    Struct(Vec<Field>),
    Interface(Vec<MethodSig>),
    /// A declared type. `underlying` is filled once the declaration's type
    /// expression has been resolved.
    Named {
        name: Symbol,
        pkg: Symbol,
        underlying: Option<GtypeId>,
        /// Ordinal of a type declared inside a function body.
        local: Option<u32>,
    },
    /// A type name waiting for resolution.
    Alias(Relation),
}

#[derive(Debug, Clone)]
pub struct Gtype {
    pub kind: GtypeKind,
    pub size: Option<u32>,
}

impl Gtype {
    pub fn new(kind: GtypeKind) -> Self {
        Self { kind, size: None }
    }

    pub fn is_named(&self) -> bool {
        matches!(self.kind, GtypeKind::Named { .. })
    }
}

/// How many bytes a value of a type occupies in registers and on the stack.
///
/// Byte and narrow values live in `%rax`; wide values occupy `%rax`, `%rbx`
/// and `%rcx`; aggregates are handled through their address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Narrow,
    Wide,
    Aggregate,
}

impl Width {
    /// Number of 8-byte words the value takes when pushed or passed.
    pub fn words(self) -> u32 {
        match self {
            Width::Wide => 3,
            _ => 1,
        }
    }

    /// Suffix used by the sized load/store instructions.
    pub fn suffix(self) -> u32 {
        match self {
            Width::Byte => 1,
            Width::Wide => 24,
            Width::Narrow | Width::Aggregate => 8,
        }
    }
}

/// Rounds `n` up to a multiple of `align`.
#[inline]
pub fn align_to(n: u32, align: u32) -> u32 {
    if align <= 1 {
        n
    } else {
        n.div_ceil(align) * align
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 8), 0);
        assert_eq!(align_to(1, 8), 8);
        assert_eq!(align_to(8, 8), 8);
        assert_eq!(align_to(17, 16), 32);
        assert_eq!(align_to(5, 1), 5);
    }

    #[test]
    fn test_width_words() {
        assert_eq!(Width::Wide.words(), 3);
        assert_eq!(Width::Narrow.words(), 1);
        assert_eq!(Width::Byte.suffix(), 1);
        assert_eq!(Width::Aggregate.suffix(), 8);
    }
}
