//! Symbol interning for identifiers.

use std::fmt;

use string_interner::{backend::StringBackend, DefaultSymbol, StringInterner};

use crate::span::Span;

/// An interned string. Cheap to copy and compare.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Option<DefaultSymbol>);

impl Symbol {
    /// Placeholder for values that are filled in later.
    pub const DUMMY: Symbol = Symbol(None);

    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        use string_interner::Symbol as _;
        self.0.map(|s| s.to_usize() as u32).unwrap_or(u32::MAX)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            write!(f, "Symbol(DUMMY)")
        } else {
            write!(f, "Symbol({})", self.as_u32())
        }
    }
}

/// Central registry of interned strings.
#[derive(Clone)]
pub struct SymbolInterner {
    interner: StringInterner<StringBackend<DefaultSymbol>>,
}

impl SymbolInterner {
    pub fn new() -> Self {
        Self {
            interner: StringInterner::new(),
        }
    }

    #[inline]
    pub fn intern(&mut self, string: &str) -> Symbol {
        Symbol(Some(self.interner.get_or_intern(string)))
    }

    #[inline]
    pub fn intern_static(&mut self, string: &'static str) -> Symbol {
        Symbol(Some(self.interner.get_or_intern_static(string)))
    }

    /// Looks up a string without interning it.
    #[inline]
    pub fn get(&self, string: &str) -> Option<Symbol> {
        self.interner.get(string).map(|s| Symbol(Some(s)))
    }

    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        symbol.0.and_then(|s| self.interner.resolve(s))
    }

    /// Like `resolve`, but yields `"?"` for dummy or foreign symbols.
    /// Meant for messages and dumps.
    #[inline]
    pub fn name(&self, symbol: Symbol) -> &str {
        self.resolve(symbol).unwrap_or("?")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.interner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interner.is_empty()
    }
}

impl Default for SymbolInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolInterner")
            .field("len", &self.interner.len())
            .finish()
    }
}

/// An identifier with its source span.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Ident {
    pub symbol: Symbol,
    pub span: Span,
}

impl Ident {
    #[inline]
    pub const fn new(symbol: Symbol, span: Span) -> Self {
        Self { symbol, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let mut interner = SymbolInterner::new();
        let a = interner.intern("main");
        let b = interner.intern("main");
        let c = interner.intern("fmt");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_resolve_and_get() {
        let mut interner = SymbolInterner::new();
        let sym = interner.intern_static("println");
        assert_eq!(interner.resolve(sym), Some("println"));
        assert_eq!(interner.get("println"), Some(sym));
        assert_eq!(interner.get("missing"), None);
    }

    #[test]
    fn test_dummy_symbol() {
        let interner = SymbolInterner::new();
        assert!(Symbol::DUMMY.is_dummy());
        assert_eq!(interner.resolve(Symbol::DUMMY), None);
        assert_eq!(interner.name(Symbol::DUMMY), "?");
    }
}
