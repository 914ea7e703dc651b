//! Common types shared by every phase of the minigo compiler.
//!
//! - [`span`]: byte positions and spans in the global position space
//! - [`source`]: source files and the source map
//! - [`symbol`]: interned identifiers
//! - [`arena`]: typed append-only arenas
//! - [`entity`]: handles for resolved names
//! - [`diagnostics`]: error reporting
//! - [`context`]: per-compilation state (source map, interner, labels)

pub mod arena;
pub mod context;
pub mod diagnostics;
pub mod entity;
pub mod source;
pub mod span;
pub mod symbol;

pub use arena::{Arena, ArenaKey};
pub use context::{AsmLabel, CompilationContext};
pub use diagnostics::{
    Diagnostic, DiagnosticEmitter, DiagnosticResult, DiagnosticSink, Label, Severity,
};
pub use entity::{ConstId, Entity, FuncId, GtypeId, ScopeId, VarId};
pub use source::{FileId, LineCol, SourceFile, SourceMap};
pub use span::{BytePos, Span, Spanned};
pub use symbol::{Ident, Symbol, SymbolInterner};
