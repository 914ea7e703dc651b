//! Compilation-wide state threaded through every phase.

use crate::source::SourceMap;
use crate::symbol::SymbolInterner;

/// A numbered assembler label, printed as `.L<n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AsmLabel(pub u32);

impl std::fmt::Display for AsmLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".L{}", self.0)
    }
}

/// Owns the source map, the interner and the label sequence for one
/// compilation. Labels are unique across all packages and all phases.
#[derive(Debug, Default)]
pub struct CompilationContext {
    pub source_map: SourceMap,
    pub interner: SymbolInterner,
    next_label: u32,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh label.
    pub fn new_label(&mut self) -> AsmLabel {
        self.next_label += 1;
        AsmLabel(self.next_label)
    }

    /// Number of labels handed out so far.
    pub fn label_count(&self) -> u32 {
        self.next_label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique_and_increasing() {
        let mut ctx = CompilationContext::new();
        let a = ctx.new_label();
        let b = ctx.new_label();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), ".L1");
        assert_eq!(b.to_string(), ".L2");
        assert_eq!(ctx.label_count(), 2);
    }
}
