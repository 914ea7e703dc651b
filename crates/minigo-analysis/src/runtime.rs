//! Runtime primitives called by generated code.
//!
//! The implementations live in the `iruntime` package. The compiler only
//! knows their symbol and how many words they take and return.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFn {
    Malloc,
    Memcopy,
    Strcat,
    Strcmp,
    Append1,
    Append8,
    Append24,
    AppendSlice,
    Panic,
    PrintString,
    PrintInt,
}

/// Package the primitives are compiled from.
pub const RUNTIME_PACKAGE: &str = "iruntime";

impl RuntimeFn {
    pub const ALL: [RuntimeFn; 11] = [
        RuntimeFn::Malloc,
        RuntimeFn::Memcopy,
        RuntimeFn::Strcat,
        RuntimeFn::Strcmp,
        RuntimeFn::Append1,
        RuntimeFn::Append8,
        RuntimeFn::Append24,
        RuntimeFn::AppendSlice,
        RuntimeFn::Panic,
        RuntimeFn::PrintString,
        RuntimeFn::PrintInt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuntimeFn::Malloc => "malloc",
            RuntimeFn::Memcopy => "memcopy",
            RuntimeFn::Strcat => "strcat",
            RuntimeFn::Strcmp => "strcmp",
            RuntimeFn::Append1 => "append1",
            RuntimeFn::Append8 => "append8",
            RuntimeFn::Append24 => "append24",
            RuntimeFn::AppendSlice => "appendSlice",
            RuntimeFn::Panic => "panic",
            RuntimeFn::PrintString => "printstring",
            RuntimeFn::PrintInt => "printint",
        }
    }

    /// Assembler symbol, `iruntime.<name>`.
    pub fn symbol(self) -> String {
        format!("{}.{}", RUNTIME_PACKAGE, self.name())
    }

    /// `(argument words, result words)`.
    pub fn words(self) -> (u32, u32) {
        match self {
            RuntimeFn::Malloc => (1, 1),
            RuntimeFn::Memcopy => (3, 0),
            RuntimeFn::Strcat => (6, 3),
            RuntimeFn::Strcmp => (6, 1),
            RuntimeFn::Append1 | RuntimeFn::Append8 => (4, 3),
            RuntimeFn::Append24 => (6, 3),
            RuntimeFn::AppendSlice => (7, 3),
            RuntimeFn::Panic | RuntimeFn::PrintString => (3, 0),
            RuntimeFn::PrintInt => (1, 0),
        }
    }

    /// The `append` primitive for elements of `size` bytes.
    pub fn append_for(size: u32) -> Option<RuntimeFn> {
        match size {
            1 => Some(RuntimeFn::Append1),
            8 => Some(RuntimeFn::Append8),
            24 => Some(RuntimeFn::Append24),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_and_words() {
        assert_eq!(RuntimeFn::AppendSlice.symbol(), "iruntime.appendSlice");
        assert_eq!(RuntimeFn::Strcat.words(), (6, 3));
        assert_eq!(RuntimeFn::append_for(24), Some(RuntimeFn::Append24));
        assert_eq!(RuntimeFn::append_for(16), None);
        assert!(RuntimeFn::ALL.iter().all(|f| f.words().0 <= crate::layout::MAX_ARG_WORDS));
    }
}
