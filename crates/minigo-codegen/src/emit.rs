//! Text emission for the pseudo-assembly.

use std::fmt::Display;

use minigo_analysis::Width;

/// One move of a size-exact copy: `bytes` at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u32,
    pub bytes: u32,
}

impl Chunk {
    fn mnemonic(self) -> &'static str {
        match self.bytes {
            8 => "movq",
            4 => "movl",
            2 => "movw",
            _ => "movb",
        }
    }

    fn scratch(self) -> &'static str {
        match self.bytes {
            8 => "%rdx",
            4 => "%edx",
            2 => "%dx",
            _ => "%dl",
        }
    }
}

/// Splits `size` bytes into the largest moves that fit, in address order.
pub fn copy_plan(size: u32) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    for bytes in [8, 4, 2, 1] {
        while size - offset >= bytes {
            chunks.push(Chunk { offset, bytes });
            offset += bytes;
        }
    }
    chunks
}

/// Collects output lines. Instructions and comments are indented two
/// spaces per nesting level, one level at the top of a function, and may
/// carry a `/*file:line:col*/` prefix naming the statement they came from.
#[derive(Debug, Default)]
pub struct Emitter {
    lines: Vec<String>,
    emit_position: bool,
    position: Option<String>,
    depth: usize,
}

impl Emitter {
    pub fn new(emit_position: bool) -> Self {
        Self {
            lines: Vec::new(),
            emit_position,
            position: None,
            depth: 0,
        }
    }

    /// Nests the following instructions one level deeper.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn margin(&self) -> String {
        "  ".repeat(self.depth + 1)
    }

    pub fn set_position(&mut self, position: impl FnOnce() -> String) {
        if self.emit_position {
            self.position = Some(position());
        }
    }

    pub fn emit(&mut self, line: impl Display) {
        let margin = self.margin();
        match &self.position {
            Some(pos) => self.lines.push(format!("{}/*{}*/ {}", margin, pos, line)),
            None => self.lines.push(format!("{}{}", margin, line)),
        }
    }

    pub fn label(&mut self, label: impl Display) {
        self.lines.push(format!("{}:", label));
    }

    pub fn directive(&mut self, text: impl Display) {
        self.lines.push(format!("  {}", text));
    }

    pub fn comment(&mut self, text: impl Display) {
        let margin = self.margin();
        self.lines.push(format!("{}# {}", margin, text));
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Index of the next line.
    pub fn pos(&self) -> usize {
        self.lines.len()
    }

    /// Overwrites an instruction emitted earlier.
    pub fn patch(&mut self, index: usize, line: impl Display) {
        if let Some(slot) = self.lines.get_mut(index) {
            *slot = format!("  {}", line);
        }
    }

    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    // === Sized instructions ===

    pub fn load_number(&mut self, n: i64) {
        self.emit(format_args!("LOAD_NUMBER {}", n));
    }

    pub fn load_empty(&mut self, w: Width) {
        match w {
            Width::Wide => self.emit("LOAD_EMPTY_24"),
            _ => self.emit("LOAD_EMPTY_8"),
        }
    }

    pub fn push(&mut self, w: Width) {
        match w {
            Width::Wide => self.emit("PUSH_24"),
            _ => self.emit("PUSH_8"),
        }
    }

    pub fn pop(&mut self, w: Width) {
        match w {
            Width::Wide => self.emit("POP_24"),
            _ => self.emit("POP_8"),
        }
    }

    pub fn load_local(&mut self, w: Width, off: i32) {
        self.emit(format_args!("LOAD_{}_FROM_LOCAL {}", w.suffix(), off));
    }

    pub fn store_local(&mut self, w: Width, off: i32) {
        self.emit(format_args!("STORE_{}_TO_LOCAL {}", w.suffix(), off));
    }

    pub fn load_local_addr(&mut self, off: i32) {
        self.emit(format_args!("LOAD_LOCAL_ADDR {}", off));
    }

    pub fn load_global(&mut self, w: Width, sym: &str, off: u32) {
        self.emit(format_args!("LOAD_{}_FROM_GLOBAL {} {}", w.suffix(), sym, off));
    }

    pub fn store_global(&mut self, w: Width, sym: &str, off: u32) {
        self.emit(format_args!("STORE_{}_TO_GLOBAL {} {}", w.suffix(), sym, off));
    }

    pub fn load_global_addr(&mut self, sym: &str, off: u32) {
        self.emit(format_args!("LOAD_GLOBAL_ADDR {} {}", sym, off));
    }

    pub fn load_deref(&mut self, w: Width) {
        self.emit(format_args!("LOAD_{}_BY_DEREF", w.suffix()));
    }

    /// Pops the address, then the value.
    pub fn store_indirect(&mut self, w: Width) {
        self.emit(format_args!("STORE_{}_INDIRECT_FROM_STACK", w.suffix()));
    }

    /// Pushes the value in registers beneath the word on top of the stack.
    pub fn push_under(&mut self, w: Width) {
        self.emit("popq %rdx");
        self.push(w);
        self.emit("pushq %rdx");
    }

    pub fn add_number(&mut self, n: i64) {
        if n != 0 {
            self.emit(format_args!("ADD_NUMBER {}", n));
        }
    }

    pub fn funcall(&mut self, sym: &str) {
        self.emit(format_args!("FUNCALL {}", sym));
    }

    pub fn jump(&mut self, op: &str, label: impl Display) {
        self.emit(format_args!("{} {}", op, label));
    }

    /// Copies `size` bytes. The stack holds the source address with the
    /// destination address above it; both are popped.
    pub fn copy_from_stack(&mut self, size: u32) {
        self.emit("popq %rdi");
        self.emit("popq %rsi");
        for chunk in copy_plan(size) {
            let (mov, reg) = (chunk.mnemonic(), chunk.scratch());
            self.emit(format_args!("{} {}(%rsi), {}", mov, chunk.offset, reg));
            self.emit(format_args!("{} {}, {}(%rdi)", mov, reg, chunk.offset));
        }
    }

    /// Clears `size` bytes at the address in `%rax`.
    pub fn zero_at_rax(&mut self, size: u32) {
        for chunk in copy_plan(size) {
            self.emit(format_args!("{} $0, {}(%rax)", chunk.mnemonic(), chunk.offset));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_plan_uses_largest_moves() {
        let plan: Vec<_> = copy_plan(15).iter().map(|c| (c.offset, c.bytes)).collect();
        assert_eq!(plan, vec![(0, 8), (8, 4), (12, 2), (14, 1)]);
        assert_eq!(copy_plan(16).len(), 2);
        assert!(copy_plan(0).is_empty());
    }

    #[test]
    fn test_copy_moves_every_byte_once() {
        let mut e = Emitter::new(false);
        e.copy_from_stack(11);
        let out = e.finish();
        assert!(out.contains("movq 0(%rsi), %rdx"));
        assert!(out.contains("movw %dx, 8(%rdi)"));
        assert!(out.contains("movb 10(%rsi), %dl"));
        assert!(!out.contains("movl"));
    }

    #[test]
    fn test_position_prefix() {
        let mut e = Emitter::new(true);
        e.set_position(|| "a.go:3:5".to_owned());
        e.load_number(7);
        e.label(".L1");
        let out = e.finish();
        assert_eq!(out, "  /*a.go:3:5*/ LOAD_NUMBER 7\n.L1:\n");

        let mut plain = Emitter::new(false);
        plain.set_position(|| unreachable!());
        plain.push(Width::Wide);
        assert_eq!(plain.finish(), "  PUSH_24\n");
    }

    #[test]
    fn test_nesting_indents_instructions() {
        let mut e = Emitter::new(false);
        e.comment("if");
        e.emit("TEST_IT");
        e.indent();
        e.comment("assign");
        e.load_number(1);
        e.indent();
        e.emit("PUSH_8");
        e.dedent();
        e.dedent();
        e.label(".L2");
        e.directive(".quad 0");
        e.dedent();
        e.emit("POP_8");
        assert_eq!(
            e.finish(),
            "  # if\n  TEST_IT\n    # assign\n    LOAD_NUMBER 1\n      PUSH_8\n.L2:\n  .quad 0\n  POP_8\n"
        );
    }
}
