//! Function builder - frame layout and control-flow state of the function
//! being generated.

use std::collections::HashMap;

use minigo_analysis::types::{align_to, WORD};
use minigo_common::{AsmLabel, GtypeId, VarId};
use minigo_syntax::ast::{Expr, LoopId};

/// Jump targets of an enclosing `for` or `switch`.
#[derive(Debug, Clone, Copy)]
pub struct LoopContext {
    pub id: LoopId,
    pub break_label: AsmLabel,
    /// `None` for a switch, which `continue` skips over.
    pub continue_label: Option<AsmLabel>,
}

/// A `defer` statement, run at the defer handler when its flag is set.
#[derive(Debug, Clone, Copy)]
pub struct DeferredCall<'a> {
    pub flag: i32,
    pub call: &'a Expr,
}

/// Frame offsets are negative, relative to the frame base. Every slot is
/// word aligned.
pub struct FuncBuilder<'a> {
    pub name: String,
    pub results: Vec<GtypeId>,
    pub defer_label: AsmLabel,

    locals: HashMap<VarId, i32>,
    frame: u32,
    loop_stack: Vec<LoopContext>,
    defer_flags: Vec<i32>,
    defers: Vec<(u32, DeferredCall<'a>)>,
}

impl<'a> FuncBuilder<'a> {
    pub fn new(name: &str, results: Vec<GtypeId>, defer_label: AsmLabel) -> Self {
        Self {
            name: name.to_string(),
            results,
            defer_label,
            locals: HashMap::new(),
            frame: 0,
            loop_stack: Vec::new(),
            defer_flags: Vec::new(),
            defers: Vec::new(),
        }
    }

    // === Frame ===

    fn alloc(&mut self, size: u32) -> i32 {
        self.frame += align_to(size.max(WORD), WORD);
        -(self.frame as i32)
    }

    pub fn define_local(&mut self, var: VarId, size: u32) -> i32 {
        let off = self.alloc(size);
        self.locals.insert(var, off);
        off
    }

    pub fn local(&self, var: VarId) -> Option<i32> {
        self.locals.get(&var).copied()
    }

    /// A scratch slot that lives until the function ends.
    pub fn alloc_temp(&mut self, size: u32) -> i32 {
        self.alloc(size)
    }

    /// Frame size to reserve, kept 16-byte aligned.
    pub fn frame_size(&self) -> u32 {
        align_to(self.frame, 16)
    }

    // === Loops ===

    pub fn push_loop(&mut self, ctx: LoopContext) {
        self.loop_stack.push(ctx);
    }

    pub fn pop_loop(&mut self) -> Option<LoopContext> {
        self.loop_stack.pop()
    }

    pub fn break_label(&self, id: LoopId) -> Option<AsmLabel> {
        self.loop_stack
            .iter()
            .rev()
            .find(|l| l.id == id)
            .map(|l| l.break_label)
    }

    pub fn continue_label(&self, id: LoopId) -> Option<AsmLabel> {
        self.loop_stack
            .iter()
            .rev()
            .find(|l| l.id == id)
            .and_then(|l| l.continue_label)
    }

    // === Defer ===

    /// Allocates one flag per `defer` statement of the function.
    pub fn alloc_defer_flags(&mut self, count: u32) -> Vec<i32> {
        self.defer_flags = (0..count).map(|_| self.alloc(WORD)).collect();
        self.defer_flags.clone()
    }

    pub fn defer_flag(&self, index: u32) -> Option<i32> {
        self.defer_flags.get(index as usize).copied()
    }

    pub fn add_defer(&mut self, index: u32, call: &'a Expr) -> Option<i32> {
        let flag = self.defer_flag(index)?;
        self.defers.push((index, DeferredCall { flag, call }));
        Some(flag)
    }

    /// Deferred calls, last statement first.
    pub fn defers_lifo(&self) -> Vec<DeferredCall<'a>> {
        let mut defers = self.defers.clone();
        defers.sort_by(|a, b| b.0.cmp(&a.0));
        defers.into_iter().map(|(_, d)| d).collect()
    }
}

#[cfg(test)]
mod tests {
    use minigo_common::{ArenaKey, Span};
    use minigo_syntax::ast::ExprKind;

    use super::*;

    #[test]
    fn test_frame_offsets_are_word_aligned() {
        let mut f = FuncBuilder::new("main.f", Vec::new(), AsmLabel(1));
        let a = f.define_local(VarId::from_usize(0), 1);
        let b = f.define_local(VarId::from_usize(1), 24);
        let c = f.alloc_temp(13);
        assert_eq!((a, b, c), (-8, -32, -48));
        assert_eq!(f.local(VarId::from_usize(1)), Some(-32));
        assert_eq!(f.frame_size(), 48);
        f.alloc_temp(8);
        assert_eq!(f.frame_size(), 64);
    }

    #[test]
    fn test_innermost_loop_wins() {
        let mut f = FuncBuilder::new("main.f", Vec::new(), AsmLabel(1));
        f.push_loop(LoopContext {
            id: LoopId(1),
            break_label: AsmLabel(10),
            continue_label: Some(AsmLabel(11)),
        });
        f.push_loop(LoopContext {
            id: LoopId(2),
            break_label: AsmLabel(20),
            continue_label: None,
        });
        assert_eq!(f.break_label(LoopId(2)), Some(AsmLabel(20)));
        assert_eq!(f.continue_label(LoopId(2)), None);
        assert_eq!(f.continue_label(LoopId(1)), Some(AsmLabel(11)));
        f.pop_loop();
        assert_eq!(f.break_label(LoopId(2)), None);
    }

    #[test]
    fn test_defers_run_last_first() {
        let first = Expr::new(ExprKind::IntLit(1), Span::dummy());
        let second = Expr::new(ExprKind::IntLit(2), Span::dummy());
        let mut f = FuncBuilder::new("main.f", Vec::new(), AsmLabel(1));
        let flags = f.alloc_defer_flags(2);
        assert_eq!(flags.len(), 2);
        f.add_defer(0, &first);
        f.add_defer(1, &second);
        let order: Vec<i32> = f.defers_lifo().iter().map(|d| d.flag).collect();
        assert_eq!(order, vec![flags[1], flags[0]]);
        assert!(f.add_defer(5, &first).is_none());
    }
}
