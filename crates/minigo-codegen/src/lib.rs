//! Pseudo-assembly generation for minigo.
//!
//! This crate lowers an analyzed [`Program`] to stack-oriented
//! pseudo-assembly text for a separate assembler stage.
//!
//! # Architecture
//!
//! ```text
//! minigo-analysis::Program (typed AST of every package)
//!                          │
//!                          ▼
//!                  ┌────────────────┐
//!                  │ CodegenContext │  expr / stmt / assign / call
//!                  └────────────────┘  map / iface lowering
//!                          │
//!                          ▼
//!          data section + text (String, one line per item)
//! ```
//!
//! # Value widths
//!
//! Every value is handled by its [`Width`](minigo_analysis::Width): byte
//! and narrow values travel in `%rax`, wide values (strings, slices,
//! interfaces) in `%rax %rbx %rcx`, and structs and arrays by address.
//!
//! # Output order
//!
//! 1. String literals, type descriptors, method tables, method names and
//!    zero-filled globals.
//! 2. Functions of each package in declaration order.
//! 3. Interface thunks.
//! 4. The `main` entry, which initializes each package's globals, runs its
//!    `init` and then calls `main.main`.

mod assign;
mod call;
mod context;
mod emit;
mod error;
mod expr;
mod func;
mod iface;
mod map;
mod program;
mod stmt;

use minigo_analysis::Program;
use minigo_common::CompilationContext;
use tracing::info;

pub use context::{CodegenContext, Place};
pub use emit::{copy_plan, Chunk, Emitter};
pub use error::{CodegenError, ErrorKind, Result};
pub use program::ENTRY_SYMBOL;

/// Options controlling the generated text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodegenOptions {
    /// Prefix each instruction with `/*file:line:col*/`.
    pub emit_position: bool,
}

/// Generates pseudo-assembly for a fully analyzed program.
#[tracing::instrument(skip_all)]
pub fn generate(program: &Program, ctx: &mut CompilationContext, options: CodegenOptions) -> Result<String> {
    let main = minigo_analysis::main_func(program, &ctx.interner).ok_or_else(program::missing_main)?;
    let mut cg = CodegenContext::new(program, ctx, options.emit_position);
    let asm = cg.emit_program(main)?;
    info!(lines = asm.lines().count(), "generated");
    Ok(asm)
}
