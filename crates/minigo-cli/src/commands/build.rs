//! `minigo build` - compile packages to pseudo-assembly.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use minigo_codegen::CodegenOptions;
use minigo_common::DiagnosticEmitter;
use tracing::info;

use crate::loader;

/// Compiles the program rooted at `inputs` and writes the assembly to
/// `output`, or to stdout.
///
/// # Examples
/// ```text
/// minigo build main.go -o main.s
/// ```
pub fn run(inputs: &[PathBuf], stdlib: Option<&Path>, output: Option<&Path>, emit_position: bool) -> Result<()> {
    let sources = loader::collect_sources(inputs)?;
    let mut ws = loader::load(&sources, stdlib)?;
    let options = CodegenOptions { emit_position };
    let asm = match minigo_codegen::generate(&ws.program, &mut ws.ctx, options) {
        Ok(asm) => asm,
        Err(e) => {
            let diagnostic = e.into_diagnostic();
            DiagnosticEmitter::new(&ws.ctx.source_map).emit(&diagnostic);
            bail!("code generation failed");
        }
    };
    match output {
        Some(path) => {
            fs::write(path, &asm).with_context(|| format!("cannot write {}", path.display()))?;
            info!(output = %path.display(), bytes = asm.len(), "wrote assembly");
        }
        None => print!("{}", asm),
    }
    Ok(())
}
