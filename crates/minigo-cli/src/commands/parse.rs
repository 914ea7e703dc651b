//! `minigo parse` - print the syntax tree of one file.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use minigo_common::{CompilationContext, DiagnosticEmitter};
use minigo_syntax::dump::dump_file;

pub fn run(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut ctx = CompilationContext::new();
    let name = path.display().to_string();
    match minigo_syntax::parse_source(&mut ctx, &name, &source) {
        Ok(file) => {
            print!("{}", dump_file(&file, &ctx.interner));
            Ok(())
        }
        Err(diagnostic) => {
            DiagnosticEmitter::new(&ctx.source_map).emit(&diagnostic);
            Err(anyhow!("could not parse {}", name))
        }
    }
}
