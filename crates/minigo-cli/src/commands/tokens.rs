//! `minigo tokens` - print the tokens of one file.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use minigo_common::{CompilationContext, DiagnosticEmitter};
use minigo_syntax::lexer;

/// Prints `line:col<TAB>token` for every token, inserted terminators
/// included.
pub fn run(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut ctx = CompilationContext::new();
    let name = path.display().to_string();
    let id = ctx.source_map.add_file(name.as_str(), source.as_str());
    let base = ctx
        .source_map
        .get_file(id)
        .map(|f| f.base())
        .ok_or_else(|| anyhow!("{} was not added to the source map", name))?;
    let tokens = match lexer::tokenize(&source, base) {
        Ok(tokens) => tokens,
        Err(diagnostic) => {
            DiagnosticEmitter::new(&ctx.source_map).emit(&diagnostic);
            return Err(anyhow!("could not tokenize {}", name));
        }
    };
    for token in &tokens {
        let pos = ctx.source_map.format_span(token.span);
        let line_col = pos.strip_prefix(&format!("{}:", name)).unwrap_or(&pos);
        println!("{}\t{}", line_col, token);
    }
    Ok(())
}
