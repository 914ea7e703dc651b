//! Front end of the minigo compiler.
//!
//! - **Tokenizer**: bytes to tokens with automatic terminator insertion
//! - **Parser**: tokens to an [`ast::File`], stopping at the first error
//! - **AST**: the tree every later phase completes in place
//! - [`dump`]: a structural text dump of the tree
//! - [`visit`]: a mutable walk over every name reference

pub mod ast;
pub mod bytestream;
pub mod dump;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod token_stream;
pub mod visit;

use minigo_common::{CompilationContext, Diagnostic, FileId};
use tracing::debug;

pub use errors::SyntaxError;
pub use parser::{ParseResult, Parser};

/// Tokenizes and parses one file of the source map.
#[tracing::instrument(skip_all, fields(file = file.as_u32()))]
pub fn parse_file(ctx: &mut CompilationContext, file: FileId) -> ParseResult<ast::File> {
    let (source, base) = match ctx.source_map.get_file(file) {
        Some(f) => (f.source().to_owned(), f.base()),
        None => return Err(Diagnostic::error(format!("unknown file id {}", file.as_u32()))),
    };
    let tokens = lexer::tokenize(&source, base)?;
    debug!(tokens = tokens.len(), "tokenized");
    let parsed = Parser::new(tokens, ctx).parse_file()?;
    debug!(decls = parsed.decls.len(), "parsed");
    Ok(parsed)
}

/// Adds `source` to the source map under `name` and parses it.
pub fn parse_source(
    ctx: &mut CompilationContext,
    name: &str,
    source: &str,
) -> ParseResult<ast::File> {
    let id = ctx.source_map.add_file(name, source);
    parse_file(ctx, id)
}
