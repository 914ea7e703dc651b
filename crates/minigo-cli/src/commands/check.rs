//! `minigo check` - parse and analyze without generating code.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::loader;

/// Analyzes every package `inputs` need.
///
/// # Examples
/// ```text
/// minigo check ./app --stdlib ./stdlib
/// ```
pub fn run(inputs: &[PathBuf], stdlib: Option<&Path>) -> Result<()> {
    let sources = loader::collect_sources(inputs)?;
    let ws = loader::load(&sources, stdlib)?;
    for pkg in &ws.program.packages {
        println!("ok\t{}", pkg.path);
    }
    Ok(())
}
