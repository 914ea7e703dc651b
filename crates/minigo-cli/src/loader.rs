//! Package loading - finds the source files of every package a build
//! needs, parses them and analyzes the packages in import order.
//!
//! Packages named on the command line are local. Any other import is looked
//! up as `<stdlib>/<import path>/*.go`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use minigo_analysis::Program;
use minigo_common::{CompilationContext, DiagnosticEmitter, DiagnosticSink, Symbol};
use minigo_syntax::ast::File;
use tracing::{debug, info};

/// Everything a later phase needs: the context owning the source map and
/// interner, and the analyzed program.
pub struct Workspace {
    pub ctx: CompilationContext,
    pub program: Program,
}

/// A package whose files are parsed but not yet analyzed.
struct SourcePackage {
    path: String,
    files: Vec<File>,
    imports: Vec<Symbol>,
}

/// `.go` files named by `inputs`: files as given, directories by their
/// entries in name order.
pub fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = go_files(input)?;
            if found.is_empty() {
                bail!("no .go files in {}", input.display());
            }
            sources.extend(found);
        } else {
            sources.push(input.clone());
        }
    }
    if sources.is_empty() {
        bail!("no input files");
    }
    Ok(sources)
}

fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "go") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

struct Loader<'s> {
    ctx: CompilationContext,
    stdlib: Option<&'s Path>,
    packages: IndexMap<Symbol, SourcePackage>,
}

/// Parses `sources` and every package they import, then analyzes the
/// packages dependencies first. Diagnostics are printed to stderr.
pub fn load(sources: &[PathBuf], stdlib: Option<&Path>) -> Result<Workspace> {
    let mut loader = Loader {
        ctx: CompilationContext::new(),
        stdlib,
        packages: IndexMap::new(),
    };
    for path in sources {
        let file = loader.parse(path)?;
        let name = file.package.symbol;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        loader.add_file(name, &dir, file)?;
    }
    loader.load_imports()?;
    let order = loader.import_order()?;
    loader.analyze(order)
}

impl Loader<'_> {
    fn parse(&mut self, path: &Path) -> Result<File> {
        let source = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        let name = path.display().to_string();
        match minigo_syntax::parse_source(&mut self.ctx, &name, &source) {
            Ok(file) => Ok(file),
            Err(diagnostic) => {
                DiagnosticEmitter::new(&self.ctx.source_map).emit(&diagnostic);
                Err(anyhow!("could not parse {}", name))
            }
        }
    }

    fn add_file(&mut self, name: Symbol, dir: &Path, file: File) -> Result<()> {
        let imports: Vec<Symbol> = file.imports.iter().map(|i| i.name).collect();
        let path = self.ctx.interner.name(name).to_owned();
        let package = self.packages.entry(name).or_insert_with(|| SourcePackage {
            path,
            files: Vec::new(),
            imports: Vec::new(),
        });
        for import in imports {
            if !package.imports.contains(&import) {
                package.imports.push(import);
            }
        }
        package.files.push(file);
        debug!(package = %package.path, dir = %dir.display(), "added file");
        Ok(())
    }

    /// Loads imported packages from the standard library directory until
    /// every import names a known package.
    fn load_imports(&mut self) -> Result<()> {
        let mut next = 0;
        while let Some((_, package)) = self.packages.get_index(next) {
            let wanted: Vec<(Symbol, String)> = package
                .files
                .iter()
                .flat_map(|f| &f.imports)
                .filter(|i| !self.packages.contains_key(&i.name))
                .map(|i| (i.name, i.path.clone()))
                .collect();
            for (name, path) in wanted {
                if !self.packages.contains_key(&name) {
                    self.load_std_package(name, &path)?;
                }
            }
            next += 1;
        }
        Ok(())
    }

    fn load_std_package(&mut self, name: Symbol, import_path: &str) -> Result<()> {
        let Some(stdlib) = self.stdlib else {
            bail!("package {} not found (no --stdlib directory given)", import_path);
        };
        let dir = stdlib.join(import_path);
        if !dir.is_dir() {
            bail!("package {} is not in the standard library at {}", import_path, stdlib.display());
        }
        let sources = go_files(&dir)?;
        if sources.is_empty() {
            bail!("no .go files in {}", dir.display());
        }
        info!(package = import_path, files = sources.len(), "loading standard package");
        for path in &sources {
            let file = self.parse(path)?;
            if file.package.symbol != name {
                let found = self.ctx.interner.name(file.package.symbol).to_owned();
                bail!("{}: expected package {}, found {}", path.display(), import_path, found);
            }
            self.add_file(name, &dir, file)?;
        }
        if let Some(package) = self.packages.get_mut(&name) {
            package.path = import_path.to_owned();
        }
        Ok(())
    }

    /// Package names, every package after the packages it imports.
    fn import_order(&self) -> Result<Vec<Symbol>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            loader: &Loader<'_>,
            name: Symbol,
            marks: &mut IndexMap<Symbol, Mark>,
            stack: &mut Vec<Symbol>,
            order: &mut Vec<Symbol>,
        ) -> Result<()> {
            match marks.get(&name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let cycle: Vec<&str> = stack
                        .iter()
                        .skip_while(|&&s| s != name)
                        .chain(std::iter::once(&name))
                        .map(|&s| loader.ctx.interner.name(s))
                        .collect();
                    bail!("import cycle: {}", cycle.join(" -> "));
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            stack.push(name);
            if let Some(package) = loader.packages.get(&name) {
                for &import in &package.imports {
                    visit(loader, import, marks, stack, order)?;
                }
            }
            stack.pop();
            marks.insert(name, Mark::Done);
            order.push(name);
            Ok(())
        }

        let mut marks = IndexMap::new();
        let mut order = Vec::with_capacity(self.packages.len());
        for &name in self.packages.keys() {
            visit(self, name, &mut marks, &mut Vec::new(), &mut order)?;
        }
        Ok(order)
    }

    fn analyze(mut self, order: Vec<Symbol>) -> Result<Workspace> {
        let mut program = Program::new(&mut self.ctx.interner);
        for name in order {
            let Some(package) = self.packages.swap_remove(&name) else {
                continue;
            };
            let result = minigo_analysis::analyze_package(
                &mut program,
                &self.ctx.interner,
                name,
                &package.path,
                package.files,
            );
            if let Err(errors) = result {
                report(&self.ctx, &errors);
                bail!(
                    "could not compile package {} due to {} previous error{}",
                    package.path,
                    errors.error_count(),
                    if errors.error_count() == 1 { "" } else { "s" }
                );
            }
        }
        Ok(Workspace {
            ctx: self.ctx,
            program,
        })
    }
}

/// Prints every diagnostic of `errors` to stderr.
pub fn report(ctx: &CompilationContext, errors: &DiagnosticSink) {
    DiagnosticEmitter::new(&ctx.source_map).emit_all(errors);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    fn package_names(ws: &Workspace) -> Vec<String> {
        ws.program
            .packages
            .iter()
            .map(|p| ws.ctx.interner.name(p.name).to_owned())
            .collect()
    }

    #[test]
    fn test_collect_sources_sorts_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.go", "package main\n");
        write(dir.path(), "a.go", "package main\n");
        write(dir.path(), "notes.txt", "");
        let sources = collect_sources(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = sources.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, vec!["a.go", "b.go"]);

        let empty = tempfile::tempdir().unwrap();
        assert!(collect_sources(&[empty.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_imports_are_analyzed_first() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(
            dir.path(),
            "main.go",
            "package main\nimport \"b\"\nimport \"a\"\nfunc main() { println(a.X + b.Y) }\n",
        );
        let std = dir.path().join("std");
        write(&std, "a/a.go", "package a\nvar X = 1\n");
        write(&std, "b/b.go", "package b\nimport \"a\"\nvar Y = a.X + 1\n");

        let ws = load(&[main], Some(&std)).unwrap();
        assert_eq!(package_names(&ws), vec!["a", "b", "main"]);
        assert_eq!(ws.program.packages[1].path, "b");
    }

    #[test]
    fn test_missing_package() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "main.go", "package main\nimport \"fmt\"\nfunc main() {}\n");
        let err = load(&[main.clone()], None).err().unwrap();
        assert!(err.to_string().contains("no --stdlib"));

        let err = load(&[main], Some(dir.path())).err().unwrap();
        assert!(err.to_string().contains("not in the standard library"));
    }

    #[test]
    fn test_import_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "main.go", "package main\nimport \"a\"\nfunc main() {}\n");
        let std = dir.path().join("std");
        write(&std, "a/a.go", "package a\nimport \"b\"\n");
        write(&std, "b/b.go", "package b\nimport \"a\"\n");
        let err = load(&[main], Some(&std)).err().unwrap();
        assert_eq!(err.to_string(), "import cycle: a -> b -> a");
    }

    #[test]
    fn test_local_packages_need_no_stdlib() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(
            dir.path(),
            "main.go",
            "package main\nimport \"util\"\nfunc main() { println(util.Twice(2)) }\n",
        );
        let util = write(
            dir.path(),
            "util/util.go",
            "package util\nfunc Twice(n int) int { return n * 2 }\n",
        );
        let ws = load(&[main, util], None).unwrap();
        assert_eq!(package_names(&ws), vec!["util", "main"]);
    }
}
