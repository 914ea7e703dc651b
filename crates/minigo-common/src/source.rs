//! Source file management with a global position space.
//!
//! Each file is assigned a base offset when it is added to the map:
//! - File 1: positions [0, 1000)
//! - File 2: positions [1001, 2500)
//!
//! Tokens and AST nodes therefore never need to carry a file id.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::span::{BytePos, Span};

/// A unique identifier for a source file within a `SourceMap`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FileId(u32);

impl FileId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// 1-indexed line and column (in bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source file with its content and line table.
#[derive(Clone)]
pub struct SourceFile {
    id: FileId,
    name: Arc<str>,
    path: Option<PathBuf>,
    source: Arc<str>,
    base: u32,
    /// Byte offsets of line starts, relative to `base`. Always starts with 0.
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(id: FileId, name: Arc<str>, path: Option<PathBuf>, source: Arc<str>, base: u32) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            id,
            name,
            path,
            source,
            base,
            line_starts,
        }
    }

    #[inline]
    pub const fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// End position (exclusive) in the global space.
    #[inline]
    pub fn end_pos(&self) -> u32 {
        self.base + self.source.len() as u32
    }

    /// Positions equal to `end_pos` belong to the file so that EOF tokens resolve.
    #[inline]
    pub fn contains_pos(&self, pos: BytePos) -> bool {
        let p = pos.to_u32();
        p >= self.base && p <= self.end_pos()
    }

    #[inline]
    pub fn local_offset(&self, pos: BytePos) -> u32 {
        pos.to_u32().saturating_sub(self.base)
    }

    pub fn line_col(&self, pos: BytePos) -> LineCol {
        let offset = self.local_offset(pos);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let column = offset.saturating_sub(self.line_starts[line]) + 1;
        LineCol {
            line: (line + 1) as u32,
            column,
        }
    }

    pub fn span_text(&self, span: Span) -> &str {
        let start = (self.local_offset(span.start) as usize).min(self.source.len());
        let end = (self.local_offset(span.end) as usize).min(self.source.len());
        &self.source[start..end]
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base", &self.base)
            .field("len", &self.source.len())
            .finish()
    }
}

/// Registry of every source file in a compilation.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    next_base: u32,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and assigns its base offset. Bases start at 1 so that
    /// no real position collides with the dummy span.
    pub fn add_file(&mut self, name: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> FileId {
        self.push(name.into(), None, source.into())
    }

    pub fn add_file_with_path(
        &mut self,
        name: impl Into<Arc<str>>,
        path: impl Into<PathBuf>,
        source: impl Into<Arc<str>>,
    ) -> FileId {
        self.push(name.into(), Some(path.into()), source.into())
    }

    /// Reads a file from disk and adds it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<FileId> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let name = path.to_string_lossy().into_owned();
        Ok(self.add_file_with_path(name, path.to_path_buf(), source))
    }

    fn push(&mut self, name: Arc<str>, path: Option<PathBuf>, source: Arc<str>) -> FileId {
        let id = FileId::new(self.files.len() as u32);
        let base = self.next_base.max(1);
        self.next_base = base + source.len() as u32 + 1;
        self.files.push(SourceFile::new(id, name, path, source, base));
        id
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn lookup_file(&self, pos: BytePos) -> Option<&SourceFile> {
        let p = pos.to_u32();
        let idx = self.files.partition_point(|f| f.base <= p);
        let file = self.files.get(idx.checked_sub(1)?)?;
        file.contains_pos(pos).then_some(file)
    }

    pub fn lookup_span(&self, span: Span) -> Option<&SourceFile> {
        self.lookup_file(span.start)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    #[inline]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn line_col(&self, pos: BytePos) -> Option<LineCol> {
        self.lookup_file(pos).map(|f| f.line_col(pos))
    }

    pub fn span_text(&self, span: Span) -> Option<&str> {
        self.lookup_span(span).map(|f| f.span_text(span))
    }

    /// `file:line:col` for a position, or `?:offset` when it is unknown.
    pub fn format_pos(&self, pos: BytePos) -> String {
        match self.lookup_file(pos) {
            Some(file) => format!("{}:{}", file.name(), file.line_col(pos)),
            None => format!("?:{}", pos.to_u32()),
        }
    }

    pub fn format_span(&self, span: Span) -> String {
        self.format_pos(span.start)
    }
}

impl fmt::Debug for SourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceMap")
            .field("file_count", &self.files.len())
            .field("next_base", &self.next_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bases_do_not_overlap() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.go", "package main\n");
        let b = map.add_file("b.go", "package main\n");
        let fa = map.get_file(a).unwrap();
        let fb = map.get_file(b).unwrap();
        assert_eq!(fa.base(), 1);
        assert!(fb.base() > fa.end_pos());
    }

    #[test]
    fn test_lookup_and_line_col() {
        let mut map = SourceMap::new();
        map.add_file("a.go", "package main\nfunc f() {}\n");
        let id = map.add_file("b.go", "package main\n\nvar x int\n");
        let base = map.get_file(id).unwrap().base();

        let pos = BytePos::new(base + 14);
        let file = map.lookup_file(pos).unwrap();
        assert_eq!(file.name(), "b.go");
        assert_eq!(file.line_col(pos), LineCol { line: 3, column: 1 });
        assert_eq!(map.format_pos(pos), "b.go:3:1");
    }

    #[test]
    fn test_span_text() {
        let mut map = SourceMap::new();
        let id = map.add_file("a.go", "var answer = 42");
        let base = map.get_file(id).unwrap().base();
        let span = Span::from_u32(base + 4, base + 10);
        assert_eq!(map.span_text(span), Some("answer"));
    }

    #[test]
    fn test_unknown_position() {
        let map = SourceMap::new();
        assert!(map.lookup_file(BytePos::new(7)).is_none());
        assert_eq!(map.format_pos(BytePos::new(7)), "?:7");
    }
}
