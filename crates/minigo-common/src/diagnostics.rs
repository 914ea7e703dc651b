//! Diagnostic reporting.
//!
//! Every compile error is a [`Diagnostic`] with a numeric code and labels
//! pointing into the global position space. Diagnostics are rendered with
//! codespan-reporting. There is no warning tier: any reported diagnostic
//! stops the compilation.

use std::fmt;

use codespan_reporting::diagnostic::{
    Diagnostic as CSDiagnostic, Label as CSLabel, LabelStyle, Severity as CSSeverity,
};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{
    self,
    termcolor::{Buffer, ColorChoice, StandardStream, WriteColor},
    Config,
};

use crate::source::SourceMap;
use crate::span::Span;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    /// A fatal error.
    Error,
    /// Extra information attached to a compilation failure.
    Note,
}

impl Severity {
    #[inline]
    pub const fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Note => write!(f, "note"),
        }
    }
}

impl From<Severity> for CSSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => CSSeverity::Error,
            Severity::Note => CSSeverity::Note,
        }
    }
}

/// A label pointing at a source location.
#[derive(Clone, Debug)]
pub struct Label {
    pub style: LabelStyle,
    pub span: Span,
    pub message: Option<String>,
}

impl Label {
    /// The main location of the diagnostic.
    pub fn primary(span: impl Into<Span>) -> Self {
        Self {
            style: LabelStyle::Primary,
            span: span.into(),
            message: None,
        }
    }

    /// Additional context.
    pub fn secondary(span: impl Into<Span>) -> Self {
        Self {
            style: LabelStyle::Secondary,
            span: span.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A diagnostic message with severity, code, labels and notes.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<u16>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = Label>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
            .map(|l| l.span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[E{:04}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// A collector for diagnostics.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    #[inline]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Takes all diagnostics, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    pub fn extend(&mut self, other: DiagnosticSink) {
        self.error_count += other.error_count;
        self.diagnostics.extend(other.diagnostics);
    }
}

impl From<Diagnostic> for DiagnosticSink {
    fn from(diagnostic: Diagnostic) -> Self {
        let mut sink = DiagnosticSink::new();
        sink.emit(diagnostic);
        sink
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("errors", &self.error_count)
            .field("total", &self.diagnostics.len())
            .finish()
    }
}

/// Renders diagnostics against a source map.
pub struct DiagnosticEmitter<'a> {
    source_map: &'a SourceMap,
    config: Config,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(source_map: &'a SourceMap) -> Self {
        Self {
            source_map,
            config: Config::default(),
        }
    }

    /// Emits a diagnostic to stderr with colors.
    pub fn emit(&self, diagnostic: &Diagnostic) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut writer.lock(), diagnostic);
    }

    pub fn emit_to<W: WriteColor>(&self, writer: &mut W, diagnostic: &Diagnostic) {
        let files = self.build_files();
        let cs_diagnostic = self.to_codespan(diagnostic);
        let _ = term::emit(writer, &self.config, &files, &cs_diagnostic);
    }

    pub fn emit_to_string(&self, diagnostic: &Diagnostic) -> String {
        let mut buffer = Buffer::no_color();
        self.emit_to(&mut buffer, diagnostic);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    pub fn emit_all(&self, sink: &DiagnosticSink) {
        for diagnostic in sink.iter() {
            self.emit(diagnostic);
        }
    }

    pub fn emit_all_to_string(&self, sink: &DiagnosticSink) -> String {
        sink.iter().map(|d| self.emit_to_string(d)).collect()
    }

    fn build_files(&self) -> SimpleFiles<&str, &str> {
        let mut files = SimpleFiles::new();
        for file in self.source_map.files() {
            files.add(file.name(), file.source());
        }
        files
    }

    fn to_codespan(&self, diagnostic: &Diagnostic) -> CSDiagnostic<usize> {
        let mut cs_diagnostic =
            CSDiagnostic::new(diagnostic.severity.into()).with_message(&diagnostic.message);

        if let Some(code) = diagnostic.code {
            cs_diagnostic = cs_diagnostic.with_code(format!("E{:04}", code));
        }

        let labels: Vec<CSLabel<usize>> = diagnostic
            .labels
            .iter()
            .filter_map(|label| {
                let file = self.source_map.lookup_span(label.span)?;
                let file_id = file.id().as_u32() as usize;
                let start = file.local_offset(label.span.start) as usize;
                let end = file.local_offset(label.span.end).max(start as u32) as usize;
                let mut cs_label = CSLabel::new(label.style, file_id, start..end);
                if let Some(msg) = &label.message {
                    cs_label = cs_label.with_message(msg);
                }
                Some(cs_label)
            })
            .collect();

        cs_diagnostic
            .with_labels(labels)
            .with_notes(diagnostic.notes.clone())
    }
}

/// Result type for phases that can report several diagnostics at once.
pub type DiagnosticResult<T> = Result<T, DiagnosticSink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert!(Severity::Error.is_error());
        assert!(!Severity::Note.is_error());
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Note), "note");
    }

    #[test]
    fn test_label_creation() {
        let label = Label::primary(10u32..20u32).with_message("here");
        assert_eq!(label.style, LabelStyle::Primary);
        assert_eq!(label.span, Span::from_u32(10, 20));
        assert_eq!(label.message.as_deref(), Some("here"));
        assert_eq!(Label::secondary(1u32..2u32).style, LabelStyle::Secondary);
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error("undefined: x")
            .with_code(2000)
            .with_label(Label::primary(3u32..4u32))
            .with_note("declared nowhere");
        assert!(diag.is_error());
        assert_eq!(diag.code, Some(2000));
        assert_eq!(diag.primary_span(), Some(Span::from_u32(3, 4)));
        assert_eq!(diag.to_string(), "error[E2000]: undefined: x");
    }

    #[test]
    fn test_sink_counts_and_take() {
        let mut sink = DiagnosticSink::new();
        assert!(sink.is_empty());
        sink.emit(Diagnostic::error("one"));
        sink.emit(Diagnostic::note("context"));
        sink.emit(Diagnostic::error("two"));
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.error_count(), 2);

        let taken = sink.take();
        assert_eq!(taken.len(), 3);
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_sink_extend_and_from() {
        let mut a = DiagnosticSink::from(Diagnostic::error("a"));
        let b = DiagnosticSink::from(Diagnostic::error("b"));
        a.extend(b);
        let messages: Vec<_> = a.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b"]);
        assert_eq!(a.error_count(), 2);
    }

    #[test]
    fn test_emitter_renders_code_and_location() {
        let mut source_map = SourceMap::new();
        source_map.add_file("main.go", "package main\nvar x = y\n");
        let emitter = DiagnosticEmitter::new(&source_map);

        let diagnostic = Diagnostic::error("unresolved identifier: y")
            .with_code(2000)
            .with_label(Label::primary(22u32..23u32).with_message("not found"));
        let output = emitter.emit_to_string(&diagnostic);

        assert!(output.contains("E2000"));
        assert!(output.contains("unresolved identifier: y"));
        assert!(output.contains("main.go"));
    }
}
