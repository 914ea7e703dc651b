//! Code generation errors.

use minigo_common::{Diagnostic, Label, Span};

#[derive(Debug)]
pub struct CodegenError {
    pub kind: ErrorKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum ErrorKind {
    UndefinedSymbol(String),
    MissingType,
    InvalidAssignTarget,
    InvalidBreak,
    InvalidContinue,
    MissingMain,
    NotYetImplemented(String),
    InternalError(String),
}

impl ErrorKind {
    /// Diagnostic code, in the 3000 range.
    pub fn code(&self) -> u16 {
        match self {
            ErrorKind::UndefinedSymbol(_) => 3000,
            ErrorKind::MissingType => 3001,
            ErrorKind::InvalidAssignTarget => 3002,
            ErrorKind::InvalidBreak => 3003,
            ErrorKind::InvalidContinue => 3004,
            ErrorKind::MissingMain => 3005,
            ErrorKind::InternalError(_) => 3098,
            ErrorKind::NotYetImplemented(_) => 3099,
        }
    }
}

impl CodegenError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn undefined(name: &str, span: Span) -> Self {
        Self::new(ErrorKind::UndefinedSymbol(name.to_string()), span)
    }

    pub fn internal(msg: &str, span: Span) -> Self {
        Self::new(ErrorKind::InternalError(msg.to_string()), span)
    }

    pub fn not_yet_implemented(what: &str, span: Span) -> Self {
        Self::new(ErrorKind::NotYetImplemented(what.to_string()), span)
    }

    pub fn is_not_yet_implemented(&self) -> bool {
        matches!(self.kind, ErrorKind::NotYetImplemented(_))
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let code = self.kind.code();
        Diagnostic::error(self.to_string())
            .with_code(code)
            .with_label(Label::primary(self.span))
    }
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::UndefinedSymbol(name) => write!(f, "undefined: {}", name),
            ErrorKind::MissingType => write!(f, "expression has no type"),
            ErrorKind::InvalidAssignTarget => write!(f, "invalid assignment target"),
            ErrorKind::InvalidBreak => write!(f, "break outside loop or switch"),
            ErrorKind::InvalidContinue => write!(f, "continue outside loop"),
            ErrorKind::MissingMain => write!(f, "function main is undeclared in the main package"),
            ErrorKind::NotYetImplemented(what) => write!(f, "not yet implemented: {}", what),
            ErrorKind::InternalError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<CodegenError> for Diagnostic {
    fn from(e: CodegenError) -> Self {
        e.into_diagnostic()
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_yet_implemented_is_distinct() {
        let e = CodegenError::not_yet_implemented("method values", Span::dummy());
        assert!(e.is_not_yet_implemented());
        assert_eq!(e.to_string(), "not yet implemented: method values");
        let d = e.into_diagnostic();
        assert_eq!(d.code, Some(3099));

        let e = CodegenError::undefined("x", Span::dummy());
        assert!(!e.is_not_yet_implemented());
        assert_eq!(e.into_diagnostic().code, Some(3000));
    }
}
