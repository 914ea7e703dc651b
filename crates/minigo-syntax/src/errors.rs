//! Error codes for the tokenizer and parser.
//!
//! Both phases stop at the first error, so each failure is a single
//! [`Diagnostic`] carrying one of these codes.

use minigo_common::{Diagnostic, Label, Span};

/// Syntax error codes (1xxx range).
///
/// - 1000-1099: tokenizer errors
/// - 1100-1199: parser errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SyntaxError {
    // === Lexer: Comments (1000-1009) ===
    UnterminatedBlockComment = 1000,

    // === Lexer: String/Char Literals (1010-1029) ===
    UnterminatedString = 1010,
    UnterminatedRawString = 1011,
    UnterminatedChar = 1012,
    EmptyChar = 1013,
    MultiByteChar = 1014,
    /// Only `\n \t \r \\ \'` are accepted inside char literals.
    UnexpectedEscape = 1015,

    // === Lexer: Numbers (1040-1049) ===
    IntegerOverflow = 1040,

    // === Lexer: Other (1090-1099) ===
    UnexpectedChar = 1090,
    /// `..` is neither `.` nor `...`.
    DoubleDot = 1091,

    // === Parser: General (1100-1119) ===
    ExpectedToken = 1100,
    UnexpectedToken = 1101,
    ExpectedExpr = 1102,
    ExpectedStmt = 1103,
    ExpectedType = 1104,
    ExpectedIdent = 1105,

    // === Parser: Declarations (1120-1139) ===
    ExpectedPackage = 1120,
    ExpectedFuncBody = 1121,
    ExpectedStructField = 1122,
    ExpectedInterfaceMethod = 1123,
    MissingConstValue = 1124,
    AssignmentCountMismatch = 1125,

    // === Parser: Statements (1140-1159) ===
    BreakOutsideLoop = 1140,
    ContinueOutsideLoop = 1141,
    InvalidRangeClause = 1142,
    ExpectedCompositeKey = 1143,
    FuncOutsideFunction = 1144,

    // === Parser: Unsupported (1190-1199) ===
    /// Syntax that is recognized but not supported yet.
    NotYetImplemented = 1190,
}

impl SyntaxError {
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn message(self) -> &'static str {
        match self {
            // Lexer
            SyntaxError::UnterminatedBlockComment => "unterminated block comment",
            SyntaxError::UnterminatedString => "unterminated string literal",
            SyntaxError::UnterminatedRawString => "unterminated raw string literal",
            SyntaxError::UnterminatedChar => "unterminated char literal",
            SyntaxError::EmptyChar => "empty char literal",
            SyntaxError::MultiByteChar => "char literal has more than one byte",
            SyntaxError::UnexpectedEscape => "unexpected escape sequence",
            SyntaxError::IntegerOverflow => "integer literal overflows int",
            SyntaxError::UnexpectedChar => "unexpected character",
            SyntaxError::DoubleDot => "unexpected '..'",

            // Parser
            SyntaxError::ExpectedToken => "expected token",
            SyntaxError::UnexpectedToken => "unexpected token",
            SyntaxError::ExpectedExpr => "expected expression",
            SyntaxError::ExpectedStmt => "expected statement",
            SyntaxError::ExpectedType => "expected type",
            SyntaxError::ExpectedIdent => "expected identifier",
            SyntaxError::ExpectedPackage => "expected package clause",
            SyntaxError::ExpectedFuncBody => "expected function body",
            SyntaxError::ExpectedStructField => "expected struct field",
            SyntaxError::ExpectedInterfaceMethod => "expected interface method",
            SyntaxError::MissingConstValue => "missing constant value",
            SyntaxError::AssignmentCountMismatch => "assignment count mismatch",
            SyntaxError::BreakOutsideLoop => "break is not in a loop or switch",
            SyntaxError::ContinueOutsideLoop => "continue is not in a loop",
            SyntaxError::InvalidRangeClause => "invalid range clause",
            SyntaxError::ExpectedCompositeKey => "expected key in composite literal",
            SyntaxError::FuncOutsideFunction => "statement outside function body",
            SyntaxError::NotYetImplemented => "not yet implemented",
        }
    }

    /// A diagnostic with this code and no location.
    pub fn diagnostic(self) -> Diagnostic {
        Diagnostic::error(self.message()).with_code(self.code())
    }

    pub fn at(self, span: impl Into<Span>) -> Diagnostic {
        Diagnostic::error(self.message())
            .with_code(self.code())
            .with_label(Label::primary(span))
    }

    pub fn at_with_message(self, span: impl Into<Span>, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(message)
            .with_code(self.code())
            .with_label(Label::primary(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SyntaxError::UnterminatedBlockComment.code(), 1000);
        assert_eq!(SyntaxError::UnexpectedEscape.code(), 1015);
        assert_eq!(SyntaxError::UnexpectedChar.code(), 1090);
        assert_eq!(SyntaxError::ExpectedToken.code(), 1100);
        assert_eq!(SyntaxError::NotYetImplemented.code(), 1190);
    }

    #[test]
    fn test_at_with_span() {
        let diag = SyntaxError::DoubleDot.at(10u32..12u32);
        assert_eq!(diag.code, Some(1091));
        assert_eq!(diag.message, "unexpected '..'");
        assert_eq!(diag.labels[0].span, Span::from_u32(10, 12));
    }
}
