//! Token definitions.

use std::fmt;

use minigo_common::Span;

/// Payload carried by literal and identifier tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenValue {
    None,
    /// Identifier name.
    Ident(String),
    Int(i64),
    /// Char literal byte.
    Char(u8),
    /// String literal as it will appear in the assembler data section
    /// (escapes kept), and its length in bytes at run time.
    Str { text: String, len: usize },
}

/// A token produced by the tokenizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: TokenValue,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            value: TokenValue::None,
        }
    }

    #[inline]
    pub fn with_value(kind: TokenKind, span: Span, value: TokenValue) -> Self {
        Self { kind, span, value }
    }

    /// Identifier text, or `""` for other tokens.
    pub fn ident(&self) -> &str {
        match &self.value {
            TokenValue::Ident(s) => s,
            _ => "",
        }
    }

    /// True if this is the punctuation or keyword `kind`.
    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            TokenValue::None => write!(f, "{}", self.kind),
            TokenValue::Ident(s) => write!(f, "{} {}", self.kind, s),
            TokenValue::Int(n) => write!(f, "{} {}", self.kind, n),
            TokenValue::Char(b) => write!(f, "{} {}", self.kind, b),
            TokenValue::Str { text, .. } => write!(f, "{} \"{}\"", self.kind, text),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    Eof,
    /// Explicit or inserted statement terminator.
    Semicolon,

    // Literals
    Ident,
    IntLit,
    CharLit,
    StringLit,

    // Keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AmpCaret,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
    AmpCaretAssign,
    AndAnd,
    OrOr,
    Arrow,
    PlusPlus,
    MinusMinus,
    EqEq,
    Lt,
    Gt,
    Assign,
    Not,
    NotEq,
    LtEq,
    GtEq,
    ColonAssign,
    Ellipsis,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
}

impl TokenKind {
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Break
                | TokenKind::Case
                | TokenKind::Chan
                | TokenKind::Const
                | TokenKind::Continue
                | TokenKind::Default
                | TokenKind::Defer
                | TokenKind::Else
                | TokenKind::Fallthrough
                | TokenKind::For
                | TokenKind::Func
                | TokenKind::Go
                | TokenKind::Goto
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::Interface
                | TokenKind::Map
                | TokenKind::Package
                | TokenKind::Range
                | TokenKind::Return
                | TokenKind::Select
                | TokenKind::Struct
                | TokenKind::Switch
                | TokenKind::Type
                | TokenKind::Var
        )
    }

    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLit | TokenKind::CharLit | TokenKind::StringLit
        )
    }

    /// `+=`, `-=` and friends. Plain `=` and `:=` are not included.
    pub const fn is_op_assign(self) -> bool {
        matches!(
            self,
            TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
                | TokenKind::AmpAssign
                | TokenKind::PipeAssign
                | TokenKind::CaretAssign
                | TokenKind::ShlAssign
                | TokenKind::ShrAssign
                | TokenKind::AmpCaretAssign
        )
    }

    /// A newline after one of these inserts a terminator.
    pub const fn can_end_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::IntLit
                | TokenKind::CharLit
                | TokenKind::StringLit
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    pub fn keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Semicolon => ";",
            TokenKind::Ident => "identifier",
            TokenKind::IntLit => "integer literal",
            TokenKind::CharLit => "char literal",
            TokenKind::StringLit => "string literal",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Chan => "chan",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Default => "default",
            TokenKind::Defer => "defer",
            TokenKind::Else => "else",
            TokenKind::Fallthrough => "fallthrough",
            TokenKind::For => "for",
            TokenKind::Func => "func",
            TokenKind::Go => "go",
            TokenKind::Goto => "goto",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::Interface => "interface",
            TokenKind::Map => "map",
            TokenKind::Package => "package",
            TokenKind::Range => "range",
            TokenKind::Return => "return",
            TokenKind::Select => "select",
            TokenKind::Struct => "struct",
            TokenKind::Switch => "switch",
            TokenKind::Type => "type",
            TokenKind::Var => "var",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::AmpCaret => "&^",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PercentAssign => "%=",
            TokenKind::AmpAssign => "&=",
            TokenKind::PipeAssign => "|=",
            TokenKind::CaretAssign => "^=",
            TokenKind::ShlAssign => "<<=",
            TokenKind::ShrAssign => ">>=",
            TokenKind::AmpCaretAssign => "&^=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Arrow => "<-",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::EqEq => "==",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Assign => "=",
            TokenKind::Not => "!",
            TokenKind::NotEq => "!=",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::ColonAssign => ":=",
            TokenKind::Ellipsis => "...",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("range"), Some(TokenKind::Range));
        assert_eq!(TokenKind::keyword("fallthrough"), Some(TokenKind::Fallthrough));
        assert_eq!(TokenKind::keyword("main"), None);
        assert!(TokenKind::Range.is_keyword());
        assert!(!TokenKind::Ident.is_keyword());
    }

    #[test]
    fn test_can_end_statement() {
        assert!(TokenKind::Ident.can_end_statement());
        assert!(TokenKind::RBrace.can_end_statement());
        assert!(TokenKind::Return.can_end_statement());
        assert!(!TokenKind::Plus.can_end_statement());
        assert!(!TokenKind::LBrace.can_end_statement());
    }

    #[test]
    fn test_op_assign() {
        assert!(TokenKind::PlusAssign.is_op_assign());
        assert!(!TokenKind::Assign.is_op_assign());
        assert!(!TokenKind::ColonAssign.is_op_assign());
    }

    #[test]
    fn test_token_display() {
        let tok = Token::with_value(TokenKind::Ident, Span::dummy(), TokenValue::Ident("x".into()));
        assert_eq!(tok.to_string(), "identifier x");
        assert_eq!(Token::new(TokenKind::ColonAssign, Span::dummy()).to_string(), ":=");
    }
}
