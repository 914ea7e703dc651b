//! Tokenizer.
//!
//! Turns a byte stream into a token sequence with Go-style automatic
//! terminator insertion. The first malformed token aborts the whole file.
//!
//! Positions are global: the stream is created with the file's base offset
//! from the `SourceMap`, so token spans identify the file as well.

use minigo_common::{BytePos, Diagnostic, Span};

use crate::bytestream::ByteStream;
use crate::errors::SyntaxError;
use crate::token::{Token, TokenKind, TokenValue};

pub type LexResult<T> = Result<T, Diagnostic>;

pub struct Lexer<'src> {
    stream: ByteStream<'src>,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, base: u32) -> Self {
        Self {
            stream: ByteStream::new(source, base),
            tokens: Vec::new(),
        }
    }

    /// Tokenizes the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        loop {
            self.skip_whitespace_and_comments()?;
            let start = self.stream.pos();
            let Some(c) = self.stream.get() else {
                self.insert_semicolon(start);
                self.tokens.push(Token::new(TokenKind::Eof, Span::new(start, start)));
                break;
            };
            let token = self.scan_token(c, start)?;
            self.tokens.push(token);
        }
        tracing::trace!(count = self.tokens.len(), "tokenized");
        Ok(self.tokens)
    }

    /// Pushes a terminator if the previous token can end a statement.
    fn insert_semicolon(&mut self, at: BytePos) {
        if self
            .tokens
            .last()
            .is_some_and(|t| t.kind.can_end_statement())
        {
            self.tokens
                .push(Token::new(TokenKind::Semicolon, Span::new(at, at)));
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> LexResult<()> {
        loop {
            match self.stream.peek() {
                Some(b' ' | b'\t' | b'\r') => {
                    self.stream.get();
                }
                Some(b'\n') => {
                    let at = self.stream.pos();
                    self.insert_semicolon(at);
                    self.stream.get();
                }
                Some(b'/') if self.stream.peek_nth(1) == Some(b'/') => {
                    while !matches!(self.stream.peek(), None | Some(b'\n')) {
                        self.stream.get();
                    }
                }
                Some(b'/') if self.stream.peek_nth(1) == Some(b'*') => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Block comments do not nest. One that spans lines counts as a newline.
    fn skip_block_comment(&mut self) -> LexResult<()> {
        let start = self.stream.pos();
        self.stream.get();
        self.stream.get();
        let mut saw_newline = false;
        loop {
            match self.stream.get() {
                None => {
                    return Err(SyntaxError::UnterminatedBlockComment.at(Span::new(start, self.stream.pos())))
                }
                Some(b'*') if self.stream.eat(b'/') => break,
                Some(b'\n') => saw_newline = true,
                Some(_) => {}
            }
        }
        if saw_newline {
            self.insert_semicolon(start);
        }
        Ok(())
    }

    fn scan_token(&mut self, c: u8, start: BytePos) -> LexResult<Token> {
        if is_ident_start(c) {
            return Ok(self.scan_ident(start));
        }
        if c.is_ascii_digit() {
            return self.scan_number(start);
        }
        let kind = match c {
            b'\'' => return self.scan_char(start),
            b'"' => return self.scan_string(start),
            b'`' => return self.scan_raw_string(start),

            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b':' => self.either(b'=', TokenKind::ColonAssign, TokenKind::Colon),
            b'.' => {
                if self.stream.peek() == Some(b'.') {
                    self.stream.get();
                    if !self.stream.eat(b'.') {
                        return Err(SyntaxError::DoubleDot.at(self.span_from(start)));
                    }
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }

            // +, ++, +=
            b'+' => {
                if self.stream.eat(b'+') {
                    TokenKind::PlusPlus
                } else {
                    self.either(b'=', TokenKind::PlusAssign, TokenKind::Plus)
                }
            }

            // -, --, -=
            b'-' => {
                if self.stream.eat(b'-') {
                    TokenKind::MinusMinus
                } else {
                    self.either(b'=', TokenKind::MinusAssign, TokenKind::Minus)
                }
            }

            b'*' => self.either(b'=', TokenKind::StarAssign, TokenKind::Star),
            b'/' => self.either(b'=', TokenKind::SlashAssign, TokenKind::Slash),
            b'%' => self.either(b'=', TokenKind::PercentAssign, TokenKind::Percent),
            b'^' => self.either(b'=', TokenKind::CaretAssign, TokenKind::Caret),

            // &, &&, &^, &^=, &=
            b'&' => {
                if self.stream.eat(b'&') {
                    TokenKind::AndAnd
                } else if self.stream.eat(b'^') {
                    self.either(b'=', TokenKind::AmpCaretAssign, TokenKind::AmpCaret)
                } else {
                    self.either(b'=', TokenKind::AmpAssign, TokenKind::Amp)
                }
            }

            // |, ||, |=
            b'|' => {
                if self.stream.eat(b'|') {
                    TokenKind::OrOr
                } else {
                    self.either(b'=', TokenKind::PipeAssign, TokenKind::Pipe)
                }
            }

            // <, <-, <<, <<=, <=
            b'<' => {
                if self.stream.eat(b'-') {
                    TokenKind::Arrow
                } else if self.stream.eat(b'<') {
                    self.either(b'=', TokenKind::ShlAssign, TokenKind::Shl)
                } else {
                    self.either(b'=', TokenKind::LtEq, TokenKind::Lt)
                }
            }

            // >, >>, >>=, >=
            b'>' => {
                if self.stream.eat(b'>') {
                    self.either(b'=', TokenKind::ShrAssign, TokenKind::Shr)
                } else {
                    self.either(b'=', TokenKind::GtEq, TokenKind::Gt)
                }
            }

            b'=' => self.either(b'=', TokenKind::EqEq, TokenKind::Assign),
            b'!' => self.either(b'=', TokenKind::NotEq, TokenKind::Not),
            _ => {
                return Err(SyntaxError::UnexpectedChar.at_with_message(
                    self.span_from(start),
                    format!("unexpected character {:?}", c as char),
                ))
            }
        };
        Ok(Token::new(kind, self.span_from(start)))
    }

    /// `yes` if the next byte is `next` (consuming it), `no` otherwise.
    fn either(&mut self, next: u8, yes: TokenKind, no: TokenKind) -> TokenKind {
        if self.stream.eat(next) {
            yes
        } else {
            no
        }
    }

    fn scan_ident(&mut self, start: BytePos) -> Token {
        while let Some(b) = self.stream.get() {
            if !is_ident_continue(b) {
                self.stream.unget();
                break;
            }
        }
        let end = self.stream.pos();
        let text = self.stream.slice(start, end);
        let span = Span::new(start, end);
        match TokenKind::keyword(text) {
            Some(kind) => Token::new(kind, span),
            None => Token::with_value(TokenKind::Ident, span, TokenValue::Ident(text.to_owned())),
        }
    }

    fn scan_number(&mut self, start: BytePos) -> LexResult<Token> {
        while self.stream.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.stream.get();
        }
        let span = self.span_from(start);
        let text = self.stream.slice(span.start, span.end);
        let value: i64 = text
            .parse()
            .map_err(|_| SyntaxError::IntegerOverflow.at(span))?;
        Ok(Token::with_value(TokenKind::IntLit, span, TokenValue::Int(value)))
    }

    fn scan_char(&mut self, start: BytePos) -> LexResult<Token> {
        let byte = match self.stream.get() {
            None | Some(b'\n') => return Err(SyntaxError::UnterminatedChar.at(self.span_from(start))),
            Some(b'\'') => return Err(SyntaxError::EmptyChar.at(self.span_from(start))),
            Some(b'\\') => match self.stream.get() {
                Some(b'n') => b'\n',
                Some(b't') => b'\t',
                Some(b'r') => b'\r',
                Some(b'\\') => b'\\',
                Some(b'\'') => b'\'',
                _ => return Err(SyntaxError::UnexpectedEscape.at(self.span_from(start))),
            },
            Some(b) => b,
        };
        match self.stream.get() {
            Some(b'\'') => {}
            None | Some(b'\n') => return Err(SyntaxError::UnterminatedChar.at(self.span_from(start))),
            Some(_) => return Err(SyntaxError::MultiByteChar.at(self.span_from(start))),
        }
        Ok(Token::with_value(TokenKind::CharLit, self.span_from(start), TokenValue::Char(byte)))
    }

    /// Escapes stay in the text as written and count as one byte each.
    fn scan_string(&mut self, start: BytePos) -> LexResult<Token> {
        let mut text = Vec::new();
        let mut len = 0;
        loop {
            match self.stream.get() {
                None => return Err(SyntaxError::UnterminatedString.at(self.span_from(start))),
                Some(b'"') => break,
                Some(b'\\') => {
                    let Some(escaped) = self.stream.get() else {
                        return Err(SyntaxError::UnterminatedString.at(self.span_from(start)));
                    };
                    text.extend_from_slice(&[b'\\', escaped]);
                }
                Some(b'\n') => text.extend_from_slice(b"\\n"),
                Some(b) => text.push(b),
            }
            len += 1;
        }
        Ok(self.string_token(start, text, len))
    }

    fn scan_raw_string(&mut self, start: BytePos) -> LexResult<Token> {
        let mut text = Vec::new();
        let mut len = 0;
        loop {
            match self.stream.get() {
                None => return Err(SyntaxError::UnterminatedRawString.at(self.span_from(start))),
                Some(b'`') => break,
                Some(b'"') => text.extend_from_slice(b"\\\""),
                Some(b'\n') => text.extend_from_slice(b"\\n"),
                Some(b'\\') => text.extend_from_slice(b"\\\\"),
                Some(b) => text.push(b),
            }
            len += 1;
        }
        Ok(self.string_token(start, text, len))
    }

    fn string_token(&self, start: BytePos, text: Vec<u8>, len: usize) -> Token {
        let text = String::from_utf8_lossy(&text).into_owned();
        Token::with_value(
            TokenKind::StringLit,
            self.span_from(start),
            TokenValue::Str { text, len },
        )
    }

    #[inline]
    fn span_from(&self, start: BytePos) -> Span {
        Span::new(start, self.stream.pos())
    }
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(source: &str, base: u32) -> LexResult<Vec<Token>> {
    Lexer::new(source, base).tokenize()
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        tokenize(source, 0).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(source: &str) -> Diagnostic {
        tokenize(source, 0).unwrap_err()
    }

    fn values(source: &str) -> Vec<TokenValue> {
        tokenize(source, 0)
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .filter(|v| *v != TokenValue::None)
            .collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex("  \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            lex("func main_2 range"),
            vec![
                TokenKind::Func,
                TokenKind::Ident,
                TokenKind::Range,
                TokenKind::Eof
            ]
        );
        assert_eq!(values("foo _bar"), vec![
            TokenValue::Ident("foo".into()),
            TokenValue::Ident("_bar".into()),
        ]);
    }

    #[test]
    fn test_integers() {
        assert_eq!(values("0 42 1234567"), vec![
            TokenValue::Int(0),
            TokenValue::Int(42),
            TokenValue::Int(1234567),
        ]);
        assert_eq!(lex_err("99999999999999999999").code, Some(1040));
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(values(r"'a' '\n' '\\' '\''"), vec![
            TokenValue::Char(b'a'),
            TokenValue::Char(b'\n'),
            TokenValue::Char(b'\\'),
            TokenValue::Char(b'\''),
        ]);
    }

    #[test]
    fn test_char_literal_errors() {
        assert_eq!(lex_err(r"'\q'").code, Some(SyntaxError::UnexpectedEscape.code()));
        assert_eq!(lex_err("''").code, Some(SyntaxError::EmptyChar.code()));
        assert_eq!(lex_err("'ab'").code, Some(SyntaxError::MultiByteChar.code()));
        assert_eq!(lex_err("'a").code, Some(SyntaxError::UnterminatedChar.code()));
    }

    #[test]
    fn test_string_keeps_escapes() {
        assert_eq!(values(r#""hi\n""#), vec![TokenValue::Str {
            text: r"hi\n".into(),
            len: 3,
        }]);
        assert_eq!(lex_err("\"abc").code, Some(SyntaxError::UnterminatedString.code()));
    }

    #[test]
    fn test_raw_string_escaping() {
        assert_eq!(values("`a\"b\nc`"), vec![TokenValue::Str {
            text: "a\\\"b\\nc".into(),
            len: 5,
        }]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("+ ++ += && || <- << <<= &^ == != <= >= := ... !"),
            vec![
                TokenKind::Plus,
                TokenKind::PlusPlus,
                TokenKind::PlusAssign,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Arrow,
                TokenKind::Shl,
                TokenKind::ShlAssign,
                TokenKind::AmpCaret,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::ColonAssign,
                TokenKind::Ellipsis,
                TokenKind::Not,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_double_dot_is_error() {
        assert_eq!(lex_err("a..b").code, Some(SyntaxError::DoubleDot.code()));
    }

    #[test]
    fn test_unknown_byte_is_error() {
        let diag = lex_err("x := $");
        assert_eq!(diag.code, Some(SyntaxError::UnexpectedChar.code()));
    }

    #[test]
    fn test_semicolon_insertion() {
        assert_eq!(
            lex("x\ny"),
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            lex("x +\ny"),
            vec![
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            lex("return\n}"),
            vec![
                TokenKind::Return,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("a // trailing\nb /* inline */ c"),
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            lex("a /* one\ntwo */ b"),
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert_eq!(lex_err("/* open").code, Some(SyntaxError::UnterminatedBlockComment.code()));
    }

    #[test]
    fn test_spans_use_base() {
        let tokens = tokenize("ab cd", 100).unwrap();
        assert_eq!(tokens[1].span, Span::from_u32(103, 105));
    }
}
