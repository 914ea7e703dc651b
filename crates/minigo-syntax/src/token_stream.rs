//! Random-access cursor over a token vector.

use crate::token::{Token, TokenKind};

pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    /// `tokens` must end with an `Eof` token, as the tokenizer guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    /// The next token without consuming it. Sticks at `Eof`.
    #[inline]
    pub fn peek(&self) -> &Token {
        self.nth(0)
    }

    /// The token `n` positions ahead of the next one.
    pub fn nth(&self, n: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.index + n).min(last)]
    }

    #[inline]
    pub fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Consumes and returns the next token. Reading past the end keeps
    /// returning `Eof`.
    pub fn read(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    /// Steps back over the last consumed token.
    pub fn unread(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// The most recently consumed token.
    pub fn last(&self) -> Option<&Token> {
        self.index.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn test_read_peek_unread() {
        let mut ts = TokenStream::new(tokenize("a + b", 0).unwrap());
        assert_eq!(ts.peek_kind(), TokenKind::Ident);
        assert_eq!(ts.nth(1).kind, TokenKind::Plus);
        let a = ts.read();
        assert_eq!(a.ident(), "a");
        assert_eq!(ts.last().map(|t| t.kind), Some(TokenKind::Ident));
        ts.unread();
        assert_eq!(ts.read().ident(), "a");
    }

    #[test]
    fn test_sticks_at_eof() {
        let mut ts = TokenStream::new(tokenize("x", 0).unwrap());
        ts.read();
        ts.read();
        assert!(ts.is_eof());
        assert_eq!(ts.read().kind, TokenKind::Eof);
        assert_eq!(ts.read().kind, TokenKind::Eof);
    }
}
