//! Byte cursor over a source file with single-step push-back.

use minigo_common::BytePos;

pub struct ByteStream<'src> {
    bytes: &'src [u8],
    /// Local offset of the next byte.
    offset: usize,
    /// Global position of `bytes[0]`.
    base: u32,
}

impl<'src> ByteStream<'src> {
    pub fn new(source: &'src str, base: u32) -> Self {
        Self {
            bytes: source.as_bytes(),
            offset: 0,
            base,
        }
    }

    /// Reads one byte, or `None` at end of input.
    #[inline]
    pub fn get(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.offset)?;
        self.offset += 1;
        Some(b)
    }

    /// Pushes back the byte most recently read.
    #[inline]
    pub fn unget(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    /// Looks `n` bytes past the next one.
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.offset + n).copied()
    }

    /// Consumes the next byte if it equals `expected`.
    #[inline]
    pub fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    /// Global position of the next byte.
    #[inline]
    pub fn pos(&self) -> BytePos {
        BytePos::new(self.base + self.offset as u32)
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Source text between two global positions.
    pub fn slice(&self, start: BytePos, end: BytePos) -> &'src str {
        let lo = (start.to_u32() - self.base) as usize;
        let hi = (end.to_u32() - self.base) as usize;
        std::str::from_utf8(&self.bytes[lo..hi]).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_unget() {
        let mut s = ByteStream::new("ab", 10);
        assert_eq!(s.get(), Some(b'a'));
        assert_eq!(s.pos(), BytePos::new(11));
        s.unget();
        assert_eq!(s.get(), Some(b'a'));
        assert_eq!(s.get(), Some(b'b'));
        assert_eq!(s.get(), None);
        assert!(s.is_eof());
    }

    #[test]
    fn test_peek_and_eat() {
        let mut s = ByteStream::new(":=", 0);
        assert_eq!(s.peek_nth(1), Some(b'='));
        assert!(!s.eat(b'='));
        assert!(s.eat(b':'));
        assert!(s.eat(b'='));
        assert_eq!(s.peek(), None);
    }

    #[test]
    fn test_slice() {
        let mut s = ByteStream::new("hello world", 5);
        let start = s.pos();
        for _ in 0..5 {
            s.get();
        }
        assert_eq!(s.slice(start, s.pos()), "hello");
    }
}
