//! Byte positions and spans in the global position space.
//!
//! Every source file added to a [`SourceMap`](crate::source::SourceMap) gets
//! its own base offset, so a `Span` alone identifies both the file and the
//! location inside it.

use std::fmt;
use std::ops::Range;

/// An absolute byte position in the global position space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BytePos(pub u32);

impl BytePos {
    #[inline]
    pub const fn new(pos: u32) -> Self {
        Self(pos)
    }

    #[inline]
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for BytePos {
    #[inline]
    fn from(pos: u32) -> Self {
        Self(pos)
    }
}

impl fmt::Debug for BytePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BytePos({})", self.0)
    }
}

/// A half-open byte range `[start, end)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: BytePos,
    pub end: BytePos,
}

impl Span {
    #[inline]
    pub const fn new(start: BytePos, end: BytePos) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn from_u32(start: u32, end: u32) -> Self {
        Self {
            start: BytePos(start),
            end: BytePos(end),
        }
    }

    /// A span for compiler-generated nodes with no source location.
    #[inline]
    pub const fn dummy() -> Self {
        Self::from_u32(0, 0)
    }

    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.start.0 == 0 && self.end.0 == 0
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start.0 >= self.end.0
    }

    /// Smallest span containing both `self` and `other`.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: BytePos(self.start.0.min(other.start.0)),
            end: BytePos(self.end.0.max(other.end.0)),
        }
    }

    /// From the start of `self` to the end of `other`.
    #[inline]
    pub const fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }

    #[inline]
    pub const fn to_range(self) -> Range<usize> {
        self.start.to_usize()..self.end.to_usize()
    }
}

impl From<Range<u32>> for Span {
    #[inline]
    fn from(range: Range<u32>) -> Self {
        Self::from_u32(range.start, range.end)
    }
}

impl From<Range<usize>> for Span {
    #[inline]
    fn from(range: Range<usize>) -> Self {
        Self::from_u32(range.start as u32, range.end as u32)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

/// Anything that carries a source span.
pub trait Spanned {
    fn span(&self) -> Span;
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::from_u32(4, 8);
        let b = Span::from_u32(2, 6);
        assert_eq!(a.merge(b), Span::from_u32(2, 8));
        assert_eq!(b.to(a), Span::from_u32(2, 8));
    }

    #[test]
    fn test_span_len_and_empty() {
        assert_eq!(Span::from_u32(3, 10).len(), 7);
        assert!(Span::from_u32(5, 5).is_empty());
        assert!(Span::dummy().is_dummy());
    }

    #[test]
    fn test_span_from_range() {
        let span: Span = (1usize..4usize).into();
        assert_eq!(span.to_range(), 1..4);
    }
}
