//! Append-only arena storage with typed keys.
//!
//! Compiler entities (variables, constants, functions, types, scopes) live in
//! arenas owned by the program and are referenced by small copyable keys.
//! There is no removal.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for typed arena keys.
pub trait ArenaKey: Copy + Eq + std::hash::Hash + std::fmt::Debug {
    fn from_usize(idx: usize) -> Self;
    fn as_usize(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct Arena<K: ArenaKey, V> {
    vec: Vec<V>,
    _marker: PhantomData<K>,
}

impl<K: ArenaKey, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Arena<K, V> {
    pub fn new() -> Self {
        Self {
            vec: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Inserts a value and returns its key.
    #[inline]
    pub fn insert(&mut self, value: V) -> K {
        let idx = self.vec.len();
        self.vec.push(value);
        K::from_usize(idx)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.vec.get(key.as_usize())
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.vec.get_mut(key.as_usize())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = K> {
        (0..self.vec.len()).map(K::from_usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.vec
            .iter()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.vec
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }
}

impl<K: ArenaKey, V> Index<K> for Arena<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &Self::Output {
        &self.vec[key.as_usize()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for Arena<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        &mut self.vec[key.as_usize()]
    }
}

/// Defines typed arena keys.
#[macro_export]
macro_rules! define_key {
    ($($(#[$attr:meta])* $vis:vis struct $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[repr(transparent)]
            $vis struct $name(u32);

            impl $name {
                #[inline]
                pub const fn new(idx: u32) -> Self {
                    Self(idx)
                }

                #[inline]
                pub const fn raw(&self) -> u32 {
                    self.0
                }
            }

            impl $crate::arena::ArenaKey for $name {
                #[inline]
                fn from_usize(idx: usize) -> Self {
                    Self(idx as u32)
                }

                #[inline]
                fn as_usize(&self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_key! {
        struct TestKey;
    }

    #[test]
    fn test_insert_and_index() {
        let mut arena: Arena<TestKey, &str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
        assert_eq!(b.raw(), 1);
    }

    #[test]
    fn test_iter_keeps_insertion_order() {
        let mut arena: Arena<TestKey, u32> = Arena::new();
        for v in [10, 20, 30] {
            arena.insert(v);
        }
        arena[TestKey::new(1)] += 1;
        let values: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 21, 30]);
        assert!(arena.get(TestKey::new(9)).is_none());
    }
}
