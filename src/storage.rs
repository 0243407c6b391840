use std::marker::PhantomData;
use std::{fmt, slice};

/// A type usable as the key of a [`SparseMap`].
pub(crate) trait SparseIndex {
    fn sparse_index(&self) -> usize;
}

/// A map from a dense small index to values.
///
/// Lookup is a single slice index, which is what makes per-family tables
/// (arenas, event signals) cheap to address.
#[derive(Clone)]
pub(crate) struct SparseMap<I: SparseIndex, T> {
    inner: Vec<Option<T>>,
    count: usize,
    _index: PhantomData<I>,
}

impl<I: SparseIndex, T> SparseMap<I, T> {
    pub const fn new() -> Self {
        Self { inner: Vec::new(), count: 0, _index: PhantomData }
    }

    pub const fn len(&self) -> usize {
        self.count
    }

    pub fn get(&self, index: &I) -> Option<&T> {
        self.inner.get(index.sparse_index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: &I) -> Option<&mut T> {
        self.inner.get_mut(index.sparse_index()).and_then(Option::as_mut)
    }

    pub fn get_or_insert_with(
        &mut self,
        index: I,
        f: impl FnOnce() -> T,
    ) -> &mut T {
        let sparse = index.sparse_index();

        if self.get(&index).is_none() {
            self.insert(index, f());
        }

        // SAFETY: guaranteed to be filled by the above insert
        unsafe {
            self.inner.get_unchecked_mut(sparse).as_mut().unwrap_unchecked()
        }
    }

    /// Inserts a value, returning the previous one if the slot was filled.
    pub fn insert(&mut self, index: I, value: T) -> Option<T> {
        let sparse = index.sparse_index();

        if sparse >= self.inner.len() {
            self.inner.resize_with(sparse + 1, || None);
        }

        // SAFETY: guaranteed to exist due to the above resize
        let result =
            unsafe { self.inner.get_unchecked_mut(sparse) }.replace(value);

        if result.is_none() {
            self.count += 1;
        }

        result
    }

    /// Returns an iterator over the filled values in this map.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.inner.iter().filter_map(Option::as_ref)
    }

    /// Returns a mutable iterator over the filled values in this map.
    pub fn values_mut(&mut self) -> ValuesMut<'_, T> {
        ValuesMut { inner: self.inner.iter_mut() }
    }
}

pub(crate) struct ValuesMut<'a, T> {
    inner: slice::IterMut<'a, Option<T>>,
}

impl<'a, T> Iterator for ValuesMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(Option::as_mut)
            .and_then(|slot| slot.or_else(|| self.next()))
    }
}

impl<I: SparseIndex, T> Default for SparseMap<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: SparseIndex, T: fmt::Debug> fmt::Debug for SparseMap<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}
