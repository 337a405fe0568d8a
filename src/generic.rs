/// Typed facade over [`RawMap`]: recovers static key typing without giving
/// up the dual-array layout, free-list recycling, or stable indices
/// underneath.
use std::marker::PhantomData;
use std::ops::Range;

use crate::error::MapError;
use crate::index::Index;
use crate::key::MapKey;
use crate::map::RawMap;
use crate::options::{MapOptions, MapOptionsBuilder};

pub struct Map<K: MapKey + ?Sized, V> {
    inner: RawMap<V>,
    _key: PhantomData<fn(&K)>,
}

impl<K: MapKey + ?Sized, V> Map<K, V> {
    pub fn new() -> Self {
        Self::with_options(MapOptions::default())
    }

    /// Pre-size the directory for at least `capacity` entries, avoiding the
    /// early grows a default-capacity map would otherwise pay for up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_options(Self::options().initial_capacity(capacity).build())
    }

    /// A fresh options builder, for callers who want more than
    /// `with_capacity` gives them (seed, comparator, hash function, ...)
    /// before calling [`Map::with_options`].
    pub fn options() -> MapOptionsBuilder {
        MapOptionsBuilder::new()
    }

    pub fn with_options(options: MapOptions) -> Self {
        let string_keyed = K::FIXED_SIZE.is_none();
        Map {
            inner: RawMap::with_options(options, string_keyed),
            _key: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn range_len(&self) -> usize {
        self.inner.range_len()
    }

    /// The raw `0..range_len()` span of data indices, including any that
    /// currently sit on the free list. Unlike [`values`](Map::values), this
    /// does no liveness filtering — callers get the same "upper bound, you
    /// skip invalid cells yourself" contract as `range_len` itself, just as
    /// an iterable `Range` instead of a bare integer.
    pub fn iter_indices(&self) -> Range<usize> {
        0..self.inner.range_len()
    }

    pub fn try_insert(&mut self, key: &K, value: V) -> Result<Index, MapError> {
        self.inner.try_insert(&key.as_key_bytes(), value)
    }

    pub fn insert(&mut self, key: &K, value: V) -> Index {
        self.inner.insert(&key.as_key_bytes(), value)
    }

    pub fn index_of(&self, key: &K) -> Option<Index> {
        self.inner.get_idx(&key.as_key_bytes())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(&key.as_key_bytes())
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(&key.as_key_bytes())
    }

    pub fn get_by_index(&self, idx: Index) -> Option<&V> {
        self.inner.get_by_index(idx)
    }

    pub fn get_mut_by_index(&mut self, idx: Index) -> Option<&mut V> {
        self.inner.get_mut_by_index(idx)
    }

    pub fn delete(&mut self, key: &K) -> Option<Index> {
        self.inner.delete(&key.as_key_bytes())
    }

    pub fn try_delete(&mut self, key: &K) -> Result<Option<Index>, MapError> {
        self.inner.try_delete(&key.as_key_bytes())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.inner.values_mut()
    }
}

impl<K: MapKey + ?Sized, V> Default for Map<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_keyed_map_round_trips() {
        let mut m: Map<u64, &str> = Map::new();
        m.insert(&1, "one");
        m.insert(&2, "two");
        assert_eq!(m.get(&1), Some(&"one"));
        assert_eq!(m.get(&2), Some(&"two"));
        assert_eq!(m.get(&3), None);
    }

    #[test]
    fn string_keyed_map_allows_variable_length() {
        let mut m: Map<str, i32> = Map::new();
        m.insert("a", 1);
        m.insert("abc", 2);
        assert_eq!(m.get("a"), Some(&1));
        assert_eq!(m.get("abc"), Some(&2));
        m.delete("a");
        assert_eq!(m.get("a"), None);
        assert_eq!(m.get("abc"), Some(&2));
    }

    #[test]
    fn index_of_matches_insert_return() {
        let mut m: Map<u32, i32> = Map::new();
        let idx = m.insert(&7, 70);
        assert_eq!(m.index_of(&7), Some(idx));
        assert_eq!(m.get_by_index(idx), Some(&70));
    }

    #[test]
    fn with_capacity_avoids_early_growth() {
        let mut m: Map<u64, i32> = Map::with_capacity(64);
        for i in 0..64u64 {
            m.insert(&i, i as i32);
        }
        assert_eq!(m.len(), 64);
        for i in 0..64u64 {
            assert_eq!(m.get(&i), Some(&(i as i32)));
        }
    }

    #[test]
    fn options_builder_round_trips_through_with_options() {
        let opts = Map::<u64, i32>::options().initial_capacity(8).build();
        let mut m: Map<u64, i32> = Map::with_options(opts);
        m.insert(&1, 10);
        assert_eq!(m.get(&1), Some(&10));
    }

    #[test]
    fn iter_indices_spans_every_index_ever_returned() {
        let mut m: Map<str, i32> = Map::new();
        let mut max_idx = 0usize;
        for i in 0..20 {
            let key = format!("key-{i}");
            let idx = m.insert(&key, i);
            max_idx = max_idx.max(idx.get());
        }
        m.delete("key-0");
        let indices: Vec<usize> = m.iter_indices().collect();
        assert!(indices.contains(&max_idx));
        assert_eq!(indices, (0..m.range_len()).collect::<Vec<_>>());
    }
}
