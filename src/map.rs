/// The byte-keyed map facade: `insert`/`get_idx`/`getp`/`delete`/`range`/
/// `count`/`free`, plus the growth/rehash protocol.
///
/// Keys are always `&[u8]` here, and (outside of string mode) the map
/// commits to a key size at runtime on first insert. The generic,
/// ergonomic `Map<K, V>` in `crate::generic` is a thin wrapper around this
/// that recovers static typing for callers who don't need runtime-checked
/// byte keys.
use crate::directory::{self, ProbeResult};
use crate::error::{self, MapError};
use crate::freelist::FreeList;
use crate::hash;
use crate::index::Index;
use crate::options::MapOptions;
use crate::slot::{SlotDescriptor, SlotKey};

/// Whether the map has committed to a key length yet, for non-string maps.
enum KeySize {
    Unset,
    Fixed(i32),
}

pub struct RawMap<V> {
    directory: Vec<SlotDescriptor>,
    hash_cap: usize,
    values: Vec<V>,
    cap: usize,
    free_list: FreeList,
    len: usize,
    string_keyed: bool,
    key_size: KeySize,
    seed: u64,
    options: MapOptions,
}

/// Smallest power of two whose 0.5x load factor accommodates `initial_capacity`
/// items.
fn initial_hash_cap(initial_capacity: usize) -> usize {
    let needed = (initial_capacity as f64 / 0.5).ceil() as usize;
    needed.max(2).next_power_of_two()
}

impl<V> RawMap<V> {
    /// A map whose key size is determined by the first insert and enforced
    /// thereafter.
    pub fn new() -> Self {
        Self::with_options(MapOptions::default(), false)
    }

    /// A map whose keys are variable-length. Only per-entry `key_len`
    /// equality is enforced, never a map-wide fixed size.
    pub fn new_string_keyed() -> Self {
        Self::with_options(MapOptions::default(), true)
    }

    pub fn with_options(options: MapOptions, string_keyed: bool) -> Self {
        let seed = options.seed.unwrap_or_else(hash::default_seed);
        let hash_cap = initial_hash_cap(options.initial_capacity);
        let cap = hash_cap / 2;
        let directory = (0..hash_cap).map(|_| SlotDescriptor::empty()).collect();

        RawMap {
            directory,
            hash_cap,
            values: Vec::new(),
            cap,
            free_list: FreeList::new(),
            len: 0,
            string_keyed,
            key_size: KeySize::Unset,
            seed,
            options,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `len + |free list|`: the data-array iteration upper bound, since
    /// freed slots still occupy a position below this.
    #[inline]
    pub fn range_len(&self) -> usize {
        self.len + self.free_list.len()
    }

    fn hash_key(&self, key: &[u8]) -> u64 {
        match self.options.hash_fn() {
            Some(f) => f(key),
            None => hash::hash_bytes(self.seed, key),
        }
    }

    fn check_key_size(&mut self, key_len: usize) -> Result<(), MapError> {
        if self.string_keyed {
            return Ok(());
        }
        match self.key_size {
            KeySize::Unset => {
                self.key_size = KeySize::Fixed(key_len as i32);
                Ok(())
            }
            KeySize::Fixed(n) if n as usize == key_len => Ok(()),
            KeySize::Fixed(n) => Err(MapError::KeySizeMismatch {
                expected: n,
                got: key_len,
            }),
        }
    }

    /// Same check for read-only operations: an unset key size can never
    /// match anything, so `get`/`delete` on a never-inserted-into fixed
    /// map just report "not found" instead of erroring.
    fn checked_key_len(&self, key_len: usize) -> Result<bool, MapError> {
        if self.string_keyed {
            return Ok(true);
        }
        match self.key_size {
            KeySize::Unset => Ok(false),
            KeySize::Fixed(n) if n as usize == key_len => Ok(true),
            KeySize::Fixed(n) => Err(MapError::KeySizeMismatch {
                expected: n,
                got: key_len,
            }),
        }
    }

    fn make_slot_key(&self, key: &[u8]) -> SlotKey {
        if self.options.user_managed_keys {
            SlotKey::Borrowed(key.as_ptr())
        } else if key.len() <= 8 {
            let mut buf = [0u8; 8];
            buf[..key.len()].copy_from_slice(key);
            SlotKey::Inline(buf)
        } else {
            SlotKey::Owned(key.to_vec().into_boxed_slice())
        }
    }

    fn ensure_capacity(&mut self) -> Result<(), MapError> {
        if self.len + 1 <= self.cap {
            return Ok(());
        }
        self.grow()
    }

    /// Double the directory, re-probe every live entry into it (dropping
    /// tombstones), preserve data indices and value bytes verbatim.
    fn grow(&mut self) -> Result<(), MapError> {
        let new_hash_cap = self.hash_cap * 2;
        let new_cap = new_hash_cap / 2;

        if new_hash_cap > (i32::MAX as usize - 2) || new_cap > self.options.max_capacity {
            return Err(MapError::CapacityExceeded {
                requested: new_cap,
                max: self.options.max_capacity,
            });
        }

        self.options.allocator().try_reserve(new_cap)?;
        self.values
            .try_reserve(new_cap.saturating_sub(self.values.len()))
            .map_err(|_| MapError::AllocationFailure)?;

        let mut new_directory: Vec<SlotDescriptor> = Vec::new();
        new_directory
            .try_reserve_exact(new_hash_cap)
            .map_err(|_| MapError::AllocationFailure)?;
        new_directory.extend((0..new_hash_cap).map(|_| SlotDescriptor::empty()));

        for slot in self.directory.drain(..) {
            if slot.is_occupied() {
                let idx = directory::rehash_insert(&new_directory, new_hash_cap, slot.hash);
                new_directory[idx] = slot;
            }
            // EMPTY and DELETED slots are dropped; only live entries carry
            // forward into the new directory.
        }

        self.directory = new_directory;
        self.hash_cap = new_hash_cap;
        self.cap = new_cap;
        log::debug!(
            "stablemap: grew directory to hash_cap={} cap={}",
            self.hash_cap,
            self.cap
        );
        Ok(())
    }

    /// Insert or overwrite; returns the stable data index.
    ///
    /// Maps configured with `user_managed_keys` (i.e. a `free_key_fn` was
    /// supplied) must go through [`try_insert_borrowed`] instead: that path
    /// is the only one that documents the caller's obligation to keep the
    /// key buffer alive. This method refuses rather than silently storing a
    /// pointer a safe caller never promised to keep valid.
    ///
    /// [`try_insert_borrowed`]: RawMap::try_insert_borrowed
    pub fn try_insert(&mut self, key: &[u8], value: V) -> Result<Index, MapError> {
        if self.options.user_managed_keys {
            return Err(MapError::RequiresUnsafeInsert);
        }
        self.insert_impl(key, value)
    }

    fn insert_impl(&mut self, key: &[u8], value: V) -> Result<Index, MapError> {
        self.check_key_size(key.len())?;
        self.ensure_capacity()?;

        let hash = self.hash_key(key);
        let probe = unsafe {
            directory::insert_or_find(
                &self.directory,
                self.hash_cap,
                hash,
                key,
                self.string_keyed,
                self.options.cmp_fn(),
            )
        };

        match probe {
            ProbeResult::Found(slot_idx) => {
                let data_idx = self.directory[slot_idx].data_idx;
                self.values[data_idx as usize] = value;
                Ok(Index(data_idx))
            }
            ProbeResult::Insert(slot_idx) => {
                let data_idx = match self.free_list.pop() {
                    Some(i) => {
                        self.values[i as usize] = value;
                        i
                    }
                    None => {
                        let i = self.values.len() as i32;
                        self.values.push(value);
                        i
                    }
                };

                self.directory[slot_idx] = SlotDescriptor {
                    hash,
                    data_idx,
                    key_len: key.len() as i32,
                    key: self.make_slot_key(key),
                };
                self.len += 1;
                Ok(Index(data_idx))
            }
        }
    }

    /// Infallible counterpart: fires the process-wide error hook (and then
    /// panics) instead of returning `Err`.
    pub fn insert(&mut self, key: &[u8], value: V) -> Index {
        match self.try_insert(key, value) {
            Ok(idx) => idx,
            Err(e) => error::fire(e),
        }
    }

    /// Pure lookup, no mutation.
    pub fn try_get_idx(&self, key: &[u8]) -> Result<Option<Index>, MapError> {
        if !self.checked_key_len(key.len())? {
            return Ok(None);
        }
        let hash = self.hash_key(key);
        let found = unsafe {
            directory::find(
                &self.directory,
                self.hash_cap,
                hash,
                key,
                self.string_keyed,
                self.options.cmp_fn(),
            )
        };
        Ok(found.map(|slot_idx| Index(self.directory[slot_idx].data_idx)))
    }

    pub fn get_idx(&self, key: &[u8]) -> Option<Index> {
        match self.try_get_idx(key) {
            Ok(idx) => idx,
            Err(e) => error::fire(e),
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.get_idx(key).map(|idx| &self.values[idx.get()])
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let idx = self.get_idx(key)?;
        self.values.get_mut(idx.get())
    }

    pub fn get_by_index(&self, idx: Index) -> Option<&V> {
        self.values.get(idx.get())
    }

    pub fn get_mut_by_index(&mut self, idx: Index) -> Option<&mut V> {
        self.values.get_mut(idx.get())
    }

    /// Raw pointer lookup for FFI-adjacent callers who need the address
    /// itself rather than a borrow-checked reference.
    ///
    /// # Safety
    /// The returned pointer is valid only until the next mutating call
    /// (`insert`/`delete`, or anything that may trigger growth) on this map.
    pub unsafe fn getp_raw(&self, key: &[u8]) -> *const V {
        match self.get_idx(key) {
            Some(idx) => &self.values[idx.get()] as *const V,
            None => std::ptr::null(),
        }
    }

    fn free_owned_key(&self, descriptor: SlotDescriptor) {
        if let SlotKey::Borrowed(ptr) = &descriptor.key {
            if let Some(hook) = self.options.free_key_fn() {
                hook(*ptr);
            }
        }
        // `SlotKey::Owned`'s `Box<[u8]>` frees automatically when
        // `descriptor` drops here; `Inline` needs nothing.
    }

    /// Tombstone the directory slot, recycle the data index.
    pub fn try_delete(&mut self, key: &[u8]) -> Result<Option<Index>, MapError> {
        if !self.checked_key_len(key.len())? {
            return Ok(None);
        }
        let hash = self.hash_key(key);
        let found = unsafe {
            directory::find(
                &self.directory,
                self.hash_cap,
                hash,
                key,
                self.string_keyed,
                self.options.cmp_fn(),
            )
        };
        let slot_idx = match found {
            Some(i) => i,
            None => return Ok(None),
        };

        let data_idx = self.directory[slot_idx].data_idx;
        let old = std::mem::replace(&mut self.directory[slot_idx], SlotDescriptor::tombstone());
        self.free_owned_key(old);

        self.free_list.push(data_idx);
        self.len -= 1;
        Ok(Some(Index(data_idx)))
    }

    pub fn delete(&mut self, key: &[u8]) -> Option<Index> {
        match self.try_delete(key) {
            Ok(idx) => idx,
            Err(e) => error::fire(e),
        }
    }

    /// Insert using a caller-owned key buffer, storing only the pointer.
    /// The map never copies or frees these bytes itself; `options.free_key_fn`
    /// is invoked with the original pointer at delete or teardown.
    ///
    /// # Safety
    /// `key` must remain valid (unmoved, unfreed) for as long as this entry
    /// is live in the map, i.e. until a matching `delete` or until the map
    /// itself drops. The caller must have constructed this `RawMap` with
    /// `options.user_managed_keys == true` (e.g. via `free_key_fn`).
    pub unsafe fn try_insert_borrowed(
        &mut self,
        key: &[u8],
        value: V,
    ) -> Result<Index, MapError> {
        debug_assert!(
            self.options.user_managed_keys,
            "try_insert_borrowed called without user_managed_keys set"
        );
        self.insert_impl(key, value)
    }

    /// Every occupied slot's value, scanning the directory once.
    /// O(hash capacity), not O(1): there's no liveness bitmap over the raw
    /// value array, so this is a convenience layered on top, not a
    /// replacement for `range_len`.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.directory
            .iter()
            .filter(|s| s.is_occupied())
            .map(move |s| &self.values[s.data_idx as usize])
    }

    /// Mutable counterpart to [`values`].
    ///
    /// # Safety (internal)
    /// Every occupied slot's `data_idx` is unique — a data index belongs to
    /// at most one directory entry — so handing out one `&mut V` per live
    /// index is sound even though it's built from raw pointer arithmetic
    /// instead of a borrow-checked iterator chain.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        let live: Vec<usize> = self
            .directory
            .iter()
            .filter(|s| s.is_occupied())
            .map(|s| s.data_idx as usize)
            .collect();
        let base = self.values.as_mut_ptr();
        live.into_iter()
            .map(move |i| unsafe { &mut *base.add(i) })
    }
}

impl<V> Default for RawMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Drop for RawMap<V> {
    fn drop(&mut self) {
        // Teardown walks the directory to free owned key memory, invoking
        // the user's key-free hook for user-managed keys. `Owned` boxes
        // free themselves when `self.directory` drops right after this
        // runs.
        if let Some(hook) = self.options.free_key_fn() {
            for slot in &self.directory {
                if slot.is_occupied() {
                    if let SlotKey::Borrowed(ptr) = &slot.key {
                        hook(*ptr);
                    }
                }
            }
        }
    }
}
