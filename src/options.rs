/// Options record and allocator hook.
///
/// A builder over boxed closures for the pluggable hash, comparator, and
/// key-free callbacks. The `Allocator` trait stands in for a raw
/// allocation hook: `Vec<T>` already owns its allocation, so the hook's
/// real job is letting tests deterministically simulate allocation
/// failure.
use crate::error::MapError;

/// Hook consulted before the map grows its value array and directory.
/// Return `Err` to simulate allocation failure.
pub trait Allocator: Send + Sync {
    fn try_reserve(&self, new_capacity: usize) -> Result<(), MapError>;
}

/// Default allocator: always succeeds, deferring to the global allocator
/// via `Vec::try_reserve` at the actual allocation site.
#[derive(Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn try_reserve(&self, _new_capacity: usize) -> Result<(), MapError> {
        Ok(())
    }
}

type HashFn = dyn Fn(&[u8]) -> u64 + Send + Sync;
type CmpFn = dyn Fn(&[u8], &[u8]) -> bool + Send + Sync;
type FreeKeyFn = dyn Fn(*const u8) + Send + Sync;

pub struct MapOptions {
    pub(crate) initial_capacity: usize,
    pub(crate) user_managed_keys: bool,
    pub(crate) max_capacity: usize,
    pub(crate) seed: Option<u64>,
    hash_fn: Option<Box<HashFn>>,
    cmp_fn: Option<Box<CmpFn>>,
    free_key_fn: Option<Box<FreeKeyFn>>,
    allocator: Box<dyn Allocator>,
}

impl Default for MapOptions {
    fn default() -> Self {
        MapOptions {
            initial_capacity: 16,
            user_managed_keys: false,
            // Hard cap sits one below DELETED's sentinel value.
            max_capacity: (i32::MAX - 2) as usize,
            seed: None,
            hash_fn: None,
            cmp_fn: None,
            free_key_fn: None,
            allocator: Box::new(SystemAllocator),
        }
    }
}

impl MapOptions {
    pub(crate) fn hash_fn(&self) -> Option<&HashFn> {
        self.hash_fn.as_deref()
    }

    pub(crate) fn cmp_fn(&self) -> Option<&CmpFn> {
        self.cmp_fn.as_deref()
    }

    pub(crate) fn free_key_fn(&self) -> Option<&FreeKeyFn> {
        self.free_key_fn.as_deref()
    }

    pub(crate) fn allocator(&self) -> &dyn Allocator {
        self.allocator.as_ref()
    }
}

/// Builder for [`MapOptions`].
#[derive(Default)]
pub struct MapOptionsBuilder(MapOptions);

impl MapOptionsBuilder {
    pub fn new() -> Self {
        Self(MapOptions::default())
    }

    pub fn initial_capacity(mut self, n: usize) -> Self {
        self.0.initial_capacity = n;
        self
    }

    pub fn max_capacity(mut self, n: usize) -> Self {
        self.0.max_capacity = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = Some(seed);
        self
    }

    pub fn hash_fn(mut self, f: impl Fn(&[u8]) -> u64 + Send + Sync + 'static) -> Self {
        self.0.hash_fn = Some(Box::new(f));
        self
    }

    pub fn cmp_fn(mut self, f: impl Fn(&[u8], &[u8]) -> bool + Send + Sync + 'static) -> Self {
        self.0.cmp_fn = Some(Box::new(f));
        self
    }

    /// Supplying a free-key hook implies `user_managed_keys`: there would
    /// be nothing for it to free otherwise.
    pub fn free_key_fn(mut self, f: impl Fn(*const u8) + Send + Sync + 'static) -> Self {
        self.0.free_key_fn = Some(Box::new(f));
        self.0.user_managed_keys = true;
        self
    }

    pub fn allocator(mut self, allocator: impl Allocator + 'static) -> Self {
        self.0.allocator = Box::new(allocator);
        self
    }

    pub fn build(self) -> MapOptions {
        self.0
    }
}
