/// Directory slot descriptors and the key-storage discriminator.
///
/// One [`SlotDescriptor`] per directory cell: a hash, a data index (or one
/// of the two sentinels), and the key bytes needed to confirm a probe hit.
/// Which storage a key uses (inline, owned, or caller-managed) is tracked
/// per slot as a tagged enum rather than a union discriminator.

/// Sentinel meaning "this directory slot has never held an entry".
pub(crate) const EMPTY: i32 = i32::MAX;
/// Sentinel meaning "this directory slot held an entry that has since been deleted".
pub(crate) const DELETED: i32 = i32::MAX - 1;

/// Where a slot's key bytes actually live.
pub(crate) enum SlotKey {
    /// Keys of at most 8 bytes are copied into the slot itself; no allocation.
    Inline([u8; 8]),
    /// Keys longer than 8 bytes are copied into map-owned heap storage.
    Owned(Box<[u8]>),
    /// `user_managed_keys`: the caller owns the backing memory; the map only
    /// ever reads through this pointer and never frees it directly (the
    /// `free_key_fn` hook does that, if supplied).
    Borrowed(*const u8),
}

pub(crate) struct SlotDescriptor {
    pub hash: u64,
    pub data_idx: i32,
    pub key_len: i32,
    pub key: SlotKey,
}

impl SlotDescriptor {
    /// A fresh, never-occupied slot.
    pub fn empty() -> Self {
        SlotDescriptor {
            hash: 0,
            data_idx: EMPTY,
            key_len: 0,
            key: SlotKey::Inline([0; 8]),
        }
    }

    /// A tombstone left behind by delete. Key storage is irrelevant once
    /// `data_idx == DELETED`; the inline variant keeps this variant
    /// allocation-free.
    pub fn tombstone() -> Self {
        SlotDescriptor {
            hash: 0,
            data_idx: DELETED,
            key_len: 0,
            key: SlotKey::Inline([0; 8]),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data_idx == EMPTY
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.data_idx == DELETED
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        !self.is_empty() && !self.is_deleted()
    }

    /// Borrow the stored key bytes.
    ///
    /// # Safety
    /// For `SlotKey::Borrowed`, the caller-owned memory the pointer refers
    /// to must still be valid for at least `self.key_len` bytes.
    #[inline]
    pub unsafe fn key_bytes(&self) -> &[u8] {
        match &self.key {
            SlotKey::Inline(buf) => &buf[..self.key_len as usize],
            SlotKey::Owned(bytes) => bytes,
            SlotKey::Borrowed(ptr) => std::slice::from_raw_parts(*ptr, self.key_len as usize),
        }
    }
}
