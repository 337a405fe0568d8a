/// Open-addressing probing over the directory.
///
/// Linear probing with a power-of-two mask over an in-process
/// `Vec<SlotDescriptor>`.
use crate::slot::SlotDescriptor;

pub(crate) enum ProbeResult {
    /// A slot whose hash and key both match; overwrite its value in place.
    Found(usize),
    /// The directory index a new entry should be written to (either the
    /// first `EMPTY` slot seen, or the earliest tombstone passed over).
    Insert(usize),
}

/// Compare a probe key against a slot's stored key.
///
/// In string mode, `key_len` must match exactly before bytes are compared,
/// since entries can have different lengths. Fixed-size maps rely on the
/// caller-enforced key-size discipline instead — every stored key is
/// already known to be the same length, so the length check would be
/// redundant there.
///
/// # Safety
/// `slot.key_bytes()` requires any `Borrowed` key pointer still be valid.
#[inline]
unsafe fn keys_match(
    slot: &SlotDescriptor,
    probe_key: &[u8],
    string_keyed: bool,
    cmp_fn: Option<&(dyn Fn(&[u8], &[u8]) -> bool + Send + Sync)>,
) -> bool {
    if string_keyed && slot.key_len as usize != probe_key.len() {
        return false;
    }
    let stored = slot.key_bytes();
    match cmp_fn {
        Some(f) => f(stored, probe_key),
        None => stored == probe_key,
    }
}

/// Lookup probe: stop at the first `EMPTY` slot; tombstones are skipped,
/// not stopping points.
///
/// # Safety
/// Every `Borrowed` key pointer reachable from `dir` must still be valid.
pub(crate) unsafe fn find(
    dir: &[SlotDescriptor],
    hash_cap: usize,
    hash: u64,
    key: &[u8],
    string_keyed: bool,
    cmp_fn: Option<&(dyn Fn(&[u8], &[u8]) -> bool + Send + Sync)>,
) -> Option<usize> {
    let mask = hash_cap - 1;
    let mut idx = (hash as usize) & mask;

    for _ in 0..hash_cap {
        let slot = &dir[idx];
        if slot.is_empty() {
            return None;
        }
        if !slot.is_deleted() && slot.hash == hash && keys_match(slot, key, string_keyed, cmp_fn) {
            return Some(idx);
        }
        idx = (idx + 1) & mask;
    }
    None
}

/// Insert probe: the first `EMPTY` or `DELETED` slot seen is a candidate
/// insertion point, unless a hash+key match is found first (overwrite).
///
/// We remember the earliest tombstone seen and prefer it over a later
/// `EMPTY` slot, shortening future probe chains without changing which
/// entry an insert lands on.
///
/// # Safety
/// Every `Borrowed` key pointer reachable from `dir` must still be valid.
pub(crate) unsafe fn insert_or_find(
    dir: &[SlotDescriptor],
    hash_cap: usize,
    hash: u64,
    key: &[u8],
    string_keyed: bool,
    cmp_fn: Option<&(dyn Fn(&[u8], &[u8]) -> bool + Send + Sync)>,
) -> ProbeResult {
    let mask = hash_cap - 1;
    let mut idx = (hash as usize) & mask;
    let mut first_tombstone: Option<usize> = None;

    for _ in 0..hash_cap {
        let slot = &dir[idx];
        if slot.is_empty() {
            return ProbeResult::Insert(first_tombstone.unwrap_or(idx));
        }
        if slot.is_deleted() {
            if first_tombstone.is_none() {
                first_tombstone = Some(idx);
            }
        } else if slot.hash == hash && keys_match(slot, key, string_keyed, cmp_fn) {
            return ProbeResult::Found(idx);
        }
        idx = (idx + 1) & mask;
    }

    // Unreachable under the load-factor invariant (grow runs before the
    // directory could ever fill up); fall back to the last slot visited
    // rather than panicking, in case a caller disables growth entirely.
    ProbeResult::Insert(first_tombstone.unwrap_or(idx))
}

/// Place `hash` at its first empty slot in a freshly-allocated directory
/// during rehash. No key comparison is needed: every surviving entry is
/// already known-unique, and tombstones are filtered out before this is
/// called.
pub(crate) fn rehash_insert(dir: &[SlotDescriptor], hash_cap: usize, hash: u64) -> usize {
    let mask = hash_cap - 1;
    let mut idx = (hash as usize) & mask;
    loop {
        if dir[idx].is_empty() {
            return idx;
        }
        idx = (idx + 1) & mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_dir(cap: usize) -> Vec<SlotDescriptor> {
        (0..cap).map(|_| SlotDescriptor::empty()).collect()
    }

    #[test]
    fn find_on_empty_directory_is_none() {
        let dir = fresh_dir(8);
        let found = unsafe { find(&dir, 8, 123, b"k", false, None) };
        assert!(found.is_none());
    }

    #[test]
    fn insert_then_find_round_trips() {
        let mut dir = fresh_dir(8);
        let hash = 42u64;
        let key = b"abcdefgh1234";
        let slot_idx = match unsafe { insert_or_find(&dir, 8, hash, key, false, None) } {
            ProbeResult::Insert(i) => i,
            ProbeResult::Found(_) => panic!("expected Insert on empty directory"),
        };
        dir[slot_idx] = SlotDescriptor {
            hash,
            data_idx: 0,
            key_len: key.len() as i32,
            key: crate::slot::SlotKey::Owned(key.to_vec().into_boxed_slice()),
        };
        let found = unsafe { find(&dir, 8, hash, key, false, None) };
        assert_eq!(found, Some(slot_idx));
    }
}
