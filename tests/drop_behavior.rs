//! Confirms map-owned heap key bytes and value cells are each dropped
//! exactly once: overwriting a slot drops the old value immediately,
//! reusing a freed slot drops whatever value was still resident there, and
//! nothing outlives (or is dropped twice by) the map itself.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use stablemap::RawMap;

/// Wraps the system allocator to track live allocation count, so a test can
/// assert "every byte allocated on this map's behalf was freed" without
/// needing a per-byte drop hook (raw key bytes have none).
struct CountingAllocator {
    net_allocs: AtomicI64,
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.net_allocs.fetch_add(1, Ordering::SeqCst);
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.net_allocs.fetch_sub(1, Ordering::SeqCst);
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator {
    net_allocs: AtomicI64::new(0),
};

#[test]
fn long_keys_leave_no_outstanding_allocations_after_drop() {
    let before = ALLOCATOR.net_allocs.load(Ordering::SeqCst);

    {
        let mut m: RawMap<i32> = RawMap::new_string_keyed();
        let keys: Vec<Vec<u8>> = (0..200usize)
            .map(|i| format!("a fairly long key that forces heap storage #{i}").into_bytes())
            .collect();

        for (i, k) in keys.iter().enumerate() {
            m.insert(k, i as i32);
        }
        for k in keys.iter().step_by(2) {
            m.delete(k);
        }
        // `m` and `keys` both drop at the end of this block.
    }

    let after = ALLOCATOR.net_allocs.load(Ordering::SeqCst);
    assert_eq!(
        before, after,
        "map-owned key storage must be fully freed once the map and its keys go out of scope"
    );
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn value_cells_drop_exactly_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mut created = 0usize;

    {
        let mut m: RawMap<DropCounter> = RawMap::new();
        for i in 0..10u64 {
            m.insert(&i.to_ne_bytes(), DropCounter(Arc::clone(&drops)));
            created += 1;
        }
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        // Overwriting an occupied slot must drop the old value immediately,
        // not defer it until the map drops.
        m.insert(&0u64.to_ne_bytes(), DropCounter(Arc::clone(&drops)));
        created += 1;
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        // Deleting only tombstones the directory slot; the value cell
        // itself stays resident (the value array never shrinks) until the
        // slot is legitimately reused or the map drops.
        m.delete(&1u64.to_ne_bytes());
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        // Reusing the freed slot drops whatever value was still sitting
        // there.
        m.insert(&99u64.to_ne_bytes(), DropCounter(Arc::clone(&drops)));
        created += 1;
        assert_eq!(drops.load(Ordering::SeqCst), 2);

        assert_eq!(m.len(), 10);
    }

    // Every `DropCounter` ever stored must have dropped exactly once by
    // now: 2 from the overwrite/reuse above, plus one per value still
    // resident when the map itself dropped.
    assert_eq!(drops.load(Ordering::SeqCst), created);
}
