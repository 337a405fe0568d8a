/// Default 64-bit seeded hash and per-map seed generation.
///
/// The hash primitive is swappable (a map can be built with a custom
/// `hash_fn`); this module only supplies the default, using `ahash` seeded
/// per-map rather than process-wide so two maps never probe in lockstep.
use ahash::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sample a 64-bit seed from a monotonic-ish timestamp mixed with the
/// process id via an FNV-style multiplication chain.
pub(crate) fn default_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let pid = std::process::id() as u64;
    fnv_mix(nanos, pid)
}

fn fnv_mix(a: u64, b: u64) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut h = FNV_OFFSET;
    for byte in a.to_le_bytes().into_iter().chain(b.to_le_bytes()) {
        h ^= byte as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Hash `bytes` with the map's seed. Four identical seed lanes are fine
/// here: we aren't trying to defend against an adversary who knows the
/// seed, just to vary the hash across map instances.
pub(crate) fn hash_bytes(seed: u64, bytes: &[u8]) -> u64 {
    let state = RandomState::with_seeds(seed, seed, seed, seed);
    let mut hasher = state.build_hasher();
    hasher.write(bytes);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes_same_hash() {
        assert_eq!(hash_bytes(42, b"apple"), hash_bytes(42, b"apple"));
    }

    #[test]
    fn different_seeds_usually_differ() {
        assert_ne!(hash_bytes(1, b"apple"), hash_bytes(2, b"apple"));
    }

    #[test]
    fn seeds_are_not_trivially_constant() {
        let a = fnv_mix(123, 456);
        let b = fnv_mix(123, 457);
        assert_ne!(a, b);
    }
}
