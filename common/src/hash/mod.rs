use ahash::{AHashMap, AHashSet};
use xxhash_rust::xxh3::xxh3_64;

pub use signature::*;

mod signature;

/// Hasher used for label-set signatures. Seedless so that signatures are stable
/// for the lifetime of the process.
pub type FastHasher = xxhash_rust::xxh3::Xxh3;
pub type FastHashMap<K, V> = AHashMap<K, V>;
pub type FastHashSet<T> = AHashSet<T>;

pub fn fast_hash64(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}
