use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use crate::hash::FastHasher;
use crate::label::Label;

/// Canonical hash of a label set, optionally restricted to a subset of names.
/// Used as the join key for vector matching and as the group key for aggregation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Copy, Ord, PartialOrd)]
pub struct Signature(u64);

/// implement hash which returns the value of the inner u64
impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Deref for Signature {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

const EMPTY_LIST_SIGNATURE: u64 = 0x9e3779b97f4a7c15;

impl Signature {
    /// Signature of the labels yielded by `iter`. The caller is responsible for
    /// yielding labels in a canonical (name-sorted) order.
    pub fn from_labels<'a>(iter: impl Iterator<Item = &'a Label>) -> Self {
        let mut hasher = FastHasher::default();
        let mut has_labels = false;
        for label in iter {
            label.hash(&mut hasher);
            has_labels = true;
        }
        if !has_labels {
            hasher.write_u64(EMPTY_LIST_SIGNATURE);
        }
        Signature(hasher.finish())
    }

    pub fn from_pair(left: Signature, right: Signature) -> Self {
        let mut hasher = FastHasher::default();
        hasher.write_u64(left.0);
        hasher.write_u64(right.0);
        Signature(hasher.finish())
    }

    pub fn from_iter<'a, T: Hash + 'a>(iter: impl Iterator<Item = &'a T>) -> Self {
        let mut hasher = FastHasher::default();
        for item in iter {
            item.hash(&mut hasher);
        }
        Signature(hasher.finish())
    }

    pub fn empty() -> Self {
        Self::from_labels(std::iter::empty())
    }
}

impl From<Signature> for u64 {
    fn from(sig: Signature) -> Self {
        sig.0
    }
}

impl From<u64> for Signature {
    fn from(sig: u64) -> Self {
        Signature(sig)
    }
}
