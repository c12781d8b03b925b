use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// A bounded free list of vectors. Purely an allocation cache: `acquire` on an
/// empty pool allocates, and a full pool drops released vectors.
pub struct VecPool<T> {
    free: Mutex<Vec<Vec<T>>>,
    capacity: AtomicUsize,
}

impl<T> VecPool<T> {
    pub const fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity: AtomicUsize::new(capacity),
        }
    }

    /// Returns an empty vector with room for at least `capacity_hint` items.
    pub fn acquire(&self, capacity_hint: usize) -> Vec<T> {
        let pooled = match self.free.lock() {
            Ok(mut free) => free.pop(),
            Err(_) => None,
        };
        match pooled {
            Some(mut v) => {
                v.clear();
                v.reserve(capacity_hint);
                v
            }
            None => Vec::with_capacity(capacity_hint),
        }
    }

    pub fn release(&self, mut v: Vec<T>) {
        let capacity = self.capacity.load(Ordering::Relaxed);
        if capacity == 0 || v.capacity() == 0 {
            return;
        }
        v.clear();
        if let Ok(mut free) = self.free.lock() {
            if free.len() < capacity {
                free.push(v);
            }
        }
    }

    /// Changes the number of retained vectors. Zero disables pooling.
    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity, Ordering::Relaxed);
        if let Ok(mut free) = self.free.lock() {
            free.truncate(capacity);
        }
    }

    pub fn len(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for VecPool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_never_returns_stale_items() {
        let pool: VecPool<i64> = VecPool::new(4);
        let mut v = pool.acquire(8);
        v.extend_from_slice(&[1, 2, 3]);
        pool.release(v);
        assert_eq!(pool.len(), 1);

        let v = pool.acquire(2);
        assert!(v.is_empty());
        assert!(v.capacity() >= 8);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_is_bounded() {
        let pool: VecPool<i64> = VecPool::new(2);
        for _ in 0..5 {
            pool.release(Vec::with_capacity(4));
        }
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_disabled_pool_allocates() {
        let pool: VecPool<i64> = VecPool::new(0);
        pool.release(vec![1, 2]);
        assert!(pool.is_empty());
        let v = pool.acquire(3);
        assert!(v.is_empty());
        assert!(v.capacity() >= 3);
    }

    #[test]
    fn test_set_capacity_truncates() {
        let pool: VecPool<u8> = VecPool::new(8);
        for _ in 0..4 {
            pool.release(Vec::with_capacity(1));
        }
        pool.set_capacity(1);
        assert_eq!(pool.len(), 1);
    }
}
