use uniquery_common::pool::{VecPool, DEFAULT_POOL_CAPACITY};

use crate::types::Point;

/// Process-wide free list of point vectors.
pub static POINT_POOL: VecPool<Point> = VecPool::new(DEFAULT_POOL_CAPACITY);

/// Borrows an empty point vector from the pool. The caller owns it exclusively
/// until it is handed back with [`release_points`].
pub fn acquire_points(capacity_hint: usize) -> Vec<Point> {
    POINT_POOL.acquire(capacity_hint)
}

pub fn release_points(points: Vec<Point>) {
    POINT_POOL.release(points)
}
