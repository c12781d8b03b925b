use chrono_tz::Tz;
use serde::Deserialize;
use uniquery_common::pool::DEFAULT_POOL_CAPACITY;

use crate::eval::POINT_POOL;
use crate::timeseries::downtime_sub_query;
use crate::types::Query;
use crate::utils::parse_timezone;
use crate::RuntimeResult;

/// Maximum number of buckets a single series may span.
pub const DEFAULT_MAX_QUERY_POINTS: i64 = 10_000;

/// Resolution of the underlying data used for k-minute downtime.
pub const KMINUTE_DOWNTIME_STEP: i64 = 60_000;

/// Engine-wide settings. Typically deserialized from the host service's
/// configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA timezone for bucket alignment. `"local"` uses the process timezone.
    pub time_zone: String,
    pub max_query_points: i64,
    pub downtime_step_ms: i64,
    /// Number of point vectors retained by the free list.
    pub point_pool_capacity: usize,
    pub disable_point_pool: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            max_query_points: DEFAULT_MAX_QUERY_POINTS,
            downtime_step_ms: KMINUTE_DOWNTIME_STEP,
            point_pool_capacity: DEFAULT_POOL_CAPACITY,
            disable_point_pool: false,
        }
    }
}

impl EngineConfig {
    pub fn time_zone(&self) -> RuntimeResult<Tz> {
        parse_timezone(&self.time_zone)
    }

    /// Applies the process-wide parts of the configuration.
    pub fn apply(&self) {
        let capacity = if self.disable_point_pool {
            0
        } else {
            self.point_pool_capacity
        };
        POINT_POOL.set_capacity(capacity);
        tracing::debug!(capacity, "point pool configured");
    }

    /// [`downtime_sub_query`] with the configured step and point limit.
    pub fn downtime_sub_query(&self, query: &Query, k_minute: i64) -> RuntimeResult<(Query, Query)> {
        downtime_sub_query(query, k_minute, self.downtime_step_ms, self.max_query_points)
    }
}
