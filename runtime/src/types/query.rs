use chrono_tz::Tz;

/// The time window of a query, as seen by bucket correction and gap-filling.
/// All timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub start: i64,
    pub end: i64,
    /// Step width in milliseconds. Ignored for calendar steps.
    pub interval: i64,
    /// Calendar unit name (`"day"`, `"1M"`, ...) when `is_calendar` is set.
    pub interval_str: String,
    pub is_calendar: bool,
    /// Bucket-aligned start, see `correcting_time`.
    pub fixed_start: i64,
    /// Bucket-aligned end, see `correcting_time`.
    pub fixed_end: i64,
    pub is_instant_query: bool,
    pub limit: i64,
    pub offset: i64,
    /// Opaque pagination cursor handed back by the storage layer.
    pub search_after: Option<Vec<String>>,
    pub time_zone: Tz,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            interval: 0,
            interval_str: String::new(),
            is_calendar: false,
            fixed_start: 0,
            fixed_end: 0,
            is_instant_query: false,
            limit: -1,
            offset: 0,
            search_after: None,
            time_zone: Tz::UTC,
        }
    }
}

impl Query {
    /// A range query with a fixed step. The fixed window equals the raw window
    /// until corrected.
    pub fn range(start: i64, end: i64, interval: i64) -> Self {
        Self {
            start,
            end,
            interval,
            fixed_start: start,
            fixed_end: end,
            ..Default::default()
        }
    }

    /// A range query stepping by a calendar unit.
    pub fn calendar<S: Into<String>>(start: i64, end: i64, unit: S) -> Self {
        Self {
            start,
            end,
            interval_str: unit.into(),
            is_calendar: true,
            fixed_start: start,
            fixed_end: end,
            ..Default::default()
        }
    }

    pub fn instant(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            interval: end - start,
            fixed_start: start,
            fixed_end: end,
            is_instant_query: true,
            ..Default::default()
        }
    }

    pub fn with_fixed_window(mut self, fixed_start: i64, fixed_end: i64) -> Self {
        self.fixed_start = fixed_start;
        self.fixed_end = fixed_end;
        self
    }

    pub fn with_time_zone(mut self, tz: Tz) -> Self {
        self.time_zone = tz;
        self
    }
}
