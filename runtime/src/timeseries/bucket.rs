use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Offset, TimeZone};
use chrono_tz::Tz;
use strum_macros::EnumString;

use crate::types::Query;
use crate::{RuntimeError, RuntimeResult};

pub(crate) const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Calendar step units. Both the long and the short spelling are accepted;
/// note that `1m` is a minute while `1M` is a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum CalendarUnit {
    #[strum(serialize = "minute", serialize = "1m")]
    Minute,
    #[strum(serialize = "hour", serialize = "1h")]
    Hour,
    #[strum(serialize = "day", serialize = "1d")]
    Day,
    #[strum(serialize = "week", serialize = "1w")]
    Week,
    #[strum(serialize = "month", serialize = "1M")]
    Month,
    #[strum(serialize = "quarter", serialize = "1q")]
    Quarter,
    #[strum(serialize = "year", serialize = "1y")]
    Year,
}

/// The bucket width of a query, resolved once so that stepping through a
/// window does not re-parse the unit at every point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Fixed(i64),
    Calendar(CalendarUnit, Tz),
}

impl Step {
    pub fn from_query(query: &Query) -> RuntimeResult<Self> {
        if query.is_calendar {
            let unit = CalendarUnit::from_str(&query.interval_str).map_err(|_| {
                RuntimeError::InvalidInterval(format!("unknown calendar unit {:?}", query.interval_str))
            })?;
            return Ok(Step::Calendar(unit, query.time_zone));
        }
        if query.interval <= 0 {
            return Err(RuntimeError::InvalidInterval(format!(
                "step must be positive, got {}ms",
                query.interval
            )));
        }
        Ok(Step::Fixed(query.interval))
    }

    /// Advances `t` by exactly one bucket. Month, quarter and year steps use
    /// calendar arithmetic in the step's timezone; the shorter units are fixed
    /// widths.
    pub fn next(&self, t: i64) -> RuntimeResult<i64> {
        match *self {
            Step::Fixed(interval) => Ok(t + interval),
            Step::Calendar(unit, tz) => match unit {
                CalendarUnit::Minute => Ok(t + MINUTE_MS),
                CalendarUnit::Hour => Ok(t + HOUR_MS),
                CalendarUnit::Day => Ok(t + DAY_MS),
                CalendarUnit::Week => Ok(t + WEEK_MS),
                CalendarUnit::Month => add_months(tz, t, 1),
                CalendarUnit::Quarter => add_months(tz, t, 3),
                CalendarUnit::Year => add_months(tz, t, 12),
            },
        }
    }

    /// Every step timestamp from `start` up to and including `end`.
    pub fn iter(&self, start: i64, end: i64) -> StepIter {
        StepIter {
            step: *self,
            current: start,
            end,
            inclusive: true,
        }
    }

    /// Every step timestamp from `start` up to but excluding `end`.
    pub fn iter_until(&self, start: i64, end: i64) -> StepIter {
        StepIter {
            step: *self,
            current: start,
            end,
            inclusive: false,
        }
    }
}

/// Walks a step grid. Yields an error once if calendar arithmetic leaves the
/// representable range, then stops.
pub struct StepIter {
    step: Step,
    current: i64,
    end: i64,
    inclusive: bool,
}

impl Iterator for StepIter {
    type Item = RuntimeResult<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let in_range = if self.inclusive {
            self.current <= self.end
        } else {
            self.current < self.end
        };
        if !in_range {
            return None;
        }
        let t = self.current;
        match self.step.next(t) {
            Ok(next) => self.current = next,
            Err(e) => {
                self.current = i64::MAX;
                self.end = i64::MIN;
                return Some(Err(e));
            }
        }
        Some(Ok(t))
    }
}

/// Aligns the query window to bucket boundaries and returns
/// `(fixed_start, fixed_end)`.
///
/// Calendar units truncate each end to the start of its unit in the query's
/// timezone: weeks start on Monday, quarters on the first day of January,
/// April, July or October. Fixed widths are anchored at local midnight rather
/// than at the Unix epoch, using the zone offset in effect at `start`.
pub fn correcting_time(query: &Query) -> RuntimeResult<(i64, i64)> {
    match Step::from_query(query)? {
        Step::Fixed(interval) => {
            let offset = offset_ms(query.time_zone, query.start)?;
            Ok((
                align(query.start, interval, offset),
                align(query.end, interval, offset),
            ))
        }
        Step::Calendar(unit, tz) => Ok((
            truncate(unit, tz, query.start)?,
            truncate(unit, tz, query.end)?,
        )),
    }
}

/// Next bucket timestamp after `t` for the query's step.
pub fn next_point_time(query: &Query, t: i64) -> RuntimeResult<i64> {
    Step::from_query(query)?.next(t)
}

pub(crate) fn offset_ms(tz: Tz, t: i64) -> RuntimeResult<i64> {
    let dt = local_time(tz, t)?;
    Ok(dt.offset().fix().local_minus_utc() as i64 * 1000)
}

fn align(t: i64, interval: i64, offset: i64) -> i64 {
    (t + offset).div_euclid(interval) * interval - offset
}

fn local_time(tz: Tz, t: i64) -> RuntimeResult<DateTime<Tz>> {
    tz.timestamp_millis_opt(t)
        .single()
        .ok_or_else(|| RuntimeError::from(format!("timestamp {t} is out of range")))
}

fn add_months(tz: Tz, t: i64, months: u32) -> RuntimeResult<i64> {
    local_time(tz, t)?
        .checked_add_months(Months::new(months))
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| RuntimeError::from(format!("cannot add {months} months to {t}")))
}

fn truncate(unit: CalendarUnit, tz: Tz, t: i64) -> RuntimeResult<i64> {
    let date = local_time(tz, t)?.date_naive();
    let start_of = |y: i32, m: u32| {
        NaiveDate::from_ymd_opt(y, m, 1)
            .ok_or_else(|| RuntimeError::from(format!("invalid date {y}-{m}-01")))
    };
    match unit {
        CalendarUnit::Minute => Ok(t - t.rem_euclid(MINUTE_MS)),
        CalendarUnit::Hour => Ok(t - t.rem_euclid(HOUR_MS)),
        CalendarUnit::Day => midnight(tz, date),
        CalendarUnit::Week => {
            let back = Days::new(date.weekday().num_days_from_monday() as u64);
            let monday = date
                .checked_sub_days(back)
                .ok_or_else(|| RuntimeError::from(format!("invalid date before {date}")))?;
            midnight(tz, monday)
        }
        CalendarUnit::Month => midnight(tz, start_of(date.year(), date.month())?),
        CalendarUnit::Quarter => {
            let month = (date.month() - 1) / 3 * 3 + 1;
            midnight(tz, start_of(date.year(), month)?)
        }
        CalendarUnit::Year => midnight(tz, start_of(date.year(), 1)?),
    }
}

/// Start of `date` in `tz`. When midnight falls into a DST gap the first
/// valid instant after it is used.
fn midnight(tz: Tz, date: NaiveDate) -> RuntimeResult<i64> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| RuntimeError::from(format!("invalid date {date}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| RuntimeError::from(format!("no midnight on {date} in {tz}")))
}
