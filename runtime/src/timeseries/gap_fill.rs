use tracing::{field, trace_span};
use uniquery_common::hash::FastHashMap;

use crate::eval::{acquire_points, release_points};
use crate::timeseries::Step;
use crate::types::{Matrix, Point, Query};
use crate::RuntimeResult;

/// Missing-point policy value meaning "no policy". Fills with `0`.
pub const POLICY_UNSET: i64 = -1;

/// Middle policy value meaning "carry the last known value forward".
pub const POLICY_CARRY_FORWARD: i64 = 0;

pub(crate) fn fill_value(policy: i64) -> f64 {
    if policy == POLICY_UNSET {
        0.0
    } else {
        policy as f64
    }
}

/// Rewrites every series onto the query's step grid, starting at
/// `fixed_start` and stopping before `end`.
///
/// Steps before the first real point get the `preceding` fill value. Later
/// steps without a point get the `middle` fill value, or the last value seen
/// when `middle` is [`POLICY_CARRY_FORWARD`]. A series without points is
/// filled with `preceding` over the whole window. Points that do not fall on
/// the grid are dropped.
pub fn fill_missing_points(
    query: &Query,
    mut matrices: Vec<Matrix>,
    preceding: i64,
    middle: i64,
) -> RuntimeResult<Vec<Matrix>> {
    let span = trace_span!("fill_missing_points", series = field::Empty, points = field::Empty).entered();
    let step = Step::from_query(query)?;
    let preceding_fill = fill_value(preceding);
    let middle_fill = fill_value(middle);

    let mut series_count = 0;
    let mut point_count = 0;
    let mut by_time: FastHashMap<i64, f64> = FastHashMap::default();

    for matrix in matrices.iter_mut() {
        for series in matrix.iter_mut() {
            by_time.clear();
            by_time.extend(series.points.iter().map(|p| (p.t, p.v)));

            let first_t = series.points.first().map_or(query.fixed_end, |p| p.t);
            let mut points = acquire_points(series.points.len());
            let mut current = query.fixed_start;

            while current < first_t {
                points.push(Point::new(current, preceding_fill));
                current = step.next(current)?;
            }

            let mut last_value = preceding_fill;
            for t in step.iter_until(current, query.end) {
                let t = t?;
                let v = match by_time.get(&t) {
                    Some(v) => {
                        last_value = *v;
                        *v
                    }
                    None if middle == POLICY_CARRY_FORWARD => last_value,
                    None => middle_fill,
                };
                points.push(Point::new(t, v));
            }

            point_count += points.len();
            series_count += 1;
            release_points(std::mem::replace(&mut series.points, points));
        }
    }

    span.record("series", series_count);
    span.record("points", point_count);
    Ok(matrices)
}
