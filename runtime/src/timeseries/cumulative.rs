use tracing::trace_span;

use crate::eval::{acquire_points, release_points};
use crate::timeseries::Step;
use crate::types::{Matrix, Point, Query, Series};
use crate::RuntimeResult;

/// Replaces every series with the running sum of its values, sampled at each
/// step from `fixed_start` to `fixed_end` inclusive. A step without a point
/// repeats the previous sum; points before `fixed_start` are folded into the
/// first step.
pub fn cumulative_sum(matrix: Matrix, query: &Query) -> RuntimeResult<Matrix> {
    let _span = trace_span!("cumulative_sum", series = matrix.len()).entered();
    let step = Step::from_query(query)?;

    let mut out = Vec::with_capacity(matrix.len());
    for series in matrix {
        let mut points = acquire_points(series.points.len());
        let mut remaining = series.points.iter().peekable();
        let mut sum = 0.0;
        for ts in step.iter(query.fixed_start, query.fixed_end) {
            let ts = ts?;
            while let Some(p) = remaining.next_if(|p| p.t <= ts) {
                sum += p.v;
            }
            points.push(Point::new(ts, sum));
        }
        release_points(series.points);
        out.push(Series::new(series.metric, points));
    }
    Ok(out)
}
