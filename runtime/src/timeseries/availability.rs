use tracing::{debug, field, trace_span};
use uniquery_common::hash::{FastHashMap, Signature};

use crate::config::KMINUTE_DOWNTIME_STEP;
use crate::eval::{acquire_points, release_points, EvalNodeHelper};
use crate::timeseries::bucket::{offset_ms, MINUTE_MS};
use crate::timeseries::gap_fill::fill_value;
use crate::timeseries::{correcting_time, fill_missing_points, Step};
use crate::types::{Matrix, Point, Query, Series};
use crate::{RuntimeError, RuntimeResult};

struct MergedEntry {
    index: usize,
    /// Number of distinct input matrices the signature appeared in.
    presence: usize,
    last_matrix: usize,
}

/// Merges 0/1 usability matrices into one. Series are matched on all labels
/// except the metric name and keep the order in which they were first seen.
///
/// A merged point is `1` only when every contributing series is non-zero at
/// that position. A signature missing from some input is resolved with the
/// `preceding` policy: it stays `1` only where it was `1` and the policy
/// assumes availability.
pub fn combine_eval_usability(matrices: Vec<Matrix>, preceding: i64) -> Matrix {
    let span = trace_span!("combine_eval_usability", inputs = matrices.len(), series = field::Empty).entered();
    let expected = matrices.len();
    let mut enh = EvalNodeHelper::new(0);
    let mut merged: Vec<Series> = Vec::new();
    let mut entries: FastHashMap<Signature, MergedEntry> = FastHashMap::default();

    for (m, matrix) in matrices.into_iter().enumerate() {
        for mut series in matrix {
            let sig = enh.signature(false, &[], &series.metric);
            match entries.get_mut(&sig) {
                Some(entry) => {
                    if entry.last_matrix != m {
                        entry.presence += 1;
                        entry.last_matrix = m;
                    }
                    let target = &mut merged[entry.index].points;
                    for (dst, src) in target.iter_mut().zip(series.points.iter()) {
                        dst.t = src.t;
                        dst.v = if dst.v != 0.0 && src.v != 0.0 { 1.0 } else { 0.0 };
                    }
                    release_points(series.points);
                }
                None => {
                    for p in series.points.iter_mut() {
                        p.v = if p.v != 0.0 { 1.0 } else { 0.0 };
                    }
                    entries.insert(
                        sig,
                        MergedEntry {
                            index: merged.len(),
                            presence: 1,
                            last_matrix: m,
                        },
                    );
                    merged.push(series);
                }
            }
        }
    }

    let assume_available = fill_value(preceding) == 1.0;
    for entry in entries.values().filter(|e| e.presence != expected) {
        for p in merged[entry.index].points.iter_mut() {
            p.v = if p.v == 1.0 && assume_available { 1.0 } else { 0.0 };
        }
    }

    span.record("series", merged.len());
    merged
}

/// Computes, per series, the minutes spent in runs of zero-valued points that
/// last at least `k_minute` minutes. Input points are expected one minute
/// apart.
///
/// Range queries produce one value per output step, looking back one step
/// width. Steps narrower than `k_minute` minutes cannot contain a qualifying
/// run and are all `0`. Instant queries produce a single point at `end`.
pub fn calculate_unavailable_time(matrix: Matrix, query: &Query, k_minute: i64) -> RuntimeResult<Matrix> {
    check_k_minute(k_minute)?;
    let _span = trace_span!(
        "calculate_unavailable_time",
        instant = query.is_instant_query,
        k_minute,
        series = matrix.len()
    )
    .entered();
    if query.is_instant_query {
        Ok(unavailable_time_instant(matrix, query, k_minute as f64))
    } else {
        unavailable_time_range(matrix, query, k_minute)
    }
}

/// Run-length state for one scan over a series.
#[derive(Debug, Default)]
struct RunState {
    unavailable: bool,
    minutes: f64,
    total: f64,
}

impl RunState {
    /// Adds the current run to the total if it qualifies. A qualifying run
    /// that was already under way at the window start only contributes the
    /// minutes after it.
    fn close(&mut self, k: f64, counted_before_start: &mut f64) {
        if self.minutes >= k {
            if *counted_before_start >= k {
                self.minutes -= *counted_before_start;
                *counted_before_start = 0.0;
            }
            self.total += self.minutes;
        }
    }
}

fn unavailable_time_range(matrix: Matrix, query: &Query, k_minute: i64) -> RuntimeResult<Matrix> {
    let step = Step::from_query(query)?;
    let k = k_minute as f64;
    let too_narrow = query.interval < k_minute * MINUTE_MS;
    let step_count = query.interval / KMINUTE_DOWNTIME_STEP;
    let first_t = query.fixed_start - (step_count - 1) * MINUTE_MS;

    let mut out = Vec::with_capacity(matrix.len());
    for series in matrix {
        let mut points = acquire_points(0);
        let mut cursor = 0;
        for ts in step.iter(query.fixed_start, query.fixed_end) {
            let ts = ts?;
            if too_narrow {
                points.push(Point::new(ts, 0.0));
                continue;
            }

            let mut state = RunState::default();
            while let Some(p) = series.points.get(cursor) {
                if p.t > ts {
                    break;
                }
                cursor += 1;
                if p.t < first_t {
                    continue;
                }
                if p.v == 0.0 {
                    state.minutes += 1.0;
                    state.unavailable = true;
                    // a run still open at the step boundary counts up to here
                    if p.t == ts && state.minutes >= k {
                        state.total += state.minutes;
                    }
                } else if state.unavailable {
                    if state.minutes >= k {
                        state.total += state.minutes;
                    }
                    state.unavailable = false;
                    state.minutes = 0.0;
                }
            }
            points.push(Point::new(ts, state.total));
        }
        release_points(series.points);
        out.push(Series::new(series.metric, points));
    }
    Ok(out)
}

fn unavailable_time_instant(matrix: Matrix, query: &Query, k: f64) -> Matrix {
    let mut out = Vec::with_capacity(matrix.len());
    for series in matrix {
        let mut state = RunState::default();
        // length of a qualifying run already under way at `fixed_start`
        let mut counted_before_start = 0.0;
        let last = series.points.len().saturating_sub(1);

        for (i, p) in series.points.iter().enumerate() {
            if state.unavailable && p.t == query.fixed_start && state.minutes >= k {
                counted_before_start = state.minutes;
            }
            if p.v == 0.0 {
                state.minutes += 1.0;
                state.unavailable = true;
                if i == last {
                    state.close(k, &mut counted_before_start);
                }
            } else if state.unavailable {
                state.close(k, &mut counted_before_start);
                state.unavailable = false;
                state.minutes = 0.0;
            }
        }

        release_points(series.points);
        out.push(Series::new(series.metric, vec![Point::new(query.end, state.total)]));
    }
    out
}

fn check_k_minute(k_minute: i64) -> RuntimeResult<()> {
    if k_minute < 1 {
        debug!(k_minute, "rejecting downtime threshold");
        return Err(RuntimeError::ArgumentError(format!(
            "k_minute must be at least 1, got {k_minute}"
        )));
    }
    Ok(())
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -(-a).div_euclid(b)
}

/// Derives the fine-grained query whose data feeds [`k_minute_downtime`].
///
/// Returns `(sub_query, outer_query)`. The sub query steps by `step_ms` and
/// starts early enough for a run crossing the outer window start to be
/// measured in full. For instant queries the outer `fixed_start` moves back by
/// the lookback and is re-aligned to `step_ms`.
pub fn downtime_sub_query(
    query: &Query,
    k_minute: i64,
    step_ms: i64,
    max_points: i64,
) -> RuntimeResult<(Query, Query)> {
    check_k_minute(k_minute)?;
    if step_ms <= 0 {
        return Err(RuntimeError::InvalidInterval(format!(
            "downtime step must be positive, got {step_ms}ms"
        )));
    }

    let k_ms = k_minute * MINUTE_MS;
    let mut outer = query.clone();
    let start = if query.is_instant_query {
        let lookback = query.end - query.start;
        let offset = offset_ms(query.time_zone, query.fixed_start)?;
        outer.fixed_start = ceil_div(query.fixed_start - lookback + offset, step_ms) * step_ms - offset;
        query.fixed_start - lookback - k_ms
    } else {
        query.fixed_start - query.interval.max(k_ms)
    };

    let mut sub = Query {
        start,
        interval: step_ms,
        interval_str: String::new(),
        is_calendar: false,
        is_instant_query: false,
        ..query.clone()
    };
    let points = (sub.end - sub.start) / step_ms;
    if points > max_points {
        debug!(points, max_points, "downtime window too long");
        return Err(RuntimeError::TooManyPoints {
            points,
            limit: max_points,
        });
    }
    let (fixed_start, fixed_end) = correcting_time(&sub)?;
    sub.fixed_start = fixed_start;
    sub.fixed_end = fixed_end;
    Ok((sub, outer))
}

/// Minutes of downtime per series: gap-fills every usability matrix on the
/// sub query grid, combines them and measures zero runs of at least
/// `k_minute` minutes against the outer query.
pub fn k_minute_downtime(
    query: &Query,
    matrices: Vec<Matrix>,
    k_minute: i64,
    preceding: i64,
    middle: i64,
    sub_query: &Query,
) -> RuntimeResult<Matrix> {
    let filled = fill_missing_points(sub_query, matrices, preceding, middle)?;
    let combined = combine_eval_usability(filled, preceding);
    calculate_unavailable_time(combined, query, k_minute)
}
