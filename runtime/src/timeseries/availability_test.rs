use pretty_assertions::assert_eq;

use crate::timeseries::{
    calculate_unavailable_time, combine_eval_usability, downtime_sub_query, fill_missing_points,
    k_minute_downtime,
};
use crate::types::{Labels, Matrix, Point, Query, Series};
use crate::RuntimeError;

const SUB_START: i64 = 1652319900000;
const START: i64 = 1652320200000;
const END: i64 = 1652321400000;
const MINUTE: i64 = 60_000;

const NODE: [f64; 26] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

fn labels(name: &str) -> Labels {
    Labels::from_pairs([("index", name)])
}

/// One point per minute from `start`.
fn minutes(name: &str, start: i64, values: &[f64]) -> Series {
    Series::new(
        labels(name),
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Point::new(start + i as i64 * MINUTE, *v))
            .collect(),
    )
}

fn values(series: &Series) -> Vec<f64> {
    series.points.iter().map(|p| p.v).collect()
}

fn range_query() -> Query {
    Query::range(START, END, 5 * MINUTE)
}

#[test]
fn test_combine() {
    let m1 = vec![
        minutes("nas", 0, &[0.0, 20.0, 0.0]),
        minutes("node", 0, &[0.0, 1.0, 1.0]),
    ];
    let m2 = vec![
        minutes("node", 0, &[1.0, 1.0, 0.0]),
        minutes("nas1", 0, &[1.0, 1.0, 1.0]),
    ];

    let got = combine_eval_usability(vec![m1.clone(), m2.clone()], -1);
    let names: Vec<&str> = got.iter().map(|s| s.metric.get_or_empty("index")).collect();
    assert_eq!(names, vec!["nas", "node", "nas1"]);
    assert_eq!(values(&got[0]), vec![0.0, 0.0, 0.0]);
    assert_eq!(values(&got[1]), vec![0.0, 1.0, 0.0]);
    assert_eq!(values(&got[2]), vec![0.0, 0.0, 0.0]);

    // series missing from an input keep their own availability when the
    // preceding policy assumes availability
    let got = combine_eval_usability(vec![m1, m2], 1);
    assert_eq!(values(&got[0]), vec![0.0, 1.0, 0.0]);
    assert_eq!(values(&got[1]), vec![0.0, 1.0, 0.0]);
    assert_eq!(values(&got[2]), vec![1.0, 1.0, 1.0]);
}

#[test]
fn test_combine_matches_on_labels_without_name() {
    let mut a = minutes("node", 0, &[1.0, 2.0]);
    a.metric = Labels::from_pairs([("__name__", "disk_ok"), ("index", "node")]);
    let mut b = minutes("node", 0, &[3.0, 0.0]);
    b.metric = Labels::from_pairs([("__name__", "net_ok"), ("index", "node")]);

    let got = combine_eval_usability(vec![vec![a.clone()], vec![b]], -1);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].metric, a.metric);
    assert_eq!(values(&got[0]), vec![1.0, 0.0]);
}

#[test]
fn test_combine_counts_matrices_not_series() {
    // a signature repeated within one matrix is still missing from the other
    let m1 = vec![minutes("node", 0, &[1.0, 1.0]), minutes("node", 0, &[1.0, 1.0])];
    let m2 = vec![minutes("other", 0, &[1.0, 1.0])];
    let got = combine_eval_usability(vec![m1, m2], -1);
    assert_eq!(values(&got[0]), vec![0.0, 0.0]);
}

#[test]
fn test_unavailable_time_range() {
    let input: Matrix = vec![
        minutes("nas", SUB_START, &[0.0; 26]),
        minutes("node", SUB_START, &NODE),
    ];
    let got = calculate_unavailable_time(input, &range_query(), 3).unwrap();

    let expected_times: Vec<i64> = (0..5).map(|i| START + i * 5 * MINUTE).collect();
    for s in &got {
        let times: Vec<i64> = s.points.iter().map(|p| p.t).collect();
        assert_eq!(times, expected_times);
    }
    assert_eq!(values(&got[0]), vec![5.0; 5]);
    assert_eq!(values(&got[1]), vec![5.0, 3.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_unavailable_time_range_narrow_step() {
    let input = vec![minutes("nas", SUB_START, &[0.0; 26])];
    // a 5 minute step cannot hold a 6 minute run
    let got = calculate_unavailable_time(input, &range_query(), 6).unwrap();
    assert_eq!(values(&got[0]), vec![0.0; 5]);
}

#[test]
fn test_unavailable_time_instant() {
    let query = Query::instant(END, END).with_fixed_window(START, END);
    let input: Matrix = vec![
        minutes("nas", SUB_START, &[0.0; 26]),
        minutes("node", SUB_START, &NODE),
    ];
    let got = calculate_unavailable_time(input, &query, 3).unwrap();
    assert_eq!(got[0].points, vec![Point::new(END, 21.0)]);
    assert_eq!(got[1].points, vec![Point::new(END, 17.0)]);
}

#[test]
fn test_unavailable_time_instant_boundary_run() {
    let f = |values: &[f64], start_index: i64, expected: f64| {
        let fixed_start = SUB_START + start_index * MINUTE;
        let query = Query::instant(END, END).with_fixed_window(fixed_start, END);
        let got = calculate_unavailable_time(vec![minutes("a", SUB_START, values)], &query, 3).unwrap();
        assert_eq!(got[0].points, vec![Point::new(END, expected)], "{values:?} @ {start_index}");
    };

    // the part before the boundary is too short to have been counted already
    f(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 2, 3.0);
    // a qualifying run before the boundary only adds what follows it
    f(&[0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 3, 2.0);
    f(&[1.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0, 0.0);
    f(&[], 0, 0.0);
}

#[test]
fn test_invalid_k_minute() {
    let err = calculate_unavailable_time(vec![], &range_query(), 0).unwrap_err();
    assert!(matches!(err, RuntimeError::ArgumentError(_)), "{err}");
}

#[test]
fn test_downtime_sub_query_range() {
    let f = |k_minute: i64, expected_start: i64| {
        let query = range_query();
        let (sub, outer) = downtime_sub_query(&query, k_minute, MINUTE, 10_000).unwrap();
        assert_eq!(outer, query);
        assert_eq!(sub.start, expected_start);
        assert_eq!(sub.end, END);
        assert_eq!(sub.interval, MINUTE);
        assert!(!sub.is_instant_query && !sub.is_calendar);
        assert_eq!((sub.fixed_start, sub.fixed_end), (expected_start, END));
    };

    // one step back when the step is wider than the threshold
    f(3, SUB_START);
    f(10, START - 10 * MINUTE);
}

#[test]
fn test_downtime_sub_query_instant() {
    let query = Query::instant(START, END).with_fixed_window(1652320230000, END);
    let (sub, outer) = downtime_sub_query(&query, 3, MINUTE, 10_000).unwrap();

    // lookback of 20 minutes and 3 more for the threshold
    assert_eq!(sub.start, 1652318850000);
    assert_eq!(sub.fixed_start, 1652318820000);
    assert_eq!(sub.fixed_end, END);
    assert!(!sub.is_instant_query);
    assert_eq!(outer.fixed_start, 1652319060000);
    assert_eq!(outer.fixed_end, END);
    assert!(outer.is_instant_query);
}

#[test]
fn test_downtime_sub_query_errors() {
    let err = downtime_sub_query(&range_query(), 3, MINUTE, 10).unwrap_err();
    assert_eq!(err, RuntimeError::TooManyPoints { points: 25, limit: 10 });

    let err = downtime_sub_query(&range_query(), 3, 0, 10_000).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidInterval(_)), "{err}");

    let err = downtime_sub_query(&range_query(), -1, MINUTE, 10_000).unwrap_err();
    assert!(matches!(err, RuntimeError::ArgumentError(_)), "{err}");
}

#[test]
fn test_k_minute_downtime_range() {
    let query = range_query();
    let (sub, query) = downtime_sub_query(&query, 3, MINUTE, 10_000).unwrap();

    let mut node = NODE;
    node[21..].copy_from_slice(&[1.0; 5]);
    let disk = vec![minutes("node", SUB_START, &node), minutes("spare", SUB_START, &[1.0; 26])];
    let net = vec![minutes("node", SUB_START, &[1.0; 26])];

    let got = k_minute_downtime(&query, vec![disk, net], 3, 1, 0, &sub).unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].metric, labels("node"));
    assert_eq!(values(&got[0]), vec![5.0, 3.0, 3.0, 4.0, 0.0]);
    // only in one input, but the policy assumes availability
    assert_eq!(values(&got[1]), vec![0.0; 5]);
}

#[test]
fn test_k_minute_downtime_instant() {
    let query = Query::instant(END, END);
    let (sub, query) = downtime_sub_query(&query, 3, MINUTE, 10_000).unwrap();
    assert_eq!((sub.fixed_start, sub.fixed_end), (END - 3 * MINUTE, END));

    // sparse input, gaps carry the last value forward
    let disk = vec![Series::new(
        labels("node"),
        vec![Point::new(END - 3 * MINUTE, 0.0), Point::new(END - MINUTE, 0.0)],
    )];
    let got = k_minute_downtime(&query, vec![disk], 3, -1, 0, &sub).unwrap();
    assert_eq!(got[0].points, vec![Point::new(END, 3.0)]);
}

#[test]
fn test_sub_query_fill_with_unaligned_end() {
    let query = Query::instant(END + 30_000, END + 30_000);
    let (sub, _) = downtime_sub_query(&query, 3, MINUTE, 10_000).unwrap();
    assert_eq!((sub.fixed_start, sub.fixed_end), (END - 3 * MINUTE, END));
    assert_eq!(sub.end, END + 30_000);

    let empty = Series::new(labels("node"), vec![]);
    let got = fill_missing_points(&sub, vec![vec![empty]], -1, 0).unwrap();
    assert_eq!(values(&got[0][0]), vec![0.0; 4]);
}
