use pretty_assertions::assert_eq;
use test_case::test_case;
use uniquery_ast::{Operator, VectorMatching};

use crate::eval::vector_matching::labels_match;
use crate::eval::{
    negate_matrix, negate_vector, scalar_binop, vector_binop, vector_elem_binop,
    vector_scalar_binop, EvalNodeHelper,
};
use crate::types::{Labels, Point, Sample, Scalar, Series};
use crate::RuntimeError;

const TS: i64 = 1652320539000;

fn sample(pairs: &[(&str, &str)], v: f64) -> Sample {
    Sample::new(Labels::from_pairs(pairs.iter().copied()), TS, v)
}

#[test_case(Operator::Add, 1.0, 2.0, 3.0)]
#[test_case(Operator::Sub, 1.0, 2.0, -1.0)]
#[test_case(Operator::Mul, 3.0, 2.0, 6.0)]
#[test_case(Operator::Div, 1.0, 2.0, 0.5)]
#[test_case(Operator::Pow, 2.0, 3.0, 8.0)]
#[test_case(Operator::Mod, 1.0, 2.0, 1.0)]
#[test_case(Operator::Eql, 1.0, 1.0, 1.0)]
#[test_case(Operator::NotEq, 1.0, 1.0, 0.0)]
#[test_case(Operator::Gt, 1.0, 2.0, 0.0)]
#[test_case(Operator::Lt, 1.0, 2.0, 1.0)]
#[test_case(Operator::Gte, 2.0, 2.0, 1.0)]
#[test_case(Operator::Lte, 3.0, 2.0, 0.0)]
fn test_scalar_binop(op: Operator, lhs: f64, rhs: f64, expected: f64) {
    assert_eq!(scalar_binop(op, lhs, rhs), Ok(expected));
}

#[test]
fn test_scalar_binop_rejects_set_operators() {
    let f = |op: Operator| {
        let err = scalar_binop(op, 1.0, 2.0).unwrap_err();
        assert!(matches!(err, RuntimeError::UnsupportedOperator(_, _)), "{op}: {err}");
    };
    f(Operator::And);
    f(Operator::Or);
    f(Operator::Unless);
    f(Operator::Atan2);
}

#[test]
fn test_vector_elem_binop() {
    let f = |op: Operator, lhs: f64, rhs: f64, expected: (f64, bool)| {
        assert_eq!(vector_elem_binop(op, lhs, rhs), Ok(expected), "{op}");
    };

    f(Operator::Add, 1.0, 2.0, (3.0, true));
    f(Operator::Mod, 1.0, 2.0, (1.0, true));
    // comparisons keep the left value and report whether the element survives
    f(Operator::Eql, 1.0, 2.0, (1.0, false));
    f(Operator::Eql, 2.0, 2.0, (2.0, true));
    f(Operator::Gt, 3.0, 2.0, (3.0, true));
    f(Operator::Lte, 3.0, 2.0, (3.0, false));

    assert!(vector_elem_binop(Operator::Or, 1.0, 2.0).is_err());
}

#[test]
fn test_vector_scalar_binop() {
    let lhs = vec![
        sample(&[("__name__", "cpu"), ("node", "node-1")], 1.0),
        sample(&[("__name__", "cpu"), ("node", "node-2")], 5.0),
    ];
    let mut enh = EvalNodeHelper::new(TS);

    // arithmetic drops the metric name
    let got = vector_scalar_binop(Operator::Add, &lhs, Scalar::new(TS, 1.0), false, false, &mut enh)
        .unwrap();
    assert_eq!(
        got,
        vec![
            sample(&[("node", "node-1")], 2.0),
            sample(&[("node", "node-2")], 6.0),
        ]
    );

    // filtering comparison keeps the name and the sample value
    let got = vector_scalar_binop(Operator::Gt, &lhs, Scalar::new(TS, 2.0), false, false, &mut enh)
        .unwrap();
    assert_eq!(got, vec![sample(&[("__name__", "cpu"), ("node", "node-2")], 5.0)]);

    // `2 < cpu`: the scalar is on the left, the element value is still the vector's
    let got = vector_scalar_binop(Operator::Lt, &lhs, Scalar::new(TS, 2.0), true, false, &mut enh)
        .unwrap();
    assert_eq!(got, vec![sample(&[("__name__", "cpu"), ("node", "node-2")], 5.0)]);

    // bool modifier keeps everything as 0/1 and drops the name
    let got = vector_scalar_binop(Operator::Gt, &lhs, Scalar::new(TS, 2.0), false, true, &mut enh)
        .unwrap();
    assert_eq!(
        got,
        vec![
            sample(&[("node", "node-1")], 0.0),
            sample(&[("node", "node-2")], 1.0),
        ]
    );

    // `2 - cpu`
    let got = vector_scalar_binop(Operator::Sub, &lhs, Scalar::new(TS, 2.0), true, false, &mut enh)
        .unwrap();
    assert_eq!(got[0].v, 1.0);
    assert_eq!(got[1].v, -3.0);
}

#[test]
fn test_one_to_one() {
    let lhs = vec![
        sample(&[("__name__", "a"), ("cluster", "x"), ("node", "1")], 10.0),
        sample(&[("__name__", "a"), ("cluster", "x"), ("node", "2")], 20.0),
    ];
    let rhs = vec![
        sample(&[("__name__", "b"), ("cluster", "x"), ("node", "1")], 1.0),
        sample(&[("__name__", "b"), ("cluster", "x"), ("node", "3")], 3.0),
    ];
    let mut enh = EvalNodeHelper::new(TS);

    let matching = VectorMatching::one_to_one().on(["cluster", "node"]);
    let got = vector_binop(Operator::Add, &lhs, &rhs, &matching, false, &mut enh).unwrap();
    assert_eq!(got, vec![sample(&[("cluster", "x"), ("node", "1")], 11.0)]);

    let matching = VectorMatching::one_to_one();
    let got = vector_binop(Operator::Sub, &lhs, &rhs, &matching, false, &mut enh).unwrap();
    assert_eq!(got, vec![sample(&[("cluster", "x"), ("node", "1")], 9.0)]);

    // comparison keeps the left metric name
    let got = vector_binop(Operator::Gt, &lhs, &rhs, &matching, false, &mut enh).unwrap();
    assert_eq!(
        got,
        vec![sample(&[("__name__", "a"), ("cluster", "x"), ("node", "1")], 10.0)]
    );

    let got = vector_binop(Operator::Lt, &lhs, &rhs, &matching, true, &mut enh).unwrap();
    assert_eq!(got, vec![sample(&[("cluster", "x"), ("node", "1")], 0.0)]);
}

#[test]
fn test_one_to_one_duplicates() {
    let mut enh = EvalNodeHelper::new(TS);
    let matching = VectorMatching::one_to_one().on(["cluster"]);

    let lhs = vec![sample(&[("cluster", "x"), ("node", "1")], 1.0)];
    let rhs = vec![
        sample(&[("cluster", "x"), ("node", "1")], 1.0),
        sample(&[("cluster", "x"), ("node", "2")], 2.0),
    ];
    let err = vector_binop(Operator::Add, &lhs, &rhs, &matching, false, &mut enh).unwrap_err();
    assert_eq!(err, RuntimeError::DuplicateMatchGroup);

    let err = vector_binop(Operator::Add, &rhs, &lhs, &matching, false, &mut enh).unwrap_err();
    assert_eq!(err, RuntimeError::AmbiguousMatch);
}

#[test]
fn test_unsupported_cardinality() {
    let mut enh = EvalNodeHelper::new(TS);
    let lhs = vec![sample(&[("node", "1")], 1.0)];
    let f = |matching: VectorMatching, enh: &mut EvalNodeHelper| {
        let err = vector_binop(Operator::Add, &lhs, &lhs, &matching, false, enh).unwrap_err();
        assert!(matches!(err, RuntimeError::UnsupportedCardinality(_)), "{err}");
    };
    f(VectorMatching::many_to_many(), &mut enh);
    f(
        VectorMatching::new(uniquery_ast::VectorMatchCardinality::ManyToOne),
        &mut enh,
    );
}

#[test]
fn test_labels_match() {
    let left = Labels::from_pairs([
        ("cluster", "opensearch"),
        ("node", "node-1"),
        ("pod", "node-exporter-tdhtm"),
        ("namespace", "kube-system"),
    ]);
    let right = Labels::from_pairs([
        ("cluster", "opensearch"),
        ("job", "kubernetes-services-endpoints"),
        ("cpu", "0"),
        ("namespace", "kube-system"),
        ("mode", "iqr"),
    ]);
    let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    assert!(labels_match(&left, &right, &names(&["cluster"])));
    assert!(!labels_match(&left, &right, &names(&["cluster", "node", "aaa"])));
    assert!(!labels_match(&left, &right, &[]));

    let left = Labels::from_pairs([("__tsid", "abc"), ("node", "1")]);
    let right = Labels::from_pairs([("__tsid", "abc"), ("node", "2")]);
    assert!(labels_match(&left, &right, &names(&["node"])));
}

#[test]
fn test_left_join() {
    let left = vec![sample(&[("cluster", "opensearch"), ("node", "node-1")], 1.0)];
    let right = vec![sample(
        &[
            ("cluster", "opensearch"),
            ("job", "kubernetes-services-endpoints"),
            ("mode", "nice"),
        ],
        2.0,
    )];
    let mut enh = EvalNodeHelper::new(TS);

    let matching = VectorMatching::left_join(["cluster"]);
    let got = vector_binop(Operator::Add, &left, &right, &matching, false, &mut enh).unwrap();
    assert_eq!(got, vec![sample(&[("cluster", "opensearch"), ("node", "node-1")], 3.0)]);

    let matching = VectorMatching::left_join(["cluster"]).include(["job"]);
    let got = vector_binop(Operator::Add, &left, &right, &matching, false, &mut enh).unwrap();
    assert_eq!(
        got,
        vec![sample(
            &[
                ("cluster", "opensearch"),
                ("job", "kubernetes-services-endpoints"),
                ("node", "node-1"),
            ],
            3.0
        )]
    );

    // unmatched left rows pass through
    let matching = VectorMatching::left_join(["job"]);
    let got = vector_binop(Operator::Add, &left, &right, &matching, false, &mut enh).unwrap();
    assert_eq!(got, left);

    let got = vector_binop(Operator::Add, &left, &[], &matching, false, &mut enh).unwrap();
    assert_eq!(got, left);
}

#[test]
fn test_left_join_one_to_many() {
    let left = vec![sample(&[("node", "node-1")], 1.0)];
    let right = vec![
        sample(&[("node", "node-1"), ("cpu", "0"), ("mode", "system")], 2.0),
        sample(&[("node", "node-1"), ("cpu", "1"), ("mode", "system")], 4.0),
    ];
    let mut enh = EvalNodeHelper::new(TS);

    let matching = VectorMatching::left_join(["node"]);
    let err = vector_binop(Operator::Add, &left, &right, &matching, false, &mut enh).unwrap_err();
    assert_eq!(err, RuntimeError::AmbiguousOneToMany);

    let matching = VectorMatching::left_join(["node"]).include(["mode"]);
    let err = vector_binop(Operator::Add, &left, &right, &matching, false, &mut enh).unwrap_err();
    assert_eq!(err, RuntimeError::DuplicateResultLabelset);

    let matching = VectorMatching::left_join(["node"]).include(["cpu"]);
    let got = vector_binop(Operator::Add, &left, &right, &matching, false, &mut enh).unwrap();
    assert_eq!(
        got,
        vec![
            sample(&[("cpu", "0"), ("node", "node-1")], 3.0),
            sample(&[("cpu", "1"), ("node", "node-1")], 5.0),
        ]
    );
}

fn out_join_fixtures() -> (Vec<Sample>, Vec<Sample>) {
    let left = vec![sample(
        &[("node", "node-1"), ("cpu", "0"), ("mode", "system")],
        1.0,
    )];
    let right = vec![
        sample(&[("node", "node-1"), ("cpu", "0"), ("mode", "system")], 2.0),
        sample(&[("node", "node-1"), ("cpu", "1"), ("mode", "system")], 2.0),
    ];
    (left, right)
}

#[test]
fn test_out_join_errors() {
    let (left, right) = out_join_fixtures();
    let f = |lhs: &[Sample], rhs: &[Sample], matching: VectorMatching, expected: RuntimeError| {
        let mut enh = EvalNodeHelper::new(TS);
        let err = vector_binop(Operator::Add, lhs, rhs, &matching, false, &mut enh).unwrap_err();
        assert_eq!(err, expected);
    };

    f(
        &left,
        &right,
        VectorMatching::out_join(["node"]),
        RuntimeError::AmbiguousOutJoin,
    );
    f(
        &left,
        &right,
        VectorMatching::out_join(["node"]).include_right(["mode"]),
        RuntimeError::DuplicateResultLabelset,
    );
    f(
        &right,
        &left,
        VectorMatching::out_join(["node"]).include_left(["mode"]),
        RuntimeError::DuplicateResultLabelset,
    );
}

#[test]
fn test_out_join() {
    let (left, right) = out_join_fixtures();
    let f = |lhs: &[Sample], rhs: &[Sample], matching: VectorMatching, expected: Vec<Sample>| {
        let mut enh = EvalNodeHelper::new(TS);
        let got = vector_binop(Operator::Add, lhs, rhs, &matching, false, &mut enh).unwrap();
        assert_eq!(got, expected);
    };

    let unique = vec![
        sample(&[("cpu", "0"), ("node", "node-1")], 3.0),
        sample(&[("cpu", "1"), ("node", "node-1")], 3.0),
    ];
    f(
        &left,
        &right,
        VectorMatching::out_join(["node"]).include_right(["cpu"]),
        unique.clone(),
    );
    f(
        &right,
        &left,
        VectorMatching::out_join(["node"]).include_left(["cpu"]),
        unique,
    );

    // a missing side counts as zero
    f(
        &left,
        &[],
        VectorMatching::out_join(["node"]).include_left(["cpu"]),
        vec![sample(&[("cpu", "0"), ("node", "node-1")], 1.0)],
    );
    f(
        &[],
        &left,
        VectorMatching::out_join(["node"]).include_left(["cpu"]),
        vec![sample(&[("node", "node-1")], 1.0)],
    );

    f(
        &left,
        &right,
        VectorMatching::out_join(["node"])
            .include_left(["mode"])
            .include_right(["cpu"]),
        vec![
            sample(&[("cpu", "0"), ("mode", "system"), ("node", "node-1")], 3.0),
            sample(&[("cpu", "1"), ("mode", "system"), ("node", "node-1")], 3.0),
        ],
    );

    // unmatched right rows follow the matched ones
    f(
        &left,
        &right,
        VectorMatching::out_join(["cpu"])
            .include_left(["node"])
            .include_right(["mode"]),
        vec![
            sample(&[("cpu", "0"), ("mode", "system"), ("node", "node-1")], 3.0),
            sample(&[("cpu", "1"), ("mode", "system")], 2.0),
        ],
    );
}

#[test]
fn test_negate_vector() {
    let mut enh = EvalNodeHelper::new(TS);
    let got = negate_vector(
        vec![sample(&[("__name__", "cpu"), ("node", "1")], 2.5)],
        &mut enh,
    )
    .unwrap();
    assert_eq!(got, vec![sample(&[("node", "1")], -2.5)]);
}

#[test]
fn test_negate_rejects_collapsed_names() {
    let mut enh = EvalNodeHelper::new(TS);
    let err = negate_vector(
        vec![
            sample(&[("__name__", "a"), ("node", "1")], 1.0),
            sample(&[("__name__", "b"), ("node", "1")], 2.0),
        ],
        &mut enh,
    )
    .unwrap_err();
    assert_eq!(err, RuntimeError::DuplicateResultLabelset);

    let series = |name: &str| {
        Series::new(
            Labels::from_pairs([("__name__", name), ("node", "1")]),
            vec![Point::new(TS, 1.0)],
        )
    };
    let err = negate_matrix(vec![series("a"), series("b")], &mut enh).unwrap_err();
    assert_eq!(err, RuntimeError::DuplicateResultLabelset);

    let got = negate_matrix(vec![series("a")], &mut enh).unwrap();
    assert_eq!(got[0].metric, Labels::from_pairs([("node", "1")]));
    assert_eq!(got[0].points, vec![Point::new(TS, -1.0)]);
}

#[test]
fn test_arithmetic_rejects_collapsed_names() {
    let lhs = vec![
        sample(&[("__name__", "a"), ("node", "1")], 1.0),
        sample(&[("__name__", "b"), ("node", "1")], 2.0),
    ];
    let mut enh = EvalNodeHelper::new(TS);

    let err = vector_scalar_binop(Operator::Mul, &lhs, Scalar::new(TS, 2.0), false, false, &mut enh)
        .unwrap_err();
    assert_eq!(err, RuntimeError::DuplicateResultLabelset);
    assert!(enh.out.is_empty());

    // filtering keeps the names apart
    let got = vector_scalar_binop(Operator::Gt, &lhs, Scalar::new(TS, 0.0), false, false, &mut enh)
        .unwrap();
    assert_eq!(got, lhs);

    // matched results keep their matching labels apart
    let rhs = vec![
        sample(&[("__name__", "x"), ("node", "1"), ("job", "j")], 1.0),
        sample(&[("__name__", "y"), ("node", "1"), ("job", "k")], 1.0),
    ];
    let lhs = vec![
        sample(&[("__name__", "a"), ("node", "1"), ("job", "j")], 1.0),
        sample(&[("__name__", "b"), ("node", "1"), ("job", "k")], 1.0),
    ];
    let matching = VectorMatching::one_to_one().on(["node", "job"]);
    let got = vector_binop(Operator::Add, &lhs, &rhs, &matching, false, &mut enh).unwrap();
    assert_eq!(got.len(), 2);
}
