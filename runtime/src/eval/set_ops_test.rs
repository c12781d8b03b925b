use pretty_assertions::assert_eq;
use uniquery_ast::VectorMatching;

use crate::eval::{vector_and, vector_or, vector_unless, EvalNodeHelper};
use crate::types::{Labels, Sample};

fn sample(pairs: &[(&str, &str)], v: f64) -> Sample {
    Sample::new(Labels::from_pairs(pairs.iter().copied()), 0, v)
}

fn fixtures() -> (Vec<Sample>, Vec<Sample>) {
    let lhs = vec![
        sample(&[("__name__", "up"), ("node", "1")], 1.0),
        sample(&[("__name__", "up"), ("node", "2")], 2.0),
    ];
    let rhs = vec![
        sample(&[("__name__", "down"), ("node", "2")], 20.0),
        sample(&[("__name__", "down"), ("node", "3")], 30.0),
    ];
    (lhs, rhs)
}

#[test]
fn test_vector_and() {
    let (lhs, rhs) = fixtures();
    let mut enh = EvalNodeHelper::new(0);

    let matching = VectorMatching::many_to_many().on(["node"]);
    let got = vector_and(&lhs, &rhs, &matching, &mut enh);
    assert_eq!(got, vec![lhs[1].clone()]);

    // without `on`, every label but the name must agree
    let matching = VectorMatching::many_to_many();
    let got = vector_and(&lhs, &rhs, &matching, &mut enh);
    assert_eq!(got, vec![lhs[1].clone()]);

    assert!(vector_and(&lhs, &[], &matching, &mut enh).is_empty());
    assert!(vector_and(&[], &rhs, &matching, &mut enh).is_empty());
}

#[test]
fn test_vector_or() {
    let (lhs, rhs) = fixtures();
    let mut enh = EvalNodeHelper::new(0);
    let matching = VectorMatching::many_to_many().on(["node"]);

    let got = vector_or(&lhs, &rhs, &matching, &mut enh);
    assert_eq!(got, vec![lhs[0].clone(), lhs[1].clone(), rhs[1].clone()]);

    assert_eq!(vector_or(&[], &rhs, &matching, &mut enh), rhs);
    assert_eq!(vector_or(&lhs, &[], &matching, &mut enh), lhs);
}

#[test]
fn test_vector_unless() {
    let (lhs, rhs) = fixtures();
    let mut enh = EvalNodeHelper::new(0);
    let matching = VectorMatching::many_to_many().on(["node"]);

    let got = vector_unless(&lhs, &rhs, &matching, &mut enh);
    assert_eq!(got, vec![lhs[0].clone()]);

    assert_eq!(vector_unless(&lhs, &[], &matching, &mut enh), lhs);
    assert!(vector_unless(&[], &rhs, &matching, &mut enh).is_empty());
}

#[test]
#[should_panic(expected = "many-to-many")]
fn test_set_operator_requires_many_to_many() {
    let (lhs, rhs) = fixtures();
    let mut enh = EvalNodeHelper::new(0);
    vector_and(&lhs, &rhs, &VectorMatching::one_to_one(), &mut enh);
}
