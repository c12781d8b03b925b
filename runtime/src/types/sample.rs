use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use uniquery_common::hash::FastHashSet;
use uniquery_common::label::Labels;

use crate::types::point::serialize_pair;
use crate::types::Point;

/// One vector element: a labeled value at an instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    pub metric: Labels,
    pub t: i64,
    pub v: f64,
}

impl Sample {
    pub fn new(metric: Labels, t: i64, v: f64) -> Self {
        Self { metric, t, v }
    }

    pub fn point(&self) -> Point {
        Point::new(self.t, self.v)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} => {} @[{}]", self.metric, self.v, self.t)
    }
}

impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Sample", 2)?;
        state.serialize_field("metric", &self.metric)?;
        state.serialize_field("value", &self.point())?;
        state.end()
    }
}

pub type Vector = Vec<Sample>;

/// One time line.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    pub metric: Labels,
    #[serde(rename = "values")]
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(metric: Labels, points: Vec<Point>) -> Self {
        Self { metric, points }
    }
}

pub type Matrix = Vec<Series>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scalar {
    pub t: i64,
    pub v: f64,
}

impl Scalar {
    pub fn new(t: i64, v: f64) -> Self {
        Self { t, v }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Point::new(self.t, self.v).serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringValue {
    pub t: i64,
    pub v: String,
}

impl Serialize for StringValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pair(serializer, self.t, &self.v)
    }
}

/// Detects two elements carrying an identical label set.
pub trait ContainsSameLabelset {
    fn contains_same_labelset(&self) -> bool;
}

fn has_duplicate<'a>(metrics: impl ExactSizeIterator<Item = &'a Labels>) -> bool {
    if metrics.len() <= 1 {
        return false;
    }
    let mut seen = FastHashSet::with_capacity(metrics.len());
    for metric in metrics {
        if !seen.insert(metric.signature()) {
            return true;
        }
    }
    false
}

impl ContainsSameLabelset for [Sample] {
    fn contains_same_labelset(&self) -> bool {
        has_duplicate(self.iter().map(|s| &s.metric))
    }
}

impl ContainsSameLabelset for [Series] {
    fn contains_same_labelset(&self) -> bool {
        has_duplicate(self.iter().map(|s| &s.metric))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_same_labelset() {
        let a = Labels::from_pairs([("node", "1")]);
        let b = Labels::from_pairs([("node", "2")]);

        let vector = vec![Sample::new(a.clone(), 0, 1.0), Sample::new(b.clone(), 0, 1.0)];
        assert!(!vector.contains_same_labelset());

        let vector = vec![Sample::new(a.clone(), 0, 1.0), Sample::new(a.clone(), 0, 2.0)];
        assert!(vector.contains_same_labelset());

        let matrix = vec![Series::new(a.clone(), vec![]), Series::new(b, vec![]), Series::new(a, vec![])];
        assert!(matrix.contains_same_labelset());

        let empty: Matrix = vec![];
        assert!(!empty.contains_same_labelset());
    }
}
