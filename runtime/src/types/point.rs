use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

/// A single timestamped value. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub t: i64,
    pub v: f64,
}

impl Point {
    pub fn new(t: i64, v: f64) -> Self {
        Self { t, v }
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pair(serializer, self.t, &format_value(self.v))
    }
}

/// Writes the `[seconds, "value"]` pair used on the wire. Whole seconds are
/// written without a fractional part.
pub(crate) fn serialize_pair<S: Serializer>(
    serializer: S,
    t: i64,
    value: &str,
) -> Result<S::Ok, S::Error> {
    let mut tuple = serializer.serialize_tuple(2)?;
    if t % 1000 == 0 {
        tuple.serialize_element(&(t / 1000))?;
    } else {
        tuple.serialize_element(&(t as f64 / 1000.0))?;
    }
    tuple.serialize_element(value)?;
    tuple.end()
}

/// Shortest decimal form of `v` without an exponent.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let s = if v > 0.0 { "+Inf" } else { "-Inf" };
        s.to_string()
    } else {
        v.to_string()
    }
}
