use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum RuntimeError {
    #[error("operator {0:?} not allowed for {1}")]
    UnsupportedOperator(String, &'static str),
    #[error("{0}")]
    UnsupportedCardinality(String),
    #[error("found duplicate series for the match group, many-to-many only allowed for set operators")]
    DuplicateMatchGroup,
    #[error("multiple matches for labels: many-to-one matching must be explicit (group_left/group_right)")]
    AmbiguousMatch,
    #[error("one-to-many match requires group_left labels that distinguish the matched series")]
    AmbiguousOneToMany,
    #[error("out_join match result cannot contain metrics with the same labelset")]
    AmbiguousOutJoin,
    #[error("vector cannot contain metrics with the same labelset")]
    DuplicateResultLabelset,
    #[error("Scalar value {0} overflows int64")]
    Int64Overflow(f64),
    #[error("expected aggregation operator but got {0:?}")]
    UnsupportedAggregation(String),
    #[error("found unexpected node {0}")]
    UnexpectedNode(String),
    #[error("Argument error: {0}")]
    ArgumentError(String),
    #[error("Unknown function `{0}`")]
    UnknownFunction(String),
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),
    #[error("unable to parse tz: {0}")]
    InvalidTimezone(String),
    #[error("invalid query interval: {0}")]
    InvalidInterval(String),
    #[error("query would produce {points} points per series, more than the limit of {limit}")]
    TooManyPoints { points: i64, limit: i64 },
    #[error("{0}")]
    General(String),
}

impl From<&str> for RuntimeError {
    fn from(message: &str) -> Self {
        RuntimeError::General(String::from(message))
    }
}

impl From<String> for RuntimeError {
    fn from(message: String) -> Self {
        RuntimeError::General(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let f = |err: RuntimeError, expected: &str| {
            assert_eq!(err.to_string(), expected);
        };

        f(
            RuntimeError::UnsupportedOperator("and".to_string(), "Scalar operations"),
            r#"operator "and" not allowed for Scalar operations"#,
        );
        f(
            RuntimeError::Int64Overflow(1e20),
            "Scalar value 100000000000000000000 overflows int64",
        );
        f(RuntimeError::from("boom"), "boom");
    }
}
