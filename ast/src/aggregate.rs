use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Aggregation operators known to the query language. Not every operator has an
/// evaluator; see the runtime's aggregation engine for the supported set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AggregateOp {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    #[strum(serialize = "topk")]
    TopK,
    #[strum(serialize = "bottomk")]
    BottomK,
    Group,
    Stddev,
    Stdvar,
    Quantile,
    #[strum(serialize = "count_values")]
    CountValues,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Whether the operator takes a leading parameter, e.g. `topk(3, ...)`.
    pub fn takes_param(&self) -> bool {
        matches!(
            self,
            AggregateOp::TopK | AggregateOp::BottomK | AggregateOp::Quantile | AggregateOp::CountValues
        )
    }
}
