use thiserror::Error;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum AstError {
    #[error("unknown binary operator {0:?}")]
    UnknownOperator(String),
    #[error("unknown aggregation operator {0:?}")]
    UnknownAggregateOp(String),
}

pub type AstResult<T> = Result<T, AstError>;
