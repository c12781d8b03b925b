use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use uniquery_ast::ValueType;

use crate::types::{Matrix, Scalar, StringValue, Vector};
use crate::{RuntimeError, RuntimeResult};

/// A fully evaluated expression result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Scalar(Scalar),
    String(StringValue),
    Vector(Vector),
    Matrix(Matrix),
}

impl QueryValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            QueryValue::Scalar(_) => ValueType::Scalar,
            QueryValue::String(_) => ValueType::String,
            QueryValue::Vector(_) => ValueType::Vector,
            QueryValue::Matrix(_) => ValueType::Matrix,
        }
    }

    pub fn as_vector(&self) -> RuntimeResult<&Vector> {
        match self {
            QueryValue::Vector(v) => Ok(v),
            _ => Err(RuntimeError::ArgumentError(format!(
                "expected a vector, got {}",
                self.value_type()
            ))),
        }
    }

    pub fn as_scalar(&self) -> RuntimeResult<f64> {
        match self {
            QueryValue::Scalar(s) => Ok(s.v),
            _ => Err(RuntimeError::ArgumentError(format!(
                "expected a scalar, got {}",
                self.value_type()
            ))),
        }
    }
}

impl From<Vector> for QueryValue {
    fn from(v: Vector) -> Self {
        QueryValue::Vector(v)
    }
}

impl From<Matrix> for QueryValue {
    fn from(m: Matrix) -> Self {
        QueryValue::Matrix(m)
    }
}

impl From<Scalar> for QueryValue {
    fn from(s: Scalar) -> Self {
        QueryValue::Scalar(s)
    }
}

impl Serialize for QueryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QueryValue", 2)?;
        state.serialize_field("resultType", self.value_type().as_str())?;
        match self {
            QueryValue::Scalar(s) => state.serialize_field("result", s)?,
            QueryValue::String(s) => state.serialize_field("result", s)?,
            QueryValue::Vector(v) => state.serialize_field("result", v)?,
            QueryValue::Matrix(m) => state.serialize_field("result", m)?,
        }
        state.end()
    }
}
