use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AggregateOp, Operator, UnaryOp, VectorMatching};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Scalar,
    String,
    Vector,
    Matrix,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Scalar => "scalar",
            ValueType::String => "string",
            ValueType::Vector => "vector",
            ValueType::Matrix => "matrix",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub value: f64,
}

impl NumberLiteral {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Display for NumberLiteral {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.value.is_nan() {
            write!(f, "NaN")
        } else if self.value.is_infinite() {
            write!(f, "{}Inf", if self.value > 0.0 { "+" } else { "-" })
        } else {
            write!(f, "{}", self.value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOp {
    Equal,
    NotEqual,
    RegexEqual,
    RegexNotEqual,
}

impl MatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOp::Equal => "=",
            MatchOp::NotEqual => "!=",
            MatchOp::RegexEqual => "=~",
            MatchOp::RegexNotEqual => "!~",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelMatcher {
    pub name: String,
    pub op: MatchOp,
    pub value: String,
}

impl LabelMatcher {
    pub fn equal<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            op: MatchOp::Equal,
            value: value.into(),
        }
    }
}

impl Display for LabelMatcher {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}{}{:?}", self.name, self.op.as_str(), self.value)
    }
}

/// `@ start()` / `@ end()` modifiers. A literal `@ <ts>` is stored directly in
/// [`VectorSelector::timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtModifier {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorSelector {
    pub name: Option<String>,
    pub matchers: Vec<LabelMatcher>,
    /// Offset in milliseconds.
    pub offset: Option<i64>,
    /// Pinned evaluation timestamp in milliseconds.
    pub timestamp: Option<i64>,
    pub at: Option<AtModifier>,
}

impl VectorSelector {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_matcher(mut self, matcher: LabelMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn at(mut self, at: AtModifier) -> Self {
        self.at = Some(at);
        self
    }

    pub fn at_timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }
}

impl Display for VectorSelector {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}")?;
        }
        if !self.matchers.is_empty() || self.name.is_none() {
            write!(f, "{{")?;
            for (i, m) in self.matchers.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{m}")?;
            }
            write!(f, "}}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " offset {offset}ms")?;
        }
        match (self.at, self.timestamp) {
            (Some(AtModifier::Start), _) => write!(f, " @ start()")?,
            (Some(AtModifier::End), _) => write!(f, " @ end()")?,
            (None, Some(ts)) => write!(f, " @ {:.3}", ts as f64 / 1000.0)?,
            (None, None) => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSelector {
    pub vector_selector: VectorSelector,
    /// Range in milliseconds.
    pub range: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubqueryExpr {
    pub expr: Box<Expr>,
    pub range: i64,
    pub step: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: Operator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    /// `bool` modifier on comparisons.
    pub bool_modifier: bool,
    /// Matching options. Absent when one side is a scalar.
    pub vector_matching: Option<VectorMatching>,
}

impl BinaryExpr {
    pub fn new(op: Operator, left: Expr, right: Expr) -> Self {
        Self {
            op,
            left: Box::new(left),
            right: Box::new(right),
            bool_modifier: false,
            vector_matching: None,
        }
    }

    pub fn return_type(&self) -> ValueType {
        match (self.left.value_type(), self.right.value_type()) {
            (ValueType::Scalar, ValueType::Scalar) => ValueType::Scalar,
            _ => ValueType::Vector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationExpr {
    pub op: AggregateOp,
    pub expr: Box<Expr>,
    pub param: Option<Box<Expr>>,
    pub grouping: Vec<String>,
    pub without: bool,
}

impl AggregationExpr {
    pub fn new(op: AggregateOp, expr: Expr) -> Self {
        Self {
            op,
            expr: Box::new(expr),
            param: None,
            grouping: vec![],
            without: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParensExpr {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

/// Marks a subtree whose value is the same at every evaluation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInvariantExpr {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A single scalar number.
    Number(NumberLiteral),

    /// A single scalar string. Only valid as a function argument.
    StringLiteral(String),

    /// An instant vector selector, i.e. `foo{...}`.
    VectorSelector(VectorSelector),

    /// A range vector selector, i.e. `foo{...}[5m]`.
    MatrixSelector(MatrixSelector),

    Subquery(SubqueryExpr),

    /// A binary operator expression
    BinaryOperator(BinaryExpr),

    /// Aggregation represents aggregate functions such as `sum(...) by (...)`
    Aggregation(AggregationExpr),

    /// A grouped expression wrapped in parentheses
    Parens(ParensExpr),

    UnaryOperator(UnaryExpr),

    /// A function call
    Function(FunctionExpr),

    StepInvariant(StepInvariantExpr),
}

impl Expr {
    pub fn number(value: f64) -> Expr {
        Expr::Number(NumberLiteral::new(value))
    }

    pub fn string<S: Into<String>>(s: S) -> Expr {
        Expr::StringLiteral(s.into())
    }

    pub fn binary(op: Operator, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOperator(BinaryExpr::new(op, left, right))
    }

    pub fn parens(expr: Expr) -> Expr {
        Expr::Parens(ParensExpr {
            expr: Box::new(expr),
        })
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Expr {
        Expr::UnaryOperator(UnaryExpr {
            op,
            expr: Box::new(expr),
        })
    }

    pub fn call<S: Into<String>>(name: S, args: Vec<Expr>) -> Expr {
        Expr::Function(FunctionExpr {
            name: name.into(),
            args,
        })
    }

    pub fn step_invariant(expr: Expr) -> Expr {
        Expr::StepInvariant(StepInvariantExpr {
            expr: Box::new(expr),
        })
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Expr::Number(_) => ValueType::Scalar,
            Expr::StringLiteral(_) => ValueType::String,
            Expr::VectorSelector(_) => ValueType::Vector,
            Expr::MatrixSelector(_) | Expr::Subquery(_) => ValueType::Matrix,
            Expr::BinaryOperator(be) => be.return_type(),
            Expr::Aggregation(_) => ValueType::Vector,
            Expr::Parens(p) => p.expr.value_type(),
            Expr::UnaryOperator(u) => u.expr.value_type(),
            Expr::Function(_) => ValueType::Vector,
            Expr::StepInvariant(s) => s.expr.value_type(),
        }
    }

    /// Strips any number of enclosing parentheses.
    pub fn unwrap_parens(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Parens(p) = expr {
            expr = &p.expr;
        }
        expr
    }

    /// Strips one step-invariant marker, if present.
    pub fn unwrap_step_invariant(&self) -> &Expr {
        match self {
            Expr::StepInvariant(s) => &s.expr,
            _ => self,
        }
    }

    /// The string value of a literal argument, looking through step-invariant
    /// markers and parentheses.
    pub fn as_string_literal(&self) -> Option<&str> {
        match self.unwrap_step_invariant().unwrap_parens() {
            Expr::StringLiteral(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The numeric value of a literal argument, looking through step-invariant
    /// markers, parentheses and unary signs.
    pub fn as_number_literal(&self) -> Option<f64> {
        match self.unwrap_step_invariant().unwrap_parens() {
            Expr::Number(n) => Some(n.value),
            Expr::UnaryOperator(u) => {
                let v = u.expr.as_number_literal()?;
                match u.op {
                    UnaryOp::Plus => Some(v),
                    UnaryOp::Minus => Some(-v),
                }
            }
            _ => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "NumberLiteral",
            Expr::StringLiteral(_) => "StringLiteral",
            Expr::VectorSelector(_) => "VectorSelector",
            Expr::MatrixSelector(_) => "MatrixSelector",
            Expr::Subquery(_) => "SubqueryExpr",
            Expr::BinaryOperator(_) => "BinaryExpr",
            Expr::Aggregation(_) => "AggregateExpr",
            Expr::Parens(_) => "ParenExpr",
            Expr::UnaryOperator(_) => "UnaryExpr",
            Expr::Function(_) => "Call",
            Expr::StepInvariant(_) => "StepInvariantExpr",
        }
    }
}

fn write_list(f: &mut Formatter, items: &[String]) -> fmt::Result {
    write!(f, "({})", items.join(", "))
}

fn fmt_duration(ms: i64) -> String {
    if ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{ms}ms")
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}")?,
            Expr::StringLiteral(s) => write!(f, "{s:?}")?,
            Expr::VectorSelector(vs) => write!(f, "{vs}")?,
            Expr::MatrixSelector(ms) => {
                let vs = &ms.vector_selector;
                let mut plain = vs.clone();
                plain.offset = None;
                plain.at = None;
                plain.timestamp = None;
                write!(f, "{plain}[{}]", fmt_duration(ms.range))?;
                if let Some(offset) = vs.offset {
                    write!(f, " offset {offset}ms")?;
                }
            }
            Expr::Subquery(sq) => write!(
                f,
                "{}[{}:{}]",
                sq.expr,
                fmt_duration(sq.range),
                fmt_duration(sq.step)
            )?,
            Expr::BinaryOperator(be) => {
                write!(f, "{} {}", be.left, be.op)?;
                if be.bool_modifier {
                    write!(f, " bool")?;
                }
                if let Some(matching) = &be.vector_matching {
                    let modifier = matching.to_string();
                    if !modifier.is_empty() {
                        write!(f, " {modifier}")?;
                    }
                }
                write!(f, " {}", be.right)?;
            }
            Expr::Aggregation(ae) => {
                write!(f, "{}", ae.op)?;
                if !ae.grouping.is_empty() || ae.without {
                    write!(f, " {} ", if ae.without { "without" } else { "by" })?;
                    write_list(f, &ae.grouping)?;
                }
                write!(f, "(")?;
                if let Some(param) = &ae.param {
                    write!(f, "{param}, ")?;
                }
                write!(f, "{})", ae.expr)?;
            }
            Expr::Parens(p) => write!(f, "({})", p.expr)?,
            Expr::UnaryOperator(u) => write!(f, "{}{}", u.op, u.expr)?,
            Expr::Function(func) => {
                write!(f, "{}(", func.name)?;
                for (i, arg) in func.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")?;
            }
            Expr::StepInvariant(s) => write!(f, "{}", s.expr)?,
        }
        Ok(())
    }
}
