use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VectorMatchCardinality {
    #[default]
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
    /// `left_join`: every left row survives, extended by matching right rows.
    LeftJoin,
    /// `out_join`: full outer join keyed by the matching labels.
    OutJoin,
}

impl fmt::Display for VectorMatchCardinality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use VectorMatchCardinality::*;
        let s = match self {
            OneToOne => "one-to-one",
            ManyToOne => "many-to-one",
            OneToMany => "one-to-many",
            ManyToMany => "many-to-many",
            LeftJoin => "left-join",
            OutJoin => "out-join",
        };
        write!(f, "{s}")
    }
}

/// How the two sides of a vector/vector binary operation are paired.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VectorMatching {
    pub card: VectorMatchCardinality,
    /// Labels used to build the match key. With `on == false` these are the
    /// labels ignored instead.
    pub matching_labels: Vec<String>,
    pub on: bool,
    /// `group_left`/`group_right` labels copied from the other side.
    pub include: Vec<String>,
    /// out_join labels kept from the left side.
    pub include_left: Vec<String>,
    /// out_join labels kept from the right side.
    pub include_right: Vec<String>,
}

fn to_strings<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Vec<String> {
    labels.into_iter().map(Into::into).collect()
}

impl VectorMatching {
    pub fn new(card: VectorMatchCardinality) -> Self {
        Self {
            card,
            ..Default::default()
        }
    }

    pub fn one_to_one() -> Self {
        Self::new(VectorMatchCardinality::OneToOne)
    }

    pub fn many_to_many() -> Self {
        Self::new(VectorMatchCardinality::ManyToMany)
    }

    pub fn left_join<S: Into<String>>(on: impl IntoIterator<Item = S>) -> Self {
        Self::new(VectorMatchCardinality::LeftJoin).on(on)
    }

    pub fn out_join<S: Into<String>>(on: impl IntoIterator<Item = S>) -> Self {
        Self::new(VectorMatchCardinality::OutJoin).on(on)
    }

    pub fn on<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.matching_labels = to_strings(labels);
        self.on = true;
        self
    }

    pub fn ignoring<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.matching_labels = to_strings(labels);
        self.on = false;
        self
    }

    pub fn include<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.include = to_strings(labels);
        self
    }

    pub fn include_left<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.include_left = to_strings(labels);
        self
    }

    pub fn include_right<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.include_right = to_strings(labels);
        self
    }
}

impl fmt::Display for VectorMatching {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use VectorMatchCardinality::*;
        match self.card {
            LeftJoin => write!(f, "left_join({})", self.matching_labels.join(", "))?,
            OutJoin => write!(f, "out_join({})", self.matching_labels.join(", "))?,
            _ if self.on => write!(f, "on({})", self.matching_labels.join(", "))?,
            _ if !self.matching_labels.is_empty() => {
                write!(f, "ignoring({})", self.matching_labels.join(", "))?
            }
            _ => {}
        }
        match self.card {
            ManyToOne => write!(f, " group_left({})", self.include.join(", "))?,
            LeftJoin if !self.include.is_empty() => {
                write!(f, " group_left({})", self.include.join(", "))?
            }
            OneToMany => write!(f, " group_right({})", self.include.join(", "))?,
            OutJoin => {
                if !self.include_left.is_empty() {
                    write!(f, " include_left({})", self.include_left.join(", "))?;
                }
                if !self.include_right.is_empty() {
                    write!(f, " include_right({})", self.include_right.join(", "))?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let f = |m: VectorMatching, expected: &str| {
            assert_eq!(m.to_string(), expected);
        };

        f(VectorMatching::one_to_one().on(["node"]), "on(node)");
        f(VectorMatching::one_to_one().ignoring(["cpu", "mode"]), "ignoring(cpu, mode)");
        f(VectorMatching::one_to_one(), "");
        f(
            VectorMatching::left_join(["node"]).include(["cpu"]),
            "left_join(node) group_left(cpu)",
        );
        f(
            VectorMatching::out_join(["node"]).include_right(["cpu"]),
            "out_join(node) include_right(cpu)",
        );
    }
}
