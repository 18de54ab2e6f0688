use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// CompareOp
///
/// Value operator of a leaf. Serialized by lowercase name.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Regexp,
    NotRegexp,
    Starts,
    StartsCi,
    Ends,
    EndsCi,
    Contains,
    ContainsCi,
    EqualsCi,
}

impl CompareOp {
    /// String-match operators, defined only on text keys.
    #[must_use]
    pub const fn is_text_match(self) -> bool {
        matches!(
            self,
            Self::Regexp
                | Self::NotRegexp
                | Self::Starts
                | Self::StartsCi
                | Self::Ends
                | Self::EndsCi
                | Self::Contains
                | Self::ContainsCi
                | Self::EqualsCi
        )
    }

    #[must_use]
    pub const fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            Self::StartsCi | Self::EndsCi | Self::ContainsCi | Self::EqualsCi
        )
    }

    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Ge | Self::Lt | Self::Le)
    }

    #[must_use]
    pub const fn is_membership(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    #[must_use]
    pub const fn is_regexp(self) -> bool {
        matches!(self, Self::Regexp | Self::NotRegexp)
    }

    /// Exact complement, where one exists under the interpreter's null rules.
    ///
    /// Ordering operators have none: `!(a > b)` and `a <= b` differ on null.
    #[must_use]
    pub const fn negated(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Ne),
            Self::Ne => Some(Self::Eq),
            Self::In => Some(Self::NotIn),
            Self::NotIn => Some(Self::In),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NEQ",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::Regexp => "REGEXP",
            Self::NotRegexp => "NOT_REGEXP",
            Self::Starts => "STARTS",
            Self::StartsCi => "STARTS_CI",
            Self::Ends => "ENDS",
            Self::EndsCi => "ENDS_CI",
            Self::Contains => "CONTAINS",
            Self::ContainsCi => "CONTAINS_CI",
            Self::EqualsCi => "EQUALS_CI",
        }
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

///
/// BooleanOp
/// Binary combinator of two predicates.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Equiv,
}

impl BooleanOp {
    /// Result decided by the left side alone, if any.
    #[must_use]
    pub const fn short_circuit(self, left: bool) -> Option<bool> {
        match (self, left) {
            (Self::And, false) => Some(false),
            (Self::Or, true) => Some(true),
            _ => None,
        }
    }

    #[must_use]
    pub const fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
            Self::Xor => left != right,
            Self::Nand => !(left && right),
            Self::Nor => !(left || right),
            Self::Equiv => left == right,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Nand => "NAND",
            Self::Nor => "NOR",
            Self::Equiv => "EQUIV",
        }
    }
}

impl Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

///
/// OperatorKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatorKind {
    /// Compares a key against an operand, or stands alone as a leaf.
    Value,
    /// Combines predicates.
    Boolean,
}

///
/// Operator
///
/// Closed catalog of every node operator in a predicate tree.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    Compare(CompareOp),
    Boolean(BooleanOp),
    Not,
    FixedTrue,
    FixedFalse,
    RawSql,
}

impl Operator {
    #[must_use]
    pub const fn kind(self) -> OperatorKind {
        match self {
            Self::Compare(_) | Self::FixedTrue | Self::FixedFalse | Self::RawSql => {
                OperatorKind::Value
            }
            Self::Boolean(_) | Self::Not => OperatorKind::Boolean,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Compare(op) => op.name(),
            Self::Boolean(op) => op.name(),
            Self::Not => "NOT",
            Self::FixedTrue => "FIXED_TRUE",
            Self::FixedFalse => "FIXED_FALSE",
            Self::RawSql => "RAW_SQL",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
