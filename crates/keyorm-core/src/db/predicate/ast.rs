use crate::{
    db::predicate::{
        PredicateError,
        ops::{BooleanOp, CompareOp, Operator},
    },
    key::KeyPath,
    model::EntityModel,
    value::Value,
};
use regex::Regex;
use std::{
    fmt::{self, Display},
    ops::{BitAnd, BitOr, Not},
};

///
/// Operand
/// Right-hand side of a leaf: a literal or another key on the same root.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Value(Value),
    Key(KeyPath),
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Key(path) => write!(f, "{path}"),
        }
    }
}

///
/// Pattern
/// Regular expression of a REGEXP leaf, anchored for full-match semantics.
///

#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub(crate) fn compile(source: &str) -> Result<Self, PredicateError> {
        let regex =
            Regex::new(&format!("^(?:{source})$")).map_err(|err| PredicateError::InvalidPattern {
                pattern: source.to_string(),
                message: err.to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_full_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

///
/// ComparePredicate
///
/// Value leaf. Only constructible through checked paths, so the operand
/// always fits the key kind and the operator.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparePredicate {
    key: KeyPath,
    op: CompareOp,
    operand: Operand,
    pattern: Option<Pattern>,
}

impl ComparePredicate {
    #[must_use]
    pub const fn key(&self) -> &KeyPath {
        &self.key
    }

    #[must_use]
    pub const fn op(&self) -> CompareOp {
        self.op
    }

    #[must_use]
    pub const fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Compiled pattern of a REGEXP / NOT_REGEXP leaf with a text literal.
    #[must_use]
    pub const fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }
}

///
/// RawSql
/// Verbatim SQL condition with at most one bound value.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RawSql {
    fragment: String,
    value: Option<Value>,
}

impl RawSql {
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

///
/// Predicate
///
/// Immutable boolean expression tree over keys. Combinators always build a
/// new node: no flattening, no negation push-down.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Compare(ComparePredicate),
    Fixed(bool),
    RawSql(RawSql),
    Binary {
        left: Box<Self>,
        op: BooleanOp,
        right: Box<Self>,
    },
    Not(Box<Self>),
}

impl Predicate {
    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------

    /// Checked leaf constructor used by dynamic callers and restore.
    pub fn compare(key: KeyPath, op: CompareOp, operand: Operand) -> Result<Self, PredicateError> {
        let pattern = check_compare(&key, op, &operand)?;

        Ok(Self::Compare(ComparePredicate {
            key,
            op,
            operand,
            pattern,
        }))
    }

    /// Leaf whose operand is already known to fit: typed builders only.
    pub(crate) const fn leaf(key: KeyPath, op: CompareOp, operand: Operand) -> Self {
        Self::Compare(ComparePredicate {
            key,
            op,
            operand,
            pattern: None,
        })
    }

    #[must_use]
    pub const fn fixed(value: bool) -> Self {
        Self::Fixed(value)
    }

    /// SQL-only leaf; the interpreter rejects it.
    pub fn raw_sql(
        fragment: impl Into<String>,
        value: Option<Value>,
    ) -> Result<Self, PredicateError> {
        let fragment = fragment.into();
        if fragment.trim().is_empty() {
            return Err(PredicateError::EmptyRawSql);
        }

        Ok(Self::RawSql(RawSql { fragment, value }))
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    fn binary(self, op: BooleanOp, other: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.binary(BooleanOp::And, other)
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.binary(BooleanOp::Or, other)
    }

    #[must_use]
    pub fn xor(self, other: Self) -> Self {
        self.binary(BooleanOp::Xor, other)
    }

    #[must_use]
    pub fn nand(self, other: Self) -> Self {
        self.binary(BooleanOp::Nand, other)
    }

    #[must_use]
    pub fn nor(self, other: Self) -> Self {
        self.binary(BooleanOp::Nor, other)
    }

    #[must_use]
    pub fn equiv(self, other: Self) -> Self {
        self.binary(BooleanOp::Equiv, other)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Left fold with AND; an empty list is `Fixed(true)`.
    pub fn all(predicates: impl IntoIterator<Item = Self>) -> Self {
        fold(predicates, BooleanOp::And, true)
    }

    /// Left fold with OR; an empty list is `Fixed(false)`.
    pub fn any(predicates: impl IntoIterator<Item = Self>) -> Self {
        fold(predicates, BooleanOp::Or, false)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn operator(&self) -> Operator {
        match self {
            Self::Compare(cmp) => Operator::Compare(cmp.op),
            Self::Fixed(true) => Operator::FixedTrue,
            Self::Fixed(false) => Operator::FixedFalse,
            Self::RawSql(_) => Operator::RawSql,
            Self::Binary { op, .. } => Operator::Boolean(*op),
            Self::Not(_) => Operator::Not,
        }
    }

    /// Visit every key path in the tree, operands included, left to right.
    pub fn for_each_key(&self, visit: &mut impl FnMut(&KeyPath)) {
        match self {
            Self::Compare(cmp) => {
                visit(&cmp.key);
                if let Operand::Key(other) = &cmp.operand {
                    visit(other);
                }
            }
            Self::Fixed(_) | Self::RawSql(_) => {}
            Self::Binary { left, right, .. } => {
                left.for_each_key(visit);
                right.for_each_key(visit);
            }
            Self::Not(inner) => inner.for_each_key(visit),
        }
    }

    /// First key rooted somewhere other than `root`, if any.
    #[must_use]
    pub fn foreign_root(&self, root: &EntityModel) -> Option<&'static EntityModel> {
        let mut found = None;
        self.for_each_key(&mut |path| {
            if found.is_none() && !path.root().same_as(root) {
                found = Some(path.root());
            }
        });

        found
    }
}

fn fold(
    predicates: impl IntoIterator<Item = Predicate>,
    op: BooleanOp,
    neutral: bool,
) -> Predicate {
    predicates
        .into_iter()
        .reduce(|acc, next| acc.binary(op, next))
        .unwrap_or(Predicate::Fixed(neutral))
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::not(self)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare(cmp) => write!(f, "{} {} {}", cmp.key, cmp.op, cmp.operand),
            Self::Fixed(true) => write!(f, "TRUE"),
            Self::Fixed(false) => write!(f, "FALSE"),
            Self::RawSql(raw) => match &raw.value {
                Some(value) => write!(f, "RAW_SQL({}; {value})", raw.fragment),
                None => write!(f, "RAW_SQL({})", raw.fragment),
            },
            Self::Binary { left, op, right } => write!(f, "({left}) {op} ({right})"),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

// ----------------------------------------------------------------------
// Leaf validation
// ----------------------------------------------------------------------

fn check_compare(
    key: &KeyPath,
    op: CompareOp,
    operand: &Operand,
) -> Result<Option<Pattern>, PredicateError> {
    check_path(key)?;
    if let Operand::Key(other) = operand {
        check_path(other)?;
    }
    let kind = key.kind();
    let mismatch = |expected: &'static str, found: &'static str| PredicateError::TypeMismatch {
        key: key.to_string(),
        op,
        expected,
        found,
    };

    if op.is_text_match() {
        if !kind.is_text() {
            return Err(mismatch("text", kind.label()));
        }
        return match operand {
            Operand::Value(Value::Null) => Ok(None),
            Operand::Value(Value::Text(text)) if op.is_regexp() => Pattern::compile(text).map(Some),
            Operand::Value(Value::Text(_)) => Ok(None),
            Operand::Value(other) => Err(mismatch("text", other.family())),
            Operand::Key(_) if op.is_regexp() => Err(mismatch("text literal", "key")),
            Operand::Key(other) if other.kind().is_text() => Ok(None),
            Operand::Key(other) => Err(mismatch("text", other.kind().label())),
        };
    }

    if op.is_membership() {
        return match operand {
            Operand::Value(Value::List(items)) => items
                .iter()
                .find(|item| matches!(item, Value::List(_)) || !kind.admits(item))
                .map_or(Ok(None), |item| Err(mismatch(kind.label(), item.family()))),
            Operand::Value(other) => Err(mismatch("list", other.family())),
            Operand::Key(_) => Err(mismatch("list", "key")),
        };
    }

    match operand {
        Operand::Value(Value::List(_)) => Err(mismatch(kind.label(), "list")),
        Operand::Value(value) if kind.admits(value) => Ok(None),
        Operand::Value(value) => Err(mismatch(kind.label(), value.family())),
        Operand::Key(other) if kind.comparable_with(other.kind()) => Ok(None),
        Operand::Key(other) => Err(mismatch(kind.label(), other.kind().label())),
    }
}

fn check_path(path: &KeyPath) -> Result<(), PredicateError> {
    match path.first_broken_hop() {
        Some(hop) => Err(PredicateError::InvalidJoinPath {
            path: path.to_string(),
            hop: path.hops()[hop].name(),
        }),
        None => Ok(()),
    }
}
