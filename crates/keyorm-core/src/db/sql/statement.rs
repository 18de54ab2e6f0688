use crate::value::Value;
use derive_more::Display;

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StatementKind {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Count => "count",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

///
/// Statement
///
/// Rendered SQL with positional `?` placeholders and their values in order.
///

#[derive(Clone, Debug, Display, PartialEq)]
#[display("{sql}")]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Value>,
    /// Driver fetch-size hint; `None` leaves the driver default.
    pub fetch_size: Option<u32>,
}

impl Statement {
    #[must_use]
    pub const fn new(kind: StatementKind, sql: String, params: Vec<Value>) -> Self {
        Self {
            kind,
            sql,
            params,
            fetch_size: None,
        }
    }
}
