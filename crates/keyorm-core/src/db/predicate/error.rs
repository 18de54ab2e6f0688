use crate::{db::predicate::ops::CompareOp, entity::EntityError};
use thiserror::Error as ThisError;

///
/// PredicateError
/// Build-time and restore-time failures.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PredicateError {
    #[error("key '{key}' cannot take {op}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        op: CompareOp,
        expected: &'static str,
        found: &'static str,
    },

    #[error("entity '{entity}' has no key named '{name}'")]
    UnresolvedKey { entity: &'static str, name: String },

    #[error("key path '{path}' crosses '{hop}', which is not a relation to the next hop")]
    InvalidJoinPath { path: String, hop: &'static str },

    #[error("raw SQL predicate requires a non-empty fragment")]
    EmptyRawSql,

    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

///
/// EvalError
/// Interpreter failures.
///

#[derive(Debug, ThisError)]
pub enum EvalError {
    #[error("predicate '{fragment}' is SQL-only and cannot be evaluated in memory")]
    UnsupportedPredicate { fragment: String },

    #[error("predicate key is rooted at '{found}', entity is '{expected}'")]
    RootMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Entity(#[from] EntityError),
}
