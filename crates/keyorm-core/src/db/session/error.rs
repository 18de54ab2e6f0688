use crate::{
    db::{predicate::PredicateError, sql::CompileError},
    entity::EntityError,
};
use std::error::Error;
use thiserror::Error as ThisError;

///
/// SessionError
///
/// Everything a session operation can fail with. Connection errors are
/// carried unchanged so callers can tell retryable database failures from
/// the structural errors above them.
///

#[derive(Debug, ThisError)]
pub enum SessionError<E: Error + 'static> {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("entity '{entity}' has no changed persistent keys to update")]
    NoChanges { entity: &'static str },

    #[error("entity '{entity}' cannot be written with a null primary key")]
    MissingPrimaryKey { entity: &'static str },

    #[error("entity '{entity}' is not managed by this session")]
    NotManaged { entity: &'static str },

    #[error("query on '{entity}' matched more than one row")]
    NotUnique { entity: &'static str },

    #[error("entity '{entity}' cannot change the primary key of matched rows")]
    PrimaryKeyUpdate { entity: &'static str },

    #[error("statement on '{table}' returned rows of {found} values, expected {expected}")]
    RowShape {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Connection(E),
}

impl<E: Error + 'static> SessionError<E> {
    /// Whether the caller may treat the failure as a no-op.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoChanges { .. })
    }

    /// The connection error, if that is what failed.
    #[must_use]
    pub const fn connection(&self) -> Option<&E> {
        match self {
            Self::Connection(err) => Some(err),
            _ => None,
        }
    }
}
