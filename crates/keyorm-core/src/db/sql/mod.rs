//! SQL backend: dialect strategy, predicate compiler and statements.

mod compile;
mod dialect;
mod statement;


pub use compile::{CompiledPredicate, Join, JoinSet, ROOT_ALIAS, SqlCompiler, compile};
pub use dialect::{
    AnsiDialect, Dialect, MySqlDialect, OffsetFetchDialect, PostgresDialect, SqliteDialect,
    dialect_by_name,
};
pub use statement::{Statement, StatementKind};

use crate::db::predicate::CompareOp;
use thiserror::Error as ThisError;

///
/// CompileError
///
/// The compiler cannot map a predicate, sort term or projection to SQL.
/// Raised before any statement is issued.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("key '{entity}.{key}' is not persistent and has no column")]
    NonPersistentKey {
        entity: &'static str,
        key: &'static str,
    },

    #[error("key '{entity}.{key}' is not a foreign key and cannot be joined through")]
    InvalidJoinPath {
        entity: &'static str,
        key: &'static str,
    },

    #[error("key rooted at '{found}' used in a statement on '{expected}'")]
    RootMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("projection key '{key}' must be a direct persistent key of the root entity")]
    InvalidProjection { key: String },

    #[error("key '{key}' cannot compare {op} against another column")]
    UnsupportedOperand { key: String, op: CompareOp },

    #[error("dialect '{dialect}' cannot lock selected rows")]
    LockUnsupported { dialect: &'static str },
}
