use crate::{db::sql::Statement, value::Value};
use std::error::Error;

/// One result row; values in projection order.
pub type Row = Vec<Value>;

///
/// Connection
///
/// Blocking, JDBC-like connection the session issues statements through.
/// Errors are surfaced to callers unchanged.
///

pub trait Connection {
    type Error: Error + 'static;

    /// Run a `SELECT`, returning every row.
    fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, Self::Error>;

    /// Run `INSERT` / `UPDATE` / `DELETE`, returning the affected row count.
    fn execute(&mut self, statement: &Statement) -> Result<u64, Self::Error>;

    fn commit(&mut self) -> Result<(), Self::Error>;

    fn rollback(&mut self) -> Result<(), Self::Error>;
}
