//! In-memory SQLite connection for tests that run compiled SQL for real.

use crate::{
    db::{
        connection::{Connection, Row},
        sql::{Statement, StatementKind},
    },
    value::Value,
};
use rusqlite::types::{Value as SqlValue, ValueRef};

const SCHEMA: &str = r#"
    CREATE TABLE "customers" (
        "id" INTEGER PRIMARY KEY,
        "name" TEXT
    );
    CREATE TABLE "orders" (
        "id" INTEGER PRIMARY KEY,
        "note" TEXT,
        "created_at" TEXT,
        "customer_id" INTEGER REFERENCES "customers" ("id"),
        "total" REAL,
        "shipped_on" TEXT
    );
    CREATE TABLE "items" (
        "id" INTEGER PRIMARY KEY,
        "note" TEXT,
        "order_id" INTEGER REFERENCES "orders" ("id"),
        "quantity" INTEGER
    );
"#;

///
/// SqliteConnection
/// Records every statement it is handed.
///

pub(crate) struct SqliteConnection {
    conn: rusqlite::Connection,
    pub(crate) log: Vec<Statement>,
}

impl SqliteConnection {
    pub(crate) fn open() -> Self {
        let conn = rusqlite::Connection::open_in_memory().expect("open in-memory database");
        // dangling foreign keys are seeded on purpose
        conn.execute_batch("PRAGMA case_sensitive_like = ON; PRAGMA foreign_keys = OFF;")
            .expect("configure fixture database");
        conn.execute_batch(SCHEMA).expect("create fixture schema");

        Self {
            conn,
            log: Vec::new(),
        }
    }

    /// Run raw SQL against the database, bypassing the log.
    pub(crate) fn seed(&self, sql: &str) {
        self.conn.execute_batch(sql).expect("seed fixture rows");
    }

    pub(crate) fn issued(&self, kind: StatementKind) -> usize {
        self.log
            .iter()
            .filter(|statement| statement.kind == kind)
            .count()
    }

    pub(crate) fn clear_log(&mut self) {
        self.log.clear();
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null | Value::List(_) => SqlValue::Null,
        Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
        Value::Int(v) => SqlValue::Integer(*v),
        Value::Float(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Date(v) => SqlValue::Text(v.format("%Y-%m-%d").to_string()),
        Value::Timestamp(v) => SqlValue::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

impl Connection for SqliteConnection {
    type Error = rusqlite::Error;

    fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, Self::Error> {
        self.log.push(statement.clone());

        let mut prepared = self.conn.prepare(&statement.sql)?;
        let width = prepared.column_count();
        let params: Vec<SqlValue> = statement.params.iter().map(to_sql).collect();
        let rows = prepared.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            (0..width)
                .map(|index| row.get_ref(index).map(from_sql))
                .collect::<Result<Row, _>>()
        })?;

        rows.collect()
    }

    fn execute(&mut self, statement: &Statement) -> Result<u64, Self::Error> {
        self.log.push(statement.clone());

        let params: Vec<SqlValue> = statement.params.iter().map(to_sql).collect();
        let affected = self
            .conn
            .execute(&statement.sql, rusqlite::params_from_iter(params.iter()))?;

        Ok(affected as u64)
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
