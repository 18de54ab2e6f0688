use std::fmt;

///
/// Dialect
///
/// Injected per-database spelling: identifier quoting, paging, constant
/// predicates, regular expressions and string concatenation. Everything
/// else the compiler emits is plain ANSI.
///

pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Constant predicate.
    fn fixed(&self, value: bool) -> &'static str {
        if value { "1=1" } else { "1=0" }
    }

    /// Paging clause, `None` when neither bound applies.
    fn limit_offset(&self, limit: Option<u64>, offset: u64) -> Option<String> {
        match (limit, offset) {
            (None, 0) => None,
            (Some(limit), 0) => Some(format!("LIMIT {limit}")),
            (Some(limit), offset) => Some(format!("LIMIT {limit} OFFSET {offset}")),
            (None, offset) => Some(format!("OFFSET {offset}")),
        }
    }

    fn regexp(&self, column: &str, placeholder: &str, negate: bool) -> String {
        if negate {
            format!("NOT ({column} REGEXP {placeholder})")
        } else {
            format!("{column} REGEXP {placeholder}")
        }
    }

    fn concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    /// Pessimistic row lock appended to a `SELECT`; `None` when the
    /// database has no such clause.
    fn lock_for_update(&self) -> Option<&'static str> {
        Some("FOR UPDATE")
    }
}

///
/// AnsiDialect
/// Default spelling; also what SQLite accepts.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }
}

///
/// SqliteDialect
/// ANSI spelling without row locks.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn lock_for_update(&self) -> Option<&'static str> {
        None
    }
}

///
/// MySqlDialect
///

#[derive(Clone, Copy, Debug, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn limit_offset(&self, limit: Option<u64>, offset: u64) -> Option<String> {
        match (limit, offset) {
            (None, 0) => None,
            (Some(limit), 0) => Some(format!("LIMIT {limit}")),
            (Some(limit), offset) => Some(format!("LIMIT {offset}, {limit}")),
            (None, offset) => Some(format!("LIMIT {offset}, {}", u64::MAX)),
        }
    }

    fn concat(&self, parts: &[&str]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }
}

///
/// PostgresDialect
///

#[derive(Clone, Copy, Debug, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn fixed(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    fn regexp(&self, column: &str, placeholder: &str, negate: bool) -> String {
        let op = if negate { "!~" } else { "~" };
        format!("{column} {op} {placeholder}")
    }
}

///
/// OffsetFetchDialect
/// SQL:2008 paging (`OFFSET .. ROWS FETCH NEXT .. ROWS ONLY`).
///

#[derive(Clone, Copy, Debug, Default)]
pub struct OffsetFetchDialect;

impl Dialect for OffsetFetchDialect {
    fn name(&self) -> &'static str {
        "offset-fetch"
    }

    fn limit_offset(&self, limit: Option<u64>, offset: u64) -> Option<String> {
        match (limit, offset) {
            (None, 0) => None,
            (None, offset) => Some(format!("OFFSET {offset} ROWS")),
            (Some(limit), offset) => Some(format!(
                "OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"
            )),
        }
    }
}

/// Resolve a configured dialect name.
#[must_use]
pub fn dialect_by_name(name: &str) -> Option<Box<dyn Dialect>> {
    match name.to_ascii_lowercase().as_str() {
        "ansi" => Some(Box::new(AnsiDialect)),
        "sqlite" => Some(Box::new(SqliteDialect)),
        "mysql" | "mariadb" => Some(Box::new(MySqlDialect)),
        "postgres" | "postgresql" => Some(Box::new(PostgresDialect)),
        "offset-fetch" | "sql2008" => Some(Box::new(OffsetFetchDialect)),
        _ => None,
    }
}

///
/// TESTS
///
