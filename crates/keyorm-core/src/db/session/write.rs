use crate::{
    db::{
        predicate::Predicate,
        sql::{CompileError, Dialect, ROOT_ALIAS, SqlCompiler, Statement, StatementKind},
    },
    entity::record::Record,
    model::EntityModel,
    value::Value,
};

/// `INSERT` of every persistent column.
pub(crate) fn insert(record: &Record, dialect: &dyn Dialect) -> Statement {
    let model = record.model;
    let mut columns = Vec::new();
    let mut params = Vec::new();
    for index in model.persistent_fields() {
        columns.push(dialect.quote_ident(model.fields[index].column));
        params.push(record.column_value(index));
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        dialect.quote_ident(model.table),
        columns.join(", "),
    );

    Statement::new(StatementKind::Insert, sql, params)
}

/// `UPDATE` of exactly `columns`, keyed by the identity the row was
/// loaded or saved under.
pub(crate) fn update(
    record: &Record,
    columns: &[usize],
    identity: &Value,
    dialect: &dyn Dialect,
) -> Statement {
    let model = record.model;
    let mut assignments = Vec::with_capacity(columns.len());
    let mut params = Vec::with_capacity(columns.len() + 1);
    for &index in columns {
        assignments.push(format!(
            "{} = ?",
            dialect.quote_ident(model.fields[index].column)
        ));
        params.push(record.column_value(index));
    }
    params.push(identity.clone());

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        dialect.quote_ident(model.table),
        assignments.join(", "),
        dialect.quote_ident(model.primary_key_field().column),
    );

    Statement::new(StatementKind::Update, sql, params)
}

pub(crate) fn delete_by_pk(model: &EntityModel, pk: &Value, dialect: &dyn Dialect) -> Statement {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        dialect.quote_ident(model.table),
        dialect.quote_ident(model.primary_key_field().column),
    );

    Statement::new(StatementKind::Delete, sql, vec![pk.clone()])
}

/// `DELETE` of every row matching `predicate`.
pub(crate) fn delete_where(
    model: &'static EntityModel,
    predicate: &Predicate,
    dialect: &dyn Dialect,
) -> Result<Statement, CompileError> {
    let (filter, params) = keyed_filter(model, predicate, dialect)?;
    let sql = format!(
        "DELETE FROM {} WHERE {filter}",
        dialect.quote_ident(model.table)
    );

    Ok(Statement::new(StatementKind::Delete, sql, params))
}

/// `UPDATE` of `columns`, taking their values from `record`, on every
/// row matching `predicate`.
pub(crate) fn update_where(
    record: &Record,
    columns: &[usize],
    predicate: &Predicate,
    dialect: &dyn Dialect,
) -> Result<Statement, CompileError> {
    let model = record.model;
    let (filter, filter_params) = keyed_filter(model, predicate, dialect)?;

    let mut assignments = Vec::with_capacity(columns.len());
    let mut params = Vec::with_capacity(columns.len() + filter_params.len());
    for &index in columns {
        assignments.push(format!(
            "{} = ?",
            dialect.quote_ident(model.fields[index].column)
        ));
        params.push(record.column_value(index));
    }
    params.extend(filter_params);

    let sql = format!(
        "UPDATE {} SET {} WHERE {filter}",
        dialect.quote_ident(model.table),
        assignments.join(", "),
    );

    Ok(Statement::new(StatementKind::Update, sql, params))
}

/// `pk IN (SELECT ...)` over the rows matching `predicate`, so joined keys
/// work the same as in a `SELECT`.
fn keyed_filter(
    model: &'static EntityModel,
    predicate: &Predicate,
    dialect: &dyn Dialect,
) -> Result<(String, Vec<Value>), CompileError> {
    let mut compiler = SqlCompiler::new(model, dialect);
    let condition = compiler.condition(predicate)?;
    let table = dialect.quote_ident(model.table);
    let pk = dialect.quote_ident(model.primary_key_field().column);

    let filter = format!(
        "{pk} IN (SELECT {ROOT_ALIAS}.{pk} FROM {table} {ROOT_ALIAS}{} WHERE {condition})",
        compiler.joins().render(dialect),
    );
    let (params, _) = compiler.finish();

    Ok((filter, params))
}
