use crate::{
    db::{
        predicate::Predicate,
        query::Query,
        sql::{
            AnsiDialect, CompileError, MySqlDialect, OffsetFetchDialect, SqliteDialect,
            StatementKind,
        },
    },
    key::KeyExpr,
    test_fixtures::{Item, Order},
    value::Value,
};

const ITEM_COLUMNS: &str = "t0.\"id\", t0.\"note\", t0.\"order_id\", t0.\"quantity\"";

#[test]
fn empty_predicate_selects_everything_with_an_explicit_where() {
    let statement = Query::<Item>::new()
        .to_select(&AnsiDialect)
        .expect("compile");

    assert_eq!(statement.kind, StatementKind::Select);
    assert_eq!(
        statement.sql,
        format!("SELECT {ITEM_COLUMNS} FROM \"items\" t0 WHERE 1=1")
    );
    assert!(statement.params.is_empty());
    assert_eq!(statement.to_string(), statement.sql);
}

#[test]
fn order_by_reuses_predicate_joins() {
    let query = Query::<Item>::filtered(Item::ORDER.join(Order::NOTE).eq("x"))
        .order_by(Item::ORDER.join(Order::CREATED).desc())
        .order_by(Item::ID)
        .limit(5)
        .offset(10);
    let statement = query.to_select(&AnsiDialect).expect("compile");

    assert_eq!(
        statement.sql,
        format!(
            "SELECT {ITEM_COLUMNS} FROM \"items\" t0 \
             LEFT JOIN \"orders\" t1 ON t1.\"id\" = t0.\"order_id\" \
             WHERE t1.\"note\" = ? \
             ORDER BY t1.\"created_at\" DESC, t0.\"id\" ASC LIMIT 5 OFFSET 10"
        )
    );
    assert_eq!(statement.params, vec![Value::Text("x".into())]);
}

#[test]
fn order_by_alone_introduces_the_join() {
    let statement = Query::<Item>::new()
        .order_by_desc(Item::ORDER.join(Order::NOTE))
        .to_select(&AnsiDialect)
        .expect("compile");

    assert!(statement.sql.contains(
        "LEFT JOIN \"orders\" t1 ON t1.\"id\" = t0.\"order_id\" WHERE 1=1 ORDER BY t1.\"note\" DESC"
    ));
}

#[test]
fn filter_ands_onto_the_existing_predicate() {
    let query = Query::<Item>::filtered(Item::QUANTITY.gt(1)).filter(Item::NOTE.is_null());

    assert_eq!(
        query.predicate(),
        Some(&Item::QUANTITY.gt(1).and(Item::NOTE.is_null()))
    );
}

#[test]
fn paging_is_dialect_specific() {
    let query = Query::<Order>::new().limit(10).offset(20);

    let mysql = query.to_select(&MySqlDialect).expect("compile");
    assert!(mysql.sql.ends_with(" LIMIT 20, 10"));

    let fetch = query.to_select(&OffsetFetchDialect).expect("compile");
    assert!(fetch.sql.ends_with(" OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"));
}

#[test]
fn row_locks_follow_paging() {
    let query = Query::<Item>::filtered(Item::ID.eq(10)).limit(1).for_update();
    assert!(query.spec().is_locked());

    let statement = query.to_select(&AnsiDialect).expect("compile");
    assert!(
        statement
            .sql
            .ends_with(" WHERE t0.\"id\" = ? LIMIT 1 FOR UPDATE")
    );

    let count = query.to_count(&AnsiDialect).expect("compile");
    assert!(!count.sql.contains("FOR UPDATE"));
}

#[test]
fn row_locks_need_dialect_support() {
    let query = Query::<Item>::new().for_update();

    assert_eq!(
        query.to_select(&SqliteDialect),
        Err(CompileError::LockUnsupported { dialect: "sqlite" })
    );
    assert!(!Query::<Item>::new().spec().is_locked());
}

#[test]
fn distinct_prefixes_the_projection() {
    let statement = Query::<Item>::new()
        .distinct()
        .to_select(&AnsiDialect)
        .expect("compile");

    assert!(statement.sql.starts_with("SELECT DISTINCT t0.\"id\""));
}

#[test]
fn count_drops_order_and_paging() {
    let query = Query::<Item>::filtered(Item::QUANTITY.ge(2))
        .order_by(Item::NOTE)
        .limit(3);
    let statement = query.to_count(&AnsiDialect).expect("compile");

    assert_eq!(statement.kind, StatementKind::Count);
    assert_eq!(
        statement.sql,
        "SELECT COUNT(*) FROM \"items\" t0 WHERE t0.\"quantity\" >= ?"
    );
    assert_eq!(statement.params, vec![Value::Int(2)]);
}

#[test]
fn distinct_count_wraps_a_subquery() {
    let statement = Query::<Item>::new()
        .select(Item::NOTE)
        .distinct()
        .to_count(&AnsiDialect)
        .expect("compile");

    assert_eq!(
        statement.sql,
        "SELECT COUNT(*) FROM (SELECT DISTINCT t0.\"id\", t0.\"note\" FROM \"items\" t0 WHERE 1=1) q"
    );
}

#[test]
fn projection_defaults_to_persistent_keys() {
    let query = Query::<Item>::new();

    assert_eq!(query.spec().projection(), Ok(vec![0, 1, 2, 3]));
}

#[test]
fn explicit_projection_always_includes_the_primary_key() {
    let query = Query::<Item>::new().set_columns([Item::QUANTITY.path(), Item::NOTE.path()]);

    // declaration order, not request order
    assert_eq!(query.spec().projection(), Ok(vec![0, 1, 3]));
    assert!(
        query
            .to_select(&AnsiDialect)
            .expect("compile")
            .sql
            .starts_with("SELECT t0.\"id\", t0.\"note\", t0.\"quantity\" FROM")
    );
}

#[test]
fn projection_rejects_composite_and_transient_keys() {
    let composite = Query::<Item>::new().select(Item::ORDER.join(Order::NOTE));
    assert_eq!(
        composite.spec().projection(),
        Err(CompileError::InvalidProjection {
            key: "order.note".to_string()
        })
    );

    let transient = Query::<Item>::new().select(Item::SCRATCH);
    assert!(matches!(
        transient.to_select(&AnsiDialect),
        Err(CompileError::InvalidProjection { .. })
    ));
}

#[test]
fn fetch_size_travels_with_the_statement() {
    let statement = Query::<Item>::new()
        .fetch_size(250)
        .to_select(&AnsiDialect)
        .expect("compile");

    assert_eq!(statement.fetch_size, Some(250));
    assert_eq!(
        Query::<Item>::new()
            .to_select(&AnsiDialect)
            .expect("compile")
            .fetch_size,
        None
    );
}

#[test]
fn queries_are_reusable_values() {
    let query = Query::<Item>::filtered(Predicate::fixed(false)).order_by(Item::ID.desc());
    let first = query.to_select(&AnsiDialect).expect("compile");
    let second = query.clone().to_select(&AnsiDialect).expect("compile");

    assert_eq!(first, second);
    assert!(query.spec().order()[0].descending);
    assert!(Item::ID.desc().is_descending());
}
