
use crate::{
    db::predicate::{
        BooleanOp, CompareOp, EvalError, Operator, OperatorKind, Predicate, PredicateDoc,
        PredicateError, evaluate,
    },
    entity::Entity,
    test_fixtures::{Item, Order},
    value::Value,
};

// ---- helpers -----------------------------------------------------------

fn order(note: &str) -> Entity<Order> {
    let order = Entity::<Order>::new();
    order.set(Order::ID, 1).expect("id");
    order.set(Order::NOTE, note).expect("note");
    order
}

fn item(note: &str, order: &Entity<Order>) -> Entity<Item> {
    let item = Entity::<Item>::new();
    item.set(Item::ID, 10).expect("id");
    item.set(Item::NOTE, note).expect("note");
    item.set_relation(Item::ORDER, Some(order)).expect("order");
    item
}

fn holds(predicate: &Predicate, item: &Entity<Item>) -> bool {
    predicate.evaluate(item).expect("evaluate")
}

// ---- scenario ----------------------------------------------------------

#[test]
fn contains_ci_and_composite_key_follow_the_related_order() {
    let predicate = Item::NOTE
        .contains_ci("table")
        .and(Item::ORDER.join(Order::NOTE).eq("My order"));
    let order = order("My order");
    let item = item("Yellow Table", &order);

    assert!(holds(&predicate, &item));

    order.set(Order::NOTE, "Other").expect("note");
    assert!(!holds(&predicate, &item));
}

#[test]
fn display_is_infix_and_parenthesised() {
    let predicate = Item::NOTE
        .contains_ci("table")
        .and(Item::ORDER.join(Order::NOTE).eq("My order"));

    assert_eq!(
        predicate.to_string(),
        "(note CONTAINS_CI \"table\") AND (order.note EQ \"My order\")"
    );
    assert_eq!(
        Item::QUANTITY.in_list([1, 2]).not().to_string(),
        "NOT (quantity IN [1, 2])"
    );
}

// ---- construction ------------------------------------------------------

#[test]
fn text_operators_require_text_keys_and_operands() {
    let err = Item::QUANTITY
        .compare(CompareOp::Contains, "1")
        .expect_err("int key");
    assert!(matches!(
        err,
        PredicateError::TypeMismatch {
            op: CompareOp::Contains,
            expected: "text",
            found: "int",
            ..
        }
    ));

    let err = Item::NOTE
        .compare(CompareOp::StartsCi, 3)
        .expect_err("int operand");
    assert!(matches!(err, PredicateError::TypeMismatch { found: "number", .. }));

    assert!(Item::NOTE.matches(CompareOp::EndsCi, "x").is_ok());
}

#[test]
fn membership_requires_a_list_of_admitted_items() {
    assert!(matches!(
        Item::QUANTITY.compare(CompareOp::In, 3),
        Err(PredicateError::TypeMismatch { expected: "list", .. })
    ));
    assert!(matches!(
        Item::QUANTITY.compare(CompareOp::In, Value::from_list(["a"])),
        Err(PredicateError::TypeMismatch { found: "text", .. })
    ));
    assert!(Item::QUANTITY
        .compare(CompareOp::NotIn, Value::from_list([1, 2]))
        .is_ok());
}

#[test]
fn scalar_operators_reject_lists_and_foreign_families() {
    assert!(Item::QUANTITY
        .compare(CompareOp::Eq, Value::from_list([1]))
        .is_err());
    assert!(Item::NOTE.compare(CompareOp::Gt, 3).is_err());
    assert!(Item::QUANTITY.compare(CompareOp::Ge, 2.5).is_ok());
}

#[test]
fn key_operands_must_be_comparable() {
    assert!(Item::NOTE
        .compare_key(CompareOp::Eq, &Item::ORDER.join(Order::NOTE))
        .is_ok());
    assert!(Item::NOTE
        .compare_key(CompareOp::Eq, &Item::QUANTITY)
        .is_err());
    assert!(Item::NOTE
        .compare_key(CompareOp::Regexp, &Item::ORDER.join(Order::NOTE))
        .is_err());
}

#[test]
fn regexp_literals_are_compiled_when_built() {
    let err = Item::NOTE.regexp("(unclosed").expect_err("bad pattern");

    assert!(matches!(err, PredicateError::InvalidPattern { .. }));
}

#[test]
fn raw_sql_needs_a_fragment() {
    assert_eq!(
        Predicate::raw_sql("  ", None),
        Err(PredicateError::EmptyRawSql)
    );
    assert!(Predicate::raw_sql("t0.\"note\" = ?", Some(Value::from("x"))).is_ok());
}

#[test]
fn combinators_never_flatten() {
    let a = Item::NOTE.is_null();
    let b = Item::QUANTITY.eq(1);
    let c = Item::QUANTITY.eq(2);

    let nested = a.clone().and(b.clone()).and(c.clone());
    let Predicate::Binary { left, op, right } = &nested else {
        panic!("expected a binary node");
    };
    assert_eq!(*op, BooleanOp::And);
    assert_eq!(**right, c);
    assert_eq!(**left, a.clone().and(b.clone()));

    assert_eq!(a.clone() & b.clone(), a.clone().and(b.clone()));
    assert_eq!(a.clone() | b.clone(), a.clone().or(b));
    assert_eq!(!a.clone(), a.not());
}

#[test]
fn all_and_any_fold_with_neutral_elements() {
    assert_eq!(Predicate::all(Vec::new()), Predicate::fixed(true));
    assert_eq!(Predicate::any(Vec::new()), Predicate::fixed(false));

    let a = Item::QUANTITY.eq(1);
    let b = Item::QUANTITY.eq(2);
    assert_eq!(Predicate::all([a.clone()]), a);
    assert_eq!(
        Predicate::any([a.clone(), b.clone(), a.clone()]),
        a.clone().or(b).or(a)
    );
}

#[test]
fn operator_catalog_tags_each_node() {
    let leaf = Item::NOTE.starts("a");
    assert_eq!(leaf.operator(), Operator::Compare(CompareOp::Starts));
    assert_eq!(leaf.operator().kind(), OperatorKind::Value);

    let combined = leaf.clone().nor(Predicate::fixed(false));
    assert_eq!(combined.operator(), Operator::Boolean(BooleanOp::Nor));
    assert_eq!(combined.operator().kind(), OperatorKind::Boolean);

    assert_eq!(leaf.not().operator(), Operator::Not);
    assert_eq!(Predicate::fixed(true).operator(), Operator::FixedTrue);
    assert_eq!(Operator::FixedFalse.kind(), OperatorKind::Value);
    assert_eq!(CompareOp::NotIn.negated(), Some(CompareOp::In));
    assert_eq!(CompareOp::Gt.negated(), None);
}

// ---- interpreter -------------------------------------------------------

#[test]
fn null_equality_is_two_valued() {
    let item = Entity::<Item>::new();

    assert!(holds(&Item::NOTE.is_null(), &item));
    assert!(!holds(&Item::NOTE.is_not_null(), &item));
    assert!(!holds(&Item::NOTE.eq("x"), &item));
    // diverges from SQL, where `NULL <> 'x'` is unknown
    assert!(holds(&Item::NOTE.ne("x"), &item));
}

#[test]
fn ordering_against_null_is_false_both_ways() {
    let item = Entity::<Item>::new();
    item.set_null(Item::QUANTITY).expect("clear");

    for predicate in [
        Item::QUANTITY.gt(0),
        Item::QUANTITY.ge(0),
        Item::QUANTITY.lt(0),
        Item::QUANTITY.le(0),
    ] {
        assert!(!holds(&predicate, &item), "{predicate}");
    }

    // null on the operand side, through a key comparison
    item.set(Item::QUANTITY, 3).expect("quantity");
    let other = Item::QUANTITY
        .compare_key(CompareOp::Le, &Item::ID)
        .expect("comparable keys");
    item.set_null(Item::ID).expect("clear id");
    assert!(!holds(&other, &item));
}

#[test]
fn membership_handles_empty_lists_and_null() {
    let item = Entity::<Item>::new();
    item.set(Item::QUANTITY, 2).expect("quantity");

    assert!(holds(&Item::QUANTITY.in_list([1, 2]), &item));
    assert!(!holds(&Item::QUANTITY.not_in([1, 2]), &item));
    assert!(!holds(&Item::QUANTITY.in_list(Vec::<i64>::new()), &item));
    assert!(holds(&Item::QUANTITY.not_in(Vec::<i64>::new()), &item));

    item.set_null(Item::QUANTITY).expect("clear");
    assert!(!holds(&Item::QUANTITY.in_list([1, 2]), &item));
    assert!(holds(&Item::QUANTITY.not_in([1, 2]), &item));
}

#[test]
fn text_operators_match_case_as_asked() {
    let order = order("My order");
    let item = item("Yellow Table", &order);

    assert!(holds(&Item::NOTE.starts("Yellow"), &item));
    assert!(!holds(&Item::NOTE.starts("yellow"), &item));
    assert!(holds(&Item::NOTE.starts_ci("yellow"), &item));
    assert!(holds(&Item::NOTE.ends("Table"), &item));
    assert!(holds(&Item::NOTE.ends_ci("TABLE"), &item));
    assert!(!holds(&Item::NOTE.contains("table"), &item));
    assert!(holds(&Item::NOTE.equals_ci("yellow table"), &item));
    assert!(!holds(&Item::NOTE.equals_ci("yellow"), &item));
}

#[test]
fn text_operators_are_false_on_null() {
    let item = Entity::<Item>::new();

    assert!(!holds(&Item::NOTE.contains(""), &item));
    assert!(!holds(&Item::NOTE.starts_ci(""), &item));
    assert!(!holds(&Item::NOTE.regexp(".*").expect("pattern"), &item));
    assert!(!holds(&Item::NOTE.not_regexp("x").expect("pattern"), &item));
}

#[test]
fn regexp_is_a_full_match() {
    let order = order("My order");
    let item = item("Yellow Table", &order);

    assert!(holds(&Item::NOTE.regexp("Yel.*").expect("pattern"), &item));
    assert!(!holds(&Item::NOTE.regexp("Yel").expect("pattern"), &item));
    assert!(holds(&Item::NOTE.not_regexp("Yel").expect("pattern"), &item));
    assert!(holds(&Item::NOTE.regexp("a|Yellow Table").expect("pattern"), &item));
}

#[test]
fn key_operands_read_off_the_same_entity() {
    let order = order("Yellow Table");
    let item = item("Yellow Table", &order);
    let same_note = Item::NOTE.eq_key(&Item::ORDER.join(Order::NOTE));

    assert!(holds(&same_note, &item));
    assert!(holds(
        &Item::NOTE
            .compare_key(CompareOp::ContainsCi, &Item::ORDER.join(Order::NOTE))
            .expect("text keys"),
        &item
    ));

    order.set(Order::NOTE, "Other").expect("note");
    assert!(!holds(&same_note, &item));
}

#[test]
fn boolean_combinators_follow_their_truth_tables() {
    let item = Entity::<Item>::new();
    let t = || Predicate::fixed(true);
    let f = || Predicate::fixed(false);

    assert!(holds(&t().xor(f()), &item));
    assert!(!holds(&t().xor(t()), &item));
    assert!(holds(&t().nand(f()), &item));
    assert!(!holds(&t().nand(t()), &item));
    assert!(holds(&f().nor(f()), &item));
    assert!(!holds(&t().nor(f()), &item));
    assert!(holds(&f().equiv(f()), &item));
    assert!(!holds(&t().equiv(f()), &item));
    assert!(holds(&f().not(), &item));
}

#[test]
fn and_or_short_circuit_past_sql_only_leaves() {
    let item = Entity::<Item>::new();
    let raw = Predicate::raw_sql("1 = 1", None).expect("raw");

    assert!(!holds(&Predicate::fixed(false).and(raw.clone()), &item));
    assert!(holds(&Predicate::fixed(true).or(raw.clone()), &item));

    let err = evaluate(&Predicate::fixed(true).and(raw), &item).expect_err("sql only");
    assert!(matches!(err, EvalError::UnsupportedPredicate { .. }));
}

#[test]
fn predicates_on_another_entity_are_rejected() {
    let item = Entity::<Item>::new();
    let err = Order::NOTE.eq("x").evaluate(&item).expect_err("wrong root");

    assert!(matches!(
        err,
        EvalError::RootMismatch {
            expected: "Item",
            found: "Order"
        }
    ));
}

#[test]
fn filter_keeps_matching_instances_in_order() {
    let items: Vec<_> = [3, 1, 4, 1, 5]
        .into_iter()
        .map(|quantity| {
            let item = Entity::<Item>::new();
            item.set(Item::QUANTITY, quantity).expect("quantity");
            item
        })
        .collect();

    let kept = Item::QUANTITY.le(3).filter(&items).expect("filter");

    assert_eq!(kept.len(), 3);
    assert!(kept[0].ptr_eq(&items[0]));
    assert!(kept[2].ptr_eq(&items[3]));
}

// ---- serialization -----------------------------------------------------

#[test]
fn documents_name_keys_by_path() {
    let doc = Item::ORDER.join(Order::NOTE).eq("My order").to_doc();
    let json = serde_json::to_value(&doc).expect("serialize");

    assert_eq!(json["node"], "compare");
    assert_eq!(json["key"], serde_json::json!(["order", "note"]));
    assert_eq!(json["op"], "eq");
}

#[test]
fn restore_resolves_names_against_the_root() {
    let predicate = Item::NOTE
        .regexp("Ye.*")
        .expect("pattern")
        .or(Item::ORDER.join(Order::NOTE).ne("x").not());
    let json = serde_json::to_string(&predicate.to_doc()).expect("serialize");
    let doc: PredicateDoc = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(doc.restore_for::<Item>().expect("restore"), predicate);
}

#[test]
fn restore_reports_unknown_names_and_bad_hops() {
    let doc: PredicateDoc = serde_json::from_value(serde_json::json!({
        "node": "compare",
        "key": ["order", "missing"],
        "op": "eq",
        "operand": { "value": { "Int": 1 } }
    }))
    .expect("deserialize");
    assert_eq!(
        doc.restore_for::<Item>(),
        Err(PredicateError::UnresolvedKey {
            entity: "Order",
            name: "missing".to_string()
        })
    );

    let doc: PredicateDoc = serde_json::from_value(serde_json::json!({
        "node": "compare",
        "key": ["note", "id"],
        "op": "eq",
        "operand": { "value": { "Int": 1 } }
    }))
    .expect("deserialize");
    assert!(matches!(
        doc.restore_for::<Item>(),
        Err(PredicateError::InvalidJoinPath { hop: "note", .. })
    ));
}

#[test]
fn restore_revalidates_leaves() {
    let doc: PredicateDoc = serde_json::from_value(serde_json::json!({
        "node": "compare",
        "key": ["quantity"],
        "op": "contains",
        "operand": { "value": { "Text": "1" } }
    }))
    .expect("deserialize");

    assert!(matches!(
        doc.restore_for::<Item>(),
        Err(PredicateError::TypeMismatch { .. })
    ));
}
