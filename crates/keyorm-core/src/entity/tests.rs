use crate::{
    entity::{Entity, EntityError},
    test_fixtures::{Item, Order},
    value::Value,
};

fn order(id: i64, note: &str) -> Entity<Order> {
    let order = Entity::<Order>::new();
    order.set(Order::ID, id).expect("id");
    order.set(Order::NOTE, note).expect("note");
    order
}

#[test]
fn new_instances_start_at_declared_defaults() {
    let item = Entity::<Item>::new();

    assert_eq!(item.get(Item::QUANTITY), Some(1));
    assert_eq!(item.get(Item::NOTE), None);
    assert_eq!(item.primary_key(), Value::Null);
    assert_eq!(Entity::<Order>::new().get(Order::TOTAL), Some(0.0));
}

#[test]
fn writes_read_back_through_the_same_key() {
    let item = Entity::<Item>::new();
    item.set(Item::NOTE, "Yellow Table").expect("note");
    item.set(Item::SCRATCH, "in memory only").expect("scratch");

    assert_eq!(item.get(Item::NOTE).as_deref(), Some("Yellow Table"));
    assert_eq!(item.get(Item::SCRATCH).as_deref(), Some("in memory only"));

    item.set_null(Item::NOTE).expect("clear");
    assert_eq!(item.get(Item::NOTE), None);
}

#[test]
fn validator_rejects_and_leaves_slot_untouched() {
    let item = Entity::<Item>::new();
    item.set(Item::QUANTITY, 4).expect("valid quantity");

    let err = item.set(Item::QUANTITY, -1).expect_err("negative quantity");

    assert!(matches!(
        err,
        EntityError::Validation {
            key: "quantity",
            ..
        }
    ));
    assert_eq!(item.get(Item::QUANTITY), Some(4));
}

#[test]
fn transient_instances_track_no_changes() {
    let item = Entity::<Item>::new();
    item.set(Item::NOTE, "x").expect("note");

    assert!(!item.is_managed());
    assert!(!item.is_dirty());
    assert!(item.changed_keys().is_empty());
}

#[test]
fn assigned_relations_resolve_without_a_session() {
    let order = order(7, "My order");
    let item = Entity::<Item>::new();
    item.set_relation(Item::ORDER, Some(&order)).expect("relation");

    let related = item
        .relation(Item::ORDER)
        .expect("resolve")
        .expect("assigned");
    assert!(related.ptr_eq(&order));
    assert_eq!(item.relation_id(Item::ORDER), Value::Int(7));
    assert_eq!(
        item.get_path(&Item::ORDER.join(Order::NOTE))
            .expect("read path")
            .as_deref(),
        Some("My order")
    );

    // later writes to the target are visible through the relation
    order.set(Order::ID, 8).expect("id");
    assert_eq!(item.relation_id(Item::ORDER), Value::Int(8));
}

#[test]
fn null_relations_read_as_null_downstream() {
    let item = Entity::<Item>::new();

    assert!(item.relation(Item::ORDER).expect("resolve").is_none());
    assert_eq!(
        item.get_path(&Item::ORDER.join(Order::NOTE)).expect("read path"),
        None
    );
}

#[test]
fn unloaded_relation_without_session_is_detached() {
    let item = Entity::<Item>::new();
    item.set_relation_id(Item::ORDER, 3).expect("fk");

    let err = item.relation(Item::ORDER).expect_err("no session to load from");

    assert!(matches!(err, EntityError::Detached { key: "order", .. }));
    assert_eq!(item.relation_id(Item::ORDER), Value::Int(3));
}

#[test]
fn foreign_key_writes_are_type_checked() {
    let item = Entity::<Item>::new();
    let err = item
        .set_relation_id(Item::ORDER, "seven")
        .expect_err("text is not an order id");

    assert!(matches!(err, EntityError::TypeMismatch { key: "order", .. }));
}

#[test]
fn clones_share_one_record() {
    let a = order(1, "first");
    let b = a.clone();
    b.set(Order::NOTE, "second").expect("note");

    assert!(a.ptr_eq(&b));
    assert_eq!(a.get(Order::NOTE).as_deref(), Some("second"));
    assert!(!a.ptr_eq(&order(1, "second")));
}

#[test]
fn value_at_is_bounds_checked() {
    let order = order(1, "x");

    assert_eq!(order.value_at(0), Some(Value::Int(1)));
    assert_eq!(order.value_at(99), None);
}

#[test]
fn debug_prints_column_values() {
    let order = order(1, "x");
    let rendered = format!("{order:?}");

    assert!(rendered.starts_with("Order {"));
    assert!(rendered.contains("note: Text(\"x\")"));
}
