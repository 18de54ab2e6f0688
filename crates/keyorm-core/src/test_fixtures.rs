//! Shared test entities: `Customer` <- `Order` <- `Item`.

use crate::{
    key::{Key, RelationKey},
    model::{EntityModel, FieldKind, FieldModel},
    traits::EntityKind,
    value::Value,
};
use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

static CUSTOMER_FIELDS: [FieldModel; 2] = [
    FieldModel::new("id", "id", FieldKind::Int).primary_key(),
    FieldModel::new("name", "name", FieldKind::Text),
];

pub(crate) static CUSTOMER_MODEL: EntityModel =
    EntityModel::new("Customer", "customers", &CUSTOMER_FIELDS, 0);

pub(crate) struct Customer;

impl EntityKind for Customer {
    const MODEL: &'static EntityModel = &CUSTOMER_MODEL;
}

impl Customer {
    pub(crate) const ID: Key<Self, i64> = Key::new(0);
    pub(crate) const NAME: Key<Self, String> = Key::new(1);
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

static ORDER_FIELDS: [FieldModel; 6] = [
    FieldModel::new("id", "id", FieldKind::Int).primary_key(),
    FieldModel::new("note", "note", FieldKind::Text),
    FieldModel::new("created", "created_at", FieldKind::Timestamp),
    FieldModel::new("customer", "customer_id", FieldKind::Relation(&CUSTOMER_MODEL)),
    FieldModel::new("total", "total", FieldKind::Float).with_default(Value::Float(0.0)),
    FieldModel::new("shipped_on", "shipped_on", FieldKind::Date),
];

pub(crate) static ORDER_MODEL: EntityModel =
    EntityModel::new("Order", "orders", &ORDER_FIELDS, 0);

pub(crate) struct Order;

impl EntityKind for Order {
    const MODEL: &'static EntityModel = &ORDER_MODEL;
}

impl Order {
    pub(crate) const ID: Key<Self, i64> = Key::new(0);
    pub(crate) const NOTE: Key<Self, String> = Key::new(1);
    pub(crate) const CREATED: Key<Self, NaiveDateTime> = Key::new(2);
    pub(crate) const CUSTOMER: RelationKey<Self, Customer> = RelationKey::new(3);
    pub(crate) const TOTAL: Key<Self, f64> = Key::new(4);
    pub(crate) const SHIPPED_ON: Key<Self, NaiveDate> = Key::new(5);
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

fn non_negative(value: &Value) -> Result<(), String> {
    match value {
        Value::Int(v) if *v < 0 => Err(format!("quantity must be non-negative, got {v}")),
        _ => Ok(()),
    }
}

static ITEM_FIELDS: [FieldModel; 5] = [
    FieldModel::new("id", "id", FieldKind::Int).primary_key(),
    FieldModel::new("note", "note", FieldKind::Text),
    FieldModel::new("order", "order_id", FieldKind::Relation(&ORDER_MODEL)),
    FieldModel::new("quantity", "quantity", FieldKind::Int)
        .with_default(Value::Int(1))
        .with_validator(non_negative),
    FieldModel::new("scratch", "scratch", FieldKind::Text).transient(),
];

pub(crate) static ITEM_MODEL: EntityModel = EntityModel::new("Item", "items", &ITEM_FIELDS, 0);

pub(crate) struct Item;

impl EntityKind for Item {
    const MODEL: &'static EntityModel = &ITEM_MODEL;
}

impl Item {
    pub(crate) const ID: Key<Self, i64> = Key::new(0);
    pub(crate) const NOTE: Key<Self, String> = Key::new(1);
    pub(crate) const ORDER: RelationKey<Self, Order> = RelationKey::new(2);
    pub(crate) const QUANTITY: Key<Self, i64> = Key::new(3);
    pub(crate) const SCRATCH: Key<Self, String> = Key::new(4);
}

/// `2024-01-<day> 12:00:00`.
pub(crate) fn timestamp(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid fixture timestamp")
}
