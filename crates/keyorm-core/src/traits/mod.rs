use crate::{model::EntityModel, value::Value};
use chrono::{NaiveDate, NaiveDateTime};

// ============================================================================
// ENTITY KINDS
// ============================================================================

///
/// EntityKind
///
/// Marker for an entity type and the descriptor it is mapped with.
/// Implemented on zero-sized markers; instances are `Entity<Self>` handles.
///

pub trait EntityKind: 'static {
    const MODEL: &'static EntityModel;
}

// ============================================================================
// FIELD TYPES
// ============================================================================

///
/// FieldType
///
/// Rust types a scalar key can be declared with.
///

pub trait FieldType: Sized {
    fn to_value(&self) -> Value;

    /// Convert a slot value back; `None` for `Null` or a variant that does
    /// not fit.
    fn from_value(value: &Value) -> Option<Self>;
}

///
/// TextField
/// Marker for key types that admit the string-match operators.
///

pub trait TextField: FieldType {}

impl TextField for String {}

impl FieldType for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FieldType for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FieldType for i32 {
    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Self::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FieldType for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[expect(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as Self),
            _ => None,
        }
    }
}

impl FieldType for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(ToString::to_string)
    }
}

impl FieldType for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }
}

impl FieldType for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}
