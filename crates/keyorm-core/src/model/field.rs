use crate::{entity::EntityError, model::entity::EntityModel, value::Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// Text formats accepted when a driver hands back temporal values as text.
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Custom field validator, run on every write through a key.
pub type Validator = fn(&Value) -> Result<(), String>;

///
/// FieldModel
/// Column descriptor for one key of an entity.
///

pub struct FieldModel {
    /// Key name as used in predicates and serialized paths.
    pub name: &'static str,
    /// Column name in the entity's table.
    pub column: &'static str,
    pub kind: FieldKind,
    pub primary_key: bool,
    /// Non-persistent keys live only in memory and never reach SQL.
    pub persistent: bool,
    /// Value a slot holds until written or loaded.
    pub default: Value,
    pub validator: Option<Validator>,
}

impl FieldModel {
    /// A persistent, nullable column with a `Null` default.
    #[must_use]
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            primary_key: false,
            persistent: true,
            default: Value::Null,
            validator: None,
        }
    }

    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub const fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    #[must_use]
    pub const fn with_default(mut self, default: Value) -> Self {
        // const fns cannot run destructors; the replaced value is always `Null`.
        let previous = std::mem::replace(&mut self.default, default);
        std::mem::forget(previous);
        self
    }

    #[must_use]
    pub const fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self.kind, FieldKind::Relation(_))
    }

    /// Target entity of a foreign-key column.
    #[must_use]
    pub const fn foreign_target(&self) -> Option<&'static EntityModel> {
        match self.kind {
            FieldKind::Relation(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldModel")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("primary_key", &self.primary_key)
            .field("persistent", &self.persistent)
            .finish_non_exhaustive()
    }
}

///
/// FieldKind
///
/// Declared value type of a key. A relation is a single-column foreign key
/// to the target entity's primary key.
///

#[derive(Clone, Copy)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    Date,
    Timestamp,
    Relation(&'static EntityModel),
}

impl FieldKind {
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
            Self::Relation(_) => "relation",
        }
    }

    /// Whether a literal may be stored in or compared against this kind.
    ///
    /// Relations accept whatever their target's primary key accepts.
    #[must_use]
    pub fn admits(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (Self::Bool, Value::Bool(_))
            | (Self::Int | Self::Float, Value::Int(_) | Value::Float(_))
            | (Self::Text, Value::Text(_))
            | (Self::Date, Value::Date(_))
            | (Self::Timestamp, Value::Timestamp(_)) => true,
            (Self::Relation(target), value) => target.primary_key_field().kind.admits(value),
            _ => false,
        }
    }

    /// Whether two kinds can be compared column to column.
    #[must_use]
    pub fn comparable_with(self, other: Self) -> bool {
        match (self, other) {
            (Self::Relation(a), Self::Relation(b)) => a.name == b.name,
            (Self::Relation(target), other) | (other, Self::Relation(target)) => {
                target.primary_key_field().kind.comparable_with(other)
            }
            (Self::Int | Self::Float, Self::Int | Self::Float) => true,
            (a, b) => a.label() == b.label(),
        }
    }

    /// Adapt a value handed back by a connection to this kind.
    pub fn accept(self, value: Value) -> Result<Value, EntityError> {
        let adapted = match (self, value) {
            (_, Value::Null) => Value::Null,
            (Self::Bool, Value::Int(v)) => Value::Bool(v != 0),
            (Self::Float, Value::Int(v)) => {
                #[expect(clippy::cast_precision_loss)]
                let v = v as f64;
                Value::Float(v)
            }
            (Self::Date, Value::Text(text)) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| EntityError::decode(self, &text))?,
            (Self::Timestamp, Value::Text(text)) => parse_timestamp(&text)
                .map(Value::Timestamp)
                .ok_or_else(|| EntityError::decode(self, &text))?,
            (Self::Relation(target), value) => target.primary_key_field().kind.accept(value)?,
            (kind, value) if kind.admits(&value) => value,
            (kind, value) => return Err(EntityError::decode(kind, &value)),
        };

        Ok(adapted)
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Print only the target name; relation graphs may be cyclic.
            Self::Relation(target) => write!(f, "Relation({})", target.name),
            other => write!(f, "{}", other.label()),
        }
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}
