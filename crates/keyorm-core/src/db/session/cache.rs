use crate::{entity::record::RecordRef, model::EntityModel, value::Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::{collections::HashMap, rc::Rc};

///
/// IdentityKey
/// Hashable projection of a primary-key value.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum IdentityKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl IdentityKey {
    /// `None` for values that cannot identify a row.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let key = match value {
            Value::Null | Value::List(_) => return None,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) => Self::Float(v.to_bits()),
            Value::Text(v) => Self::Text(v.clone()),
            Value::Date(v) => Self::Date(*v),
            Value::Timestamp(v) => Self::Timestamp(*v),
        };

        Some(key)
    }
}

///
/// IdentityCache
///
/// Session-owned map from `(entity, primary key)` to the one managed
/// record for that row.
///

#[derive(Default)]
pub(crate) struct IdentityCache {
    entries: HashMap<(&'static str, IdentityKey), RecordRef>,
}

impl IdentityCache {
    pub(crate) fn get(&self, model: &EntityModel, pk: &Value) -> Option<RecordRef> {
        let key = IdentityKey::from_value(pk)?;
        self.entries.get(&(model.name, key)).map(Rc::clone)
    }

    pub(crate) fn insert(&mut self, model: &'static EntityModel, pk: &Value, record: RecordRef) {
        if let Some(key) = IdentityKey::from_value(pk) {
            self.entries.insert((model.name, key), record);
        }
    }

    /// Remove the entry for `pk` if it is `record`.
    pub(crate) fn remove(&mut self, model: &EntityModel, pk: &Value, record: &RecordRef) -> bool {
        let Some(key) = IdentityKey::from_value(pk) else {
            return false;
        };
        let key = (model.name, key);
        if self
            .entries
            .get(&key)
            .is_some_and(|cached| Rc::ptr_eq(cached, record))
        {
            self.entries.remove(&key);
            return true;
        }

        false
    }

    /// Drain every entry.
    pub(crate) fn drain(&mut self) -> Vec<RecordRef> {
        self.entries.drain().map(|(_, record)| record).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
