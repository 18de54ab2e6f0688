//! Entity instances: mutable records addressed by key ordinal.

mod error;
pub(crate) mod record;

#[cfg(test)]
mod tests;

pub use error::EntityError;

use crate::{
    key::{CompositeKey, Key, RelationKey},
    model::EntityModel,
    traits::{EntityKind, FieldType},
    value::Value,
};
use record::{Record, RecordRef, RelationSlot, Slot, read_path, resolve_relation};
use std::{fmt, marker::PhantomData, rc::Rc};

///
/// Entity
///
/// Handle to one entity record. Clones share the record, so two handles
/// fetched for the same row inside one session are `ptr_eq`.
///
/// Lifecycle: TRANSIENT (`Entity::new`) → MANAGED (attached by a session
/// load or save) → detached (evicted, cache cleared, or session dropped).
/// Writes are tracked in the dirty-key set only while MANAGED.
///

pub struct Entity<E: EntityKind> {
    record: RecordRef,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EntityKind> Entity<E> {
    /// A TRANSIENT instance with every key at its declared default.
    #[must_use]
    pub fn new() -> Self {
        Self::from_record(Record::new(E::MODEL).into_ref())
    }

    pub(crate) const fn from_record(record: RecordRef) -> Self {
        Self {
            record,
            _marker: PhantomData,
        }
    }

    pub(crate) const fn record(&self) -> &RecordRef {
        &self.record
    }

    #[must_use]
    pub const fn model(&self) -> &'static EntityModel {
        E::MODEL
    }

    /// Current value of a scalar key; `None` when the slot is `Null`.
    #[must_use]
    pub fn get<T: FieldType>(&self, key: Key<E, T>) -> Option<T> {
        T::from_value(&self.record.borrow().column_value(key.index()))
    }

    /// Current value of a composite key, resolving relations on the way.
    pub fn get_path<T: FieldType>(
        &self,
        key: &CompositeKey<E, T>,
    ) -> Result<Option<T>, EntityError> {
        let value = read_path(
            &self.record,
            key.path().hops().iter().map(|hop| hop.index()),
        )?;

        Ok(T::from_value(&value))
    }

    /// Raw slot value by ordinal; relations yield their foreign key.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<Value> {
        let record = self.record.borrow();
        (index < record.slots.len()).then(|| record.column_value(index))
    }

    /// Write a scalar key. Runs the key's validator.
    pub fn set<T: FieldType>(
        &self,
        key: Key<E, T>,
        value: impl Into<T>,
    ) -> Result<(), EntityError> {
        self.record
            .borrow_mut()
            .write(key.index(), value.into().to_value())
    }

    pub fn set_null<T: FieldType>(&self, key: Key<E, T>) -> Result<(), EntityError> {
        self.record.borrow_mut().write(key.index(), Value::Null)
    }

    /// Related instance behind a foreign key.
    ///
    /// The first read of an unloaded key on a MANAGED entity loads the
    /// target through the session; later reads return the same instance.
    pub fn relation<R: EntityKind>(
        &self,
        key: RelationKey<E, R>,
    ) -> Result<Option<Entity<R>>, EntityError> {
        Ok(resolve_relation(&self.record, key.index())?.map(Entity::from_record))
    }

    /// Raw foreign-key value, without loading the target.
    #[must_use]
    pub fn relation_id<R: EntityKind>(&self, key: RelationKey<E, R>) -> Value {
        self.record.borrow().column_value(key.index())
    }

    /// Point a foreign key at an instance, or clear it.
    pub fn set_relation<R: EntityKind>(
        &self,
        key: RelationKey<E, R>,
        target: Option<&Entity<R>>,
    ) -> Result<(), EntityError> {
        let Some(target) = target else {
            return self.record.borrow_mut().write(key.index(), Value::Null);
        };

        let pk = target.primary_key();
        let field = &E::MODEL.fields[key.index()];
        if let Some(validator) = field.validator {
            validator(&pk).map_err(|message| EntityError::Validation {
                entity: E::MODEL.name,
                key: field.name,
                message,
            })?;
        }
        self.record.borrow_mut().store(
            key.index(),
            Slot::Relation(RelationSlot::Loaded(Rc::clone(&target.record))),
        );

        Ok(())
    }

    /// Point a foreign key at a primary key value; resolved lazily.
    pub fn set_relation_id<R: EntityKind>(
        &self,
        key: RelationKey<E, R>,
        pk: impl Into<Value>,
    ) -> Result<(), EntityError> {
        self.record.borrow_mut().write(key.index(), pk.into())
    }

    #[must_use]
    pub fn primary_key(&self) -> Value {
        self.record.borrow().primary_key()
    }

    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.record.borrow().is_managed()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.record.borrow().dirty.is_empty()
    }

    /// Names of the keys written since the last save, update or reload.
    #[must_use]
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let record = self.record.borrow();
        record
            .dirty
            .iter()
            .map(|&index| record.model.fields[index].name)
            .collect()
    }

    /// Whether both handles point at the same record.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }
}

impl<E: EntityKind> Clone for Entity<E> {
    fn clone(&self) -> Self {
        Self::from_record(Rc::clone(&self.record))
    }
}

impl<E: EntityKind> Default for Entity<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKind> fmt::Debug for Entity<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.borrow();
        let mut out = f.debug_struct(E::MODEL.name);
        for (index, field) in E::MODEL.fields.iter().enumerate() {
            // relations print their foreign key only; graphs may be cyclic
            out.field(field.name, &record.column_value(index));
        }
        out.finish()
    }
}
