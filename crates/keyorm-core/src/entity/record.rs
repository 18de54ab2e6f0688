use crate::{
    entity::EntityError,
    model::{EntityModel, FieldKind},
    value::Value,
};
use std::{
    cell::RefCell,
    collections::BTreeSet,
    error::Error,
    rc::{Rc, Weak},
};

pub(crate) type RecordRef = Rc<RefCell<Record>>;

///
/// RelationLoader
///
/// Type-erased back-reference from a managed record to its session.
/// Loads a target row by primary key, going through the session cache.
///

pub(crate) trait RelationLoader {
    fn load_record(
        self: Rc<Self>,
        model: &'static EntityModel,
        pk: &Value,
    ) -> Result<Option<RecordRef>, Box<dyn Error>>;
}

///
/// RelationSlot
///
/// State of a foreign-key field. `Unloaded` holds the raw key read from
/// the row; resolution replaces it with `Loaded` exactly once.
///

#[derive(Clone)]
pub(crate) enum RelationSlot {
    Null,
    Unloaded(Value),
    Loaded(RecordRef),
}

#[derive(Clone)]
pub(crate) enum Slot {
    Value(Value),
    Relation(RelationSlot),
}

///
/// Attachment
/// Present while the record is MANAGED.
///

pub(crate) struct Attachment {
    pub(crate) loader: Weak<dyn RelationLoader>,
    /// Primary key the record is cached under.
    pub(crate) identity: Value,
}

///
/// Record
///

pub(crate) struct Record {
    pub(crate) model: &'static EntityModel,
    pub(crate) slots: Vec<Slot>,
    /// Slots populated from the database at least once.
    pub(crate) loaded: Vec<bool>,
    pub(crate) dirty: BTreeSet<usize>,
    pub(crate) attachment: Option<Attachment>,
}

impl Record {
    /// A TRANSIENT record with every slot at its declared default.
    pub(crate) fn new(model: &'static EntityModel) -> Self {
        let slots = model
            .fields
            .iter()
            .map(|field| match field.kind {
                FieldKind::Relation(_) => Slot::Relation(if field.default.is_null() {
                    RelationSlot::Null
                } else {
                    RelationSlot::Unloaded(field.default.clone())
                }),
                _ => Slot::Value(field.default.clone()),
            })
            .collect();

        Self {
            model,
            slots,
            loaded: vec![false; model.fields.len()],
            dirty: BTreeSet::new(),
            attachment: None,
        }
    }

    pub(crate) fn into_ref(self) -> RecordRef {
        Rc::new(RefCell::new(self))
    }

    pub(crate) fn is_managed(&self) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|attachment| attachment.loader.strong_count() > 0)
    }

    pub(crate) fn loader(&self) -> Option<Rc<dyn RelationLoader>> {
        self.attachment
            .as_ref()
            .and_then(|attachment| attachment.loader.upgrade())
    }

    /// Raw column value of a slot; relations yield their foreign key.
    pub(crate) fn column_value(&self, index: usize) -> Value {
        match &self.slots[index] {
            Slot::Value(value) => value.clone(),
            Slot::Relation(RelationSlot::Null) => Value::Null,
            Slot::Relation(RelationSlot::Unloaded(fk)) => fk.clone(),
            Slot::Relation(RelationSlot::Loaded(target)) => target.borrow().primary_key(),
        }
    }

    pub(crate) fn primary_key(&self) -> Value {
        self.column_value(self.model.primary_key)
    }

    /// Store a column value read from a row, without dirty tracking.
    pub(crate) fn fill(&mut self, index: usize, value: Value) -> Result<(), EntityError> {
        let field = &self.model.fields[index];
        let value = field.kind.accept(value)?;
        self.slots[index] = match field.kind {
            FieldKind::Relation(_) if value.is_null() => Slot::Relation(RelationSlot::Null),
            FieldKind::Relation(_) => Slot::Relation(RelationSlot::Unloaded(value)),
            _ => Slot::Value(value),
        };
        self.loaded[index] = true;

        Ok(())
    }

    /// Type-check, validate and store a value written through a key.
    pub(crate) fn write(&mut self, index: usize, value: Value) -> Result<(), EntityError> {
        let field = &self.model.fields[index];
        if !field.kind.admits(&value) || matches!(value, Value::List(_)) {
            return Err(EntityError::TypeMismatch {
                entity: self.model.name,
                key: field.name,
                expected: field.kind.label(),
                found: value.family(),
            });
        }
        if let Some(validator) = field.validator {
            validator(&value).map_err(|message| EntityError::Validation {
                entity: self.model.name,
                key: field.name,
                message,
            })?;
        }

        let slot = match field.kind {
            FieldKind::Relation(_) if value.is_null() => Slot::Relation(RelationSlot::Null),
            FieldKind::Relation(_) => Slot::Relation(RelationSlot::Unloaded(value)),
            _ => Slot::Value(value),
        };
        self.store(index, slot);

        Ok(())
    }

    /// Replace a slot and mark the key changed when MANAGED.
    pub(crate) fn store(&mut self, index: usize, slot: Slot) {
        self.slots[index] = slot;
        if self.is_managed() {
            self.dirty.insert(index);
        }
    }
}

/// Read a relation slot, resolving an `Unloaded` key through the session.
///
/// No borrow of `record` is held while the loader runs; the target may be
/// this very record.
pub(crate) fn resolve_relation(
    record: &RecordRef,
    index: usize,
) -> Result<Option<RecordRef>, EntityError> {
    let (model, pk, loader) = {
        let current = record.borrow();
        let model = current.model;
        match &current.slots[index] {
            Slot::Relation(RelationSlot::Null) => return Ok(None),
            Slot::Relation(RelationSlot::Loaded(target)) => return Ok(Some(Rc::clone(target))),
            Slot::Relation(RelationSlot::Unloaded(pk)) => (model, pk.clone(), current.loader()),
            Slot::Value(_) => {
                return Err(EntityError::NotARelation {
                    entity: model.name,
                    key: model.fields[index].name,
                });
            }
        }
    };

    let field = &model.fields[index];
    let Some(target) = field.foreign_target() else {
        return Err(EntityError::NotARelation {
            entity: model.name,
            key: field.name,
        });
    };
    let Some(loader) = loader else {
        return Err(EntityError::Detached {
            entity: model.name,
            key: field.name,
        });
    };

    let loaded = loader
        .load_record(target, &pk)
        .map_err(|source| EntityError::LazyLoad {
            entity: model.name,
            key: field.name,
            source,
        })?
        .ok_or_else(|| EntityError::DanglingForeignKey {
            entity: model.name,
            key: field.name,
            target: target.name,
            pk: pk.to_string(),
        })?;

    // Resolution is not a write; the dirty set stays untouched.
    record.borrow_mut().slots[index] = Slot::Relation(RelationSlot::Loaded(Rc::clone(&loaded)));

    Ok(Some(loaded))
}

/// Read a key path off a record, crossing relations hop by hop.
///
/// A `Null` relation anywhere along the path reads as `Null`.
pub(crate) fn read_path(
    record: &RecordRef,
    hops: impl IntoIterator<Item = usize>,
) -> Result<Value, EntityError> {
    let mut hops = hops.into_iter().peekable();
    let mut current = Rc::clone(record);

    while let Some(index) = hops.next() {
        if hops.peek().is_none() {
            return Ok(current.borrow().column_value(index));
        }
        match resolve_relation(&current, index)? {
            Some(next) => current = next,
            None => return Ok(Value::Null),
        }
    }

    Ok(Value::Null)
}
