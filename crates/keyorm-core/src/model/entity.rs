use crate::model::field::{FieldKind, FieldModel};
use std::{collections::BTreeSet, fmt};
use thiserror::Error as ThisError;

///
/// EntityModel
/// Runtime table descriptor for one entity type.
///

pub struct EntityModel {
    /// Stable entity name used in diagnostics and serialized predicates.
    pub name: &'static str,
    pub table: &'static str,
    /// Ordered field list; a key's ordinal is its index here.
    pub fields: &'static [FieldModel],
    /// Index of the primary key within `fields`.
    pub primary_key: usize,
}

impl EntityModel {
    #[must_use]
    pub const fn new(
        name: &'static str,
        table: &'static str,
        fields: &'static [FieldModel],
        primary_key: usize,
    ) -> Self {
        Self {
            name,
            table,
            fields,
            primary_key,
        }
    }

    #[must_use]
    pub fn primary_key_field(&self) -> &'static FieldModel {
        &self.fields[self.primary_key]
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&'static FieldModel> {
        self.fields.get(index)
    }

    /// Resolve a key name to its ordinal.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Whether two descriptors denote the same entity.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }

    /// Persistent field ordinals in declaration order.
    pub fn persistent_fields(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.persistent)
            .map(|(index, _)| index)
    }

    /// Check structural invariants of the descriptor.
    pub fn check(&self) -> Result<(), ModelError> {
        let Some(pk) = self.fields.get(self.primary_key) else {
            return Err(ModelError::PrimaryKeyOutOfRange {
                entity: self.name,
                index: self.primary_key,
            });
        };
        if !pk.primary_key || !pk.persistent || matches!(pk.kind, FieldKind::Relation(_)) {
            return Err(ModelError::InvalidPrimaryKey {
                entity: self.name,
                field: pk.name,
            });
        }

        let mut names = BTreeSet::new();
        let mut columns = BTreeSet::new();
        for field in self.fields {
            if !names.insert(field.name) {
                return Err(ModelError::DuplicateName {
                    entity: self.name,
                    name: field.name,
                });
            }
            if field.persistent && !columns.insert(field.column) {
                return Err(ModelError::DuplicateColumn {
                    entity: self.name,
                    column: field.column,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Debug for EntityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityModel")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

///
/// ModelError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("entity '{entity}' declares primary key index {index} outside its field list")]
    PrimaryKeyOutOfRange { entity: &'static str, index: usize },

    #[error("entity '{entity}' primary key '{field}' must be a persistent, non-relation key")]
    InvalidPrimaryKey {
        entity: &'static str,
        field: &'static str,
    },

    #[error("entity '{entity}' declares key '{name}' more than once")]
    DuplicateName {
        entity: &'static str,
        name: &'static str,
    },

    #[error("entity '{entity}' maps column '{column}' more than once")]
    DuplicateColumn {
        entity: &'static str,
        column: &'static str,
    },
}
