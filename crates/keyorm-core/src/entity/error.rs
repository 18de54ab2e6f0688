use crate::model::FieldKind;
use std::{error::Error, fmt::Display};
use thiserror::Error as ThisError;

///
/// EntityError
/// Failure reading or writing an entity slot through a key.
///

#[derive(Debug, ThisError)]
pub enum EntityError {
    #[error("entity '{entity}' key '{key}' expects {expected}, found {found}")]
    TypeMismatch {
        entity: &'static str,
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("entity '{entity}' key '{key}' rejected value: {message}")]
    Validation {
        entity: &'static str,
        key: &'static str,
        message: String,
    },

    #[error("entity '{entity}' relation '{key}' is unloaded and the owning session is gone")]
    Detached {
        entity: &'static str,
        key: &'static str,
    },

    #[error("entity '{entity}' relation '{key}' points at missing row {target}#{pk}")]
    DanglingForeignKey {
        entity: &'static str,
        key: &'static str,
        target: &'static str,
        pk: String,
    },

    #[error("lazy load of '{entity}.{key}' failed: {source}")]
    LazyLoad {
        entity: &'static str,
        key: &'static str,
        source: Box<dyn Error>,
    },

    #[error("cannot decode {found} as {kind}")]
    Decode { kind: &'static str, found: String },

    #[error("entity '{entity}' key '{key}' is not a relation")]
    NotARelation {
        entity: &'static str,
        key: &'static str,
    },
}

impl EntityError {
    pub(crate) fn decode(kind: FieldKind, found: impl Display) -> Self {
        Self::Decode {
            kind: kind.label(),
            found: found.to_string(),
        }
    }

    /// Downcast the connection error behind a failed lazy load.
    #[must_use]
    pub fn lazy_source<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::LazyLoad { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}
