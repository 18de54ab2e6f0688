//! Core runtime for keyorm: typed keys, the predicate tree and its
//! interpreter, the SQL compiler, and the session that maps rows to
//! managed entity instances.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod entity;
pub mod key;
pub mod model;
pub mod obs;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary only. Errors, dialects and metrics sinks are imported
/// from their modules.
///

pub mod prelude {
    pub use crate::{
        db::{
            Query, Session,
            predicate::{CompareOp, Predicate},
        },
        entity::Entity,
        key::{CompositeKey, Key, KeyExpr, RelationKey},
        model::{EntityModel, FieldKind, FieldModel},
        traits::{EntityKind, FieldType},
        value::Value,
    };
}
