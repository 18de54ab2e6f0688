//! Runtime metamodel: the table and column descriptors the engine consumes.
//!
//! Descriptors are plain `'static` data. They are produced elsewhere (by hand,
//! a macro, or a generator) and are read-only here; relation fields point at
//! their target descriptor, so the graph may be cyclic.

pub mod entity;
pub mod field;


pub use entity::{EntityModel, ModelError};
pub use field::{FieldKind, FieldModel, Validator};
