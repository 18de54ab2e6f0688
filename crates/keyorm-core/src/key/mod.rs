//! Typed keys: column accessors bound to one entity and one value type.

mod builder;
mod path;


pub use path::{KeyPath, KeyRef};

use crate::{
    model::FieldModel,
    traits::{EntityKind, FieldType},
};
use std::{fmt, marker::PhantomData};

///
/// KeyExpr
///
/// Anything that resolves to a key path rooted at `E`: direct, relation
/// and composite keys. Sort terms and projections take this.
///

pub trait KeyExpr<E: EntityKind> {
    fn key_path(&self) -> KeyPath;

    fn is_descending(&self) -> bool;
}

///
/// ValueKey
/// A key expression whose leaf holds a scalar of type `Value`.
///

pub trait ValueKey<E: EntityKind>: KeyExpr<E> {
    type Value: FieldType;
}

// ============================================================================
// Key
// ============================================================================

///
/// Key
///
/// Direct scalar key. Carries only the field ordinal and the sort flag;
/// name, column, default and validator come from `E::MODEL`.
///

pub struct Key<E, T> {
    index: usize,
    descending: bool,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E: EntityKind, T: FieldType> Key<E, T> {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            descending: false,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub fn field(self) -> &'static FieldModel {
        &E::MODEL.fields[self.index]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.field().name
    }

    /// Declared default, `None` when it is `Null`.
    #[must_use]
    pub fn default_value(self) -> Option<T> {
        T::from_value(&self.field().default)
    }

    #[must_use]
    pub const fn desc(mut self) -> Self {
        self.descending = true;
        self
    }

    #[must_use]
    pub const fn asc(mut self) -> Self {
        self.descending = false;
        self
    }

    #[must_use]
    pub fn path(self) -> KeyPath {
        KeyPath::direct(KeyRef::new(E::MODEL, self.index))
    }
}

impl<E, T> Clone for Key<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Key<E, T> {}

impl<E: EntityKind, T: FieldType> fmt::Debug for Key<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", E::MODEL.name, self.name())
    }
}

impl<E: EntityKind, T: FieldType> KeyExpr<E> for Key<E, T> {
    fn key_path(&self) -> KeyPath {
        self.path()
    }

    fn is_descending(&self) -> bool {
        self.descending
    }
}

impl<E: EntityKind, T: FieldType> ValueKey<E> for Key<E, T> {
    type Value = T;
}

// ============================================================================
// RelationKey
// ============================================================================

///
/// RelationKey
/// Foreign-key accessor from `E` to `R`.
///

pub struct RelationKey<E, R> {
    index: usize,
    descending: bool,
    _marker: PhantomData<fn() -> (E, R)>,
}

impl<E: EntityKind, R: EntityKind> RelationKey<E, R> {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            descending: false,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub fn field(self) -> &'static FieldModel {
        &E::MODEL.fields[self.index]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.field().name
    }

    #[must_use]
    pub const fn desc(mut self) -> Self {
        self.descending = true;
        self
    }

    #[must_use]
    pub fn path(self) -> KeyPath {
        KeyPath::direct(KeyRef::new(E::MODEL, self.index))
    }

    /// Key on the related entity, reached through this relation.
    #[must_use]
    pub fn join<T: FieldType>(self, key: Key<R, T>) -> CompositeKey<E, T> {
        CompositeKey::from_path(self.path().push(KeyRef::new(R::MODEL, key.index)), key.descending)
    }

    /// Continue through a relation of the related entity.
    #[must_use]
    pub fn via<S: EntityKind>(self, next: RelationKey<R, S>) -> RelationPath<E, S> {
        RelationPath::from_path(self.path().push(KeyRef::new(R::MODEL, next.index)))
    }
}

impl<E, R> Clone for RelationKey<E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, R> Copy for RelationKey<E, R> {}

impl<E: EntityKind, R: EntityKind> fmt::Debug for RelationKey<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}", E::MODEL.name, self.name(), R::MODEL.name)
    }
}

impl<E: EntityKind, R: EntityKind> KeyExpr<E> for RelationKey<E, R> {
    fn key_path(&self) -> KeyPath {
        self.path()
    }

    fn is_descending(&self) -> bool {
        self.descending
    }
}

// ============================================================================
// Composite paths
// ============================================================================

///
/// RelationPath
/// Chain of relations from `E` ending at a foreign key to `R`.
///

pub struct RelationPath<E, R> {
    path: KeyPath,
    descending: bool,
    _marker: PhantomData<fn() -> (E, R)>,
}

impl<E: EntityKind, R: EntityKind> RelationPath<E, R> {
    const fn from_path(path: KeyPath) -> Self {
        Self {
            path,
            descending: false,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn path(&self) -> &KeyPath {
        &self.path
    }

    #[must_use]
    pub fn desc(mut self) -> Self {
        self.descending = true;
        self
    }

    #[must_use]
    pub fn join<T: FieldType>(self, key: Key<R, T>) -> CompositeKey<E, T> {
        CompositeKey::from_path(self.path.push(KeyRef::new(R::MODEL, key.index)), key.descending)
    }

    #[must_use]
    pub fn via<S: EntityKind>(self, next: RelationKey<R, S>) -> RelationPath<E, S> {
        RelationPath::from_path(self.path.push(KeyRef::new(R::MODEL, next.index)))
    }
}

impl<E, R> Clone for RelationPath<E, R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            descending: self.descending,
            _marker: PhantomData,
        }
    }
}

impl<E, R> fmt::Debug for RelationPath<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl<E: EntityKind, R: EntityKind> KeyExpr<E> for RelationPath<E, R> {
    fn key_path(&self) -> KeyPath {
        self.path.clone()
    }

    fn is_descending(&self) -> bool {
        self.descending
    }
}

///
/// CompositeKey
///
/// Scalar key reached across one or more relations (`item.order.note`).
/// Reads like a direct key; compiles to a join path.
///

pub struct CompositeKey<E, T> {
    path: KeyPath,
    descending: bool,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E: EntityKind, T: FieldType> CompositeKey<E, T> {
    const fn from_path(path: KeyPath, descending: bool) -> Self {
        Self {
            path,
            descending,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Dotted name, e.g. `order.note`.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.to_string()
    }

    #[must_use]
    pub fn desc(mut self) -> Self {
        self.descending = true;
        self
    }

    #[must_use]
    pub fn asc(mut self) -> Self {
        self.descending = false;
        self
    }
}

impl<E, T> Clone for CompositeKey<E, T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            descending: self.descending,
            _marker: PhantomData,
        }
    }
}

impl<E, T> fmt::Debug for CompositeKey<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl<E: EntityKind, T: FieldType> KeyExpr<E> for CompositeKey<E, T> {
    fn key_path(&self) -> KeyPath {
        self.path.clone()
    }

    fn is_descending(&self) -> bool {
        self.descending
    }
}

impl<E: EntityKind, T: FieldType> ValueKey<E> for CompositeKey<E, T> {
    type Value = T;
}

impl<E: EntityKind, K: KeyExpr<E>> KeyExpr<E> for &K {
    fn key_path(&self) -> KeyPath {
        (**self).key_path()
    }

    fn is_descending(&self) -> bool {
        (**self).is_descending()
    }
}
