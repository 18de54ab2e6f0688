use crate::model::{EntityModel, FieldKind, FieldModel};
use std::fmt::{self, Display};

///
/// KeyRef
///
/// One untyped hop: a key ordinal on a specific entity descriptor.
///

#[derive(Clone, Copy)]
pub struct KeyRef {
    model: &'static EntityModel,
    index: usize,
}

impl KeyRef {
    #[must_use]
    pub const fn new(model: &'static EntityModel, index: usize) -> Self {
        Self { model, index }
    }

    #[must_use]
    pub const fn model(self) -> &'static EntityModel {
        self.model
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub fn field(self) -> &'static FieldModel {
        &self.model.fields[self.index]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.field().name
    }
}

impl PartialEq for KeyRef {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.model.same_as(other.model)
    }
}

impl Eq for KeyRef {}

impl fmt::Debug for KeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model.name, self.name())
    }
}

///
/// KeyPath
///
/// Ordered, non-empty chain of hops starting at a root entity. A direct key
/// has one hop; a composite key (`item.order.note`) has one hop per
/// relation crossed plus the final key.
///
/// Paths built through typed keys are always well formed. Paths assembled
/// from raw hops are validated where they are consumed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyPath {
    hops: Vec<KeyRef>,
}

impl KeyPath {
    #[must_use]
    pub fn direct(hop: KeyRef) -> Self {
        Self { hops: vec![hop] }
    }

    /// Assemble a path from raw hops. Returns `None` for an empty list.
    #[must_use]
    pub fn from_hops(hops: Vec<KeyRef>) -> Option<Self> {
        (!hops.is_empty()).then_some(Self { hops })
    }

    #[must_use]
    pub fn hops(&self) -> &[KeyRef] {
        &self.hops
    }

    #[must_use]
    pub fn root(&self) -> &'static EntityModel {
        self.hops[0].model()
    }

    #[must_use]
    pub fn leaf(&self) -> KeyRef {
        self.hops[self.hops.len() - 1]
    }

    /// Declared kind of the final hop.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.leaf().field().kind
    }

    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.hops.len() == 1
    }

    /// Append one hop.
    #[must_use]
    pub fn push(mut self, hop: KeyRef) -> Self {
        self.hops.push(hop);
        self
    }

    /// Key names from root to leaf.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.hops.iter().map(|hop| hop.name()).collect()
    }

    /// Position of the first hop that breaks the relation chain, if any.
    ///
    /// Every hop but the last must be a relation whose target owns the
    /// next hop.
    #[must_use]
    pub fn first_broken_hop(&self) -> Option<usize> {
        self.hops.windows(2).position(|pair| {
            pair[0]
                .field()
                .foreign_target()
                .is_none_or(|target| !target.same_as(pair[1].model()))
        })
    }
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", hop.name())?;
        }
        Ok(())
    }
}
