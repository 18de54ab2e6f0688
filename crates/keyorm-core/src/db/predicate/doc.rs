use crate::{
    db::predicate::{
        PredicateError,
        ast::{Operand, Predicate},
        ops::{BooleanOp, CompareOp},
    },
    key::{KeyPath, KeyRef},
    model::EntityModel,
    traits::EntityKind,
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// PredicateDoc
///
/// Serializable form of a predicate. Keys are named by dotted path
/// segments, so a document can be restored against any entity whose
/// key names line up.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum PredicateDoc {
    Compare {
        key: Vec<String>,
        op: CompareOp,
        operand: OperandDoc,
    },
    Fixed {
        value: bool,
    },
    RawSql {
        fragment: String,
        value: Option<Value>,
    },
    Binary {
        left: Box<Self>,
        op: BooleanOp,
        right: Box<Self>,
    },
    Not {
        inner: Box<Self>,
    },
}

///
/// OperandDoc
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandDoc {
    Value(Value),
    Key(Vec<String>),
}

impl Predicate {
    #[must_use]
    pub fn to_doc(&self) -> PredicateDoc {
        match self {
            Self::Compare(cmp) => PredicateDoc::Compare {
                key: path_names(cmp.key()),
                op: cmp.op(),
                operand: match cmp.operand() {
                    Operand::Value(value) => OperandDoc::Value(value.clone()),
                    Operand::Key(path) => OperandDoc::Key(path_names(path)),
                },
            },
            Self::Fixed(value) => PredicateDoc::Fixed { value: *value },
            Self::RawSql(raw) => PredicateDoc::RawSql {
                fragment: raw.fragment().to_string(),
                value: raw.value().cloned(),
            },
            Self::Binary { left, op, right } => PredicateDoc::Binary {
                left: Box::new(left.to_doc()),
                op: *op,
                right: Box::new(right.to_doc()),
            },
            Self::Not(inner) => PredicateDoc::Not {
                inner: Box::new(inner.to_doc()),
            },
        }
    }
}

impl PredicateDoc {
    /// Re-resolve every key by name against `root` and re-validate leaves.
    pub fn restore(&self, root: &'static EntityModel) -> Result<Predicate, PredicateError> {
        let predicate = match self {
            Self::Compare { key, op, operand } => {
                let key = resolve_path(root, key)?;
                let operand = match operand {
                    OperandDoc::Value(value) => Operand::Value(value.clone()),
                    OperandDoc::Key(names) => Operand::Key(resolve_path(root, names)?),
                };
                Predicate::compare(key, *op, operand)?
            }
            Self::Fixed { value } => Predicate::Fixed(*value),
            Self::RawSql { fragment, value } => {
                Predicate::raw_sql(fragment.clone(), value.clone())?
            }
            Self::Binary { left, op, right } => Predicate::Binary {
                left: Box::new(left.restore(root)?),
                op: *op,
                right: Box::new(right.restore(root)?),
            },
            Self::Not { inner } => Predicate::Not(Box::new(inner.restore(root)?)),
        };

        Ok(predicate)
    }

    pub fn restore_for<E: EntityKind>(&self) -> Result<Predicate, PredicateError> {
        self.restore(E::MODEL)
    }
}

fn path_names(path: &KeyPath) -> Vec<String> {
    path.names().into_iter().map(str::to_string).collect()
}

/// Resolve dotted names hop by hop, following relation targets.
fn resolve_path(
    root: &'static EntityModel,
    names: &[String],
) -> Result<KeyPath, PredicateError> {
    let mut hops = Vec::with_capacity(names.len());
    let mut model = root;

    for (position, name) in names.iter().enumerate() {
        let index = model
            .resolve(name)
            .ok_or_else(|| PredicateError::UnresolvedKey {
                entity: model.name,
                name: name.clone(),
            })?;
        let hop = KeyRef::new(model, index);
        hops.push(hop);

        if position + 1 < names.len() {
            model = hop
                .field()
                .foreign_target()
                .ok_or_else(|| PredicateError::InvalidJoinPath {
                    path: names.join("."),
                    hop: hop.name(),
                })?;
        }
    }

    KeyPath::from_hops(hops).ok_or(PredicateError::UnresolvedKey {
        entity: root.name,
        name: String::new(),
    })
}
