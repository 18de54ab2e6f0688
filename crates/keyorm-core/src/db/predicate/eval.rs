use crate::{
    db::predicate::{
        EvalError,
        ast::{ComparePredicate, Operand, Predicate},
        ops::CompareOp,
    },
    entity::{
        Entity,
        record::{RecordRef, read_path},
    },
    key::KeyPath,
    traits::EntityKind,
    value::{Value, order_values, values_equal},
};
use std::{borrow::Cow, cmp::Ordering};

/// Evaluate a predicate against one entity instance.
///
/// Relation hops are resolved through the owning session when the
/// instance is MANAGED; only `RawSql` leaves fail by themselves.
pub fn evaluate<E: EntityKind>(
    predicate: &Predicate,
    entity: &Entity<E>,
) -> Result<bool, EvalError> {
    if let Some(found) = predicate.foreign_root(E::MODEL) {
        return Err(EvalError::RootMismatch {
            expected: E::MODEL.name,
            found: found.name,
        });
    }

    eval_node(predicate, entity.record())
}

impl Predicate {
    pub fn evaluate<E: EntityKind>(&self, entity: &Entity<E>) -> Result<bool, EvalError> {
        evaluate(self, entity)
    }

    /// In-memory filter; stops at the first evaluation error.
    pub fn filter<E: EntityKind>(
        &self,
        entities: &[Entity<E>],
    ) -> Result<Vec<Entity<E>>, EvalError> {
        let mut kept = Vec::new();
        for entity in entities {
            if evaluate(self, entity)? {
                kept.push(entity.clone());
            }
        }

        Ok(kept)
    }
}

fn eval_node(predicate: &Predicate, record: &RecordRef) -> Result<bool, EvalError> {
    match predicate {
        Predicate::Compare(cmp) => eval_compare(cmp, record),
        Predicate::Fixed(value) => Ok(*value),
        Predicate::RawSql(raw) => Err(EvalError::UnsupportedPredicate {
            fragment: raw.fragment().to_string(),
        }),
        Predicate::Binary { left, op, right } => {
            let left = eval_node(left, record)?;
            if let Some(decided) = op.short_circuit(left) {
                return Ok(decided);
            }
            let right = eval_node(right, record)?;

            Ok(op.apply(left, right))
        }
        Predicate::Not(inner) => Ok(!eval_node(inner, record)?),
    }
}

fn read(record: &RecordRef, path: &KeyPath) -> Result<Value, EvalError> {
    Ok(read_path(record, path.hops().iter().map(|hop| hop.index()))?)
}

fn eval_compare(cmp: &ComparePredicate, record: &RecordRef) -> Result<bool, EvalError> {
    let left = read(record, cmp.key())?;
    let right = match cmp.operand() {
        Operand::Value(value) => Cow::Borrowed(value),
        Operand::Key(path) => Cow::Owned(read(record, path)?),
    };
    let right = right.as_ref();

    let result = match cmp.op() {
        CompareOp::Eq => values_equal(&left, right),
        CompareOp::Ne => !values_equal(&left, right),

        // Null on either side is false, never unknown.
        CompareOp::Gt => order_values(&left, right) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            order_values(&left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Lt => order_values(&left, right) == Some(Ordering::Less),
        CompareOp::Le => matches!(
            order_values(&left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),

        CompareOp::In => contains(&left, right),
        CompareOp::NotIn => !contains(&left, right),

        CompareOp::Regexp | CompareOp::NotRegexp => {
            let matched = match (left.as_text(), cmp.pattern()) {
                (Some(text), Some(pattern)) => Some(pattern.is_full_match(text)),
                _ => None,
            };
            match cmp.op() {
                CompareOp::Regexp => matched == Some(true),
                _ => matched == Some(false),
            }
        }

        op => match (left.as_text(), right.as_text()) {
            (Some(left), Some(right)) => text_match(op, left, right),
            _ => false,
        },
    };

    Ok(result)
}

fn contains(left: &Value, list: &Value) -> bool {
    !left.is_null()
        && list
            .as_list()
            .is_some_and(|items| items.iter().any(|item| values_equal(left, item)))
}

fn text_match(op: CompareOp, left: &str, right: &str) -> bool {
    let (left, right) = if op.is_case_insensitive() {
        (
            Cow::Owned(left.to_lowercase()),
            Cow::Owned(right.to_lowercase()),
        )
    } else {
        (Cow::Borrowed(left), Cow::Borrowed(right))
    };

    match op {
        CompareOp::Starts | CompareOp::StartsCi => left.starts_with(right.as_ref()),
        CompareOp::Ends | CompareOp::EndsCi => left.ends_with(right.as_ref()),
        CompareOp::Contains | CompareOp::ContainsCi => left.contains(right.as_ref()),
        CompareOp::EqualsCi => left == right,
        _ => false,
    }
}
