use crate::{
    db::predicate::{CompareOp, Operand, Predicate, PredicateError},
    entity::Entity,
    key::{CompositeKey, Key, KeyExpr, RelationKey, RelationPath, ValueKey},
    traits::{EntityKind, FieldType, TextField},
    value::Value,
};

// Inherent predicate factories on scalar keys. Typed operands always fit
// the key kind, so these skip the dynamic check; REGEXP still compiles
// its pattern and stays fallible.
macro_rules! impl_value_predicates {
    ($key:ident) => {
        impl<E: EntityKind, T: FieldType> $key<E, T> {
            fn value_leaf(&self, op: CompareOp, value: Value) -> Predicate {
                Predicate::leaf(self.key_path(), op, Operand::Value(value))
            }

            fn key_leaf<K: ValueKey<E, Value = T>>(&self, op: CompareOp, other: &K) -> Predicate {
                Predicate::leaf(self.key_path(), op, Operand::Key(other.key_path()))
            }

            // ------------------------------------------------------------------
            // Literal comparisons
            // ------------------------------------------------------------------

            #[must_use]
            pub fn eq(&self, value: impl Into<T>) -> Predicate {
                self.value_leaf(CompareOp::Eq, value.into().to_value())
            }

            #[must_use]
            pub fn ne(&self, value: impl Into<T>) -> Predicate {
                self.value_leaf(CompareOp::Ne, value.into().to_value())
            }

            /// Greater-than; false when the key is null.
            #[must_use]
            pub fn gt(&self, value: impl Into<T>) -> Predicate {
                self.value_leaf(CompareOp::Gt, value.into().to_value())
            }

            #[must_use]
            pub fn ge(&self, value: impl Into<T>) -> Predicate {
                self.value_leaf(CompareOp::Ge, value.into().to_value())
            }

            #[must_use]
            pub fn lt(&self, value: impl Into<T>) -> Predicate {
                self.value_leaf(CompareOp::Lt, value.into().to_value())
            }

            #[must_use]
            pub fn le(&self, value: impl Into<T>) -> Predicate {
                self.value_leaf(CompareOp::Le, value.into().to_value())
            }

            #[must_use]
            pub fn is_null(&self) -> Predicate {
                self.value_leaf(CompareOp::Eq, Value::Null)
            }

            #[must_use]
            pub fn is_not_null(&self) -> Predicate {
                self.value_leaf(CompareOp::Ne, Value::Null)
            }

            /// Membership; an empty list is always false.
            #[must_use]
            pub fn in_list<I, V>(&self, values: I) -> Predicate
            where
                I: IntoIterator<Item = V>,
                V: Into<T>,
            {
                let items = values.into_iter().map(|v| v.into().to_value()).collect();
                self.value_leaf(CompareOp::In, Value::List(items))
            }

            /// Negated membership; an empty list is always true.
            #[must_use]
            pub fn not_in<I, V>(&self, values: I) -> Predicate
            where
                I: IntoIterator<Item = V>,
                V: Into<T>,
            {
                let items = values.into_iter().map(|v| v.into().to_value()).collect();
                self.value_leaf(CompareOp::NotIn, Value::List(items))
            }

            // ------------------------------------------------------------------
            // Key comparisons
            // ------------------------------------------------------------------

            #[must_use]
            pub fn eq_key<K: ValueKey<E, Value = T>>(&self, other: &K) -> Predicate {
                self.key_leaf(CompareOp::Eq, other)
            }

            #[must_use]
            pub fn ne_key<K: ValueKey<E, Value = T>>(&self, other: &K) -> Predicate {
                self.key_leaf(CompareOp::Ne, other)
            }

            #[must_use]
            pub fn gt_key<K: ValueKey<E, Value = T>>(&self, other: &K) -> Predicate {
                self.key_leaf(CompareOp::Gt, other)
            }

            #[must_use]
            pub fn ge_key<K: ValueKey<E, Value = T>>(&self, other: &K) -> Predicate {
                self.key_leaf(CompareOp::Ge, other)
            }

            #[must_use]
            pub fn lt_key<K: ValueKey<E, Value = T>>(&self, other: &K) -> Predicate {
                self.key_leaf(CompareOp::Lt, other)
            }

            #[must_use]
            pub fn le_key<K: ValueKey<E, Value = T>>(&self, other: &K) -> Predicate {
                self.key_leaf(CompareOp::Le, other)
            }

            // ------------------------------------------------------------------
            // Dynamic
            // ------------------------------------------------------------------

            /// Checked leaf with any operator and an untyped operand.
            pub fn compare(
                &self,
                op: CompareOp,
                value: impl Into<Value>,
            ) -> Result<Predicate, PredicateError> {
                Predicate::compare(self.key_path(), op, Operand::Value(value.into()))
            }

            /// Checked leaf comparing against another key of the same root.
            pub fn compare_key(
                &self,
                op: CompareOp,
                other: &impl KeyExpr<E>,
            ) -> Result<Predicate, PredicateError> {
                Predicate::compare(self.key_path(), op, Operand::Key(other.key_path()))
            }
        }

        impl<E: EntityKind, T: TextField> $key<E, T> {
            /// Checked string-match leaf; `op` must be a text operator.
            pub fn matches(
                &self,
                op: CompareOp,
                text: impl Into<String>,
            ) -> Result<Predicate, PredicateError> {
                let operand = Operand::Value(Value::Text(text.into()));
                Predicate::compare(self.key_path(), op, operand)
            }

            #[must_use]
            pub fn starts(&self, text: impl Into<String>) -> Predicate {
                self.value_leaf(CompareOp::Starts, Value::Text(text.into()))
            }

            #[must_use]
            pub fn starts_ci(&self, text: impl Into<String>) -> Predicate {
                self.value_leaf(CompareOp::StartsCi, Value::Text(text.into()))
            }

            #[must_use]
            pub fn ends(&self, text: impl Into<String>) -> Predicate {
                self.value_leaf(CompareOp::Ends, Value::Text(text.into()))
            }

            #[must_use]
            pub fn ends_ci(&self, text: impl Into<String>) -> Predicate {
                self.value_leaf(CompareOp::EndsCi, Value::Text(text.into()))
            }

            #[must_use]
            pub fn contains(&self, text: impl Into<String>) -> Predicate {
                self.value_leaf(CompareOp::Contains, Value::Text(text.into()))
            }

            #[must_use]
            pub fn contains_ci(&self, text: impl Into<String>) -> Predicate {
                self.value_leaf(CompareOp::ContainsCi, Value::Text(text.into()))
            }

            #[must_use]
            pub fn equals_ci(&self, text: impl Into<String>) -> Predicate {
                self.value_leaf(CompareOp::EqualsCi, Value::Text(text.into()))
            }

            /// Full-match regular expression.
            pub fn regexp(&self, pattern: impl Into<String>) -> Result<Predicate, PredicateError> {
                self.matches(CompareOp::Regexp, pattern)
            }

            pub fn not_regexp(
                &self,
                pattern: impl Into<String>,
            ) -> Result<Predicate, PredicateError> {
                self.matches(CompareOp::NotRegexp, pattern)
            }
        }
    };
}

impl_value_predicates!(Key);
impl_value_predicates!(CompositeKey);

// Factories on foreign keys compare the raw key column.
macro_rules! impl_relation_predicates {
    ($key:ident) => {
        impl<E: EntityKind, R: EntityKind> $key<E, R> {
            #[must_use]
            pub fn is_null(&self) -> Predicate {
                Predicate::leaf(self.key_path(), CompareOp::Eq, Operand::Value(Value::Null))
            }

            #[must_use]
            pub fn is_not_null(&self) -> Predicate {
                Predicate::leaf(self.key_path(), CompareOp::Ne, Operand::Value(Value::Null))
            }

            /// Foreign key equals the primary key of `target`.
            #[must_use]
            pub fn eq(&self, target: &Entity<R>) -> Predicate {
                let operand = Operand::Value(target.primary_key());
                Predicate::leaf(self.key_path(), CompareOp::Eq, operand)
            }

            #[must_use]
            pub fn ne(&self, target: &Entity<R>) -> Predicate {
                let operand = Operand::Value(target.primary_key());
                Predicate::leaf(self.key_path(), CompareOp::Ne, operand)
            }

            /// Foreign key equals a raw primary key value.
            pub fn eq_id(&self, pk: impl Into<Value>) -> Result<Predicate, PredicateError> {
                Predicate::compare(self.key_path(), CompareOp::Eq, Operand::Value(pk.into()))
            }

            pub fn in_ids<I, V>(&self, pks: I) -> Result<Predicate, PredicateError>
            where
                I: IntoIterator<Item = V>,
                V: Into<Value>,
            {
                let operand = Operand::Value(Value::from_list(pks));
                Predicate::compare(self.key_path(), CompareOp::In, operand)
            }
        }
    };
}

impl_relation_predicates!(RelationKey);
impl_relation_predicates!(RelationPath);
