//! Predicate tree over keys, its serialized form and the interpreter.

mod ast;
mod doc;
mod error;
mod eval;
mod ops;

#[cfg(test)]
mod tests;

pub use ast::{ComparePredicate, Operand, Pattern, Predicate, RawSql};
pub use doc::{OperandDoc, PredicateDoc};
pub use error::{EvalError, PredicateError};
pub use eval::evaluate;
pub use ops::{BooleanOp, CompareOp, Operator, OperatorKind};
