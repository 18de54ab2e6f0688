//! Query value object: predicate plus ordering, paging and projection.

#[cfg(test)]
mod tests;

use crate::{
    db::{
        predicate::Predicate,
        sql::{CompileError, Dialect, ROOT_ALIAS, SqlCompiler, Statement, StatementKind},
    },
    key::{KeyExpr, KeyPath},
    model::EntityModel,
    traits::EntityKind,
};
use std::{fmt, marker::PhantomData};

///
/// SortTerm
///

#[derive(Clone, Debug, PartialEq)]
pub struct SortTerm {
    pub path: KeyPath,
    pub descending: bool,
}

///
/// QuerySpec
///
/// Untyped query over one root entity. `Query<E>` wraps it; the session's
/// lazy-load path builds these directly from a descriptor.
///

#[derive(Clone, Debug)]
pub struct QuerySpec {
    root: &'static EntityModel,
    predicate: Option<Predicate>,
    order: Vec<SortTerm>,
    limit: Option<u64>,
    offset: u64,
    distinct: bool,
    columns: Option<Vec<KeyPath>>,
    fetch_size: Option<u32>,
    lock: bool,
}

impl QuerySpec {
    #[must_use]
    pub const fn new(root: &'static EntityModel) -> Self {
        Self {
            root,
            predicate: None,
            order: Vec::new(),
            limit: None,
            offset: 0,
            distinct: false,
            columns: None,
            fetch_size: None,
            lock: false,
        }
    }

    #[must_use]
    pub const fn root(&self) -> &'static EntityModel {
        self.root
    }

    #[must_use]
    pub const fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    #[must_use]
    pub fn order(&self) -> &[SortTerm] {
        &self.order
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub const fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    /// Whether selected rows are locked until the transaction ends.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock
    }

    pub(crate) fn add_filter(&mut self, predicate: Predicate) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }

    pub(crate) fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub(crate) fn set_fetch_size(&mut self, size: u32) {
        self.fetch_size = Some(size);
    }

    /// Field ordinals selected, in declaration order. The primary key is
    /// always included.
    pub fn projection(&self) -> Result<Vec<usize>, CompileError> {
        let Some(columns) = &self.columns else {
            return Ok(self.root.persistent_fields().collect());
        };

        let mut selected = vec![false; self.root.fields.len()];
        selected[self.root.primary_key] = true;
        for path in columns {
            let hop = path.leaf();
            if !path.is_direct() || !hop.model().same_as(self.root) || !hop.field().persistent {
                return Err(CompileError::InvalidProjection {
                    key: path.to_string(),
                });
            }
            selected[hop.index()] = true;
        }

        Ok(selected
            .iter()
            .enumerate()
            .filter_map(|(index, &on)| on.then_some(index))
            .collect())
    }

    /// `SELECT` statement; parameters follow placeholder order.
    pub fn to_select(&self, dialect: &dyn Dialect) -> Result<Statement, CompileError> {
        let mut compiler = SqlCompiler::new(self.root, dialect);
        let condition = self.condition(&mut compiler)?;

        let mut order = Vec::with_capacity(self.order.len());
        for term in &self.order {
            let column = compiler.column(&term.path)?;
            let direction = if term.descending { "DESC" } else { "ASC" };
            order.push(format!("{column} {direction}"));
        }
        let projection = self.render_projection(dialect)?;

        let mut sql = format!(
            "SELECT {}{projection} FROM {} {ROOT_ALIAS}{} WHERE {condition}",
            if self.distinct { "DISTINCT " } else { "" },
            dialect.quote_ident(self.root.table),
            compiler.joins().render(dialect),
        );
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if let Some(paging) = dialect.limit_offset(self.limit, self.offset) {
            sql.push(' ');
            sql.push_str(&paging);
        }
        if self.lock {
            let clause = dialect.lock_for_update().ok_or(CompileError::LockUnsupported {
                dialect: dialect.name(),
            })?;
            sql.push(' ');
            sql.push_str(clause);
        }

        let (params, _) = compiler.finish();
        let mut statement = Statement::new(StatementKind::Select, sql, params);
        statement.fetch_size = self.fetch_size;

        Ok(statement)
    }

    /// `SELECT COUNT(*)` over the filtered rows; order, paging and the row
    /// lock are ignored.
    pub fn to_count(&self, dialect: &dyn Dialect) -> Result<Statement, CompileError> {
        let mut compiler = SqlCompiler::new(self.root, dialect);
        let condition = self.condition(&mut compiler)?;
        let from = format!(
            "FROM {} {ROOT_ALIAS}{} WHERE {condition}",
            dialect.quote_ident(self.root.table),
            compiler.joins().render(dialect),
        );

        let sql = if self.distinct {
            let projection = self.render_projection(dialect)?;
            format!("SELECT COUNT(*) FROM (SELECT DISTINCT {projection} {from}) q")
        } else {
            format!("SELECT COUNT(*) {from}")
        };

        let (params, _) = compiler.finish();
        Ok(Statement::new(StatementKind::Count, sql, params))
    }

    fn condition(&self, compiler: &mut SqlCompiler<'_>) -> Result<String, CompileError> {
        match &self.predicate {
            Some(predicate) => compiler.condition(predicate),
            None => Ok(compiler.dialect().fixed(true).to_string()),
        }
    }

    fn render_projection(&self, dialect: &dyn Dialect) -> Result<String, CompileError> {
        Ok(self
            .projection()?
            .into_iter()
            .map(|index| {
                format!(
                    "{ROOT_ALIAS}.{}",
                    dialect.quote_ident(self.root.fields[index].column)
                )
            })
            .collect::<Vec<_>>()
            .join(", "))
    }
}

///
/// Query
///
/// Typed query over entity `E`. A value object: building it issues
/// nothing, and it can be executed any number of times.
///

pub struct Query<E: EntityKind> {
    spec: QuerySpec,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EntityKind> Query<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            spec: QuerySpec::new(E::MODEL),
            _marker: PhantomData,
        }
    }

    /// Shorthand for `Query::new().filter(predicate)`.
    #[must_use]
    pub fn filtered(predicate: Predicate) -> Self {
        Self::new().filter(predicate)
    }

    #[must_use]
    pub const fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Add a condition; ANDed onto any existing one.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.spec.add_filter(predicate);
        self
    }

    /// Sort by a key, honoring its own sort flag.
    #[must_use]
    pub fn order_by(mut self, key: impl KeyExpr<E>) -> Self {
        self.spec.order.push(SortTerm {
            path: key.key_path(),
            descending: key.is_descending(),
        });
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, key: impl KeyExpr<E>) -> Self {
        self.spec.order.push(SortTerm {
            path: key.key_path(),
            descending: true,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.spec.set_limit(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.spec.offset = offset;
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.spec.distinct = true;
        self
    }

    /// Restrict the projection. Unselected keys read back as their default.
    #[must_use]
    pub fn set_columns(mut self, keys: impl IntoIterator<Item = KeyPath>) -> Self {
        self.spec.columns = Some(keys.into_iter().collect());
        self
    }

    /// Add one key to the projection.
    #[must_use]
    pub fn select(mut self, key: impl KeyExpr<E>) -> Self {
        self.spec
            .columns
            .get_or_insert_with(Vec::new)
            .push(key.key_path());
        self
    }

    #[must_use]
    pub fn fetch_size(mut self, size: u32) -> Self {
        self.spec.set_fetch_size(size);
        self
    }

    /// Pessimistic lock: `SELECT ... FOR UPDATE` in dialects that have it.
    #[must_use]
    pub const fn for_update(mut self) -> Self {
        self.spec.lock = true;
        self
    }

    #[must_use]
    pub const fn predicate(&self) -> Option<&Predicate> {
        self.spec.predicate()
    }

    pub fn to_select(&self, dialect: &dyn Dialect) -> Result<Statement, CompileError> {
        self.spec.to_select(dialect)
    }

    pub fn to_count(&self, dialect: &dyn Dialect) -> Result<Statement, CompileError> {
        self.spec.to_count(dialect)
    }
}

impl<E: EntityKind> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: EntityKind> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKind> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.spec, f)
    }
}
