//! Session: identity cache, lazy relation loading, dirty tracking and the
//! INSERT / UPDATE / DELETE paths.
//!
//! A session owns one connection and is single-threaded (`Rc`/`RefCell`).
//! Managed records hold only a weak back-reference to it.

mod cache;
mod config;
mod error;
mod write;


pub use config::{CachePolicy, SessionConfig};
pub use error::SessionError;

use crate::{
    db::{
        connection::{Connection, Row},
        predicate::{CompareOp, Operand, Predicate},
        query::{Query, QuerySpec},
        sql::{AnsiDialect, Dialect, Statement},
    },
    entity::{
        Entity, EntityError,
        record::{Attachment, Record, RecordRef, RelationLoader},
    },
    key::{KeyPath, KeyRef},
    model::{EntityModel, FieldKind},
    obs::sink::{self, MetricsSink, SessionEvent},
    traits::EntityKind,
    value::{Value, values_equal},
};
use cache::IdentityCache;
use std::{
    cell::RefCell,
    error::Error,
    rc::{Rc, Weak},
};
use tracing::{debug, trace, warn};

/// Result of a session operation over connection `C`.
pub type SessionResult<T, C> = Result<T, SessionError<<C as Connection>::Error>>;

///
/// SessionBuilder
///

pub struct SessionBuilder<C: Connection> {
    connection: C,
    dialect: Box<dyn Dialect>,
    config: SessionConfig,
    metrics: Option<&'static dyn MetricsSink>,
}

impl<C: Connection + 'static> SessionBuilder<C> {
    #[must_use]
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Box::new(dialect);
        self
    }

    /// Dialect resolved at runtime, e.g. through `dialect_by_name`.
    #[must_use]
    pub fn boxed_dialect(mut self, dialect: Box<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub fn build(self) -> Session<C> {
        Session {
            core: Rc::new(SessionCore {
                connection: RefCell::new(self.connection),
                cache: RefCell::new(IdentityCache::default()),
                dialect: self.dialect,
                config: self.config,
                metrics: self.metrics,
            }),
        }
    }
}

///
/// Session
///
/// Unit of work over one connection. Dropping the session detaches every
/// instance it manages.
///

pub struct Session<C: Connection + 'static> {
    core: Rc<SessionCore<C>>,
}

impl<C: Connection + 'static> Session<C> {
    /// Session with the ANSI dialect and default settings.
    #[must_use]
    pub fn new(connection: C) -> Self {
        Self::builder(connection).build()
    }

    #[must_use]
    pub fn builder(connection: C) -> SessionBuilder<C> {
        SessionBuilder {
            connection,
            dialect: Box::new(AnsiDialect),
            config: SessionConfig::default(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.core.dialect.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.core.config
    }

    /// Number of cached instances.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.core.cache.borrow().len()
    }

    /// Run a closure against the underlying connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut C) -> T) -> T {
        f(&mut self.core.connection.borrow_mut())
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Run a query. Rows already cached return the cached instance; only
    /// its never-loaded slots are filled in from the row.
    pub fn execute<E: EntityKind>(&self, query: &Query<E>) -> SessionResult<Vec<Entity<E>>, C> {
        Ok(self
            .core
            .select(query.spec())?
            .into_iter()
            .map(Entity::from_record)
            .collect())
    }

    pub fn first<E: EntityKind>(&self, query: &Query<E>) -> SessionResult<Option<Entity<E>>, C> {
        let query = query.clone().limit(1);

        Ok(self.execute(&query)?.into_iter().next())
    }

    /// The only row of a query, `None` when it matches nothing and
    /// `NotUnique` when it matches more.
    pub fn unique<E: EntityKind>(&self, query: &Query<E>) -> SessionResult<Option<Entity<E>>, C> {
        let bounded = match query.spec().limit() {
            Some(limit) if limit < 2 => query.clone(),
            _ => query.clone().limit(2),
        };

        let mut found = self.execute(&bounded)?.into_iter();
        let first = found.next();
        if found.next().is_some() {
            return Err(SessionError::NotUnique {
                entity: E::MODEL.name,
            });
        }

        Ok(first)
    }

    /// Whether the query matches at least one row. Nothing is cached.
    pub fn exists<E: EntityKind>(&self, query: &Query<E>) -> SessionResult<bool, C> {
        let statement = query.clone().limit(1).to_select(self.dialect())?;

        Ok(!self.core.query_rows(E::MODEL.table, &statement)?.is_empty())
    }

    pub fn count<E: EntityKind>(&self, query: &Query<E>) -> SessionResult<u64, C> {
        let statement = query.to_count(self.dialect())?;
        let rows = self.core.query_rows(E::MODEL.table, &statement)?;
        let value = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::Int(0));

        match value {
            Value::Int(count) => u64::try_from(count)
                .map_err(|_| EntityError::decode(FieldKind::Int, count).into()),
            other => Err(EntityError::decode(FieldKind::Int, other).into()),
        }
    }

    /// Point lookup by primary key; the cache is consulted first.
    pub fn load<E: EntityKind>(&self, pk: impl Into<Value>) -> SessionResult<Option<Entity<E>>, C> {
        Ok(self
            .core
            .load_model(E::MODEL, pk.into())?
            .map(Entity::from_record))
    }

    /// Cached instance for `pk`, without touching the database.
    #[must_use]
    pub fn find_cache<E: EntityKind>(&self, pk: impl Into<Value>) -> Option<Entity<E>> {
        if self.core.config.cache == CachePolicy::None {
            return None;
        }

        self.core
            .cache
            .borrow()
            .get(E::MODEL, &pk.into())
            .map(Entity::from_record)
    }

    /// Re-read every persistent column of a managed instance and clear its
    /// dirty set. Returns `false` when the row no longer exists.
    pub fn reload<E: EntityKind>(&self, entity: &Entity<E>) -> SessionResult<bool, C> {
        let identity = self.core.identity_of(entity.record())?;
        let spec = by_primary_key(E::MODEL, identity)?;
        let statement = spec.to_select(self.dialect())?;
        let projection = spec.projection()?;

        let Some(row) = self
            .core
            .query_rows(E::MODEL.table, &statement)?
            .into_iter()
            .next()
        else {
            return Ok(false);
        };
        check_row::<C::Error>(E::MODEL, &projection, &row)?;

        let mut record = entity.record().borrow_mut();
        for (value, &index) in row.into_iter().zip(&projection) {
            record.fill(index, value)?;
        }
        record.dirty.clear();

        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// INSERT every persistent column, then attach and cache the instance.
    pub fn save<E: EntityKind>(&self, entity: &Entity<E>) -> SessionResult<(), C> {
        let (statement, pk) = {
            let record = entity.record().borrow();
            let pk = record.primary_key();
            if pk.is_null() {
                return Err(SessionError::MissingPrimaryKey {
                    entity: E::MODEL.name,
                });
            }
            (write::insert(&record, self.dialect()), pk)
        };
        self.core.execute_statement(E::MODEL.table, &statement)?;
        self.core.attach(entity.record(), pk);

        Ok(())
    }

    /// Save each instance in order; stops at the first failure.
    ///
    /// Nothing is rolled back: earlier rows count as written unless the
    /// caller rolls the transaction back.
    pub fn save_all<E: EntityKind>(&self, entities: &[Entity<E>]) -> SessionResult<(), C> {
        for (position, entity) in entities.iter().enumerate() {
            if let Err(err) = self.save(entity) {
                warn!(entity = E::MODEL.name, position, error = %err, "save batch aborted");
                return Err(err);
            }
        }

        Ok(())
    }

    /// UPDATE exactly the dirty persistent columns, keyed by the primary key
    /// the instance was loaded or saved under.
    pub fn update<E: EntityKind>(&self, entity: &Entity<E>) -> SessionResult<u64, C> {
        let (statement, identity, pk, columns) = {
            let record = entity.record().borrow();
            let identity = self.core.owned_identity(&record).ok_or(SessionError::NotManaged {
                entity: E::MODEL.name,
            })?;
            let columns: Vec<usize> = record
                .dirty
                .iter()
                .copied()
                .filter(|&index| E::MODEL.fields[index].persistent)
                .collect();
            if columns.is_empty() {
                return Err(SessionError::NoChanges {
                    entity: E::MODEL.name,
                });
            }
            let pk = record.primary_key();
            if pk.is_null() {
                return Err(SessionError::MissingPrimaryKey {
                    entity: E::MODEL.name,
                });
            }
            let statement = write::update(&record, &columns, &identity, self.dialect());
            (statement, identity, pk, columns)
        };

        let affected = self.core.execute_statement(E::MODEL.table, &statement)?;

        {
            let mut record = entity.record().borrow_mut();
            record.dirty.clear();
            for index in columns {
                record.loaded[index] = true;
            }
            if let Some(attachment) = record.attachment.as_mut() {
                attachment.identity = pk.clone();
            }
        }
        if !values_equal(&identity, &pk) && self.core.config.cache == CachePolicy::Identity {
            let mut cache = self.core.cache.borrow_mut();
            cache.remove(E::MODEL, &identity, entity.record());
            cache.insert(E::MODEL, &pk, Rc::clone(entity.record()));
        }

        Ok(affected)
    }

    /// Update each instance in order; stops at the first failure,
    /// `NoChanges` included.
    pub fn update_all<E: EntityKind>(&self, entities: &[Entity<E>]) -> SessionResult<u64, C> {
        let mut affected = 0;
        for (position, entity) in entities.iter().enumerate() {
            match self.update(entity) {
                Ok(rows) => affected += rows,
                Err(err) => {
                    warn!(entity = E::MODEL.name, position, error = %err, "update batch aborted");
                    return Err(err);
                }
            }
        }

        Ok(affected)
    }

    /// UPDATE when managed by this session, INSERT otherwise. An update
    /// with nothing changed is a no-op.
    pub fn save_or_update<E: EntityKind>(&self, entity: &Entity<E>) -> SessionResult<(), C> {
        let managed = self.core.owned_identity(&entity.record().borrow()).is_some();
        if !managed {
            return self.save(entity);
        }

        match self.update(entity) {
            Ok(_) => Ok(()),
            Err(err) if err.is_recoverable() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Instance for `update_where`: it tracks changes like a managed one
    /// but has no identity and is never cached.
    #[must_use]
    pub fn template<E: EntityKind>(&self) -> Entity<E> {
        let mut record = Record::new(E::MODEL);
        record.attachment = Some(self.core.attachment(Value::Null));

        Entity::from_record(record.into_ref())
    }

    /// UPDATE the dirty persistent columns of `changes` on every row of `E`
    /// matching `predicate`. Cached instances of those rows keep their
    /// values until reloaded.
    pub fn update_where<E: EntityKind>(
        &self,
        changes: &Entity<E>,
        predicate: &Predicate,
    ) -> SessionResult<u64, C> {
        let statement = {
            let record = changes.record().borrow();
            if self.core.owned_identity(&record).is_none() {
                return Err(SessionError::NotManaged {
                    entity: E::MODEL.name,
                });
            }
            let columns: Vec<usize> = record
                .dirty
                .iter()
                .copied()
                .filter(|&index| E::MODEL.fields[index].persistent)
                .collect();
            if columns.is_empty() {
                return Err(SessionError::NoChanges {
                    entity: E::MODEL.name,
                });
            }
            if columns.contains(&E::MODEL.primary_key) {
                return Err(SessionError::PrimaryKeyUpdate {
                    entity: E::MODEL.name,
                });
            }
            write::update_where(&record, &columns, predicate, self.dialect())?
        };

        let affected = self.core.execute_statement(E::MODEL.table, &statement)?;
        changes.record().borrow_mut().dirty.clear();

        Ok(affected)
    }

    /// DELETE the instance's row by primary key. The instance stays cached.
    pub fn delete<E: EntityKind>(&self, entity: &Entity<E>) -> SessionResult<u64, C> {
        let pk = {
            let record = entity.record().borrow();
            self.core
                .owned_identity(&record)
                .unwrap_or_else(|| record.primary_key())
        };
        if pk.is_null() {
            return Err(SessionError::MissingPrimaryKey {
                entity: E::MODEL.name,
            });
        }

        let statement = write::delete_by_pk(E::MODEL, &pk, self.dialect());
        self.core.execute_statement(E::MODEL.table, &statement)
    }

    /// DELETE every row of `E` matching `predicate`. Cached instances of
    /// deleted rows are left in place.
    pub fn delete_where<E: EntityKind>(&self, predicate: &Predicate) -> SessionResult<u64, C> {
        let statement = write::delete_where(E::MODEL, predicate, self.dialect())?;
        self.core.execute_statement(E::MODEL.table, &statement)
    }

    // ---------------------------------------------------------------------
    // Cache
    // ---------------------------------------------------------------------

    /// Drop one instance from the cache and detach it.
    pub fn evict<E: EntityKind>(&self, entity: &Entity<E>) -> bool {
        let Some(identity) = self.core.owned_identity(&entity.record().borrow()) else {
            return false;
        };
        self.core
            .cache
            .borrow_mut()
            .remove(E::MODEL, &identity, entity.record());
        entity.record().borrow_mut().attachment = None;

        true
    }

    /// Detach and forget every cached instance.
    pub fn clear_cache(&self) {
        let drained = self.core.cache.borrow_mut().drain();
        for record in drained {
            record.borrow_mut().attachment = None;
        }
    }

    // ---------------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------------

    pub fn commit(&self) -> SessionResult<(), C> {
        debug!("commit");
        self.core
            .connection
            .borrow_mut()
            .commit()
            .map_err(SessionError::Connection)
    }

    pub fn rollback(&self) -> SessionResult<(), C> {
        debug!("rollback");
        self.core
            .connection
            .borrow_mut()
            .rollback()
            .map_err(SessionError::Connection)
    }
}

///
/// SessionCore
///
/// Shared state behind a session. Borrows of the connection and the cache
/// never span a call back into a record's loader.
///

struct SessionCore<C: Connection> {
    connection: RefCell<C>,
    cache: RefCell<IdentityCache>,
    dialect: Box<dyn Dialect>,
    config: SessionConfig,
    metrics: Option<&'static dyn MetricsSink>,
}

impl<C: Connection + 'static> SessionCore<C> {
    fn emit(&self, event: SessionEvent) {
        sink::record(self.metrics, event);
    }

    fn log(&self, statement: &Statement) {
        if self.config.log_statements {
            debug!(
                kind = statement.kind.as_str(),
                sql = %statement.sql,
                params = ?statement.params,
                "issuing statement"
            );
        }
    }

    fn query_rows(
        &self,
        table: &'static str,
        statement: &Statement,
    ) -> SessionResult<Vec<Row>, C> {
        self.log(statement);
        let rows = self
            .connection
            .borrow_mut()
            .query(statement)
            .map_err(SessionError::Connection)?;
        self.emit(SessionEvent::StatementIssued {
            kind: statement.kind,
            table,
            rows: rows.len() as u64,
        });

        Ok(rows)
    }

    fn execute_statement(
        &self,
        table: &'static str,
        statement: &Statement,
    ) -> SessionResult<u64, C> {
        self.log(statement);
        let affected = self
            .connection
            .borrow_mut()
            .execute(statement)
            .map_err(SessionError::Connection)?;
        self.emit(SessionEvent::StatementIssued {
            kind: statement.kind,
            table,
            rows: affected,
        });

        Ok(affected)
    }

    fn select(self: &Rc<Self>, spec: &QuerySpec) -> SessionResult<Vec<RecordRef>, C> {
        let mut statement = spec.to_select(self.dialect.as_ref())?;
        statement.fetch_size = statement.fetch_size.or(self.config.fetch_size);
        let projection = spec.projection()?;

        let rows = self.query_rows(spec.root().table, &statement)?;
        rows.into_iter()
            .map(|row| self.materialize(spec.root(), &projection, row))
            .collect()
    }

    /// Turn one row into a managed record, first-cached-wins.
    fn materialize(
        self: &Rc<Self>,
        model: &'static EntityModel,
        projection: &[usize],
        row: Row,
    ) -> SessionResult<RecordRef, C> {
        let position = check_row::<C::Error>(model, projection, &row)?;
        let pk = model.primary_key_field().kind.accept(row[position].clone())?;

        let cached = match self.config.cache {
            CachePolicy::Identity => self.cache.borrow().get(model, &pk),
            CachePolicy::None => None,
        };
        if let Some(cached) = cached {
            {
                let mut record = cached.borrow_mut();
                for (value, &index) in row.into_iter().zip(projection) {
                    if !record.loaded[index] && !record.dirty.contains(&index) {
                        record.fill(index, value)?;
                    }
                }
            }
            trace!(entity = model.name, pk = %pk, "cache hit");
            self.emit(SessionEvent::CacheHit { entity: model.name });

            return Ok(cached);
        }

        let mut record = Record::new(model);
        for (value, &index) in row.into_iter().zip(projection) {
            record.fill(index, value)?;
        }
        record.attachment = Some(self.attachment(pk.clone()));
        let record = record.into_ref();
        if self.config.cache == CachePolicy::Identity {
            self.cache.borrow_mut().insert(model, &pk, Rc::clone(&record));
        }
        self.emit(SessionEvent::CacheMiss { entity: model.name });

        Ok(record)
    }

    fn attachment(self: &Rc<Self>, identity: Value) -> Attachment {
        let loader: Weak<Self> = Rc::downgrade(self);

        Attachment { loader, identity }
    }

    /// Attach a freshly saved record under `pk` and cache it.
    fn attach(self: &Rc<Self>, record_ref: &RecordRef, pk: Value) {
        let previous = {
            let mut record = record_ref.borrow_mut();
            let previous = self.owned_identity(&record);
            record.attachment = Some(self.attachment(pk.clone()));
            record.dirty.clear();
            let persistent: Vec<usize> = record.model.persistent_fields().collect();
            for index in persistent {
                record.loaded[index] = true;
            }
            previous
        };

        if self.config.cache == CachePolicy::Identity {
            let model = record_ref.borrow().model;
            let mut cache = self.cache.borrow_mut();
            if let Some(previous) = previous {
                cache.remove(model, &previous, record_ref);
            }
            cache.insert(model, &pk, Rc::clone(record_ref));
        }
    }

    /// Identity of a record managed by this session.
    fn owned_identity(self: &Rc<Self>, record: &Record) -> Option<Value> {
        record
            .attachment
            .as_ref()
            .filter(|attachment| std::ptr::addr_eq(attachment.loader.as_ptr(), Rc::as_ptr(self)))
            .map(|attachment| attachment.identity.clone())
    }

    fn identity_of(self: &Rc<Self>, record: &RecordRef) -> SessionResult<Value, C> {
        let record = record.borrow();

        self.owned_identity(&record)
            .ok_or(SessionError::NotManaged {
                entity: record.model.name,
            })
    }

    fn load_model(
        self: &Rc<Self>,
        model: &'static EntityModel,
        pk: Value,
    ) -> SessionResult<Option<RecordRef>, C> {
        let pk = model.primary_key_field().kind.accept(pk)?;
        if pk.is_null() {
            return Ok(None);
        }
        if self.config.cache == CachePolicy::Identity {
            let cached = self.cache.borrow().get(model, &pk);
            if let Some(cached) = cached {
                trace!(entity = model.name, pk = %pk, "cache hit");
                self.emit(SessionEvent::CacheHit { entity: model.name });
                return Ok(Some(cached));
            }
        }

        let spec = by_primary_key(model, pk)?;
        Ok(self.select(&spec)?.into_iter().next())
    }
}

impl<C: Connection + 'static> RelationLoader for SessionCore<C> {
    fn load_record(
        self: Rc<Self>,
        model: &'static EntityModel,
        pk: &Value,
    ) -> Result<Option<RecordRef>, Box<dyn Error>> {
        trace!(entity = model.name, pk = %pk, "lazy load");
        self.emit(SessionEvent::LazyLoad { entity: model.name });

        self.load_model(model, pk.clone()).map_err(|err| match err {
            SessionError::Connection(err) => Box::new(err) as Box<dyn Error>,
            other => Box::new(other),
        })
    }
}

/// Single-row query on the primary key.
fn by_primary_key(
    model: &'static EntityModel,
    pk: Value,
) -> Result<QuerySpec, crate::db::predicate::PredicateError> {
    let key = KeyPath::direct(KeyRef::new(model, model.primary_key));
    let mut spec = QuerySpec::new(model);
    spec.add_filter(Predicate::compare(key, CompareOp::Eq, Operand::Value(pk))?);

    Ok(spec)
}

/// Position of the primary key in a row of `projection` shape.
fn check_row<E: Error + 'static>(
    model: &'static EntityModel,
    projection: &[usize],
    row: &Row,
) -> Result<usize, SessionError<E>> {
    let shape = || SessionError::RowShape {
        table: model.table,
        expected: projection.len(),
        found: row.len(),
    };
    if row.len() != projection.len() {
        return Err(shape());
    }

    projection
        .iter()
        .position(|&index| index == model.primary_key)
        .ok_or_else(shape)
}
