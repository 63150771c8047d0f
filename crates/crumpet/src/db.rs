mod builder;
pub use builder::Builder;

mod connect;
pub(crate) use connect::connect;

use crate::{FindOptions, FindResult, ModelHandle};

use crumpet_core::{
    driver::{Outcome, Statement},
    schema::{now_millis, UPDATED_AT},
    stmt::{Record, Row, Value},
    Connection, Error, Result, Schema,
};
use crumpet_sql::{Count, Insert, Remove, Select, Update, COUNT_ALIAS};
use serde_json::Value as Json;

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::Mutex;

/// Shared state between all `Db` clones.
pub(crate) struct Shared {
    schema: Schema,

    /// At most one active connection
    connection: Mutex<Option<Box<dyn Connection>>>,

    schema_flushed: AtomicBool,
}

/// A database handle: the frozen schema plus at most one active connection.
///
/// Cloning is cheap; every clone shares the schema and the connection.
#[derive(Clone)]
pub struct Db {
    shared: Arc<Shared>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub(crate) fn new(schema: Schema) -> Db {
        Db {
            shared: Arc::new(Shared {
                schema,
                connection: Mutex::new(None),
                schema_flushed: AtomicBool::new(false),
            }),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    /// Handle to the model named `name`.
    pub fn model(&self, name: &str) -> Result<ModelHandle> {
        let model = self.schema().model(name)?;
        Ok(ModelHandle::new(self.clone(), Arc::new(model.clone())))
    }

    /// `CREATE TABLE` statements for every model, joined with `; `.
    pub fn create_schema(&self) -> Result<String> {
        crumpet_sql::create_schema(self.schema())
    }

    /// Creates every table on the active connection. Succeeds at most once
    /// per `Db`.
    pub async fn flush_schema(&self) -> Result<()> {
        if self.shared.schema_flushed.swap(true, Ordering::SeqCst) {
            return Err(Error::schema_already_flushed());
        }

        let result = match self.create_schema() {
            Ok(sql) => self.exec(&sql).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                tracing::info!(models = self.schema().models().len(), "schema flushed");
                Ok(())
            }
            Err(err) => {
                // Nothing was created; allow another attempt.
                self.shared.schema_flushed.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Replace the active connection. The previous connection, if any, is
    /// disconnected first. The new connection is opened if it is not yet.
    pub async fn set_connection(&self, mut connection: Box<dyn Connection>) -> Result<()> {
        let mut slot = self.shared.connection.lock().await;

        if let Some(mut previous) = slot.take() {
            tracing::warn!(previous = ?previous, "replacing active connection");
            previous.disconnect().await?;
        }

        if !connection.is_connected() {
            connection.connect().await?;
        }

        tracing::info!(connection = ?connection, "connection set");
        *slot = Some(connection);
        Ok(())
    }

    /// Disconnect and drop the active connection. A no-op without one.
    pub async fn release_connection(&self) -> Result<()> {
        let mut slot = self.shared.connection.lock().await;

        if let Some(mut connection) = slot.take() {
            connection.disconnect().await?;
            tracing::info!(connection = ?connection, "connection released");
        }

        Ok(())
    }

    pub async fn connection_is_set(&self) -> bool {
        self.shared.connection.lock().await.is_some()
    }

    /// Insert one row of `model`.
    pub async fn insert(&self, model: &str, values: Record) -> Result<Outcome> {
        let stmt = Insert::new(model).values(values).build(self.schema())?;
        self.run(&stmt).await
    }

    /// Update the rows of `update.model` matching its criteria, returning the
    /// number of changed rows. Models with an `updated_at` timestamp get it
    /// refreshed unless the assignments already set it.
    pub async fn update(&self, mut update: Update) -> Result<u64> {
        let model = self.schema().model(&update.model)?;

        if model.options.timestamps.updated
            && !update.assignments.is_empty()
            && !update.assignments.contains_key(UPDATED_AT)
        {
            update.assignments.insert(UPDATED_AT.to_string(), now_millis());
        }

        match update.build(self.schema())? {
            Some(stmt) => Ok(self.run(&stmt).await?.changes),
            None => Ok(0),
        }
    }

    /// Delete the rows matching `remove`, returning the number removed.
    pub async fn remove(&self, remove: Remove) -> Result<u64> {
        let stmt = remove.build(self.schema())?;
        Ok(self.run(&stmt).await?.changes)
    }

    /// Delete every row of `model`.
    pub async fn remove_all(&self, model: &str) -> Result<u64> {
        self.remove(Remove::all(model)).await
    }

    /// Search `model`, decoding each row into an instance along with the
    /// companions of any joined relation.
    pub async fn find(&self, model: &str, options: FindOptions) -> Result<FindResult> {
        let handle = self.model(model)?;
        let select = Select {
            model: model.to_string(),
            criteria: options.filter,
            sort: options.sort,
            limit: options.limit,
            offset: options.offset,
            join: options.join,
            count: options.count,
        }
        .build(self.schema())?;

        let mut joined_handles = Vec::with_capacity(select.joined.len());
        for joined in &select.joined {
            joined_handles.push((joined.name.clone(), self.model(&joined.model)?));
        }

        let rows = self.all(&select.statement).await?;
        let mut result = FindResult::default();

        for row in &rows {
            result
                .items
                .push(handle.build_from_database_result(row, Some(&select.prefix))?);

            if joined_handles.is_empty() {
                continue;
            }

            let mut joined = crate::Joined::new();
            for (name, companion) in &joined_handles {
                let instance = if companion.row_is_present(row, name) {
                    Some(companion.build_from_database_result(row, Some(name))?)
                } else {
                    None
                };
                joined.insert(name.clone(), instance);
            }
            result.joined.push(joined);
        }

        if let Some(count) = &select.count {
            result.total_count = Some(self.fetch_count(count).await?);
        }

        Ok(result)
    }

    /// Number of rows of `model` matching `criteria`.
    pub async fn count(&self, model: &str, criteria: Json) -> Result<u64> {
        let stmt = Count::new(model).filter(criteria).build(self.schema())?;
        self.fetch_count(&stmt).await
    }

    pub(crate) async fn fetch_count(&self, stmt: &Statement) -> Result<u64> {
        let row = self.get(stmt).await?;
        let count = row
            .as_ref()
            .and_then(|row| row.get(COUNT_ALIAS))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn exec(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "exec");
        let mut slot = self.shared.connection.lock().await;
        let connection = slot.as_mut().ok_or_else(Error::not_connected)?;
        connection.exec(sql).await
    }

    pub(crate) async fn run(&self, stmt: &Statement) -> Result<Outcome> {
        tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "run");
        let mut slot = self.shared.connection.lock().await;
        let connection = slot.as_mut().ok_or_else(Error::not_connected)?;
        connection.run(stmt).await
    }

    pub(crate) async fn get(&self, stmt: &Statement) -> Result<Option<Row>> {
        tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "get");
        let mut slot = self.shared.connection.lock().await;
        let connection = slot.as_mut().ok_or_else(Error::not_connected)?;
        connection.get(stmt).await
    }

    pub(crate) async fn all(&self, stmt: &Statement) -> Result<Vec<Row>> {
        tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "all");
        let mut slot = self.shared.connection.lock().await;
        let connection = slot.as_mut().ok_or_else(Error::not_connected)?;
        let rows = connection.all(stmt).await?;
        tracing::trace!(rows = rows.len(), "fetched");
        Ok(rows)
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("schema", &self.shared.schema)
            .field(
                "schema_flushed",
                &self.shared.schema_flushed.load(Ordering::Relaxed),
            )
            .finish()
    }
}
