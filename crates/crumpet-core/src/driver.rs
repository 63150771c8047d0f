use crate::{
    async_trait,
    stmt::{Params, Row},
    Result,
};

use std::fmt::Debug;

/// A connection to the SQL backend.
///
/// The core issues one statement at a time and never wraps several statements
/// in a transaction. Errors raised by the backend are returned unchanged,
/// wrapped with [`Error::driver`](crate::Error::driver).
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Open the underlying connection. Calling `connect` on an open connection
    /// is a no-op.
    async fn connect(&mut self) -> Result<()>;

    /// Close the underlying connection, releasing its resources.
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Execute raw SQL text without parameters or results, e.g. DDL.
    async fn exec(&mut self, sql: &str) -> Result<()>;

    /// Execute a statement that does not return rows.
    async fn run(&mut self, stmt: &Statement) -> Result<Outcome>;

    /// Execute a query, returning its first row if any.
    async fn get(&mut self, stmt: &Statement) -> Result<Option<Row>>;

    /// Execute a query, returning every row.
    async fn all(&mut self, stmt: &Statement) -> Result<Vec<Row>>;
}

/// A compiled SQL statement together with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

/// Result of running a statement that does not return rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Number of rows inserted, updated or deleted.
    pub changes: u64,

    /// Row id of the most recent successful insert on the connection.
    pub last_insert_row_id: i64,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Params) -> Statement {
        Statement {
            sql: sql.into(),
            params,
        }
    }
}
