mod value;
pub(crate) use value::Value;

use crumpet_core::{
    async_trait,
    driver::{Outcome, Statement},
    stmt::Row,
    Error, Result,
};
use rusqlite::{types::ToSql, Connection as RusqliteConnection};
use std::path::{Path, PathBuf};
use url::Url;

/// SQLite backend, opened lazily on [`connect`](crumpet_core::Connection::connect).
#[derive(Debug)]
pub struct Sqlite {
    location: Location,
    connection: Option<RusqliteConnection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver from a connection URL: `sqlite::memory:` or
    /// `sqlite:<path>`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(|err| {
            Error::invalid_connection_url(format!("{err}; url={url_str}"))
        })?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::in_memory())
        } else {
            Ok(Self::open(url.path()))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self {
            location: Location::InMemory,
            connection: None,
        }
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            connection: None,
        }
    }

    pub fn url(&self) -> String {
        match &self.location {
            Location::InMemory => "sqlite::memory:".to_string(),
            Location::File(path) => format!("sqlite:{}", path.display()),
        }
    }

    fn connection(&self) -> Result<&RusqliteConnection> {
        self.connection.as_ref().ok_or_else(Error::not_connected)
    }
}

#[async_trait]
impl crumpet_core::Connection for Sqlite {
    async fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let connection = match &self.location {
            Location::File(path) => RusqliteConnection::open(path),
            Location::InMemory => RusqliteConnection::open_in_memory(),
        }
        .map_err(Error::driver)?;

        self.connection = Some(connection);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.close().map_err(|(_, err)| Error::driver(err))?;
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn exec(&mut self, sql: &str) -> Result<()> {
        self.connection()?
            .execute_batch(sql)
            .map_err(Error::driver)
    }

    async fn run(&mut self, stmt: &Statement) -> Result<Outcome> {
        let connection = self.connection()?;
        let mut prepared = connection.prepare_cached(&stmt.sql).map_err(Error::driver)?;

        let bound = Bindings::new(stmt);
        let changes = prepared
            .execute(&bound.as_params()[..])
            .map_err(Error::driver)?;

        Ok(Outcome {
            changes: changes as u64,
            last_insert_row_id: connection.last_insert_rowid(),
        })
    }

    async fn get(&mut self, stmt: &Statement) -> Result<Option<Row>> {
        Ok(self.query(stmt, Some(1))?.pop())
    }

    async fn all(&mut self, stmt: &Statement) -> Result<Vec<Row>> {
        self.query(stmt, None)
    }
}

impl Sqlite {
    fn query(&self, stmt: &Statement, limit: Option<usize>) -> Result<Vec<Row>> {
        let connection = self.connection()?;
        let mut prepared = connection.prepare_cached(&stmt.sql).map_err(Error::driver)?;

        let columns: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let bound = Bindings::new(stmt);
        let mut rows = prepared
            .query(&bound.as_params()[..])
            .map_err(Error::driver)?;

        let mut ret = vec![];

        while let Some(row) = rows.next().map_err(Error::driver)? {
            let mut record = Row::with_capacity(columns.len());

            for (index, column) in columns.iter().enumerate() {
                let value = row.get_ref(index).map_err(Error::driver)?;
                record.insert(column.clone(), Value::from_sql(value).into_inner());
            }

            ret.push(record);

            if limit.is_some_and(|limit| ret.len() >= limit) {
                break;
            }
        }

        Ok(ret)
    }
}

/// Named parameters of a statement in the form rusqlite binds them.
struct Bindings {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Bindings {
    fn new(stmt: &Statement) -> Bindings {
        let (names, values): (Vec<_>, Vec<_>) = stmt
            .params
            .iter()
            .map(|(name, value)| (format!(":{name}"), Value::from(value.clone())))
            .unzip();

        Bindings { names, values }
    }

    fn as_params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}
