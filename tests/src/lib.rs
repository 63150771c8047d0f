mod exec_log;
pub use exec_log::ExecLog;

pub use logging_connection::LoggingConnection;

pub use std_util::*;

use crumpet::{Builder, Db};
use crumpet_driver_sqlite::Sqlite;

use std::sync::Once;

/// A database over a fresh in-memory SQLite connection, with every statement
/// it executes recorded.
pub struct DbTest {
    db: Db,
    log: ExecLog,
}

impl DbTest {
    /// Build the schema from `builder`, connect and create every table. The
    /// log starts out empty.
    pub async fn setup(builder: Builder) -> DbTest {
        init_tracing();

        let connection = LoggingConnection::new(Box::new(Sqlite::in_memory()));
        let log = connection.log();

        let db = builder.build_with(connection).await.unwrap();
        db.flush_schema().await.unwrap();
        log.clear();

        DbTest { db, log }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn log(&self) -> &ExecLog {
        &self.log
    }
}

/// Installs a `RUST_LOG`-filtered subscriber once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
