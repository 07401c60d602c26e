mod logging_connection;
pub use logging_connection::{DriverOp, LoggingConnection};

use dbscript::{CancelToken, Config, ConsoleBuffer, Evaluation, ScriptEnv, ScriptSession};
use dbscript_core::{Catalog, Connection};
use dbscript_driver_sqlite::Connection as SqliteConnection;
use std::sync::Arc;

/// Customers, their orders, and an audit log without a primary key.
pub const SHOP: &str = "
    CREATE TABLE CUSTOMERS (
        ID INTEGER PRIMARY KEY,
        NAME VARCHAR(40) NOT NULL,
        CITY VARCHAR(40)
    );
    CREATE TABLE ORDERS (
        ID INTEGER PRIMARY KEY,
        CUSTOMER_ID INTEGER REFERENCES CUSTOMERS (ID),
        TOTAL REAL
    );
    CREATE INDEX ORDERS_BY_CUSTOMER ON ORDERS (CUSTOMER_ID);
    CREATE TABLE AUDIT (AT TEXT, MESSAGE TEXT);

    INSERT INTO CUSTOMERS VALUES (7, 'Alice', 'Oslo'), (9, 'Bob', NULL);
    INSERT INTO ORDERS VALUES (100, 7, 12.5), (101, 9, 3.0), (102, 7, 40.0);
    INSERT INTO AUDIT VALUES ('09:00', 'opened'), ('17:00', 'closed');
";

/// An in-memory SQLite database holding `schema`.
pub fn sqlite(schema: &str) -> Arc<SqliteConnection> {
    let connection = SqliteConnection::in_memory().unwrap();
    connection.execute_batch(schema).unwrap();
    Arc::new(connection)
}

/// A script session over one connection, printing into its own console.
pub struct Harness {
    pub catalog: Arc<Catalog>,
    pub console: ConsoleBuffer,
    pub session: ScriptSession,
}

impl Harness {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self::with_config(connection, Config::default())
    }

    pub fn with_config(connection: Arc<dyn Connection>, config: Config) -> Self {
        let catalog = Arc::new(Catalog::new(connection));
        let console = ConsoleBuffer::new();
        let session = ScriptSession::new(
            ScriptEnv::new(catalog.clone()),
            Arc::new(console.clone()),
            config,
        );
        Self {
            catalog,
            console,
            session,
        }
    }

    pub fn shop() -> Self {
        Self::new(sqlite(SHOP))
    }

    pub fn eval(&self, source: &str) -> Evaluation {
        self.session.evaluate(source, &CancelToken::new())
    }

    /// Display form of the script's value. Panics unless it completes with one.
    #[track_caller]
    pub fn value(&self, source: &str) -> String {
        match self.eval(source) {
            Evaluation::Completed(Some(value)) => value,
            other => panic!("unexpected outcome for `{source}`: {other:?}"),
        }
    }

    /// Runs `source` and returns what it printed.
    #[track_caller]
    pub fn output(&self, source: &str) -> String {
        self.console.clear();
        let outcome = self.eval(source);
        assert!(outcome.is_completed(), "`{source}` did not complete: {outcome:?}");
        self.console.text()
    }
}
