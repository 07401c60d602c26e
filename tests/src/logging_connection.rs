use dbscript_core::{
    driver::{Param, Response, RowEdit},
    schema::Table,
    stmt::Value,
    Connection, Result,
};
use parking_lot::Mutex;
use std::{borrow::Cow, sync::Arc};

#[derive(Debug, Clone, PartialEq)]
pub enum DriverOp {
    TableMetadata(String),
    Execute { sql: String, params: Vec<Param> },
    LoadRows(String),
    ApplyEdits { table: String, edits: Vec<RowEdit> },
}

/// A connection wrapper that logs every operation reaching the database
#[derive(Debug)]
pub struct LoggingConnection {
    /// The connection that actually executes operations
    inner: Arc<dyn Connection>,

    /// Shared with tests so they can read the log after the connection
    /// was handed to a catalog
    ops_log: Arc<Mutex<Vec<DriverOp>>>,
}

impl LoggingConnection {
    pub fn new(inner: Arc<dyn Connection>) -> Self {
        Self {
            inner,
            ops_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ops_log_handle(&self) -> Arc<Mutex<Vec<DriverOp>>> {
        self.ops_log.clone()
    }

    fn log(&self, op: DriverOp) {
        self.ops_log.lock().push(op);
    }
}

impl Connection for LoggingConnection {
    fn url(&self) -> Cow<'_, str> {
        self.inner.url()
    }

    fn table_names(&self) -> Result<Vec<String>> {
        self.inner.table_names()
    }

    fn table_metadata(&self, qualified_name: &str) -> Result<Table> {
        self.log(DriverOp::TableMetadata(qualified_name.to_string()));
        self.inner.table_metadata(qualified_name)
    }

    fn execute(&self, sql: &str, params: &[Param]) -> Result<Response> {
        self.log(DriverOp::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.inner.execute(sql, params)
    }

    fn load_rows(&self, table: &Table) -> Result<Vec<Vec<Value>>> {
        self.log(DriverOp::LoadRows(table.qualified_name.clone()));
        self.inner.load_rows(table)
    }

    fn apply_edits(&self, table: &Table, key_columns: &[usize], edits: &[RowEdit]) -> Result<()> {
        self.log(DriverOp::ApplyEdits {
            table: table.qualified_name.clone(),
            edits: edits.to_vec(),
        });
        self.inner.apply_edits(table, key_columns, edits)
    }
}
