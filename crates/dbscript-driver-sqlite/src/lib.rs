mod edit;
mod metadata;

mod value;
pub(crate) use value::Value;

use dbscript_core::{
    driver::{MemoryCursor, Param, ParamTarget, Response, ResultColumn, RowEdit},
    err,
    schema::Table,
    stmt, Error, Result,
};
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, Statement};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver_operation_failed)?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_argument(
                "connection URL",
                format!("connection URL does not have a `sqlite` scheme; url={url_str}"),
            ));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    pub fn connect(&self) -> Result<Connection> {
        match self {
            Sqlite::File(path) => Connection::open(path),
            Sqlite::InMemory => Connection::in_memory(),
        }
    }
}

/// A single SQLite connection.
///
/// Calls are serialized through one lock; the scripting bridge never issues
/// more than one at a time per console anyway.
#[derive(Debug)]
pub struct Connection {
    connection: Mutex<RusqliteConnection>,
    url: String,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;
        Ok(Self {
            connection: Mutex::new(connection),
            url: Sqlite::InMemory.url().into_owned(),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection =
            RusqliteConnection::open(path.as_ref()).map_err(Error::driver_operation_failed)?;
        Ok(Self {
            connection: Mutex::new(connection),
            url: Sqlite::open(path).url().into_owned(),
        })
    }

    /// Runs one or more semicolon-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection
            .lock()
            .execute_batch(sql)
            .map_err(Error::driver_operation_failed)
    }
}

impl dbscript_core::Connection for Connection {
    fn url(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.url)
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let names = metadata::table_names(&self.connection.lock())?;
        Ok(names.iter().map(|name| metadata::qualify(name)).collect())
    }

    fn table_metadata(&self, qualified_name: &str) -> Result<Table> {
        metadata::table(&self.connection.lock(), metadata::bare_name(qualified_name))
    }

    fn execute(&self, sql: &str, params: &[Param]) -> Result<Response> {
        let connection = self.connection.lock();
        let mut stmt = connection
            .prepare(sql)
            .map_err(Error::driver_operation_failed)?;
        bind(&mut stmt, params)?;

        if stmt.column_count() == 0 {
            let count = stmt.raw_execute().map_err(Error::driver_operation_failed)?;
            debug!(sql, count, "statement executed");
            return Ok(Response::count(count as u64));
        }

        let mut columns: Vec<ResultColumn> = stmt
            .columns()
            .iter()
            .map(|column| ResultColumn::new(column.name(), column.decl_type().unwrap_or_default()))
            .collect();

        let mut rows = vec![];
        let mut cursor = stmt.raw_query();
        while let Some(row) = cursor.next().map_err(Error::driver_operation_failed)? {
            let values = columns
                .iter()
                .enumerate()
                .map(|(index, column)| Value::from_sql(row, index, column.sql_type).map(Value::into_inner))
                .collect::<Result<Vec<_>>>()?;
            rows.push(values);
        }

        // Expression columns have no declared type; describe them by the
        // storage class of their first non-null value.
        for (index, column) in columns.iter_mut().enumerate() {
            if !column.db_type.is_empty() {
                continue;
            }
            let first = rows.iter().map(|row| &row[index]).find(|value| !value.is_null());
            if let Some(value) = first {
                *column = ResultColumn::new(column.name.clone(), storage_class(value));
            }
        }

        debug!(sql, rows = rows.len(), "query executed");
        Ok(Response::cursor(MemoryCursor::new(columns, rows)))
    }

    fn load_rows(&self, table: &Table) -> Result<Vec<Vec<stmt::Value>>> {
        if table.columns.is_empty() {
            return Ok(vec![]);
        }

        let columns = table
            .columns
            .iter()
            .map(|column| metadata::quote(&column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {columns} FROM {}", metadata::quote(&table.name));

        let connection = self.connection.lock();
        let mut stmt = connection
            .prepare(&sql)
            .map_err(Error::driver_operation_failed)?;

        let mut rows = vec![];
        let mut cursor = stmt.raw_query();
        while let Some(row) = cursor.next().map_err(Error::driver_operation_failed)? {
            let values = table
                .columns
                .iter()
                .enumerate()
                .map(|(index, column)| Value::from_sql(row, index, column.sql_type).map(Value::into_inner))
                .collect::<Result<Vec<_>>>()?;
            rows.push(values);
        }

        debug!(table = %table.qualified_name, rows = rows.len(), "rows read");
        Ok(rows)
    }

    fn apply_edits(&self, table: &Table, key_columns: &[usize], edits: &[RowEdit]) -> Result<()> {
        let mut connection = self.connection.lock();
        let tx = connection
            .transaction()
            .map_err(Error::driver_operation_failed)?;

        for edit in edits {
            let edit = edit::statement(table, key_columns, edit);
            let count = tx
                .prepare_cached(&edit.sql)
                .and_then(|mut stmt| {
                    stmt.execute(rusqlite::params_from_iter(
                        edit.params.into_iter().map(Value::from),
                    ))
                })
                .map_err(Error::driver_operation_failed)?;

            // Dropping `tx` on the way out rolls every edit back.
            if edit.single_row && count != 1 {
                return Err(err!(
                    "`{}` affected {count} rows of `{}`, expected 1",
                    edit.sql,
                    table.qualified_name
                ));
            }
        }

        tx.commit().map_err(Error::driver_operation_failed)?;
        debug!(table = %table.qualified_name, edits = edits.len(), "edits applied");
        Ok(())
    }
}

fn bind(stmt: &mut Statement<'_>, params: &[Param]) -> Result<()> {
    for param in params {
        let index = match &param.target {
            ParamTarget::Index(index) => *index,
            ParamTarget::Name(name) => parameter_index(stmt, name)?,
        };

        if index == 0 || index > stmt.parameter_count() {
            return Err(Error::invalid_argument(
                "parameter binding",
                format!(
                    "parameter {index} out of range, statement has {}",
                    stmt.parameter_count()
                ),
            ));
        }

        let value = match param.ty {
            Some(ty) => Value::coerce(param.value.clone(), ty)?,
            None => Value::from(param.value.clone()),
        };
        stmt.raw_bind_parameter(index, value)
            .map_err(Error::driver_operation_failed)?;
    }
    Ok(())
}

/// Resolves a named parameter, with or without its `:`, `@` or `$` prefix.
fn parameter_index(stmt: &Statement<'_>, name: &str) -> Result<usize> {
    let candidates: Vec<String> = if name.starts_with([':', '@', '$']) {
        vec![name.to_string()]
    } else {
        [':', '@', '$'].iter().map(|prefix| format!("{prefix}{name}")).collect()
    };

    for candidate in &candidates {
        if let Some(index) = stmt
            .parameter_index(candidate)
            .map_err(Error::driver_operation_failed)?
        {
            return Ok(index);
        }
    }

    Err(Error::invalid_argument(
        "parameter binding",
        format!("statement has no parameter named `{name}`"),
    ))
}

fn storage_class(value: &stmt::Value) -> &'static str {
    match value {
        stmt::Value::Bool(_) | stmt::Value::I64(_) => "INTEGER",
        stmt::Value::F64(_) => "REAL",
        stmt::Value::String(_) => "TEXT",
        stmt::Value::Bytes(_) => "BLOB",
        stmt::Value::Null => "",
    }
}
