mod cursor;
pub use cursor::{Cursor, MemoryCursor, ResultColumn};

mod param;
pub use param::{OutParam, Param, ParamTarget};

mod response;
pub use response::{CallResponse, Response};

mod row_edit;
pub use row_edit::RowEdit;

use crate::{schema::Table, stmt::Value, Error, Result};

use std::{borrow::Cow, fmt::Debug};

/// The relational connection the scripting bridge calls out to.
///
/// Every method may block for as long as the database takes to answer; the
/// bridge only ever calls it from the script's background context.
pub trait Connection: Debug + Send + Sync + 'static {
    /// The URL this connection was opened with.
    fn url(&self) -> Cow<'_, str>;

    /// Qualified names of every table visible through this connection.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Reads the full descriptor (columns, keys, indexes) of one table.
    fn table_metadata(&self, qualified_name: &str) -> Result<Table>;

    /// Execute a statement, producing either a cursor or an update count.
    fn execute(&self, sql: &str, params: &[Param]) -> Result<Response>;

    /// Execute a callable statement with output parameters.
    fn call(&self, sql: &str, params: &[Param], out: &[OutParam]) -> Result<CallResponse> {
        let _ = (sql, params, out);
        Err(Error::unsupported(
            "callable statements are not supported by this connection",
        ))
    }

    /// Reads every row of `table`, each row holding one value per column.
    fn load_rows(&self, table: &Table) -> Result<Vec<Vec<Value>>>;

    /// Writes buffered row-model edits back to the database.
    ///
    /// `key_columns` are the positions identifying a row in `RowEdit` keys.
    fn apply_edits(&self, table: &Table, key_columns: &[usize], edits: &[RowEdit]) -> Result<()>;
}
