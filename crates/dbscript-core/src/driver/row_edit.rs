use crate::stmt::Value;

/// A buffered change to a table's rows, produced by the row model on commit.
#[derive(Debug, Clone, PartialEq)]
pub enum RowEdit {
    /// Delete the row identified by `key`
    Delete { key: Vec<Value> },

    /// Overwrite the columns listed in `changed` of the row identified by `key`
    Update {
        key: Vec<Value>,
        values: Vec<Value>,
        changed: Vec<usize>,
    },

    /// Insert a new row
    Insert { values: Vec<Value> },
}
