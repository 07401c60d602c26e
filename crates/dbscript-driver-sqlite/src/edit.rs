use crate::metadata::quote;
use dbscript_core::{driver::RowEdit, schema::Table, stmt::Value};

/// A statement applying one row edit.
pub(crate) struct EditStatement {
    pub(crate) sql: String,
    pub(crate) params: Vec<Value>,

    /// Whether exactly one row must be affected
    pub(crate) single_row: bool,
}

/// Builds the statement for `edit`. Rows are identified by the values at
/// `key_columns`, compared with `IS` so null key components still match.
pub(crate) fn statement(table: &Table, key_columns: &[usize], edit: &RowEdit) -> EditStatement {
    let name = quote(&table.name);
    let column = |index: usize| quote(&table.columns[index].name);

    let filter = |first_param: usize| {
        key_columns
            .iter()
            .enumerate()
            .map(|(i, &index)| format!("{} IS ?{}", column(index), first_param + i))
            .collect::<Vec<_>>()
            .join(" AND ")
    };

    match edit {
        RowEdit::Delete { key } => EditStatement {
            sql: format!("DELETE FROM {name} WHERE {}", filter(1)),
            params: key.clone(),
            single_row: true,
        },
        RowEdit::Update {
            key,
            values,
            changed,
        } => {
            let assignments = changed
                .iter()
                .enumerate()
                .map(|(i, &index)| format!("{} = ?{}", column(index), i + 1))
                .collect::<Vec<_>>()
                .join(", ");

            let mut params: Vec<Value> = changed.iter().map(|&index| values[index].clone()).collect();
            let filter = filter(params.len() + 1);
            params.extend(key.iter().cloned());

            EditStatement {
                sql: format!("UPDATE {name} SET {assignments} WHERE {filter}"),
                params,
                single_row: true,
            }
        }
        RowEdit::Insert { values } => {
            let columns = (0..table.columns.len())
                .map(column)
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=values.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");

            EditStatement {
                sql: format!("INSERT INTO {name} ({columns}) VALUES ({placeholders})"),
                params: values.clone(),
                single_row: false,
            }
        }
    }
}
