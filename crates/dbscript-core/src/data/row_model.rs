use crate::{
    driver::RowEdit,
    stmt::{key_matches, Value},
    Error, Result,
};

/// The loaded rows of one table.
///
/// Row indices are positions in this model. They stay valid until the model
/// is sorted, reloaded or rolled back.
#[derive(Debug, Clone, Default)]
pub struct RowModel {
    width: usize,
    rows: Vec<ModelRow>,

    /// Original values of removed rows that were loaded from the database
    removed: Vec<Vec<Value>>,

    editing: Option<CellEdit>,
}

#[derive(Debug, Clone)]
struct ModelRow {
    values: Vec<Value>,
    state: RowState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowState {
    Clean,
    Inserted,
    Modified { original: Vec<Value> },
}

/// An in-progress cell edit, as started by a table editor.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row: usize,
    pub column: usize,

    /// Value typed into the editor and not yet written to the row
    pub pending: Option<Value>,
}

impl RowModel {
    /// Creates a clean model. Rows are padded with nulls or truncated to `width`.
    pub fn new(width: usize, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut values| {
                values.resize(width, Value::Null);
                ModelRow {
                    values,
                    state: RowState::Clean,
                }
            })
            .collect();

        Self {
            width,
            rows,
            removed: vec![],
            editing: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|row| &row.values[..])
    }

    pub fn row_state(&self, index: usize) -> Option<&RowState> {
        self.rows.get(index).map(|row| &row.state)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.values.get(column)
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Value]> + '_ {
        self.rows.iter().map(|row| &row.values[..])
    }

    /// Returns `true` if there are edits that have not been committed.
    pub fn is_dirty(&self) -> bool {
        !self.removed.is_empty()
            || self
                .rows
                .iter()
                .any(|row| !matches!(row.state, RowState::Clean))
    }

    /// Appends a row of nulls and returns its index.
    pub fn add_row(&mut self) -> usize {
        self.stop_editing();
        self.rows.push(ModelRow {
            values: vec![Value::Null; self.width],
            state: RowState::Inserted,
        });
        self.rows.len() - 1
    }

    pub fn remove_row(&mut self, index: usize) -> Result<()> {
        self.check_row(index)?;
        self.stop_editing();

        let row = self.rows.remove(index);
        match row.state {
            RowState::Inserted => {}
            RowState::Clean => self.removed.push(row.values),
            RowState::Modified { original } => self.removed.push(original),
        }
        Ok(())
    }

    /// Starts editing a cell, ending any edit already in progress.
    pub fn begin_edit(&mut self, row: usize, column: usize) -> Result<()> {
        self.check_cell(row, column)?;
        self.stop_editing();
        self.editing = Some(CellEdit {
            row,
            column,
            pending: None,
        });
        Ok(())
    }

    /// Records the editor's current value for the cell being edited.
    pub fn update_edit(&mut self, value: Value) -> Result<()> {
        match &mut self.editing {
            Some(edit) => {
                edit.pending = Some(value);
                Ok(())
            }
            None => Err(Error::invalid_argument(
                "update_edit(value)",
                "no cell edit is in progress",
            )),
        }
    }

    pub fn editing(&self) -> Option<&CellEdit> {
        self.editing.as_ref()
    }

    /// Ends the in-progress cell edit, writing its pending value.
    pub fn stop_editing(&mut self) -> Option<CellEdit> {
        let edit = self.editing.take()?;
        if let Some(value) = &edit.pending {
            self.write(edit.row, edit.column, value.clone());
        }
        Some(edit)
    }

    /// Writes one cell. Any in-progress cell edit is ended first so its
    /// pending value cannot overwrite this one later.
    pub fn set_value(&mut self, row: usize, column: usize, value: Value) -> Result<()> {
        self.check_cell(row, column)?;
        self.stop_editing();
        self.write(row, column, value);
        Ok(())
    }

    fn write(&mut self, row: usize, column: usize, value: Value) {
        let Some(row) = self.rows.get_mut(row) else {
            return;
        };
        if row.values[column] == value {
            return;
        }
        if let RowState::Clean = row.state {
            row.state = RowState::Modified {
                original: row.values.clone(),
            };
        }
        row.values[column] = value;
    }

    /// Sorts the rows by one column. Previously obtained row indices are invalid afterwards.
    pub fn sort_by_column(&mut self, column: usize, ascending: bool) -> Result<()> {
        if column >= self.width {
            return Err(Error::invalid_argument(
                "sort(column, ascending)",
                format!("column {column} out of range, table has {} columns", self.width),
            ));
        }
        self.stop_editing();
        self.rows.sort_by(|a, b| {
            let ord = a.values[column].sort_cmp(&b.values[column]);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        Ok(())
    }

    /// First row whose values at `positions` match `key`.
    pub fn find_row(&self, positions: &[usize], key: &[Value]) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| key_matches(&row.values, positions, key))
    }

    /// Every row whose values at `positions` match `key`, in row order.
    pub fn find_rows(&self, positions: &[usize], key: &[Value]) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| key_matches(&row.values, positions, key))
            .map(|(index, _)| index)
            .collect()
    }

    /// The values at `positions` of row `index`.
    pub fn project(&self, index: usize, positions: &[usize]) -> Option<Vec<Value>> {
        let row = self.row(index)?;
        positions.iter().map(|&pos| row.get(pos).cloned()).collect()
    }

    /// The edits needed to bring the database in line with this model:
    /// deletes first, then updates, then inserts.
    pub fn pending_edits(&self, key_columns: &[usize]) -> Vec<RowEdit> {
        let key_of = |values: &[Value]| -> Vec<Value> {
            key_columns.iter().map(|&pos| values[pos].clone()).collect()
        };

        let mut edits: Vec<_> = self
            .removed
            .iter()
            .map(|original| RowEdit::Delete {
                key: key_of(original),
            })
            .collect();

        for row in &self.rows {
            if let RowState::Modified { original } = &row.state {
                let changed: Vec<_> = (0..self.width)
                    .filter(|&i| original[i] != row.values[i])
                    .collect();
                if !changed.is_empty() {
                    edits.push(RowEdit::Update {
                        key: key_of(original),
                        values: row.values.clone(),
                        changed,
                    });
                }
            }
        }

        edits.extend(
            self.rows
                .iter()
                .filter(|row| row.state == RowState::Inserted)
                .map(|row| RowEdit::Insert {
                    values: row.values.clone(),
                }),
        );

        edits
    }

    /// Marks every row as matching the database.
    pub fn mark_clean(&mut self) {
        self.removed.clear();
        for row in &mut self.rows {
            row.state = RowState::Clean;
        }
    }

    /// Discards every uncommitted edit. Removed rows are restored at the end
    /// of the model, so row indices are invalid afterwards.
    pub fn rollback(&mut self) {
        self.editing = None;
        self.rows.retain(|row| row.state != RowState::Inserted);
        for row in &mut self.rows {
            if let RowState::Modified { original } = &row.state {
                row.values = original.clone();
            }
            row.state = RowState::Clean;
        }
        for values in self.removed.drain(..) {
            self.rows.push(ModelRow {
                values,
                state: RowState::Clean,
            });
        }
    }

    fn check_row(&self, index: usize) -> Result<()> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(Error::invalid_argument(
                "row index",
                format!("row {index} out of range, model has {} rows", self.rows.len()),
            ))
        }
    }

    fn check_cell(&self, row: usize, column: usize) -> Result<()> {
        self.check_row(row)?;
        if column < self.width {
            Ok(())
        } else {
            Err(Error::invalid_argument(
                "column index",
                format!("column {column} out of range, table has {} columns", self.width),
            ))
        }
    }
}
