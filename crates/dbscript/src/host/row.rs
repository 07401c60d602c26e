use super::{contains, HostObject, TableObject};
use crate::script::Dynamic;
use dbscript_core::{Catalog, Error, Result, TableHandle};

use std::sync::Arc;

/// One row of a loaded table, addressed by position.
///
/// Holds no row data: reads and writes go through the table's row model,
/// so a view whose row has since been removed simply finds nothing.
#[derive(Debug)]
pub struct RowObject {
    table: Arc<TableHandle>,
    catalog: Arc<Catalog>,
    index: usize,
}

impl RowObject {
    const PROPERTIES: &'static [&'static str] = &["length", "rowIndex", "table"];

    pub fn new(table: Arc<TableHandle>, catalog: Arc<Catalog>, index: usize) -> Self {
        Self {
            table,
            catalog,
            index,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.table.table().column_index_ignore_case(name)
    }

    fn column_at(&self, index: i64) -> Option<usize> {
        let width = self.table.table().columns.len();
        usize::try_from(index).ok().filter(|&index| index < width)
    }

    fn read(&self, column: usize) -> Option<Dynamic> {
        self.table
            .with_rows(|rows| rows.value(self.index, column).cloned())
            .flatten()
            .map(Dynamic::from)
    }

    fn write(&self, column: usize, value: Dynamic) -> Result<()> {
        let value = value.to_value()?;
        self.table
            .with_rows_mut(|rows| rows.set_value(self.index, column, value))
            .unwrap_or_else(|| {
                Err(Error::invalid_argument(
                    "row assignment",
                    format!("table `{}` is not loaded", self.table.qualified_name()),
                ))
            })
    }
}

impl HostObject for RowObject {
    fn class_name(&self) -> &'static str {
        "Row"
    }

    fn properties(&self) -> &'static [&'static str] {
        Self::PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Option<Dynamic>> {
        Ok(match name {
            "length" => Some(Dynamic::from(self.table.table().columns.len())),
            "rowIndex" => Some(Dynamic::from(self.index)),
            "table" => Some(Dynamic::host(TableObject::new(
                self.table.clone(),
                self.catalog.clone(),
            ))),
            _ => self.column(name).and_then(|column| self.read(column)),
        })
    }

    fn get_index(&self, index: i64) -> Result<Option<Dynamic>> {
        Ok(self.column_at(index).and_then(|column| self.read(column)))
    }

    fn has(&self, name: &str) -> bool {
        contains(Self::PROPERTIES, name) || self.column(name).is_some()
    }

    fn has_index(&self, index: i64) -> bool {
        self.column_at(index).is_some()
    }

    fn put(&self, name: &str, value: Dynamic) -> Result<()> {
        match self.column(name) {
            Some(column) if !contains(Self::PROPERTIES, name) => self.write(column, value),
            _ => Err(Error::unsupported(format!("cannot assign property `{name}` of Row"))),
        }
    }

    fn put_index(&self, index: i64, value: Dynamic) -> Result<()> {
        match self.column_at(index) {
            Some(column) => self.write(column, value),
            None => Err(Error::invalid_argument(
                "row assignment",
                format!("column {index} out of range"),
            )),
        }
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.table.table().column_names().map(str::to_string).collect())
    }

    fn to_display_string(&self) -> String {
        let values = self
            .table
            .with_rows(|rows| {
                rows.row(self.index).map(|row| {
                    row.iter()
                        .map(|value| Dynamic::from(value.clone()).to_string())
                        .collect::<Vec<_>>()
                })
            })
            .flatten();

        match values {
            Some(values) => format!("Row({})", values.join(", ")),
            None => format!("Row({} of {})", self.index, self.table.qualified_name()),
        }
    }
}
