use super::{index_names, Args, HostObject, RowObject, ValueArray};
use crate::script::Dynamic;
use dbscript_core::{
    stmt::Value, Catalog, Error, Related, Result, RowModel, TableHandle,
};

use std::sync::Arc;
use tracing::debug;

/// A table: its rows by index plus key navigation between related tables.
///
/// Navigation works on the loaded row model only. Keys are passed and
/// returned in the order of the primary key they line up with, so the
/// result of `row2fk` can be handed straight to `pk2row` on the
/// referenced table.
#[derive(Debug)]
pub struct TableObject {
    handle: Arc<TableHandle>,
    catalog: Arc<Catalog>,
}

impl TableObject {
    const PROPERTIES: &'static [&'static str] = &[
        "columns",
        "foreignKeys",
        "length",
        "loaded",
        "name",
        "qualifiedName",
        "referencingKeys",
    ];

    const METHODS: &'static [&'static str] = &[
        "addRow",
        "commit",
        "fk2rows",
        "fkTable",
        "load",
        "pk2row",
        "removeRow",
        "rk2rows",
        "rkTable",
        "rollback",
        "row2fk",
        "row2pk",
        "row2rk",
        "sort",
        "unload",
    ];

    pub fn new(handle: Arc<TableHandle>, catalog: Arc<Catalog>) -> Self {
        Self { handle, catalog }
    }

    pub fn handle(&self) -> &Arc<TableHandle> {
        &self.handle
    }

    fn not_loaded(&self, signature: &'static str) -> Error {
        Error::invalid_argument(
            signature,
            format!("table `{}` is not loaded", self.handle.qualified_name()),
        )
    }

    fn with_loaded<R>(&self, signature: &'static str, f: impl FnOnce(&mut RowModel) -> Result<R>) -> Result<R> {
        self.handle
            .with_rows_mut(f)
            .unwrap_or_else(|| Err(self.not_loaded(signature)))
    }

    fn wrap(&self, handle: Arc<TableHandle>) -> Dynamic {
        Dynamic::host(TableObject::new(handle, self.catalog.clone()))
    }

    /// A key index argument; `None` when it names no key of this table.
    fn key_index(&self, args: &Args<'_>, position: usize, side: Related) -> Result<Option<usize>> {
        let index = args.int(position)?;
        let table = self.handle.table();
        let count = match side {
            Related::Referencing => table.referencing_keys.len(),
            Related::Referenced => table.foreign_keys.len(),
        };
        Ok(usize::try_from(index).ok().filter(|&index| index < count))
    }

    fn check_key_len(args: &Args<'_>, positions: &[usize], key: &[Value]) -> Result<()> {
        if positions.len() != key.len() {
            return Err(args.error(format!(
                "key has {} components, expected {}",
                key.len(),
                positions.len()
            )));
        }
        Ok(())
    }

    fn pk2row(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let args = Args::new("pk2row(key...)", args);
        let key = args.key(0)?;
        let pk = self.handle.pk_columns()?;
        Self::check_key_len(&args, &pk, &key)?;

        let found = self.handle.with_rows(|rows| rows.find_row(&pk, &key)).flatten();
        Ok(found.map_or(Dynamic::Undefined, Dynamic::from))
    }

    fn row2pk(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let args = Args::new("row2pk(row)", args);
        args.expect_len(1, 1)?;
        let row = args.index(0)?;
        let pk = self.handle.pk_columns()?;
        Ok(project(&self.handle, row, &pk))
    }

    fn fk2rows(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let args = Args::new("fk2rows(fk, key...)", args);
        let Some(fk) = self.key_index(&args, 0, Related::Referenced)? else {
            return Ok(Dynamic::host(ValueArray::default()));
        };
        let key = args.key(1)?;

        let positions = self.handle.fk_columns(fk, &self.catalog)?;
        Self::check_key_len(&args, &positions, &key)?;

        let rows = self
            .handle
            .with_rows(|rows| rows.find_rows(&positions, &key))
            .unwrap_or_default();
        Ok(Dynamic::host(ValueArray::from_indices(rows)))
    }

    fn row2fk(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let args = Args::new("row2fk(fk, row)", args);
        args.expect_len(2, 2)?;
        let row = args.index(1)?;
        let Some(fk) = self.key_index(&args, 0, Related::Referenced)? else {
            return Ok(Dynamic::Undefined);
        };

        let positions = self.handle.fk_columns(fk, &self.catalog)?;
        Ok(project(&self.handle, row, &positions))
    }

    /// Rows of the referencing table whose key matches one of this table's
    /// primary-key tuples.
    fn rk2rows(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let args = Args::new("rk2rows(rk, key...)", args);
        let Some(rk) = self.key_index(&args, 0, Related::Referencing)? else {
            return Ok(Dynamic::host(ValueArray::default()));
        };
        let key = args.key(1)?;

        let positions = self.handle.rk_columns(rk, &self.catalog)?;
        Self::check_key_len(&args, &positions, &key)?;

        let referencing = self.catalog.related_table(&self.handle.table(), rk, Related::Referencing)?;
        let rows = referencing
            .with_rows(|rows| rows.find_rows(&positions, &key))
            .unwrap_or_default();
        Ok(Dynamic::host(ValueArray::from_indices(rows)))
    }

    /// The referencing-key tuple of a row of the referencing table.
    fn row2rk(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let args = Args::new("row2rk(rk, row)", args);
        args.expect_len(2, 2)?;
        let row = args.index(1)?;
        let Some(rk) = self.key_index(&args, 0, Related::Referencing)? else {
            return Ok(Dynamic::Undefined);
        };

        let positions = self.handle.rk_columns(rk, &self.catalog)?;
        let referencing = self.catalog.related_table(&self.handle.table(), rk, Related::Referencing)?;
        Ok(project(&referencing, row, &positions))
    }

    fn related(&self, args: &[Dynamic], signature: &'static str, side: Related) -> Result<Dynamic> {
        let args = Args::new(signature, args);
        args.expect_len(1, 1)?;
        let Some(index) = self.key_index(&args, 0, side)? else {
            return Ok(Dynamic::Undefined);
        };
        let related = self.catalog.related_table(&self.handle.table(), index, side)?;
        Ok(self.wrap(related))
    }

    fn sort(&self, args: &[Dynamic]) -> Result<Dynamic> {
        let args = Args::new("sort(column, ascending)", args);
        args.expect_len(1, 2)?;

        let column = match args.get(0)? {
            Dynamic::Str(name) => self
                .handle
                .table()
                .column_index_ignore_case(name)
                .ok_or_else(|| args.error(format!("no column named `{name}`")))?,
            _ => args.index(0)?,
        };
        let ascending = args.optional_bool(1, true);

        self.with_loaded("sort(column, ascending)", |rows| {
            rows.sort_by_column(column, ascending)
        })?;
        Ok(Dynamic::Undefined)
    }
}

fn project(handle: &TableHandle, row: usize, positions: &[usize]) -> Dynamic {
    handle
        .with_rows(|rows| rows.project(row, positions))
        .flatten()
        .map_or(Dynamic::Undefined, |key| Dynamic::host(ValueArray::from_values(key)))
}

fn key_names(keys: &[dbscript_core::schema::ForeignKey]) -> Dynamic {
    Dynamic::host(ValueArray::from_strings(keys.iter().map(|key| key.display_name())))
}

impl HostObject for TableObject {
    fn class_name(&self) -> &'static str {
        "Table"
    }

    fn properties(&self) -> &'static [&'static str] {
        Self::PROPERTIES
    }

    fn methods(&self) -> &'static [&'static str] {
        Self::METHODS
    }

    fn get(&self, name: &str) -> Result<Option<Dynamic>> {
        let table = self.handle.table();
        Ok(match name {
            "columns" => Some(Dynamic::host(ValueArray::from_strings(table.column_names()))),
            "foreignKeys" => Some(key_names(&table.foreign_keys)),
            "length" => Some(Dynamic::from(self.handle.row_count().unwrap_or(0))),
            "loaded" => Some(Dynamic::Bool(self.handle.is_loaded())),
            "name" => Some(Dynamic::from(table.name.as_str())),
            "qualifiedName" => Some(Dynamic::from(table.qualified_name.as_str())),
            "referencingKeys" => Some(key_names(&table.referencing_keys)),
            _ => None,
        })
    }

    /// A row view, only while the row model is loaded.
    fn get_index(&self, index: i64) -> Result<Option<Dynamic>> {
        if !self.has_index(index) {
            return Ok(None);
        }
        Ok(Some(Dynamic::host(RowObject::new(
            self.handle.clone(),
            self.catalog.clone(),
            index as usize,
        ))))
    }

    fn has_index(&self, index: i64) -> bool {
        let len = self.handle.row_count().unwrap_or(0);
        usize::try_from(index).is_ok_and(|index| index < len)
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(index_names(self.handle.row_count().unwrap_or(0)))
    }

    fn invoke(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic> {
        match method {
            "pk2row" => self.pk2row(args),
            "row2pk" => self.row2pk(args),
            "fk2rows" => self.fk2rows(args),
            "row2fk" => self.row2fk(args),
            "rk2rows" => self.rk2rows(args),
            "row2rk" => self.row2rk(args),
            "fkTable" => self.related(args, "fkTable(fk)", Related::Referenced),
            "rkTable" => self.related(args, "rkTable(rk)", Related::Referencing),
            "sort" => self.sort(args),
            "load" => {
                Args::new("load()", args).expect_len(0, 0)?;
                let rows = self.handle.load(&**self.catalog.connection())?;
                Ok(Dynamic::from(rows))
            }
            "unload" => {
                Args::new("unload()", args).expect_len(0, 0)?;
                self.handle.unload();
                Ok(Dynamic::Undefined)
            }
            "addRow" => {
                Args::new("addRow()", args).expect_len(0, 0)?;
                let row = self.with_loaded("addRow()", |rows| Ok(rows.add_row()))?;
                Ok(Dynamic::from(row))
            }
            "removeRow" => {
                let args = Args::new("removeRow(row)", args);
                args.expect_len(1, 1)?;
                let row = args.index(0)?;
                self.with_loaded("removeRow(row)", |rows| rows.remove_row(row))?;
                Ok(Dynamic::Undefined)
            }
            "commit" => {
                Args::new("commit()", args).expect_len(0, 0)?;
                let edits = self.handle.commit(&**self.catalog.connection())?;
                debug!(table = %self.handle.qualified_name(), edits, "table committed");
                Ok(Dynamic::from(edits))
            }
            "rollback" => {
                Args::new("rollback()", args).expect_len(0, 0)?;
                self.handle.rollback();
                Ok(Dynamic::Undefined)
            }
            _ => Err(Error::unsupported(format!("Table has no method `{method}`"))),
        }
    }

    fn to_display_string(&self) -> String {
        format!("Table({})", self.handle.qualified_name())
    }
}
