use super::TableHandle;
use crate::{driver::Connection, err, schema::Table, Error, Result};

use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Table descriptors loaded through one connection, keyed by qualified name.
///
/// Handles are created on first lookup and shared afterwards, so every
/// script object looking at a table sees the same row model and key cache.
#[derive(Debug)]
pub struct Catalog {
    connection: Arc<dyn Connection>,
    tables: RwLock<HashMap<String, Arc<TableHandle>>>,
}

/// Which side of a key relationship to follow from a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Related {
    /// The table owning the `i`-th referencing key
    Referencing,

    /// The table the `i`-th foreign key points at
    Referenced,
}

impl Catalog {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Qualified names of every table visible through the connection.
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.connection.table_names()
    }

    /// Adds a descriptor loaded elsewhere. An existing handle for the same
    /// qualified name has its details replaced instead.
    pub fn register(&self, table: Table) -> Arc<TableHandle> {
        let mut tables = self.tables.write();
        match tables.get(&table.qualified_name) {
            Some(handle) => {
                handle.update_details(table);
                handle.clone()
            }
            None => {
                let name = table.qualified_name.clone();
                let handle = Arc::new(TableHandle::new(table));
                tables.insert(name, handle.clone());
                handle
            }
        }
    }

    /// Looks a table up by qualified or bare name. Exact matches win over
    /// case-insensitive ones. Returns `None` when no such table exists.
    pub fn find_table(&self, name: &str) -> Result<Option<Arc<TableHandle>>> {
        if let Some(handle) = self.cached(name) {
            return Ok(Some(handle));
        }

        let names = self.connection.table_names()?;
        let Some(qualified) = resolve_name(&names, name) else {
            return Ok(None);
        };

        if let Some(handle) = self.tables.read().get(qualified) {
            return Ok(Some(handle.clone()));
        }

        debug!(table = %qualified, "reading table metadata");
        let table = self.connection.table_metadata(qualified)?;
        Ok(Some(self.register(table)))
    }

    /// Like [`find_table`](Self::find_table), failing when the table does not exist.
    pub fn table(&self, name: &str) -> Result<Arc<TableHandle>> {
        self.find_table(name)?
            .ok_or_else(|| err!("no such table: {name}"))
    }

    /// Re-reads a table's metadata and replaces its details, invalidating
    /// its key cache.
    pub fn refresh(&self, name: &str) -> Result<Arc<TableHandle>> {
        let handle = self.table(name)?;
        let table = self.connection.table_metadata(&handle.qualified_name())?;
        handle.update_details(table);
        Ok(handle)
    }

    /// The table on the other side of `table`'s `index`-th key.
    pub fn related_table(&self, table: &Table, index: usize, side: Related) -> Result<Arc<TableHandle>> {
        let (keys, what) = match side {
            Related::Referencing => (&table.referencing_keys, "referencing keys"),
            Related::Referenced => (&table.foreign_keys, "foreign keys"),
        };

        let Some(key) = keys.get(index) else {
            return Err(Error::invalid_argument(
                "key index",
                format!(
                    "table `{}` has {} {what}, index {index} is out of range",
                    table.qualified_name,
                    keys.len()
                ),
            ));
        };

        let name = match side {
            Related::Referencing => &key.source_table,
            Related::Referenced => &key.target_table,
        };
        self.table(name)
    }

    fn cached(&self, name: &str) -> Option<Arc<TableHandle>> {
        let tables = self.tables.read();
        if let Some(handle) = tables.get(name) {
            return Some(handle.clone());
        }
        tables
            .values()
            .find(|handle| handle.table().is_named(name))
            .cloned()
    }
}

fn resolve_name<'a>(names: &'a [String], name: &str) -> Option<&'a str> {
    fn bare(qualified: &str) -> &str {
        qualified.rsplit('.').next().unwrap_or(qualified)
    }

    names
        .iter()
        .find(|candidate| *candidate == name)
        .or_else(|| names.iter().find(|candidate| candidate.eq_ignore_ascii_case(name)))
        .or_else(|| names.iter().find(|candidate| bare(candidate).eq_ignore_ascii_case(bare(name))))
        .map(String::as_str)
}
