use super::{Catalog, Related, RowModel};
use crate::{driver::Connection, key, schema::Table, Result};

use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc};
use tokio::task::JoinHandle;
use tracing::debug;

/// A loaded table: its current descriptor, the lazily attached row model,
/// and the key-correspondence cache.
///
/// The handle owns the row model outright. Script-side row views keep only
/// an `Arc<TableHandle>` and a row index.
#[derive(Debug)]
pub struct TableHandle {
    details: RwLock<Arc<Table>>,
    keys: Mutex<KeyCache>,
    rows: RwLock<Option<RowModel>>,
}

#[derive(Debug, Default)]
struct KeyCache {
    /// Bumped on every invalidation so a resolution that raced with
    /// `update_details` is not stored.
    generation: u64,
    pk: Option<Arc<[usize]>>,
    rk: HashMap<usize, Arc<[usize]>>,
    fk: HashMap<usize, Arc<[usize]>>,
}

impl KeyCache {
    fn invalidate(&mut self) {
        self.generation += 1;
        self.pk = None;
        self.rk.clear();
        self.fk.clear();
    }
}

impl TableHandle {
    pub fn new(table: Table) -> Self {
        Self {
            details: RwLock::new(Arc::new(table)),
            keys: Mutex::new(KeyCache::default()),
            rows: RwLock::new(None),
        }
    }

    /// The current descriptor.
    pub fn table(&self) -> Arc<Table> {
        self.details.read().clone()
    }

    pub fn qualified_name(&self) -> String {
        self.details.read().qualified_name.clone()
    }

    /// Replaces the descriptor after the schema was re-read.
    ///
    /// Invalidates the key cache. A loaded row model is discarded when the
    /// column count changed, since its tuples no longer line up.
    pub fn update_details(&self, table: Table) {
        let width = table.columns.len();
        *self.details.write() = Arc::new(table);
        self.keys.lock().invalidate();

        let mut rows = self.rows.write();
        if rows.as_ref().is_some_and(|model| model.width() != width) {
            debug!(table = %self.qualified_name(), "schema changed; dropping row model");
            *rows = None;
        }
    }

    /// Primary-key column positions (memoized).
    pub fn pk_columns(&self) -> Result<Arc<[usize]>> {
        let generation = {
            let keys = self.keys.lock();
            if let Some(pk) = &keys.pk {
                return Ok(pk.clone());
            }
            keys.generation
        };

        let resolved: Arc<[usize]> = key::resolve_primary_key_columns(&self.table())?.into();

        let mut keys = self.keys.lock();
        if keys.generation == generation {
            keys.pk = Some(resolved.clone());
        }
        Ok(resolved)
    }

    /// Positions in the `rk_index`-th referencing table's rows matching this
    /// table's primary key (memoized).
    pub fn rk_columns(&self, rk_index: usize, catalog: &Catalog) -> Result<Arc<[usize]>> {
        self.related_columns(rk_index, Related::Referencing, catalog)
    }

    /// Positions in this table's rows matching the `fk_index`-th referenced
    /// table's primary key (memoized).
    pub fn fk_columns(&self, fk_index: usize, catalog: &Catalog) -> Result<Arc<[usize]>> {
        self.related_columns(fk_index, Related::Referenced, catalog)
    }

    fn related_columns(&self, index: usize, side: Related, catalog: &Catalog) -> Result<Arc<[usize]>> {
        let generation = {
            let keys = self.keys.lock();
            let cached = match side {
                Related::Referencing => keys.rk.get(&index),
                Related::Referenced => keys.fk.get(&index),
            };
            if let Some(cached) = cached {
                return Ok(cached.clone());
            }
            keys.generation
        };

        // The key cache lock is not held here: the related table may be this
        // one (self-referencing keys) and its lookup may hit the connection.
        let table = self.table();
        let related = catalog.related_table(&table, index, side)?.table();
        let resolved: Arc<[usize]> = match side {
            Related::Referencing => key::resolve_referencing_key_columns(&table, index, &related)?,
            Related::Referenced => key::resolve_foreign_key_columns(&table, index, &related)?,
        }
        .into();

        let mut keys = self.keys.lock();
        if keys.generation == generation {
            match side {
                Related::Referencing => keys.rk.insert(index, resolved.clone()),
                Related::Referenced => keys.fk.insert(index, resolved.clone()),
            };
        }
        Ok(resolved)
    }

    pub fn is_loaded(&self) -> bool {
        self.rows.read().is_some()
    }

    /// Reads every row through `connection`, replacing any loaded model.
    /// Returns the number of rows loaded.
    pub fn load(&self, connection: &dyn Connection) -> Result<usize> {
        let table = self.table();
        debug!(table = %table.qualified_name, "loading rows");

        let rows = connection.load_rows(&table)?;
        let model = RowModel::new(table.columns.len(), rows);
        let len = model.len();
        *self.rows.write() = Some(model);

        debug!(table = %table.qualified_name, rows = len, "rows loaded");
        Ok(len)
    }

    /// Loads the rows on a blocking task, for callers that must not wait.
    pub fn load_in_background(
        self: &Arc<Self>,
        connection: Arc<dyn Connection>,
    ) -> JoinHandle<Result<usize>> {
        let handle = self.clone();
        tokio::task::spawn_blocking(move || handle.load(&*connection))
    }

    /// Discards the row model.
    pub fn unload(&self) {
        *self.rows.write() = None;
    }

    /// Runs `f` against the loaded row model, if there is one.
    pub fn with_rows<R>(&self, f: impl FnOnce(&RowModel) -> R) -> Option<R> {
        self.rows.read().as_ref().map(f)
    }

    /// Runs `f` against the loaded row model mutably, if there is one.
    pub fn with_rows_mut<R>(&self, f: impl FnOnce(&mut RowModel) -> R) -> Option<R> {
        self.rows.write().as_mut().map(f)
    }

    /// Number of loaded rows, or `None` when no row model is attached.
    pub fn row_count(&self) -> Option<usize> {
        self.with_rows(RowModel::len)
    }

    /// Writes the row model's pending edits through `connection`.
    ///
    /// The model stays locked for the duration so no edit made while the
    /// database call is in flight is marked clean without being written.
    /// Returns the number of edits applied.
    pub fn commit(&self, connection: &dyn Connection) -> Result<usize> {
        let table = self.table();
        let pk = self.pk_columns()?;

        let mut rows = self.rows.write();
        let Some(model) = rows.as_mut() else {
            return Ok(0);
        };

        model.stop_editing();
        let edits = model.pending_edits(&pk);
        if edits.is_empty() {
            return Ok(0);
        }

        debug!(table = %table.qualified_name, edits = edits.len(), "committing row edits");
        connection.apply_edits(&table, &pk, &edits)?;
        model.mark_clean();
        Ok(edits.len())
    }

    /// Discards uncommitted edits.
    pub fn rollback(&self) {
        if let Some(model) = self.rows.write().as_mut() {
            model.rollback();
        }
    }
}
