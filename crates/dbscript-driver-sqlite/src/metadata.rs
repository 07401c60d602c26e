//! Schema metadata read through SQLite's `PRAGMA` functions.

use dbscript_core::{
    schema::{Column, ForeignKey, ForeignKeyField, Index, KeyRule, PrimaryKey, Table},
    Error, Result,
};
use rusqlite::{Connection as RusqliteConnection, OptionalExtension};

/// The only schema this driver reports tables in.
pub(crate) const SCHEMA: &str = "main";

pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn qualify(name: &str) -> String {
    format!("{SCHEMA}.{name}")
}

/// Strips the schema prefix from a qualified name.
pub(crate) fn bare_name(qualified: &str) -> &str {
    qualified
        .strip_prefix(SCHEMA)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(qualified)
}

/// Names of user tables and views, unqualified and sorted.
pub(crate) fn table_names(connection: &RusqliteConnection) -> Result<Vec<String>> {
    let mut stmt = connection
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .map_err(Error::driver_operation_failed)?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(Error::driver_operation_failed)?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::driver_operation_failed)
}

pub(crate) fn table(connection: &RusqliteConnection, name: &str) -> Result<Table> {
    let kind: Option<String> = connection
        .query_row(
            "SELECT type FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'view')",
            [name],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::driver_operation_failed)?;

    let Some(kind) = kind else {
        return Err(Error::invalid_argument(
            "table_metadata(name)",
            format!("no table named `{name}`"),
        ));
    };

    let mut table = Table::qualified(None, Some(SCHEMA.to_string()), name);
    table.kind = kind.to_ascii_uppercase();

    let mut pk: Vec<(i64, String)> = vec![];
    for info in columns(connection, name)? {
        if info.pk > 0 {
            pk.push((info.pk, info.name.clone()));
        }

        let mut column = Column::new(info.name, &info.db_type);
        if let Some((size, scale)) = declared_size(&info.db_type) {
            column = column.size(size, scale);
        }
        if info.not_null {
            column = column.not_null();
        }
        table.columns.push(column);
    }

    if !pk.is_empty() {
        pk.sort_by_key(|(seq, _)| *seq);
        table.primary_key = Some(PrimaryKey::new(pk.into_iter().map(|(_, name)| name)));
    }

    table.foreign_keys = foreign_keys(connection, name)?;
    table.referencing_keys = referencing_keys(connection, name)?;
    table.indexes = indexes(connection, name)?;

    Ok(table)
}

struct ColumnInfo {
    name: String,
    db_type: String,
    not_null: bool,

    /// 1-based position within the primary key, 0 when not part of it
    pk: i64,
}

fn columns(connection: &RusqliteConnection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = connection
        .prepare(&format!("PRAGMA table_info({})", quote(table)))
        .map_err(Error::driver_operation_failed)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get("name")?,
                db_type: row.get::<_, Option<String>>("type")?.unwrap_or_default(),
                not_null: row.get("notnull")?,
                pk: row.get("pk")?,
            })
        })
        .map_err(Error::driver_operation_failed)?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::driver_operation_failed)
}

/// Parses the `(size[, scale])` suffix of a declared type.
fn declared_size(db_type: &str) -> Option<(u32, Option<u32>)> {
    let args = db_type.split_once('(')?.1.strip_suffix(')')?;
    let mut parts = args.split(',').map(|part| part.trim().parse::<u32>());
    let size = parts.next()?.ok()?;
    let scale = match parts.next() {
        Some(scale) => Some(scale.ok()?),
        None => None,
    };
    Some((size, scale))
}

/// Foreign keys declared on `table`, in constraint order.
fn foreign_keys(connection: &RusqliteConnection, table: &str) -> Result<Vec<ForeignKey>> {
    let mut stmt = connection
        .prepare(&format!("PRAGMA foreign_key_list({})", quote(table)))
        .map_err(Error::driver_operation_failed)?;

    struct Field {
        id: i64,
        seq: i64,
        target: String,
        from: String,
        to: Option<String>,
        on_update: String,
        on_delete: String,
    }

    let mut fields = stmt
        .query_map([], |row| {
            Ok(Field {
                id: row.get("id")?,
                seq: row.get("seq")?,
                target: row.get("table")?,
                from: row.get("from")?,
                to: row.get("to")?,
                on_update: row.get("on_update")?,
                on_delete: row.get("on_delete")?,
            })
        })
        .map_err(Error::driver_operation_failed)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::driver_operation_failed)?;
    fields.sort_by_key(|field| (field.id, field.seq));

    let mut keys: Vec<(i64, ForeignKey)> = vec![];
    for field in fields {
        if keys.last().map(|(id, _)| *id) != Some(field.id) {
            let key = ForeignKey::new(qualify(table), qualify(&field.target)).rules(
                KeyRule::parse(&field.on_update),
                KeyRule::parse(&field.on_delete),
            );
            keys.push((field.id, key));
        }

        // A missing target column means "the referenced table's primary key"
        let to = match field.to {
            Some(to) => to,
            None => implicit_target(connection, &field.target, field.seq)?,
        };

        if let Some((_, key)) = keys.last_mut() {
            key.fields.push(ForeignKeyField {
                source: field.from,
                target: to,
            });
        }
    }

    Ok(keys.into_iter().map(|(_, key)| key).collect())
}

fn implicit_target(connection: &RusqliteConnection, target: &str, seq: i64) -> Result<String> {
    let mut pk: Vec<_> = columns(connection, target)?
        .into_iter()
        .filter(|info| info.pk > 0)
        .collect();
    pk.sort_by_key(|info| info.pk);

    usize::try_from(seq)
        .ok()
        .and_then(|seq| pk.into_iter().nth(seq))
        .map(|info| info.name)
        .ok_or_else(|| {
            Error::inconsistent_schema(format!(
                "foreign key references `{target}` without naming columns, \
                 but `{target}` has no matching primary key column"
            ))
        })
}

/// Foreign keys of every table that point at `table`, ordered by the
/// referencing table's name.
fn referencing_keys(connection: &RusqliteConnection, table: &str) -> Result<Vec<ForeignKey>> {
    let target = qualify(table);
    let mut keys = vec![];

    for name in table_names(connection)? {
        for key in foreign_keys(connection, &name)? {
            if key.target_table.eq_ignore_ascii_case(&target) {
                keys.push(key);
            }
        }
    }

    Ok(keys)
}

fn indexes(connection: &RusqliteConnection, table: &str) -> Result<Vec<Index>> {
    let mut stmt = connection
        .prepare(&format!("PRAGMA index_list({})", quote(table)))
        .map_err(Error::driver_operation_failed)?;

    let list = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>("name")?, row.get::<_, bool>("unique")?))
        })
        .map_err(Error::driver_operation_failed)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::driver_operation_failed)?;

    let mut indexes = Vec::with_capacity(list.len());
    for (name, unique) in list {
        let mut stmt = connection
            .prepare(&format!("PRAGMA index_info({})", quote(&name)))
            .map_err(Error::driver_operation_failed)?;

        let mut columns = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>("seqno")?, row.get::<_, Option<String>>("name")?))
            })
            .map_err(Error::driver_operation_failed)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::driver_operation_failed)?;
        columns.sort_by_key(|(seqno, _)| *seqno);

        // Expression columns have no name
        let columns = columns.into_iter().filter_map(|(_, name)| name);
        indexes.push(Index::new(name, unique, columns));
    }

    indexes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(indexes)
}
