//! Key-correspondence resolution.
//!
//! Given a table's column list and its key metadata, these functions compute
//! index arrays that let a caller take a primary-key tuple and index straight
//! into a related table's row (or the reverse) without re-sorting anything.
//!
//! Key components are matched by column *name*: the order in which metadata
//! lists key components is not guaranteed to follow column declaration order.
//! Every output is ordered by the primary key it lines up with.

use crate::{
    schema::{ForeignKey, Table},
    Error, Result,
};

/// Positions, within `table.columns`, of the primary key's components in key
/// order.
///
/// A table without a primary key is treated as if every column were part of
/// the key, so this returns `0..n`.
pub fn resolve_primary_key_columns(table: &Table) -> Result<Vec<usize>> {
    let Some(primary_key) = &table.primary_key else {
        return Ok((0..table.columns.len()).collect());
    };

    primary_key
        .columns
        .iter()
        .map(|name| {
            table.column_index(name).ok_or_else(|| {
                Error::inconsistent_schema(format!(
                    "primary key column `{name}` not found in table `{}`",
                    table.qualified_name
                ))
            })
        })
        .collect()
}

/// For the `rk_index`-th referencing key of `table`, the positions within
/// `referencing`'s rows that correspond, in order, to `table`'s primary-key
/// columns.
pub fn resolve_referencing_key_columns(
    table: &Table,
    rk_index: usize,
    referencing: &Table,
) -> Result<Vec<usize>> {
    let Some(key) = table.referencing_keys.get(rk_index) else {
        return Err(Error::invalid_argument(
            "resolve_referencing_key_columns",
            format!(
                "table `{}` has {} referencing keys, index {rk_index} is out of range",
                table.qualified_name,
                table.referencing_keys.len()
            ),
        ));
    };

    check_table(key, &key.source_table, referencing)?;
    correspond(key, table, referencing)
}

/// For the `fk_index`-th foreign key of `table`, the positions within
/// `table`'s rows that correspond, in order, to `referenced`'s primary-key
/// columns.
pub fn resolve_foreign_key_columns(
    table: &Table,
    fk_index: usize,
    referenced: &Table,
) -> Result<Vec<usize>> {
    let Some(key) = table.foreign_keys.get(fk_index) else {
        return Err(Error::invalid_argument(
            "resolve_foreign_key_columns",
            format!(
                "table `{}` has {} foreign keys, index {fk_index} is out of range",
                table.qualified_name,
                table.foreign_keys.len()
            ),
        ));
    };

    check_table(key, &key.target_table, referenced)?;
    correspond(key, referenced, table)
}

/// Walks `target`'s primary key in key order and, for each component, finds
/// the key field pointing at it and the position of that field's source
/// column in `source`.
fn correspond(key: &ForeignKey, target: &Table, source: &Table) -> Result<Vec<usize>> {
    let target_pk = resolve_primary_key_columns(target)?;

    if target_pk.len() != key.fields.len() {
        return Err(Error::inconsistent_schema(format!(
            "key `{}` has {} columns but the primary key of `{}` has {}",
            key.display_name(),
            key.fields.len(),
            target.qualified_name,
            target_pk.len()
        )));
    }

    target_pk
        .iter()
        .map(|&pk_pos| {
            let pk_name = &target.columns[pk_pos].name;

            let field = key
                .fields
                .iter()
                .find(|field| field.target == *pk_name)
                .ok_or_else(|| {
                    Error::inconsistent_schema(format!(
                        "key `{}` does not cover primary key column `{pk_name}` of `{}`",
                        key.display_name(),
                        target.qualified_name
                    ))
                })?;

            source.column_index(&field.source).ok_or_else(|| {
                Error::inconsistent_schema(format!(
                    "key column `{}` not found in table `{}`",
                    field.source, source.qualified_name
                ))
            })
        })
        .collect()
}

fn check_table(key: &ForeignKey, expected: &str, actual: &Table) -> Result<()> {
    if actual.qualified_name == expected || actual.name == expected {
        Ok(())
    } else {
        Err(Error::inconsistent_schema(format!(
            "key `{}` belongs to table `{expected}`, not `{}`",
            key.display_name(),
            actual.qualified_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, PrimaryKey};
    use pretty_assertions::assert_eq;

    fn customers() -> Table {
        Table::new("CUSTOMERS")
            .with_column(Column::new("NAME", "TEXT"))
            .with_column(Column::new("ID", "INTEGER"))
            .with_primary_key(PrimaryKey::new(["ID"]))
            .with_referencing_key(ForeignKey::new("ORDERS", "CUSTOMERS").field("CUSTOMER_ID", "ID"))
    }

    fn orders() -> Table {
        Table::new("ORDERS")
            .with_column(Column::new("ID", "INTEGER"))
            .with_column(Column::new("AMOUNT", "REAL"))
            .with_column(Column::new("CUSTOMER_ID", "INTEGER"))
            .with_primary_key(PrimaryKey::new(["ID"]))
            .with_foreign_key(ForeignKey::new("ORDERS", "CUSTOMERS").field("CUSTOMER_ID", "ID"))
    }

    /// Composite key whose metadata lists components out of declaration order.
    fn regions() -> Table {
        Table::new("REGIONS")
            .with_column(Column::new("COUNTRY", "TEXT"))
            .with_column(Column::new("LABEL", "TEXT"))
            .with_column(Column::new("CODE", "TEXT"))
            .with_primary_key(PrimaryKey::new(["CODE", "COUNTRY"]))
    }

    fn offices() -> Table {
        Table::new("OFFICES")
            .with_column(Column::new("ID", "INTEGER"))
            .with_column(Column::new("R_COUNTRY", "TEXT"))
            .with_column(Column::new("R_CODE", "TEXT"))
            .with_foreign_key(
                ForeignKey::new("OFFICES", "REGIONS")
                    .field("R_COUNTRY", "COUNTRY")
                    .field("R_CODE", "CODE"),
            )
    }

    #[test]
    fn primary_key_positions_follow_key_order() {
        assert_eq!(resolve_primary_key_columns(&customers()).unwrap(), [1]);
        assert_eq!(resolve_primary_key_columns(&regions()).unwrap(), [2, 0]);
    }

    #[test]
    fn primary_key_names_match_in_order() {
        let table = regions();
        let positions = resolve_primary_key_columns(&table).unwrap();
        let names: Vec<_> = positions.iter().map(|&i| table.columns[i].name.as_str()).collect();
        assert_eq!(names, table.primary_key.as_ref().unwrap().columns);
    }

    #[test]
    fn no_primary_key_uses_every_column() {
        assert_eq!(resolve_primary_key_columns(&offices()).unwrap(), [0, 1, 2]);
    }

    #[test]
    fn missing_primary_key_column_is_inconsistent() {
        let table = Table::new("T")
            .with_column(Column::new("A", "INTEGER"))
            .with_primary_key(PrimaryKey::new(["a"]));
        let err = resolve_primary_key_columns(&table).unwrap_err();
        assert!(err.is_inconsistent_schema(), "{err}");
    }

    #[test]
    fn foreign_key_columns() {
        assert_eq!(resolve_foreign_key_columns(&orders(), 0, &customers()).unwrap(), [2]);
    }

    #[test]
    fn foreign_key_reordered_to_referenced_primary_key() {
        // REGIONS' key order is (CODE, COUNTRY); OFFICES declares (COUNTRY, CODE).
        assert_eq!(resolve_foreign_key_columns(&offices(), 0, &regions()).unwrap(), [2, 1]);
    }

    #[test]
    fn referencing_key_columns() {
        assert_eq!(resolve_referencing_key_columns(&customers(), 0, &orders()).unwrap(), [2]);
    }

    #[test]
    fn key_index_out_of_range() {
        let err = resolve_foreign_key_columns(&orders(), 3, &customers()).unwrap_err();
        assert!(err.is_invalid_argument(), "{err}");
    }

    #[test]
    fn wrong_related_table_is_inconsistent() {
        let err = resolve_foreign_key_columns(&orders(), 0, &regions()).unwrap_err();
        assert!(err.is_inconsistent_schema(), "{err}");
    }

    #[test]
    fn unmatched_key_column_is_inconsistent() {
        let orders = Table::new("ORDERS")
            .with_column(Column::new("ID", "INTEGER"))
            .with_foreign_key(ForeignKey::new("ORDERS", "CUSTOMERS").field("CUST", "ID"));
        let err = resolve_foreign_key_columns(&orders, 0, &customers()).unwrap_err();
        assert!(err.is_inconsistent_schema(), "{err}");
    }
}
