//! An in-memory connection with a customers/orders schema.

use dbscript_core::{
    driver::{Param, Response, RowEdit},
    err,
    schema::{Column, ForeignKey, PrimaryKey, Table},
    stmt::Value,
    Catalog, Connection, Result,
};

use parking_lot::Mutex;
use std::{borrow::Cow, sync::Arc};

#[derive(Debug, Default)]
pub(crate) struct FakeConnection {
    pub(crate) tables: Vec<(Table, Vec<Vec<Value>>)>,
    pub(crate) applied: Mutex<Vec<(String, RowEdit)>>,
}

impl Connection for FakeConnection {
    fn url(&self) -> Cow<'_, str> {
        Cow::Borrowed("fake:shop")
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|(t, _)| t.qualified_name.clone()).collect())
    }

    fn table_metadata(&self, qualified_name: &str) -> Result<Table> {
        self.tables
            .iter()
            .find(|(t, _)| t.qualified_name == qualified_name)
            .map(|(t, _)| t.clone())
            .ok_or_else(|| err!("missing {qualified_name}"))
    }

    fn execute(&self, _sql: &str, _params: &[Param]) -> Result<Response> {
        Ok(Response::count(0))
    }

    fn load_rows(&self, table: &Table) -> Result<Vec<Vec<Value>>> {
        self.tables
            .iter()
            .find(|(t, _)| t.qualified_name == table.qualified_name)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| err!("missing {}", table.qualified_name))
    }

    fn apply_edits(&self, table: &Table, _key: &[usize], edits: &[RowEdit]) -> Result<()> {
        let mut applied = self.applied.lock();
        for edit in edits {
            applied.push((table.qualified_name.clone(), edit.clone()));
        }
        Ok(())
    }
}

fn row(values: [Value; 3]) -> Vec<Value> {
    values.into()
}

/// `main.CUSTOMERS(ID, NAME, CITY)` and `main.ORDERS(ID, CUSTOMER_ID, TOTAL)`
/// with one foreign key between them.
pub(crate) fn shop() -> (Arc<Catalog>, Arc<FakeConnection>) {
    let fk = ForeignKey::new("main.ORDERS", "main.CUSTOMERS")
        .named("FK_ORDERS_CUSTOMER")
        .field("CUSTOMER_ID", "ID");

    let customers = Table::qualified(None, Some("main".into()), "CUSTOMERS")
        .with_column(Column::new("ID", "INTEGER"))
        .with_column(Column::new("NAME", "TEXT"))
        .with_column(Column::new("CITY", "TEXT"))
        .with_primary_key(PrimaryKey::new(["ID"]))
        .with_referencing_key(fk.clone());

    let orders = Table::qualified(None, Some("main".into()), "ORDERS")
        .with_column(Column::new("ID", "INTEGER"))
        .with_column(Column::new("CUSTOMER_ID", "INTEGER"))
        .with_column(Column::new("TOTAL", "REAL"))
        .with_primary_key(PrimaryKey::new(["ID"]))
        .with_foreign_key(fk);

    let connection = Arc::new(FakeConnection {
        tables: vec![
            (
                customers,
                vec![
                    row([Value::I64(7), Value::from("Alice"), Value::from("Oslo")]),
                    row([Value::I64(9), Value::from("Bob"), Value::Null]),
                ],
            ),
            (
                orders,
                vec![
                    row([Value::I64(100), Value::I64(7), Value::F64(12.5)]),
                    row([Value::I64(101), Value::I64(9), Value::F64(3.0)]),
                    row([Value::I64(102), Value::I64(7), Value::F64(40.0)]),
                ],
            ),
        ],
        ..Default::default()
    });

    (Arc::new(Catalog::new(connection.clone())), connection)
}
