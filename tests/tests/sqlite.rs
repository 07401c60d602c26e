use dbscript_core::{
    driver::{Param, ParamTarget, RowEdit},
    schema::{Column, ForeignKey, Index, PrimaryKey, Table},
    stmt::{SqlType, Value},
    Connection,
};
use dbscript_driver_sqlite::Sqlite;
use pretty_assertions::assert_eq;
use tests::{sqlite, SHOP};

fn rows(connection: &dyn Connection, sql: &str, params: &[Param]) -> Vec<Vec<Value>> {
    let mut cursor = connection.execute(sql, params).unwrap().into_cursor();
    let mut rows = vec![];
    while cursor.next().unwrap() {
        let row = (0..cursor.columns().len())
            .map(|index| cursor.get(index).unwrap())
            .collect();
        rows.push(row);
    }
    rows
}

fn orders_fk() -> ForeignKey {
    ForeignKey::new("main.ORDERS", "main.CUSTOMERS").field("CUSTOMER_ID", "ID")
}

#[test]
fn connect_from_url() {
    let connection = Sqlite::new("sqlite::memory:").unwrap().connect().unwrap();
    assert_eq!(connection.url(), "sqlite::memory:");
    assert_eq!(connection.table_names().unwrap(), Vec::<String>::new());
}

#[test]
fn table_names_are_qualified_and_sorted() {
    let connection = sqlite(SHOP);
    assert_eq!(
        connection.table_names().unwrap(),
        ["main.AUDIT", "main.CUSTOMERS", "main.ORDERS"]
    );
}

#[test]
fn orders_metadata() {
    let connection = sqlite(SHOP);
    let expected = Table::qualified(None, Some("main".to_string()), "ORDERS")
        .with_column(Column::new("ID", "INTEGER"))
        .with_column(Column::new("CUSTOMER_ID", "INTEGER"))
        .with_column(Column::new("TOTAL", "REAL"))
        .with_primary_key(PrimaryKey::new(["ID"]))
        .with_foreign_key(orders_fk())
        .with_index(Index::new("ORDERS_BY_CUSTOMER", false, ["CUSTOMER_ID"]));

    assert_eq!(connection.table_metadata("main.ORDERS").unwrap(), expected);
    assert_eq!(
        orders_fk().display_name(),
        "main.ORDERS(CUSTOMER_ID) -> main.CUSTOMERS(ID)"
    );
}

#[test]
fn customers_metadata() {
    let connection = sqlite(SHOP);
    let customers = connection.table_metadata("CUSTOMERS").unwrap();

    assert_eq!(customers.qualified_name, "main.CUSTOMERS");
    assert_eq!(customers.kind, "TABLE");
    assert_eq!(customers.columns[1], Column::new("NAME", "VARCHAR(40)").size(40, None).not_null());
    assert_eq!(customers.columns[1].sql_type, SqlType::VarChar);
    assert!(customers.foreign_keys.is_empty());
    assert_eq!(customers.referencing_keys, [orders_fk()]);
}

#[test]
fn table_without_primary_key() {
    let connection = sqlite(SHOP);
    let audit = connection.table_metadata("main.AUDIT").unwrap();
    assert_eq!(audit.primary_key, None);
    assert_eq!(audit.column_names().collect::<Vec<_>>(), ["AT", "MESSAGE"]);
}

#[test]
fn composite_keys_follow_key_order() {
    let connection = sqlite(
        "CREATE TABLE A (X INTEGER, Y INTEGER, PRIMARY KEY (Y, X));
         CREATE TABLE B (P INTEGER, Q INTEGER, FOREIGN KEY (P, Q) REFERENCES A ON DELETE CASCADE);",
    );

    let a = connection.table_metadata("A").unwrap();
    assert_eq!(a.primary_key, Some(PrimaryKey::new(["Y", "X"])));
    assert_eq!(a.indexes, [Index::new("sqlite_autoindex_A_1", true, ["Y", "X"])]);

    // No target columns named: they are A's primary key, in key order.
    let b = connection.table_metadata("B").unwrap();
    assert_eq!(
        b.foreign_keys,
        [ForeignKey::new("main.B", "main.A")
            .field("P", "Y")
            .field("Q", "X")
            .rules(Default::default(), dbscript_core::schema::KeyRule::Cascade)]
    );
}

#[test]
fn unknown_table() {
    let connection = sqlite(SHOP);
    let err = connection.table_metadata("main.NOPE").unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn execute_binds_parameters() {
    let connection = sqlite(SHOP);

    assert_eq!(
        rows(
            &*connection,
            "SELECT ID FROM ORDERS WHERE CUSTOMER_ID = :customer ORDER BY ID",
            &[Param::new(ParamTarget::Name("customer".to_string()), 7)],
        ),
        [[Value::from(100)], [Value::from(102)]]
    );

    // Typed parameters are converted before binding.
    assert_eq!(
        rows(
            &*connection,
            "SELECT typeof(?1), ?1 + 1",
            &[Param::new(ParamTarget::Index(1), "41").typed(SqlType::Integer, None)],
        ),
        [[Value::from("integer"), Value::from(42)]]
    );

    let err = connection
        .execute("SELECT ?", &[Param::new(ParamTarget::Name("nope".to_string()), 1)])
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn execute_reports_counts_and_columns() {
    let connection = sqlite(SHOP);

    let response = connection
        .execute("UPDATE ORDERS SET TOTAL = TOTAL * 2 WHERE CUSTOMER_ID = ?", &[Param::new(ParamTarget::Index(1), 7)])
        .unwrap();
    assert_eq!(response.into_count(), 2);

    let cursor = connection
        .execute("SELECT NAME, ID + 1 AS N FROM CUSTOMERS", &[])
        .unwrap()
        .into_cursor();
    let columns: Vec<_> = cursor
        .columns()
        .iter()
        .map(|column| (column.name.as_str(), column.db_type.as_str(), column.value_type.as_str()))
        .collect();
    assert_eq!(columns, [("NAME", "VARCHAR(40)", "String"), ("N", "INTEGER", "I64")]);
}

#[test]
fn load_rows_in_column_order() {
    let connection = sqlite(SHOP);
    let customers = connection.table_metadata("main.CUSTOMERS").unwrap();
    assert_eq!(
        connection.load_rows(&customers).unwrap(),
        [
            vec![Value::from(7), Value::from("Alice"), Value::from("Oslo")],
            vec![Value::from(9), Value::from("Bob"), Value::Null],
        ]
    );
}

#[test]
fn apply_edits_in_one_transaction() {
    let connection = sqlite(SHOP);
    let orders = connection.table_metadata("main.ORDERS").unwrap();

    connection
        .apply_edits(
            &orders,
            &[0],
            &[
                RowEdit::Delete { key: vec![Value::from(101)] },
                RowEdit::Update {
                    key: vec![Value::from(100)],
                    values: vec![Value::from(100), Value::from(9), Value::from(12.5)],
                    changed: vec![1],
                },
                RowEdit::Insert {
                    values: vec![Value::from(103), Value::Null, Value::from(1.5)],
                },
            ],
        )
        .unwrap();
    assert_eq!(
        rows(&*connection, "SELECT ID, CUSTOMER_ID FROM ORDERS ORDER BY ID", &[]),
        [
            [Value::from(100), Value::from(9)],
            [Value::from(102), Value::from(7)],
            [Value::from(103), Value::Null],
        ]
    );

    // The delete matches nothing, so the insert before it is undone as well.
    let err = connection
        .apply_edits(
            &orders,
            &[0],
            &[
                RowEdit::Insert {
                    values: vec![Value::from(104), Value::Null, Value::Null],
                },
                RowEdit::Delete { key: vec![Value::from(999)] },
            ],
        )
        .unwrap_err();
    assert!(err.to_string().contains("affected 0 rows"), "{err}");
    assert_eq!(
        rows(&*connection, "SELECT COUNT(*) FROM ORDERS WHERE ID = 104", &[]),
        [[Value::from(0)]]
    );
}
