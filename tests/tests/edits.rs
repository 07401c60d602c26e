use dbscript::Evaluation;
use dbscript_core::{driver::RowEdit, stmt::Value};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tests::{sqlite, DriverOp, Harness, LoggingConnection, SHOP};

fn logged_shop() -> (Harness, Arc<Mutex<Vec<DriverOp>>>) {
    let connection = LoggingConnection::new(sqlite(SHOP));
    let log = connection.ops_log_handle();
    (Harness::new(Arc::new(connection)), log)
}

fn applied(log: &Mutex<Vec<DriverOp>>) -> Vec<(String, Vec<RowEdit>)> {
    log.lock()
        .iter()
        .filter_map(|op| match op {
            DriverOp::ApplyEdits { table, edits } => Some((table.clone(), edits.clone())),
            _ => None,
        })
        .collect()
}

fn query(h: &Harness, sql: &str) -> String {
    h.value(&format!(
        "var rs = db.createStatement().execute(\"{sql}\"); var out = []; while (rs.next()) out.push(rs[rs.columns[0]]); out"
    ))
}

#[test]
fn update_is_keyed_by_primary_key() {
    let (h, log) = logged_shop();
    assert_eq!(
        h.value("var c = db.CUSTOMERS; c.load(); c[1].CITY = 'Bergen'; c.commit()"),
        "1"
    );

    assert_eq!(
        applied(&log),
        [(
            "main.CUSTOMERS".to_string(),
            vec![RowEdit::Update {
                key: vec![Value::from(9)],
                values: vec![Value::from(9), Value::from("Bob"), Value::from("Bergen")],
                changed: vec![2],
            }]
        )]
    );
    assert_eq!(query(&h, "SELECT CITY FROM CUSTOMERS ORDER BY ID"), "[Oslo, Bergen]");

    // Nothing left to write.
    assert_eq!(h.value("db.CUSTOMERS.commit()"), "0");
}

#[test]
fn insert_and_delete() {
    let h = Harness::shop();
    h.value("db.createStatement().execute('DELETE FROM ORDERS WHERE CUSTOMER_ID = 7')");
    assert_eq!(
        h.value(
            "var c = db.CUSTOMERS; c.load();
             var i = c.addRow();
             c[i].ID = 11; c[i].NAME = 'Cleo';
             c.removeRow(0);
             c.commit()"
        ),
        "2"
    );
    assert_eq!(query(&h, "SELECT NAME FROM CUSTOMERS ORDER BY ID"), "[Bob, Cleo]");
}

#[test]
fn rows_without_primary_key_are_matched_on_every_column() {
    let (h, log) = logged_shop();
    assert_eq!(h.value("var a = db.AUDIT; a.load(); a.removeRow(1); a.commit()"), "1");

    assert_eq!(
        applied(&log),
        [(
            "main.AUDIT".to_string(),
            vec![RowEdit::Delete {
                key: vec![Value::from("17:00"), Value::from("closed")],
            }]
        )]
    );
    assert_eq!(query(&h, "SELECT MESSAGE FROM AUDIT"), "[opened]");
}

#[test]
fn rollback_restores_loaded_values() {
    let h = Harness::shop();
    assert_eq!(
        h.value("var c = db.CUSTOMERS; c.load(); c[0].NAME = 'Zed'; c.addRow(); c.rollback(); [c.length, c[0].NAME]"),
        "[2, Alice]"
    );
    assert_eq!(h.value("db.CUSTOMERS.commit()"), "0");
}

#[test]
fn failed_commit_writes_nothing() {
    let h = Harness::shop();
    h.value("var c = db.CUSTOMERS; c.load(); c[0].CITY = 'Paris'; c.length");
    h.value("db.createStatement().execute('DELETE FROM ORDERS WHERE CUSTOMER_ID = 9')");
    h.value("db.createStatement().execute('DELETE FROM CUSTOMERS WHERE ID = 9')");

    let Evaluation::Faulted(err) = h.eval("var c = db.CUSTOMERS; c[1].CITY = 'Lima'; c.commit()") else {
        panic!("expected a fault");
    };
    assert!(err.to_string().contains("affected 0 rows of `main.CUSTOMERS`"), "{err}");

    // The first update ran in the same transaction and was rolled back.
    assert_eq!(query(&h, "SELECT CITY FROM CUSTOMERS"), "[Oslo]");
}

#[test]
fn deleting_a_referenced_row_is_rolled_back() {
    let h = Harness::shop();
    let Evaluation::Faulted(err) = h.eval("var c = db.CUSTOMERS; c.load(); c[0].CITY = 'Rome'; c.removeRow(1); c.commit()") else {
        panic!("expected a fault");
    };
    assert!(err.is_driver_operation_failed(), "{err}");

    // Bob still has an order, so neither edit was written.
    assert_eq!(query(&h, "SELECT NAME FROM CUSTOMERS WHERE CITY = 'Rome'"), "[]");
    assert_eq!(query(&h, "SELECT COUNT(*) AS N FROM CUSTOMERS"), "[2]");
    assert_eq!(h.value("db.CUSTOMERS.length"), "1");
}

#[test]
fn writes_to_unknown_columns_fail() {
    let h = Harness::shop();
    assert!(h.eval("var c = db.CUSTOMERS; c.load(); c[0].rowIndex = 4").is_faulted());
    assert!(h.eval("var c = db.CUSTOMERS; c.load(); c[0][7] = 4").is_faulted());
}
