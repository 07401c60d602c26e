use dbscript::Evaluation;
use dbscript_core::{
    driver::{Param, ParamTarget},
    stmt::SqlType,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tests::{sqlite, DriverOp, Harness, LoggingConnection, SHOP};

#[test]
fn prepared_statement_binds_by_position() {
    let connection = LoggingConnection::new(sqlite(SHOP));
    let log = connection.ops_log_handle();
    let h = Harness::new(Arc::new(connection));

    assert_eq!(
        h.value(
            "var ps = db.prepareStatement('SELECT NAME FROM CUSTOMERS WHERE CITY = ?');
             ps.setObject(1, 'Oslo');
             var rs = ps.execute(); rs.next(); rs.NAME"
        ),
        "Alice"
    );

    assert_eq!(
        *log.lock(),
        [DriverOp::Execute {
            sql: "SELECT NAME FROM CUSTOMERS WHERE CITY = ?".to_string(),
            params: vec![Param::new(ParamTarget::Index(1), "Oslo")],
        }]
    );
}

#[test]
fn prepared_statement_binds_by_name() {
    let h = Harness::shop();
    assert_eq!(
        h.value(
            "var ps = db.prepareStatement('SELECT ID FROM ORDERS WHERE CUSTOMER_ID = :customer AND TOTAL > :min');
             ps.setObject('customer', 7);
             ps.setObject('min', 20);
             var rs = ps.execute(); rs.next(); rs.ID"
        ),
        "102"
    );
}

#[test]
fn rebinding_replaces_the_earlier_value() {
    let connection = LoggingConnection::new(sqlite(SHOP));
    let log = connection.ops_log_handle();
    let h = Harness::new(Arc::new(connection));

    assert_eq!(
        h.value(
            "var ps = db.prepareStatement('UPDATE CUSTOMERS SET CITY = ?1 WHERE ID = ?2');
             ps.setObject(2, 7);
             ps.setObject(1, 'Rome');
             ps.setObject(2, '9', 'INTEGER');
             ps.execute()"
        ),
        "1"
    );

    let DriverOp::Execute { params, .. } = log.lock()[0].clone() else {
        panic!("expected an execute");
    };
    assert_eq!(
        params,
        [
            Param::new(ParamTarget::Index(2), "9").typed(SqlType::Integer, None),
            Param::new(ParamTarget::Index(1), "Rome"),
        ]
    );

    assert_eq!(
        h.value("var rs = db.createStatement().execute('SELECT CITY FROM CUSTOMERS WHERE ID = 9'); rs.next(); rs.CITY"),
        "Rome"
    );
}

#[test]
fn typed_binding_rejects_unconvertible_values() {
    let h = Harness::shop();
    let Evaluation::Faulted(err) = h.eval(
        "var ps = db.prepareStatement('SELECT ID FROM ORDERS WHERE ID = ?');
         ps.setObject(1, 'abc', 'INTEGER');
         ps.execute()",
    ) else {
        panic!("expected a fault");
    };
    assert!(err.is_invalid_argument());
}

#[test]
fn clear_parameters() {
    let h = Harness::shop();
    assert_eq!(
        h.value(
            "var ps = db.prepareStatement('SELECT COUNT(*) AS N FROM ORDERS WHERE ID IS ?');
             ps.setObject(1, 100);
             ps.clearParameters();
             var rs = ps.execute(); rs.next(); rs.N"
        ),
        "0"
    );
}

#[test]
fn closed_statement() {
    let h = Harness::shop();
    assert_eq!(h.value("var s = db.createStatement(); s.close(); s.closed"), "true");

    let Evaluation::Faulted(err) = h.eval("var s = db.createStatement(); s.close(); s.execute('SELECT 1')") else {
        panic!("expected a fault");
    };
    assert_eq!(err.to_string(), "invalid argument: execute(sql): statement is closed");
}

#[test]
fn callable_statements_are_unsupported_by_sqlite() {
    let h = Harness::shop();
    assert_eq!(h.value("db.prepareCall('SELECT 1').sql"), "SELECT 1");

    let Evaluation::Faulted(err) = h.eval(
        "var cs = db.prepareCall('SELECT 1');
         cs.registerOutParameter(1, 'INTEGER');
         cs.execute()",
    ) else {
        panic!("expected a fault");
    };
    assert!(err.is_unsupported());
}

#[test]
fn errors_can_be_caught_by_scripts() {
    let h = Harness::shop();
    assert_eq!(
        h.value(
            "var caught = false;
             try { db.createStatement().execute('SELECT * FROM NOWHERE') } catch (e) { caught = true }
             caught"
        ),
        "true"
    );
}
