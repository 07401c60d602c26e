use pretty_assertions::assert_eq;
use tests::Harness;

#[test]
fn tables_are_listed_qualified() {
    let h = Harness::shop();
    assert_eq!(h.value("db.tables"), "[main.AUDIT, main.CUSTOMERS, main.ORDERS]");
    assert_eq!(h.value("db.table('orders').qualifiedName"), "main.ORDERS");
    assert_eq!(h.value("db.ORDERS.name"), "ORDERS");
    assert_eq!(h.value("db.table('nope')"), "null");
}

#[test]
fn foreign_key_navigation() {
    let h = Harness::shop();
    let out = h.output(
        "var orders = db.ORDERS;
         orders.load();
         println(orders.row2fk(0, 0));
         println(orders.fk2rows(0, 7));
         println(orders.fk2rows(0, [9]));
         println(orders.fk2rows(0, 8));",
    );
    assert_eq!(out, "[7]\n[0, 2]\n[1]\n[]\n");
}

#[test]
fn foreign_key_from_every_row_finds_that_row() {
    let h = Harness::shop();
    assert_eq!(
        h.value(
            "var orders = db.ORDERS; orders.load();
             var ok = true;
             for (var r = 0; r < orders.length; r++) {
                 var rows = orders.fk2rows(0, orders.row2fk(0, r));
                 var found = false;
                 for (var i = 0; i < rows.length; i++) if (rows[i] == r) found = true;
                 ok = ok && found;
             }
             ok"
        ),
        "true"
    );
}

#[test]
fn primary_key_round_trip() {
    let h = Harness::shop();
    assert_eq!(
        h.value(
            "var t = db.CUSTOMERS; t.load();
             var back = [];
             for (var r = 0; r < t.length; r++) back.push(t.pk2row(t.row2pk(r)));
             back"
        ),
        "[0, 1]"
    );
    assert_eq!(h.value("var t = db.CUSTOMERS; t.load(); t.pk2row(9)"), "1");
    assert_eq!(h.value("typeof db.CUSTOMERS.pk2row(8)"), "undefined");
}

#[test]
fn out_of_range_keys_are_empty() {
    let h = Harness::shop();
    assert_eq!(h.value("var t = db.ORDERS; t.load(); t.fk2rows(3, 7)"), "[]");
    assert_eq!(h.value("db.ORDERS.fk2rows(-1, 7).length"), "0");
    assert_eq!(h.value("db.ORDERS.fk2rows(5).length"), "0");
    assert_eq!(h.value("db.CUSTOMERS.rk2rows(2).length"), "0");
    assert_eq!(h.value("typeof db.ORDERS.row2fk(5, 0)"), "undefined");
    assert_eq!(h.value("typeof db.ORDERS.fkTable(1)"), "undefined");
}

#[test]
fn referencing_key_navigation() {
    let h = Harness::shop();
    let out = h.output(
        "var customers = db.CUSTOMERS;
         customers.load();
         println(customers.referencingKeys.length);
         var orders = customers.rkTable(0);
         println(orders);
         orders.load();
         println(customers.rk2rows(0, 7));
         println(customers.row2rk(0, 1));
         println(orders.fkTable(0));",
    );
    assert_eq!(
        out,
        "1\nTable(main.ORDERS)\n[0, 2]\n[9]\nTable(main.CUSTOMERS)\n"
    );
}

#[test]
fn table_without_primary_key_uses_every_column() {
    let h = Harness::shop();
    let out = h.output(
        "var audit = db.AUDIT;
         audit.load();
         println(audit.row2pk(1));
         println(audit.pk2row('17:00', 'closed'));
         println(audit.pk2row(['09:00', 'opened']));",
    );
    assert_eq!(out, "[17:00, closed]\n1\n0\n");
}

#[test]
fn key_arrays() {
    let h = Harness::shop();
    let out = h.output(
        "var t = db.AUDIT; t.load();
         var k = t.row2pk(0);
         println(k.length, 0 in k, 1 in k, 2 in k);
         println(typeof k[2], k[1]);",
    );
    assert_eq!(out, "2 true true false\nundefined opened\n");
}

#[test]
fn rows_by_index_and_column() {
    let h = Harness::shop();
    let out = h.output(
        "var t = db.ORDERS; t.load();
         var row = t[1];
         println(row);
         println(row.CUSTOMER_ID, row[2], row.rowIndex, row.length);
         println(typeof t[3]);",
    );
    assert_eq!(out, "Row(101, 9, 3)\n9 3 1 3\nundefined\n");
}

#[test]
fn sort_reorders_rows() {
    let h = Harness::shop();
    assert_eq!(
        h.value("var t = db.ORDERS; t.load(); t.sort('total', false); [t[0].ID, t[1].ID, t[2].ID]"),
        "[102, 100, 101]"
    );
}
