use pretty_assertions::assert_eq;
use tests::{sqlite, Harness};

fn people() -> Harness {
    Harness::new(sqlite(
        "CREATE TABLE PEOPLE (ID INTEGER, NAME VARCHAR(20));
         INSERT INTO PEOPLE VALUES (1, 'Alice');",
    ))
}

#[test]
fn walk_single_row() {
    let h = people();
    let out = h.output(
        "var rs = db.createStatement().execute('SELECT ID, NAME FROM PEOPLE');
         println(rs.columns.length);
         println(rs.next());
         println(rs.ID, rs.NAME);
         println(typeof rs.BOGUS);
         println(rs.next());",
    );
    assert_eq!(out, "2\ntrue\n1 Alice\nundefined\nfalse\n");
}

#[test]
fn column_descriptions() {
    let h = people();
    assert_eq!(
        h.value("db.createStatement().execute('SELECT ID, NAME FROM PEOPLE').dbtypes"),
        "[INTEGER, VARCHAR(20)]"
    );
    assert_eq!(
        h.value("db.createStatement().execute('SELECT ID, NAME FROM PEOPLE').valuetypes"),
        "[I64, String]"
    );
    assert_eq!(
        h.value("db.createStatement().execute('SELECT ID, NAME FROM PEOPLE').columns"),
        "[ID, NAME]"
    );
}

#[test]
fn column_names_ignore_case() {
    let h = people();
    assert_eq!(
        h.value("var rs = db.createStatement().execute('SELECT ID, NAME FROM PEOPLE'); rs.next(); rs.name"),
        "Alice"
    );
}

#[test]
fn enumerate_columns() {
    let h = people();
    let out = h.output(
        "var rs = db.createStatement().execute('SELECT ID, NAME FROM PEOPLE');
         rs.next();
         for (var c in rs) println(c, rs[c]);",
    );
    assert_eq!(out, "ID 1\nNAME Alice\n");
}

#[test]
fn closed_result_set() {
    let h = people();
    assert_eq!(
        h.value("var rs = db.createStatement().execute('SELECT ID FROM PEOPLE'); rs.close(); rs.closed"),
        "true"
    );
    assert!(h
        .eval("var rs = db.createStatement().execute('SELECT ID FROM PEOPLE'); rs.close(); rs.next()")
        .is_faulted());
}

#[test]
fn update_count() {
    let h = people();
    assert_eq!(
        h.value("db.createStatement().execute(\"INSERT INTO PEOPLE VALUES (2, 'Bob'), (3, 'Eve')\")"),
        "2"
    );
    assert_eq!(
        h.value("var rs = db.createStatement().execute('SELECT COUNT(*) AS N FROM PEOPLE'); rs.next(); rs.N"),
        "3"
    );
}
