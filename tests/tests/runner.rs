use dbscript::{Config, ConsoleBuffer, RunStatus, RunnerState, ScriptEnv, ScriptRunner, Submission};
use dbscript_core::Catalog;
use pretty_assertions::assert_eq;
use std::{sync::Arc, time::Duration};
use tests::{sqlite, SHOP};

fn shop_runner() -> ScriptRunner {
    ScriptRunner::new(
        ScriptEnv::connect(sqlite(SHOP)),
        ConsoleBuffer::new(),
        Config::default().interrupt_check_interval(10),
    )
}

async fn wait_for_text(runner: &ScriptRunner, text: &str) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !runner.console().text().contains(text) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

async fn wait_idle(runner: &ScriptRunner) {
    tokio::time::timeout(Duration::from_secs(10), runner.wait_idle())
        .await
        .unwrap();
}

#[tokio::test]
async fn cancel_query_loop() {
    let runner = shop_runner();
    let accepted = runner.submit(
        "var orders = db.ORDERS; orders.load(); println(orders.length);
         var n = 0;
         while (true) { n += orders.fk2rows(0, 7).length }",
    );
    assert_eq!(accepted, Submission::Accepted);
    wait_for_text(&runner, "3\n").await;
    assert_eq!(runner.state(), RunnerState::Running);

    runner.cancel();
    wait_idle(&runner).await;

    assert_eq!(runner.console().text(), "3\nInterrupted.\n");
    assert_eq!(runner.last_status(), Some(RunStatus::Interrupted));

    // The catalog outlives the interrupted evaluation.
    assert_eq!(runner.submit("db.ORDERS.length"), Submission::Accepted);
    wait_idle(&runner).await;
    assert_eq!(runner.console().last_output().unwrap(), "3\n");
}

#[tokio::test]
async fn concurrent_submission_leaves_first_output_alone() {
    let runner = shop_runner();
    assert_eq!(
        runner.submit("println(db.CUSTOMERS.name); for (;;) {}"),
        Submission::Accepted
    );
    wait_for_text(&runner, "CUSTOMERS\n").await;

    assert_eq!(
        runner.submit("db.createStatement().execute('DELETE FROM ORDERS')"),
        Submission::Rejected
    );
    assert_eq!(runner.console().text(), "CUSTOMERS\n");

    runner.cancel();
    wait_idle(&runner).await;

    // The rejected script never ran.
    assert_eq!(runner.submit("var t = db.ORDERS; t.load()"), Submission::Accepted);
    wait_idle(&runner).await;
    assert_eq!(runner.console().last_output().unwrap(), "3\n");
}

#[tokio::test]
async fn database_errors_fault_the_run() {
    let runner = shop_runner();
    assert_eq!(
        runner.submit("db.createStatement().execute('SELECT * FROM NOWHERE')"),
        Submission::Accepted
    );
    wait_idle(&runner).await;

    let output = runner.console().text();
    assert!(output.starts_with("Error: "), "{output:?}");
    assert!(output.contains("NOWHERE"), "{output:?}");
    assert!(matches!(runner.last_status(), Some(RunStatus::Faulted(_))));
}

#[tokio::test]
async fn state_changes_are_published() {
    let runner = shop_runner();
    let mut states = runner.subscribe();
    assert_eq!(*states.borrow_and_update(), RunnerState::Idle);

    assert_eq!(runner.submit("while (true) {}"), Submission::Accepted);
    states.changed().await.unwrap();
    assert_ne!(*states.borrow_and_update(), RunnerState::Idle);

    runner.cancel();
    wait_idle(&runner).await;
    assert_eq!(runner.state(), RunnerState::Idle);
}

#[tokio::test]
async fn rows_loaded_in_the_background_are_seen_by_scripts() {
    let connection = sqlite(SHOP);
    let catalog = Arc::new(Catalog::new(connection.clone()));
    let orders = catalog.table("main.ORDERS").unwrap();

    let loaded = orders.load_in_background(connection).await.unwrap().unwrap();
    assert_eq!(loaded, 3);
    assert!(orders.is_loaded());

    let runner = ScriptRunner::new(ScriptEnv::new(catalog), ConsoleBuffer::new(), Config::default());
    assert_eq!(runner.submit("db.ORDERS.length"), Submission::Accepted);
    wait_idle(&runner).await;
    assert_eq!(runner.console().last_output().unwrap(), "3\n");
}

#[tokio::test]
async fn huge_array_index_faults_the_run() {
    let runner = shop_runner();
    assert_eq!(
        runner.submit("var a = []; a[100000000000] = 1; a.length"),
        Submission::Accepted
    );
    wait_idle(&runner).await;

    let output = runner.console().text();
    assert!(output.starts_with("Error: "), "{output:?}");
    assert!(matches!(runner.last_status(), Some(RunStatus::Faulted(_))));
    assert_eq!(runner.state(), RunnerState::Idle);

    assert_eq!(runner.submit("var b = []; b[3] = 1; b.length"), Submission::Accepted);
    wait_idle(&runner).await;
    assert_eq!(runner.console().last_output().unwrap(), "4\n");
}

#[tokio::test]
async fn deep_nesting_faults_the_run() {
    let runner = shop_runner();
    let parens = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
    let chain = format!("var a = 1; a{}", " + a".repeat(20_000));

    for source in [parens, chain] {
        assert_eq!(runner.submit(&source), Submission::Accepted);
        wait_idle(&runner).await;

        let output = runner.console().last_output().unwrap();
        assert!(output.starts_with("Error: nesting too deep"), "{output:?}");
        assert!(matches!(runner.last_status(), Some(RunStatus::Faulted(_))));
        assert_eq!(runner.state(), RunnerState::Idle);
    }

    assert_eq!(runner.submit("(((1 + 2)))"), Submission::Accepted);
    wait_idle(&runner).await;
    assert_eq!(runner.console().last_output().unwrap(), "3\n");
}
