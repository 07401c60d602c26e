use crate::{CancelToken, Config, ConsoleBuffer, Evaluation, ScriptEnv, ScriptSession};
use dbscript_core::err;

use parking_lot::Mutex;
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Stack size of the evaluation thread. Script calls recurse on the Rust
/// stack, bounded by `Config::max_call_depth`.
const EVALUATION_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Where a runner is in its lifecycle.
///
/// `Idle -> Running -> (Completed | Interrupted | Faulted) -> Idle`. The
/// terminal states are published only once the evaluation's output is
/// complete, and are always followed by `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Completed,
    Interrupted,
    Faulted,
}

/// How the most recent evaluation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Interrupted,
    Faulted(String),
}

impl RunStatus {
    fn state(&self) -> RunnerState {
        match self {
            RunStatus::Completed => RunnerState::Completed,
            RunStatus::Interrupted => RunnerState::Interrupted,
            RunStatus::Faulted(_) => RunnerState::Faulted,
        }
    }
}

/// Answer to [`ScriptRunner::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Submission {
    Accepted,

    /// Another evaluation is still running; nothing was started.
    Rejected,
}

/// Runs one script at a time in the background, writing to a console.
///
/// Each submission gets a fresh interpreter on a dedicated thread. Cancel
/// requests are cooperative: they take effect at the interpreter's next
/// interruption check, never in the middle of a database call.
#[derive(Clone)]
pub struct ScriptRunner {
    inner: Arc<Inner>,
}

struct Inner {
    env: ScriptEnv,
    console: ConsoleBuffer,
    config: Config,

    /// Cancel token of the running evaluation. Cleared together with the
    /// `Idle` publish, under this lock.
    active: Mutex<Option<CancelToken>>,

    state: watch::Sender<RunnerState>,
    last_status: Mutex<Option<RunStatus>>,
}

impl ScriptRunner {
    pub fn new(env: ScriptEnv, console: ConsoleBuffer, config: Config) -> Self {
        let (state, _) = watch::channel(RunnerState::Idle);
        Self {
            inner: Arc::new(Inner {
                env,
                console,
                config,
                active: Mutex::new(None),
                state,
                last_status: Mutex::new(None),
            }),
        }
    }

    pub fn console(&self) -> &ConsoleBuffer {
        &self.inner.console
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Starts evaluating `source` unless an evaluation is already running.
    pub fn submit(&self, source: impl Into<String>) -> Submission {
        let source = source.into();
        let token = CancelToken::new();

        {
            let mut active = self.inner.active.lock();
            if active.is_some() {
                warn!("evaluation already running; submission rejected");
                return Submission::Rejected;
            }
            *active = Some(token.clone());
            self.inner.state.send_replace(RunnerState::Running);
        }
        debug!(len = source.len(), "evaluation started");

        let inner = self.inner.clone();
        let spawned = thread::Builder::new()
            .name("dbscript-eval".to_string())
            .stack_size(EVALUATION_STACK_SIZE)
            .spawn(move || inner.run(&source, &token));

        if let Err(err) = spawned {
            // The closure never ran, so finish the evaluation from here.
            warn!(error = %err, "failed to start evaluation thread");
            let start = self.inner.console.begin_output();
            self.inner.finish(start, RunStatus::Faulted(format!("failed to start evaluation: {err}")));
            self.inner.idle();
        }
        Submission::Accepted
    }

    /// Requests interruption of the running evaluation. Does nothing when
    /// the runner is idle.
    pub fn cancel(&self) {
        if let Some(token) = self.inner.active.lock().as_ref() {
            debug!("cancel requested");
            token.cancel();
        }
    }

    pub fn state(&self) -> RunnerState {
        *self.inner.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.inner.active.lock().is_some()
    }

    pub fn last_status(&self) -> Option<RunStatus> {
        self.inner.last_status.lock().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunnerState> {
        self.inner.state.subscribe()
    }

    /// Resolves once no evaluation is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| *state == RunnerState::Idle).await;
    }
}

impl Inner {
    fn run(&self, source: &str, token: &CancelToken) {
        let _idle = IdleOnDrop(self);
        let start = self.console.begin_output();

        let session = ScriptSession::new(
            self.env.clone(),
            Arc::new(self.console.clone()),
            self.config.clone(),
        );

        let evaluation = panic::catch_unwind(AssertUnwindSafe(|| session.evaluate(source, token)))
            .unwrap_or_else(|payload| {
                Evaluation::Faulted(err!("evaluation panicked: {}", panic_message(&*payload)))
            });

        let status = match evaluation {
            Evaluation::Completed(value) => {
                if let Some(value) = value.filter(|_| self.config.echo_result) {
                    self.console.append_line(&value);
                }
                RunStatus::Completed
            }
            Evaluation::Interrupted => RunStatus::Interrupted,
            Evaluation::Faulted(err) => RunStatus::Faulted(err.to_string()),
        };

        self.finish(start, status);
    }

    /// Writes the status line, closes the output region and publishes the
    /// terminal state.
    fn finish(&self, start: usize, status: RunStatus) {
        match &status {
            RunStatus::Completed => {}
            RunStatus::Interrupted => self.console.append_line(&self.config.interrupted_marker),
            RunStatus::Faulted(message) => self.console.append_line(&format!("Error: {message}")),
        }
        self.console.end_output(start);

        debug!(status = ?status, "evaluation finished");
        self.state.send_replace(status.state());
        *self.last_status.lock() = Some(status);
    }

    fn idle(&self) {
        let mut active = self.active.lock();
        *active = None;
        self.state.send_replace(RunnerState::Idle);
    }
}

/// Returns the runner to `Idle` on every exit from the evaluation thread.
struct IdleOnDrop<'a>(&'a Inner);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.idle();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl std::fmt::Debug for ScriptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRunner")
            .field("state", &self.state())
            .field("last_status", &self.last_status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn runner(config: Config) -> ScriptRunner {
        ScriptRunner::new(ScriptEnv::detached(), ConsoleBuffer::new(), config)
    }

    async fn run(runner: &ScriptRunner, source: &str) -> String {
        assert_eq!(runner.submit(source), Submission::Accepted);
        runner.wait_idle().await;
        runner.console().last_output().unwrap_or_default()
    }

    /// Waits until the evaluation thread has produced some output.
    async fn wait_for_output(runner: &ScriptRunner) {
        while runner.console().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn completed_value_is_echoed() {
        let runner = runner(Config::default());
        assert_eq!(run(&runner, "print('sum:'); 1 + 2").await, "sum:\n3\n");
        assert_eq!(runner.last_status(), Some(RunStatus::Completed));
        assert_eq!(runner.state(), RunnerState::Idle);

        assert_eq!(run(&runner, "var x = 1").await, "");
    }

    #[tokio::test]
    async fn echo_can_be_disabled() {
        let runner = runner(Config::default().echo_result(false));
        assert_eq!(run(&runner, "println('a'); 42").await, "a\n");
    }

    #[tokio::test]
    async fn cancel_interrupts_infinite_loop() {
        let runner = runner(Config::default().interrupt_check_interval(10));
        assert_eq!(
            runner.submit("println('started'); while (true) {}"),
            Submission::Accepted
        );
        wait_for_output(&runner).await;

        runner.cancel();
        runner.wait_idle().await;

        let text = runner.console().text();
        assert!(text.ends_with("Interrupted.\n"), "{text:?}");
        assert!(!text.contains("Error:"));
        assert_eq!(runner.last_status(), Some(RunStatus::Interrupted));
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn second_submission_is_rejected() {
        let runner = runner(Config::default());
        assert_eq!(
            runner.submit("println('first'); while (true) {}"),
            Submission::Accepted
        );
        wait_for_output(&runner).await;

        assert_eq!(runner.submit("println('second')"), Submission::Rejected);

        runner.cancel();
        runner.wait_idle().await;
        assert_eq!(runner.console().text(), "first\nInterrupted.\n");
    }

    #[tokio::test]
    async fn faults_are_reported_and_recovered_from() {
        let runner = runner(Config::default());
        let output = run(&runner, "println('before'); missing()").await;
        assert!(output.starts_with("before\nError: "), "{output:?}");
        assert!(matches!(runner.last_status(), Some(RunStatus::Faulted(_))));
        assert_eq!(runner.state(), RunnerState::Idle);

        assert_eq!(run(&runner, "'ok'").await, "ok\n");
    }

    #[tokio::test]
    async fn cancel_while_idle_is_a_no_op() {
        let runner = runner(Config::default());
        runner.cancel();
        runner.cancel();
        assert_eq!(run(&runner, "2 * 21").await, "42\n");
    }

    #[tokio::test]
    async fn terminal_state_precedes_idle() {
        let runner = runner(Config::default());
        let mut rx = runner.subscribe();
        let _ = runner.submit("throw 'boom'");

        let mut seen = vec![];
        while seen.last() != Some(&RunnerState::Idle) {
            rx.changed().await.unwrap();
            seen.push(*rx.borrow_and_update());
        }

        // Intermediate states may be coalesced, but never reordered.
        assert!(seen.iter().all(|state| matches!(
            state,
            RunnerState::Running | RunnerState::Faulted | RunnerState::Idle
        )));
        assert_eq!(
            runner.console().text(),
            "Error: uncaught exception: boom\n"
        );
    }
}
