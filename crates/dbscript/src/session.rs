use crate::{
    script::{self, CancelToken, Interpreter, Interrupter, Unwind},
    Config, OutputSink,
};
use dbscript_core::{Catalog, Connection, Error};

use std::sync::Arc;
use tracing::debug;

/// What a fresh evaluation gets bound to: the catalog behind the `db` global.
///
/// Cheap to clone and `Send`, so it can cross to the evaluation thread.
#[derive(Debug, Clone, Default)]
pub struct ScriptEnv {
    catalog: Option<Arc<Catalog>>,
}

impl ScriptEnv {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog: Some(catalog),
        }
    }

    /// An environment over a fresh catalog for `connection`.
    pub fn connect(connection: Arc<dyn Connection>) -> Self {
        Self::new(Arc::new(Catalog::new(connection)))
    }

    /// An environment with no database; `db` is not defined.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> Option<&Arc<Catalog>> {
        self.catalog.as_ref()
    }
}

/// How one evaluation ended.
#[derive(Debug, Clone)]
pub enum Evaluation {
    /// The script ran to the end. Holds the display form of its value, or
    /// `None` when there was no result.
    Completed(Option<String>),

    /// The cancel token was observed.
    Interrupted,

    /// Any other failure, including uncaught `throw`s and syntax errors.
    Faulted(Error),
}

impl Evaluation {
    pub fn is_completed(&self) -> bool {
        matches!(self, Evaluation::Completed(_))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Evaluation::Interrupted)
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, Evaluation::Faulted(_))
    }
}

/// Runs scripts against an environment, writing `print` output to a sink.
///
/// Every call to [`evaluate`](Self::evaluate) starts from fresh global
/// bindings and writes only to this session's sink.
#[derive(Clone)]
pub struct ScriptSession {
    env: ScriptEnv,
    sink: Arc<dyn OutputSink>,
    config: Config,
}

impl ScriptSession {
    pub fn new(env: ScriptEnv, sink: Arc<dyn OutputSink>, config: Config) -> Self {
        Self { env, sink, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn evaluate(&self, source: &str, cancel: &CancelToken) -> Evaluation {
        let program = match script::parse(source, self.config.max_nesting_depth) {
            Ok(program) => program,
            Err(err) => return Evaluation::Faulted(err),
        };

        let mut interp = Interpreter::new(
            self.sink.clone(),
            Interrupter::new(cancel.clone(), self.config.interrupt_check_interval),
            self.config.max_call_depth,
            self.config.max_nesting_depth,
        );
        script::install_globals(&interp.globals, &self.env);

        let evaluation = match interp.run(&program) {
            Ok(value) if value.is_undefined() => Evaluation::Completed(None),
            Ok(value) => Evaluation::Completed(Some(value.to_string())),
            Err(Unwind::Interrupted) => Evaluation::Interrupted,
            Err(Unwind::Error(err)) => Evaluation::Faulted(err),
            Err(Unwind::Throw(value)) => {
                Evaluation::Faulted(Error::evaluation(format!("uncaught exception: {value}")))
            }
            // `run` turns these into errors
            Err(Unwind::Return(_) | Unwind::Break | Unwind::Continue) => {
                Evaluation::Faulted(Error::evaluation("unexpected control flow at top level"))
            }
        };

        debug!(outcome = ?evaluation, "evaluation finished");
        evaluation
    }
}

impl std::fmt::Debug for ScriptSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptSession")
            .field("env", &self.env)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
