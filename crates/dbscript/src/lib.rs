mod config;
pub use config::Config;

mod console;
pub use console::{ConsoleBuffer, OutputSink};

pub mod host;

mod runner;
pub use runner::{RunStatus, RunnerState, ScriptRunner, Submission};

pub mod script;
pub use script::CancelToken;

mod session;
pub use session::{Evaluation, ScriptEnv, ScriptSession};

pub use dbscript_core::{Error, Result};
