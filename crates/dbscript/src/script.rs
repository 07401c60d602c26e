//! A small JavaScript-flavoured language for console scripting.
//!
//! Source text is tokenized and parsed into a tree that is evaluated
//! directly. Both the parser and the evaluator refuse input nested deeper
//! than the configured `max_nesting_depth`.
//! Evaluation counts steps and checks a [`CancelToken`] at a fixed
//! interval so a runaway script can be stopped from another thread.

mod ast;

mod builtins;
pub(crate) use builtins::install_globals;

mod interp;
pub(crate) use interp::{Flow, Interpreter, Unwind};

mod interrupt;
pub use interrupt::CancelToken;
pub(crate) use interrupt::Interrupter;

mod lexer;

mod parser;
pub(crate) use parser::parse;

mod scope;

mod value;
pub use value::{Dynamic, NativeFunction};
