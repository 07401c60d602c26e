use super::Error;

/// Error raised while evaluating a script: syntax errors, unresolved names,
/// type errors and uncaught `throw`s.
#[derive(Debug)]
pub(super) struct EvaluationError {
    message: Box<str>,
}

impl std::error::Error for EvaluationError {}

impl core::fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error {
    /// Creates a script evaluation error.
    pub fn evaluation(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Evaluation(EvaluationError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a script evaluation error.
    pub fn is_evaluation(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Evaluation(_)))
    }
}
