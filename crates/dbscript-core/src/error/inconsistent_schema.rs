use super::Error;

/// Error when key metadata names a column the table does not have.
///
/// Navigation by key would silently return the wrong rows if this were
/// treated as "not found", so it always aborts the call that hit it.
#[derive(Debug)]
pub(super) struct InconsistentSchemaError {
    message: Box<str>,
}

impl std::error::Error for InconsistentSchemaError {}

impl core::fmt::Display for InconsistentSchemaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "inconsistent schema: {}", self.message)
    }
}

impl Error {
    /// Creates an inconsistent schema error.
    pub fn inconsistent_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InconsistentSchema(
            InconsistentSchemaError {
                message: message.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an inconsistent schema error.
    pub fn is_inconsistent_schema(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InconsistentSchema(_)))
    }
}
