use super::Error;

/// Error when a connection does not implement an optional capability.
#[derive(Debug)]
pub(super) struct UnsupportedError {
    message: Box<str>,
}

impl std::error::Error for UnsupportedError {}

impl core::fmt::Display for UnsupportedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unsupported: {}", self.message)
    }
}

impl Error {
    /// Creates an unsupported feature error.
    pub fn unsupported(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Unsupported(UnsupportedError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an unsupported feature error.
    pub fn is_unsupported(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Unsupported(_)))
    }
}
