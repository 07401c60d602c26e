use super::Error;

/// Error when a host-object method is called with the wrong number or types
/// of arguments.
///
/// The message names the expected signature so the console user can fix the
/// call without reading the source.
#[derive(Debug)]
pub(super) struct InvalidArgumentError {
    signature: Box<str>,
    message: Box<str>,
}

impl std::error::Error for InvalidArgumentError {}

impl core::fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid argument: {}: {}", self.signature, self.message)
    }
}

impl Error {
    /// Creates an invalid argument error for a call to `signature`.
    pub fn invalid_argument(signature: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidArgument(InvalidArgumentError {
            signature: signature.into().into(),
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid argument error.
    pub fn is_invalid_argument(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidArgument(_)))
    }
}
