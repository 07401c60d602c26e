use super::Error;

/// Error when writing to the console output failed.
///
/// Kept apart from interruption and from driver failures so the console can
/// recover locally without misreporting what happened to the script.
#[derive(Debug)]
pub(super) struct ConsoleIoError {
    inner: std::io::Error,
}

impl std::error::Error for ConsoleIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl core::fmt::Display for ConsoleIoError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "console write failed: {}", self.inner)
    }
}

impl Error {
    /// Creates a console I/O error.
    pub fn console_io(err: std::io::Error) -> Error {
        Error::from(super::ErrorKind::ConsoleIo(ConsoleIoError { inner: err }))
    }

    /// Returns `true` if this error is a console I/O error.
    pub fn is_console_io(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::ConsoleIo(_)))
    }
}
