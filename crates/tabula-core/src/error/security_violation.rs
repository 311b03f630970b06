use super::Error;

/// Error when the request guard rejects the incoming parameters.
///
/// The compiler never raises this itself. It is produced by a
/// `RequestGuard` before compilation starts.
#[derive(Debug)]
pub(super) struct SecurityViolation {
    message: Box<str>,
}

impl std::error::Error for SecurityViolation {}

impl core::fmt::Display for SecurityViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "security violation: {}", self.message)
    }
}

impl Error {
    /// Creates a security violation error.
    pub fn security_violation(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::SecurityViolation(SecurityViolation {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if the request guard rejected the request.
    pub fn is_security_violation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::SecurityViolation(_))
    }
}
