use super::Error;

/// Error when a table descriptor is malformed.
///
/// Formula and relation problems are skipped item by item and never produce
/// this error. It is reserved for descriptors that cannot be read at all, for
/// example a loosely-typed descriptor whose `columns` entry is not a list.
#[derive(Debug)]
pub(super) struct InvalidDescriptor {
    message: Box<str>,
}

impl std::error::Error for InvalidDescriptor {}

impl core::fmt::Display for InvalidDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid descriptor: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid descriptor error.
    pub fn invalid_descriptor(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidDescriptor(InvalidDescriptor {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid descriptor error.
    pub fn is_invalid_descriptor(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidDescriptor(_))
    }
}
