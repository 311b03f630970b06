use super::Error;

/// Error when a payload cannot be converted to or from JSON.
#[derive(Debug)]
pub(super) struct SerializationError {
    inner: serde_json::Error,
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl core::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "serialization failed: {}", self.inner)
    }
}

impl Error {
    /// Creates a serialization error from a `serde_json` failure.
    pub fn serialization(err: serde_json::Error) -> Error {
        Error::from(super::ErrorKind::Serialization(SerializationError {
            inner: err,
        }))
    }

    /// Returns `true` if this error is a serialization failure.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Serialization(_))
    }
}
