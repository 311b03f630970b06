use super::Error;

/// Error raised by the modular pipeline while running next to the legacy
/// compiler.
///
/// In hybrid mode the harness catches it and reports the pipeline output as
/// unavailable; the caller still receives the legacy response.
#[derive(Debug)]
pub(super) struct PipelineFailed {
    message: Box<str>,
}

impl std::error::Error for PipelineFailed {}

impl core::fmt::Display for PipelineFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "pipeline failed: {}", self.message)
    }
}

impl Error {
    /// Creates a pipeline failure error.
    pub fn pipeline_failed(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::PipelineFailed(PipelineFailed {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a pipeline failure.
    pub fn is_pipeline_failed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::PipelineFailed(_))
    }
}
