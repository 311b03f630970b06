use super::Error;

/// Error when the relational data source cannot serve a query.
///
/// This is the one failure the compiler cannot degrade around: without rows
/// and counts there is no response to build.
#[derive(Debug)]
pub(super) struct DataSourceError {
    message: Box<str>,
}

impl std::error::Error for DataSourceError {}

impl core::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "data source error: {}", self.message)
    }
}

impl Error {
    /// Creates a data source error.
    pub fn data_source(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DataSource(DataSourceError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error came from the data source.
    pub fn is_data_source(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DataSource(_))
    }
}
