use super::Error;

/// Error when the compilation context names no table, or a table the data
/// source does not know.
#[derive(Debug)]
pub(super) struct TableNotFound {
    table: Box<str>,
}

impl std::error::Error for TableNotFound {}

impl core::fmt::Display for TableNotFound {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.table.is_empty() {
            f.write_str("table not found: no table name resolved")
        } else {
            write!(f, "table not found: {}", self.table)
        }
    }
}

impl Error {
    /// Creates a table not found error. An empty name means the context
    /// resolved no table at all.
    pub fn table_not_found(table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::TableNotFound(TableNotFound {
            table: table.into().into(),
        }))
    }

    /// Returns `true` if this error is a table not found error.
    pub fn is_table_not_found(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TableNotFound(_))
    }
}
