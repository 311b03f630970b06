use serde::{Deserialize, Serialize};

/// A requested column name that actually denotes a field of a related table.
///
/// When `alias_field` appears among the requested columns it is replaced, at
/// the same index, by `display_field` (a `table.column` path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub alias_field: String,
    pub display_field: String,
    pub display_label: String,
    pub foreign_key: String,
}

impl RelationSpec {
    pub fn new(
        alias_field: impl Into<String>,
        display_field: impl Into<String>,
        display_label: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> RelationSpec {
        RelationSpec {
            alias_field: alias_field.into(),
            display_field: display_field.into(),
            display_label: display_label.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// The related table named by the display field, e.g. `users` for
    /// `users.name`.
    pub fn target_table(&self) -> Option<&str> {
        self.display_field.split_once('.').map(|(table, _)| table)
    }

    /// The column on the related table, e.g. `name` for `users.name`.
    pub fn target_column(&self) -> &str {
        self.display_field
            .split_once('.')
            .map(|(_, column)| column)
            .unwrap_or(&self.display_field)
    }
}
