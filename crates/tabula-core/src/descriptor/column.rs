use heck::ToTitleCase;
use serde::{Deserialize, Serialize};

/// Display configuration for one requested column.
///
/// Identity is the field name within a table; the position of a `ColumnSpec`
/// in [`TableDescriptor::columns`](crate::TableDescriptor) is its display
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub field: String,

    /// Header label. Defaults to the title-cased field name.
    pub label: Option<String>,

    pub hidden: bool,

    /// Render the cell as-is instead of HTML-escaping it.
    pub raw_html: bool,

    pub sortable: bool,

    pub searchable: bool,

    /// Treat the column as an image even when the value has no image
    /// extension.
    pub image_hint: bool,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>) -> ColumnSpec {
        ColumnSpec {
            field: field.into(),
            ..ColumnSpec::default()
        }
    }

    /// The header label, falling back to [`default_label`].
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| default_label(&self.field))
    }

    pub fn label(mut self, label: impl Into<String>) -> ColumnSpec {
        self.label = Some(label.into());
        self
    }

    pub fn hidden(mut self) -> ColumnSpec {
        self.hidden = true;
        self
    }

    pub fn raw_html(mut self) -> ColumnSpec {
        self.raw_html = true;
        self
    }

    pub fn image(mut self) -> ColumnSpec {
        self.image_hint = true;
        self
    }

    pub fn unsortable(mut self) -> ColumnSpec {
        self.sortable = false;
        self
    }

    pub fn unsearchable(mut self) -> ColumnSpec {
        self.searchable = false;
        self
    }
}

impl Default for ColumnSpec {
    fn default() -> Self {
        ColumnSpec {
            field: String::new(),
            label: None,
            hidden: false,
            raw_html: false,
            sortable: true,
            searchable: true,
            image_hint: false,
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(field: &str) -> Self {
        ColumnSpec::new(field)
    }
}

impl From<String> for ColumnSpec {
    fn from(field: String) -> Self {
        ColumnSpec::new(field)
    }
}

/// Title-cased label for a field name; `table.column` paths use the column
/// part, so `user_name` becomes `User Name` and `users.email` becomes `Email`.
pub fn default_label(field: &str) -> String {
    let column = field.rsplit('.').next().unwrap_or(field);
    column.to_title_case()
}
