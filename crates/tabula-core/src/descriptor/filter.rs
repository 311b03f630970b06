use crate::Value;

use serde::{Deserialize, Serialize};

/// A pre-applied condition narrowing the rows of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field: String,

    #[serde(default)]
    pub op: FilterOp,

    pub value: Value,

    /// Page the filter was saved for. Filters bound to another page do not
    /// apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl FilterSpec {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> FilterSpec {
        FilterSpec {
            field: field.into(),
            op,
            value: value.into(),
            page: None,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> FilterSpec {
        FilterSpec::new(field, FilterOp::Eq, value)
    }

    pub fn for_page(mut self, page: impl Into<String>) -> FilterSpec {
        self.page = Some(page.into());
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    #[default]
    Eq,
    Ne,
    Like,
    Gt,
    Gte,
    Lt,
    Lte,
}
