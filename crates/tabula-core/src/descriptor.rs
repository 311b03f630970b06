mod action;
pub use action::{ActionConfig, CustomButtons, Verb};

mod column;
pub use column::{default_label, ColumnSpec};

mod filter;
pub use filter::{FilterOp, FilterSpec};

mod format;
pub use format::{FormatKind, FormatRule};

mod formula;
pub use formula::{Anchor, FormulaSpec, Placement};

mod paging;
pub use paging::PagingConfig;

mod relation;
pub use relation::RelationSpec;

use serde::{Deserialize, Serialize};

/// Field name of the row-numbering column.
pub const NUMBERING_COLUMN: &str = "number_lists";

/// Field name of the row action column.
pub const ACTION_COLUMN: &str = "action";

/// Declarative description of one admin grid.
///
/// Built once per request by the calling controller and treated as immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDescriptor {
    pub name: Option<String>,
    pub columns: Vec<ColumnSpec>,
    pub relations: Vec<RelationSpec>,
    pub formulas: Vec<FormulaSpec>,
    pub actions: ActionConfig,
    pub filters: Vec<FilterSpec>,
    pub paging: PagingConfig,
    pub format_rules: Vec<FormatRule>,

    /// Prepend a row-numbering column.
    pub numbering: bool,

    /// Columns whose cells make the whole row clickable.
    pub clickable_columns: Vec<String>,

    /// Header groups, passed through to the grid widget.
    pub merged_columns: Vec<MergedColumns>,

    /// Frozen columns, passed through to the grid widget.
    pub fixed_columns: Option<FixedColumns>,

    /// Field holding the row identifier used in action URLs.
    pub row_identifier: String,

    /// Field whose non-null value marks a soft-deleted row.
    pub soft_delete_field: String,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> TableDescriptor {
        TableDescriptor {
            name: Some(name.into()),
            ..TableDescriptor::default()
        }
    }

    pub fn column(mut self, column: impl Into<ColumnSpec>) -> TableDescriptor {
        self.columns.push(column.into());
        self
    }

    pub fn columns<I>(mut self, columns: I) -> TableDescriptor
    where
        I: IntoIterator,
        I::Item: Into<ColumnSpec>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn relation(mut self, relation: RelationSpec) -> TableDescriptor {
        self.relations.push(relation);
        self
    }

    pub fn formula(mut self, formula: FormulaSpec) -> TableDescriptor {
        self.formulas.push(formula);
        self
    }

    pub fn actions(mut self, actions: ActionConfig) -> TableDescriptor {
        self.actions = actions;
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> TableDescriptor {
        self.filters.push(filter);
        self
    }

    pub fn format(mut self, rule: FormatRule) -> TableDescriptor {
        self.format_rules.push(rule);
        self
    }

    pub fn numbered(mut self) -> TableDescriptor {
        self.numbering = true;
        self
    }

    pub fn clickable(mut self, field: impl Into<String>) -> TableDescriptor {
        self.clickable_columns.push(field.into());
        self
    }

    /// Requested field names in display order.
    pub fn requested_fields(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.field.clone()).collect()
    }

    pub fn column_spec(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }
}

impl Default for TableDescriptor {
    fn default() -> Self {
        TableDescriptor {
            name: None,
            columns: vec![],
            relations: vec![],
            formulas: vec![],
            actions: ActionConfig::default(),
            filters: vec![],
            paging: PagingConfig::default(),
            format_rules: vec![],
            numbering: false,
            clickable_columns: vec![],
            merged_columns: vec![],
            fixed_columns: None,
            row_identifier: "id".to_string(),
            soft_delete_field: "deleted_at".to_string(),
        }
    }
}

/// A header spanning several columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedColumns {
    pub label: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedColumns {
    pub left: usize,
    pub right: usize,
}
