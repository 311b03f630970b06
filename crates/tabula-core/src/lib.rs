mod context;
pub use context::{CompilationContext, Privileges, RouteContext, ROOT_ROLE};

pub mod descriptor;
pub use descriptor::{
    default_label, ActionConfig, Anchor, ColumnSpec, CustomButtons, FilterOp, FilterSpec,
    FixedColumns, FormatKind, FormatRule, FormulaSpec, MergedColumns, PagingConfig, Placement,
    RelationSpec, TableDescriptor, Verb, ACTION_COLUMN, NUMBERING_COLUMN,
};

mod error;
pub use error::Error;

mod paging;
pub use paging::{
    CompiledTable, Direction, PagingRequest, PagingResponse, ResponseMeta, RowAttributes, RowView,
};

mod row;
pub use row::Row;

pub mod source;
pub use source::{DataSource, Join, QueryResult, Search, SortOrder, TableQuery};

mod value;
pub use value::Value;

/// A Result type alias that uses Tabula's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;

/// A component that can describe itself for a diagnostic artifact.
///
/// Implementations return only fields that are safe and useful to persist;
/// sensitive keys are still redacted by the inspector before writing.
pub trait Diagnose {
    fn diagnostics(&self) -> serde_json::Value;
}
