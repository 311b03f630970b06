use crate::{async_trait, Direction, FilterSpec, RelationSpec, Result, Row};

use std::fmt::Debug;

/// The relational backend a table is compiled against.
///
/// Connection pooling and SQL generation live behind this trait; the compiler
/// only describes what it needs through [`TableQuery`].
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Column names of `table`, or `None` when the table does not exist.
    async fn columns(&self, table: &str) -> Result<Option<Vec<String>>>;

    /// Relations discovered by schema introspection.
    async fn relations(&self, _table: &str) -> Result<Vec<RelationSpec>> {
        Ok(vec![])
    }

    /// Runs one page query.
    async fn query(&self, query: &TableQuery) -> Result<QueryResult>;
}

/// Everything the data source needs to produce one page of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: String,

    /// Columns to select, in order. Joined columns use `table.column`.
    pub select: Vec<String>,

    pub joins: Vec<Join>,

    pub search: Option<Search>,

    pub filters: Vec<FilterSpec>,

    pub order: Option<SortOrder>,

    pub offset: u64,

    /// `None` selects every remaining row.
    pub limit: Option<u64>,
}

impl TableQuery {
    pub fn new(table: impl Into<String>) -> TableQuery {
        TableQuery {
            table: table.into(),
            select: vec![],
            joins: vec![],
            search: None,
            filters: vec![],
            order: None,
            offset: 0,
            limit: None,
        }
    }
}

/// A left join contributed by a relation alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Related table, e.g. `users`.
    pub table: String,

    /// Column on the queried table holding the related row's key.
    pub foreign_key: String,

    /// Column on the related table matched by `foreign_key`.
    pub target_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub term: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub column: String,
    pub direction: Direction,
}

/// Rows of the requested page plus the counts the widget displays.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryResult {
    /// Rows matching the descriptor filters, before the search term.
    pub total: u64,

    /// Rows remaining once the search term is applied as well.
    pub filtered: u64,

    pub rows: Vec<Row>,
}
