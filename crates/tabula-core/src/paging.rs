use crate::descriptor::{FixedColumns, MergedColumns, ACTION_COLUMN};

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Paging, ordering and search parameters sent by the grid widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingRequest {
    pub start: u64,

    /// Page size; `-1` requests every row.
    pub length: i64,

    /// Index into the resolved display columns.
    pub order_column_index: Option<usize>,

    pub order_direction: Direction,

    pub search_term: Option<String>,

    /// Echoed back so the widget can discard stale responses.
    pub draw_counter: u64,
}

impl PagingRequest {
    pub fn new(start: u64, length: i64) -> PagingRequest {
        PagingRequest {
            start,
            length,
            ..PagingRequest::default()
        }
    }

    /// Row limit for the data source, `None` when every row is requested.
    pub fn limit(&self) -> Option<u64> {
        u64::try_from(self.length).ok()
    }
}

impl Default for PagingRequest {
    fn default() -> Self {
        PagingRequest {
            start: 0,
            length: 10,
            order_column_index: None,
            order_direction: Direction::Asc,
            search_term: None,
            draw_counter: 0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Parses `asc`/`desc` case-insensitively; anything else is ascending.
    pub fn parse(src: &str) -> Direction {
        if src.trim().eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

/// The paginated payload consumed by the grid widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingResponse {
    pub draw: u64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<RowView>,
}

impl PagingResponse {
    /// A response with no rows, echoing the draw counter.
    pub fn empty(draw: u64) -> PagingResponse {
        PagingResponse {
            draw,
            records_total: 0,
            records_filtered: 0,
            data: vec![],
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// One rendered row: cells in display order, row-level attributes and the
/// action cell.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RowView {
    pub cells: IndexMap<String, String>,
    pub attributes: RowAttributes,
    pub action: Option<String>,
}

impl RowView {
    pub fn cell(&self, field: &str) -> Option<&str> {
        self.cells.get(field).map(String::as_str)
    }
}

impl Serialize for RowView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in &self.cells {
            if field != ACTION_COLUMN {
                map.serialize_entry(field, value)?;
            }
        }
        if let Some(action) = &self.action {
            map.serialize_entry(ACTION_COLUMN, action)?;
        }
        if let Some(class) = &self.attributes.class {
            map.serialize_entry("DT_RowClass", class)?;
        }
        if !self.attributes.data.is_empty() {
            map.serialize_entry("DT_RowAttr", &self.attributes.data)?;
        }
        map.end()
    }
}

/// Metadata attached to a rendered row rather than a cell.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAttributes {
    pub class: Option<String>,
    pub data: IndexMap<String, String>,
}

impl RowAttributes {
    pub fn is_empty(&self) -> bool {
        self.class.is_none() && self.data.is_empty()
    }

    /// Merges `other` into `self` without overriding anything already set.
    /// Classes are concatenated; data attributes keep the existing value.
    pub fn merge_missing(&mut self, other: RowAttributes) {
        match (&mut self.class, other.class) {
            (Some(existing), Some(extra)) => {
                if !existing.split_whitespace().any(|c| c == extra) {
                    existing.push(' ');
                    existing.push_str(&extra);
                }
            }
            (slot @ None, Some(extra)) => *slot = Some(extra),
            (_, None) => {}
        }

        for (key, value) in other.data {
            self.data.entry(key).or_insert(value);
        }
    }
}

/// Descriptor-level column configuration carried through to the widget
/// unchanged.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub table: String,
    pub columns: Vec<String>,
    pub labels: IndexMap<String, String>,
    pub hidden: Vec<String>,
    pub raw_html: Vec<String>,
    pub sortable: Vec<String>,
    pub searchable: Vec<String>,
    pub clickable: Vec<String>,
    pub merged: Vec<MergedColumns>,
    pub fixed_columns: Option<FixedColumns>,
}

/// Result of compiling one request: the wire payload plus its metadata
/// envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledTable {
    #[serde(flatten)]
    pub response: PagingResponse,
    pub meta: ResponseMeta,
}
