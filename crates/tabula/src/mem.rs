//! An in-memory [`DataSource`], used by tests and by the CLI's `compile`
//! command.

use tabula_core::{
    async_trait, DataSource, Direction, Error, FilterOp, FilterSpec, QueryResult,
    RelationSpec, Result, Row, TableQuery, Value,
};

use indexmap::IndexMap;
use serde::Deserialize;
use std::cmp::Ordering;

#[derive(Debug, Default, Clone)]
pub struct MemSource {
    tables: IndexMap<String, MemTable>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MemTable {
    /// Column names. Derived from the first row when empty.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub relations: Vec<RelationSpec>,
}

/// JSON fixture layout: `{ "tables": { "<name>": { "columns", "rows", "relations" } } }`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Fixture {
    tables: IndexMap<String, MemTable>,
}

impl MemSource {
    pub fn new() -> MemSource {
        MemSource::default()
    }

    pub fn table(
        mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        rows: impl IntoIterator<Item = Row>,
    ) -> MemSource {
        self.tables.insert(
            name.into(),
            MemTable {
                columns: columns.into_iter().map(Into::into).collect(),
                rows: rows.into_iter().collect(),
                relations: vec![],
            },
        );
        self
    }

    /// Registers a relation reported by [`DataSource::relations`].
    pub fn relation(mut self, table: &str, relation: RelationSpec) -> MemSource {
        if let Some(t) = self.tables.get_mut(table) {
            t.relations.push(relation);
        }
        self
    }

    pub fn from_json(fixture: serde_json::Value) -> Result<MemSource> {
        let fixture: Fixture = serde_json::from_value(fixture)?;
        let tables = fixture
            .tables
            .into_iter()
            .map(|(name, mut table)| {
                if table.columns.is_empty() {
                    if let Some(first) = table.rows.first() {
                        table.columns = first.iter().map(|(k, _)| k.to_string()).collect();
                    }
                }
                (name, table)
            })
            .collect();
        Ok(MemSource { tables })
    }

    fn get(&self, table: &str) -> Result<&MemTable> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::table_not_found(table))
    }

    /// Base rows of `query.table` with every join applied. Joined columns are
    /// keyed `table.column`; an unmatched join contributes nulls.
    fn joined_rows(&self, query: &TableQuery) -> Result<Vec<Row>> {
        let base = self.get(&query.table)?;
        let mut rows = base.rows.clone();

        for join in &query.joins {
            let related = self.get(&join.table)?;

            for row in &mut rows {
                let key = row.value(&join.foreign_key);
                let matched = if key.is_null() {
                    None
                } else {
                    related
                        .rows
                        .iter()
                        .find(|candidate| loose_eq(candidate.value(&join.target_key), key))
                };

                for column in &related.columns {
                    let value = matched.map(|m| m.value(column).clone()).unwrap_or_default();
                    row.insert(format!("{}.{}", join.table, column), value);
                }
            }
        }

        Ok(rows)
    }
}

#[async_trait]
impl DataSource for MemSource {
    async fn columns(&self, table: &str) -> Result<Option<Vec<String>>> {
        Ok(self.tables.get(table).map(|t| t.columns.clone()))
    }

    async fn relations(&self, table: &str) -> Result<Vec<RelationSpec>> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.relations.clone())
            .unwrap_or_default())
    }

    async fn query(&self, query: &TableQuery) -> Result<QueryResult> {
        let mut rows: Vec<Row> = self
            .joined_rows(query)?
            .into_iter()
            .filter(|row| query.filters.iter().all(|filter| matches_filter(row, filter)))
            .collect();
        let total = rows.len() as u64;

        if let Some(search) = &query.search {
            let term = search.term.to_lowercase();
            rows.retain(|row| {
                search
                    .columns
                    .iter()
                    .any(|column| row.value(column).render().to_lowercase().contains(&term))
            });
        }
        let filtered = rows.len() as u64;

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = a.value(&order.column).cmp_loose(b.value(&order.column));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let rows = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(row, &query.select))
            .collect();

        Ok(QueryResult {
            total,
            filtered,
            rows,
        })
    }
}

fn project(row: Row, select: &[String]) -> Row {
    if select.is_empty() {
        return row;
    }
    select
        .iter()
        .map(|column| (column.clone(), row.value(column).clone()))
        .collect()
}

fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    !lhs.is_null() && !rhs.is_null() && lhs.cmp_loose(rhs) == Ordering::Equal
}

fn matches_filter(row: &Row, filter: &FilterSpec) -> bool {
    let value = row.value(&filter.field);
    match filter.op {
        FilterOp::Eq => loose_eq(value, &filter.value) || (value.is_null() && filter.value.is_null()),
        FilterOp::Ne => !(loose_eq(value, &filter.value) || (value.is_null() && filter.value.is_null())),
        FilterOp::Like => like(&value.render(), &filter.value.render()),
        FilterOp::Gt => !value.is_null() && value.cmp_loose(&filter.value) == Ordering::Greater,
        FilterOp::Gte => !value.is_null() && value.cmp_loose(&filter.value) != Ordering::Less,
        FilterOp::Lt => !value.is_null() && value.cmp_loose(&filter.value) == Ordering::Less,
        FilterOp::Lte => !value.is_null() && value.cmp_loose(&filter.value) != Ordering::Greater,
    }
}

/// Case-insensitive SQL `LIKE` with `%` wildcards.
fn like(value: &str, pattern: &str) -> bool {
    let value = value.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();

    if parts.len() == 1 {
        return value == pattern;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    let Some(mut remaining) = value.strip_prefix(first) else {
        return false;
    };

    for part in &parts[1..parts.len() - 1] {
        match remaining.find(part) {
            Some(at) => remaining = &remaining[at + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}
