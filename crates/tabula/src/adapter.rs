//! Normalizes loosely-structured request parameters and descriptor data into
//! a [`CompilationContext`].
//!
//! The adapter performs no I/O and never fails. Malformed input degrades to
//! defaults; an unresolvable table name yields `table_name: None`, which the
//! compiler reports as a missing table.

use tabula_core::{
    ColumnSpec, CompilationContext, Direction, FilterSpec, PagingRequest, TableDescriptor,
};

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

/// Request parameter naming the descriptor's table explicitly.
pub const TABLE_PARAM: &str = "difta.name";

const TABLE_PARAM_BRACKETED: &str = "difta[name]";

#[derive(Debug, Default, Clone, Copy)]
pub struct ContextAdapter;

impl ContextAdapter {
    pub fn new() -> ContextAdapter {
        ContextAdapter
    }

    /// Builds the compilation context.
    ///
    /// `descriptor` is the caller's property bag. Keys that fail to parse are
    /// dropped with a warning; the rest are kept. Caller `filters` bound to a
    /// page other than `filter_page` are discarded.
    pub fn adapt<K, V>(
        &self,
        params: impl IntoIterator<Item = (K, V)>,
        descriptor: &Json,
        filters: Vec<FilterSpec>,
        filter_page: Option<&str>,
    ) -> CompilationContext
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request: IndexMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let named = named_table(&request, descriptor);
        let (keyed_name, keyed_columns) = match named {
            Some(_) => (None, None),
            None => keyed_table(descriptor).unzip(),
        };
        let table_name = named.or(keyed_name);
        let descriptor = parse_descriptor(descriptor, keyed_columns);
        let paging = paging(&request, &descriptor);

        let filter_page = filter_page.map(str::to_string);
        let filters = filters
            .into_iter()
            .filter(|filter| {
                filter.page.is_none() || filter.page.as_deref() == filter_page.as_deref()
            })
            .collect();

        if table_name.is_none() {
            tracing::debug!("no table name resolved from request or descriptor");
        }

        CompilationContext {
            table_name,
            descriptor,
            paging,
            filters,
            filter_page,
            route: Default::default(),
            privileges: Default::default(),
            request,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Explicit request parameter, then the descriptor's name.
fn named_table(request: &IndexMap<String, String>, descriptor: &Json) -> Option<String> {
    request
        .get(TABLE_PARAM)
        .or_else(|| request.get(TABLE_PARAM_BRACKETED))
        .and_then(|s| non_empty(s))
        .or_else(|| descriptor.get("name").and_then(Json::as_str).and_then(non_empty))
}

/// Last resort for unnamed descriptors: the column map is keyed by table, and
/// its first entry holds that table's column set.
fn keyed_table(descriptor: &Json) -> Option<(String, &Json)> {
    let (table, columns) = descriptor.get("columns")?.as_object()?.iter().next()?;
    Some((non_empty(table)?, columns))
}

fn paging(request: &IndexMap<String, String>, descriptor: &TableDescriptor) -> PagingRequest {
    let param = |key: &str| request.get(key).map(|s| s.trim());

    let search_term = param("search[value]")
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    PagingRequest {
        start: param("start").and_then(|s| s.parse().ok()).unwrap_or(0),
        length: param("length")
            .and_then(|s| s.parse().ok())
            .unwrap_or(descriptor.paging.default_length),
        order_column_index: param("order[0][column]").and_then(|s| s.parse().ok()),
        order_direction: param("order[0][dir]")
            .map(Direction::parse)
            .unwrap_or_default(),
        search_term,
        draw_counter: param("draw").and_then(|s| s.parse().ok()).unwrap_or(0),
    }
}

/// `keyed_columns` replaces the bag's `columns` entry when the table name was
/// taken from the column map.
fn parse_descriptor(bag: &Json, keyed_columns: Option<&Json>) -> TableDescriptor {
    let Some(bag) = bag.as_object() else {
        if !bag.is_null() {
            tracing::warn!("descriptor is not an object; using defaults");
        }
        return TableDescriptor::default();
    };

    let mut accepted = Map::new();
    for (key, value) in bag {
        let value = match key.as_str() {
            "columns" => normalize_columns(keyed_columns.unwrap_or(value)),
            _ => value.clone(),
        };
        let probe = Json::Object(Map::from_iter([(key.clone(), value.clone())]));
        match serde_json::from_value::<TableDescriptor>(probe) {
            Ok(_) => {
                accepted.insert(key.clone(), value);
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "dropping malformed descriptor entry");
            }
        }
    }

    serde_json::from_value(Json::Object(accepted)).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "descriptor rejected; using defaults");
        TableDescriptor::default()
    })
}

/// Accepts a list of field names, a list of column objects, or a map of
/// field name to label / column object, and returns a list of column objects.
fn normalize_columns(columns: &Json) -> Json {
    let column = |field: &str, spec: &Json| -> Json {
        let mut object = match spec {
            Json::Object(object) => object.clone(),
            Json::String(label) => Map::from_iter([("label".to_string(), Json::from(label.as_str()))]),
            _ => Map::new(),
        };
        object
            .entry("field")
            .or_insert_with(|| Json::from(field));
        Json::Object(object)
    };

    match columns {
        Json::Object(map) => map.iter().map(|(field, spec)| column(field.as_str(), spec)).collect(),
        Json::Array(items) => items
            .iter()
            .map(|item| match item {
                Json::String(field) => {
                    serde_json::to_value(ColumnSpec::new(field.as_str())).unwrap_or(Json::Null)
                }
                other => other.clone(),
            })
            .collect(),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn adapt(params: &[(&str, &str)], descriptor: Json) -> CompilationContext {
        ContextAdapter::new().adapt(params.iter().copied(), &descriptor, vec![], None)
    }

    #[test]
    fn table_name_precedence() {
        let bag = json!({ "name": "orders", "columns": { "invoices": {} } });
        assert_eq!(
            adapt(&[("difta.name", "users")], bag.clone()).table_name.as_deref(),
            Some("users")
        );
        assert_eq!(adapt(&[], bag).table_name.as_deref(), Some("orders"));
        assert_eq!(
            adapt(&[], json!({ "columns": { "invoices": {} } })).table_name.as_deref(),
            Some("invoices")
        );
    }

    #[test]
    fn table_keyed_column_map_supplies_the_columns() {
        let ctx = adapt(&[], json!({ "columns": { "users": ["id", "name"] } }));
        assert_eq!(ctx.table_name.as_deref(), Some("users"));
        assert_eq!(ctx.descriptor.requested_fields(), vec!["id", "name"]);

        let ctx = adapt(
            &[],
            json!({ "columns": { "users": { "id": {}, "name": "Full Name" } } }),
        );
        assert_eq!(ctx.descriptor.requested_fields(), vec!["id", "name"]);
        assert_eq!(ctx.descriptor.columns[1].label.as_deref(), Some("Full Name"));

        let ctx = adapt(&[("difta.name", "users")], json!({ "columns": { "id": {}, "name": {} } }));
        assert_eq!(ctx.descriptor.requested_fields(), vec!["id", "name"]);
    }

    #[test]
    fn missing_table_name_fails_closed() {
        let ctx = adapt(&[("difta.name", "  ")], json!({ "columns": ["id"] }));
        assert_eq!(ctx.table_name, None);
        assert_eq!(ctx.descriptor.requested_fields(), vec!["id"]);
    }

    #[test]
    fn paging_defaults() {
        let ctx = adapt(&[("start", "abc"), ("length", "")], json!({}));
        assert_eq!(ctx.paging.start, 0);
        assert_eq!(ctx.paging.length, 10);
        assert_eq!(ctx.paging.draw_counter, 0);
        assert_eq!(ctx.paging.search_term, None);
    }

    #[test]
    fn paging_parameters() {
        let ctx = adapt(
            &[
                ("draw", "7"),
                ("start", "20"),
                ("length", "-1"),
                ("order[0][column]", "2"),
                ("order[0][dir]", "DESC"),
                ("search[value]", " ada "),
            ],
            json!({ "name": "users" }),
        );
        assert_eq!(
            ctx.paging,
            PagingRequest {
                start: 20,
                length: -1,
                order_column_index: Some(2),
                order_direction: Direction::Desc,
                search_term: Some("ada".into()),
                draw_counter: 7,
            }
        );
        assert_eq!(ctx.request["draw"], "7");
    }

    #[test]
    fn column_map_shapes() {
        let ctx = adapt(
            &[],
            json!({
                "name": "users",
                "columns": { "id": {}, "email": "E-mail", "bio": { "raw_html": true } },
            }),
        );
        let columns = &ctx.descriptor.columns;
        assert_eq!(ctx.descriptor.requested_fields(), vec!["id", "email", "bio"]);
        assert_eq!(columns[1].label.as_deref(), Some("E-mail"));
        assert!(columns[2].raw_html);
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let ctx = adapt(
            &[],
            json!({ "name": "users", "columns": ["id"], "numbering": "yes please" }),
        );
        assert!(!ctx.descriptor.numbering);
        assert_eq!(ctx.descriptor.name.as_deref(), Some("users"));
        assert_eq!(ctx.descriptor.requested_fields(), vec!["id"]);
    }

    #[test]
    fn filters_for_other_pages_are_discarded() {
        let ctx = ContextAdapter::new().adapt(
            Vec::<(String, String)>::new(),
            &json!({ "name": "orders" }),
            vec![
                FilterSpec::eq("status", "open"),
                FilterSpec::eq("owner", 1).for_page("mine"),
                FilterSpec::eq("region", "eu").for_page("europe"),
            ],
            Some("mine"),
        );
        let fields: Vec<_> = ctx.filters.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "owner"]);
        assert_eq!(ctx.filter_page.as_deref(), Some("mine"));
    }
}
