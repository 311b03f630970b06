mod recording_source;
pub use recording_source::RecordingSource;

pub mod prelude;

use serde_json::json;
use std::path::Path;
use tabula::{Config, InspectorConfig, MemSource, Mode, ParityConfig};
use tabula_core::{Row, RouteContext};

/// Orders joined to users, with one soft-deleted order.
pub fn orders() -> MemSource {
    MemSource::new()
        .table(
            "orders",
            ["id", "user_id", "amount", "tax", "created_at", "deleted_at"],
            [
                Row::new()
                    .with("id", 1)
                    .with("user_id", 10)
                    .with("amount", 30)
                    .with("tax", 3)
                    .with("created_at", "2024-05-01 09:30:00"),
                Row::new()
                    .with("id", 2)
                    .with("user_id", 11)
                    .with("amount", 10.5)
                    .with("tax", 1)
                    .with("created_at", "2024-05-02 14:00:00")
                    .with("deleted_at", "2024-05-03 08:00:00"),
                Row::new()
                    .with("id", 3)
                    .with("user_id", 12)
                    .with("amount", 1250)
                    .with("tax", 125)
                    .with("created_at", "2024-05-04 18:15:00"),
            ],
        )
        .table(
            "users",
            ["id", "name", "password"],
            [
                Row::new().with("id", 10).with("name", "Ada").with("password", "x"),
                Row::new().with("id", 11).with("name", "Grace").with("password", "y"),
                Row::new()
                    .with("id", 12)
                    .with("name", "<b>Linus</b>")
                    .with("password", "z"),
            ],
        )
}

/// Loose descriptor bag for the orders grid, as a controller would send it.
pub fn orders_descriptor() -> serde_json::Value {
    json!({
        "name": "orders",
        "columns": ["id", "user_name", "amount", "tax", "created_at"],
        "relations": [{
            "alias_field": "user_name",
            "display_field": "users.name",
            "display_label": "Customer",
            "foreign_key": "user_id",
        }],
        "formulas": [{
            "name": "gross",
            "label": "Gross",
            "field_lists": ["amount", "tax"],
            "placement": { "anchor": "tax", "after": true },
        }],
        "format_rules": [
            { "field": "amount", "type": "number", "decimals": 2 },
            { "field": "created_at", "type": "date", "pattern": "%d/%m/%Y" },
        ],
        "actions": { "removed_verbs": ["insert"] },
        "numbering": true,
        "soft_delete_field": "deleted_at",
    })
}

/// Routing facts for the orders index page.
pub fn orders_route() -> RouteContext {
    RouteContext::default()
        .route_name("admin.orders.index")
        .route_uri("admin/orders/index")
}

/// Harness settings for `mode`, with the pipeline enabled and diagnostics
/// stored under `dir`.
pub fn parity(mode: Mode, dir: &Path) -> ParityConfig {
    Config::new()
        .mode(mode)
        .pipeline_enabled(true)
        .inspector(InspectorConfig::default().enabled(true).storage_path(dir))
        .parity
}
