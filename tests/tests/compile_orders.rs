use pretty_assertions::assert_eq;
use tests::prelude::*;

async fn compile(params: &[(&str, &str)]) -> (CompiledTable, RecordingSource) {
    let source = RecordingSource::new(orders());
    let compiled = Pipeline::default()
        .compile(&orders_context(params), &source)
        .await
        .unwrap();
    (compiled, source)
}

#[tokio::test]
async fn resolves_display_columns() {
    let (compiled, _) = compile(&[("draw", "1")]).await;

    assert_eq!(
        compiled.meta.columns,
        vec![
            "number_lists",
            "id",
            "users.name",
            "user_id",
            "amount",
            "tax",
            "gross",
            "created_at",
            "action",
        ]
    );
    assert_eq!(compiled.meta.labels["users.name"], "Customer");
    assert_eq!(compiled.meta.labels["gross"], "Gross");
    assert_eq!(compiled.meta.labels["created_at"], "Created At");
    assert_eq!(compiled.meta.labels["number_lists"], "No");
}

#[tokio::test]
async fn renders_cells() {
    let (compiled, _) = compile(&[("draw", "4")]).await;
    let response = &compiled.response;

    assert_eq!(response.draw, 4);
    assert_eq!(response.records_total, 3);
    assert_eq!(response.records_filtered, 3);
    assert_eq!(response.data.len(), 3);

    assert_eq!(
        cells(&response.data[0]),
        vec![
            ("number_lists", "1"),
            ("id", "1"),
            ("users.name", "Ada"),
            ("user_id", "10"),
            ("amount", "30.00"),
            ("tax", "3"),
            ("gross", "33"),
            ("created_at", "01/05/2024"),
        ]
    );

    let third = &response.data[2];
    assert_eq!(third.cell("amount"), Some("1,250.00"));
    assert_eq!(third.cell("gross"), Some("1375"));
    assert_eq!(third.cell("users.name"), Some("&lt;b&gt;Linus&lt;/b&gt;"));
}

#[tokio::test]
async fn renders_row_actions() {
    let (compiled, _) = compile(&[]).await;
    let data = &compiled.response.data;

    let first = data[0].action.as_deref().unwrap();
    assert!(first.contains(r#"href="/admin/orders/1/view""#), "{first}");
    assert!(first.contains(r#"href="/admin/orders/1/edit""#), "{first}");
    assert!(first.contains(r#"href="/admin/orders/1/delete""#), "{first}");
    assert!(!first.contains("insert"), "{first}");

    // Soft-deleted rows offer restore instead of delete.
    let second = data[1].action.as_deref().unwrap();
    assert!(second.contains(r#"href="/admin/orders/2/restore""#), "{second}");
    assert!(!second.contains("/delete"), "{second}");
    assert_eq!(data[1].attributes.class.as_deref(), Some("row-deleted"));
    assert_eq!(data[0].attributes.class, None);
}

#[tokio::test]
async fn serializes_wire_payload() {
    let (compiled, _) = compile(&[("draw", "2"), ("length", "1")]).await;
    let json = compiled.response.to_json();

    assert_eq!(json["draw"], 2);
    assert_eq!(json["recordsTotal"], 3);
    assert_eq!(json["recordsFiltered"], 3);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["users.name"], "Ada");
    assert!(json["data"][0]["action"].as_str().unwrap().starts_with("<div"));
}

#[tokio::test]
async fn pages_sorts_and_searches() {
    let (compiled, source) = compile(&[
        ("start", "1"),
        ("length", "1"),
        ("order[0][column]", "4"),
        ("order[0][dir]", "desc"),
    ])
    .await;

    // Amount descending: 1250, 30, 10.5. The second page holds 30.
    let row = &compiled.response.data[0];
    assert_eq!(row.cell("id"), Some("1"));
    assert_eq!(row.cell("number_lists"), Some("2"));

    let queries = source.queries();
    assert_eq!(queries.len(), 1);
    let query = &queries[0];
    assert_eq!(query.offset, 1);
    assert_eq!(query.limit, Some(1));
    assert_eq!(query.order.as_ref().unwrap().column, "amount");
    assert_eq!(query.joins.len(), 1);
    assert_eq!(query.joins[0].table, "users");
    assert!(!query.select.iter().any(|c| c == "users.password"));

    let (compiled, _) = compile(&[("search[value]", "grace")]).await;
    assert_eq!(compiled.response.records_total, 3);
    assert_eq!(compiled.response.records_filtered, 1);
    assert_eq!(compiled.response.data[0].cell("id"), Some("2"));
}

#[tokio::test]
async fn unknown_table_is_reported() {
    let ctx = ContextAdapter::new()
        .adapt([("difta.name", "invoices")], &orders_descriptor(), vec![], None)
        .route(orders_route());

    let err = Pipeline::default().compile(&ctx, &orders()).await.unwrap_err();
    assert!(err.is_table_not_found());
}

#[tokio::test]
async fn unnamed_descriptor_takes_table_and_columns_from_column_map() {
    let bag = serde_json::json!({ "columns": { "users": ["id", "name"] } });
    let ctx = ContextAdapter::new()
        .adapt([("draw", "1")], &bag, vec![], None)
        .route(orders_route());

    let compiled = Pipeline::default().compile(&ctx, &orders()).await.unwrap();
    assert_eq!(compiled.meta.columns, vec!["id", "name", "action"]);
    assert_eq!(compiled.response.data[0].cell("name"), Some("Ada"));

    let legacy = LegacyCompiler::default().compile(&ctx, &orders()).await.unwrap();
    assert_eq!(legacy, compiled);
}
