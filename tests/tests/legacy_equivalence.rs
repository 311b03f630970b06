use pretty_assertions::assert_eq;
use serde_json::json;
use tabula_core::FilterSpec;
use tests::prelude::*;

async fn both(ctx: &CompilationContext, source: &MemSource) -> (CompiledTable, CompiledTable) {
    let legacy = LegacyCompiler::default().compile(ctx, source).await.unwrap();
    let pipeline = Pipeline::default().compile(ctx, source).await.unwrap();
    (legacy, pipeline)
}

#[tokio::test]
async fn identical_across_requests() {
    let requests: &[&[(&str, &str)]] = &[
        &[],
        &[("draw", "3"), ("start", "1"), ("length", "2")],
        &[("order[0][column]", "2"), ("order[0][dir]", "desc")],
        &[("order[0][column]", "6")],
        &[("search[value]", "LINUS")],
        &[("length", "-1")],
        &[("start", "10")],
    ];

    for params in requests {
        let ctx = orders_context(params);
        let (legacy, pipeline) = both(&ctx, &orders()).await;
        assert_eq!(legacy, pipeline, "params: {params:?}");
    }
}

#[tokio::test]
async fn identical_with_page_scoped_filters() {
    let filters = vec![
        FilterSpec::eq("user_id", 10),
        FilterSpec::eq("user_id", 11).for_page("archive"),
    ];
    let ctx = ContextAdapter::new()
        .adapt([("draw", "1")], &orders_descriptor(), filters, Some("orders"))
        .route(orders_route());

    let (legacy, pipeline) = both(&ctx, &orders()).await;
    assert_eq!(legacy, pipeline);
    assert_eq!(pipeline.response.records_total, 1);
    assert_eq!(pipeline.response.data[0].cell("users.name"), Some("Ada"));
}

#[tokio::test]
async fn identical_for_sparse_descriptors() {
    let bags = [
        json!({ "name": "users" }),
        json!({ "name": "users", "columns": { "name": "Full Name" }, "actions": { "enabled_verbs": [] } }),
        json!({
            "name": "orders",
            "columns": ["amount", "action"],
            "formulas": [
                { "name": "net", "label": "Net", "field_lists": ["amount", "tax"], "logic": "{amount} - {tax}", "placement": { "anchor": "first" } },
                { "name": "ratio", "label": "Ratio", "field_lists": ["amount", "tax"], "logic": "{tax} / ({amount} - {amount})" },
            ],
            "clickable_columns": ["amount"],
        }),
        json!({ "name": "orders", "numbering": "yes", "columns": 42 }),
    ];

    for bag in bags {
        let ctx = ContextAdapter::new()
            .adapt([("draw", "1")], &bag, vec![], None)
            .route(orders_route());
        let (legacy, pipeline) = both(&ctx, &orders()).await;
        assert_eq!(legacy, pipeline, "descriptor: {bag}");
    }
}

#[tokio::test]
async fn formula_failures_render_empty_cells() {
    let bag = json!({
        "name": "orders",
        "columns": ["id", "amount"],
        "formulas": [
            { "name": "ratio", "label": "Ratio", "field_lists": ["amount"], "logic": "{amount} / 0" },
        ],
    });
    let ctx = ContextAdapter::new().adapt([("draw", "1")], &bag, vec![], None);

    let (legacy, pipeline) = both(&ctx, &orders()).await;
    assert_eq!(legacy, pipeline);
    assert!(pipeline.response.data.iter().all(|row| row.cell("ratio") == Some("")));
}
