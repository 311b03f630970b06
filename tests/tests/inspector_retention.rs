use pretty_assertions::assert_eq;
use serde_json::json;
use tabula::{Config, InspectorConfig};
use tests::prelude::*;

#[tokio::test]
async fn retention_caps_artifact_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new()
        .mode(Mode::Hybrid)
        .pipeline_enabled(true)
        .inspector(
            InspectorConfig::default()
                .enabled(true)
                .storage_path(dir.path())
                .max_files(2),
        );
    let harness = ParityHarness::new(&config.parity);

    for draw in 1..=5 {
        let draw = draw.to_string();
        let mut outcome = harness
            .run(&orders_context(&[("draw", draw.as_str())]), &orders())
            .await
            .unwrap();
        outcome.diagnostics.take().unwrap().await.unwrap();
    }

    assert_eq!(harness.inspector().unwrap().list().len(), 2);
}

#[tokio::test]
async fn dumps_share_redaction_but_not_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    let harness = ParityHarness::new(&parity(Mode::Hybrid, dir.path()));
    let inspector = harness.inspector().unwrap();

    let path = inspector
        .dump(
            "orders/state",
            &json!({ "descriptor": orders_descriptor(), "session": { "token": "t" } }),
        )
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(written["session"], "[REDACTED]");
    assert_eq!(written["descriptor"]["name"], "orders");

    let report = inspector.gate(&Tolerance::strict());
    assert!(report.passed);
    assert_eq!(report.checked, 0);
}

#[tokio::test]
async fn trace_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = parity(Mode::Hybrid, dir.path());
    config.inspector = config.inspector.include_trace(true).include_request_data(false);
    let harness = ParityHarness::new(&config);

    let mut outcome = harness.run(&orders_context(&[]), &orders()).await.unwrap();
    outcome.diagnostics.take().unwrap().await.unwrap();

    let inspector = harness.inspector().unwrap();
    let diagnostic = Inspector::load(&inspector.list()[0]).unwrap();
    let trace = diagnostic.trace.unwrap();
    let stages: Vec<&str> = trace.iter().map(|t| t.stage.as_str()).collect();
    assert_eq!(stages, vec!["legacy", "pipeline"]);
    assert!(diagnostic.request.is_none());
}

#[tokio::test]
async fn truncated_artifact_fails_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    let harness = ParityHarness::new(&parity(Mode::Hybrid, dir.path()));

    let mut outcome = harness.run(&orders_context(&[]), &orders()).await.unwrap();
    outcome.diagnostics.take().unwrap().await.unwrap();

    let inspector = harness.inspector().unwrap();
    assert!(inspector.gate(&Tolerance::strict()).passed);

    std::fs::write(
        dir.path().join("orders_admin.orders.index_truncated.json"),
        br#"{ "diff": { "note": "pipeline_output_unav"#,
    )
    .unwrap();

    let report = inspector.gate(&Tolerance::strict());
    assert!(!report.passed);
    assert_eq!(report.checked, 2);
    assert_eq!(report.worst, Severity::Critical);
    assert_eq!(report.findings.len(), 1);
    assert!(report.findings[0].note.starts_with("unreadable: "));

    assert!(inspector.gate(&Tolerance::strict().allow_unavailable(true)).passed);
}
