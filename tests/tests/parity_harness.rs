use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tabula_core::{async_trait, Error, Result};
use tests::prelude::*;

/// Reports one more record than the rows it was given.
#[derive(Debug)]
struct Drifting(Pipeline);

#[async_trait]
impl Compiler for Drifting {
    fn name(&self) -> &'static str {
        "drifting"
    }

    async fn compile(
        &self,
        ctx: &CompilationContext,
        source: &dyn DataSource,
    ) -> Result<CompiledTable> {
        let mut compiled = self.0.compile(ctx, source).await?;
        compiled.response.records_total += 1;
        Ok(compiled)
    }
}

#[derive(Debug)]
struct Unreachable;

#[async_trait]
impl Compiler for Unreachable {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn compile(&self, _: &CompilationContext, _: &dyn DataSource) -> Result<CompiledTable> {
        Err(Error::data_source("connection reset by peer"))
    }
}

async fn settle(outcome: &mut tabula::Outcome) {
    if let Some(handle) = outcome.diagnostics.take() {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn hybrid_returns_legacy_and_records_no_diff() {
    let dir = tempfile::tempdir().unwrap();
    let harness = ParityHarness::new(&parity(Mode::Hybrid, dir.path()));
    let ctx = orders_context(&[("draw", "9"), ("password", "hunter2")]);

    let mut outcome = harness.run(&ctx, &orders()).await.unwrap();
    settle(&mut outcome).await;

    let legacy = LegacyCompiler::default().compile(&ctx, &orders()).await.unwrap();
    assert_eq!(outcome.result, legacy);
    assert_eq!(outcome.mode, Mode::Hybrid);

    let diff = outcome.diff.unwrap();
    assert!(diff.is_clean());
    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(json["note"], "no_diff");
    assert_eq!(json["summary"]["legacy"]["recordsTotal"], 3);

    let inspector = harness.inspector().unwrap();
    let paths = inspector.list();
    assert_eq!(paths.len(), 1);

    let name = paths[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("orders_admin.orders.index_"), "{name}");

    let artifact: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&paths[0]).unwrap()).unwrap();
    assert_eq!(artifact["table"], "orders");
    assert_eq!(artifact["route"], "admin.orders.index");
    assert_eq!(artifact["severity"], "none");
    assert_eq!(artifact["request"]["request"]["password"], "[REDACTED]");
    assert_eq!(artifact["request"]["request"]["draw"], "9");
}

#[tokio::test]
async fn hybrid_reports_count_drift() {
    let dir = tempfile::tempdir().unwrap();
    let harness = ParityHarness::new(&parity(Mode::Hybrid, dir.path()))
        .pipeline(Arc::new(Drifting(Pipeline::default())));

    let mut outcome = harness.run(&orders_context(&[]), &orders()).await.unwrap();
    settle(&mut outcome).await;

    // The caller still receives the legacy counts.
    assert_eq!(outcome.result.response.records_total, 3);

    let diff = outcome.diff.unwrap();
    assert_eq!(diff.severity(), Severity::Major);
    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(json["recordsTotal"], json!({ "legacy": 3, "pipeline": 4 }));
    assert!(json.get("recordsFiltered").is_none());
    assert!(json.get("draw").is_none());
    assert!(json.get("data").is_none());
    assert!(json.get("summary").is_some());

    let report = harness.inspector().unwrap().gate(&Tolerance::strict());
    assert!(!report.passed);
    assert_eq!(report.worst, Severity::Major);

    let tolerant = Tolerance::strict().max_severity(Severity::Major);
    assert!(harness.inspector().unwrap().gate(&tolerant).passed);
}

#[tokio::test]
async fn hybrid_survives_an_unreachable_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let harness =
        ParityHarness::new(&parity(Mode::Hybrid, dir.path())).pipeline(Arc::new(Unreachable));

    let mut outcome = harness.run(&orders_context(&[]), &orders()).await.unwrap();
    settle(&mut outcome).await;

    assert_eq!(outcome.result.response.data.len(), 3);
    let diff = outcome.diff.unwrap();
    assert_eq!(
        serde_json::to_value(&diff).unwrap(),
        json!({ "note": "pipeline_output_unavailable" })
    );

    // Unavailable output is never tolerated by default.
    let inspector = harness.inspector().unwrap();
    let everything = Tolerance::strict().max_severity(Severity::Critical);
    let report = inspector.gate(&everything);
    assert!(!report.passed);
    assert_eq!(report.findings[0].severity, Severity::Critical);
    assert!(inspector.gate(&everything.allow_unavailable(true)).passed);
}

#[tokio::test]
async fn refactored_runs_only_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let harness = ParityHarness::new(&parity(Mode::Refactored, dir.path()))
        .legacy(Arc::new(Unreachable));

    let outcome = harness.run(&orders_context(&[]), &orders()).await.unwrap();
    assert_eq!(outcome.mode, Mode::Refactored);
    assert_eq!(outcome.diff, None);
    assert!(outcome.diagnostics.is_none());
    assert_eq!(outcome.result.response.records_total, 3);
    assert!(harness.inspector().unwrap().list().is_empty());
}

#[tokio::test]
async fn kill_switch_runs_legacy_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = parity(Mode::Hybrid, dir.path());
    config.pipeline_enabled = false;

    let harness = ParityHarness::new(&config).pipeline(Arc::new(Unreachable));
    assert_eq!(harness.mode(), Mode::Legacy);

    let outcome = harness.run(&orders_context(&[]), &orders()).await.unwrap();
    assert_eq!(outcome.mode, Mode::Legacy);
    assert_eq!(outcome.diff, None);
    assert!(harness.inspector().unwrap().list().is_empty());
}

#[tokio::test]
async fn legacy_failure_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let harness =
        ParityHarness::new(&parity(Mode::Hybrid, dir.path())).legacy(Arc::new(Unreachable));

    let err = harness.run(&orders_context(&[]), &orders()).await.unwrap_err();
    assert!(err.is_data_source());
}
