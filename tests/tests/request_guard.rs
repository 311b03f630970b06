use std::sync::Arc;
use tabula::RequestGuard;
use tabula_core::{Error, Result};
use tests::prelude::*;

/// Rejects search terms carrying markup.
#[derive(Debug)]
struct RejectMarkup;

impl RequestGuard for RejectMarkup {
    fn check(&self, ctx: &CompilationContext) -> Result<()> {
        match &ctx.paging.search_term {
            Some(term) if term.to_ascii_lowercase().contains("<script") => {
                Err(Error::security_violation("script tag in search term"))
            }
            _ => Ok(()),
        }
    }
}

#[tokio::test]
async fn violation_short_circuits_every_mode() {
    for mode in [Mode::Legacy, Mode::Hybrid, Mode::Refactored] {
        let dir = tempfile::tempdir().unwrap();
        let harness = ParityHarness::new(&parity(mode, dir.path())).guard(Arc::new(RejectMarkup));
        let source = RecordingSource::new(orders());

        let ctx = orders_context(&[("search[value]", "<SCRIPT>alert(1)</script>")]);
        let err = harness.run(&ctx, &source).await.unwrap_err();

        assert!(err.is_security_violation(), "{mode}: {err}");
        assert!(source.queries().is_empty(), "{mode}: compiler ran");
        assert!(harness.inspector().unwrap().list().is_empty());
    }
}

#[tokio::test]
async fn clean_requests_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let harness =
        ParityHarness::new(&parity(Mode::Legacy, dir.path())).guard(Arc::new(RejectMarkup));
    let source = RecordingSource::new(orders());

    let outcome = harness
        .run(&orders_context(&[("search[value]", "ada")]), &source)
        .await
        .unwrap();

    assert_eq!(outcome.result.response.records_filtered, 1);
    assert_eq!(source.queries().len(), 1);
}
