//! Runs the legacy and modular compilers side by side.
//!
//! In [`Mode::Hybrid`] both compilers run, one after the other, and the
//! caller always receives the legacy result. The modular result is only
//! compared against it, and the comparison is persisted by the
//! [`Inspector`] for later review.

pub mod diff;
pub use diff::{DiffReport, Severity};

pub mod gate;
pub use gate::{GateReport, Tolerance};

pub mod inspector;
pub use inspector::{Inspector, ParityDiagnostic, StageTiming};

pub mod redact;

use crate::config::ParityConfig;
use crate::guard::{AllowAll, RequestGuard};
use crate::legacy::LegacyCompiler;
use crate::pipeline::{Compiler, Pipeline};

use tabula_core::{err, CompilationContext, CompiledTable, DataSource, Error, Result};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Which compiler produces the response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Only the monolithic compiler runs.
    #[default]
    Legacy,

    /// Both run; the legacy result is returned and the pipeline result is
    /// only diffed.
    Hybrid,

    /// Only the modular pipeline runs.
    Refactored,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Legacy => "legacy",
            Mode::Hybrid => "hybrid",
            Mode::Refactored => "refactored",
        }
    }

    /// The mode actually used once the kill switch is applied.
    pub fn effective(self, pipeline_enabled: bool) -> Mode {
        if pipeline_enabled {
            self
        } else {
            Mode::Legacy
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Mode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Mode::Legacy),
            "hybrid" => Ok(Mode::Hybrid),
            "refactored" => Ok(Mode::Refactored),
            other => Err(err!("unknown parity mode `{other}`")),
        }
    }
}

/// Result of one harness run.
#[derive(Debug)]
pub struct Outcome {
    /// The response to hand back to the caller.
    pub result: CompiledTable,

    /// Mode the run executed in, after the kill switch.
    pub mode: Mode,

    /// Present for hybrid runs only.
    pub diff: Option<DiffReport>,

    /// Handle of the background diagnostic write, if one was spawned.
    /// Dropping it does not cancel the write.
    pub diagnostics: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone)]
pub struct ParityHarness {
    mode: Mode,
    legacy: Arc<dyn Compiler>,
    pipeline: Arc<dyn Compiler>,
    inspector: Option<Inspector>,
    guard: Arc<dyn RequestGuard>,
}

impl ParityHarness {
    /// Builds a harness with the stock compilers and a guard that accepts
    /// every request.
    pub fn new(config: &ParityConfig) -> ParityHarness {
        let mode = config.mode.effective(config.pipeline_enabled);
        if mode != config.mode {
            warn!(
                configured = %config.mode,
                "pipeline disabled; running in legacy mode"
            );
        }

        ParityHarness {
            mode,
            legacy: Arc::new(LegacyCompiler::default()),
            pipeline: Arc::new(Pipeline::default()),
            inspector: config
                .inspector
                .enabled
                .then(|| Inspector::new(config.inspector.clone())),
            guard: Arc::new(AllowAll),
        }
    }

    pub fn legacy(mut self, compiler: Arc<dyn Compiler>) -> ParityHarness {
        self.legacy = compiler;
        self
    }

    pub fn pipeline(mut self, compiler: Arc<dyn Compiler>) -> ParityHarness {
        self.pipeline = compiler;
        self
    }

    pub fn guard(mut self, guard: Arc<dyn RequestGuard>) -> ParityHarness {
        self.guard = guard;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn inspector(&self) -> Option<&Inspector> {
        self.inspector.as_ref()
    }

    /// Compiles `ctx` according to the harness mode.
    ///
    /// The request guard runs first; a rejection is returned before either
    /// compiler is invoked. In hybrid mode a failing pipeline never fails the
    /// run, but a failing legacy compiler does.
    pub async fn run(&self, ctx: &CompilationContext, source: &dyn DataSource) -> Result<Outcome> {
        self.guard.check(ctx)?;

        match self.mode {
            Mode::Legacy => self.run_single(&*self.legacy, ctx, source).await,
            Mode::Refactored => self.run_single(&*self.pipeline, ctx, source).await,
            Mode::Hybrid => self.run_hybrid(ctx, source).await,
        }
    }

    async fn run_single(
        &self,
        compiler: &dyn Compiler,
        ctx: &CompilationContext,
        source: &dyn DataSource,
    ) -> Result<Outcome> {
        let result = compiler.compile(ctx, source).await?;
        Ok(Outcome {
            result,
            mode: self.mode,
            diff: None,
            diagnostics: None,
        })
    }

    async fn run_hybrid(
        &self,
        ctx: &CompilationContext,
        source: &dyn DataSource,
    ) -> Result<Outcome> {
        let mut trace = vec![];

        let started = Instant::now();
        let legacy = self.legacy.compile(ctx, source).await?;
        trace.push(StageTiming::new(self.legacy.name(), started.elapsed()));

        let started = Instant::now();
        let pipeline = match self.pipeline.compile(ctx, source).await {
            Ok(compiled) => Some(compiled),
            Err(cause) => {
                let err = cause.context(Error::pipeline_failed(self.pipeline.name()));
                warn!(table = ?ctx.table_name, error = %err, "diff unavailable");
                None
            }
        };
        trace.push(StageTiming::new(self.pipeline.name(), started.elapsed()));

        let diff = DiffReport::compare(&legacy.response, pipeline.as_ref().map(|p| &p.response));
        if !diff.is_clean() {
            info!(
                table = ?ctx.table_name,
                route = %ctx.route_label(),
                severity = %diff.severity(),
                "parity {}",
                diff.note()
            );
        }

        let diagnostics = self.inspector.as_ref().and_then(|inspector| {
            inspector.record(inspector.diagnostic(ctx, Mode::Hybrid, &diff, trace))
        });

        Ok(Outcome {
            result: legacy,
            mode: Mode::Hybrid,
            diff: Some(diff),
            diagnostics,
        })
    }
}
