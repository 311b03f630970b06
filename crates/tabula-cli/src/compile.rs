use crate::theme;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use tabula::{Config, ContextAdapter, MemSource, Mode, ParityHarness};
use tabula_core::RouteContext;

#[derive(Parser, Debug)]
pub struct CompileCommand {
    /// Descriptor JSON
    #[arg(long)]
    descriptor: PathBuf,

    /// Fixture JSON: `{"tables": {"<name>": {"rows": [..]}}}`
    #[arg(long)]
    fixture: PathBuf,

    /// Request parameter, repeatable (`--param start=0 --param search[value]=ada`)
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Override the configured mode. Implies the pipeline is enabled.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<Mode>,

    /// Route name used for action URLs and diagnostics
    #[arg(long)]
    route: Option<String>,
}

fn parse_param(src: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = src
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{src}`"))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_mode(src: &str) -> std::result::Result<Mode, String> {
    src.parse().map_err(|err: tabula::Error| err.to_string())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let src = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&src).with_context(|| format!("invalid JSON in {}", path.display()))
}

impl CompileCommand {
    pub(crate) async fn run(self, config: &Config) -> Result<()> {
        let mut config = config.clone();
        if let Some(mode) = self.mode {
            config = config.mode(mode).pipeline_enabled(true);
        }

        let descriptor = read_json(&self.descriptor)?;
        let source = MemSource::from_json(read_json(&self.fixture)?)?;

        let mut ctx = ContextAdapter::new().adapt(self.params, &descriptor, vec![], None);
        if let Some(route) = self.route {
            ctx = ctx.route(RouteContext::default().route_name(route));
        }

        let harness = ParityHarness::new(&config.parity);
        let outcome = harness.run(&ctx, &source).await?;

        println!("{}", serde_json::to_string_pretty(&outcome.result.response)?);

        if let Some(diff) = &outcome.diff {
            theme::heading("Parity");
            println!(
                "  {} {} {}",
                style("→").cyan(),
                theme::severity(diff.severity()),
                style(diff.note()).dim()
            );
            println!("{}", serde_json::to_string_pretty(diff)?);
        }

        if let Some(handle) = outcome.diagnostics {
            handle
                .await
                .map_err(|err| anyhow!("diagnostic write did not finish: {err}"))?;
        }

        Ok(())
    }
}
