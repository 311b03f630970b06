use crate::theme;
use anyhow::{bail, Result};
use clap::Parser;
use console::style;
use tabula::{Inspector, Severity, Tolerance};

#[derive(Parser, Debug)]
pub struct GateCommand {
    /// Highest severity that still passes (none, minor, major, critical)
    #[arg(long, default_value = "none", value_parser = parse_severity)]
    max_severity: Severity,

    /// Accept runs where the pipeline produced no output
    #[arg(long)]
    allow_unavailable: bool,
}

fn parse_severity(src: &str) -> std::result::Result<Severity, String> {
    src.parse().map_err(|err: tabula::Error| err.to_string())
}

impl GateCommand {
    pub(crate) fn run(self, inspector: &Inspector) -> Result<()> {
        let tolerance = Tolerance::strict()
            .max_severity(self.max_severity)
            .allow_unavailable(self.allow_unavailable);
        let report = inspector.gate(&tolerance);

        for finding in &report.findings {
            let name = finding
                .path
                .as_ref()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(
                "  {} {:<10} {} {}",
                style("✖").red().bold(),
                theme::severity(finding.severity),
                style(name).bold(),
                style(&finding.note).dim()
            );
        }

        if !report.passed {
            bail!(
                "parity gate failed: {} of {} artifact(s) exceed `{}`",
                report.findings.len(),
                report.checked,
                self.max_severity
            );
        }

        println!(
            "  {} {}",
            style("✓").green().bold(),
            style(format!(
                "{} artifact(s) within tolerance (worst: {})",
                report.checked, report.worst
            ))
            .dim()
        );
        Ok(())
    }
}
