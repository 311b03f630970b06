use crate::theme;
use anyhow::Result;
use clap::Parser;
use console::style;
use tabula::Inspector;

#[derive(Parser, Debug)]
pub struct ListCommand {
    /// Show at most this many artifacts
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

impl ListCommand {
    pub(crate) fn run(self, inspector: &Inspector) -> Result<()> {
        theme::heading("Parity Diagnostics");

        let paths = inspector.list();
        if paths.is_empty() {
            println!(
                "  {}",
                style(format!("No artifacts in {}", inspector.root().display()))
                    .magenta()
                    .dim()
            );
            println!();
            return Ok(());
        }

        for path in paths.iter().take(self.limit) {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            match Inspector::load(path) {
                Ok(diagnostic) => println!(
                    "  {:<10} {} {}",
                    theme::severity(diagnostic.severity),
                    style(name).bold(),
                    style(diagnostic.diff.note()).dim()
                ),
                Err(err) => println!(
                    "  {:<10} {} {}",
                    style("unreadable").magenta(),
                    style(name).bold(),
                    style(err).dim()
                ),
            }
        }

        println!();
        println!(
            "  {}",
            style(format!(
                "{} of {} artifact(s) shown",
                paths.len().min(self.limit),
                paths.len()
            ))
            .dim()
        );
        println!();

        Ok(())
    }
}
