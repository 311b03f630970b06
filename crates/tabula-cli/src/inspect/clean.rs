use anyhow::Result;
use clap::Parser;
use console::style;
use tabula::Inspector;

#[derive(Parser, Debug)]
pub struct CleanCommand {}

impl CleanCommand {
    pub(crate) fn run(self, inspector: &Inspector) -> Result<()> {
        let config = inspector.config();
        println!(
            "  {} Evicting artifacts older than {} day(s), keeping at most {}",
            style("→").cyan(),
            config.cleanup_days,
            config.max_files
        );

        let removed = inspector.cleanup();

        println!(
            "  {} {}",
            style("✓").green().bold(),
            style(format!("Removed {removed} artifact(s)")).dim()
        );
        Ok(())
    }
}
