mod clean;
mod gate;
mod list;
mod show;

pub use clean::CleanCommand;
pub use gate::GateCommand;
pub use list::ListCommand;
pub use show::ShowCommand;

use anyhow::Result;
use clap::Parser;
use tabula::{Config, Inspector};

#[derive(Parser, Debug)]
pub struct InspectCommand {
    #[command(subcommand)]
    subcommand: InspectSubcommand,
}

#[derive(Parser, Debug)]
enum InspectSubcommand {
    /// List stored artifacts, newest first
    List(ListCommand),

    /// Pretty-print one artifact
    Show(ShowCommand),

    /// Apply the retention policy now
    Clean(CleanCommand),

    /// Fail when stored diffs exceed a tolerance
    Gate(GateCommand),
}

impl InspectCommand {
    pub(crate) fn run(self, config: &Config) -> Result<()> {
        // Reading the store does not depend on whether recording is enabled.
        let inspector = Inspector::new(config.parity.inspector.clone().enabled(true));

        match self.subcommand {
            InspectSubcommand::List(cmd) => cmd.run(&inspector),
            InspectSubcommand::Show(cmd) => cmd.run(&inspector),
            InspectSubcommand::Clean(cmd) => cmd.run(&inspector),
            InspectSubcommand::Gate(cmd) => cmd.run(&inspector),
        }
    }
}
