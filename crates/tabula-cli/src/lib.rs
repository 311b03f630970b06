mod compile;
mod inspect;
mod theme;

pub use compile::CompileCommand;
pub use inspect::InspectCommand;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tabula::Config;

/// Tabula CLI library for building custom command-line tools
pub struct TabulaCli {
    config: Config,
}

impl TabulaCli {
    /// Create a new TabulaCli instance with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create a new TabulaCli instance with a custom configuration
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse and execute CLI commands from command-line arguments
    pub async fn parse_and_run(&self) -> Result<()> {
        let cli = Cli::parse();
        self.run(cli).await
    }

    /// Parse and execute CLI commands from an iterator of arguments
    pub async fn parse_from<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::parse_from(args);
        self.run(cli).await
    }

    async fn run(&self, cli: Cli) -> Result<()> {
        // An explicit --config replaces the configuration given at construction.
        let config = match &cli.config {
            Some(path) => Config::load(Some(path))?,
            None => self.config.clone(),
        };

        match cli.command {
            Command::Inspect(cmd) => cmd.run(&config),
            Command::Compile(cmd) => cmd.run(&config).await,
        }
    }
}

impl Default for TabulaCli {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(about = "Tabula CLI - Table compiler parity and diagnostics tool")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to tabula.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Inspect stored parity diagnostics
    Inspect(InspectCommand),

    /// Compile a descriptor against a JSON fixture
    Compile(CompileCommand),
}
