use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tabula::Inspector;

#[derive(Parser, Debug)]
pub struct ShowCommand {
    /// Artifact path, or a file name inside the storage directory
    file: PathBuf,
}

impl ShowCommand {
    pub(crate) fn run(self, inspector: &Inspector) -> Result<()> {
        let path = if self.file.is_file() {
            self.file
        } else {
            inspector.root().join(&self.file)
        };

        let diagnostic = Inspector::load(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        println!("{}", serde_json::to_string_pretty(&diagnostic)?);

        Ok(())
    }
}
