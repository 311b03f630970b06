use console::{style, StyledObject};
use tabula::Severity;

/// Severity label colored by how bad it is.
pub fn severity(severity: Severity) -> StyledObject<&'static str> {
    let label = style(severity.as_str());
    match severity {
        Severity::None => label.green(),
        Severity::Minor => label.yellow(),
        Severity::Major => label.red(),
        Severity::Critical => label.red().bold(),
    }
}

pub fn heading(title: &str) {
    println!();
    println!("  {}", style(title).cyan().bold().underlined());
    println!();
}
