use serde::{Deserialize, Serialize};

/// Type-specific formatting for one field's cells.
///
/// A rule only applies when `field` equals the column's declared field and the
/// cell holds a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRule {
    pub field: String,

    #[serde(flatten)]
    pub kind: FormatKind,
}

impl FormatRule {
    pub fn number(field: impl Into<String>, decimals: u8) -> FormatRule {
        FormatRule {
            field: field.into(),
            kind: FormatKind::Number {
                decimals,
                thousands_separator: ",".to_string(),
                decimal_point: ".".to_string(),
            },
        }
    }

    pub fn date(field: impl Into<String>, pattern: impl Into<String>) -> FormatRule {
        FormatRule {
            field: field.into(),
            kind: FormatKind::Date {
                pattern: pattern.into(),
            },
        }
    }

    pub fn separators(mut self, thousands: &str, point: &str) -> FormatRule {
        if let FormatKind::Number {
            thousands_separator,
            decimal_point,
            ..
        } = &mut self.kind
        {
            *thousands_separator = thousands.to_string();
            *decimal_point = point.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormatKind {
    Number {
        #[serde(default)]
        decimals: u8,
        #[serde(default = "default_thousands")]
        thousands_separator: String,
        #[serde(default = "default_point")]
        decimal_point: String,
    },
    Percent {
        #[serde(default)]
        decimals: u8,
    },
    Date {
        pattern: String,
    },
    Boolean {
        yes: String,
        no: String,
    },
}

fn default_thousands() -> String {
    ",".to_string()
}

fn default_point() -> String {
    ".".to_string()
}
