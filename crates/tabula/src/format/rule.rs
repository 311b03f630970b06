use tabula_core::{Error, FormatKind, Result, Value};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::Write;

const DATETIME_INPUTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Applies a format rule to a non-empty cell value.
pub fn apply(kind: &FormatKind, value: &Value) -> Result<String> {
    match kind {
        FormatKind::Number {
            decimals,
            thousands_separator,
            decimal_point,
        } => Ok(number(
            numeric(value)?,
            *decimals,
            thousands_separator,
            decimal_point,
        )),
        // The value is already a percentage: `12.5` renders as `12.5%`.
        FormatKind::Percent { decimals } => {
            Ok(format!("{}%", number(numeric(value)?, *decimals, "", ".")))
        }
        FormatKind::Date { pattern } => date(value, pattern),
        FormatKind::Boolean { yes, no } => Ok(if truthy(value)? { yes } else { no }.clone()),
    }
}

fn numeric(value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        Error::expression_evaluation_failed(format!("`{value}` is not numeric"))
    })
}

fn number(value: f64, decimals: u8, thousands: &str, point: &str) -> String {
    let fixed = format!("{:.*}", usize::from(decimals), value.abs());
    let (int, frac) = match fixed.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    for (i, digit) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push_str(thousands);
        }
        out.push(digit);
    }
    if let Some(frac) = frac {
        out.push_str(point);
        out.push_str(frac);
    }
    out
}

fn date(value: &Value, pattern: &str) -> Result<String> {
    let src = value.render();
    let src = src.trim();

    let parsed = DateTime::parse_from_rfc3339(src)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            DATETIME_INPUTS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(src, fmt).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(src, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| Error::expression_evaluation_failed(format!("`{src}` is not a date")))?;

    // An invalid pattern surfaces as a formatting error rather than a panic.
    let mut out = String::new();
    write!(out, "{}", parsed.format(pattern)).map_err(|_| {
        Error::expression_evaluation_failed(format!("invalid date pattern `{pattern}`"))
    })?;
    Ok(out)
}

fn truthy(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(v) => Ok(*v),
        Value::String(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" => Ok(true),
            "false" | "no" | "n" | "off" => Ok(false),
            _ => Ok(numeric(value)? != 0.0),
        },
        other => Ok(numeric(other)? != 0.0),
    }
}
