use super::diff::{DiffReport, Severity};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How much divergence a CI gate accepts.
///
/// An unavailable pipeline is [`Severity::Critical`] and fails unless
/// `allow_unavailable` is set, whatever `max_severity` says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerance {
    pub max_severity: Severity,
    pub allow_unavailable: bool,
}

impl Tolerance {
    /// Accepts only clean runs.
    pub fn strict() -> Tolerance {
        Tolerance {
            max_severity: Severity::None,
            allow_unavailable: false,
        }
    }

    pub fn max_severity(mut self, severity: Severity) -> Tolerance {
        self.max_severity = severity;
        self
    }

    pub fn allow_unavailable(mut self, allow: bool) -> Tolerance {
        self.allow_unavailable = allow;
        self
    }

    pub fn permits(&self, report: &DiffReport) -> bool {
        if report.is_unavailable() {
            return self.allow_unavailable;
        }
        report.severity() <= self.max_severity
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::strict()
    }
}

/// One artifact the gate rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Artifact the report was read from, when it came from disk.
    pub path: Option<PathBuf>,
    pub severity: Severity,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    pub passed: bool,
    pub checked: usize,
    pub worst: Severity,
    pub findings: Vec<Finding>,
}

impl GateReport {
    /// Counts an artifact whose report could not be read. It cannot be shown
    /// to be clean, so it is judged like an unavailable pipeline.
    pub fn unreadable(
        &mut self,
        path: PathBuf,
        reason: impl std::fmt::Display,
        tolerance: &Tolerance,
    ) {
        self.checked += 1;
        self.worst = Severity::Critical;

        if !tolerance.allow_unavailable {
            self.findings.push(Finding {
                path: Some(path),
                severity: Severity::Critical,
                note: format!("unreadable: {reason}"),
            });
            self.passed = false;
        }
    }
}

/// Checks every report against `tolerance`.
pub fn gate<'a>(
    reports: impl IntoIterator<Item = (Option<PathBuf>, &'a DiffReport)>,
    tolerance: &Tolerance,
) -> GateReport {
    let mut checked = 0;
    let mut worst = Severity::None;
    let mut findings = vec![];

    for (path, report) in reports {
        checked += 1;
        let severity = report.severity();
        worst = worst.max(severity);

        if !tolerance.permits(report) {
            findings.push(Finding {
                path,
                severity,
                note: report.note(),
            });
        }
    }

    GateReport {
        passed: findings.is_empty(),
        checked,
        worst,
        findings,
    }
}
