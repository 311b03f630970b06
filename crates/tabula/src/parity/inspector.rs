//! Best-effort persistence of parity diagnostics.
//!
//! Every failure in this module is swallowed. Nothing here may affect the
//! response handed back to the caller.

use super::diff::{DiffReport, Severity};
use super::gate::{self, GateReport, Tolerance};
use super::redact::redact;
use super::Mode;
use crate::config::InspectorConfig;

use tabula_core::{CompilationContext, Diagnose, Error, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Subdirectory holding ad hoc dumps.
pub const DUMPS_DIR: &str = "dumps";

const ARTIFACT_EXTENSION: &str = "json";

/// Time spent in one compiler during a hybrid run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(stage: impl Into<String>, elapsed: Duration) -> StageTiming {
        StageTiming {
            stage: stage.into(),
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// One persisted comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParityDiagnostic {
    pub timestamp: DateTime<Utc>,
    pub route: String,
    pub table: String,
    pub mode: Mode,
    pub severity: Severity,
    pub diff: DiffReport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<StageTiming>>,
}

#[derive(Debug, Clone)]
pub struct Inspector {
    config: InspectorConfig,
}

impl Inspector {
    pub fn new(config: InspectorConfig) -> Inspector {
        Inspector { config }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.storage_path
    }

    fn dumps(&self) -> PathBuf {
        self.root().join(DUMPS_DIR)
    }

    /// Builds the diagnostic for one run, honouring the trace and request
    /// data switches.
    pub fn diagnostic(
        &self,
        ctx: &CompilationContext,
        mode: Mode,
        diff: &DiffReport,
        trace: Vec<StageTiming>,
    ) -> ParityDiagnostic {
        ParityDiagnostic {
            timestamp: Utc::now(),
            route: ctx.route_label(),
            table: ctx.table_name.clone().unwrap_or_default(),
            mode,
            severity: diff.severity(),
            diff: diff.clone(),
            request: self.config.include_request_data.then(|| ctx.diagnostics()),
            trace: self.config.include_trace.then_some(trace),
        }
    }

    /// Persists `diagnostic` without blocking the caller.
    ///
    /// Inside a tokio runtime the write happens on a blocking task whose
    /// handle is returned; outside one it happens inline.
    pub fn record(&self, diagnostic: ParityDiagnostic) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            return None;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inspector = self.clone();
                Some(handle.spawn_blocking(move || inspector.persist(&diagnostic)))
            }
            Err(_) => {
                self.persist(&diagnostic);
                None
            }
        }
    }

    fn persist(&self, diagnostic: &ParityDiagnostic) {
        match self.write(diagnostic) {
            Ok(Some(path)) => debug!(path = %path.display(), "parity diagnostic written"),
            Ok(None) => {}
            Err(err) => self.swallow("writing parity diagnostic", &err),
        }

        if self.artifacts(self.root()).len() > self.config.max_files {
            self.cleanup();
        }
    }

    /// Writes the artifact. `Ok(None)` means it was too large even after
    /// dropping the request data and trace.
    fn write(&self, diagnostic: &ParityDiagnostic) -> Result<Option<PathBuf>> {
        let mut bytes = self.encode(diagnostic)?;

        if bytes.len() as u64 > self.config.max_file_size {
            let slim = ParityDiagnostic {
                request: None,
                trace: None,
                ..diagnostic.clone()
            };
            bytes = self.encode(&slim)?;
        }

        if bytes.len() as u64 > self.config.max_file_size {
            debug!(
                size = bytes.len(),
                limit = self.config.max_file_size,
                "parity diagnostic too large; skipped"
            );
            return Ok(None);
        }

        let name = format!(
            "{}_{}_{}",
            sanitize(&diagnostic.table),
            sanitize(&diagnostic.route),
            stamp(diagnostic.timestamp)
        );
        self.create(self.root(), &name, &bytes).map(Some)
    }

    fn encode(&self, value: &impl Serialize) -> Result<Vec<u8>> {
        let mut value = serde_json::to_value(value)?;
        if self.config.exclude_sensitive {
            redact(&mut value);
        }
        Ok(serde_json::to_vec_pretty(&value)?)
    }

    /// Creates a new file; an existing file is never overwritten.
    fn create(&self, dir: &Path, stem: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{stem}.{ARTIFACT_EXTENSION}"));
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(bytes)?;
        Ok(path)
    }

    /// Writes an ad hoc dump of `value` under `dumps/`, with the same
    /// redaction as regular artifacts.
    pub fn dump(&self, label: &str, value: &impl Serialize) -> Option<PathBuf> {
        if !self.config.enabled {
            return None;
        }

        let written = self.encode(value).and_then(|bytes| {
            let stem = format!("{}_{}", sanitize(label), stamp(Utc::now()));
            self.create(&self.dumps(), &stem, &bytes)
        });

        match written {
            Ok(path) => Some(path),
            Err(err) => {
                self.swallow("writing dump", &err);
                None
            }
        }
    }

    /// Applies retention to the artifacts and the dumps: files older than
    /// `cleanup_days` go first, then the oldest beyond `max_files`.
    ///
    /// Returns the number of files removed.
    pub fn cleanup(&self) -> usize {
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(self.config.cleanup_days * 24 * 60 * 60))
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut removed = 0;
        for dir in [self.root().to_path_buf(), self.dumps()] {
            let mut artifacts = self.artifacts(&dir);
            artifacts.sort_by_key(|(_, modified)| *modified);

            let (expired, kept): (Vec<_>, Vec<_>) = artifacts
                .into_iter()
                .partition(|(_, modified)| *modified < cutoff);
            let excess = kept.len().saturating_sub(self.config.max_files);

            for (path, _) in expired.iter().chain(kept.iter().take(excess)) {
                match fs::remove_file(path) {
                    Ok(()) => removed += 1,
                    Err(err) => self.swallow("removing parity artifact", &Error::from(err)),
                }
            }
        }

        if removed > 0 {
            debug!(removed, root = %self.root().display(), "parity artifacts evicted");
        }
        removed
    }

    /// Artifact paths, newest first.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut artifacts = self.artifacts(self.root());
        artifacts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        artifacts.into_iter().map(|(path, _)| path).collect()
    }

    pub fn load(path: &Path) -> Result<ParityDiagnostic> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Runs the CI gate over every stored artifact. An artifact that cannot
    /// be read counts as critical.
    pub fn gate(&self, tolerance: &Tolerance) -> GateReport {
        let mut loaded = vec![];
        let mut unreadable = vec![];
        for path in self.list() {
            match Inspector::load(&path) {
                Ok(diagnostic) => loaded.push((path, diagnostic)),
                Err(err) => unreadable.push((path, err)),
            }
        }

        let mut report = gate::gate(
            loaded
                .iter()
                .map(|(path, diagnostic)| (Some(path.clone()), &diagnostic.diff)),
            tolerance,
        );
        for (path, err) in unreadable {
            warn!(path = %path.display(), error = %err, "unreadable parity artifact");
            report.unreadable(path, err, tolerance);
        }
        report
    }

    fn artifacts(&self, dir: &Path) -> Vec<(PathBuf, SystemTime)> {
        let Ok(entries) = fs::read_dir(dir) else {
            return vec![];
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().extension().and_then(|ext| ext.to_str()) == Some(ARTIFACT_EXTENSION)
            })
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                Some((entry.path(), metadata.modified().ok()?))
            })
            .collect()
    }

    fn swallow(&self, action: &str, err: &Error) {
        if self.config.debug {
            debug!(error = %err, root = %self.root().display(), "{action} failed");
        }
    }
}

/// Timestamp plus a random suffix, unique per call.
fn stamp(at: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        at.format("%Y%m%d%H%M%S%3f"),
        &Uuid::new_v4().simple().to_string()[..12]
    )
}

/// Keeps a name safe for use as a file name component.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '-' || c == '.');

    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned.chars().take(64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tabula_core::{RouteContext, TableDescriptor};

    fn inspector(dir: &Path) -> Inspector {
        Inspector::new(InspectorConfig::default().enabled(true).storage_path(dir))
    }

    fn ctx() -> CompilationContext {
        let mut ctx = CompilationContext::new("users", TableDescriptor::new("users"))
            .route(RouteContext::default().route_name("admin.users.index"));
        ctx.request.insert("session_id".into(), "s3cr3t".into());
        ctx.request.insert("draw".into(), "3".into());
        ctx
    }

    #[test]
    fn writes_redacted_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = inspector(dir.path());

        let diagnostic = inspector.diagnostic(&ctx(), Mode::Hybrid, &DiffReport::PipelineUnavailable, vec![]);
        assert!(inspector.record(diagnostic).is_none());

        let paths = inspector.list();
        assert_eq!(paths.len(), 1);
        let name = paths[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("users_admin.users.index_"), "{name}");

        let loaded = Inspector::load(&paths[0]).unwrap();
        assert_eq!(loaded.severity, Severity::Critical);
        assert_eq!(loaded.diff, DiffReport::PipelineUnavailable);

        let request = loaded.request.unwrap();
        assert_eq!(request["request"]["session_id"], json!("[REDACTED]"));
        assert_eq!(request["request"]["draw"], json!("3"));
        assert!(loaded.trace.is_none());
    }

    #[test]
    fn oversized_artifact_drops_request_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let config = InspectorConfig::default()
            .enabled(true)
            .storage_path(dir.path())
            .include_trace(true)
            .max_file_size(400);
        let inspector = Inspector::new(config);

        let diagnostic = inspector.diagnostic(
            &ctx(),
            Mode::Hybrid,
            &DiffReport::PipelineUnavailable,
            vec![StageTiming::new("legacy", Duration::from_millis(3))],
        );
        inspector.record(diagnostic);

        let paths = inspector.list();
        assert_eq!(paths.len(), 1);
        let loaded = Inspector::load(&paths[0]).unwrap();
        assert!(loaded.request.is_none());
        assert!(loaded.trace.is_none());

        let tiny = Inspector::new(inspector.config().clone().max_file_size(10));
        let diagnostic = tiny.diagnostic(&ctx(), Mode::Hybrid, &DiffReport::PipelineUnavailable, vec![]);
        tiny.record(diagnostic);
        assert_eq!(tiny.list().len(), 1);
    }

    #[test]
    fn unwritable_root_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, b"not a directory").unwrap();

        let inspector = inspector(&file.join("nested"));
        let diagnostic = inspector.diagnostic(&ctx(), Mode::Hybrid, &DiffReport::PipelineUnavailable, vec![]);
        inspector.record(diagnostic);
        assert!(inspector.list().is_empty());
        assert!(inspector.dump("state", &json!({ "a": 1 })).is_none());
    }

    #[test]
    fn cleanup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = Inspector::new(
            InspectorConfig::default()
                .enabled(true)
                .storage_path(dir.path())
                .max_files(2),
        );

        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            let path = dir.path().join(format!("{name}.json"));
            fs::write(&path, b"{}").unwrap();
            let modified = SystemTime::now() - Duration::from_secs(600 - i as u64 * 60);
            fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(modified)
                .unwrap();
        }

        assert_eq!(inspector.cleanup(), 2);
        let names: Vec<String> = inspector
            .list()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["d.json", "c.json"]);
    }

    #[test]
    fn cleanup_evicts_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = Inspector::new(
            InspectorConfig::default()
                .enabled(true)
                .storage_path(dir.path())
                .cleanup_days(1),
        );

        let old = dir.path().join("old.json");
        fs::write(&old, b"{}").unwrap();
        fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3 * 24 * 60 * 60))
            .unwrap();
        fs::write(dir.path().join("fresh.json"), b"{}").unwrap();

        assert_eq!(inspector.cleanup(), 1);
        assert!(!old.exists());
    }

    #[test]
    fn dumps_are_redacted_and_separate() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = inspector(dir.path());

        let path = inspector
            .dump("grid state", &json!({ "api_key": "k", "rows": 3 }))
            .unwrap();
        assert_eq!(path.parent().unwrap(), dir.path().join(DUMPS_DIR));
        assert!(inspector.list().is_empty());

        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, json!({ "api_key": "[REDACTED]", "rows": 3 }));
    }

    #[test]
    fn disabled_inspector_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = Inspector::new(
            InspectorConfig::default()
                .enabled(false)
                .storage_path(dir.path()),
        );
        let diagnostic = inspector.diagnostic(&ctx(), Mode::Hybrid, &DiffReport::PipelineUnavailable, vec![]);
        assert!(inspector.record(diagnostic).is_none());
        assert!(inspector.list().is_empty());
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize("admin/users/index"), "admin-users-index");
        assert_eq!(sanitize(""), "unknown");
        assert_eq!(sanitize("../etc"), "etc");
        assert_eq!(sanitize("order_items"), "order_items");
        assert_eq!(sanitize("admin/order_items/index"), "admin-order_items-index");
    }

    #[test]
    fn artifact_name_keeps_table_underscores() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = inspector(dir.path());

        let mut ctx = ctx();
        ctx.table_name = Some("order_items".to_string());
        let diagnostic = inspector.diagnostic(&ctx, Mode::Hybrid, &DiffReport::PipelineUnavailable, vec![]);
        assert!(inspector.record(diagnostic).is_none());

        let paths = inspector.list();
        let name = paths[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("order_items_admin.users.index_"), "{name}");
    }
}
