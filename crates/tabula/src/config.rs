//! Harness configuration.
//!
//! Values come from a TOML file first, then from `TABULA_*` environment
//! variables, then from built-in defaults.

use crate::parity::Mode;

use tabula_core::{err, Result};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File read by [`Config::load`] when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tabula.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub environment: Environment,
    pub parity: ParityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParityConfig {
    pub mode: Mode,

    /// Kill switch. When `false`, every mode runs as [`Mode::Legacy`].
    pub pipeline_enabled: bool,

    pub inspector: InspectorConfig,
}

/// Diagnostic artifact storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectorConfig {
    pub enabled: bool,
    pub storage_path: PathBuf,
    pub max_files: usize,
    pub cleanup_days: u64,

    /// Upper bound in bytes for one serialized artifact.
    pub max_file_size: u64,

    pub include_trace: bool,
    pub include_request_data: bool,
    pub exclude_sensitive: bool,

    /// Log swallowed diagnostic I/O failures.
    pub debug: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Testing,
    #[default]
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = tabula_core::Error;

    fn from_str(s: &str) -> Result<Environment> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" | "development" => Ok(Environment::Local),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" | "staging" => Ok(Environment::Production),
            other => Err(err!("unknown environment `{other}`")),
        }
    }
}

impl Config {
    /// Built-in defaults, ignoring the environment.
    pub fn new() -> Config {
        Config::resolve(RawConfig::default(), |_| None)
    }

    /// Reads `path`, or `tabula.toml` in the working directory when `path` is
    /// `None` and that file exists, layered over the process environment.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let raw = match path {
            Some(path) => read(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => read(Path::new(DEFAULT_CONFIG_FILE))?,
            None => RawConfig::default(),
        };
        Ok(Config::resolve(raw, |key| std::env::var(key).ok()))
    }

    /// Parses TOML, layered over the process environment.
    pub fn from_toml(src: &str) -> Result<Config> {
        let raw = toml::from_str(src).map_err(|e| err!("invalid configuration: {e}"))?;
        Ok(Config::resolve(raw, |key| std::env::var(key).ok()))
    }

    /// Resolves `raw` against an environment lookup.
    pub fn resolve(raw: RawConfig, env: impl Fn(&str) -> Option<String>) -> Config {
        let var = |keys: &[&str]| keys.iter().find_map(|key| env(*key));
        let flag = |keys: &[&str]| var(keys).and_then(|v| parse_bool(&v));

        let environment = raw
            .environment
            .or_else(|| var(&["TABULA_ENV", "APP_ENV"]).and_then(|v| v.parse().ok()))
            .unwrap_or_default();

        let parity = raw.parity.unwrap_or_default();
        let mode = parity
            .mode
            .or_else(|| var(&["TABULA_MODE"]).and_then(|v| v.parse().ok()))
            .unwrap_or_default();
        let pipeline_enabled = parity
            .pipeline_enabled
            .or_else(|| flag(&["TABULA_PIPELINE_ENABLED"]))
            .unwrap_or(false);

        let inspector = parity.inspector.unwrap_or_default();
        let defaults = InspectorConfig::defaults_for(environment, mode);
        let inspector = InspectorConfig {
            enabled: inspector
                .enabled
                .or_else(|| flag(&["TABULA_INSPECTOR_ENABLED"]))
                .unwrap_or(defaults.enabled),
            storage_path: inspector
                .storage_path
                .or_else(|| var(&["TABULA_INSPECTOR_STORAGE_PATH"]).map(PathBuf::from))
                .unwrap_or(defaults.storage_path),
            max_files: inspector
                .max_files
                .or_else(|| var(&["TABULA_INSPECTOR_MAX_FILES"]).and_then(|v| v.parse().ok()))
                .unwrap_or(defaults.max_files),
            cleanup_days: inspector
                .cleanup_days
                .or_else(|| var(&["TABULA_INSPECTOR_CLEANUP_DAYS"]).and_then(|v| v.parse().ok()))
                .unwrap_or(defaults.cleanup_days),
            max_file_size: inspector
                .max_file_size
                .or_else(|| var(&["TABULA_INSPECTOR_MAX_FILE_SIZE"]).and_then(|v| v.parse().ok()))
                .unwrap_or(defaults.max_file_size),
            include_trace: inspector
                .include_trace
                .or_else(|| flag(&["TABULA_INSPECTOR_INCLUDE_TRACE"]))
                .unwrap_or(defaults.include_trace),
            include_request_data: inspector
                .include_request_data
                .or_else(|| flag(&["TABULA_INSPECTOR_INCLUDE_REQUEST_DATA"]))
                .unwrap_or(defaults.include_request_data),
            exclude_sensitive: inspector
                .exclude_sensitive
                .or_else(|| flag(&["TABULA_INSPECTOR_EXCLUDE_SENSITIVE"]))
                .unwrap_or(defaults.exclude_sensitive),
            debug: inspector
                .debug
                .or_else(|| flag(&["TABULA_INSPECTOR_DEBUG"]))
                .unwrap_or(defaults.debug),
        };

        Config {
            environment,
            parity: ParityConfig {
                mode,
                pipeline_enabled,
                inspector,
            },
        }
    }

    pub fn environment(mut self, environment: Environment) -> Config {
        self.environment = environment;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Config {
        self.parity.mode = mode;
        self
    }

    pub fn pipeline_enabled(mut self, enabled: bool) -> Config {
        self.parity.pipeline_enabled = enabled;
        self
    }

    pub fn inspector(mut self, inspector: InspectorConfig) -> Config {
        self.parity.inspector = inspector;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl InspectorConfig {
    /// Defaults for an environment and mode. The inspector is on in local and
    /// testing environments, and in production only for hybrid runs.
    pub fn defaults_for(environment: Environment, mode: Mode) -> InspectorConfig {
        InspectorConfig {
            enabled: !environment.is_production() || mode == Mode::Hybrid,
            storage_path: PathBuf::from("storage/tabula/inspector"),
            max_files: 100,
            cleanup_days: 7,
            max_file_size: 10 * 1024 * 1024,
            include_trace: false,
            include_request_data: true,
            exclude_sensitive: true,
            debug: false,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn cleanup_days(mut self, days: u64) -> Self {
        self.cleanup_days = days;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn include_trace(mut self, include: bool) -> Self {
        self.include_trace = include;
        self
    }

    pub fn include_request_data(mut self, include: bool) -> Self {
        self.include_request_data = include;
        self
    }

    pub fn exclude_sensitive(mut self, exclude: bool) -> Self {
        self.exclude_sensitive = exclude;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        InspectorConfig::defaults_for(Environment::default(), Mode::default())
    }
}

/// The file layer: every key optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub environment: Option<Environment>,
    pub parity: Option<RawParity>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParity {
    pub mode: Option<Mode>,
    pub pipeline_enabled: Option<bool>,
    pub inspector: Option<RawInspector>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawInspector {
    pub enabled: Option<bool>,
    pub storage_path: Option<PathBuf>,
    pub max_files: Option<usize>,
    pub cleanup_days: Option<u64>,
    pub max_file_size: Option<u64>,
    pub include_trace: Option<bool>,
    pub include_request_data: Option<bool>,
    pub exclude_sensitive: Option<bool>,
    pub debug: Option<bool>,
}

fn read(path: &Path) -> Result<RawConfig> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| err!("reading {}: {e}", path.display()))?;
    toml::from_str(&src).map_err(|e| err!("invalid configuration in {}: {e}", path.display()))
}

fn parse_bool(src: &str) -> Option<bool> {
    match src.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
