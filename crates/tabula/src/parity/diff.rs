use tabula_core::PagingResponse;

use indexmap::IndexMap;
use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys compared between the two payloads, in report order.
pub const COMPARED_KEYS: [&str; 4] = ["draw", "recordsTotal", "recordsFiltered", "data"];

pub const NOTE_NO_DIFF: &str = "no_diff";
pub const NOTE_UNAVAILABLE: &str = "pipeline_output_unavailable";

/// How bad a divergence is. Ordered from harmless to blocking.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,

    /// Row count of the page differs.
    Minor,

    /// Draw counter or record counts differ.
    Major,

    /// The pipeline produced no output.
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }

    fn of_key(key: &str) -> Severity {
        match key {
            "data" => Severity::Minor,
            _ => Severity::Major,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = tabula_core::Error;

    fn from_str(s: &str) -> tabula_core::Result<Severity> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Severity::None),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "critical" => Ok(Severity::Critical),
            other => Err(tabula_core::err!("unknown severity `{other}`")),
        }
    }
}

/// The four compared values of one payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadSummary {
    pub draw: u64,
    pub records_total: u64,
    pub records_filtered: u64,

    /// Row count, not row contents.
    pub data: u64,
}

impl PayloadSummary {
    pub fn of(response: &PagingResponse) -> PayloadSummary {
        PayloadSummary {
            draw: response.draw,
            records_total: response.records_total,
            records_filtered: response.records_filtered,
            data: response.data.len() as u64,
        }
    }

    fn get(&self, key: &str) -> u64 {
        match key {
            "draw" => self.draw,
            "recordsTotal" => self.records_total,
            "recordsFiltered" => self.records_filtered,
            _ => self.data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub legacy: PayloadSummary,
    pub pipeline: PayloadSummary,
    pub mismatched: usize,
}

/// Both sides of one mismatching key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDiff {
    pub legacy: u64,
    pub pipeline: u64,
}

/// Outcome of comparing the legacy and pipeline payloads.
///
/// Serialized shapes:
///
/// ```text
/// {"note": "no_diff", "summary": {..}}
/// {"recordsTotal": {"legacy": 5, "pipeline": 6}, "summary": {..}}
/// {"note": "pipeline_output_unavailable"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffReport {
    NoDiff {
        summary: Summary,
    },
    Mismatch {
        keys: IndexMap<String, KeyDiff>,
        summary: Summary,
    },
    PipelineUnavailable,
}

impl DiffReport {
    /// Compares payloads on draw, record counts and row count. A missing
    /// pipeline payload yields [`DiffReport::PipelineUnavailable`].
    pub fn compare(legacy: &PagingResponse, pipeline: Option<&PagingResponse>) -> DiffReport {
        let Some(pipeline) = pipeline else {
            return DiffReport::PipelineUnavailable;
        };

        let legacy = PayloadSummary::of(legacy);
        let pipeline = PayloadSummary::of(pipeline);

        let keys: IndexMap<String, KeyDiff> = COMPARED_KEYS
            .into_iter()
            .filter(|key| legacy.get(key) != pipeline.get(key))
            .map(|key| {
                (
                    key.to_string(),
                    KeyDiff {
                        legacy: legacy.get(key),
                        pipeline: pipeline.get(key),
                    },
                )
            })
            .collect();

        let summary = Summary {
            legacy,
            pipeline,
            mismatched: keys.len(),
        };

        if keys.is_empty() {
            DiffReport::NoDiff { summary }
        } else {
            DiffReport::Mismatch { keys, summary }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiffReport::NoDiff { .. } => Severity::None,
            DiffReport::PipelineUnavailable => Severity::Critical,
            DiffReport::Mismatch { keys, .. } => keys
                .keys()
                .map(|key| Severity::of_key(key))
                .max()
                .unwrap_or_default(),
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, DiffReport::NoDiff { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DiffReport::PipelineUnavailable)
    }

    /// Short label for listings: the note, or the mismatching keys.
    pub fn note(&self) -> String {
        match self {
            DiffReport::NoDiff { .. } => NOTE_NO_DIFF.to_string(),
            DiffReport::PipelineUnavailable => NOTE_UNAVAILABLE.to_string(),
            DiffReport::Mismatch { keys, .. } => {
                let keys: Vec<&str> = keys.keys().map(String::as_str).collect();
                format!("mismatch: {}", keys.join(", "))
            }
        }
    }
}

impl Serialize for DiffReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            DiffReport::NoDiff { summary } => {
                map.serialize_entry("note", NOTE_NO_DIFF)?;
                map.serialize_entry("summary", summary)?;
            }
            DiffReport::Mismatch { keys, summary } => {
                for (key, diff) in keys {
                    map.serialize_entry(key, diff)?;
                }
                map.serialize_entry("summary", summary)?;
            }
            DiffReport::PipelineUnavailable => {
                map.serialize_entry("note", NOTE_UNAVAILABLE)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DiffReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = serde_json::Map::deserialize(deserializer)?;

        let note = map.get("note").and_then(|note| note.as_str()).map(str::to_string);
        match note.as_deref() {
            Some(NOTE_UNAVAILABLE) => return Ok(DiffReport::PipelineUnavailable),
            Some(NOTE_NO_DIFF) => {
                let summary = map
                    .remove("summary")
                    .ok_or_else(|| D::Error::missing_field("summary"))?;
                let summary = Summary::deserialize(summary).map_err(D::Error::custom)?;
                return Ok(DiffReport::NoDiff { summary });
            }
            Some(other) => {
                return Err(D::Error::custom(format!("unknown diff note `{other}`")));
            }
            None => {}
        }

        let summary = map
            .remove("summary")
            .ok_or_else(|| D::Error::missing_field("summary"))?;
        let summary = Summary::deserialize(summary).map_err(D::Error::custom)?;

        let mut keys = IndexMap::new();
        for key in COMPARED_KEYS {
            if let Some(diff) = map.remove(key) {
                let diff = KeyDiff::deserialize(diff).map_err(D::Error::custom)?;
                keys.insert(key.to_string(), diff);
            }
        }

        Ok(DiffReport::Mismatch { keys, summary })
    }
}
