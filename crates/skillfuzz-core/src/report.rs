//! Offline scoring reports.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::level::SkillLevel;
use crate::pipeline::{Assessment, Variant};

/// Outcome of scoring one request file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRequest {
    /// Where the request came from, usually a file path.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment>,
    /// Error message when the request could not be scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error kind, see `FuzzyError::kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ScoredRequest {
    pub fn overall(&self) -> Option<SkillLevel> {
        self.assessment.as_ref().map(|a| a.overall)
    }
}

/// A batch of scored requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub variant: Variant,
    /// Name of the control system that produced the scores.
    pub system: String,
    pub results: Vec<ScoredRequest>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ScoreReport {
    pub fn new(variant: Variant, system: impl Into<String>, results: Vec<ScoredRequest>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            variant,
            system: system.into(),
            results,
            duration_ms: 0,
        }
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    /// Save the report as pretty-printed JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse report JSON")
    }
}
