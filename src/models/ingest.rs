use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Step at which a chunk failed during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Embed,
    Store,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Embed => write!(f, "embed"),
            FailureStage::Store => write!(f, "store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub index: u32,
    pub stage: FailureStage,
    pub kind: ErrorKind,
    /// Fixed description of the failure; backend detail stays in the log.
    pub reason: String,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    pub source: String,
    /// SHA-256 of the ingested text.
    pub checksum: String,
    pub attempted: usize,
    pub stored: usize,
    /// Failed chunks ordered by index.
    pub failures: Vec<ChunkFailure>,
    pub duration_ms: u64,
    pub ingested_at: DateTime<Utc>,
}

impl IngestReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.stored == self.attempted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_completeness() {
        let mut report = IngestReport {
            attempted: 3,
            stored: 3,
            ..Default::default()
        };
        assert!(report.is_complete());

        report.stored = 2;
        report.failures.push(ChunkFailure {
            index: 1,
            stage: FailureStage::Embed,
            kind: ErrorKind::Timeout,
            reason: "the embedding service did not respond in time".to_string(),
        });
        assert!(!report.is_complete());
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_failure_stage_serialization() {
        let json = serde_json::to_string(&FailureStage::Store).unwrap();
        assert_eq!(json, "\"store\"");
    }
}
