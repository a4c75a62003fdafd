use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A registered agent. Read-only to the ingestion core; the registry owner
/// manages the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub is_active: bool,
    pub created_at_utc: DateTime<Utc>,
}

/// One validated call-list entry. `original_index` is the 0-based position in
/// the uploaded file and survives partitioning so upload order can be
/// reconstructed per agent.
///
/// Serialized camelCase: the persisted jsonb layout keeps the field names the
/// call-desk frontend already displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub first_name: String,
    pub phone: String,
    #[serde(default)]
    pub notes: String,
    pub original_index: i64,
}

/// A single row-level validation violation. Row numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_number: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row_number: usize, message: impl Into<String>) -> Self {
        RowError {
            row_number,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row_number, self.message)
    }
}

/// One partition output group: an agent plus the contiguous block of records
/// assigned to it. Empty `records` is valid output (more agents than records).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentGroup {
    pub agent: Agent,
    pub records: Vec<CallRecord>,
}

/// Per-agent slice of the upload summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub agent_id: Uuid,
    pub items_count: usize,
}

/// Summary returned to the upload boundary after a successful distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub total_items: usize,
    pub agents_count: usize,
    pub distributions: Vec<DistributionSummary>,
}
