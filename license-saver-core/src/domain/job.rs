//! Deletion job domain model
//!
//! A job is created by scheduling a user deletion and refreshed in place
//! until its status leaves the pending set (SCHEDULED, RUNNING).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Status of a user deletion job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Also assumed when a freshly scheduled job arrives without a status
    #[default]
    Scheduled,
    Running,
    Completed,
    Error,
    /// Any status string this client does not know; treated as terminal
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether the vendor is still working on the job
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Scheduled | JobStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
            JobStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled user deletion job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub status: JobStatus,
}

/// Partial job representation returned by the status endpoint.
///
/// Fields missing from the response keep their previous value when applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

impl Job {
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }

    /// Merge a status response over this job
    pub fn apply(&mut self, update: JobUpdate) {
        if let Some(id) = update.id {
            self.id = id;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

/// Deserialize ID that can be number or string
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for job id")),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string for job id")),
    }
}
