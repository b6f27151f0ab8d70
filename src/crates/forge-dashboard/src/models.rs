//! Task and execution-state types exchanged with the Forge backend
//!
//! These mirror the JSON bodies of the `/api/v1/tasks` endpoints. The client
//! never computes a status on its own; every status here is whatever the
//! backend last reported.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Task lifecycle status
///
/// Unknown values coming from the backend are kept verbatim in `Other` so
/// they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Created, not yet started
    Pending,
    /// Backend is executing the task
    Running,
    /// Finished successfully
    Completed,
    /// Finished with a failed assertion
    Failed,
    /// Aborted by an execution error
    Error,
    /// Anything the client does not recognise
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// `pending` and `running` still need polling; everything else is settled.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    pub fn is_settled(&self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Status of a single step inside a task's definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-step progress reported inside a [`Task`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    /// Position in the step sequence
    pub index: u32,

    /// Human-readable description of the step
    pub content: String,

    #[serde(default)]
    pub status: StepStatus,

    /// Path of the screenshot relative to the backend origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl StepState {
    /// Screenshot path, if the step has a non-empty one
    pub fn screenshot_path(&self) -> Option<&str> {
        self.screenshot.as_deref().filter(|path| !path.trim().is_empty())
    }
}

/// Full task record as returned by `GET /tasks/{id}` and `POST /tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Raw YAML test-case definition, opaque to the client
    #[serde(default, deserialize_with = "null_as_empty")]
    pub yaml_content: String,

    pub status: TaskStatus,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub steps: Vec<StepState>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Projection used by the task collection
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status.clone(),
            created_at: self.created_at,
        }
    }
}

/// Row of `GET /tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub name: String,
    pub status: TaskStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl TaskSummary {
    /// True when every field equals the corresponding field on `task`
    pub fn matches(&self, task: &Task) -> bool {
        self.id == task.id
            && self.name == task.name
            && self.status == task.status
            && self.created_at == task.created_at
    }
}

/// Body of `POST /tasks`
///
/// When both `yaml_content` and `testcase_file` are given the backend
/// decides which one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskCreate {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testcase_file: Option<String>,
}

impl TaskCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_yaml(mut self, yaml: impl Into<String>) -> Self {
        self.yaml_content = Some(yaml.into());
        self
    }

    pub fn with_testcase_file(mut self, path: impl Into<String>) -> Self {
        self.testcase_file = Some(path.into());
        self
    }
}

/// One line of the backend's execution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

impl ExecutionLog {
    /// `[HH:MM:SS] LEVEL: message`
    pub fn display_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.to_uppercase(),
            self.message
        )
    }
}

/// A notebook-style cell: generated code plus its status and output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellExecutionState {
    pub id: String,
    /// Free-form: `pending`, `running`, `success`, `error`, ...
    pub status: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Live record of a task's run, replaced wholesale on every poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: Vec<ExecutionLog>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cells: Vec<CellExecutionState>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend timestamps are either RFC 3339 or naive ISO-8601 (assumed UTC).
pub mod timestamp {
    use super::*;
    use serde::de::Error;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}
