//! Typed access to the Forge backend REST API
//!
//! [`TaskApi`] is the seam the view models talk to; [`HttpTaskClient`] is the
//! reqwest implementation used by the binaries. Calls make exactly one HTTP
//! request each: no retries, no backoff, and failures are handed back to the
//! caller unchanged.

mod client;

pub use client::{HttpTaskClient, HealthStatus};

use crate::error::Result;
use crate::models::{ExecutionState, Task, TaskCreate, TaskSummary};
use async_trait::async_trait;

/// Operations offered by `/api/v1/tasks`
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET /tasks`, newest first
    async fn list(&self) -> Result<Vec<TaskSummary>>;

    /// `POST /tasks`
    async fn create(&self, task: &TaskCreate) -> Result<Task>;

    /// `GET /tasks/{id}`
    async fn get(&self, id: &str) -> Result<Task>;

    /// `DELETE /tasks/{id}`
    async fn delete(&self, id: &str) -> Result<()>;

    /// `POST /tasks/{id}/start`
    async fn start(&self, id: &str) -> Result<()>;

    /// `GET /tasks/{id}/execution`
    async fn get_execution(&self, id: &str) -> Result<ExecutionState>;
}
