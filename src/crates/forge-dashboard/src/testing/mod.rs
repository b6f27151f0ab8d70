//! Test infrastructure for the Forge dashboard
//!
//! This module provides:
//! - `MockTaskApi`, a scripted in-memory [`TaskApi`]
//! - Fixtures for tasks and execution snapshots

use crate::api::TaskApi;
use crate::error::{ForgeError, Result};
use crate::models::{ExecutionState, Task, TaskCreate, TaskStatus, TaskSummary};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Which endpoint a call hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    List,
    Create,
    Get,
    Delete,
    Start,
    GetExecution,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List,
    Create(String),
    Get(String),
    Delete(String),
    Start(String),
    GetExecution(String),
}

impl ApiCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::List => CallKind::List,
            Self::Create(_) => CallKind::Create,
            Self::Get(_) => CallKind::Get,
            Self::Delete(_) => CallKind::Delete,
            Self::Start(_) => CallKind::Start,
            Self::GetExecution(_) => CallKind::GetExecution,
        }
    }
}

#[derive(Default)]
struct MockState {
    /// Newest first, like the backend
    tasks: Vec<Task>,
    next_id: u64,
    status_scripts: HashMap<String, VecDeque<TaskStatus>>,
    executions: HashMap<String, ExecutionState>,
    failures: HashMap<CallKind, VecDeque<ForgeError>>,
    latency: HashMap<CallKind, Duration>,
    calls: Vec<ApiCall>,
}

impl MockState {
    fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    fn take_failure(&mut self, kind: CallKind) -> Option<ForgeError> {
        self.failures.get_mut(&kind).and_then(VecDeque::pop_front)
    }
}

fn not_found() -> ForgeError {
    ForgeError::Http {
        status: 404,
        body: r#"{"detail":"Task not found"}"#.to_string(),
    }
}

/// Scripted in-memory backend
///
/// Responses are computed when a call arrives; a configured latency is
/// slept after that, so a slow call returns the state it saw on entry.
#[derive(Default)]
pub struct MockTaskApi {
    state: Mutex<MockState>,
}

impl MockTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock pre-populated with `tasks` (newest first)
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let mock = Self::new();
        mock.state.lock().tasks = tasks;
        mock
    }

    pub fn insert(&self, task: Task) {
        self.state.lock().tasks.insert(0, task);
    }

    /// Statuses returned by successive `get` calls for `id`
    ///
    /// The last status repeats once the script runs out. Execution
    /// snapshots mirror whatever status `get` last returned.
    pub fn script_statuses(&self, id: &str, statuses: impl IntoIterator<Item = TaskStatus>) {
        self.state
            .lock()
            .status_scripts
            .insert(id.to_string(), statuses.into_iter().collect());
    }

    /// Fixed execution snapshot for `id`
    pub fn set_execution(&self, execution: ExecutionState) {
        self.state
            .lock()
            .executions
            .insert(execution.task_id.clone(), execution);
    }

    /// Set the stored status of `id` directly
    pub fn set_status(&self, id: &str, status: TaskStatus) {
        if let Some(task) = self.state.lock().find_mut(id) {
            task.status = status;
        }
    }

    /// The next call of `kind` fails with `error`
    pub fn fail_next(&self, kind: CallKind, error: ForgeError) {
        self.state.lock().failures.entry(kind).or_default().push_back(error);
    }

    /// Every call of `kind` sleeps for `delay` before returning
    pub fn set_latency(&self, kind: CallKind, delay: Duration) {
        self.state.lock().latency.insert(kind, delay);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.state.lock().calls.iter().filter(|call| call.kind() == kind).count()
    }

    /// Number of calls of `kind` that targeted `id`
    pub fn count_for(&self, kind: CallKind, id: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .filter(|call| match call {
                ApiCall::Get(x) | ApiCall::Delete(x) | ApiCall::Start(x) | ApiCall::GetExecution(x) => x == id,
                _ => false,
            })
            .count()
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.state.lock().find(id).cloned()
    }

    /// Record the call and compute its response under one lock
    fn call<T>(&self, call: ApiCall, respond: impl FnOnce(&mut MockState) -> Result<T>) -> (Result<T>, Option<Duration>) {
        let mut state = self.state.lock();
        let kind = call.kind();
        state.calls.push(call);
        let latency = state.latency.get(&kind).copied();
        let result = match state.take_failure(kind) {
            Some(error) => Err(error),
            None => respond(&mut *state),
        };
        (result, latency)
    }

    async fn finish<T>(&self, (result, latency): (Result<T>, Option<Duration>)) -> Result<T> {
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl TaskApi for MockTaskApi {
    async fn list(&self) -> Result<Vec<TaskSummary>> {
        let outcome = self.call(ApiCall::List, |state| Ok(state.tasks.iter().map(Task::summary).collect()));
        self.finish(outcome).await
    }

    async fn create(&self, request: &TaskCreate) -> Result<Task> {
        let outcome = self.call(ApiCall::Create(request.name.clone()), |state| {
            state.next_id += 1;
            let mut task = fixtures::task(&format!("task-{}", state.next_id), TaskStatus::Pending);
            task.name = request.name.clone();
            task.description = request.description.clone();
            task.yaml_content = request.yaml_content.clone().unwrap_or_default();
            state.tasks.insert(0, task.clone());
            Ok(task)
        });
        self.finish(outcome).await
    }

    async fn get(&self, id: &str) -> Result<Task> {
        let outcome = self.call(ApiCall::Get(id.to_string()), |state| {
            let scripted = match state.status_scripts.get_mut(id) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            };
            let task = state.find_mut(id).ok_or_else(not_found)?;
            if let Some(status) = scripted {
                task.status = status;
            }
            Ok(task.clone())
        });
        self.finish(outcome).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let outcome = self.call(ApiCall::Delete(id.to_string()), |state| {
            let before = state.tasks.len();
            state.tasks.retain(|task| task.id != id);
            if state.tasks.len() == before {
                return Err(not_found());
            }
            state.executions.remove(id);
            state.status_scripts.remove(id);
            Ok(())
        });
        self.finish(outcome).await
    }

    async fn start(&self, id: &str) -> Result<()> {
        let outcome = self.call(ApiCall::Start(id.to_string()), |state| {
            let scripted = state.status_scripts.contains_key(id);
            let task = state.find_mut(id).ok_or_else(not_found)?;
            if !scripted {
                task.status = TaskStatus::Running;
            }
            Ok(())
        });
        self.finish(outcome).await
    }

    async fn get_execution(&self, id: &str) -> Result<ExecutionState> {
        let outcome = self.call(ApiCall::GetExecution(id.to_string()), |state| {
            if let Some(execution) = state.executions.get(id) {
                return Ok(execution.clone());
            }
            let task = state.find(id).ok_or_else(not_found)?;
            Ok(fixtures::execution(id, task.status.clone()))
        });
        self.finish(outcome).await
    }
}

/// Sample records
pub mod fixtures {
    use super::*;
    use crate::models::{CellExecutionState, ExecutionLog, StepState, StepStatus};

    pub fn task(id: &str, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            name: format!("Task {}", id),
            description: None,
            yaml_content: "name: smoke\nsteps:\n  - open the home page\n".to_string(),
            status,
            created_at: now,
            updated_at: now,
            execution_id: None,
            steps: vec![],
        }
    }

    /// Task with one screenshot-bearing step and one without
    pub fn task_with_steps(id: &str, status: TaskStatus) -> Task {
        Task {
            steps: vec![
                StepState {
                    index: 0,
                    content: "Open the home page".to_string(),
                    status: StepStatus::Completed,
                    screenshot: Some(format!("/screenshots/{}/step_0.png", id)),
                },
                StepState {
                    index: 1,
                    content: "Click the login button".to_string(),
                    status: StepStatus::Running,
                    screenshot: None,
                },
            ],
            ..task(id, status)
        }
    }

    pub fn execution(id: &str, status: TaskStatus) -> ExecutionState {
        ExecutionState {
            task_id: id.to_string(),
            status,
            logs: vec![ExecutionLog {
                timestamp: Utc::now(),
                level: "info".to_string(),
                message: "Browser session started".to_string(),
            }],
            cells: vec![CellExecutionState {
                id: "cell-0".to_string(),
                status: "success".to_string(),
                code: "await page.goto('/')".to_string(),
                output: None,
            }],
        }
    }
}
