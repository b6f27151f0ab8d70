//! # Forge Dashboard
//!
//! Terminal dashboard and CLI for a test-automation backend that runs
//! YAML-defined browser test cases. The backend is reached only through its
//! REST API (`/tasks`, `/tasks/{id}`, `/tasks/{id}/start`,
//! `/tasks/{id}/execution`).
//!
//! ## Layers
//!
//! - [`api`] - the [`TaskApi`] seam and its reqwest implementation
//! - [`store`] - keyed query cache with epoch-ordered responses
//! - [`poll`] - the poll/settle state machine
//! - [`views`] - list and detail view models, badge mapping
//! - [`dashboard`] - single-owner controller tying the above together
//! - [`tui`] / [`cli`] - presentation surfaces
//!
//! ```rust,no_run
//! use forge_dashboard::{Dashboard, DashboardSettings, HttpTaskClient, Route};
//! use std::sync::Arc;
//! use tokio::time::Instant;
//!
//! # async fn example() -> forge_dashboard::Result<()> {
//! let client = Arc::new(HttpTaskClient::from_base_url("http://localhost:8000")?);
//! let mut dashboard = Dashboard::new(client, DashboardSettings::default());
//!
//! dashboard.navigate(Route::Tasks, Instant::now());
//! dashboard.tick(Instant::now());
//! dashboard.settle(Instant::now()).await;
//!
//! for row in dashboard.rows() {
//!     println!("{} {}", row.name, row.badge.label);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod init;
pub mod logging;
pub mod models;
pub mod poll;
pub mod route;
pub mod shutdown;
pub mod store;
pub mod testing;
pub mod tui;
pub mod version;
pub mod views;

mod error;

pub use api::{HealthStatus, HttpTaskClient, TaskApi};
pub use config::{load_config, ConfigLoader, ConfigSource, ForgeConfig};
pub use dashboard::{Dashboard, DashboardSettings, Mutation, Notice, NoticeLevel};
pub use error::{ForgeError, Result};
pub use models::{ExecutionState, Task, TaskCreate, TaskStatus, TaskSummary};
pub use poll::{PollPhase, PollPolicy, Poller};
pub use route::Route;
pub use shutdown::ShutdownCoordinator;
pub use store::{QueryKey, QueryStore};
pub use version::{full_version as version_info, short_version, VersionInfo};
pub use views::{DetailView, ListView, TaskDetailViewModel, TaskListViewModel};
