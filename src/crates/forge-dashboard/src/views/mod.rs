//! View models shared by the terminal dashboard and the CLI
//!
//! View models read from the [`QueryStore`](crate::store::QueryStore) and
//! hold UI-only state (selection, pollers, open panel). They never fetch.

pub mod badge;
pub mod detail;
pub mod list;

pub use badge::{cell_indicator, status_badge, Badge, CellIndicator, Tone};
pub use detail::{screenshot_url, CellView, Definition, DetailView, StepView, TaskDetailViewModel, TaskPage};
pub use list::{CreateTaskForm, ListView, TaskListViewModel, TaskRow};
