//! CLI command implementations
//!
//! Thin wrappers around the API client and the view models, used by the
//! `forge` binary.

pub mod config;
pub mod status;
pub mod task;
pub mod watch;

pub use task::colored_status;
pub use watch::{watch_task, WatchReport};
