//! Dashboard routes
//!
//! `/` redirects to `/tasks`, `/tasks` is the list and `/tasks/:id` the
//! detail of one task.

use crate::error::{ForgeError, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Tasks,
    TaskDetail(String),
}

impl Route {
    /// Follow redirects
    pub fn resolve(self) -> Route {
        match self {
            Route::Root => Route::Tasks,
            other => other,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            Route::TaskDetail(id) => Some(id),
            _ => None,
        }
    }
}

impl FromStr for Route {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let path = trimmed.trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').skip(1).collect();

        if !trimmed.starts_with('/') {
            return Err(ForgeError::Validation(format!("Route must start with '/': {}", s)));
        }
        match segments.as_slice() {
            [] => Ok(Route::Root),
            ["tasks"] => Ok(Route::Tasks),
            ["tasks", id] if !id.is_empty() => Ok(Route::TaskDetail(id.to_string())),
            _ => Err(ForgeError::Validation(format!("Unknown route: {}", s))),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => write!(f, "/"),
            Route::Tasks => write!(f, "/tasks"),
            Route::TaskDetail(id) => write!(f, "/tasks/{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!("/".parse::<Route>().unwrap(), Route::Root);
        assert_eq!("/tasks".parse::<Route>().unwrap(), Route::Tasks);
        assert_eq!("/tasks/".parse::<Route>().unwrap(), Route::Tasks);
        assert_eq!(
            "/tasks/6f1c".parse::<Route>().unwrap(),
            Route::TaskDetail("6f1c".into())
        );
    }

    #[test]
    fn test_root_redirects_to_tasks() {
        assert_eq!(Route::Root.resolve(), Route::Tasks);
        assert_eq!(Route::TaskDetail("1".into()).resolve(), Route::TaskDetail("1".into()));
    }

    #[test]
    fn test_invalid_routes() {
        assert!("tasks".parse::<Route>().is_err());
        assert!("/settings".parse::<Route>().is_err());
        assert!("/tasks/1/execution".parse::<Route>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let route = Route::TaskDetail("42".into());
        assert_eq!(route.to_string().parse::<Route>().unwrap(), route);
    }
}
