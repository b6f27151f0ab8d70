//! Task list view model and the create-task form

use super::badge::{status_badge, Badge};
use crate::editor::YamlEditor;
use crate::error::{ForgeError, Result};
use crate::models::{TaskCreate, TaskSummary};
use crate::store::QueryStore;

/// One row of the task table
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: String,
    pub name: String,
    pub badge: Badge,
    pub created_at: String,
}

impl From<&TaskSummary> for TaskRow {
    fn from(summary: &TaskSummary) -> Self {
        Self {
            id: summary.id.clone(),
            name: summary.name.clone(),
            badge: status_badge(&summary.status),
            created_at: summary.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// What the list screen shows
#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    /// Nothing loaded yet; `error` is set if the first fetch failed
    Loading { error: Option<String> },
    Loaded { rows: Vec<TaskRow>, error: Option<String> },
}

/// Selection state of the task list
///
/// Rows always come from the cached collection in server order; the view
/// model never edits them locally.
#[derive(Debug, Clone, Default)]
pub struct TaskListViewModel {
    selected: usize,
}

impl TaskListViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, store: &QueryStore) -> ListView {
        let query = store.task_list();
        let error = query.error().map(str::to_string);
        match query.data() {
            None => ListView::Loading { error },
            Some(summaries) => ListView::Loaded {
                rows: summaries.iter().map(TaskRow::from).collect(),
                error,
            },
        }
    }

    pub fn rows(&self, store: &QueryStore) -> Vec<TaskRow> {
        store
            .task_list()
            .data()
            .map(|summaries| summaries.iter().map(TaskRow::from).collect())
            .unwrap_or_default()
    }

    /// Selected index, clamped to the current row count
    pub fn selected(&self, store: &QueryStore) -> Option<usize> {
        let len = store.task_list().data().map_or(0, Vec::len);
        (len > 0).then(|| self.selected.min(len - 1))
    }

    pub fn selected_id(&self, store: &QueryStore) -> Option<String> {
        let index = self.selected(store)?;
        store
            .task_list()
            .data()
            .and_then(|summaries| summaries.get(index))
            .map(|summary| summary.id.clone())
    }

    pub fn select_next(&mut self, store: &QueryStore) {
        let len = store.task_list().data().map_or(0, Vec::len);
        if len > 0 {
            self.selected = (self.selected.min(len - 1) + 1) % len;
        }
    }

    pub fn select_prev(&mut self, store: &QueryStore) {
        let len = store.task_list().data().map_or(0, Vec::len);
        if len > 0 {
            let current = self.selected.min(len - 1);
            self.selected = if current == 0 { len - 1 } else { current - 1 };
        }
    }
}

/// Input of the create-task modal
#[derive(Debug, Clone, Default)]
pub struct CreateTaskForm {
    pub name: String,
    pub description: String,
    pub yaml: YamlEditor,
    pub testcase_file: Option<String>,
}

impl CreateTaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit stays disabled while the trimmed name is empty
    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn yaml_warning(&self) -> Option<String> {
        self.yaml.syntax_warning()
    }

    /// Request body; empty optional fields are left out
    pub fn to_request(&self) -> Result<TaskCreate> {
        if !self.can_submit() {
            return Err(ForgeError::Validation("Task name is required".to_string()));
        }

        let mut request = TaskCreate::new(self.name.trim());
        if !self.description.trim().is_empty() {
            request = request.with_description(self.description.trim());
        }
        if !self.yaml.text().trim().is_empty() {
            request = request.with_yaml(self.yaml.text());
        }
        if let Some(path) = self.testcase_file.as_deref().filter(|p| !p.trim().is_empty()) {
            request = request.with_testcase_file(path);
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::store::{Fetched, QueryKey};
    use chrono::{TimeZone, Utc};

    fn store_with(ids: &[&str]) -> QueryStore {
        let mut store = QueryStore::new();
        let ticket = store.begin(QueryKey::TaskList);
        let rows = ids
            .iter()
            .map(|id| TaskSummary {
                id: id.to_string(),
                name: format!("task {}", id),
                status: TaskStatus::Pending,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            })
            .collect();
        store.apply(&ticket, Ok(Fetched::TaskList(rows)));
        store
    }

    #[test]
    fn test_view_before_load() {
        let store = QueryStore::new();
        let vm = TaskListViewModel::new();
        assert_eq!(vm.view(&store), ListView::Loading { error: None });
        assert_eq!(vm.selected_id(&store), None);
    }

    #[test]
    fn test_rows_keep_server_order() {
        let store = store_with(&["9", "3", "5"]);
        let vm = TaskListViewModel::new();
        let ids: Vec<_> = vm.rows(&store).into_iter().map(|row| row.id).collect();
        assert_eq!(ids, vec!["9", "3", "5"]);
        assert_eq!(vm.rows(&store)[0].created_at, "2024-01-01 10:00");
        assert_eq!(vm.rows(&store)[0].badge.label, "Pending");
    }

    #[test]
    fn test_selection_wraps() {
        let store = store_with(&["1", "2"]);
        let mut vm = TaskListViewModel::new();
        assert_eq!(vm.selected_id(&store).as_deref(), Some("1"));
        vm.select_next(&store);
        assert_eq!(vm.selected_id(&store).as_deref(), Some("2"));
        vm.select_next(&store);
        assert_eq!(vm.selected_id(&store).as_deref(), Some("1"));
        vm.select_prev(&store);
        assert_eq!(vm.selected_id(&store).as_deref(), Some("2"));
    }

    #[test]
    fn test_selection_clamps_after_rows_shrink() {
        let mut store = store_with(&["1", "2", "3"]);
        let mut vm = TaskListViewModel::new();
        vm.select_prev(&store);
        assert_eq!(vm.selected_id(&store).as_deref(), Some("3"));

        let ticket = store.begin(QueryKey::TaskList);
        store.apply(&ticket, Ok(Fetched::TaskList(vec![])));
        assert_eq!(vm.selected(&store), None);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut form = CreateTaskForm::new();
        assert!(!form.can_submit());
        assert!(matches!(form.to_request(), Err(ForgeError::Validation(_))));

        form.name = "   ".to_string();
        assert!(!form.can_submit());
    }

    #[test]
    fn test_request_trims_and_skips_blank_fields() {
        let form = CreateTaskForm {
            name: "  login flow ".to_string(),
            description: " ".to_string(),
            yaml: YamlEditor::with_text("steps:\n  - open /login\n"),
            testcase_file: None,
        };
        let request = form.to_request().unwrap();
        assert_eq!(request.name, "login flow");
        assert_eq!(request.description, None);
        assert_eq!(request.yaml_content.as_deref(), Some("steps:\n  - open /login\n"));
        assert_eq!(request.testcase_file, None);
    }
}
