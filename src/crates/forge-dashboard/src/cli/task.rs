//! Task command handlers

use crate::api::TaskApi;
use crate::editor::YamlEditor;
use crate::error::{ForgeError, Result};
use crate::models::{Task, TaskStatus};
use crate::views::{status_badge, CreateTaskForm, Tone};
use colored::{ColoredString, Colorize};
use std::path::Path;
use tabled::{Table, Tabled};
use tracing::info;

/// Task display row for table output
#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

/// Badge label colored by its tone
pub fn colored_status(status: &TaskStatus) -> ColoredString {
    let badge = status_badge(status);
    match badge.tone {
        Tone::Success => badge.label.green(),
        Tone::Info => badge.label.cyan(),
        Tone::Neutral => badge.label.normal(),
        Tone::Error => badge.label.red(),
    }
}

/// Handle task list command
pub async fn handle_list(api: &dyn TaskApi) -> Result<()> {
    let tasks = api.list().await?;

    if tasks.is_empty() {
        println!("{}", "No tasks found".yellow());
        return Ok(());
    }

    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id.clone(),
            name: task.name.clone(),
            status: status_badge(&task.status).label,
            created: task.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    println!("{}", Table::new(rows));
    println!("{} task(s)", tasks.len());
    Ok(())
}

/// Handle task show command
pub async fn handle_show(api: &dyn TaskApi, id: &str) -> Result<()> {
    let task = api.get(id).await.map_err(|e| not_found_as_local(e, id))?;
    print_task(&task);

    match api.get_execution(id).await {
        Ok(execution) => {
            println!();
            println!("{} {}", "Execution:".bold(), colored_status(&execution.status));
            for cell in &execution.cells {
                println!("  [{}] {}", cell.status, cell.id);
            }
            if let Some(last) = execution.logs.last() {
                println!("  Last log: {}", last.display_line());
            }
        }
        Err(e) if e.is_not_found() => println!("\n{}", "No execution yet".dimmed()),
        Err(e) => println!("\n{} {}", "Execution unavailable:".yellow(), e),
    }
    Ok(())
}

fn print_task(task: &Task) {
    println!("{}", task.name.bold());
    println!("  ID: {}", task.id);
    println!("  Status: {}", colored_status(&task.status));
    if let Some(description) = &task.description {
        println!("  Description: {}", description);
    }
    println!("  Created: {}", task.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated: {}", task.updated_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(execution_id) = &task.execution_id {
        println!("  Execution: {}", execution_id);
    }

    if !task.steps.is_empty() {
        println!();
        println!("{}", "Steps:".bold());
        for step in &task.steps {
            let screenshot = if step.screenshot_path().is_some() { " [screenshot]" } else { "" };
            println!("  {}. {} ({}){}", step.index + 1, step.content, step.status, screenshot);
        }
    } else if !task.yaml_content.trim().is_empty() {
        println!();
        println!("{}", "Definition:".bold());
        for line in task.yaml_content.lines() {
            println!("  {}", line);
        }
    }
}

/// Handle task create command
///
/// Goes through the same form validation as the dashboard modal.
pub async fn handle_create(
    api: &dyn TaskApi,
    name: String,
    description: Option<String>,
    yaml_file: Option<&Path>,
    testcase_file: Option<String>,
) -> Result<Task> {
    let mut form = CreateTaskForm::new();
    form.name = name;
    form.description = description.unwrap_or_default();
    form.testcase_file = testcase_file;
    if let Some(path) = yaml_file {
        let yaml = tokio::fs::read_to_string(path).await?;
        form.yaml = YamlEditor::with_text(yaml);
    }

    if let Some(warning) = form.yaml_warning() {
        println!("{} {}", "⚠ YAML does not parse:".yellow(), warning);
    }

    let request = form.to_request()?;
    let task = api.create(&request).await?;
    info!(task_id = %task.id, "Task created");

    println!("{}", "✓ Task created successfully".green().bold());
    println!("  ID: {}", task.id);
    println!("  Name: {}", task.name);
    println!("  Status: {}", colored_status(&task.status));
    Ok(task)
}

/// Handle task delete command
pub async fn handle_delete(api: &dyn TaskApi, id: &str) -> Result<()> {
    api.delete(id).await.map_err(|e| not_found_as_local(e, id))?;
    info!(task_id = %id, "Task deleted");
    println!("{}", "✓ Task deleted".green().bold());
    Ok(())
}

/// Handle task start command (without `--watch`)
pub async fn handle_start(api: &dyn TaskApi, id: &str) -> Result<()> {
    api.start(id).await.map_err(|e| not_found_as_local(e, id))?;
    info!(task_id = %id, "Task started");
    println!("{}", "✓ Task execution started".green().bold());
    println!("  Follow it with: forge tasks watch {}", id);
    Ok(())
}

fn not_found_as_local(error: ForgeError, id: &str) -> ForgeError {
    if error.is_not_found() {
        ForgeError::NotFound(format!("task {}", id))
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, CallKind, MockTaskApi};
    use std::io::Write;

    #[tokio::test]
    async fn test_create_rejects_blank_name_without_calling_api() {
        let mock = MockTaskApi::new();
        let err = handle_create(&mock, "   ".into(), None, None, None).await.unwrap_err();
        assert!(matches!(err, ForgeError::Validation(_)));
        assert_eq!(mock.count(CallKind::Create), 0);
    }

    #[tokio::test]
    async fn test_create_reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "steps:\n  - open: https://example.com").unwrap();

        let mock = MockTaskApi::new();
        let task = handle_create(&mock, " Login ".into(), Some("smoke".into()), Some(file.path()), None)
            .await
            .unwrap();

        assert_eq!(task.name, "Login");
        assert!(task.yaml_content.contains("open: https://example.com"));
        assert_eq!(mock.count(CallKind::Create), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_task_reports_not_found() {
        let mock = MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Pending)]);
        let err = handle_delete(&mock, "2").await.unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_start_marks_task_running() {
        let mock = MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Pending)]);
        handle_start(&mock, "1").await.unwrap();
        assert_eq!(mock.task("1").unwrap().status, TaskStatus::Running);
    }
}
