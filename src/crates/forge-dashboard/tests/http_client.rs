//! HttpTaskClient against an in-process fake backend

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use forge_dashboard::{Dashboard, DashboardSettings, HttpTaskClient, Route, TaskApi, TaskCreate, TaskStatus};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

type Tasks = Arc<Mutex<Vec<Value>>>;

fn task_json(id: &str, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "yaml_content": "steps:\n  - open: /\n",
        "status": status,
        "created_at": "2024-01-01T10:00:00.123456",
        "updated_at": "2024-01-01T10:05:00.654321",
        "execution_id": null,
        "steps": [
            {"index": 0, "content": "Open home", "status": "completed", "screenshot": "/screenshots/1/step_0.png"}
        ]
    })
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"})))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn list(State(tasks): State<Tasks>) -> Json<Value> {
    let summaries: Vec<Value> = tasks
        .lock()
        .iter()
        .map(|t| json!({"id": t["id"], "name": t["name"], "status": t["status"], "created_at": t["created_at"]}))
        .collect();
    Json(Value::Array(summaries))
}

async fn create(State(tasks): State<Tasks>, Json(body): Json<Value>) -> impl IntoResponse {
    let mut tasks = tasks.lock();
    let id = (tasks.len() + 100).to_string();
    let name = body["name"].as_str().unwrap_or_default();
    let mut task = task_json(&id, name, "pending");
    task["description"] = body["description"].clone();
    tasks.insert(0, task.clone());
    (StatusCode::CREATED, Json(task))
}

async fn fetch(State(tasks): State<Tasks>, Path(id): Path<String>) -> impl IntoResponse {
    match tasks.lock().iter().find(|t| t["id"] == id.as_str()) {
        Some(task) => (StatusCode::OK, Json(task.clone())).into_response(),
        None => not_found().into_response(),
    }
}

async fn remove(State(tasks): State<Tasks>, Path(id): Path<String>) -> impl IntoResponse {
    let mut tasks = tasks.lock();
    let before = tasks.len();
    tasks.retain(|t| t["id"] != id.as_str());
    if tasks.len() == before {
        not_found().into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn start(State(tasks): State<Tasks>, Path(id): Path<String>) -> impl IntoResponse {
    match tasks.lock().iter_mut().find(|t| t["id"] == id.as_str()) {
        Some(task) => {
            task["status"] = json!("running");
            (StatusCode::ACCEPTED, Json(json!({"status": "accepted"}))).into_response()
        }
        None => not_found().into_response(),
    }
}

async fn execution(State(tasks): State<Tasks>, Path(id): Path<String>) -> impl IntoResponse {
    let tasks = tasks.lock();
    let Some(task) = tasks.iter().find(|t| t["id"] == id.as_str()) else {
        return not_found().into_response();
    };
    Json(json!({
        "task_id": id,
        "status": task["status"],
        "logs": [
            {"timestamp": "2024-01-01T10:00:01.000001", "level": "info", "message": "Browser started"}
        ],
        "cells": [
            {"id": "cell-0", "status": "success", "code": "await page.goto('/')", "output": null},
            {"id": "cell-1", "status": "error", "code": "await page.click('#login')", "output": "Timeout"}
        ]
    }))
    .into_response()
}

async fn spawn_backend(seed: Vec<Value>) -> HttpTaskClient {
    spawn_backend_at("", seed).await
}

/// Serve the fake backend under `prefix`, as a reverse proxy would
async fn spawn_backend_at(prefix: &str, seed: Vec<Value>) -> HttpTaskClient {
    let tasks: Tasks = Arc::new(Mutex::new(seed));
    let routes = Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks", get(list).post(create))
        .route("/api/v1/tasks/:id", get(fetch).delete(remove))
        .route("/api/v1/tasks/:id/start", post(start))
        .route("/api/v1/tasks/:id/execution", get(execution))
        .with_state(tasks);
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpTaskClient::from_base_url(format!("http://{}{}", addr, prefix)).unwrap()
}

#[tokio::test]
async fn list_summaries_match_individual_tasks() {
    let client = spawn_backend(vec![
        task_json("2", "Checkout", "running"),
        task_json("1", "Login", "completed"),
    ])
    .await;

    let summaries = client.list().await.unwrap();
    assert_eq!(summaries.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), ["2", "1"]);

    for summary in &summaries {
        let task = client.get(&summary.id).await.unwrap();
        assert!(summary.matches(&task), "summary {} disagrees with task", summary.id);
    }
}

#[tokio::test]
async fn naive_timestamps_parse_as_utc() {
    let client = spawn_backend(vec![task_json("1", "Login", "pending")]).await;
    let task = client.get("1").await.unwrap();
    assert_eq!(task.created_at.to_rfc3339(), "2024-01-01T10:00:00.123456+00:00");
    assert_eq!(task.steps[0].screenshot_path(), Some("/screenshots/1/step_0.png"));
}

#[tokio::test]
async fn create_get_start_delete_round() {
    let client = spawn_backend(vec![]).await;

    let created = client
        .create(&TaskCreate::new("Smoke").with_description("nightly"))
        .await
        .unwrap();
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(created.description.as_deref(), Some("nightly"));

    client.start(&created.id).await.unwrap();
    assert_eq!(client.get(&created.id).await.unwrap().status, TaskStatus::Running);

    let execution = client.get_execution(&created.id).await.unwrap();
    assert_eq!(execution.status, TaskStatus::Running);
    assert_eq!(execution.cells.len(), 2);
    assert_eq!(execution.cells[1].output.as_deref(), Some("Timeout"));

    client.delete(&created.id).await.unwrap();
    let err = client.get(&created.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(client.delete(&created.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn health_reports_ok() {
    let client = spawn_backend(vec![]).await;
    assert!(client.health().await.unwrap().is_ok());
}

#[tokio::test]
async fn backend_behind_path_prefix_is_reachable() {
    let client = spawn_backend_at("/forge", vec![task_json("1", "Login", "running")]).await;
    assert!(client.health().await.unwrap().is_ok());
    assert_eq!(client.list().await.unwrap().len(), 1);
    assert_eq!(client.get("1").await.unwrap().status, TaskStatus::Running);
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpTaskClient::from_base_url(format!("http://{}", addr)).unwrap();
    assert!(client.list().await.unwrap_err().is_transport());
}

#[tokio::test]
async fn dashboard_renders_detail_over_http() {
    let client = spawn_backend(vec![task_json("1", "Login", "completed")]).await;
    let base_url = client.origin().as_str().trim_end_matches('/').to_string();

    let settings = DashboardSettings {
        base_url: base_url.clone(),
        ..DashboardSettings::default()
    };
    let mut dashboard = Dashboard::new(Arc::new(client), settings);
    dashboard.navigate(Route::TaskDetail("1".into()), Instant::now());
    for _ in 0..2 {
        let now = Instant::now();
        dashboard.tick(now);
        dashboard.settle(now).await;
    }

    let Some(forge_dashboard::DetailView::Loaded(page)) = dashboard.detail_view() else {
        panic!("task 1 should be loaded");
    };
    assert_eq!(page.badge.label, "Finished");
    assert_eq!(
        page.screenshots[0].screenshot_url.as_deref(),
        Some(format!("{}/screenshots/1/step_0.png", base_url).as_str())
    );
    assert_eq!(page.cells.len(), 2);
    assert!(dashboard.detail().unwrap().is_settled());
}
