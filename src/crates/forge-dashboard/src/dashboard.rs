//! Dashboard controller
//!
//! `Dashboard` is the single owner of the query store and the view models.
//! Fetches and mutations run as spawned tasks that only do I/O and send a
//! [`Message`] back; every state change happens in [`Dashboard::pump`] or
//! [`Dashboard::settle`] on the owner.

use crate::api::TaskApi;
use crate::config::{DetailPanel, ForgeConfig};
use crate::error::{ForgeError, Result};
use crate::models::{Task, TaskCreate};
use crate::poll::PollPolicy;
use crate::route::Route;
use crate::store::{ApplyOutcome, Fetched, QueryKey, QueryStore, Ticket};
use crate::views::{CreateTaskForm, DetailView, ListView, TaskDetailViewModel, TaskListViewModel, TaskRow};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Settings the controller needs from the configuration
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    /// Origin screenshots are resolved against
    pub base_url: String,
    pub policy: PollPolicy,
    pub detail_panel: DetailPanel,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from(&ForgeConfig::default())
    }
}

impl From<&ForgeConfig> for DashboardSettings {
    fn from(config: &ForgeConfig) -> Self {
        Self {
            base_url: config.backend.base_url.clone(),
            policy: config.polling.policy(),
            detail_panel: config.ui.detail_panel,
        }
    }
}

/// A user-triggered write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { name: String },
    Delete { id: String },
    Start { id: String },
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create { name } => write!(f, "create task '{}'", name),
            Self::Delete { id } => write!(f, "delete task {}", id),
            Self::Start { id } => write!(f, "start task {}", id),
        }
    }
}

/// Completion sent back by a spawned request
#[derive(Debug)]
pub enum Message {
    Fetched {
        ticket: Ticket,
        result: Result<Fetched>,
    },
    Mutated {
        mutation: Mutation,
        result: Result<Option<Task>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Status-line message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Query whose failed fetch raised this notice
    pub source: Option<QueryKey>,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            source: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            source: None,
        }
    }

    fn fetch_failed(key: &QueryKey, error: &ForgeError) -> Self {
        Self {
            source: Some(key.clone()),
            ..Self::error(format!("Failed to load {}: {}", key, error))
        }
    }
}

pub struct Dashboard {
    api: Arc<dyn TaskApi>,
    settings: DashboardSettings,
    store: QueryStore,
    invalidations: broadcast::Receiver<QueryKey>,
    list: TaskListViewModel,
    detail: Option<TaskDetailViewModel>,
    route: Route,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    outstanding: usize,
    notice: Option<Notice>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn TaskApi>, settings: DashboardSettings) -> Self {
        let store = QueryStore::new();
        let invalidations = store.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            settings,
            store,
            invalidations,
            list: TaskListViewModel::new(),
            detail: None,
            route: Route::Tasks,
            tx,
            rx,
            outstanding: 0,
            notice: None,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Requests sent but not yet pumped
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn list(&self) -> &TaskListViewModel {
        &self.list
    }

    pub fn list_mut(&mut self) -> (&mut TaskListViewModel, &QueryStore) {
        (&mut self.list, &self.store)
    }

    pub fn detail(&self) -> Option<&TaskDetailViewModel> {
        self.detail.as_ref()
    }

    pub fn detail_mut(&mut self) -> Option<&mut TaskDetailViewModel> {
        self.detail.as_mut()
    }

    pub fn rows(&self) -> Vec<TaskRow> {
        self.list.rows(&self.store)
    }

    pub fn list_view(&self) -> ListView {
        self.list.view(&self.store)
    }

    pub fn detail_view(&self) -> Option<DetailView> {
        self.detail
            .as_ref()
            .map(|detail| detail.view(&self.store, &self.settings.base_url))
    }

    /// Switch screens; leaving a detail view stops its pollers
    pub fn navigate(&mut self, route: Route, now: Instant) {
        let route = route.resolve();
        info!(%route, "Navigate");

        match &route {
            Route::TaskDetail(id) => {
                let same = self.detail.as_ref().is_some_and(|detail| detail.task_id() == id);
                if !same {
                    if let Some(mut old) = self.detail.take() {
                        old.stop();
                    }
                    let mut detail = TaskDetailViewModel::new(id.clone(), self.settings.policy, self.settings.detail_panel);
                    detail.open(now);
                    self.detail = Some(detail);
                }
            }
            _ => {
                if let Some(mut old) = self.detail.take() {
                    old.stop();
                }
            }
        }
        self.route = route;
    }

    /// Dispatch every fetch that is due
    pub fn tick(&mut self, now: Instant) {
        if self.route == Route::Tasks && self.store.task_list().needs_fetch() {
            self.dispatch(QueryKey::TaskList);
        }
        let due = self.detail.as_ref().map(|detail| detail.due(now)).unwrap_or_default();
        for key in due {
            self.dispatch(key);
        }
    }

    /// Earliest instant at which `tick` has work
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.detail.as_ref().and_then(TaskDetailViewModel::next_due)
    }

    /// Re-fetch what the current screen shows
    pub fn refresh(&mut self) {
        match self.route.clone() {
            Route::TaskDetail(id) => {
                self.store.invalidate(&QueryKey::Task(id.clone()));
                self.store.invalidate(&QueryKey::Execution(id));
            }
            _ => self.store.invalidate(&QueryKey::TaskList),
        }
    }

    fn dispatch(&mut self, key: QueryKey) {
        let ticket = self.store.begin(key.clone());
        if let Some(detail) = self.detail.as_mut() {
            detail.mark_dispatched(&ticket);
        }
        debug!(key = %ticket.key, epoch = ticket.epoch, "Dispatch fetch");

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let result = match &key {
                QueryKey::TaskList => api.list().await.map(Fetched::TaskList),
                QueryKey::Task(id) => match api.get(id).await {
                    Ok(task) => Ok(Fetched::Task(Some(task))),
                    Err(e) if e.is_not_found() => Ok(Fetched::Task(None)),
                    Err(e) => Err(e),
                },
                QueryKey::Execution(id) => api.get_execution(id).await.map(Fetched::Execution),
            };
            // receiver gone means the dashboard was dropped
            let _ = tx.send(Message::Fetched { ticket, result });
        });
    }

    fn mutate(&mut self, mutation: Mutation, request: Option<TaskCreate>) {
        info!(%mutation, "Mutation requested");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let result = match (&mutation, request) {
                (Mutation::Create { .. }, Some(request)) => api.create(&request).await.map(Some),
                (Mutation::Delete { id }, _) => api.delete(id).await.map(|_| None),
                (Mutation::Start { id }, _) => api.start(id).await.map(|_| None),
                (Mutation::Create { .. }, None) => Err(ForgeError::Validation("Missing create request".to_string())),
            };
            let _ = tx.send(Message::Mutated { mutation, result });
        });
    }

    /// Submit the create form
    ///
    /// An empty name is rejected here and never reaches the API.
    pub fn create_task(&mut self, form: &CreateTaskForm) -> Result<()> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return Err(e);
            }
        };
        self.mutate(
            Mutation::Create {
                name: request.name.clone(),
            },
            Some(request),
        );
        Ok(())
    }

    pub fn delete_task(&mut self, id: &str) {
        self.mutate(Mutation::Delete { id: id.to_string() }, None);
    }

    pub fn start_task(&mut self, id: &str) {
        self.mutate(Mutation::Start { id: id.to_string() }, None);
    }

    /// Apply every completed request and invalidation; true if anything changed
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message, now);
            changed = true;
        }
        changed | self.drain_invalidations(now)
    }

    /// Wait until every outstanding request has been applied
    pub async fn settle(&mut self, now: Instant) {
        self.pump(now);
        while self.outstanding > 0 {
            match self.rx.recv().await {
                Some(message) => {
                    self.handle(message, now);
                    self.drain_invalidations(now);
                }
                None => break,
            }
        }
    }

    fn handle(&mut self, message: Message, now: Instant) {
        self.outstanding = self.outstanding.saturating_sub(1);
        match message {
            Message::Fetched { ticket, result } => self.on_fetched(ticket, result, now),
            Message::Mutated { mutation, result } => self.on_mutated(mutation, result),
        }
    }

    fn on_fetched(&mut self, ticket: Ticket, result: Result<Fetched>, now: Instant) {
        let succeeded = result.is_ok();
        let result = result.map_err(|e| {
            warn!(key = %ticket.key, error = %e, "Fetch failed");
            self.notice = Some(Notice::fetch_failed(&ticket.key, &e));
            e.to_string()
        });
        let outcome = self.store.apply(&ticket, result);
        if succeeded
            && outcome != ApplyOutcome::Discarded
            && self.notice.as_ref().is_some_and(|n| n.source.as_ref() == Some(&ticket.key))
        {
            self.notice = None;
        }
        if let Some(detail) = self.detail.as_mut() {
            detail.on_fetched(&ticket, &self.store, now);
        }
    }

    fn on_mutated(&mut self, mutation: Mutation, result: Result<Option<Task>>) {
        if let Err(e) = result {
            error!(%mutation, error = %e, "Mutation failed");
            self.notice = Some(Notice::error(format!("Failed to {}: {}", mutation, e)));
            return;
        }
        info!(%mutation, "Mutation succeeded");

        match &mutation {
            Mutation::Create { name } => {
                self.notice = Some(Notice::info(format!("Created task '{}'", name)));
            }
            Mutation::Delete { id } => {
                self.store.evict(&QueryKey::Task(id.clone()));
                self.store.evict(&QueryKey::Execution(id.clone()));
                if self.detail.as_ref().is_some_and(|detail| detail.task_id() == id) {
                    if let Some(mut detail) = self.detail.take() {
                        detail.stop();
                    }
                    self.route = Route::Tasks;
                }
                self.notice = Some(Notice::info(format!("Deleted task {}", id)));
            }
            Mutation::Start { id } => {
                self.store.invalidate(&QueryKey::Task(id.clone()));
                self.store.invalidate(&QueryKey::Execution(id.clone()));
                self.notice = Some(Notice::info(format!("Started task {}", id)));
            }
        }
        self.store.invalidate(&QueryKey::TaskList);
    }

    fn drain_invalidations(&mut self, now: Instant) -> bool {
        let mut changed = false;
        loop {
            match self.invalidations.try_recv() {
                Ok(key) => {
                    changed = true;
                    if let Some(detail) = self.detail.as_mut() {
                        detail.on_invalidated(&key, &self.store, now);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Invalidation events lagged; re-polling detail");
                    changed = true;
                    if let Some(detail) = self.detail.as_mut() {
                        let task_key = detail.task_key();
                        let execution_key = detail.execution_key();
                        detail.on_invalidated(&task_key, &self.store, now);
                        detail.on_invalidated(&execution_key, &self.store, now);
                    }
                }
                Err(_) => break,
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::poll::PollPhase;
    use crate::testing::{fixtures, CallKind, MockTaskApi};

    fn dashboard(mock: &Arc<MockTaskApi>) -> Dashboard {
        Dashboard::new(mock.clone(), DashboardSettings::default())
    }

    #[tokio::test]
    async fn test_list_fetched_once_until_invalidated() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Pending)]));
        let mut dash = dashboard(&mock);
        let now = Instant::now();

        dash.navigate(Route::Root, now);
        assert_eq!(dash.route(), &Route::Tasks);

        dash.tick(now);
        dash.settle(now).await;
        dash.tick(now);
        dash.settle(now).await;
        assert_eq!(mock.count(CallKind::List), 1);
        assert_eq!(dash.rows().len(), 1);

        dash.refresh();
        dash.tick(now);
        dash.settle(now).await;
        assert_eq!(mock.count(CallKind::List), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_list_untouched() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Pending)]));
        let mut dash = dashboard(&mock);
        let now = Instant::now();
        dash.navigate(Route::Tasks, now);
        dash.tick(now);
        dash.settle(now).await;

        mock.fail_next(
            CallKind::Delete,
            ForgeError::Http {
                status: 500,
                body: "boom".into(),
            },
        );
        dash.delete_task("1");
        dash.settle(now).await;

        assert!(!dash.store().task_list().is_stale());
        assert_eq!(dash.rows().len(), 1);
        let notice = dash.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("delete task 1"));
    }

    #[tokio::test]
    async fn test_start_from_detail_rearms_settled_pollers() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Completed)]));
        let mut dash = dashboard(&mock);
        let now = Instant::now();
        dash.navigate(Route::TaskDetail("1".into()), now);

        dash.tick(now);
        dash.settle(now).await;
        dash.tick(now);
        dash.settle(now).await;
        assert!(dash.detail().unwrap().is_settled());
        assert!(dash.detail().unwrap().start_enabled(dash.store()));

        dash.start_task("1");
        dash.settle(now).await;
        dash.tick(now);
        dash.settle(now).await;

        match dash.detail_view().unwrap() {
            DetailView::Loaded(page) => {
                assert_eq!(page.badge.label, "Running");
                assert!(!page.start_enabled);
            }
            other => panic!("unexpected view: {:?}", other),
        }
        assert_eq!(mock.count_for(CallKind::Get, "1"), 2);
        assert_eq!(mock.count_for(CallKind::GetExecution, "1"), 2);
    }

    #[tokio::test]
    async fn test_lagged_invalidations_rearm_both_detail_pollers() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Completed)]));
        let mut dash = dashboard(&mock);
        let now = Instant::now();
        dash.navigate(Route::TaskDetail("1".into()), now);
        dash.tick(now);
        dash.settle(now).await;
        dash.tick(now);
        dash.settle(now).await;
        assert_eq!(dash.detail().unwrap().task_phase(), PollPhase::Settled);
        assert_eq!(dash.detail().unwrap().execution_phase(), PollPhase::Settled);

        for i in 0..=crate::store::EVENT_CAPACITY {
            dash.store.invalidate(&QueryKey::Task(format!("other-{}", i)));
        }
        assert!(dash.pump(now));

        let detail = dash.detail().unwrap();
        assert_eq!(detail.task_phase(), PollPhase::Polling);
        assert_eq!(detail.execution_phase(), PollPhase::Polling);
        assert_eq!(detail.due(now), vec![QueryKey::Task("1".into()), QueryKey::Execution("1".into())]);
    }

    #[tokio::test]
    async fn test_navigating_away_stops_polling() {
        let mock = Arc::new(MockTaskApi::with_tasks(vec![fixtures::task("1", TaskStatus::Running)]));
        let mut dash = dashboard(&mock);
        let now = Instant::now();
        dash.navigate(Route::TaskDetail("1".into()), now);
        dash.tick(now);
        dash.settle(now).await;

        dash.navigate(Route::Tasks, now);
        assert!(dash.detail().is_none());
        assert_eq!(dash.next_wakeup(), None);

        let later = now + std::time::Duration::from_secs(10);
        dash.tick(later);
        dash.settle(later).await;
        assert_eq!(mock.count(CallKind::Get), 1);
    }
}
