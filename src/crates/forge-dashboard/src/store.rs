//! Keyed in-memory cache of fetched backend resources
//!
//! Every request is stamped with an epoch from a store-wide counter. A
//! response is applied only when its epoch is newer than what the slot has
//! already applied and not older than the slot's invalidation floor, so
//! out-of-order completions and pre-mutation responses are dropped.

use crate::models::{ExecutionState, Task, TaskSummary};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub(crate) const EVENT_CAPACITY: usize = 64;

/// Identity of a cached resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    TaskList,
    Task(String),
    Execution(String),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskList => write!(f, "tasks"),
            Self::Task(id) => write!(f, "tasks/{}", id),
            Self::Execution(id) => write!(f, "tasks/{}/execution", id),
        }
    }
}

/// Handle for one in-flight request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: QueryKey,
    pub epoch: u64,
}

/// Payload of a successful fetch
///
/// `Task(None)` means the backend answered but has no such task.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    TaskList(Vec<TaskSummary>),
    Task(Option<Task>),
    Execution(ExecutionState),
}

/// Result of [`QueryStore::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Discarded,
}

#[derive(Debug, Clone, Default)]
struct SlotState {
    /// First epoch that belongs to this slot
    origin: u64,
    error: Option<String>,
    stale: bool,
    issued: u64,
    applied: u64,
    floor: u64,
    in_flight: usize,
}

/// One cached resource
#[derive(Debug, Clone)]
pub struct Query<T> {
    state: SlotState,
    data: Option<T>,
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self {
            state: SlotState::default(),
            data: None,
        }
    }
}

impl<T> Query<T> {
    /// Last successfully fetched data
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Error of the last applied response, cleared by the next success
    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.state.stale
    }

    /// Epoch of the most recent request issued for this slot
    pub fn last_issued(&self) -> u64 {
        self.state.issued
    }

    pub fn is_fetching(&self) -> bool {
        self.state.in_flight > 0
    }

    /// Never loaded or invalidated, and nothing on the way
    pub fn needs_fetch(&self) -> bool {
        !self.is_fetching() && (self.state.stale || (self.data.is_none() && self.state.error.is_none()))
    }
}

/// The cache itself; owned by a single writer
#[derive(Debug)]
pub struct QueryStore {
    next_epoch: u64,
    list: Query<Vec<TaskSummary>>,
    tasks: HashMap<String, Query<Option<Task>>>,
    executions: HashMap<String, Query<ExecutionState>>,
    events: broadcast::Sender<QueryKey>,
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            next_epoch: 1,
            list: Query::default(),
            tasks: HashMap::new(),
            executions: HashMap::new(),
            events,
        }
    }

    /// Receive every invalidated key
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.events.subscribe()
    }

    pub fn task_list(&self) -> &Query<Vec<TaskSummary>> {
        &self.list
    }

    pub fn task(&self, id: &str) -> Option<&Query<Option<Task>>> {
        self.tasks.get(id)
    }

    pub fn execution(&self, id: &str) -> Option<&Query<ExecutionState>> {
        self.executions.get(id)
    }

    /// Loaded task record, if any
    pub fn task_record(&self, id: &str) -> Option<&Task> {
        self.task(id).and_then(|query| query.data()).and_then(|task| task.as_ref())
    }

    /// Issue a ticket for a new request on `key`
    pub fn begin(&mut self, key: QueryKey) -> Ticket {
        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let floor = epoch;
        let state = self.state_or_insert(&key, floor);
        state.issued = epoch;
        state.in_flight += 1;

        Ticket { key, epoch }
    }

    /// Apply a completed request
    ///
    /// A success replaces the data wholesale; a failure records `error` and
    /// keeps the data. Both clear the stale flag.
    pub fn apply(&mut self, ticket: &Ticket, result: Result<Fetched, String>) -> ApplyOutcome {
        let Some(state) = self.state_mut(&ticket.key) else {
            debug!(key = %ticket.key, epoch = ticket.epoch, "Discarding response for evicted query");
            return ApplyOutcome::Discarded;
        };
        if ticket.epoch >= state.origin {
            state.in_flight = state.in_flight.saturating_sub(1);
        }

        if ticket.epoch < state.floor || ticket.epoch <= state.applied {
            debug!(
                key = %ticket.key,
                epoch = ticket.epoch,
                applied = state.applied,
                floor = state.floor,
                "Discarding stale response"
            );
            return ApplyOutcome::Discarded;
        }
        state.applied = ticket.epoch;
        state.stale = false;

        match result {
            Ok(fetched) => self.store_data(&ticket.key, fetched),
            Err(message) => {
                if let Some(state) = self.state_mut(&ticket.key) {
                    state.error = Some(message);
                }
                ApplyOutcome::Applied
            }
        }
    }

    fn store_data(&mut self, key: &QueryKey, fetched: Fetched) -> ApplyOutcome {
        match (key, fetched) {
            (QueryKey::TaskList, Fetched::TaskList(rows)) => {
                self.list.data = Some(rows);
                self.list.state.error = None;
            }
            (QueryKey::Task(id), Fetched::Task(task)) => {
                if let Some(query) = self.tasks.get_mut(id) {
                    query.data = Some(task);
                    query.state.error = None;
                }
            }
            (QueryKey::Execution(id), Fetched::Execution(execution)) => {
                if let Some(query) = self.executions.get_mut(id) {
                    query.data = Some(execution);
                    query.state.error = None;
                }
            }
            (key, _) => {
                warn!(%key, "Response payload does not match query key");
                return ApplyOutcome::Discarded;
            }
        }
        ApplyOutcome::Applied
    }

    /// Mark `key` stale and fence off every request issued so far
    pub fn invalidate(&mut self, key: &QueryKey) {
        let floor = self.next_epoch;
        if let Some(state) = self.state_mut(key) {
            state.stale = true;
            state.floor = floor;
        }
        debug!(%key, floor, "Invalidated query");
        // no receivers is fine
        let _ = self.events.send(key.clone());
    }

    /// Drop a slot entirely
    pub fn evict(&mut self, key: &QueryKey) {
        match key {
            QueryKey::TaskList => self.list = Query::default(),
            QueryKey::Task(id) => {
                self.tasks.remove(id);
            }
            QueryKey::Execution(id) => {
                self.executions.remove(id);
            }
        }
        debug!(%key, "Evicted query");
    }

    fn state_mut(&mut self, key: &QueryKey) -> Option<&mut SlotState> {
        match key {
            QueryKey::TaskList => Some(&mut self.list.state),
            QueryKey::Task(id) => self.tasks.get_mut(id).map(|query| &mut query.state),
            QueryKey::Execution(id) => self.executions.get_mut(id).map(|query| &mut query.state),
        }
    }

    /// New slots start with `floor` so responses issued before their
    /// creation (e.g. before an eviction) never land in them.
    fn state_or_insert(&mut self, key: &QueryKey, floor: u64) -> &mut SlotState {
        let fresh = |floor| SlotState {
            origin: floor,
            floor,
            ..SlotState::default()
        };
        match key {
            QueryKey::TaskList => &mut self.list.state,
            QueryKey::Task(id) => {
                &mut self
                    .tasks
                    .entry(id.clone())
                    .or_insert_with(|| Query {
                        state: fresh(floor),
                        data: None,
                    })
                    .state
            }
            QueryKey::Execution(id) => {
                &mut self
                    .executions
                    .entry(id.clone())
                    .or_insert_with(|| Query {
                        state: fresh(floor),
                        data: None,
                    })
                    .state
            }
        }
    }
}
