//! Self-terminating poll loop for a single resource
//!
//! Whether another fetch is scheduled depends only on the status carried by
//! the most recent completed fetch. There is no timeout and no retry count.

use crate::models::TaskStatus;
use std::time::Duration;
use tokio::time::Instant;

/// Default delay between two polls of an active resource
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Where a poller stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Not armed, or stopped
    Idle,
    /// A fetch is scheduled or in flight
    Polling,
    /// Last observed status was settled (or there was no record)
    Settled,
}

/// Cadence rule shared by every poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Delay until the next poll, or `None` to stop polling
    ///
    /// `None` as input means the resource has no record.
    pub fn next_poll_delay(&self, last_status: Option<&TaskStatus>) -> Option<Duration> {
        match last_status {
            Some(status) if status.is_active() => Some(self.interval),
            _ => None,
        }
    }
}

/// Poll scheduler for one resource
#[derive(Debug, Clone)]
pub struct Poller {
    policy: PollPolicy,
    phase: PollPhase,
    next_due: Option<Instant>,
    dispatched: Option<u64>,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            phase: PollPhase::Idle,
            next_due: None,
            dispatched: None,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn in_flight(&self) -> bool {
        self.dispatched.is_some()
    }

    /// Start polling; the first fetch is due at `now`
    ///
    /// A fetch already in flight is forgotten; its result will not be
    /// [`awaiting`](Self::awaiting).
    pub fn arm(&mut self, now: Instant) {
        self.phase = PollPhase::Polling;
        self.next_due = Some(now);
        self.dispatched = None;
    }

    /// A fetch should be dispatched now
    pub fn is_due(&self, now: Instant) -> bool {
        self.phase == PollPhase::Polling
            && self.dispatched.is_none()
            && self.next_due.is_some_and(|due| now >= due)
    }

    /// Record that the fetch with `epoch` has been sent
    ///
    /// No further poll becomes due until its result is reported.
    pub fn mark_dispatched(&mut self, epoch: u64) {
        self.dispatched = Some(epoch);
        self.next_due = None;
    }

    /// The poller is waiting for the fetch with `epoch`
    pub fn awaiting(&self, epoch: u64) -> bool {
        self.dispatched == Some(epoch)
    }

    /// Feed the status of a completed fetch
    pub fn on_result(&mut self, status: Option<&TaskStatus>, now: Instant) {
        self.dispatched = None;
        if self.phase == PollPhase::Idle {
            return;
        }
        match self.policy.next_poll_delay(status) {
            Some(delay) => {
                self.phase = PollPhase::Polling;
                self.next_due = Some(now + delay);
            }
            None => {
                self.phase = PollPhase::Settled;
                self.next_due = None;
            }
        }
    }

    pub fn stop(&mut self) {
        self.phase = PollPhase::Idle;
        self.next_due = None;
        self.dispatched = None;
    }
}
