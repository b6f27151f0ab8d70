//! Common test utilities and setup

#![allow(dead_code)]

use forge_dashboard::testing::MockTaskApi;
use forge_dashboard::{Dashboard, DashboardSettings, PollPolicy, Route};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const BACKEND: &str = "http://backend.test:9000";
pub const INTERVAL: Duration = Duration::from_millis(1000);

pub fn settings() -> DashboardSettings {
    DashboardSettings {
        base_url: BACKEND.to_string(),
        policy: PollPolicy::new(INTERVAL),
        ..DashboardSettings::default()
    }
}

pub fn dashboard(mock: &Arc<MockTaskApi>) -> Dashboard {
    Dashboard::new(mock.clone(), settings())
}

/// Dispatch whatever is due and wait for it to land
pub async fn step(dashboard: &mut Dashboard) {
    let now = Instant::now();
    dashboard.tick(now);
    dashboard.settle(now).await;
}

/// Dashboard on `route` with its first fetches applied
pub async fn open(mock: &Arc<MockTaskApi>, route: Route) -> Dashboard {
    let mut dashboard = dashboard(mock);
    dashboard.navigate(route, Instant::now());
    step(&mut dashboard).await;
    dashboard
}

/// Advance the paused clock by one poll interval, then poll
pub async fn next_poll(dashboard: &mut Dashboard) {
    tokio::time::advance(INTERVAL).await;
    step(dashboard).await;
}
