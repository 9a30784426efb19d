//! Status tab: the display fields and the poller that keeps them fresh

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, InfoResponse, RuntimeApi, StatusResponse};
use crate::app::AppEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

const UNKNOWN: &str = "Unknown";
const ERROR: &str = "Error";
const LOADING: &str = "Loading...";

/// One fetch of both telemetry endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub info: InfoResponse,
    pub status: StatusResponse,
}

/// Fetch info and status concurrently; either failing fails the snapshot
pub async fn fetch_snapshot(api: &dyn RuntimeApi) -> Result<StatusSnapshot, ApiError> {
    let (info, status) = tokio::join!(api.info(), api.status());
    Ok(StatusSnapshot {
        info: info?,
        status: status?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPanel {
    pub api_version: String,
    pub lua_version: String,
    pub runtime_status: String,
    pub active_timers: String,
    pub uptime: String,
    pub fibaro: String,
    pub pending_callbacks: String,
    pub total_tasks: String,
    pub last_updated: Option<String>,
}

impl Default for StatusPanel {
    fn default() -> Self {
        Self {
            api_version: LOADING.to_string(),
            lua_version: LOADING.to_string(),
            runtime_status: LOADING.to_string(),
            active_timers: LOADING.to_string(),
            uptime: LOADING.to_string(),
            fibaro: LOADING.to_string(),
            pending_callbacks: LOADING.to_string(),
            total_tasks: LOADING.to_string(),
            last_updated: None,
        }
    }
}

impl StatusPanel {
    pub fn apply(&mut self, snapshot: &StatusSnapshot, at: &str) {
        let info = &snapshot.info;
        let status = &snapshot.status;

        self.api_version = info.api_version.clone().unwrap_or_else(|| UNKNOWN.into());
        self.lua_version = info.lua_version.clone().unwrap_or_else(|| UNKNOWN.into());
        self.runtime_status = status.status.clone().unwrap_or_else(|| UNKNOWN.into());
        self.active_timers = status.active_timers.unwrap_or(0).to_string();
        self.uptime = status.uptime.clone().unwrap_or_else(|| UNKNOWN.into());
        self.fibaro = if info.fibaro_api_active.unwrap_or(false) {
            "✓ Active".to_string()
        } else {
            "✗ Inactive".to_string()
        };
        self.pending_callbacks = status
            .pending_callbacks
            .map(|n| n.to_string())
            .unwrap_or_else(|| UNKNOWN.into());
        self.total_tasks = status
            .total_tasks
            .map(|n| n.to_string())
            .unwrap_or_else(|| UNKNOWN.into());
        self.last_updated = Some(at.to_string());
    }

    /// Mark the identity fields as failed; the rest keep their last values
    pub fn apply_error(&mut self) {
        self.api_version = ERROR.to_string();
        self.lua_version = ERROR.to_string();
        self.runtime_status = ERROR.to_string();
    }

    /// Rows for the status table, in display order
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("API Version", &self.api_version),
            ("Lua Version", &self.lua_version),
            ("Runtime Status", &self.runtime_status),
            ("Active Timers", &self.active_timers),
            ("Uptime", &self.uptime),
            ("Fibaro API", &self.fibaro),
            ("Pending Callbacks", &self.pending_callbacks),
            ("Total Tasks", &self.total_tasks),
        ]
    }
}

async fn refresh_once(api: &dyn RuntimeApi, tx: &mpsc::UnboundedSender<AppEvent>) -> bool {
    let result = fetch_snapshot(api).await;
    if let Err(e) = &result {
        tracing::warn!("Failed to load status data: {}", e);
    }
    tx.send(AppEvent::StatusRefreshed(result)).is_ok()
}

/// Spawn a single refresh, optionally after a delay
pub fn spawn_refresh(
    api: Arc<dyn RuntimeApi>,
    delay: Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        refresh_once(api.as_ref(), &tx).await;
    });
}

/// Periodic status refresh that only runs while the status tab is showing.
///
/// `start` refreshes immediately and then once per interval until `stop`.
pub struct StatusPoller {
    api: Arc<dyn RuntimeApi>,
    interval: Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
    cancel: Option<CancellationToken>,
}

impl StatusPoller {
    pub fn new(
        api: Arc<dyn RuntimeApi>,
        interval: Duration,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            api,
            interval,
            tx,
            cancel: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| !c.is_cancelled())
    }

    pub fn start(&mut self) {
        self.stop();

        let token = CancellationToken::new();
        let child = token.clone();
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let period = self.interval;

        tracing::debug!("Starting status poller ({:?})", period);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if !refresh_once(api.as_ref(), &tx).await {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Status poller stopped");
        });

        self.cancel = Some(token);
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
