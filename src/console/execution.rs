//! Code submission: the submit control, the request task and how outcomes
//! turn into output lines

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::output::OutputLine;
use crate::api::{ApiError, ExecuteRequest, ExecuteResponse, RuntimeApi};
use crate::app::AppEvent;

pub const EXECUTE_LABEL: &str = "Execute";
pub const EXECUTING_LABEL: &str = "Executing...";

pub type ExecutionOutcome = Result<ExecuteResponse, ApiError>;

/// The "Execute" button. Disabled while a submission is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: &'static str,
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self {
            enabled: true,
            label: EXECUTE_LABEL,
        }
    }
}

impl SubmitControl {
    pub fn begin(&mut self) {
        self.enabled = false;
        self.label = EXECUTING_LABEL;
    }

    pub fn finish(&mut self) {
        self.enabled = true;
        self.label = EXECUTE_LABEL;
    }
}

/// Run one execute request off the UI loop and report back on `tx`.
///
/// `client_timeout` bounds the whole call so a hung runtime cannot leave the
/// submit control disabled forever.
pub fn spawn_execution(
    api: Arc<dyn RuntimeApi>,
    request: ExecuteRequest,
    client_timeout: Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = run_execution(api.as_ref(), &request, client_timeout).await;
        if tx.send(AppEvent::ExecutionFinished(outcome)).is_err() {
            tracing::debug!("Execution finished after the console closed");
        }
    })
}

pub async fn run_execution(
    api: &dyn RuntimeApi,
    request: &ExecuteRequest,
    client_timeout: Duration,
) -> ExecutionOutcome {
    match tokio::time::timeout(client_timeout, api.execute(request)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!("Execution request exceeded {:?}", client_timeout);
            Err(ApiError::Timeout(client_timeout))
        }
    }
}

/// Lines appended to the log once a submission completes
pub fn outcome_lines(outcome: &ExecutionOutcome) -> Vec<OutputLine> {
    let mut lines = Vec::new();

    match outcome {
        Ok(resp) if resp.success => {
            if let Some(text) = resp.output.as_deref().map(str::trim) {
                if !text.is_empty() {
                    lines.push(OutputLine::result(text));
                }
            }

            if let Some(value) = &resp.result {
                if !value.is_null() {
                    lines.push(OutputLine::result(format!("=> {}", render_value(value))));
                }
            }
        }
        Ok(resp) => {
            let err = ApiError::Application(resp.error_message().to_string());
            lines.push(OutputLine::error(err.display_line()));
        }
        Err(e) => {
            lines.push(OutputLine::error(e.display_line()));
        }
    }

    lines
}

/// Compact JSON rendering of a result value
fn render_value(value: &serde_json::Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}
