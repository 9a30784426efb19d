pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use client::PluaClient;

/// Default execution timeout hint sent to the runtime (seconds)
pub const DEFAULT_EXEC_TIMEOUT: f64 = 30.0;

pub const EXECUTE_PATH: &str = "/plua/execute";
pub const INFO_PATH: &str = "/plua/info";
pub const STATUS_PATH: &str = "/plua/status";

/// Body of `POST /plua/execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    pub timeout: f64,
}

impl ExecuteRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            timeout: DEFAULT_EXEC_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// `null` on the wire is treated the same as a missing field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Error body used by the server for HTTP 4xx/5xx replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExecuteResponse {
    /// Message to show for a failed execution
    pub fn error_message(&self) -> &str {
        self.error
            .as_deref()
            .or(self.detail.as_deref())
            .unwrap_or("Unknown error")
    }
}

/// `GET /plua/info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub lua_version: Option<String>,
    #[serde(default)]
    pub fibaro_api_active: Option<bool>,
    #[serde(default)]
    pub runtime_active: Option<bool>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// `GET /plua/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active_timers: Option<u64>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub pending_callbacks: Option<u64>,
    #[serde(default)]
    pub total_tasks: Option<u64>,
    #[serde(default)]
    pub api_requests_pending: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request never completed or its body could not be interpreted
    #[error("{0}")]
    Transport(String),

    /// The runtime answered but reported a failure
    #[error("{0}")]
    Application(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout(_))
    }

    /// Text shown in the output log
    pub fn display_line(&self) -> String {
        if self.is_transport() {
            format!("Network Error: {}", self)
        } else {
            format!("Error: {}", self)
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

/// The three runtime endpoints the console talks to
#[async_trait]
pub trait RuntimeApi: Send + Sync {
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError>;
    async fn info(&self) -> Result<InfoResponse, ApiError>;
    async fn status(&self) -> Result<StatusResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_request_wire_format() {
        let req = ExecuteRequest::new("return 1");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"code": "return 1", "timeout": 30.0}));
    }

    #[test]
    fn test_null_result_is_absent() {
        let resp: ExecuteResponse =
            serde_json::from_str(r#"{"success": true, "result": null, "output": ""}"#).unwrap();
        assert!(resp.success);
        assert!(resp.result.is_none());
    }

    #[test]
    fn test_error_message_fallbacks() {
        let resp = ExecuteResponse {
            error: Some("bad syntax".to_string()),
            ..Default::default()
        };
        assert_eq!(resp.error_message(), "bad syntax");

        let resp: ExecuteResponse =
            serde_json::from_str(r#"{"detail": "Lua execution timed out after 30.0 seconds"}"#)
                .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error_message(), "Lua execution timed out after 30.0 seconds");

        assert_eq!(ExecuteResponse::default().error_message(), "Unknown error");
    }

    #[test]
    fn test_error_display_prefixes() {
        assert_eq!(
            ApiError::Transport("connection refused".into()).display_line(),
            "Network Error: connection refused"
        );
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(35)).display_line(),
            "Network Error: request timed out after 35s"
        );
        assert_eq!(
            ApiError::Application("boom".into()).display_line(),
            "Error: boom"
        );
    }

    #[test]
    fn test_partial_info_and_status() {
        let info: InfoResponse = serde_json::from_str(r#"{"api_version": "1.0.0"}"#).unwrap();
        assert_eq!(info.api_version.as_deref(), Some("1.0.0"));
        assert!(info.lua_version.is_none());
        assert!(info.features.is_empty());

        let status: StatusResponse =
            serde_json::from_str(r#"{"status": "running", "active_timers": 3}"#).unwrap();
        assert_eq!(status.active_timers, Some(3));
        assert!(status.uptime.is_none());
    }
}
