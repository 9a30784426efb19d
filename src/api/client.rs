//! HTTP client for the plua runtime API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{
    ApiError, ExecuteRequest, ExecuteResponse, InfoResponse, RuntimeApi, StatusResponse,
    EXECUTE_PATH, INFO_PATH, STATUS_PATH,
};

pub struct PluaClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PluaClient {
    /// Create a client for the runtime at `base_url` (e.g. `http://localhost:8888`)
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        // reqwest::Client::new() is infallible, fall back to it if the builder fails
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.http_client.get(self.url(path)).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("GET {} returned {}", path, status);
            return Err(ApiError::Transport(format!("HTTP {}", status.as_u16())));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("invalid response from {}: {}", path, e)))
    }
}

#[async_trait]
impl RuntimeApi for PluaClient {
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        tracing::debug!("POST {} ({} bytes of code)", EXECUTE_PATH, request.code.len());

        let response = self
            .http_client
            .post(self.url(EXECUTE_PATH))
            .json(request)
            .send()
            .await?;

        // Failed executions come back as 4xx/5xx with a `detail` body, so the
        // status code alone does not make this a transport failure.
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ExecuteResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) if status.is_success() => Err(ApiError::Transport(format!(
                "invalid response from {}: {}",
                EXECUTE_PATH, e
            ))),
            Err(_) => Err(ApiError::Transport(format!("HTTP {}", status.as_u16()))),
        }
    }

    async fn info(&self) -> Result<InfoResponse, ApiError> {
        self.get_json(INFO_PATH).await
    }

    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.get_json(STATUS_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PluaClient {
        PluaClient::new(&format!("{}/", server.uri()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_execute_posts_code_and_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/plua/execute"))
            .and(body_json(json!({"code": "return 2 + 3", "timeout": 30.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "output": "5\n",
                "result": 5,
                "error": null,
                "execution_time_ms": 1.5,
                "request_id": "abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resp = client
            .execute(&ExecuteRequest::new("return 2 + 3"))
            .await
            .unwrap();

        assert!(resp.success);
        assert_eq!(resp.output.as_deref(), Some("5\n"));
        assert_eq!(resp.result, Some(json!(5)));
        assert_eq!(resp.execution_time_ms, Some(1.5));
    }

    #[tokio::test]
    async fn test_execute_error_status_with_detail_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/plua/execute"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"detail": "Lua syntax error: unexpected symbol"})),
            )
            .mount(&server)
            .await;

        let resp = client_for(&server)
            .execute(&ExecuteRequest::new("return +"))
            .await
            .unwrap();

        assert!(!resp.success);
        assert_eq!(resp.error_message(), "Lua syntax error: unexpected symbol");
    }

    #[tokio::test]
    async fn test_execute_garbage_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/plua/execute"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .execute(&ExecuteRequest::new("print(1)"))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(err.display_line().starts_with("Network Error:"));
    }

    #[tokio::test]
    async fn test_execute_unreachable_host_is_transport_error() {
        // Nothing listens on port 9 on loopback
        let client = PluaClient::new("http://127.0.0.1:9", Duration::from_secs(2));
        let err = client
            .execute(&ExecuteRequest::new("print(1)"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_info_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plua/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "api_version": "1.0.0",
                "lua_version": "5.4",
                "runtime_active": true,
                "features": ["timers", "networking"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/plua/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "running",
                "active_timers": 2,
                "pending_callbacks": 0,
                "total_tasks": 4
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let info = client.info().await.unwrap();
        assert_eq!(info.lua_version.as_deref(), Some("5.4"));
        assert_eq!(info.fibaro_api_active, None);
        assert_eq!(info.features.len(), 2);

        let status = client.status().await.unwrap();
        assert_eq!(status.status.as_deref(), Some("running"));
        assert_eq!(status.active_timers, Some(2));
        assert_eq!(status.total_tasks, Some(4));
    }

    #[tokio::test]
    async fn test_status_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plua/status"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Failed"})))
            .mount(&server)
            .await;

        let err = client_for(&server).status().await.unwrap_err();
        assert_eq!(err, ApiError::Transport("HTTP 500".to_string()));
    }
}
