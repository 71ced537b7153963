use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{RemoteSink, UploadError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Error registering with Shipyard: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Shipyard refused registration with status {0}")]
    Status(u16),

    #[error("Error reading hostname: {0}")]
    Hostname(#[source] nix::Error),

    #[error("Error finding network interface addresses: {0}")]
    Interfaces(#[source] nix::Error),

    #[error("No usable host IP found, pass one explicitly")]
    NoHostIp,
}

/// Form fields sent to `/agent/register/`
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub port: String,
    pub hostname: String,
}

#[derive(Debug, Deserialize)]
struct AgentData {
    key: String,
}

/// HTTP client for the Shipyard agent API
#[derive(Debug, Clone)]
pub struct ShipyardClient {
    http: reqwest::Client,
    base_url: String,
    key: String,
}

impl ShipyardClient {
    pub fn new(base_url: impl Into<String>, key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeouts(base_url, key, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    /// A remote that stops answering must fail the call, not stall the uploader.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        key: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorization(&self) -> String {
        format!("AgentKey:{}", self.key)
    }

    /// Exchange host details for an agent key. No credential is sent.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<String, RegisterError> {
        let url = format!("{}/agent/register/", self.base_url);
        let response = self.http.post(&url).form(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegisterError::Status(status.as_u16()));
        }

        let data: AgentData = response.json().await?;
        Ok(data.key)
    }
}

#[async_trait]
impl RemoteSink for ShipyardClient {
    async fn post(&self, path: &str, body: Vec<u8>) -> Result<(), UploadError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    async fn spawn_remote(seen: Seen) -> String {
        let app = Router::new()
            .route(
                "/agent/images/",
                post(|State(seen): State<Seen>, headers: HeaderMap, body: String| async move {
                    let auth = headers[AUTHORIZATION].to_str().unwrap().to_string();
                    seen.lock().unwrap().push((auth, serde_json::from_str(&body).unwrap()));
                    StatusCode::OK
                }),
            )
            .route("/agent/containers/", post(|| async { StatusCode::FORBIDDEN }))
            .route(
                "/agent/register/",
                post(|Form(form): Form<HashMap<String, String>>| async move {
                    assert_eq!(form["name"], "node-1");
                    assert_eq!(form["port"], "4500");
                    assert_eq!(form["hostname"], "10.0.0.7");
                    Json(json!({"key": "abc123"}))
                }),
            )
            .with_state(seen);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_post_sets_agent_key() {
        let seen = Seen::default();
        let client = ShipyardClient::new(spawn_remote(seen.clone()).await, "secret").unwrap();

        client.post("/agent/images/", b"[{\"Id\":\"x\"}]".to_vec()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "AgentKey:secret");
        assert_eq!(seen[0].1, json!([{"Id": "x"}]));
    }

    #[tokio::test]
    async fn test_post_non_success_status() {
        let client = ShipyardClient::new(spawn_remote(Seen::default()).await, "secret").unwrap();
        let err = client.post("/agent/containers/", b"[]".to_vec()).await.unwrap_err();
        assert!(matches!(err, UploadError::Status { status: 403, .. }));
    }

    /// Accepts connections and never writes a byte back.
    pub(crate) async fn spawn_silent_remote() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_post_times_out_on_silent_remote() {
        let client = ShipyardClient::with_timeouts(
            spawn_silent_remote().await,
            "secret",
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.post("/agent/images/", b"[]".to_vec()),
        )
        .await
        .expect("post should give up on its own");
        assert!(matches!(result, Err(UploadError::Transport(_))));
    }

    #[tokio::test]
    async fn test_register_returns_key() {
        let client = ShipyardClient::new(spawn_remote(Seen::default()).await, "").unwrap();
        let key = client
            .register(&RegistrationRequest {
                name: "node-1".to_string(),
                port: "4500".to_string(),
                hostname: "10.0.0.7".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(key, "abc123");
    }
}
