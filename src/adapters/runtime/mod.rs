//! Transport-agnostic client for the local Docker daemon.
//!
//! Requests go over a fresh unix socket connection per call, or over a
//! pooled HTTP client when Docker listens on TCP. Callers see the same
//! `send` contract either way.

mod tcp;
mod unix;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::config::RuntimeEndpoint;
use crate::ports::RuntimeError;

#[derive(Debug, Clone)]
pub struct RuntimeClient {
    endpoint: RuntimeEndpoint,
    http: reqwest::Client,
}

impl RuntimeClient {
    pub fn new(endpoint: RuntimeEndpoint) -> Result<Self, RuntimeError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(RuntimeError::transport)?;
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &RuntimeEndpoint {
        &self.endpoint
    }

    /// Issue `req` against the daemon. Only the path and query of the
    /// request URI are used.
    pub async fn send(&self, req: Request<Body>) -> Result<Response<Body>, RuntimeError> {
        match &self.endpoint {
            RuntimeEndpoint::Unix(path) => unix::send(path, req).await,
            RuntimeEndpoint::Tcp(base) => tcp::send(&self.http, base, req).await,
        }
    }

    /// GET `path` and decode a successful JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RuntimeError> {
        let bytes = self.get_bytes(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, RuntimeError> {
        let req = Request::get(path)
            .body(Body::empty())
            .map_err(RuntimeError::transport)?;
        let resp = self.send(req).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RuntimeError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let collected = resp
            .into_body()
            .collect()
            .await
            .map_err(RuntimeError::transport)?;
        Ok(collected.to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn mock_daemon() -> Router {
        Router::new()
            .route("/v1.24/containers/json", get(|| async { Json(json!([{"Id": "abc"}])) }))
            .route("/_ping", get(|| async { "OK" }))
    }

    #[tokio::test]
    async fn test_get_json_over_unix_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("docker.sock");
        let listener = tokio::net::UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move { axum::serve(listener, mock_daemon()).await });

        let client = RuntimeClient::new(RuntimeEndpoint::Unix(socket)).unwrap();
        let containers: Vec<Value> = client.get_json("/v1.24/containers/json?all=1").await.unwrap();
        assert_eq!(containers, vec![json!({"Id": "abc"})]);
        assert_eq!(client.get_bytes("/_ping").await.unwrap(), b"OK");
    }

    #[tokio::test]
    async fn test_get_json_over_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, mock_daemon()).await });

        let endpoint = RuntimeEndpoint::parse(&format!("tcp://{}", addr)).unwrap();
        let client = RuntimeClient::new(endpoint).unwrap();
        let containers: Vec<Value> = client.get_json("/v1.24/containers/json?all=1").await.unwrap();
        assert_eq!(containers.len(), 1);
    }

    #[tokio::test]
    async fn test_status_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, mock_daemon()).await });

        let endpoint = RuntimeEndpoint::parse(&format!("http://{}", addr)).unwrap();
        let client = RuntimeClient::new(endpoint).unwrap();
        let err = client.get_json::<Value>("/v1.24/images/json").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_missing_socket_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let client = RuntimeClient::new(RuntimeEndpoint::Unix(dir.path().join("absent.sock"))).unwrap();
        let err = client.get_json::<Value>("/_ping").await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_refused_tcp_is_unreachable() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = RuntimeEndpoint::parse(&format!("tcp://{}", addr)).unwrap();
        let client = RuntimeClient::new(endpoint).unwrap();
        let err = client.get_bytes("/_ping").await.unwrap_err();
        assert!(err.is_unreachable());
    }
}
