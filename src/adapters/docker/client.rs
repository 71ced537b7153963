use async_trait::async_trait;
use serde_json::Value;

use crate::adapters::runtime::RuntimeClient;
use crate::domain::{ContainerId, Image};
use crate::ports::{ContainerSource, RuntimeError};

/// Docker Engine API on top of the runtime client
#[derive(Debug, Clone)]
pub struct DockerApi {
    client: RuntimeClient,
    api_version: String,
}

impl DockerApi {
    pub fn new(client: RuntimeClient, api_version: impl Into<String>) -> Self {
        Self {
            client,
            api_version: api_version.into(),
        }
    }

    fn versioned(&self, path: &str) -> String {
        if self.api_version.is_empty() {
            path.to_string()
        } else {
            format!("/{}{}", self.api_version, path)
        }
    }

    /// Check that the daemon answers at all
    pub async fn ping(&self) -> Result<(), RuntimeError> {
        self.client.get_bytes("/_ping").await.map(|_| ())
    }
}

#[async_trait]
impl ContainerSource for DockerApi {
    async fn list_containers(&self) -> Result<Vec<Value>, RuntimeError> {
        self.client
            .get_json(&self.versioned("/containers/json?all=1"))
            .await
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<Value, RuntimeError> {
        self.client
            .get_json(&self.versioned(&format!("/containers/{}/json?all=1", id)))
            .await
    }

    async fn list_images(&self) -> Result<Vec<Image>, RuntimeError> {
        self.client.get_json(&self.versioned("/images/json?all=0")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeEndpoint;
    use axum::extract::{Path, Query};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_daemon() -> DockerApi {
        let app = Router::new()
            .route(
                "/v1.24/containers/json",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q.get("all").map(String::as_str), Some("1"));
                    Json(json!([{"Id": "c1"}, {"Id": "c2"}]))
                }),
            )
            .route(
                "/v1.24/containers/{id}/json",
                get(|Path(id): Path<String>| async move { Json(json!({"Id": id, "State": {"Running": true}})) }),
            )
            .route(
                "/v1.24/images/json",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q.get("all").map(String::as_str), Some("0"));
                    Json(json!([{"Id": "sha256:1", "Created": 1, "RepoTags": ["nginx:latest"], "Size": 10, "VirtualSize": 20}]))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let endpoint = RuntimeEndpoint::parse(&format!("tcp://{}", addr)).unwrap();
        DockerApi::new(RuntimeClient::new(endpoint).unwrap(), "v1.24")
    }

    #[tokio::test]
    async fn test_list_and_inspect() {
        let api = spawn_daemon().await;
        let containers = api.list_containers().await.unwrap();
        assert_eq!(containers.len(), 2);

        let detail = api.inspect_container(&ContainerId::new("c2")).await.unwrap();
        assert_eq!(detail["Id"], "c2");
        assert_eq!(detail["State"]["Running"], true);
    }

    #[tokio::test]
    async fn test_list_images() {
        let api = spawn_daemon().await;
        let images = api.list_images().await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].repo_tags, vec!["nginx:latest".to_string()]);
        assert_eq!(images[0].virtual_size, 20);
    }

    #[test]
    fn test_unversioned_paths() {
        let client = RuntimeClient::new(RuntimeEndpoint::Unix("/tmp/docker.sock".into())).unwrap();
        let api = DockerApi::new(client.clone(), "");
        assert_eq!(api.versioned("/images/json"), "/images/json");
        let api = DockerApi::new(client, "v1.41");
        assert_eq!(api.versioned("/images/json"), "/v1.41/images/json");
    }
}
