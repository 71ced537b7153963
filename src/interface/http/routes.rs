use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::Router;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info_span, Level, Span};

use crate::adapters::RuntimeClient;

use super::proxy::{proxy_handler, ProxyState};

pub fn create_router(runtime: RuntimeClient) -> Router {
    let state = ProxyState { runtime };

    Router::new()
        // Everything is forwarded to Docker
        .fallback(proxy_handler)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(access_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

fn access_span(req: &Request<Body>) -> Span {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());

    info_span!("proxy", method = %req.method(), uri = %req.uri(), client = %client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeEndpoint;
    use axum::extract::RawQuery;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn mock_daemon() -> Router {
        Router::new()
            .route(
                "/containers/json",
                get(|RawQuery(query): RawQuery| async move {
                    assert_eq!(query.as_deref(), Some("all=1"));
                    let mut headers = HeaderMap::new();
                    headers.insert("x-docker-mock", "yes".parse().unwrap());
                    headers.insert("content-type", "application/json".parse().unwrap());
                    (StatusCode::OK, headers, r#"[{"Id":"abc"}]"#)
                }),
            )
            .route(
                "/containers/{id}/attach",
                post(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
            )
            .route("/containers/create", post(|body: String| async move { (StatusCode::CREATED, body) }))
            .route(
                "/containers/missing/json",
                get(|| async { (StatusCode::NOT_FOUND, "No such container: missing").into_response() }),
            )
    }

    async fn unix_runtime(dir: &tempfile::TempDir) -> RuntimeClient {
        let socket = dir.path().join("docker.sock");
        let listener = tokio::net::UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move { axum::serve(listener, mock_daemon()).await });
        RuntimeClient::new(RuntimeEndpoint::Unix(socket)).unwrap()
    }

    async fn tcp_runtime() -> RuntimeClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, mock_daemon()).await });
        RuntimeClient::new(RuntimeEndpoint::parse(&format!("tcp://{}", addr)).unwrap()).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn assert_list_passthrough(app: Router) {
        let response = app
            .oneshot(Request::get("/containers/json?all=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-docker-mock"], "yes");
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body_string(response).await, r#"[{"Id":"abc"}]"#);
    }

    #[tokio::test]
    async fn test_proxy_over_unix_socket() {
        let dir = tempfile::tempdir().unwrap();
        assert_list_passthrough(create_router(unix_runtime(&dir).await)).await;
    }

    #[tokio::test]
    async fn test_proxy_over_tcp() {
        assert_list_passthrough(create_router(tcp_runtime().await)).await;
    }

    #[tokio::test]
    async fn test_proxy_forwards_body_and_status() {
        let dir = tempfile::tempdir().unwrap();
        for runtime in [unix_runtime(&dir).await, tcp_runtime().await] {
            let response = create_router(runtime)
                .oneshot(
                    Request::post("/containers/create")
                        .header("content-type", "application/json")
                        .body(Body::from(r#"{"Image":"nginx"}"#))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            assert_eq!(body_string(response).await, r#"{"Image":"nginx"}"#);
        }
    }

    #[tokio::test]
    async fn test_proxy_passes_errors_through() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(unix_runtime(&dir).await)
            .oneshot(Request::get("/containers/missing/json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "No such container: missing");
    }

    #[tokio::test]
    async fn test_proxy_rewrites_attach() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(unix_runtime(&dir).await)
            .oneshot(Request::post("/containers/abc/attach?stderr=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "stderr=1&logs=1&stream=0&stdout=1");
    }

    #[tokio::test]
    async fn test_proxy_dial_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = RuntimeClient::new(RuntimeEndpoint::Unix(dir.path().join("gone.sock"))).unwrap();
        let app = create_router(runtime);

        let response = app
            .clone()
            .oneshot(Request::get("/containers/json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_string(response).await.starts_with("Error connecting to Docker"));

        // The router keeps serving after a failed dial
        let response = app
            .oneshot(Request::get("/_ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_served_with_connect_info() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(unix_runtime(&dir).await);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await
        });

        let response = reqwest::get(format!("http://{}/containers/json?all=1", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.headers()["x-docker-mock"], "yes");
        assert_eq!(response.text().await.unwrap(), r#"[{"Id":"abc"}]"#);
    }
}
