use std::path::Path;

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::{HeaderValue, Request, Response, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tracing::debug;

use crate::ports::RuntimeError;

/// Dial the socket, replay `req` over it and hand back the streaming response.
///
/// The connection is not reused; it closes once the response body is drained.
pub(super) async fn send(path: &Path, mut req: Request<Body>) -> Result<Response<Body>, RuntimeError> {
    let stream = UnixStream::connect(path)
        .await
        .map_err(|source| RuntimeError::Unreachable {
            endpoint: format!("unix://{}", path.display()),
            source,
        })?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(RuntimeError::transport)?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "Docker socket connection ended with error");
        }
    });

    let origin: Uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .parse()
        .map_err(RuntimeError::transport)?;
    *req.uri_mut() = origin;

    if !req.headers().contains_key(HOST) {
        req.headers_mut().insert(HOST, HeaderValue::from_static("localhost"));
    }

    let resp = sender
        .send_request(req)
        .await
        .map_err(RuntimeError::transport)?;

    Ok(resp.map(Body::new))
}
