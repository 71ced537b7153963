use axum::body::Body;
use axum::http::header::HOST;
use axum::http::{Request, Response};
use hyper::body::Body as _;
use reqwest::Url;

use crate::ports::RuntimeError;

/// Forward `req` to `base` through the pooled client, rewriting only the
/// destination host.
pub(super) async fn send(
    http: &reqwest::Client,
    base: &Url,
    req: Request<Body>,
) -> Result<Response<Body>, RuntimeError> {
    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = Url::parse(&format!("{}{}", base.as_str().trim_end_matches('/'), path_and_query))
        .map_err(RuntimeError::transport)?;

    let mut headers = parts.headers;
    headers.remove(HOST);

    let mut builder = http.request(parts.method, url).headers(headers);
    if body.size_hint().exact() != Some(0) {
        builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream = builder.send().await.map_err(|e| {
        if e.is_connect() {
            RuntimeError::Unreachable {
                endpoint: base.to_string(),
                source: std::io::Error::other(e),
            }
        } else {
            RuntimeError::transport(e)
        }
    })?;

    let mut response = Response::builder().status(upstream.status());
    if let Some(headers) = response.headers_mut() {
        *headers = upstream.headers().clone();
    }
    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(RuntimeError::transport)
}
