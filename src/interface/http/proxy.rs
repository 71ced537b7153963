use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::uri::InvalidUri;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::adapters::RuntimeClient;
use crate::ports::RuntimeError;

/// Appended to attach requests so every daemon version returns logs only
const ATTACH_QUERY: &str = "logs=1&stream=0&stdout=1";

/// Runtime failure rendered as a proxy response
#[derive(Debug)]
pub struct ProxyError(RuntimeError);

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = if self.0.is_unreachable() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, format!("Error connecting to Docker: {}", self.0)).into_response()
    }
}

impl From<RuntimeError> for ProxyError {
    fn from(err: RuntimeError) -> Self {
        ProxyError(err)
    }
}

/// Shared proxy state
#[derive(Clone)]
pub struct ProxyState {
    pub runtime: RuntimeClient,
}

/// Handler for every method and path: replay the request against Docker
/// and stream its response back untouched.
pub async fn proxy_handler(State(state): State<ProxyState>, mut req: Request<Body>) -> Response {
    match rewrite_attach(req.uri()) {
        Ok(Some(uri)) => *req.uri_mut() = uri,
        Ok(None) => {}
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }

    debug!(method = %req.method(), uri = %req.uri(), "Proxying Docker request");

    match state.runtime.send(req).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, endpoint = %state.runtime.endpoint(), "Error connecting to Docker");
            ProxyError::from(e).into_response()
        }
    }
}

/// Force log retrieval semantics onto `.../attach` requests.
///
/// Returns `None` when the URI has no `attach` segment.
pub fn rewrite_attach(uri: &Uri) -> Result<Option<Uri>, InvalidUri> {
    let path = uri.path();
    if !path.split('/').any(|segment| segment == "attach") {
        return Ok(None);
    }

    let path_and_query = match uri.query() {
        Some(query) if !query.is_empty() => format!("{}?{}&{}", path, query, ATTACH_QUERY),
        _ => format!("{}?{}", path, ATTACH_QUERY),
    };

    // Only the origin form is forwarded, scheme and authority are dropped
    Ok(Some(Uri::try_from(path_and_query)?))
}
