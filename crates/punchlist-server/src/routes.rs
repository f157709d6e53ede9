//! Request routing for the issue API.
//!
//! One route family exists: `/api/issues/{project}` with GET/POST/PUT/
//! DELETE. Everything else is a plain-text 404. API responses are always
//! HTTP 200 with a JSON body; the body shape is the sole outcome signal.

use crate::api::Api;
use crate::models::parse_body;
use crate::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode, Uri};
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Routes requests to the API operations.
pub struct Router {
    api: Api,
}

impl Router {
    /// Create a router over the shared state.
    pub fn new(state: AppState) -> Self {
        Self {
            api: Api::new(state),
        }
    }

    /// Dispatch one request to a response.
    ///
    /// Takes the already-collected body so tests can drive the router
    /// without a socket.
    pub async fn dispatch(
        &self,
        method: &Method,
        uri: &Uri,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Response<Full<Bytes>> {
        let Some(project) = api_project(uri.path()) else {
            return not_found();
        };

        let value = match *method {
            Method::GET => self.api.list(&project, uri.query()).await,
            Method::POST => {
                self.api
                    .create(&project, parse_body(content_type, body))
                    .await
            }
            Method::PUT => {
                self.api
                    .update(&project, parse_body(content_type, body))
                    .await
            }
            Method::DELETE => {
                self.api
                    .delete(&project, parse_body(content_type, body))
                    .await
            }
            _ => return not_found(),
        };

        json_response(&value)
    }
}

/// Extract the project name from an API path.
///
/// Returns `None` for anything that is not `/api/issues/{project}` with a
/// single non-empty segment. A trailing slash is tolerated; the segment is
/// percent-decoded.
fn api_project(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/api/issues/")?;
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(percent_decode_str(rest).decode_utf8_lossy().into_owned())
}

/// Build the standard 200 JSON response.
fn json_response(value: &Value) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"[]".to_vec());
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"[]"))))
}

/// Plain-text 404 for non-API paths.
fn not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(b"Not Found")))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"Not Found"))))
}
