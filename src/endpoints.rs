//! Contains all endpoint functions. Record endpoints are in `student`, the cash summary in
//! `cashier`; the liveness check lives here.
//!
//! Every handler reloads the whole collection from the store. Positions in paths are indexes into
//! that fresh load, so they shift after a delete.

use axum::{
    body::Body,
    http::{Response, StatusCode, header::CONTENT_TYPE},
};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;

pub mod cashier;
pub mod student;

/// Serializes `body` into a JSON response with the given status
fn json_response(status: StatusCode, body: &impl Serialize) -> Result<Response<Body>, ApiError> {
    let json = serde_json::to_string(body).map_err(|e| ApiError::Internal(e.to_string()))?;

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(json.into())
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Resolves a path position against the current collection length. Anything that isn't a valid
/// index, negative numbers included, is not found.
fn resolve_position(position: &str, len: usize) -> Result<usize, ApiError> {
    position
        .parse::<usize>()
        .ok()
        .filter(|&i| i < len)
        .ok_or(ApiError::NotFound)
}

/// Liveness check for the mobile client
pub async fn status() -> Result<Response<Body>, ApiError> {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "message": "Riding school records API is running.",
        }),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::{database::RecordStore, router};

    pub struct TestApp {
        pub router: Router,
        pub store: Arc<RecordStore>,
        _dir: TempDir,
    }

    impl TestApp {
        pub fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = Arc::new(RecordStore::new(dir.path().join("students.json")));
            Self {
                router: router(store.clone()),
                store,
                _dir: dir,
            }
        }

        pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let request = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => request
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Method::GET, uri, None).await
        }

        pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Method::POST, uri, Some(body)).await
        }
    }
}
