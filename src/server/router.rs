//! Route dispatch and handlers. Thin wrappers: validation and JSON
//! shaping here, business logic in the store/scan modules. Store-bound
//! work runs on the blocking pool so reads stay responsive.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use tracing::info;

use super::{auth, AppState};
use crate::directory;
use crate::scan;
use crate::types::error::{Result, ShelfError};
use crate::types::message::MessageQuery;
use crate::types::responses::{ScanRequest, ScanResponse};

pub async fn handle(
    state: Arc<AppState>,
    remote: SocketAddr,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match dispatch(&state, remote, req).await {
        Ok(response) => response,
        Err(err) => error_response(&err),
    };

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        client = %remote,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    response
}

async fn dispatch(
    state: &Arc<AppState>,
    remote: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    if let Some(credentials) = &state.auth {
        if let Some(rejection) = auth::check(credentials, &req, remote) {
            return Ok(rejection);
        }
    }

    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let segments = segments.as_slice();
    let is_get = *req.method() == Method::GET;
    let is_post = *req.method() == Method::POST;

    if is_post && segments == ["scan"] {
        return handle_scan(state, req).await;
    }
    if is_get && segments == ["emails"] {
        return handle_list(state, query.as_deref()).await;
    }
    if is_get && segments.len() == 2 && segments[0] == "emails" {
        return handle_get(state, segments[1]).await;
    }
    if is_get && segments == ["structure"] {
        return handle_structure(state).await;
    }

    Ok(json_error(StatusCode::NOT_FOUND, "Not found", None))
}

async fn handle_scan(
    state: &Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ShelfError::Io(e.to_string()))?
        .to_bytes();

    let request: ScanRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "Root directory is required",
                None,
            ))
        }
    };
    if request.root_dir.trim().is_empty() {
        return Ok(json_error(
            StatusCode::BAD_REQUEST,
            "Root directory is required",
            None,
        ));
    }

    // Single-writer: a second scan request while one runs is refused,
    // not queued.
    let _guard = match state.scan_lock.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            return Ok(json_error(
                StatusCode::CONFLICT,
                "A scan is already running",
                None,
            ))
        }
    };

    info!(root_dir = %request.root_dir, clear = request.clear, "Scan requested");

    let store = state.store.clone();
    let cancel = state.cancel.clone();
    let root = PathBuf::from(&request.root_dir);
    let clear = request.clear;
    let result = tokio::task::spawn_blocking(move || {
        if clear {
            store.clear()?;
        }
        scan::scan(&store, &root, &cancel)
    })
    .await
    .map_err(|e| ShelfError::Other(format!("Scan task failed: {}", e)))?;

    match result {
        Ok(stats) => json_response(
            StatusCode::OK,
            &ScanResponse {
                success: true,
                stats,
            },
        ),
        Err(err) => Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to scan folders",
            Some(&err.to_string()),
        )),
    }
}

async fn handle_list(
    state: &Arc<AppState>,
    query: Option<&str>,
) -> Result<Response<Full<Bytes>>> {
    let params = parse_query_params(query);
    let page = parse_number(params.get("page"), 1, "Invalid page number")?;
    let limit = parse_number(
        params.get("limit"),
        50,
        "Invalid limit number (must be 1-100)",
    )?;

    let message_query = MessageQuery {
        user: params.get("user").cloned().filter(|v| !v.is_empty()),
        folder: params.get("folder").cloned().filter(|v| !v.is_empty()),
        search: params.get("search").cloned(),
        page,
        limit,
    };

    let store = state.store.clone();
    let page = tokio::task::spawn_blocking(move || store.query(&message_query))
        .await
        .map_err(|e| ShelfError::Other(format!("Query task failed: {}", e)))??;

    json_response(StatusCode::OK, &page)
}

async fn handle_get(state: &Arc<AppState>, raw_id: &str) -> Result<Response<Full<Bytes>>> {
    let id: i64 = match raw_id.parse() {
        Ok(id) => id,
        Err(_) => return Ok(json_error(StatusCode::BAD_REQUEST, "Invalid email ID", None)),
    };

    let store = state.store.clone();
    let found = tokio::task::spawn_blocking(move || store.get_by_id(id))
        .await
        .map_err(|e| ShelfError::Other(format!("Lookup task failed: {}", e)))??;

    match found {
        Some(message) => json_response(StatusCode::OK, &message),
        None => Ok(json_error(StatusCode::NOT_FOUND, "Email not found", None)),
    }
}

async fn handle_structure(state: &Arc<AppState>) -> Result<Response<Full<Bytes>>> {
    let store = state.store.clone();
    let structure = tokio::task::spawn_blocking(move || directory::list_structure(&store))
        .await
        .map_err(|e| ShelfError::Other(format!("Structure task failed: {}", e)))??;

    json_response(StatusCode::OK, &structure)
}

pub(crate) fn json_response<T: serde::Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<Response<Full<Bytes>>> {
    let body = serde_json::to_vec(value)?;
    Ok(json_bytes(status, body))
}

/// Error payload shape shared by every failure path:
/// `{ "error": string, "details"?: string }`.
pub(crate) fn json_error(
    status: StatusCode,
    error: &str,
    details: Option<&str>,
) -> Response<Full<Bytes>> {
    let mut payload = serde_json::json!({ "error": error });
    if let Some(details) = details {
        payload["details"] = serde_json::Value::String(details.to_string());
    }
    json_bytes(status, payload.to_string().into_bytes())
}

fn json_bytes(status: StatusCode, body: Vec<u8>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn error_response(err: &ShelfError) -> Response<Full<Bytes>> {
    match err {
        ShelfError::Validation(message) => json_error(StatusCode::BAD_REQUEST, message, None),
        other => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            Some(&other.to_string()),
        ),
    }
}

fn parse_query_params(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn parse_number(raw: Option<&String>, default: u32, message: &str) -> Result<u32> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ShelfError::Validation(message.to_string())),
    }
}
