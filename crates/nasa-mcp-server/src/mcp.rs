//! The `/mcp` endpoint: session-scoped streamable HTTP transport.
//!
//! POST carries one JSON-RPC request and returns its response inline.
//! GET opens the session's long-lived SSE pull-stream, replaying missed
//! events from the `Last-Event-ID` header before going live. DELETE
//! closes the session. All three resolve the session from the
//! `mcp-session-id` header; only the first `initialize` POST may arrive
//! without one.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use nasa_mcp_core::SessionId;
use nasa_mcp_session::LogEntry;

use crate::dispatch;
use crate::protocol::{self, parse_request, RpcResponse};
use crate::server::AppState;

/// Header carrying the session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Header carrying the last event sequence number a reconnecting
/// pull-stream consumer observed.
pub const LAST_EVENT_ID_HEADER: &str = "last-event-id";

fn session_from(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(SessionId::from_raw)
}

fn bad_request(resp: RpcResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(resp)).into_response()
}

/// POST `/mcp` — mutation requests.
pub async fn post_mcp(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let req = match parse_request(&body) {
        Ok(req) => req,
        Err(resp) => return bad_request(resp),
    };

    let Some(id) = session_from(&headers) else {
        // The distinguished first request: only `initialize` may create a
        // session. Anything else without an id is a protocol-ordering
        // violation and must not create state.
        if req.method != "initialize" {
            return bad_request(RpcResponse::not_initialized(req.id));
        }

        // Two-phase begin: the registry entry is fully visible before the
        // caller ever sees the id, so the returned id always resolves.
        let session = state.handlers.registry.begin();
        let resp = dispatch::dispatch(&state.handlers, &session, &req).await;

        let mut response = (StatusCode::OK, Json(resp)).into_response();
        if let Ok(value) = HeaderValue::from_str(session.id().as_str()) {
            let _ = response.headers_mut().insert(SESSION_HEADER, value);
        }
        return response;
    };

    let Some(session) = state.handlers.registry.resolve(&id) else {
        return bad_request(RpcResponse::session_not_found(req.id));
    };
    session.touch();

    if req.is_notification() {
        debug!(session_id = %id, method = %req.method, "notification accepted");
        return StatusCode::ACCEPTED.into_response();
    }

    let resp = dispatch::dispatch(&state.handlers, &session, &req).await;
    (StatusCode::OK, Json(resp)).into_response()
}

/// GET `/mcp` — open the session's pull-stream.
pub async fn get_mcp(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(id) = session_from(&headers) else {
        return bad_request(RpcResponse::session_not_found(None));
    };
    let Some(session) = state.handlers.registry.resolve(&id) else {
        return bad_request(RpcResponse::session_not_found(None));
    };

    let last_seen = match headers.get(LAST_EVENT_ID_HEADER) {
        None => None,
        Some(value) => match value.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
            Some(seq) => Some(seq),
            None => {
                return bad_request(RpcResponse::error(
                    None,
                    protocol::INVALID_REQUEST,
                    "Invalid Request: Last-Event-ID must be an event sequence number",
                ))
            }
        },
    };

    let (replay, rx) = match session.events().replay_after(last_seen) {
        Ok(pair) => pair,
        Err(err) => {
            return bad_request(RpcResponse::error(
                None,
                protocol::INVALID_REQUEST,
                format!("Invalid Request: {err}; begin a new session"),
            ))
        }
    };
    session.touch();

    // At most one live stream per session: attaching cancels any
    // previous consumer (takeover).
    let token = session.attach_stream();
    debug!(session_id = %id, replay = replay.len(), "pull-stream attached");

    let replayed = futures::stream::iter(replay.into_iter().map(entry_to_event));
    // A lagged receiver has lost events the broadcast buffer no longer
    // holds; ending the stream makes the client reconnect with its
    // Last-Event-ID and recover from the log instead.
    let live = BroadcastStream::new(rx)
        .take_while(|recv| futures::future::ready(recv.is_ok()))
        .filter_map(|recv| futures::future::ready(recv.ok().map(entry_to_event)));

    let stream = replayed.chain(live).take_until(token.cancelled_owned());
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

/// DELETE `/mcp` — close the session and evict its state.
pub async fn delete_mcp(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(id) = session_from(&headers) else {
        return bad_request(RpcResponse::session_not_found(None));
    };
    if state.handlers.registry.end(&id) {
        StatusCode::OK.into_response()
    } else {
        bad_request(RpcResponse::session_not_found(None))
    }
}

fn entry_to_event(entry: LogEntry) -> Result<Event, Infallible> {
    Ok(Event::default()
        .id(entry.seq.to_string())
        .event("message")
        .data(entry.data))
}
