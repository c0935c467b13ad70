//! Operation dispatch for a resolved session.
//!
//! Every inbound method is validated against its declared shape before it
//! touches session state; a malformed payload fails fast with a protocol
//! error and performs no mutation. The two mutating tools append a
//! `resources/updated` notification to the session's event log so a
//! pull-stream consumer learns the current image changed.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use nasa_mcp_catalog::CatalogClient;
use nasa_mcp_core::{OpError, ResultPage};
use nasa_mcp_session::{Session, SessionRegistry};

use crate::protocol::{require_str, RpcRequest, RpcResponse};

/// Resource URI for the session's current image.
pub const CURRENT_IMAGE_URI: &str = "nasa-image://current";

pub const SERVER_NAME: &str = "nasa-images-mcp-server";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Shared state available to all handlers.
pub struct HandlerState {
    pub registry: Arc<SessionRegistry>,
    pub catalog: CatalogClient,
}

impl HandlerState {
    pub fn new(registry: Arc<SessionRegistry>, catalog: CatalogClient) -> Self {
        Self { registry, catalog }
    }
}

/// A tool invocation with its arguments already validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolCall {
    SearchImages { query: String },
    NextImage,
    CurrentImage,
}

impl ToolCall {
    /// Validate a `tools/call` payload against the declared shape of the
    /// named tool.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, OpError> {
        match name {
            "search_nasa_images" => {
                let query = arguments
                    .get("query")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| OpError::InvalidParams("query must be a string".into()))?;
                if query.trim().is_empty() {
                    return Err(OpError::InvalidParams("query must not be empty".into()));
                }
                Ok(Self::SearchImages {
                    query: query.to_string(),
                })
            }
            "get_next_image" => Ok(Self::NextImage),
            "get_current_image" => Ok(Self::CurrentImage),
            other => Err(OpError::UnknownTool(other.to_string())),
        }
    }
}

/// Dispatch one request against its session.
pub async fn dispatch(state: &Arc<HandlerState>, session: &Arc<Session>, req: &RpcRequest) -> RpcResponse {
    let id = req.id.clone();
    let params = req.params.clone().unwrap_or_else(|| json!({}));

    match req.method.as_str() {
        "initialize" => RpcResponse::success(id, initialize_result()),
        "ping" => RpcResponse::success(id, json!({})),
        "tools/list" => RpcResponse::success(id, tool_listing()),
        "tools/call" => tools_call(state, session, &params, id).await,
        "resources/list" => RpcResponse::success(id, resource_listing()),
        "resources/read" => resources_read(session, &params, id).await,
        method => RpcResponse::method_not_found(id, method),
    }
}

async fn tools_call(
    state: &Arc<HandlerState>,
    session: &Arc<Session>,
    params: &Value,
    id: Option<Value>,
) -> RpcResponse {
    let name = match require_str(params, "name") {
        Ok(name) => name,
        Err(msg) => return RpcResponse::invalid_params(id, msg),
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let call = match ToolCall::parse(name, &arguments) {
        Ok(call) => call,
        Err(err) => return RpcResponse::from_op_error(id, &err),
    };

    match call_tool(state, session, call).await {
        Ok(text) => RpcResponse::success(
            id,
            json!({"content": [{"type": "text", "text": text}]}),
        ),
        Err(err) => {
            warn!(
                session_id = %session.id(),
                tool = name,
                kind = err.error_kind(),
                error = %err,
                "tool call failed"
            );
            RpcResponse::from_op_error(id, &err)
        }
    }
}

/// Execute a validated tool call. The page lock is held for the whole
/// operation, upstream I/O included, so mutations within a session never
/// interleave.
pub async fn call_tool(
    state: &Arc<HandlerState>,
    session: &Arc<Session>,
    call: ToolCall,
) -> Result<String, OpError> {
    match call {
        ToolCall::SearchImages { query } => {
            let mut slot = session.page().lock().await;
            let found = state
                .catalog
                .search(&query)
                .await
                .map_err(|e| OpError::SearchFailed(e.to_string()))?;

            let count = found.items.len();
            *slot = Some(ResultPage::new(&query, found.items, found.total_hits));
            drop(slot);

            notify_current_changed(session);
            Ok(format!("Searched for: \"{query}\". Found {count} images."))
        }
        ToolCall::NextImage => {
            let mut slot = session.page().lock().await;
            let page = slot.as_mut().ok_or(OpError::NoActiveSearch)?;
            let title = page
                .advance()
                .map(|img| img.title.clone())
                .ok_or(OpError::NoImageAvailable)?;
            drop(slot);

            notify_current_changed(session);
            Ok(format!("Loaded next image: {title}"))
        }
        ToolCall::CurrentImage => {
            let slot = session.page().lock().await;
            let url = slot
                .as_ref()
                .and_then(|page| page.current())
                .map(|img| img.image_url.clone())
                .ok_or(OpError::NoImageAvailable)?;
            Ok(url)
        }
    }
}

async fn resources_read(session: &Arc<Session>, params: &Value, id: Option<Value>) -> RpcResponse {
    let uri = match require_str(params, "uri") {
        Ok(uri) => uri,
        Err(msg) => return RpcResponse::invalid_params(id, msg),
    };
    if uri != CURRENT_IMAGE_URI {
        return RpcResponse::invalid_params(id, format!("Unknown resource: {uri}"));
    }

    let slot = session.page().lock().await;
    match slot.as_ref().and_then(|page| page.current()) {
        Some(img) => RpcResponse::success(
            id,
            json!({"contents": [{
                "uri": CURRENT_IMAGE_URI,
                "mimeType": "text/uri-list",
                "text": img.image_url,
            }]}),
        ),
        None => RpcResponse::from_op_error(id, &OpError::NoImageAvailable),
    }
}

/// Append a `resources/updated` notification for the current-image
/// resource to the session's event log.
fn notify_current_changed(session: &Arc<Session>) {
    let notification = json!({
        "jsonrpc": "2.0",
        "method": "notifications/resources/updated",
        "params": {"uri": CURRENT_IMAGE_URI},
    });
    let _ = session.events().append(notification.to_string());
}

pub fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {"tools": {}, "resources": {}},
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

fn tool_listing() -> Value {
    json!({"tools": [
        {
            "name": "search_nasa_images",
            "description": "Search the NASA image library",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query (e.g., \"apollo 11\", \"mars rover\")",
                    },
                },
                "required": ["query"],
            },
        },
        {
            "name": "get_next_image",
            "description": "Get the next image from current search results",
            "inputSchema": {"type": "object", "properties": {}},
        },
        {
            "name": "get_current_image",
            "description": "Get the URL of the current image",
            "inputSchema": {"type": "object", "properties": {}},
        },
    ]})
}

fn resource_listing() -> Value {
    json!({"resources": [
        {
            "uri": CURRENT_IMAGE_URI,
            "name": "current_nasa_image_url",
            "mimeType": "text/uri-list",
        },
    ]})
}
