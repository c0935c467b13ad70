//! JSON-RPC 2.0 wire types for the `/mcp` endpoint.

use serde::{Deserialize, Serialize};

use nasa_mcp_core::OpError;

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Option<serde_json::Value>,
    pub id: Option<serde_json::Value>,
}

impl RpcRequest {
    /// A request without an `id` is a notification: the caller expects
    /// no response body.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// Standard JSON-RPC error codes, plus the server-defined session code.
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const SESSION_NOT_FOUND: i32 = -32001;

impl RpcResponse {
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn parse_error() -> Self {
        Self::error(None, PARSE_ERROR, "Parse error")
    }

    pub fn method_not_found(id: Option<serde_json::Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, msg)
    }

    pub fn session_not_found(id: Option<serde_json::Value>) -> Self {
        Self::error(id, SESSION_NOT_FOUND, "Invalid Request: Session not found.")
    }

    pub fn not_initialized(id: Option<serde_json::Value>) -> Self {
        Self::error(
            id,
            INVALID_REQUEST,
            "Invalid Request: Session is not initialized.",
        )
    }

    pub fn internal_error(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INTERNAL_ERROR, msg)
    }

    /// Convert an operation failure into its wire representation.
    /// Protocol errors keep their JSON-RPC codes; session-state errors map
    /// to INVALID_REQUEST with their descriptive messages; upstream and
    /// internal faults both surface as INTERNAL_ERROR, details logged
    /// server-side only.
    pub fn from_op_error(id: Option<serde_json::Value>, err: &OpError) -> Self {
        let code = match err {
            OpError::InvalidParams(_) => INVALID_PARAMS,
            OpError::UnknownTool(_) => METHOD_NOT_FOUND,
            OpError::NoActiveSearch | OpError::NoImageAvailable => INVALID_REQUEST,
            OpError::SearchFailed(_) | OpError::Internal(_) => INTERNAL_ERROR,
        };
        Self::error(id, code, err.to_string())
    }
}

/// Parse a request body, distinguishing unparsable JSON from a payload
/// that is JSON but not a JSON-RPC request.
pub fn parse_request(body: &[u8]) -> Result<RpcRequest, RpcResponse> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| RpcResponse::parse_error())?;
    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|_| {
        RpcResponse::error(id, INVALID_REQUEST, "Invalid Request: not a JSON-RPC request")
    })
}

/// Extract a required string param from the params object.
pub fn require_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing required parameter: {key}"))
}
