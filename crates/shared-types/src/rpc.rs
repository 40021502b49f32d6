//! # Certification RPC Wire Types
//!
//! JSON-RPC 2.0 shapes exchanged between the coordinator's transport and a
//! signer node. Byte fields travel as `0x`-prefixed hex strings.
//!
//! ```text
//! -> {"jsonrpc":"2.0","id":1,"method":"node_certify","params":[{"taskIndex":7,"data":"0x02"}]}
//! <- {"jsonrpc":"2.0","id":1,"result":{"signature":"0x..","data":"0x02"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

use crate::entities::TaskIndex;

/// Method name served by every signer node.
pub const CERTIFY_METHOD: &str = "node_certify";

/// Protocol version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Hex bytes with an optional `0x` on input and a `0x` on output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexBytes(pub Vec<u8>);

impl std::fmt::Display for HexBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl std::str::FromStr for HexBytes {
    type Err = shared_crypto::CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        shared_crypto::decode_hex(s).map(HexBytes)
    }
}

/// Parameters of a `node_certify` call.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifyRequest {
    /// Round the request belongs to.
    pub task_index: TaskIndex,
    /// Opaque payload handed to the signer's policy.
    #[serde_as(as = "DisplayFromStr")]
    pub data: HexBytes,
}

/// Result of a successful `node_certify` call.
///
/// The signature is carried as raw bytes; callers parse it into a curve point
/// themselves so a malformed signature is attributable to the signer.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifyResponse {
    /// Compressed BLS signature over Keccak-256 of `data`.
    #[serde_as(as = "DisplayFromStr")]
    pub signature: HexBytes,
    /// Response bytes computed by the signer's policy.
    #[serde_as(as = "DisplayFromStr")]
    pub data: HexBytes,
}

/// Outgoing JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest<P> {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Caller-chosen id echoed in the response.
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Positional parameters.
    pub params: P,
}

impl<P> JsonRpcRequest<P> {
    /// Build a request with a numeric id.
    pub fn new(id: u64, method: &str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Value::from(id),
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

/// JSON-RPC response envelope; exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse<R> {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Id of the request being answered (`null` if it could not be read).
    pub id: Value,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl<R> JsonRpcResponse<R> {
    /// Successful response.
    pub fn success(id: Value, result: R) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}
