//! # Ethereum JSON-RPC State Reader
//!
//! Reads head, block hashes and call results from an Ethereum node over
//! HTTP JSON-RPC (`eth_blockNumber`, `eth_getBlockByNumber`, `eth_call`).

use async_trait::async_trait;
use primitive_types::H256;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::rpc::{JsonRpcRequest, JsonRpcResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::{CallRequest, StateError};
use crate::ports::StateReader;

/// [`StateReader`] backed by an Ethereum RPC endpoint.
pub struct EthRpcStateReader {
    http_client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
}

impl EthRpcStateReader {
    /// Create a reader for `rpc_url` with a 10 second request timeout.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, StateError> {
        Self::with_timeout(rpc_url, Duration::from_secs(10))
    }

    /// Create a reader with a custom request timeout.
    pub fn with_timeout(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, StateError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StateError::Rpc(e.to_string()))?;

        Ok(Self {
            http_client,
            rpc_url: rpc_url.into(),
            request_id: AtomicU64::new(1),
        })
    }

    async fn call_rpc<P: Serialize + Send, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, StateError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);

        let response: JsonRpcResponse<R> = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StateError::Rpc(format!("{}: {}", method, e)))?
            .json()
            .await
            .map_err(|e| StateError::Malformed(format!("{}: {}", method, e)))?;

        if let Some(error) = response.error {
            return Err(StateError::Rpc(format!(
                "{} error {}: {}",
                method, error.code, error.message
            )));
        }
        Ok(response.result)
    }
}

fn parse_hex_u64(s: &str) -> Result<u64, StateError> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| StateError::Malformed(format!("quantity '{}': {}", s, e)))
}

fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, StateError> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| StateError::Malformed(format!("data '{}': {}", s, e)))
}

fn quantity(n: u64) -> String {
    format!("0x{:x}", n)
}

fn call_object(call: &CallRequest) -> Value {
    json!({
        "from": format!("0x{}", hex::encode(call.from.as_bytes())),
        "to": format!("0x{}", hex::encode(call.to.as_bytes())),
        "gas": quantity(call.gas),
        "gasPrice": format!("0x{:x}", call.gas_price),
        "value": format!("0x{:x}", call.value),
        "data": format!("0x{}", hex::encode(&call.data)),
    })
}

#[async_trait]
impl StateReader for EthRpcStateReader {
    async fn current_block_number(&self) -> Result<u64, StateError> {
        let result: Option<String> = self.call_rpc("eth_blockNumber", Vec::<()>::new()).await?;
        let result = result.ok_or_else(|| StateError::Malformed("eth_blockNumber: null result".into()))?;
        parse_hex_u64(&result)
    }

    async fn block_hash(&self, number: u64) -> Result<H256, StateError> {
        let block: Option<Value> = self
            .call_rpc("eth_getBlockByNumber", (quantity(number), false))
            .await?;
        let block = block.ok_or_else(|| StateError::NotFound(format!("block {}", number)))?;

        let hash = block
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| StateError::Malformed(format!("block {} has no hash", number)))?;
        let bytes = parse_hex_bytes(hash)?;
        if bytes.len() != 32 {
            return Err(StateError::Malformed(format!(
                "block hash has {} bytes",
                bytes.len()
            )));
        }
        Ok(H256::from_slice(&bytes))
    }

    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, StateError> {
        let result: Option<String> = self
            .call_rpc("eth_call", (call_object(call), quantity(call.block_number)))
            .await?;
        let result = result.ok_or_else(|| StateError::Malformed("eth_call: null result".into()))?;
        parse_hex_bytes(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use primitive_types::{H160, U256};
    use tokio::net::TcpListener;

    async fn fake_node() -> String {
        let router = Router::new().route(
            "/",
            post(|Json(body): Json<Value>| async move {
                let result = match body["method"].as_str() {
                    Some("eth_blockNumber") => json!("0x4d2"),
                    Some("eth_getBlockByNumber") if body["params"][0] == "0x2a" => {
                        json!({"number": "0x2a", "hash": format!("0x{}", "ab".repeat(32))})
                    }
                    Some("eth_getBlockByNumber") => Value::Null,
                    Some("eth_call") => {
                        assert_eq!(body["params"][1], "0x3e8");
                        assert_eq!(body["params"][0]["gas"], "0x5208");
                        json!("0xdeadbeef")
                    }
                    _ => {
                        return Json(json!({
                            "jsonrpc": "2.0",
                            "id": body["id"],
                            "error": {"code": -32601, "message": "method not found"}
                        }))
                    }
                };
                Json(json!({"jsonrpc": "2.0", "id": body["id"], "result": result}))
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_reads_head_hash_and_call() {
        let reader = EthRpcStateReader::new(fake_node().await).unwrap();

        assert_eq!(reader.current_block_number().await.unwrap(), 1234);
        assert_eq!(reader.block_hash(42).await.unwrap(), H256::repeat_byte(0xab));
        assert!(matches!(
            reader.block_hash(7).await,
            Err(StateError::NotFound(_))
        ));

        let call = CallRequest {
            block_number: 1000,
            from: H160::zero(),
            to: H160::repeat_byte(1),
            gas: 21_000,
            gas_price: 0,
            value: U256::zero(),
            data: vec![],
        };
        assert_eq!(reader.call(&call).await.unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let reader = EthRpcStateReader::new(format!("http://{}/", addr)).unwrap();
        assert!(matches!(
            reader.current_block_number().await,
            Err(StateError::Rpc(_))
        ));
    }

    #[test]
    fn test_call_object_encoding() {
        let call = CallRequest {
            block_number: 1,
            from: H160::repeat_byte(0x11),
            to: H160::repeat_byte(0x22),
            gas: 255,
            gas_price: 16,
            value: U256::zero(),
            data: vec![0xab],
        };
        let object = call_object(&call);
        assert_eq!(object["to"], format!("0x{}", "22".repeat(20)));
        assert_eq!(object["gas"], "0xff");
        assert_eq!(object["gasPrice"], "0x10");
        assert_eq!(object["value"], "0x0");
        assert_eq!(object["data"], "0xab");
    }
}
