//! # HTTP JSON-RPC Requester
//!
//! Reaches a signer node with one `node_certify` POST per call. Idle
//! connections are never kept, so each call opens a fresh connection to the
//! operator's advertised socket.

use async_trait::async_trait;
use shared_types::rpc::{JsonRpcRequest, JsonRpcResponse};
use shared_types::{CertifyRequest, CertifyResponse, HexBytes, OperatorRecord, TaskIndex, CERTIFY_METHOD};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::{OperatorRequester, TransportConfig, TransportError};

/// [`OperatorRequester`] over plaintext HTTP.
pub struct HttpOperatorRequester {
    http_client: reqwest::Client,
    request_id: AtomicU64,
}

impl HttpOperatorRequester {
    /// Build a requester with the given timeouts.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        config.validate().map_err(TransportError::Client)?;
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            request_id: AtomicU64::new(1),
        })
    }

    fn endpoint(socket: &str) -> String {
        format!("http://{}/", socket)
    }
}

#[async_trait]
impl OperatorRequester for HttpOperatorRequester {
    async fn request_certification(
        &self,
        operator: &OperatorRecord,
        task_index: TaskIndex,
        payload: &[u8],
    ) -> Result<CertifyResponse, TransportError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(
            id,
            CERTIFY_METHOD,
            [CertifyRequest {
                task_index,
                data: HexBytes(payload.to_vec()),
            }],
        );

        debug!(
            task_index,
            socket = %operator.socket,
            payload_len = payload.len(),
            "Requesting certification"
        );

        let response = self
            .http_client
            .post(Self::endpoint(&operator.socket))
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable {
                socket: operator.socket.clone(),
                reason: e.to_string(),
            })?;

        let rpc_response: JsonRpcResponse<CertifyResponse> = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(TransportError::Rejected {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| TransportError::MalformedResponse("response missing result".to_string()))
    }
}
