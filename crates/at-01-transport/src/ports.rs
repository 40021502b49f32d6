//! Driven port used by the coordinator to reach one operator.

use async_trait::async_trait;
use shared_types::{CertifyResponse, OperatorRecord, TaskIndex};
use std::sync::Arc;

use crate::TransportError;

/// One request/response exchange with an operator's certifying endpoint.
#[async_trait]
pub trait OperatorRequester: Send + Sync {
    /// Ask `operator` to certify `payload` for `task_index`.
    ///
    /// No retries: a failure is final for this call.
    async fn request_certification(
        &self,
        operator: &OperatorRecord,
        task_index: TaskIndex,
        payload: &[u8],
    ) -> Result<CertifyResponse, TransportError>;
}

#[async_trait]
impl<T: OperatorRequester + ?Sized> OperatorRequester for Arc<T> {
    async fn request_certification(
        &self,
        operator: &OperatorRecord,
        task_index: TaskIndex,
        payload: &[u8],
    ) -> Result<CertifyResponse, TransportError> {
        (**self)
            .request_certification(operator, task_index, payload)
            .await
    }
}
