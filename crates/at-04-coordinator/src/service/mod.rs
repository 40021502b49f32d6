//! # Coordinator Service
//!
//! Runs one certification round at a time: register the task with the
//! aggregation engine, fan the payload out to every operator in the quorum,
//! feed each verified answer back into the engine, and wait for the engine's
//! verdict or the caller's cancellation.

use at_01_transport::OperatorRequester;
use at_03_aggregation::{AggregationEngine, OperatorRegistry};
use shared_crypto::BlsSignature;
use shared_types::{CancelToken, Certificate, OperatorRecord, SignatureEvent, TaskIndex};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, instrument, warn, Instrument};

use crate::domain::{CertificateRequest, CoordinatorConfig, CoordinatorError};

/// Certificate coordinator.
///
/// Calls to [`get_certificate`](Self::get_certificate) are serialized: a
/// second caller waits until the running round has finished.
pub struct CoordinatorService<E: ?Sized, R: ?Sized, T: ?Sized> {
    engine: Arc<E>,
    registry: Arc<R>,
    requester: Arc<T>,
    config: CoordinatorConfig,
    round_guard: Mutex<()>,
}

impl<E, R, T> CoordinatorService<E, R, T>
where
    E: AggregationEngine + ?Sized + 'static,
    R: OperatorRegistry + ?Sized + 'static,
    T: OperatorRequester + ?Sized + 'static,
{
    pub fn new(engine: Arc<E>, registry: Arc<R>, requester: Arc<T>) -> Self {
        Self::with_config(engine, registry, requester, CoordinatorConfig::default())
    }

    pub fn with_config(
        engine: Arc<E>,
        registry: Arc<R>,
        requester: Arc<T>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            engine,
            registry,
            requester,
            config,
            round_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Obtain a threshold certificate over the operators' answers to
    /// `request.payload`.
    ///
    /// Unreachable or misbehaving operators only end up as non-signers. The
    /// round fails when the engine expires the task, or when `cancel` fires
    /// first; in both cases outstanding operator requests are dropped.
    #[instrument(
        skip(self, request, cancel),
        fields(task_index = request.task_index, block = request.created_at_block)
    )]
    pub async fn get_certificate(
        &self,
        request: CertificateRequest,
        cancel: CancelToken,
    ) -> Result<Certificate, CoordinatorError> {
        let _round = tokio::select! {
            guard = self.round_guard.lock() => guard,
            reason = cancel.cancelled() => return Err(CoordinatorError::Cancelled(reason)),
        };

        let params = request.to_task_params(self.config.aggregation_window)?;
        let task_index = params.task_index;

        self.engine
            .initialize_task(params)
            .await
            .map_err(CoordinatorError::TaskInit)?;
        // Dropping the signal on any early return abandons the task.
        let completion = self
            .engine
            .completion_signal(task_index)
            .map_err(CoordinatorError::TaskInit)?;

        let operators = self
            .registry
            .get_operators_at_block(&[request.quorum], request.created_at_block)
            .await
            .map_err(CoordinatorError::Registry)?;

        info!(operators = operators.len(), "Dispatching certification requests");

        let payload: Arc<[u8]> = request.payload.into();
        let mut dispatch = JoinSet::new();
        for operator in operators.into_values() {
            let span = info_span!(
                "operator",
                operator_id = %operator.operator_id,
                socket = %operator.socket
            );
            dispatch.spawn(
                collect_signature(
                    Arc::clone(&self.requester),
                    Arc::clone(&self.engine),
                    operator,
                    task_index,
                    Arc::clone(&payload),
                )
                .instrument(span),
            );
        }

        let outcome = tokio::select! {
            result = completion => result.map_err(CoordinatorError::Aggregation),
            reason = cancel.cancelled() => Err(CoordinatorError::Cancelled(reason)),
        };
        dispatch.abort_all();

        match &outcome {
            Ok(certificate) => info!(
                signers = certificate.signers.len(),
                non_signers = certificate.non_signers.len(),
                digest = %certificate.response_digest,
                "Certificate obtained"
            ),
            Err(e) => warn!(error = %e, "Round ended without certificate"),
        }
        outcome
    }
}

/// Request, parse and submit one operator's signature.
///
/// Every failure is logged and swallowed; the operator simply does not sign.
async fn collect_signature<E, T>(
    requester: Arc<T>,
    engine: Arc<E>,
    operator: OperatorRecord,
    task_index: TaskIndex,
    payload: Arc<[u8]>,
) where
    E: AggregationEngine + ?Sized,
    T: OperatorRequester + ?Sized,
{
    info!("Requesting certification");
    let response = match requester
        .request_certification(&operator, task_index, &payload)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Certification request failed");
            return;
        }
    };
    info!("Received certification response");

    let signature = match BlsSignature::from_bytes(&response.signature.0) {
        Ok(signature) => signature,
        Err(e) => {
            error!(error = %e, "Failed to parse operator signature");
            return;
        }
    };

    let event = SignatureEvent::new(task_index, operator.operator_id, response.data.0, signature);
    match engine.process_signature(event).await {
        Ok(()) => info!("Signature processed"),
        Err(e) => error!(error = %e, "Signature rejected by aggregation engine"),
    }
}
