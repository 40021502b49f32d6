//! # End-to-End Certification Rounds
//!
//! Coordinator → HTTP transport → signer nodes → aggregation engine, with
//! every signer a real axum server on loopback.

use super::cluster::*;
use at_02_certifier::domain::{BlockHashPolicy, ParityPolicy};
use at_02_certifier::StaticStateReader;
use at_03_aggregation::AggregationError;
use at_04_coordinator::{CertificateRequest, CoordinatorError};
use primitive_types::H256;
use shared_crypto::{response_digest, BlsKeyPair};
use shared_types::{cancel_pair, CancelReason, CancelToken, TaskIndex};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn request(task_index: TaskIndex, threshold: u8, payload: &[u8], expiry: Duration) -> CertificateRequest {
    CertificateRequest {
        task_index,
        created_at_block: BLOCK,
        quorum: QUORUM,
        threshold,
        payload: payload.to_vec(),
        expiry,
    }
}

fn seeded(seed: u8) -> BlsKeyPair {
    BlsKeyPair::from_seed(&[seed; 32])
}

#[tokio::test]
async fn test_single_signer_certifies_payload() {
    let signer = RunningSigner::spawn(BlsKeyPair::from_hex("0x1").unwrap(), 100, Arc::new(ParityPolicy))
        .await
        .unwrap();
    let coordinator = coordinator(vec![signer.record.clone()], Duration::ZERO).unwrap();

    let payload = b"test 2";
    let cert = coordinator
        .get_certificate(request(1, 100, payload, Duration::from_secs(10)), CancelToken::never())
        .await
        .unwrap();

    assert_eq!(cert.task_index, 1);
    assert_eq!(cert.task_created_block, BLOCK);
    assert_eq!(cert.response, payload.to_vec());
    assert_eq!(cert.response_digest, response_digest(payload));
    assert_eq!(cert.signers, vec![signer.record.operator_id]);
    assert!(cert.non_signers.is_empty());
    assert!(cert.verify());

    signer.stop().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_operator_listed_as_non_signer() {
    let a = RunningSigner::spawn(seeded(1), 40, Arc::new(ParityPolicy)).await.unwrap();
    let b = RunningSigner::spawn(seeded(2), 30, Arc::new(ParityPolicy)).await.unwrap();
    let offline = unreachable_record(&seeded(3), 30).unwrap();
    let operators = vec![a.record.operator_id, b.record.operator_id, offline.operator_id];
    let coordinator = coordinator(
        vec![a.record.clone(), b.record.clone(), offline.clone()],
        Duration::from_millis(100),
    )
    .unwrap();

    let cert = coordinator
        .get_certificate(request(2, 60, &[0x10], Duration::from_secs(10)), CancelToken::never())
        .await
        .unwrap();

    assert_eq!(cert.non_signer_ids(), vec![offline.operator_id]);
    let bitmap = cert.non_signer_bitmap(&operators);
    assert_eq!(bitmap, vec![false, false, true]);
    assert_eq!(cert.quorums[0].signed_stake, 70);
    assert_eq!(cert.quorums[0].total_stake, 100);
    assert!(cert.verify());

    a.stop().await.unwrap();
    b.stop().await.unwrap();
}

#[tokio::test]
async fn test_refused_payload_times_out_at_expiry() {
    let a = RunningSigner::spawn(seeded(1), 50, Arc::new(ParityPolicy)).await.unwrap();
    let b = RunningSigner::spawn(seeded(2), 50, Arc::new(ParityPolicy)).await.unwrap();
    let coordinator = coordinator(vec![a.record.clone(), b.record.clone()], Duration::ZERO).unwrap();

    // Odd value: every signer refuses
    let started = Instant::now();
    let err = coordinator
        .get_certificate(request(3, 50, &[0x07], Duration::from_millis(500)), CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(err, CoordinatorError::Aggregation(AggregationError::TaskExpired(3)));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(3));

    a.stop().await.unwrap();
    b.stop().await.unwrap();
}

#[tokio::test]
async fn test_diverging_state_leaves_minority_out() {
    let block_number: u64 = 42;
    let majority_view = Arc::new(StaticStateReader::new(50).with_block_hash(block_number, H256::repeat_byte(0xAA)));
    let minority_view = Arc::new(StaticStateReader::new(50).with_block_hash(block_number, H256::repeat_byte(0xBB)));

    let a = RunningSigner::spawn(seeded(1), 35, Arc::new(BlockHashPolicy::new(majority_view.clone())))
        .await
        .unwrap();
    let b = RunningSigner::spawn(seeded(2), 35, Arc::new(BlockHashPolicy::new(majority_view)))
        .await
        .unwrap();
    let c = RunningSigner::spawn(seeded(3), 30, Arc::new(BlockHashPolicy::new(minority_view)))
        .await
        .unwrap();
    let coordinator = coordinator(
        vec![a.record.clone(), b.record.clone(), c.record.clone()],
        Duration::from_millis(200),
    )
    .unwrap();

    let cert = coordinator
        .get_certificate(
            request(4, 67, &block_number.to_be_bytes(), Duration::from_secs(10)),
            CancelToken::never(),
        )
        .await
        .unwrap();

    let mut signers = cert.signers.clone();
    signers.sort();
    let mut expected = vec![a.record.operator_id, b.record.operator_id];
    expected.sort();
    assert_eq!(signers, expected);
    assert_eq!(cert.non_signer_ids(), vec![c.record.operator_id]);
    assert_eq!(cert.quorums[0].signed_stake, 70);
    assert!(cert.verify());

    for signer in [a, b, c] {
        signer.stop().await.unwrap();
    }
}

#[tokio::test]
async fn test_cancellation_ends_round_before_signers_answer() {
    let slow = RunningSigner::spawn(seeded(1), 100, Arc::new(StallingPolicy(Duration::from_secs(30))))
        .await
        .unwrap();
    let coordinator = coordinator(vec![slow.record.clone()], Duration::ZERO).unwrap();
    let (handle, token) = cancel_pair();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();
    });

    let started = Instant::now();
    let err = coordinator
        .get_certificate(request(5, 100, &[0x02], Duration::from_secs(60)), token)
        .await
        .unwrap_err();

    assert_eq!(err, CoordinatorError::Cancelled(CancelReason::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
    // Not stopped gracefully: the stalled request would hold shutdown open
}

#[tokio::test]
async fn test_consecutive_rounds_on_one_coordinator() {
    let a = RunningSigner::spawn(seeded(1), 60, Arc::new(ParityPolicy)).await.unwrap();
    let b = RunningSigner::spawn(seeded(2), 40, Arc::new(ParityPolicy)).await.unwrap();
    let coordinator = coordinator(vec![a.record.clone(), b.record.clone()], Duration::ZERO).unwrap();

    for (task_index, value) in [(10, 0x02u8), (11, 0x04), (12, 0x06)] {
        let cert = coordinator
            .get_certificate(
                request(task_index, 50, &[value], Duration::from_secs(10)),
                CancelToken::never(),
            )
            .await
            .unwrap();
        assert_eq!(cert.task_index, task_index);
        assert_eq!(cert.response, vec![value]);
        assert!(cert.verify());
    }

    a.stop().await.unwrap();
    b.stop().await.unwrap();
}
