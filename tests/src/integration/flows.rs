//! # Transport and Registry Flows
//!
//! Exercises the pieces a round is assembled from: the HTTP requester against
//! live signer nodes, and an operator set loaded from a TOML file.

use super::cluster::*;
use at_01_transport::{HttpOperatorRequester, OperatorRequester, TransportError};
use at_02_certifier::domain::ParityPolicy;
use at_03_aggregation::InMemoryOperatorRegistry;
use at_04_coordinator::CertificateRequest;
use shared_crypto::{response_digest, BlsKeyPair, BlsSignature};
use shared_types::CancelToken;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn seeded(seed: u8) -> BlsKeyPair {
    BlsKeyPair::from_seed(&[seed; 32])
}

#[tokio::test]
async fn test_signer_response_verifies_against_registered_key() {
    let signer = RunningSigner::spawn(seeded(1), 100, Arc::new(ParityPolicy)).await.unwrap();
    let requester = HttpOperatorRequester::new(test_transport()).unwrap();

    let response = requester
        .request_certification(&signer.record, 9, &[0x01, 0x00])
        .await
        .unwrap();

    assert_eq!(response.data.0, vec![0x01, 0x00]);
    let signature = BlsSignature::from_bytes(&response.signature.0).unwrap();
    assert!(signer
        .record
        .public_key
        .verify(&response_digest(&response.data.0), &signature));

    signer.stop().await.unwrap();
}

#[tokio::test]
async fn test_policy_refusal_reaches_coordinator_as_rejection() {
    let signer = RunningSigner::spawn(seeded(1), 100, Arc::new(ParityPolicy)).await.unwrap();
    let requester = HttpOperatorRequester::new(test_transport()).unwrap();

    let err = requester
        .request_certification(&signer.record, 9, &[0x03])
        .await
        .unwrap_err();

    match err {
        TransportError::Rejected { code, message } => {
            assert_eq!(code, -32602);
            assert!(message.starts_with("data is invalid"), "{message}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    signer.stop().await.unwrap();
}

#[tokio::test]
async fn test_stopped_signer_is_unreachable() {
    let signer = RunningSigner::spawn(seeded(1), 100, Arc::new(ParityPolicy)).await.unwrap();
    let record = signer.record.clone();
    signer.stop().await.unwrap();

    let requester = HttpOperatorRequester::new(test_transport()).unwrap();
    let err = requester
        .request_certification(&record, 1, &[0x02])
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Unreachable { .. }), "{err:?}");
}

#[tokio::test]
async fn test_round_over_operator_set_from_toml_file() {
    let a = RunningSigner::spawn(seeded(1), 70, Arc::new(ParityPolicy)).await.unwrap();
    let b = RunningSigner::spawn(seeded(2), 30, Arc::new(ParityPolicy)).await.unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[snapshot]]
block = {block}

[[snapshot.operator]]
public_key = "{a_key}"
socket = "{a_socket}"
stake = {{ "{quorum}" = 70 }}

[[snapshot.operator]]
public_key = "{b_key}"
socket = "{b_socket}"
stake = {{ "{quorum}" = 30 }}
"#,
        block = BLOCK - 10,
        quorum = QUORUM,
        a_key = a.record.public_key,
        a_socket = a.record.socket,
        b_key = b.record.public_key,
        b_socket = b.record.socket,
    )
    .unwrap();
    file.flush().unwrap();

    let registry = Arc::new(InMemoryOperatorRegistry::from_toml_file(file.path()).unwrap());
    let coordinator = coordinator_with_registry(registry, Duration::from_millis(100)).unwrap();

    let cert = coordinator
        .get_certificate(
            CertificateRequest {
                task_index: 20,
                created_at_block: BLOCK,
                quorum: QUORUM,
                threshold: 100,
                payload: vec![0xCA, 0xFE],
                expiry: Duration::from_secs(10),
            },
            CancelToken::never(),
        )
        .await
        .unwrap();

    assert_eq!(cert.signers.len(), 2);
    assert!(cert.non_signers.is_empty());
    assert_eq!(cert.quorums[0].signed_stake, 100);
    assert!(cert.verify());

    a.stop().await.unwrap();
    b.stop().await.unwrap();
}
