//! # Core Domain Entities
//!
//! Defines the entities that flow through one certification round.
//!
//! ## Clusters
//!
//! - **Task**: `TaskIndex`, `BlockNumber`, `QuorumThreshold`, `TaskParams`
//! - **Operators**: `OperatorId`, `OperatorRecord`
//! - **Signatures**: `SignatureEvent`, `Certificate`, `NonSigner`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, hex::Hex, DeserializeFromStr, SerializeDisplay};
use shared_crypto::{keccak256, response_digest, BlsPublicKey, BlsSignature, CryptoError, Digest};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::TypeError;

// =============================================================================
// CLUSTER A: THE TASK
// =============================================================================

/// Caller-supplied identifier of one certification round.
pub type TaskIndex = u32;

/// Block at which the operator set is resolved.
pub type BlockNumber = u32;

/// Identifier of a voting group.
pub type QuorumNum = u8;

/// Voting weight of one operator in one quorum.
pub type StakeAmount = u128;

/// Share of a quorum's total stake that must agree, in (0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ThresholdPercentage(u8);

impl ThresholdPercentage {
    /// Validate and wrap a percentage.
    pub fn new(percent: u8) -> Result<Self, TypeError> {
        if percent == 0 || percent > 100 {
            return Err(TypeError::InvalidThreshold(percent));
        }
        Ok(Self(percent))
    }

    /// The raw percentage.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Whether `signed` out of `total` meets this threshold.
    ///
    /// A quorum with no stake can never be satisfied.
    pub fn is_met(self, signed: StakeAmount, total: StakeAmount) -> bool {
        if total == 0 {
            return false;
        }
        signed.saturating_mul(100) >= total.saturating_mul(StakeAmount::from(self.0))
    }
}

impl TryFrom<u8> for ThresholdPercentage {
    type Error = TypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThresholdPercentage> for u8 {
    fn from(value: ThresholdPercentage) -> Self {
        value.0
    }
}

/// A quorum paired with its required threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumThreshold {
    /// The quorum.
    pub quorum: QuorumNum,
    /// Its threshold.
    pub threshold: ThresholdPercentage,
}

/// Parameters registered with the aggregation engine for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParams {
    /// Round identifier.
    pub task_index: TaskIndex,
    /// Block at which the operator set is resolved.
    pub created_at_block: BlockNumber,
    /// Requested quorums; every one must reach its threshold.
    pub quorums: Vec<QuorumThreshold>,
    /// Time after which the round fails if no response reached threshold.
    pub expiry: Duration,
    /// Extra time to keep collecting signatures once threshold is reached.
    pub aggregation_window: Duration,
}

impl TaskParams {
    /// Check the invariants a round relies on.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.quorums.is_empty() {
            return Err(TypeError::NoQuorums);
        }
        for (i, q) in self.quorums.iter().enumerate() {
            if self.quorums[..i].iter().any(|other| other.quorum == q.quorum) {
                return Err(TypeError::DuplicateQuorum(q.quorum));
            }
        }
        if self.expiry.is_zero() {
            return Err(TypeError::ZeroExpiry);
        }
        Ok(())
    }

    /// Requested quorum identifiers in request order.
    pub fn quorum_nums(&self) -> Vec<QuorumNum> {
        self.quorums.iter().map(|q| q.quorum).collect()
    }
}

// =============================================================================
// CLUSTER B: OPERATORS
// =============================================================================

/// Operator identity: Keccak-256 of the operator's compressed public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, SerializeDisplay, DeserializeFromStr)]
pub struct OperatorId(pub [u8; 32]);

impl OperatorId {
    /// Derive the identity bound to a public key.
    pub fn from_public_key(public_key: &BlsPublicKey) -> Self {
        Self(keccak256(&public_key.to_bytes()))
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps logs readable
        write!(f, "OperatorId(0x{})", hex::encode(&self.0[..4]))
    }
}

impl FromStr for OperatorId {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = shared_crypto::decode_hex(s)?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

/// An operator as resolved from the registry at a given block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    /// Operator identity.
    pub operator_id: OperatorId,
    /// Voting weight per quorum the operator is registered in.
    pub stake_per_quorum: BTreeMap<QuorumNum, StakeAmount>,
    /// Advertised `host:port` of the operator's certifying endpoint.
    pub socket: String,
    /// Public key used to verify the operator's signatures.
    pub public_key: BlsPublicKey,
}

impl OperatorRecord {
    /// Build a record whose identity is derived from its public key.
    pub fn new(
        public_key: BlsPublicKey,
        socket: impl Into<String>,
        stake_per_quorum: BTreeMap<QuorumNum, StakeAmount>,
    ) -> Self {
        Self {
            operator_id: OperatorId::from_public_key(&public_key),
            stake_per_quorum,
            socket: socket.into(),
            public_key,
        }
    }

    /// Stake in `quorum`, zero if not registered there.
    pub fn stake_in(&self, quorum: QuorumNum) -> StakeAmount {
        self.stake_per_quorum.get(&quorum).copied().unwrap_or(0)
    }

    /// Whether the operator carries any weight in any of `quorums`.
    pub fn is_member_of_any(&self, quorums: &[QuorumNum]) -> bool {
        quorums.iter().any(|q| self.stake_in(*q) > 0)
    }
}

// =============================================================================
// CLUSTER C: SIGNATURES AND CERTIFICATES
// =============================================================================

/// One operator's signed answer, as forwarded into the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEvent {
    /// Round this signature belongs to.
    pub task_index: TaskIndex,
    /// Signing operator.
    pub operator_id: OperatorId,
    /// Response bytes the operator computed.
    pub response: Vec<u8>,
    /// Keccak-256 of `response`.
    pub response_digest: Digest,
    /// Signature over `response_digest`.
    pub signature: BlsSignature,
}

impl SignatureEvent {
    /// Build an event, computing the digest from the response.
    pub fn new(
        task_index: TaskIndex,
        operator_id: OperatorId,
        response: Vec<u8>,
        signature: BlsSignature,
    ) -> Self {
        let response_digest = response_digest(&response);
        Self {
            task_index,
            operator_id,
            response,
            response_digest,
            signature,
        }
    }
}

/// An operator that resolved for the round but did not contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonSigner {
    /// Operator identity.
    pub operator_id: OperatorId,
    /// Its public key (needed to subtract it from a quorum APK).
    pub public_key: BlsPublicKey,
}

/// Per-quorum aggregate public key and stake accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumSummary {
    /// The quorum.
    pub quorum: QuorumNum,
    /// Aggregate of every resolved member's public key.
    pub apk: BlsPublicKey,
    /// Stake that signed the certified response.
    pub signed_stake: StakeAmount,
    /// Total stake of the quorum at the round's block.
    pub total_stake: StakeAmount,
}

/// Aggregate proof that a quorum agreed on one response.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Round the certificate answers.
    pub task_index: TaskIndex,
    /// Block the operator set was resolved at.
    pub task_created_block: BlockNumber,
    /// The agreed response.
    #[serde_as(as = "Hex")]
    pub response: Vec<u8>,
    /// Keccak-256 of `response`.
    pub response_digest: Digest,
    /// Aggregate of the signers' signatures over `response_digest`.
    pub aggregate_signature: BlsSignature,
    /// Aggregate of the signers' public keys.
    pub signers_apk: BlsPublicKey,
    /// Signers sorted by id.
    pub signers: Vec<OperatorId>,
    /// Resolved operators that did not contribute, sorted by id.
    pub non_signers: Vec<NonSigner>,
    /// Per-quorum accounting in request order.
    pub quorums: Vec<QuorumSummary>,
}

impl Certificate {
    /// Recompute the digest and check the aggregate signature.
    pub fn verify(&self) -> bool {
        response_digest(&self.response) == self.response_digest
            && self
                .signers_apk
                .verify(&self.response_digest, &self.aggregate_signature)
    }

    /// Identities of the non-signers.
    pub fn non_signer_ids(&self) -> Vec<OperatorId> {
        self.non_signers.iter().map(|n| n.operator_id).collect()
    }

    /// Non-signer indicator over `operators` (true = did not sign).
    pub fn non_signer_bitmap(&self, operators: &[OperatorId]) -> Vec<bool> {
        operators
            .iter()
            .map(|id| self.non_signers.iter().any(|n| n.operator_id == *id))
            .collect()
    }
}
