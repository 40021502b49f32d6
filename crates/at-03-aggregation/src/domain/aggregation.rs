//! # Per-Task Signature Aggregation
//!
//! Bookkeeping for one round: verifies incoming signature events against the
//! operator set resolved at the task's block, groups them by response digest
//! and tracks signed stake per quorum for each group.
//!
//! Signatures for different digests are never combined. The first digest
//! whose group meets every requested quorum's threshold becomes the winner;
//! the certificate is built from that group only.

use shared_crypto::{BlsPublicKey, BlsSignature, Digest};
use shared_types::{
    Certificate, NonSigner, OperatorId, OperatorRecord, QuorumNum, QuorumSummary, SignatureEvent,
    StakeAmount, TaskParams,
};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::AggregationError;

/// Outcome of accepting one signature event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Accepted; no digest has reached threshold yet, or this event added to
    /// a group that had already won.
    Collecting,
    /// This event pushed `digest` over threshold first.
    ThresholdReached(Digest),
    /// A second digest crossed threshold after a winner was chosen.
    CompetingDigest(Digest),
}

#[derive(Debug)]
struct DigestGroup {
    response: Vec<u8>,
    signatures: BTreeMap<OperatorId, BlsSignature>,
    signed_stake: BTreeMap<QuorumNum, StakeAmount>,
    crossed: bool,
}

/// Aggregation state for one task.
#[derive(Debug)]
pub struct TaskAggregation {
    params: TaskParams,
    operators: BTreeMap<OperatorId, OperatorRecord>,
    total_stake: BTreeMap<QuorumNum, StakeAmount>,
    groups: HashMap<Digest, DigestGroup>,
    signed: HashSet<OperatorId>,
    winner: Option<Digest>,
}

impl TaskAggregation {
    /// Start a round over the operators resolved at the task's block.
    pub fn new(params: TaskParams, operators: BTreeMap<OperatorId, OperatorRecord>) -> Self {
        let total_stake = params
            .quorums
            .iter()
            .map(|q| {
                let total = operators
                    .values()
                    .map(|op| op.stake_in(q.quorum))
                    .fold(0u128, StakeAmount::saturating_add);
                (q.quorum, total)
            })
            .collect();

        Self {
            params,
            operators,
            total_stake,
            groups: HashMap::new(),
            signed: HashSet::new(),
            winner: None,
        }
    }

    /// Task parameters.
    pub fn params(&self) -> &TaskParams {
        &self.params
    }

    /// Digest that reached threshold first, if any.
    pub fn winner(&self) -> Option<Digest> {
        self.winner
    }

    /// Total stake of a requested quorum.
    pub fn total_stake(&self, quorum: QuorumNum) -> StakeAmount {
        self.total_stake.get(&quorum).copied().unwrap_or(0)
    }

    /// Verify and record one signature event.
    pub fn process(&mut self, event: SignatureEvent) -> Result<Progress, AggregationError> {
        let operator = self
            .operators
            .get(&event.operator_id)
            .ok_or(AggregationError::UnknownOperator(event.operator_id))?;

        if self.signed.contains(&event.operator_id) {
            return Err(AggregationError::DuplicateSignature(event.operator_id));
        }
        if shared_crypto::response_digest(&event.response) != event.response_digest {
            return Err(AggregationError::DigestMismatch(event.operator_id));
        }
        if !operator
            .public_key
            .verify(&event.response_digest, &event.signature)
        {
            return Err(AggregationError::InvalidSignature(event.operator_id));
        }

        let group = self
            .groups
            .entry(event.response_digest)
            .or_insert_with(|| DigestGroup {
                response: event.response,
                signatures: BTreeMap::new(),
                signed_stake: BTreeMap::new(),
                crossed: false,
            });

        for q in &self.params.quorums {
            let stake = operator.stake_in(q.quorum);
            let entry = group.signed_stake.entry(q.quorum).or_insert(0);
            *entry = entry.saturating_add(stake);
        }
        group.signatures.insert(event.operator_id, event.signature);
        self.signed.insert(event.operator_id);

        if group.crossed {
            return Ok(Progress::Collecting);
        }

        let met = self.params.quorums.iter().all(|q| {
            let signed = group.signed_stake.get(&q.quorum).copied().unwrap_or(0);
            let total = self.total_stake.get(&q.quorum).copied().unwrap_or(0);
            q.threshold.is_met(signed, total)
        });
        if !met {
            return Ok(Progress::Collecting);
        }

        group.crossed = true;
        match self.winner {
            None => {
                self.winner = Some(event.response_digest);
                Ok(Progress::ThresholdReached(event.response_digest))
            }
            Some(_) => Ok(Progress::CompetingDigest(event.response_digest)),
        }
    }

    /// Build the certificate for the winning digest.
    pub fn build_certificate(&self) -> Result<Certificate, AggregationError> {
        let task_index = self.params.task_index;
        let digest = self
            .winner
            .ok_or(AggregationError::TaskExpired(task_index))?;
        let group = self
            .groups
            .get(&digest)
            .ok_or(AggregationError::TaskExpired(task_index))?;

        let signers: Vec<OperatorId> = group.signatures.keys().copied().collect();
        let signatures: Vec<BlsSignature> = group.signatures.values().cloned().collect();
        let signer_keys: Vec<BlsPublicKey> = signers
            .iter()
            .filter_map(|id| self.operators.get(id))
            .map(|op| op.public_key.clone())
            .collect();

        let non_signers = self
            .operators
            .values()
            .filter(|op| !group.signatures.contains_key(&op.operator_id))
            .map(|op| NonSigner {
                operator_id: op.operator_id,
                public_key: op.public_key.clone(),
            })
            .collect();

        let mut quorums = Vec::with_capacity(self.params.quorums.len());
        for q in &self.params.quorums {
            let member_keys: Vec<BlsPublicKey> = self
                .operators
                .values()
                .filter(|op| op.stake_in(q.quorum) > 0)
                .map(|op| op.public_key.clone())
                .collect();
            quorums.push(QuorumSummary {
                quorum: q.quorum,
                apk: BlsPublicKey::aggregate(&member_keys)?,
                signed_stake: group.signed_stake.get(&q.quorum).copied().unwrap_or(0),
                total_stake: self.total_stake(q.quorum),
            });
        }

        Ok(Certificate {
            task_index,
            task_created_block: self.params.created_at_block,
            response: group.response.clone(),
            response_digest: digest,
            aggregate_signature: BlsSignature::aggregate(&signatures)?,
            signers_apk: BlsPublicKey::aggregate(&signer_keys)?,
            signers,
            non_signers,
            quorums,
        })
    }
}
