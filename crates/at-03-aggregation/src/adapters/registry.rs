//! # In-Memory Operator Registry
//!
//! Snapshots of the operator set keyed by block. A lookup at block `n` uses
//! the latest snapshot taken at or before `n`.
//!
//! ## File Format
//!
//! ```toml
//! [[snapshot]]
//! block = 0
//!
//! [[snapshot.operator]]
//! public_key = "0x..."
//! socket = "127.0.0.1:9001"
//! stake = { "0" = 100 }
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use shared_crypto::BlsPublicKey;
use shared_types::{BlockNumber, OperatorId, OperatorRecord, QuorumNum, StakeAmount};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::domain::RegistryError;
use crate::ports::OperatorRegistry;

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    snapshot: Vec<SnapshotEntry>,
}

#[derive(Debug, Deserialize)]
struct SnapshotEntry {
    block: BlockNumber,
    #[serde(default)]
    operator: Vec<OperatorEntry>,
}

#[derive(Debug, Deserialize)]
struct OperatorEntry {
    public_key: String,
    socket: String,
    #[serde(default)]
    stake: BTreeMap<String, u64>,
}

impl OperatorEntry {
    fn into_record(self) -> Result<OperatorRecord, RegistryError> {
        let public_key: BlsPublicKey = self.public_key.parse().map_err(|e| {
            RegistryError::InvalidEntry(format!("public key for {}: {}", self.socket, e))
        })?;

        let mut stake_per_quorum = BTreeMap::new();
        for (quorum, amount) in self.stake {
            let quorum: QuorumNum = quorum.trim().parse().map_err(|_| {
                RegistryError::InvalidEntry(format!(
                    "quorum key '{}' for {} is not a number in 0..=255",
                    quorum, self.socket
                ))
            })?;
            stake_per_quorum.insert(quorum, StakeAmount::from(amount));
        }

        Ok(OperatorRecord::new(public_key, self.socket, stake_per_quorum))
    }
}

/// Operator registry backed by in-memory snapshots.
#[derive(Debug, Default)]
pub struct InMemoryOperatorRegistry {
    snapshots: RwLock<BTreeMap<BlockNumber, Vec<OperatorRecord>>>,
}

impl InMemoryOperatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a single snapshot at block zero.
    pub fn with_operators(operators: Vec<OperatorRecord>) -> Self {
        let registry = Self::new();
        registry.insert_snapshot(0, operators);
        registry
    }

    /// Record (or replace) the operator set as of `block`.
    pub fn insert_snapshot(&self, block: BlockNumber, operators: Vec<OperatorRecord>) {
        self.snapshots.write().insert(block, operators);
    }

    /// Parse snapshots from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| RegistryError::Load(e.to_string()))?;

        let registry = Self::new();
        for snapshot in file.snapshot {
            let operators = snapshot
                .operator
                .into_iter()
                .map(OperatorEntry::into_record)
                .collect::<Result<Vec<_>, _>>()?;
            registry.insert_snapshot(snapshot.block, operators);
        }
        Ok(registry)
    }

    /// Load snapshots from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RegistryError::Load(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

#[async_trait]
impl OperatorRegistry for InMemoryOperatorRegistry {
    async fn get_operators_at_block(
        &self,
        quorums: &[QuorumNum],
        block: BlockNumber,
    ) -> Result<BTreeMap<OperatorId, OperatorRecord>, RegistryError> {
        let snapshots = self.snapshots.read();
        let (snapshot_block, operators) = snapshots
            .range(..=block)
            .next_back()
            .ok_or(RegistryError::NoSnapshot(block))?;

        let resolved: BTreeMap<_, _> = operators
            .iter()
            .filter(|op| op.is_member_of_any(quorums))
            .map(|op| (op.operator_id, op.clone()))
            .collect();

        debug!(
            block,
            snapshot_block,
            operators = resolved.len(),
            "Resolved operator set"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::BlsKeyPair;

    fn record(seed: u8, stakes: &[(QuorumNum, StakeAmount)]) -> OperatorRecord {
        let keypair = BlsKeyPair::from_seed(&[seed; 32]);
        OperatorRecord::new(
            keypair.public_key(),
            format!("127.0.0.1:{}", 9000 + seed as u16),
            stakes.iter().copied().collect(),
        )
    }

    #[tokio::test]
    async fn test_latest_snapshot_at_or_before_block() {
        let registry = InMemoryOperatorRegistry::new();
        let early = record(1, &[(0, 10)]);
        let late = record(2, &[(0, 10)]);
        registry.insert_snapshot(10, vec![early.clone()]);
        registry.insert_snapshot(20, vec![early.clone(), late.clone()]);

        assert_eq!(registry.get_operators_at_block(&[0], 15).await.unwrap().len(), 1);
        assert_eq!(registry.get_operators_at_block(&[0], 20).await.unwrap().len(), 2);
        assert_eq!(registry.get_operators_at_block(&[0], 99).await.unwrap().len(), 2);
        assert_eq!(
            registry.get_operators_at_block(&[0], 5).await,
            Err(RegistryError::NoSnapshot(5))
        );
    }

    #[tokio::test]
    async fn test_filters_by_quorum_membership() {
        let in_zero = record(1, &[(0, 10)]);
        let in_one = record(2, &[(1, 10)]);
        let zero_stake = record(3, &[(0, 0)]);
        let registry = InMemoryOperatorRegistry::with_operators(vec![
            in_zero.clone(),
            in_one.clone(),
            zero_stake,
        ]);

        let resolved = registry.get_operators_at_block(&[0], 1).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains_key(&in_zero.operator_id));

        let both = registry.get_operators_at_block(&[0, 1], 1).await.unwrap();
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn test_load_from_toml() {
        let a = BlsKeyPair::from_seed(&[1u8; 32]).public_key();
        let b = BlsKeyPair::from_seed(&[2u8; 32]).public_key();
        let content = format!(
            r#"
            [[snapshot]]
            block = 5

            [[snapshot.operator]]
            public_key = "{a}"
            socket = "127.0.0.1:9001"
            stake = {{ "0" = 100, "1" = 5 }}

            [[snapshot.operator]]
            public_key = "{b}"
            socket = "127.0.0.1:9002"
            stake = {{ "0" = 50 }}
            "#
        );

        let registry = InMemoryOperatorRegistry::from_toml_str(&content).unwrap();
        let resolved = registry.get_operators_at_block(&[0], 7).await.unwrap();
        assert_eq!(resolved.len(), 2);

        let first = &resolved[&OperatorId::from_public_key(&a)];
        assert_eq!(first.socket, "127.0.0.1:9001");
        assert_eq!(first.stake_in(0), 100);
        assert_eq!(first.stake_in(1), 5);
    }

    #[test]
    fn test_toml_rejects_bad_entries() {
        let bad_key = r#"
            [[snapshot]]
            block = 0
            [[snapshot.operator]]
            public_key = "0x1234"
            socket = "127.0.0.1:9001"
        "#;
        assert!(matches!(
            InMemoryOperatorRegistry::from_toml_str(bad_key),
            Err(RegistryError::InvalidEntry(_))
        ));

        assert!(matches!(
            InMemoryOperatorRegistry::from_toml_str("snapshot = 3"),
            Err(RegistryError::Load(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let pk = BlsKeyPair::from_seed(&[4u8; 32]).public_key();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operators.toml");
        std::fs::write(
            &path,
            format!(
                "[[snapshot]]\nblock = 0\n[[snapshot.operator]]\npublic_key = \"{pk}\"\nsocket = \"127.0.0.1:1\"\nstake = {{ \"0\" = 1 }}\n"
            ),
        )
        .unwrap();

        assert!(InMemoryOperatorRegistry::from_toml_file(&path).is_ok());
        assert!(matches!(
            InMemoryOperatorRegistry::from_toml_file(dir.path().join("missing.toml")),
            Err(RegistryError::Load(_))
        ));
    }
}
