//! Parity policy: certify only even numbers.

use async_trait::async_trait;

use crate::domain::{PolicyContext, PolicyError, PolicyKind, ResponsePolicy};

/// Treats the payload as a big-endian unsigned integer. Even values (the
/// empty payload is zero) are echoed back unchanged; odd values are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParityPolicy;

#[async_trait]
impl ResponsePolicy for ParityPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Parity
    }

    async fn respond(&self, _context: &PolicyContext, payload: &[u8]) -> Result<Vec<u8>, PolicyError> {
        // Parity of a big-endian integer is the parity of its last byte
        match payload.last() {
            Some(byte) if byte & 1 == 1 => Err(PolicyError::OddValue),
            _ => Ok(payload.to_vec()),
        }
    }
}
