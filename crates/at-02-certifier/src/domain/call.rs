//! Read-only call encoded in a certification payload.
//!
//! ```text
//! offset  0      8       28    48    56         64      96
//!         │ block │ from  │ to  │ gas │ gas price │ value │ calldata...
//!           u64     H160    H160  u64   u64         U256
//! ```
//! All integers are big-endian.

use primitive_types::{H160, U256};

use super::PolicyError;

/// A read-only contract call pinned to a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub block_number: u64,
    pub from: H160,
    pub to: H160,
    pub gas: u64,
    pub gas_price: u64,
    pub value: U256,
    pub data: Vec<u8>,
}

impl CallRequest {
    /// Length of the fixed-size prefix.
    pub const HEADER_LEN: usize = 96;

    /// Decode from the payload layout.
    pub fn decode(bytes: &[u8]) -> Result<Self, PolicyError> {
        if bytes.len() < Self::HEADER_LEN {
            return Err(PolicyError::TooShort {
                min: Self::HEADER_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            block_number: read_u64(&bytes[0..8]),
            from: H160::from_slice(&bytes[8..28]),
            to: H160::from_slice(&bytes[28..48]),
            gas: read_u64(&bytes[48..56]),
            gas_price: read_u64(&bytes[56..64]),
            value: U256::from_big_endian(&bytes[64..96]),
            data: bytes[Self::HEADER_LEN..].to_vec(),
        })
    }

    /// Encode into the payload layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::HEADER_LEN + self.data.len()];
        out[0..8].copy_from_slice(&self.block_number.to_be_bytes());
        out[8..28].copy_from_slice(self.from.as_bytes());
        out[28..48].copy_from_slice(self.to.as_bytes());
        out[48..56].copy_from_slice(&self.gas.to_be_bytes());
        out[56..64].copy_from_slice(&self.gas_price.to_be_bytes());
        self.value.to_big_endian(&mut out[64..96]);
        out[Self::HEADER_LEN..].copy_from_slice(&self.data);
        out
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}
