//! # Shared Crypto - Certification Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Response digests |
//! | `bls` | BLS12-381 (min-sig) | Signer attestations, aggregate certificates |
//!
//! ## Security Properties
//!
//! - **Subgroup checks**: signatures and public keys are validated on parse,
//!   so everything downstream operates on well-formed points
//! - **Proof-of-possession DST**: same-message aggregation is safe against
//!   rogue-key attacks only when operator keys were registered with a PoP;
//!   key registration is outside this crate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bls;
pub mod errors;
pub mod hashing;

// Re-exports
pub use bls::{BlsKeyPair, BlsPublicKey, BlsSignature, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_concat, response_digest, Digest};

/// Decode hex with an optional `0x` prefix.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(input.trim_start_matches("0x")).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex_prefix_optional() {
        assert_eq!(decode_hex("0xabcd").unwrap(), vec![0xab, 0xcd]);
        assert_eq!(decode_hex("abcd").unwrap(), vec![0xab, 0xcd]);
        assert!(decode_hex("0xabc").is_err());
    }
}
