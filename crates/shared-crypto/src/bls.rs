//! BLS12-381 Signature Implementation
//!
//! Provides BLS signature primitives for:
//! - Key generation
//! - Sign/verify operations over response digests
//! - Signature and public key aggregation
//!
//! Uses blst's `min_sig` variant: signatures are G1 points (48 bytes
//! compressed), public keys are G2 points (96 bytes compressed).

use blst::min_sig::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use rand::RngCore;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::{CryptoError, Digest};

/// Domain separation tag for min-sig BLS with proof of possession.
const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_POP_";

/// Compressed G1 signature length.
pub const SIGNATURE_LENGTH: usize = 48;

/// Compressed G2 public key length.
pub const PUBLIC_KEY_LENGTH: usize = 96;

/// Secret key length.
pub const SECRET_KEY_LENGTH: usize = 32;

/// BLS public key (G2 point, 96 bytes compressed)
#[derive(Clone, SerializeDisplay, DeserializeFromStr)]
pub struct BlsPublicKey(PublicKey);

impl PartialEq for BlsPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsPublicKey {}

/// BLS signature (G1 point, 48 bytes compressed)
#[derive(Clone, SerializeDisplay, DeserializeFromStr)]
pub struct BlsSignature(Signature);

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsSignature {}

/// BLS key pair held by a signer node.
pub struct BlsKeyPair {
    secret: SecretKey,
    public: BlsPublicKey,
}

impl BlsKeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let mut ikm = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut *ikm);
        Self::from_seed(&ikm)
    }

    /// Derive a key pair deterministically from 32 bytes of key material.
    pub fn from_seed(ikm: &[u8; 32]) -> Self {
        let secret = SecretKey::key_gen(ikm, &[]).expect("valid IKM");
        let public = BlsPublicKey(secret.sk_to_pk());
        Self { secret, public }
    }

    /// Create from big-endian secret scalar bytes
    pub fn from_secret_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let public = BlsPublicKey(secret.sk_to_pk());
        Ok(Self { secret, public })
    }

    /// Parse a hex secret scalar, with or without `0x`.
    ///
    /// Short inputs are left-padded, so `"0x1"` is the scalar one.
    pub fn from_hex(hex_key: &str) -> Result<Self, CryptoError> {
        let digits = hex_key.trim().trim_start_matches("0x");
        if digits.is_empty() || digits.len() > SECRET_KEY_LENGTH * 2 {
            return Err(CryptoError::InvalidPrivateKey);
        }
        let padded = Zeroizing::new(format!("{:0>64}", digits));
        let mut bytes = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        hex::decode_to_slice(padded.as_str(), &mut *bytes)
            .map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_secret_bytes(&bytes)
    }

    /// Sign a response digest
    pub fn sign_digest(&self, digest: &Digest) -> BlsSignature {
        BlsSignature(self.secret.sign(digest.as_bytes(), DST, &[]))
    }

    /// Get the public key
    pub fn public_key(&self) -> BlsPublicKey {
        self.public.clone()
    }
}

impl fmt::Debug for BlsKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlsKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl BlsPublicKey {
    /// Verify a signature over `digest` against this public key
    pub fn verify(&self, digest: &Digest, signature: &BlsSignature) -> bool {
        signature
            .0
            .verify(true, digest.as_bytes(), DST, &[], &self.0, true)
            == BLST_ERROR::BLST_SUCCESS
    }

    /// Parse and subgroup-check a 96-byte compressed key
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoError::InvalidLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        PublicKey::key_validate(bytes)
            .map(BlsPublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Serialize to 96-byte compressed form
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Aggregate multiple public keys into one
    ///
    /// The aggregated key verifies a signature aggregated from the same signers
    /// over the same digest.
    pub fn aggregate(keys: &[BlsPublicKey]) -> Result<Self, CryptoError> {
        if keys.is_empty() {
            return Err(CryptoError::EmptyAggregation);
        }
        let refs: Vec<&PublicKey> = keys.iter().map(|k| &k.0).collect();
        AggregatePublicKey::aggregate(&refs, false)
            .map(|apk| BlsPublicKey(apk.to_public_key()))
            .map_err(|_| CryptoError::AggregationFailed)
    }
}

impl BlsSignature {
    /// Parse and subgroup-check a 48-byte compressed signature
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoError::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            });
        }
        Signature::sig_validate(bytes, true)
            .map(BlsSignature)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Serialize to 48-byte compressed form
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// Aggregate multiple signatures into one
    pub fn aggregate(sigs: &[BlsSignature]) -> Result<Self, CryptoError> {
        if sigs.is_empty() {
            return Err(CryptoError::EmptyAggregation);
        }
        let refs: Vec<&Signature> = sigs.iter().map(|s| &s.0).collect();
        AggregateSignature::aggregate(&refs, false)
            .map(|asig| BlsSignature(asig.to_signature()))
            .map_err(|_| CryptoError::AggregationFailed)
    }
}

impl fmt::Display for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPublicKey({})", self)
    }
}

impl FromStr for BlsPublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&crate::decode_hex(s)?)
    }
}

impl fmt::Display for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsSignature({})", self)
    }
}

impl FromStr for BlsSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&crate::decode_hex(s)?)
    }
}
