//! Shielded Identities
//!
//! A participant holds two unrelated key pairs:
//!
//! ```text
//! Participant = {
//!     external_address,   // from the base-ledger signer (public)
//!     shielded keys {
//!         private_key,            // random BN254 scalar
//!         formatted_private_key,  // circuit witness form of private_key
//!         public_key (x, y),      // formatted_private_key · BASE8 on Baby Jubjub
//!     }
//! }
//! ```
//!
//! The shielded key is freshly random; it is not derived from the base signer's
//! key. The signer is only asked for its address.

pub mod babyjub;

use std::fmt;

use ark_bn254::Fr;
use ark_ff::PrimeField;
use ark_std::UniformRand;
use blake_hash::{Blake512, Digest};
use ed25519_dalek::SigningKey;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkdvp_field::FieldElement;

use crate::babyjub::{BASE8, Point};

// ============================================================================
// Errors
// ============================================================================

/// Failure reported by a base-ledger signer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("base signer could not supply an address: {0}")]
    Signer(#[from] SignerError),
}

// ============================================================================
// Keys
// ============================================================================

/// Shielded public key: a point on Baby Jubjub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShieldedPublicKey {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl ShieldedPublicKey {
    /// Key used for empty output slots
    pub const ZERO: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ZERO,
    };

    pub fn from_point(point: Point) -> Self {
        Self {
            x: point.x.into(),
            y: point.y.into(),
        }
    }

    pub fn to_point(&self) -> Point {
        Point {
            x: self.x.inner(),
            y: self.y.inner(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// `[x, y]` as laid out in circuit inputs
    pub fn coordinates(&self) -> [FieldElement; 2] {
        [self.x, self.y]
    }
}

/// Reformat a raw private key into the scalar the circuit multiplies `BASE8` by.
///
/// `BLAKE-512(key)`, first 32 bytes, pruned as for EdDSA, read little-endian
/// and shifted right by 3, as circomlib's `prv2pub` does. The result is below `2^252`, so it is a canonical
/// field element.
pub fn format_private_key(private_key: &FieldElement) -> FieldElement {
    let digest = Blake512::digest(&private_key.to_be_bytes());

    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&digest[..32]);
    scalar[0] &= 0xF8;
    scalar[31] &= 0x7F;
    scalar[31] |= 0x40;

    let shifted = BigUint::from_bytes_le(&scalar) >> 3u32;
    FieldElement::new(Fr::from_le_bytes_mod_order(&shifted.to_bytes_le()))
}

/// Shielded key material for one participant.
///
/// Never serialized by this crate; persistence is the caller's concern.
#[derive(Clone, PartialEq, Eq)]
pub struct ShieldedKeyPair {
    private_key: FieldElement,
    formatted_private_key: FieldElement,
    public_key: ShieldedPublicKey,
}

impl ShieldedKeyPair {
    /// Generate a fresh random key pair
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_private_key(FieldElement::new(Fr::rand(rng)))
    }

    /// Rebuild a key pair from a previously generated private key
    pub fn from_private_key(private_key: FieldElement) -> Self {
        let formatted_private_key = format_private_key(&private_key);
        let public_key =
            ShieldedPublicKey::from_point(BASE8.mul(&formatted_private_key.inner()));
        Self {
            private_key,
            formatted_private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &FieldElement {
        &self.private_key
    }

    /// Scalar handed to circuits as the owner's private key
    pub fn formatted_private_key(&self) -> &FieldElement {
        &self.formatted_private_key
    }

    pub fn public_key(&self) -> &ShieldedPublicKey {
        &self.public_key
    }
}

impl fmt::Debug for ShieldedKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldedKeyPair")
            .field("private_key", &"<redacted>")
            .field("formatted_private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

// ============================================================================
// Base signer
// ============================================================================

/// The base-ledger signing identity of a participant
pub trait BaseSigner {
    fn address(&self) -> Result<String, SignerError>;
}

/// Local ed25519 signer; its address is the base58 verifying key
pub struct LocalSigner {
    signing_key: SigningKey,
}

impl LocalSigner {
    pub fn new_random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }
}

impl BaseSigner for LocalSigner {
    fn address(&self) -> Result<String, SignerError> {
        Ok(bs58::encode(self.signing_key.verifying_key().to_bytes()).into_string())
    }
}

// ============================================================================
// Participant
// ============================================================================

/// A participant of the shielded protocol. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    external_address: String,
    keys: ShieldedKeyPair,
}

impl Participant {
    pub fn new(external_address: impl Into<String>, keys: ShieldedKeyPair) -> Self {
        Self {
            external_address: external_address.into(),
            keys,
        }
    }

    pub fn external_address(&self) -> &str {
        &self.external_address
    }

    pub fn keys(&self) -> &ShieldedKeyPair {
        &self.keys
    }

    pub fn public_key(&self) -> &ShieldedPublicKey {
        self.keys.public_key()
    }
}

/// Create a participant: read the signer's address and draw a fresh shielded key
pub fn derive_identity<S, R>(signer: &S, rng: &mut R) -> Result<Participant, IdentityError>
where
    S: BaseSigner + ?Sized,
    R: RngCore + CryptoRng,
{
    let external_address = signer.address()?;
    Ok(Participant::new(
        external_address,
        ShieldedKeyPair::generate(rng),
    ))
}
