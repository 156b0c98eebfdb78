//! Proof wire format
//!
//! 256 bytes, each coordinate a 32-byte big-endian base field integer, in the
//! order a pairing-precompile verifier expects:
//!
//! ```text
//! | A.x | A.y | B.x.c1 | B.x.c0 | B.y.c1 | B.y.c0 | C.x | C.y |
//! ```
//!
//! The point at infinity is encoded as all-zero coordinates.

use std::fmt;

use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInt, BigInteger, PrimeField};
use ark_groth16::Proof;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ProverError, Result};

pub const ENCODED_PROOF_LEN: usize = 256;
const COORD_LEN: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedProof([u8; ENCODED_PROOF_LEN]);

impl EncodedProof {
    pub fn as_bytes(&self) -> &[u8; ENCODED_PROOF_LEN] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| ProverError::InvalidProofEncoding(e.to_string()))?;
        Self::try_from(raw.as_slice())
    }
}

impl TryFrom<&[u8]> for EncodedProof {
    type Error = ProverError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; ENCODED_PROOF_LEN] = bytes.try_into().map_err(|_| {
            ProverError::InvalidProofEncoding(format!(
                "expected {ENCODED_PROOF_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for EncodedProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedProof({})", self.to_hex())
    }
}

impl Serialize for EncodedProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct EncodedProofVisitor;

impl Visitor<'_> for EncodedProofVisitor {
    type Value = EncodedProof;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a 0x-prefixed hex string of {ENCODED_PROOF_LEN} bytes")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<EncodedProof, E> {
        EncodedProof::from_hex(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for EncodedProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(EncodedProofVisitor)
    }
}

pub fn encode_proof(proof: &Proof<Bn254>) -> EncodedProof {
    let mut out = [0u8; ENCODED_PROOF_LEN];
    let coords = g1_coords(&proof.a)
        .into_iter()
        .chain(g2_coords(&proof.b))
        .chain(g1_coords(&proof.c));

    for (chunk, coord) in out.chunks_exact_mut(COORD_LEN).zip(coords) {
        chunk.copy_from_slice(&coord.into_bigint().to_bytes_be());
    }
    EncodedProof(out)
}

/// Inverse of `encode_proof`. Rejects non-canonical coordinates and points
/// that are off the curve or outside the prime-order subgroup.
pub fn decode_proof(bytes: &[u8]) -> Result<Proof<Bn254>> {
    let encoded = EncodedProof::try_from(bytes)?;
    let mut coords = [Fq::from(0u64); 8];
    for (coord, chunk) in coords.iter_mut().zip(encoded.0.chunks_exact(COORD_LEN)) {
        *coord = read_fq(chunk)?;
    }

    Ok(Proof {
        a: g1_from_coords(coords[0], coords[1], "A")?,
        b: g2_from_coords(
            Fq2::new(coords[3], coords[2]),
            Fq2::new(coords[5], coords[4]),
        )?,
        c: g1_from_coords(coords[6], coords[7], "C")?,
    })
}

fn g1_coords(p: &G1Affine) -> [Fq; 2] {
    if p.infinity {
        [Fq::from(0u64); 2]
    } else {
        [p.x, p.y]
    }
}

fn g2_coords(p: &G2Affine) -> [Fq; 4] {
    if p.infinity {
        [Fq::from(0u64); 4]
    } else {
        [p.x.c1, p.x.c0, p.y.c1, p.y.c0]
    }
}

fn read_fq(chunk: &[u8]) -> Result<Fq> {
    let mut limbs = [0u64; 4];
    for (i, word) in chunk.chunks_exact(8).enumerate() {
        let mut be = [0u8; 8];
        be.copy_from_slice(word);
        limbs[3 - i] = u64::from_be_bytes(be);
    }
    Fq::from_bigint(BigInt::new(limbs)).ok_or_else(|| {
        ProverError::InvalidProofEncoding("coordinate exceeds the base field modulus".into())
    })
}

fn g1_from_coords(x: Fq, y: Fq, name: &str) -> Result<G1Affine> {
    if x == Fq::from(0u64) && y == Fq::from(0u64) {
        return Ok(G1Affine::zero());
    }
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProverError::InvalidProofEncoding(format!(
            "{name} is not a valid G1 point"
        )));
    }
    Ok(point)
}

fn g2_from_coords(x: Fq2, y: Fq2) -> Result<G2Affine> {
    let zero = Fq2::new(Fq::from(0u64), Fq::from(0u64));
    if x == zero && y == zero {
        return Ok(G2Affine::zero());
    }
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProverError::InvalidProofEncoding(
            "B is not a valid G2 point".into(),
        ));
    }
    Ok(point)
}
