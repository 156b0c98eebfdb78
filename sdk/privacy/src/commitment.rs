//! UTXO Commitments
//!
//! ```text
//! value UTXO:  C = Poseidon4(value, salt, owner_pk.x, owner_pk.y)
//! token UTXO:  C = Poseidon5(token_id, uri_digest, salt, owner_pk.x, owner_pk.y)
//! ```
//!
//! The commitment is the only public trace of a UTXO. It hides value and owner
//! behind the salt while letting the owner re-open it inside a proof.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};
use zkdvp_field::FieldElement;
use zkdvp_keypair::ShieldedPublicKey;

use crate::poseidon::{poseidon4, poseidon5};

/// Commit to a value owned by `owner`
pub fn commit(value: u64, salt: &FieldElement, owner: &ShieldedPublicKey) -> FieldElement {
    poseidon4(&[
        Fr::from(value),
        salt.inner(),
        owner.x.inner(),
        owner.y.inner(),
    ])
    .into()
}

/// Commit to a non-fungible token owned by `owner`
pub fn commit_nf(
    token_id: u64,
    uri: &str,
    salt: &FieldElement,
    owner: &ShieldedPublicKey,
) -> FieldElement {
    poseidon5(&[
        Fr::from(token_id),
        uri_digest(uri).inner(),
        salt.inner(),
        owner.x.inner(),
        owner.y.inner(),
    ])
    .into()
}

/// SHA-256 of the URI truncated to its low 253 bits, which always fits the field
pub fn uri_digest(uri: &str) -> FieldElement {
    let mut digest: [u8; 32] = Sha256::digest(uri.as_bytes()).into();
    digest[0] &= 0x1F;
    FieldElement::new(Fr::from_be_bytes_mod_order(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salt::new_salt;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use zkdvp_keypair::ShieldedKeyPair;

    fn owner(seed: u64) -> ShieldedPublicKey {
        *ShieldedKeyPair::from_private_key(FieldElement::from(seed)).public_key()
    }

    #[test]
    fn test_commitment_deterministic() {
        let salt = FieldElement::from(42u64);
        let pk = owner(1);

        let c1 = commit(1000, &salt, &pk);
        let c2 = commit(1000, &salt, &pk);

        assert_eq!(c1, c2, "same inputs should produce same commitment");
    }

    #[test]
    fn test_commitment_hiding() {
        let pk = owner(1);

        let c1 = commit(1000, &FieldElement::from(1u64), &pk);
        let c2 = commit(1000, &FieldElement::from(2u64), &pk);

        assert_ne!(c1, c2, "different salts should produce different commitments");
    }

    #[test]
    fn test_commitment_binding() {
        let salt = FieldElement::from(42u64);
        let pk = owner(1);

        assert_ne!(commit(1000, &salt, &pk), commit(2000, &salt, &pk));
        assert_ne!(commit(1000, &salt, &pk), commit(1000, &salt, &owner(2)));
    }

    #[test]
    fn test_no_collisions_across_random_salts() {
        let mut rng = StdRng::seed_from_u64(7);
        let pk = owner(3);

        let seen: HashSet<FieldElement> = (0..500)
            .map(|_| commit(10, &new_salt(&mut rng), &pk))
            .collect();
        assert_eq!(seen.len(), 500);
    }

    #[test]
    fn test_nf_commitment_depends_on_uri() {
        let salt = FieldElement::from(9u64);
        let pk = owner(4);

        let a = commit_nf(1, "https://example.com/token/1", &salt, &pk);
        let b = commit_nf(1, "https://example.com/token/2", &salt, &pk);
        assert_ne!(a, b);
        assert_eq!(a, commit_nf(1, "https://example.com/token/1", &salt, &pk));
    }

    #[test]
    fn test_uri_digest_fits_253_bits() {
        let digest = uri_digest("ipfs://bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi");
        assert!(digest.to_biguint().bits() <= 253);
    }
}
