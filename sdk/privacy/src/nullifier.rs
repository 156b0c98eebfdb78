//! Nullifiers
//!
//! ```text
//! N = Poseidon3(value, salt, owner_formatted_private_key)
//! ```
//!
//! A spend tag only the owner can compute. Transfers report one per spent
//! input so the persistence layer can mark it consumed without learning
//! which commitment it belongs to.

use ark_bn254::Fr;
use zkdvp_field::FieldElement;
use zkdvp_keypair::ShieldedKeyPair;

use crate::poseidon::poseidon3;

pub fn nullifier(value: u64, salt: &FieldElement, owner: &ShieldedKeyPair) -> FieldElement {
    poseidon3(&[
        Fr::from(value),
        salt.inner(),
        owner.formatted_private_key().inner(),
    ])
    .into()
}
