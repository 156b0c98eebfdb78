//! Randomness source for commitments.

use ark_bn254::Fr;
use ark_std::UniformRand;
use rand::{CryptoRng, RngCore};
use zkdvp_field::FieldElement;

/// Draw a fresh salt: uniformly random and never zero (zero marks padding slots)
pub fn new_salt<R: RngCore + CryptoRng>(rng: &mut R) -> FieldElement {
    loop {
        let salt = FieldElement::new(Fr::rand(rng));
        if !salt.is_zero() {
            return salt;
        }
    }
}
