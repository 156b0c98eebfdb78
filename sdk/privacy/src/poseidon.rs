//! Poseidon over BN254 with the circomlib constants.
//!
//! Commitments must match the deployed circuits bit for bit, so the
//! permutation is circomlib's: state `[0, inputs..]`, width `t = arity + 1`,
//! output `state[0]` after the last round.
//!
//! ```text
//! arity  width  full  partial  alpha
//!   3      4      8      56      5
//!   4      5      8      60      5
//!   5      6      8      60      5
//! ```

use std::sync::LazyLock;

use ark_bn254::Fr;
use light_poseidon::parameters::bn254_x5::get_poseidon_parameters;
use light_poseidon::{Poseidon, PoseidonHasher, PoseidonParameters};

use crate::error::{CommitmentError, Result};

static POSEIDON_3: LazyLock<Option<PoseidonParameters<Fr>>> =
    LazyLock::new(|| get_poseidon_parameters::<Fr>(4).ok());
static POSEIDON_4: LazyLock<Option<PoseidonParameters<Fr>>> =
    LazyLock::new(|| get_poseidon_parameters::<Fr>(5).ok());
static POSEIDON_5: LazyLock<Option<PoseidonParameters<Fr>>> =
    LazyLock::new(|| get_poseidon_parameters::<Fr>(6).ok());

/// Round constants and MDS matrix for the given input count, if supported.
///
/// Shared with the circuit gadget so both sides hash identically.
pub fn poseidon_parameters(arity: usize) -> Option<&'static PoseidonParameters<Fr>> {
    match arity {
        3 => POSEIDON_3.as_ref(),
        4 => POSEIDON_4.as_ref(),
        5 => POSEIDON_5.as_ref(),
        _ => None,
    }
}

/// Poseidon hash selecting the variant by input count (3, 4 or 5)
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr> {
    if poseidon_parameters(inputs.len()).is_none() {
        return Err(CommitmentError::UnsupportedArity(inputs.len()));
    }
    Poseidon::<Fr>::new_circom(inputs.len())
        .and_then(|mut hasher| hasher.hash(inputs))
        .map_err(|_| CommitmentError::UnsupportedArity(inputs.len()))
}

// Arity is fixed by the array type, so these cannot fail.
fn hash_fixed(inputs: &[Fr]) -> Fr {
    poseidon_hash(inputs).unwrap_or_default()
}

pub(crate) fn poseidon3(inputs: &[Fr; 3]) -> Fr {
    hash_fixed(inputs)
}

pub(crate) fn poseidon4(inputs: &[Fr; 4]) -> Fr {
    hash_fixed(inputs)
}

pub(crate) fn poseidon5(inputs: &[Fr; 5]) -> Fr {
    hash_fixed(inputs)
}
