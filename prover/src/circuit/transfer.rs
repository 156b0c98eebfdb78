//! Transfer Circuit
//!
//! ZK proof that a private transfer is valid:
//! 1. The spender's public key is `key · BASE8`
//! 2. Every non-zero input commitment opens under the spender's key
//! 3. Every non-zero output commitment opens under its owner's key
//! 4. Zero commitments mark padding slots and carry no value
//! 5. All values fit in 64 bits and `sum(inputs) = sum(outputs)`
//! 6. No non-zero input commitment is spent twice in one transfer
//!
//! ```text
//! Public Inputs:
//!   - input_commitments[N]
//!   - output_commitments[N]
//!
//! Private Witness:
//!   - input values and salts
//!   - output values, salts and owner public keys
//!   - spender's formatted private key
//! ```

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::babyjub::{PointVar, fixed_base_mul};
use super::{enforce_u64, poseidon::poseidon_var};
use crate::inputs::{TRANSFER_ARITY, TransferInputs};

pub const TRANSFER_PUBLIC_INPUTS: usize = 2 * TRANSFER_ARITY;

#[derive(Clone, Default)]
pub struct TransferCircuit {
    // --- Public Inputs ---
    pub input_commitments: [Fr; TRANSFER_ARITY],
    pub output_commitments: [Fr; TRANSFER_ARITY],

    // --- Private Witness ---
    pub input_values: [Fr; TRANSFER_ARITY],
    pub input_salts: [Fr; TRANSFER_ARITY],
    pub output_values: [Fr; TRANSFER_ARITY],
    pub output_salts: [Fr; TRANSFER_ARITY],
    pub output_owners: [[Fr; 2]; TRANSFER_ARITY],
    pub spender_key: Fr,
}

impl TransferCircuit {
    /// Public signals in allocation order: inputs first, then outputs
    pub fn public_inputs(&self) -> Vec<Fr> {
        self.input_commitments
            .iter()
            .chain(self.output_commitments.iter())
            .copied()
            .collect()
    }
}

impl From<&TransferInputs> for TransferCircuit {
    fn from(inputs: &TransferInputs) -> Self {
        Self {
            input_commitments: inputs.input_commitments.map(|c| c.inner()),
            output_commitments: inputs.output_commitments.map(|c| c.inner()),
            input_values: inputs.input_values.map(|v| v.inner()),
            input_salts: inputs.input_salts.map(|s| s.inner()),
            output_values: inputs.output_values.map(|v| v.inner()),
            output_salts: inputs.output_salts.map(|s| s.inner()),
            output_owners: inputs
                .output_owner_public_keys
                .map(|[x, y]| [x.inner(), y.inner()]),
            spender_key: inputs.input_owner_private_key.inner(),
        }
    }
}

impl ConstraintSynthesizer<Fr> for TransferCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // === Allocate Public Inputs ===
        let input_commitments = self
            .input_commitments
            .iter()
            .map(|c| FpVar::new_input(cs.clone(), || Ok(*c)))
            .collect::<Result<Vec<_>, _>>()?;
        let output_commitments = self
            .output_commitments
            .iter()
            .map(|c| FpVar::new_input(cs.clone(), || Ok(*c)))
            .collect::<Result<Vec<_>, _>>()?;

        // === Spender Key ===
        let spender_key = FpVar::new_witness(cs.clone(), || Ok(self.spender_key))?;
        let spender = fixed_base_mul(&spender_key)?;

        // === Process Inputs ===
        let mut total_input_value = FpVar::zero();
        for (i, commitment) in input_commitments.iter().enumerate() {
            let value = FpVar::new_witness(cs.clone(), || Ok(self.input_values[i]))?;
            let salt = FpVar::new_witness(cs.clone(), || Ok(self.input_salts[i]))?;

            enforce_u64(&value)?;
            enforce_slot(commitment, &value, &salt, &spender)?;

            total_input_value += &value;
        }
        enforce_distinct(&input_commitments)?;

        // === Process Outputs ===
        let mut total_output_value = FpVar::zero();
        for (i, commitment) in output_commitments.iter().enumerate() {
            let value = FpVar::new_witness(cs.clone(), || Ok(self.output_values[i]))?;
            let salt = FpVar::new_witness(cs.clone(), || Ok(self.output_salts[i]))?;
            let owner = PointVar::new_witness(cs.clone(), self.output_owners[i])?;

            enforce_u64(&value)?;
            enforce_slot(commitment, &value, &salt, &owner)?;

            total_output_value += &value;
        }

        // === Balance Constraint ===
        total_input_value.enforce_equal(&total_output_value)?;

        Ok(())
    }
}

/// A zero commitment is a padding slot and must carry no value; any other
/// commitment must open to `(value, salt, owner)`.
fn enforce_slot(
    commitment: &FpVar<Fr>,
    value: &FpVar<Fr>,
    salt: &FpVar<Fr>,
    owner: &PointVar,
) -> Result<(), SynthesisError> {
    let zero = FpVar::zero();
    let is_padding = commitment.is_eq(&zero)?;
    let is_real = commitment.is_neq(&zero)?;

    let computed = poseidon_var(&[
        value.clone(),
        salt.clone(),
        owner.x.clone(),
        owner.y.clone(),
    ])?;
    computed.conditional_enforce_equal(commitment, &is_real)?;
    value.conditional_enforce_equal(&zero, &is_padding)?;

    Ok(())
}

/// Two real input slots may not carry the same commitment. Padding slots are
/// all zero and exempt.
fn enforce_distinct(commitments: &[FpVar<Fr>]) -> Result<(), SynthesisError> {
    let zero = FpVar::zero();
    for (i, a) in commitments.iter().enumerate() {
        for b in &commitments[i + 1..] {
            let both_real = Boolean::kary_and(&[a.is_neq(&zero)?, b.is_neq(&zero)?])?;
            a.conditional_enforce_not_equal(b, &both_real)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use zkdvp_field::FieldElement;
    use zkdvp_keypair::ShieldedKeyPair;
    use zkdvp_privacy::Utxo;

    use crate::inputs::build_transfer_inputs;

    fn keys(seed: u64) -> ShieldedKeyPair {
        ShieldedKeyPair::from_private_key(FieldElement::from(seed))
    }

    fn satisfied(circuit: TransferCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    fn transfer(
        spender: &ShieldedKeyPair,
        inputs: &[u64],
        outputs: &[(u64, &ShieldedKeyPair)],
    ) -> TransferCircuit {
        let mut rng = StdRng::seed_from_u64(99);
        let inputs: Vec<Utxo> = inputs
            .iter()
            .map(|v| Utxo::new(*v, spender.public_key(), None, &mut rng))
            .collect();
        let owners: Vec<_> = outputs.iter().map(|(_, k)| *k.public_key()).collect();
        let outputs: Vec<Utxo> = outputs
            .iter()
            .map(|(v, k)| Utxo::new(*v, k.public_key(), None, &mut rng))
            .collect();

        let shape = build_transfer_inputs(spender, &inputs, &outputs, &owners).unwrap();
        TransferCircuit::from(&shape)
    }

    #[test]
    fn test_two_by_two_transfer_satisfies() {
        let alice = keys(1);
        let bob = keys(2);
        let circuit = transfer(&alice, &[10, 20], &[(25, &bob), (5, &alice)]);
        assert!(satisfied(circuit));
    }

    #[test]
    fn test_padded_transfer_satisfies() {
        let alice = keys(1);
        let bob = keys(2);
        let circuit = transfer(&alice, &[10], &[(10, &bob)]);
        assert_eq!(circuit.input_commitments[1], Fr::from(0u64));
        assert!(satisfied(circuit));
    }

    #[test]
    fn test_value_not_conserved_unsatisfied() {
        let alice = keys(1);
        let bob = keys(2);
        let mut circuit = transfer(&alice, &[10, 20], &[(25, &bob), (5, &alice)]);
        circuit.output_values[1] = Fr::from(4u64);
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_foreign_input_unsatisfied() {
        let alice = keys(1);
        let bob = keys(2);
        let mut circuit = transfer(&alice, &[10], &[(10, &bob)]);
        circuit.spender_key = bob.formatted_private_key().inner();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_value_in_padding_slot_unsatisfied() {
        let alice = keys(1);
        let bob = keys(2);
        let mut circuit = transfer(&alice, &[10], &[(10, &bob)]);
        circuit.input_values[1] = Fr::from(3u64);
        circuit.output_values[1] = Fr::from(3u64);
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_double_spend_of_one_commitment_unsatisfied() {
        let alice = keys(1);
        let bob = keys(2);
        let mut circuit = transfer(&alice, &[10, 10], &[(20, &bob)]);
        assert!(satisfied(circuit.clone()));

        circuit.input_commitments[1] = circuit.input_commitments[0];
        circuit.input_salts[1] = circuit.input_salts[0];

        // No inverse witness exists for a zero difference.
        let cs = ConstraintSystem::<Fr>::new_ref();
        match circuit.generate_constraints(cs.clone()) {
            Ok(()) => assert!(!cs.is_satisfied().unwrap()),
            Err(err) => assert!(matches!(err, SynthesisError::AssignmentMissing)),
        }
    }

    #[test]
    fn test_public_inputs_order() {
        let alice = keys(1);
        let bob = keys(2);
        let circuit = transfer(&alice, &[10], &[(10, &bob)]);
        let public = circuit.public_inputs();
        assert_eq!(public.len(), TRANSFER_PUBLIC_INPUTS);
        assert_eq!(public[0], circuit.input_commitments[0]);
        assert_eq!(public[2], circuit.output_commitments[0]);
    }
}
