//! Deposit Circuit
//!
//! Proves a freshly minted commitment opens to the publicly deposited value.
//!
//! ```text
//! Public Inputs:
//!   - value:      deposited amount
//!   - commitment: Poseidon4(value, salt, owner.x, owner.y)
//!
//! Private Witness:
//!   - salt
//!   - owner public key (x, y)
//! ```

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::{enforce_u64, poseidon::poseidon_var};
use crate::inputs::DepositInputs;

pub const DEPOSIT_PUBLIC_INPUTS: usize = 2;

#[derive(Clone, Default)]
pub struct DepositCircuit {
    // --- Public Inputs ---
    pub value: Fr,
    pub commitment: Fr,

    // --- Private Witness ---
    pub salt: Fr,
    pub owner: [Fr; 2],
}

impl DepositCircuit {
    /// Public signals in allocation order
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![self.value, self.commitment]
    }
}

impl From<&DepositInputs> for DepositCircuit {
    fn from(inputs: &DepositInputs) -> Self {
        let [x, y] = inputs.output_owner_public_keys[0];
        Self {
            value: inputs.output_values[0].inner(),
            commitment: inputs.output_commitments[0].inner(),
            salt: inputs.output_salts[0].inner(),
            owner: [x.inner(), y.inner()],
        }
    }
}

impl ConstraintSynthesizer<Fr> for DepositCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // === Allocate Public Inputs ===
        let value = FpVar::new_input(cs.clone(), || Ok(self.value))?;
        let commitment = FpVar::new_input(cs.clone(), || Ok(self.commitment))?;

        // === Allocate Private Witness ===
        let salt = FpVar::new_witness(cs.clone(), || Ok(self.salt))?;
        let owner_x = FpVar::new_witness(cs.clone(), || Ok(self.owner[0]))?;
        let owner_y = FpVar::new_witness(cs.clone(), || Ok(self.owner[1]))?;

        enforce_u64(&value)?;

        let computed = poseidon_var(&[value, salt, owner_x, owner_y])?;
        computed.enforce_equal(&commitment)?;

        Ok(())
    }
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

    use crate::inputs::build_deposit_inputs;

    fn satisfied(circuit: DepositCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    fn deposit(value: u64) -> DepositCircuit {
        let mut rng = StdRng::seed_from_u64(value);
        let owner = ShieldedKeyPair::from_private_key(FieldElement::from(5u64));
        let utxo = Utxo::new(value, owner.public_key(), None, &mut rng);
        DepositCircuit::from(&build_deposit_inputs(&utxo, owner.public_key()).unwrap())
    }

    #[test]
    fn test_valid_deposit_satisfies() {
        assert!(satisfied(deposit(10)));
        assert!(satisfied(deposit(u64::MAX)));
    }

    #[test]
    fn test_wrong_value_unsatisfied() {
        let mut circuit = deposit(10);
        circuit.value = Fr::from(11u64);
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_value_above_u64_unsatisfied() {
        let mut circuit = deposit(10);
        circuit.value = Fr::from(u64::MAX) + Fr::from(1u64);
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_public_inputs_order() {
        let circuit = deposit(10);
        assert_eq!(
            circuit.public_inputs(),
            vec![Fr::from(10u64), circuit.commitment]
        );
    }
}
