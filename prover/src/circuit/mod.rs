//! Circuits
//!
//! Both circuit kinds are R1CS programs over the BN254 scalar field, proven
//! with Groth16. `DvpCircuit` dispatches on the kind so the pipeline can treat
//! them uniformly.

pub mod babyjub;
pub mod deposit;
pub mod poseidon;
pub mod transfer;

use ark_bn254::Fr;
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError,
};

pub use deposit::{DEPOSIT_PUBLIC_INPUTS, DepositCircuit};
pub use transfer::{TRANSFER_PUBLIC_INPUTS, TransferCircuit};

use crate::inputs::{CircuitInputs, CircuitKind};

#[derive(Clone)]
pub enum DvpCircuit {
    Deposit(DepositCircuit),
    Transfer(TransferCircuit),
}

impl DvpCircuit {
    /// All-zero assignment, used for key generation and shape checks
    pub fn blank(kind: CircuitKind) -> Self {
        match kind {
            CircuitKind::Deposit => DvpCircuit::Deposit(DepositCircuit::default()),
            CircuitKind::Transfer => DvpCircuit::Transfer(TransferCircuit::default()),
        }
    }

    pub fn from_inputs(inputs: &CircuitInputs) -> Self {
        match inputs {
            CircuitInputs::Deposit(shape) => DvpCircuit::Deposit(shape.into()),
            CircuitInputs::Transfer(shape) => DvpCircuit::Transfer(shape.into()),
        }
    }

    pub fn kind(&self) -> CircuitKind {
        match self {
            DvpCircuit::Deposit(_) => CircuitKind::Deposit,
            DvpCircuit::Transfer(_) => CircuitKind::Transfer,
        }
    }

    pub fn public_inputs(&self) -> Vec<Fr> {
        match self {
            DvpCircuit::Deposit(c) => c.public_inputs(),
            DvpCircuit::Transfer(c) => c.public_inputs(),
        }
    }
}

impl ConstraintSynthesizer<Fr> for DvpCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        match self {
            DvpCircuit::Deposit(c) => c.generate_constraints(cs),
            DvpCircuit::Transfer(c) => c.generate_constraints(cs),
        }
    }
}

/// Size of a compiled circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitShape {
    pub public_inputs: usize,
    pub constraints: usize,
}

pub fn circuit_shape(kind: CircuitKind) -> Result<CircuitShape, SynthesisError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    DvpCircuit::blank(kind).generate_constraints(cs.clone())?;
    Ok(CircuitShape {
        // instance variables include the constant one
        public_inputs: cs.num_instance_variables() - 1,
        constraints: cs.num_constraints(),
    })
}

/// Constrain `value` to 64 bits by recomposing it from boolean witnesses
pub(crate) fn enforce_u64(value: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let cs = value.cs();
    let low_limb = value.value().ok().map(|v| v.into_bigint().0[0]);

    let mut recomposed = FpVar::zero();
    for i in 0..64 {
        let bit = Boolean::new_witness(cs.clone(), || {
            low_limb
                .map(|limb| (limb >> i) & 1 == 1)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        recomposed += FpVar::from(bit) * Fr::from(1u64 << i);
    }
    recomposed.enforce_equal(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_shapes() {
        let deposit = circuit_shape(CircuitKind::Deposit).unwrap();
        assert_eq!(deposit.public_inputs, DEPOSIT_PUBLIC_INPUTS);

        let transfer = circuit_shape(CircuitKind::Transfer).unwrap();
        assert_eq!(transfer.public_inputs, TRANSFER_PUBLIC_INPUTS);
        assert!(transfer.constraints > deposit.constraints);
    }

    #[test]
    fn test_shape_is_stable() {
        assert_eq!(
            circuit_shape(CircuitKind::Transfer).unwrap(),
            circuit_shape(CircuitKind::Transfer).unwrap()
        );
    }

    #[test]
    fn test_enforce_u64_bounds() {
        for (value, ok) in [
            (Fr::from(0u64), true),
            (Fr::from(u64::MAX), true),
            (Fr::from(u64::MAX) + Fr::from(1u64), false),
            (-Fr::from(1u64), false),
        ] {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let var = FpVar::new_witness(cs.clone(), || Ok(value)).unwrap();
            enforce_u64(&var).unwrap();
            assert_eq!(cs.is_satisfied().unwrap(), ok);
        }
    }
}
