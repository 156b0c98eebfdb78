//! Baby Jubjub gadgets
//!
//! Only fixed-base multiplication by `BASE8` is needed: the transfer circuit
//! proves the spender's public key is `key · BASE8`. The scalar is decomposed
//! into canonical bits and the precomputed powers `2^i · BASE8` are added in
//! where the bit is set.

use std::sync::LazyLock;

use ark_bn254::Fr;
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*, select::CondSelectGadget};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use zkdvp_keypair::babyjub::{BASE8, COEFF_A, COEFF_D, Point};

static BASE8_POWERS: LazyLock<Vec<Point>> =
    LazyLock::new(|| BASE8.doublings(Fr::MODULUS_BIT_SIZE as usize));

#[derive(Clone)]
pub struct PointVar {
    pub x: FpVar<Fr>,
    pub y: FpVar<Fr>,
}

impl PointVar {
    pub fn constant(point: Point) -> Self {
        Self {
            x: FpVar::constant(point.x),
            y: FpVar::constant(point.y),
        }
    }

    /// Allocate affine coordinates as private witnesses. No curve check.
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, coords: [Fr; 2]) -> Result<Self, SynthesisError> {
        Ok(Self {
            x: FpVar::new_witness(cs.clone(), || Ok(coords[0]))?,
            y: FpVar::new_witness(cs, || Ok(coords[1]))?,
        })
    }

    /// Edwards addition with a point known at synthesis time
    fn add_constant(&self, other: &Point) -> Result<Self, SynthesisError> {
        let xy = &self.x * &self.y;
        let dxxyy = xy * (COEFF_D * other.x * other.y);

        let x_num = &self.x * other.y + &self.y * other.x;
        let y_num = &self.y * other.y - &self.x * (COEFF_A * other.x);

        // Complete addition law: both denominators are non-zero on the curve.
        let x = x_num.mul_by_inverse(&(FpVar::one() + &dxxyy))?;
        let y = y_num.mul_by_inverse(&(FpVar::one() - &dxxyy))?;
        Ok(Self { x, y })
    }

    pub fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        self.x.enforce_equal(&other.x)?;
        self.y.enforce_equal(&other.y)
    }
}

/// `scalar · BASE8`
pub fn fixed_base_mul(scalar: &FpVar<Fr>) -> Result<PointVar, SynthesisError> {
    let bits = scalar.to_bits_le()?;

    let mut acc = PointVar::constant(Point::IDENTITY);
    for (bit, power) in bits.iter().zip(BASE8_POWERS.iter()) {
        let added = acc.add_constant(power)?;
        acc = PointVar {
            x: FpVar::conditionally_select(bit, &added.x, &acc.x)?,
            y: FpVar::conditionally_select(bit, &added.y, &acc.y)?,
        };
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use zkdvp_field::FieldElement;
    use zkdvp_keypair::ShieldedKeyPair;

    #[test]
    fn test_fixed_base_mul_matches_native_key() {
        let keys = ShieldedKeyPair::from_private_key(FieldElement::from(424_242u64));
        let cs = ConstraintSystem::<Fr>::new_ref();

        let scalar =
            FpVar::new_witness(cs.clone(), || Ok(keys.formatted_private_key().inner())).unwrap();
        let point = fixed_base_mul(&scalar).unwrap();

        assert_eq!(point.x.value().unwrap(), keys.public_key().x.inner());
        assert_eq!(point.y.value().unwrap(), keys.public_key().y.inner());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_wrong_public_key_unsatisfied() {
        let alice = ShieldedKeyPair::from_private_key(FieldElement::from(1u64));
        let bob = ShieldedKeyPair::from_private_key(FieldElement::from(2u64));
        let cs = ConstraintSystem::<Fr>::new_ref();

        let scalar =
            FpVar::new_witness(cs.clone(), || Ok(alice.formatted_private_key().inner())).unwrap();
        let derived = fixed_base_mul(&scalar).unwrap();
        let claimed = PointVar::new_witness(
            cs.clone(),
            [bob.public_key().x.inner(), bob.public_key().y.inner()],
        )
        .unwrap();
        derived.enforce_equal(&claimed).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }
}
