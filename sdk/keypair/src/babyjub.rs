//! Baby Jubjub
//!
//! Twisted Edwards curve whose base field is the BN254 scalar field, so its
//! points can be manipulated cheaply inside a BN254 circuit.
//!
//! ```text
//! a·x² + y² = 1 + d·x²·y²      a = 168700, d = 168696
//! ```
//!
//! Shielded public keys are `k · BASE8` where `BASE8` generates the prime-order
//! subgroup. The addition law is complete (`d` is a non-square), so there are
//! no exceptional cases to handle.

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, BigInteger, Field, MontFp, PrimeField};

pub const COEFF_A: Fr = MontFp!("168700");
pub const COEFF_D: Fr = MontFp!("168696");

/// Order of the prime subgroup generated by `BASE8`
pub const SUBGROUP_ORDER: Fr =
    MontFp!("2736030358979909402780800718157159386076813972158567259200215660948447373041");

/// Generator of the prime-order subgroup (8 × the curve generator)
pub const BASE8: Point = Point {
    x: MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553"),
    y: MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203"),
};

/// Affine point on Baby Jubjub
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: Fr,
    pub y: Fr,
}

impl Point {
    pub const IDENTITY: Self = Self {
        x: Fr::ZERO,
        y: Fr::ONE,
    };

    pub fn is_on_curve(&self) -> bool {
        let xx = self.x.square();
        let yy = self.y.square();
        COEFF_A * xx + yy == Fr::ONE + COEFF_D * xx * yy
    }

    /// Edwards addition
    pub fn add(&self, other: &Self) -> Self {
        let x1x2 = self.x * other.x;
        let y1y2 = self.y * other.y;
        let dxxyy = COEFF_D * x1x2 * y1y2;

        // Denominators are never zero for points on the curve.
        let inv_x = (Fr::ONE + dxxyy).inverse().unwrap_or(Fr::ZERO);
        let inv_y = (Fr::ONE - dxxyy).inverse().unwrap_or(Fr::ZERO);

        Self {
            x: (self.x * other.y + self.y * other.x) * inv_x,
            y: (y1y2 - COEFF_A * x1x2) * inv_y,
        }
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// Scalar multiplication by the integer value of `scalar`
    pub fn mul(&self, scalar: &Fr) -> Self {
        let bits = scalar.into_bigint().to_bits_be();
        bits.iter().fold(Self::IDENTITY, |acc, bit| {
            let doubled = acc.double();
            if *bit { doubled.add(self) } else { doubled }
        })
    }

    /// `[P, 2P, 4P, ..., 2^(n-1) P]`, the lookup table for fixed-base multiplication
    pub fn doublings(&self, n: usize) -> Vec<Self> {
        let mut out = Vec::with_capacity(n);
        let mut current = *self;
        for _ in 0..n {
            out.push(current);
            current = current.double();
        }
        out
    }
}
