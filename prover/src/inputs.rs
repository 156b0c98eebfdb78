//! Circuit input shapes
//!
//! One strongly typed shape per circuit kind, named after the circuit ABI:
//!
//! ```text
//! deposit:  outputCommitments[1], outputValues[1], outputSalts[1],
//!           outputOwnerPublicKeys[1][2]
//! transfer: inputCommitments[N], inputValues[N], inputSalts[N],
//!           outputCommitments[N], outputValues[N], outputSalts[N],
//!           outputOwnerPublicKeys[N][2], inputOwnerPrivateKey
//! ```
//!
//! Unused transfer slots hold the zero-UTXO and the zero public key. Builders
//! only read the UTXOs they are given.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zkdvp_field::FieldElement;
use zkdvp_keypair::{ShieldedKeyPair, ShieldedPublicKey};
use zkdvp_privacy::{Utxo, ZERO_UTXO};

use crate::error::{ProverError, Result};

/// Input/output slots of the transfer circuit
pub const TRANSFER_ARITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitKind {
    Deposit,
    Transfer,
}

impl CircuitKind {
    pub const ALL: [CircuitKind; 2] = [CircuitKind::Deposit, CircuitKind::Transfer];

    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitKind::Deposit => "deposit",
            CircuitKind::Transfer => "transfer",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            CircuitKind::Deposit => 0,
            CircuitKind::Transfer => 1,
        }
    }

    pub fn circuit_artifact(&self) -> String {
        format!("{}.circuit", self.as_str())
    }

    pub fn proving_key_artifact(&self) -> String {
        format!("{}.provingkey", self.as_str())
    }

    pub fn verification_key_artifact(&self) -> String {
        format!("{}-vkey.json", self.as_str())
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Also accepts the names the circom deployment published its circuits under.
impl FromStr for CircuitKind {
    type Err = ProverError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deposit" | "check_hashes_value" => Ok(CircuitKind::Deposit),
            "transfer" | "anon" => Ok(CircuitKind::Transfer),
            other => Err(ProverError::CircuitNotFound(other.to_string())),
        }
    }
}

/// Mint shape: a single output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositInputs {
    pub output_commitments: [FieldElement; 1],
    pub output_values: [FieldElement; 1],
    pub output_salts: [FieldElement; 1],
    pub output_owner_public_keys: [[FieldElement; 2]; 1],
}

/// Transfer shape: `TRANSFER_ARITY` inputs spent by one owner, `TRANSFER_ARITY` outputs
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInputs {
    pub input_commitments: [FieldElement; TRANSFER_ARITY],
    pub input_values: [FieldElement; TRANSFER_ARITY],
    pub input_salts: [FieldElement; TRANSFER_ARITY],
    pub output_commitments: [FieldElement; TRANSFER_ARITY],
    pub output_values: [FieldElement; TRANSFER_ARITY],
    pub output_salts: [FieldElement; TRANSFER_ARITY],
    pub output_owner_public_keys: [[FieldElement; 2]; TRANSFER_ARITY],
    pub input_owner_private_key: FieldElement,
}

// Salts and keys stay out of logs and error payloads.
impl fmt::Debug for DepositInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepositInputs")
            .field("output_commitments", &self.output_commitments)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for TransferInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferInputs")
            .field("input_commitments", &self.input_commitments)
            .field("output_commitments", &self.output_commitments)
            .finish_non_exhaustive()
    }
}

/// Inputs for exactly one circuit kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CircuitInputs {
    Deposit(DepositInputs),
    Transfer(TransferInputs),
}

impl CircuitInputs {
    pub fn kind(&self) -> CircuitKind {
        match self {
            CircuitInputs::Deposit(_) => CircuitKind::Deposit,
            CircuitInputs::Transfer(_) => CircuitKind::Transfer,
        }
    }
}

impl From<DepositInputs> for CircuitInputs {
    fn from(inputs: DepositInputs) -> Self {
        CircuitInputs::Deposit(inputs)
    }
}

impl From<TransferInputs> for CircuitInputs {
    fn from(inputs: TransferInputs) -> Self {
        CircuitInputs::Transfer(inputs)
    }
}

/// Value and salt of a value-bearing UTXO, as field elements
fn opening(utxo: &Utxo, slot: &str) -> Result<(FieldElement, FieldElement)> {
    if utxo.is_non_fungible() {
        return Err(ProverError::InvalidValue(format!(
            "{slot}: token utxos are not accepted by value circuits"
        )));
    }
    let value = utxo
        .value
        .ok_or_else(|| ProverError::InvalidValue(format!("{slot}: missing value")))?;
    let salt = utxo
        .salt
        .ok_or_else(|| ProverError::InvalidValue(format!("{slot}: missing salt")))?;
    Ok((FieldElement::from(value), salt))
}

pub fn build_deposit_inputs(output: &Utxo, owner: &ShieldedPublicKey) -> Result<DepositInputs> {
    let (value, salt) = opening(output, "output 0")?;
    Ok(DepositInputs {
        output_commitments: [output.commitment],
        output_values: [value],
        output_salts: [salt],
        output_owner_public_keys: [owner.coordinates()],
    })
}

/// Assemble the transfer shape, padding short lists up to `TRANSFER_ARITY`
pub fn build_transfer_inputs(
    spender: &ShieldedKeyPair,
    inputs: &[Utxo],
    outputs: &[Utxo],
    output_owners: &[ShieldedPublicKey],
) -> Result<TransferInputs> {
    if inputs.len() > TRANSFER_ARITY || outputs.len() > TRANSFER_ARITY {
        return Err(ProverError::InvalidValue(format!(
            "transfer takes at most {TRANSFER_ARITY} inputs and outputs, got {} and {}",
            inputs.len(),
            outputs.len()
        )));
    }
    if outputs.len() != output_owners.len() {
        return Err(ProverError::InvalidValue(format!(
            "{} outputs but {} output owners",
            outputs.len(),
            output_owners.len()
        )));
    }

    let mut shape = TransferInputs {
        input_commitments: [FieldElement::ZERO; TRANSFER_ARITY],
        input_values: [FieldElement::ZERO; TRANSFER_ARITY],
        input_salts: [FieldElement::ZERO; TRANSFER_ARITY],
        output_commitments: [FieldElement::ZERO; TRANSFER_ARITY],
        output_values: [FieldElement::ZERO; TRANSFER_ARITY],
        output_salts: [FieldElement::ZERO; TRANSFER_ARITY],
        output_owner_public_keys: [ShieldedPublicKey::ZERO.coordinates(); TRANSFER_ARITY],
        input_owner_private_key: *spender.formatted_private_key(),
    };

    let zero = ZERO_UTXO;
    let zero_key = ShieldedPublicKey::ZERO;
    for slot in 0..TRANSFER_ARITY {
        let input = inputs.get(slot).unwrap_or(&zero);
        let (value, salt) = opening(input, &format!("input {slot}"))?;
        shape.input_commitments[slot] = input.commitment;
        shape.input_values[slot] = value;
        shape.input_salts[slot] = salt;

        let output = outputs.get(slot).unwrap_or(&zero);
        let owner = output_owners.get(slot).unwrap_or(&zero_key);
        let (value, salt) = opening(output, &format!("output {slot}"))?;
        shape.output_commitments[slot] = output.commitment;
        shape.output_values[slot] = value;
        shape.output_salts[slot] = salt;
        shape.output_owner_public_keys[slot] = owner.coordinates();
    }

    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn keys(seed: u64) -> ShieldedKeyPair {
        ShieldedKeyPair::from_private_key(FieldElement::from(seed))
    }

    #[test]
    fn test_kind_artifact_names() {
        assert_eq!(CircuitKind::Deposit.circuit_artifact(), "deposit.circuit");
        assert_eq!(
            CircuitKind::Transfer.proving_key_artifact(),
            "transfer.provingkey"
        );
        assert_eq!(
            CircuitKind::Transfer.verification_key_artifact(),
            "transfer-vkey.json"
        );
        assert_eq!("deposit".parse::<CircuitKind>().unwrap(), CircuitKind::Deposit);
        assert!(matches!(
            "withdraw".parse::<CircuitKind>(),
            Err(ProverError::CircuitNotFound(_))
        ));
    }

    #[test]
    fn test_circom_circuit_names() {
        assert_eq!(
            "check_hashes_value".parse::<CircuitKind>().unwrap(),
            CircuitKind::Deposit
        );
        assert_eq!("anon".parse::<CircuitKind>().unwrap(), CircuitKind::Transfer);
        // Artifacts are always written under the canonical name.
        assert_eq!(
            "anon".parse::<CircuitKind>().unwrap().circuit_artifact(),
            "transfer.circuit"
        );
    }

    #[test]
    fn test_deposit_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let alice = keys(1);
        let utxo = Utxo::new(10, alice.public_key(), None, &mut rng);

        let shape = build_deposit_inputs(&utxo, alice.public_key()).unwrap();
        assert_eq!(shape.output_commitments, [utxo.commitment]);
        assert_eq!(shape.output_values, [FieldElement::from(10u64)]);
        assert_eq!(shape.output_salts, [utxo.salt.unwrap()]);
        assert_eq!(
            shape.output_owner_public_keys,
            [alice.public_key().coordinates()]
        );
    }

    #[test]
    fn test_transfer_pads_missing_slots() {
        let mut rng = StdRng::seed_from_u64(2);
        let alice = keys(1);
        let bob = keys(2);
        let input = Utxo::new(10, alice.public_key(), None, &mut rng);
        let output = Utxo::new(10, bob.public_key(), None, &mut rng);

        let shape =
            build_transfer_inputs(&alice, &[input.clone()], &[output.clone()], &[*bob.public_key()])
                .unwrap();

        assert_eq!(shape.input_commitments, [input.commitment, FieldElement::ZERO]);
        assert_eq!(shape.input_values[1], FieldElement::ZERO);
        assert_eq!(shape.input_salts[1], FieldElement::ZERO);
        assert_eq!(shape.output_commitments, [output.commitment, FieldElement::ZERO]);
        assert_eq!(
            shape.output_owner_public_keys[1],
            [FieldElement::ZERO, FieldElement::ZERO]
        );
        assert_eq!(shape.input_owner_private_key, *alice.formatted_private_key());
    }

    #[test]
    fn test_transfer_rejects_missing_opening() {
        let alice = keys(1);
        let foreign = Utxo {
            value: None,
            token_id: None,
            uri: None,
            commitment: FieldElement::from(9u64),
            salt: None,
        };
        let err = build_transfer_inputs(&alice, &[foreign], &[], &[]).unwrap_err();
        assert!(matches!(err, ProverError::InvalidValue(ref msg) if msg.contains("input 0")));
    }

    #[test]
    fn test_transfer_rejects_too_many_slots() {
        let alice = keys(1);
        let zeros = vec![Utxo::zero(); 3];
        assert!(matches!(
            build_transfer_inputs(&alice, &zeros, &[], &[]),
            Err(ProverError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_inputs_json_uses_abi_names() {
        let alice = keys(1);
        let shape = build_transfer_inputs(&alice, &[], &[], &[]).unwrap();
        let json = serde_json::to_value(CircuitInputs::from(shape)).unwrap();

        assert_eq!(json["kind"], "transfer");
        assert_eq!(json["inputCommitments"], serde_json::json!(["0", "0"]));
        assert!(json["inputOwnerPrivateKey"].is_string());
        assert_eq!(
            json["outputOwnerPublicKeys"],
            serde_json::json!([["0", "0"], ["0", "0"]])
        );
    }

    #[test]
    fn test_debug_hides_salts_and_keys() {
        let mut rng = StdRng::seed_from_u64(3);
        let alice = keys(1);
        let input = Utxo::new(10, alice.public_key(), None, &mut rng);
        let shape = build_transfer_inputs(&alice, &[input.clone()], &[], &[]).unwrap();

        let debug = format!("{shape:?}");
        assert!(!debug.contains(&input.salt.unwrap().to_string()));
        assert!(!debug.contains(&alice.formatted_private_key().to_string()));
    }
}
