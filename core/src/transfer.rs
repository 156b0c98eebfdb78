//! Transfer Orchestrator
//!
//! Spends up to `TRANSFER_ARITY` UTXOs owned by one spender into up to
//! `TRANSFER_ARITY` new outputs. Every precondition the circuit enforces is
//! checked here first so a bad request fails fast instead of after a
//! witness computation. Inputs are not marked spent; that happens after
//! on-chain confirmation, outside this crate.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zkdvp_field::FieldElement;
use zkdvp_keypair::{Participant, ShieldedPublicKey};
use zkdvp_privacy::{CommitmentError, Utxo, ZERO_UTXO};
use zkdvp_prover::{EncodedProof, ProofPipeline, TRANSFER_ARITY, build_transfer_inputs};

use crate::error::{DvpError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferArtifacts {
    pub input_commitments: Vec<FieldElement>,
    pub output_commitments: Vec<FieldElement>,
    pub encoded_proof: EncodedProof,
    pub public_signals: Vec<FieldElement>,
    /// Spend tags of the real inputs, in slot order
    pub nullifiers: Vec<FieldElement>,
    /// Outputs as supplied, for the persistence layer to hand to their owners
    pub outputs: Vec<Utxo>,
}

pub fn transfer_proof<R: RngCore + CryptoRng>(
    pipeline: &ProofPipeline,
    spender: &Participant,
    inputs: &[Utxo],
    outputs: &[Utxo],
    output_owners: &[Participant],
    rng: &mut R,
) -> Result<TransferArtifacts> {
    check_transfer(spender.public_key(), inputs, outputs, output_owners).inspect_err(|err| {
        warn!(spender = spender.external_address(), error = %err, "transfer rejected");
    })?;

    let owner_keys: Vec<ShieldedPublicKey> =
        output_owners.iter().map(|owner| *owner.public_key()).collect();
    let shape = build_transfer_inputs(spender.keys(), inputs, outputs, &owner_keys)?;
    let input_commitments = shape.input_commitments.to_vec();
    let output_commitments = shape.output_commitments.to_vec();
    let nullifiers = inputs
        .iter()
        .filter(|input| !input.is_padding())
        .map(|input| input.nullifier(spender.keys()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let proof = pipeline.run(&shape.into(), rng)?;

    info!(
        spender = spender.external_address(),
        inputs = inputs.len(),
        outputs = outputs.len(),
        "transfer proof ready"
    );
    Ok(TransferArtifacts {
        input_commitments,
        output_commitments,
        encoded_proof: proof.proof,
        public_signals: proof.public_signals,
        nullifiers,
        outputs: outputs.to_vec(),
    })
}

/// Preconditions of a transfer: slot counts, distinct inputs, value
/// conservation, and that every commitment opens under the key it is
/// claimed for.
pub fn check_transfer(
    spender: &ShieldedPublicKey,
    inputs: &[Utxo],
    outputs: &[Utxo],
    output_owners: &[Participant],
) -> Result<()> {
    if inputs.len() > TRANSFER_ARITY || outputs.len() > TRANSFER_ARITY {
        return Err(DvpError::InvariantViolation(format!(
            "a transfer has {TRANSFER_ARITY} input and {TRANSFER_ARITY} output slots, got {} and {}",
            inputs.len(),
            outputs.len()
        )));
    }
    if outputs.len() != output_owners.len() {
        return Err(DvpError::InvariantViolation(format!(
            "{} outputs but {} output owners",
            outputs.len(),
            output_owners.len()
        )));
    }

    for (slot, input) in inputs.iter().enumerate() {
        let repeated = inputs[..slot]
            .iter()
            .any(|earlier| earlier.commitment == input.commitment);
        if repeated && !input.is_padding() {
            return Err(DvpError::InvariantViolation(format!(
                "input {slot} spends a commitment already spent by an earlier slot"
            )));
        }
    }

    let zero = ZERO_UTXO;
    let zero_key = ShieldedPublicKey::ZERO;
    let mut total_in: u128 = 0;
    let mut total_out: u128 = 0;

    for slot in 0..TRANSFER_ARITY {
        let input = inputs.get(slot).unwrap_or(&zero);
        total_in += u128::from(check_slot(input, spender, &format!("input {slot}"))?);

        let output = outputs.get(slot).unwrap_or(&zero);
        let owner = output_owners
            .get(slot)
            .map(Participant::public_key)
            .unwrap_or(&zero_key);
        total_out += u128::from(check_slot(output, owner, &format!("output {slot}"))?);
    }

    if total_in != total_out {
        return Err(DvpError::InvariantViolation(
            "input values do not sum to output values".into(),
        ));
    }
    Ok(())
}

/// Value carried by one slot, once its commitment is known to open under `owner`
fn check_slot(utxo: &Utxo, owner: &ShieldedPublicKey, slot: &str) -> Result<u64> {
    if utxo.is_non_fungible() {
        return Err(CommitmentError::InvalidValue(format!(
            "{slot} is a token utxo; transfers move values only"
        ))
        .into());
    }
    let value = utxo
        .value
        .ok_or_else(|| CommitmentError::InvalidValue(format!("{slot} has no value")))?;

    if utxo.is_padding() {
        if value != 0 {
            return Err(DvpError::InvariantViolation(format!(
                "{slot} is empty but carries a value"
            )));
        }
        return Ok(0);
    }

    if !utxo.opens_to(owner)? {
        return Err(DvpError::InvariantViolation(format!(
            "{slot} commitment does not open under its owner's key"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use zkdvp_keypair::ShieldedKeyPair;

    fn participant(seed: u64) -> Participant {
        Participant::new(
            format!("addr-{seed}"),
            ShieldedKeyPair::from_private_key(FieldElement::from(seed)),
        )
    }

    fn utxos(values: &[u64], owner: &Participant, rng: &mut StdRng) -> Vec<Utxo> {
        values
            .iter()
            .map(|&v| Utxo::new(v, owner.public_key(), None, rng))
            .collect()
    }

    #[test]
    fn test_balanced_transfer_passes() {
        let mut rng = StdRng::seed_from_u64(1);
        let (alice, bob) = (participant(1), participant(2));
        let inputs = utxos(&[10, 20], &alice, &mut rng);
        let outputs = vec![
            Utxo::new(25, bob.public_key(), None, &mut rng),
            Utxo::new(5, alice.public_key(), None, &mut rng),
        ];

        check_transfer(alice.public_key(), &inputs, &outputs, &[bob, alice.clone()]).unwrap();
    }

    #[test]
    fn test_unbalanced_transfer_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let (alice, bob) = (participant(1), participant(2));
        let inputs = utxos(&[10, 20], &alice, &mut rng);
        let outputs = vec![
            Utxo::new(25, bob.public_key(), None, &mut rng),
            Utxo::new(10, alice.public_key(), None, &mut rng),
        ];

        let err =
            check_transfer(alice.public_key(), &inputs, &outputs, &[bob, alice.clone()])
                .unwrap_err();
        assert_eq!(err.code(), "invariant_violation");
    }

    #[test]
    fn test_tampered_salt_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let (alice, bob) = (participant(1), participant(2));
        let mut inputs = utxos(&[10], &alice, &mut rng);
        inputs[0].salt = Some(FieldElement::from(12345u64));
        let outputs = utxos(&[10], &bob, &mut rng);

        let err = check_transfer(alice.public_key(), &inputs, &outputs, &[bob]).unwrap_err();
        assert!(matches!(err, DvpError::InvariantViolation(ref msg) if msg.starts_with("input 0")));
        assert!(!err.to_string().contains("12345"));
    }

    #[test]
    fn test_foreign_input_is_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let (alice, bob) = (participant(1), participant(2));
        let inputs = utxos(&[10], &bob, &mut rng);
        let outputs = utxos(&[10], &bob, &mut rng);

        assert!(matches!(
            check_transfer(alice.public_key(), &inputs, &outputs, &[bob]),
            Err(DvpError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_output_for_the_wrong_owner_is_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let (alice, bob) = (participant(1), participant(2));
        let inputs = utxos(&[10], &alice, &mut rng);
        let outputs = utxos(&[10], &bob, &mut rng);

        let err = check_transfer(alice.public_key(), &inputs, &outputs, &[alice.clone()])
            .unwrap_err();
        assert!(matches!(err, DvpError::InvariantViolation(ref msg) if msg.starts_with("output 0")));
    }

    #[test]
    fn test_duplicate_input_is_rejected() {
        let mut rng = StdRng::seed_from_u64(11);
        let (alice, bob) = (participant(1), participant(2));
        let input = Utxo::new(10, alice.public_key(), None, &mut rng);
        let outputs = utxos(&[20], &bob, &mut rng);

        let err = check_transfer(
            alice.public_key(),
            &[input.clone(), input],
            &outputs,
            &[bob],
        )
        .unwrap_err();
        assert!(matches!(err, DvpError::InvariantViolation(ref msg) if msg.starts_with("input 1")));
    }

    #[test]
    fn test_padding_slots_may_repeat() {
        let mut rng = StdRng::seed_from_u64(12);
        let alice = participant(1);
        let outputs = utxos(&[0], &alice, &mut rng);

        check_transfer(
            alice.public_key(),
            &[Utxo::zero(), Utxo::zero()],
            &outputs,
            &[alice.clone()],
        )
        .unwrap();
    }

    #[test]
    fn test_slot_counts_are_checked() {
        let mut rng = StdRng::seed_from_u64(6);
        let alice = participant(1);
        let inputs = utxos(&[1, 1, 1], &alice, &mut rng);
        let outputs = utxos(&[3], &alice, &mut rng);

        assert!(matches!(
            check_transfer(alice.public_key(), &inputs, &outputs, &[alice.clone()]),
            Err(DvpError::InvariantViolation(_))
        ));
        assert!(matches!(
            check_transfer(alice.public_key(), &inputs[..1], &outputs[..0], &[alice.clone()]),
            Err(DvpError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_value_in_padding_slot_is_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let alice = participant(1);
        let mut padding = Utxo::zero();
        padding.value = Some(5);
        let inputs = vec![Utxo::new(5, alice.public_key(), None, &mut rng), padding];
        let outputs = utxos(&[10], &alice, &mut rng);

        assert!(matches!(
            check_transfer(alice.public_key(), &inputs, &outputs, &[alice.clone()]),
            Err(DvpError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_missing_opening_is_an_invalid_value() {
        let mut rng = StdRng::seed_from_u64(8);
        let alice = participant(1);
        let mut inputs = utxos(&[10], &alice, &mut rng);
        inputs[0].salt = None;
        let outputs = utxos(&[10], &alice, &mut rng);

        let err = check_transfer(alice.public_key(), &inputs, &outputs, &[alice.clone()])
            .unwrap_err();
        assert_eq!(err.code(), "invalid_value");
    }

    #[test]
    fn test_unbalanced_transfer_never_reaches_the_pipeline() {
        // An empty artifact store would answer `circuit_not_found`.
        let pipeline = ProofPipeline::new(std::sync::Arc::new(
            zkdvp_prover::InMemoryArtifactStore::new(),
        ));
        let mut rng = StdRng::seed_from_u64(9);
        let (alice, bob) = (participant(1), participant(2));
        let inputs = utxos(&[10, 20], &alice, &mut rng);
        let outputs = vec![
            Utxo::new(25, bob.public_key(), None, &mut rng),
            Utxo::new(10, alice.public_key(), None, &mut rng),
        ];

        let err = transfer_proof(
            &pipeline,
            &alice,
            &inputs,
            &outputs,
            &[bob, alice.clone()],
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err.code(), "invariant_violation");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_conservation_is_enforced(
            ins in proptest::collection::vec(0u64..1_000, 1..=2),
            outs in proptest::collection::vec(0u64..1_000, 1..=2),
        ) {
            let mut rng = StdRng::seed_from_u64(10);
            let alice = participant(1);
            let inputs = utxos(&ins, &alice, &mut rng);
            let outputs = utxos(&outs, &alice, &mut rng);
            let owners = vec![alice.clone(); outputs.len()];

            let balanced = ins.iter().sum::<u64>() == outs.iter().sum::<u64>();
            let result = check_transfer(alice.public_key(), &inputs, &outputs, &owners);
            prop_assert_eq!(result.is_ok(), balanced);
        }
    }
}
