//! Deposit Orchestrator
//!
//! Mints one shielded output for `owner` and proves that its commitment opens
//! to the public deposit value. The caller persists the returned UTXO and
//! submits the proof on-chain.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;
use zkdvp_field::FieldElement;
use zkdvp_keypair::Participant;
use zkdvp_privacy::Utxo;
use zkdvp_prover::{EncodedProof, ProofPipeline, build_deposit_inputs};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositArtifacts {
    pub output_commitment: FieldElement,
    pub encoded_proof: EncodedProof,
    /// `[value, outputCommitment]`
    pub public_signals: Vec<FieldElement>,
    /// The freshly minted output, salt included
    pub output: Utxo,
}

pub fn deposit_proof<R: RngCore + CryptoRng>(
    pipeline: &ProofPipeline,
    owner: &Participant,
    value: u64,
    rng: &mut R,
) -> Result<DepositArtifacts> {
    let output = Utxo::new(value, owner.public_key(), None, rng);
    let inputs = build_deposit_inputs(&output, owner.public_key())?;

    let proof = pipeline.run(&inputs.into(), rng)?;

    info!(owner = owner.external_address(), "deposit proof ready");
    Ok(DepositArtifacts {
        output_commitment: output.commitment,
        encoded_proof: proof.proof,
        public_signals: proof.public_signals,
        output,
    })
}
