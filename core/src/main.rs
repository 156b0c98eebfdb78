//! Deposit-then-transfer walkthrough against the configured artifacts.
//!
//! Usage:
//!   zkdvp [VALUE]
//!
//! Mints VALUE (default 10) for a fresh participant, then transfers it to a
//! second participant and prints both proof payloads as JSON. Run `keygen`
//! first to populate the artifact directory.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::OsRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zkdvp_config::DvpConfig;
use zkdvp_core::{ProofService, default_workers};
use zkdvp_keypair::{LocalSigner, derive_identity};
use zkdvp_privacy::{Utxo, parse_value};
use zkdvp_prover::ProofPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let config = DvpConfig::global();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    let value = match std::env::args().nth(1) {
        Some(arg) => parse_value(&arg).context("VALUE must be a non-negative integer")?,
        None => 10,
    };

    let workers = config.prover.workers.unwrap_or_else(default_workers);
    info!(
        root = %config.artifacts.root.display(),
        workers,
        "starting proof service"
    );
    let pipeline = Arc::new(ProofPipeline::from_dir(&config.artifacts.root));
    let mut service = ProofService::start(pipeline, workers);
    if let Some(timeout) = config.prover.proof_timeout() {
        service = service.with_timeout(timeout);
    }

    let alice = derive_identity(&LocalSigner::new_random(&mut OsRng), &mut OsRng)?;
    let bob = derive_identity(&LocalSigner::new_random(&mut OsRng), &mut OsRng)?;

    let start = Instant::now();
    let deposit = service
        .deposit(alice.clone(), value)
        .await
        .context("deposit proof failed")?;
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "deposit proven"
    );

    let payment = Utxo::new(value, bob.public_key(), None, &mut OsRng);
    let start = Instant::now();
    let transfer = service
        .transfer(
            alice.clone(),
            vec![deposit.output.clone()],
            vec![payment.clone()],
            vec![bob.clone()],
        )
        .await
        .context("transfer proof failed")?;
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "transfer proven"
    );

    anyhow::ensure!(
        payment.opens_to(bob.public_key())?,
        "recipient cannot open the transferred commitment"
    );

    let report = serde_json::json!({
        "sender": alice.external_address(),
        "recipient": bob.external_address(),
        "deposit": {
            "outputCommitment": deposit.output_commitment,
            "encodedProof": deposit.encoded_proof,
            "publicSignals": deposit.public_signals,
        },
        "transfer": {
            "inputCommitments": transfer.input_commitments,
            "outputCommitments": transfer.output_commitments,
            "nullifiers": transfer.nullifiers,
            "encodedProof": transfer.encoded_proof,
        },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
