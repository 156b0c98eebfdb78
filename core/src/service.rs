//! Async Proof Service
//!
//! Witness computation and proving are CPU bound, so they run on a fixed pool
//! of OS threads outside the tokio runtime. Requests arrive over an mpsc
//! channel and each result goes back on its own oneshot channel.
//!
//! A caller that stops waiting (dropped future or timeout) does not cancel the
//! work: the worker finishes the proof and the result is discarded.
//!
//! A panic inside one job is caught and returned to that caller as
//! `WorkerPanic`; the worker then moves on to the next request.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::{CryptoRng, RngCore};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};
use zkdvp_keypair::Participant;
use zkdvp_privacy::Utxo;
use zkdvp_prover::ProofPipeline;

use crate::deposit::{DepositArtifacts, deposit_proof};
use crate::error::{DvpError, Result};
use crate::transfer::{TransferArtifacts, transfer_proof};

const QUEUE_DEPTH: usize = 32;

enum ProofJob {
    Deposit {
        owner: Participant,
        value: u64,
    },
    Transfer {
        spender: Participant,
        inputs: Vec<Utxo>,
        outputs: Vec<Utxo>,
        output_owners: Vec<Participant>,
    },
}

enum ProofReply {
    Deposit(DepositArtifacts),
    Transfer(TransferArtifacts),
}

struct ProofRequest {
    job: ProofJob,
    reply: oneshot::Sender<Result<ProofReply>>,
}

pub struct ProofService {
    request_tx: mpsc::Sender<ProofRequest>,
    timeout: Option<Duration>,
}

/// One worker per available core
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ProofService {
    /// Start `workers` proving threads over `pipeline`
    pub fn start(pipeline: Arc<ProofPipeline>, workers: usize) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<ProofRequest>(QUEUE_DEPTH);
        let request_rx = Arc::new(Mutex::new(request_rx));

        for id in 0..workers.max(1) {
            let pipeline = Arc::clone(&pipeline);
            let request_rx = Arc::clone(&request_rx);
            let spawned = thread::Builder::new()
                .name(format!("dvp-prover-{id}"))
                .spawn(move || worker_loop(&pipeline, &request_rx));
            if let Err(e) = spawned {
                error!(worker = id, "failed to spawn prover thread: {e}");
            }
        }

        Self {
            request_tx,
            timeout: None,
        }
    }

    /// Give up waiting after `timeout`. The proof itself still runs to completion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn deposit(&self, owner: Participant, value: u64) -> Result<DepositArtifacts> {
        match self.submit(ProofJob::Deposit { owner, value }).await? {
            ProofReply::Deposit(artifacts) => Ok(artifacts),
            ProofReply::Transfer(_) => Err(DvpError::ServiceUnavailable),
        }
    }

    pub async fn transfer(
        &self,
        spender: Participant,
        inputs: Vec<Utxo>,
        outputs: Vec<Utxo>,
        output_owners: Vec<Participant>,
    ) -> Result<TransferArtifacts> {
        let job = ProofJob::Transfer {
            spender,
            inputs,
            outputs,
            output_owners,
        };
        match self.submit(job).await? {
            ProofReply::Transfer(artifacts) => Ok(artifacts),
            ProofReply::Deposit(_) => Err(DvpError::ServiceUnavailable),
        }
    }

    async fn submit(&self, job: ProofJob) -> Result<ProofReply> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.request_tx
            .send(ProofRequest {
                job,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DvpError::ServiceUnavailable)?;

        let reply = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, reply_rx)
                .await
                .map_err(|_| DvpError::Timeout(timeout))?,
            None => reply_rx.await,
        };
        // A dropped sender means every worker is gone.
        reply.map_err(|_| DvpError::ServiceUnavailable)?
    }
}

fn worker_loop(pipeline: &ProofPipeline, request_rx: &Mutex<mpsc::Receiver<ProofRequest>>) {
    let mut rng = rand::thread_rng();
    loop {
        let request = {
            let mut rx = request_rx.lock().unwrap_or_else(|e| e.into_inner());
            rx.blocking_recv()
        };
        let Some(request) = request else {
            debug!("proof service closed, worker exiting");
            return;
        };

        let job = request.job;
        let result = panic::catch_unwind(AssertUnwindSafe(|| run_job(pipeline, job, &mut rng)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "proof job panicked");
                Err(DvpError::WorkerPanic(message))
            });

        if request.reply.send(result).is_err() {
            warn!("caller stopped waiting; proof result discarded");
        }
    }
}

fn run_job<R: RngCore + CryptoRng>(
    pipeline: &ProofPipeline,
    job: ProofJob,
    rng: &mut R,
) -> Result<ProofReply> {
    match job {
        ProofJob::Deposit { owner, value } => {
            deposit_proof(pipeline, &owner, value, rng).map(ProofReply::Deposit)
        }
        ProofJob::Transfer {
            spender,
            inputs,
            outputs,
            output_owners,
        } => transfer_proof(
            pipeline,
            &spender,
            &inputs,
            &outputs,
            &output_owners,
            rng,
        )
        .map(ProofReply::Transfer),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
