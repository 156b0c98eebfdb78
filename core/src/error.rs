use std::time::Duration;

use thiserror::Error;
use zkdvp_field::FieldError;
use zkdvp_keypair::IdentityError;
use zkdvp_privacy::CommitmentError;
use zkdvp_prover::ProverError;

/// Every failure a deposit or transfer request can surface. None of them are
/// transient, so nothing here is retried.
#[derive(Debug, Error)]
pub enum DvpError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    #[error(transparent)]
    Prover(#[from] ProverError),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("proof service unavailable")]
    ServiceUnavailable,

    #[error("proof request timed out after {0:?}")]
    Timeout(Duration),

    #[error("prover worker panicked: {0}")]
    WorkerPanic(String),
}

pub type Result<T> = std::result::Result<T, DvpError>;

impl DvpError {
    /// Stable identifier for the HTTP layer to map onto a status
    pub fn code(&self) -> &'static str {
        match self {
            DvpError::Field(_) => "invalid_field_element",
            DvpError::Identity(_) => "signer_unavailable",
            DvpError::Commitment(err) => match err {
                CommitmentError::InvalidFieldElement(_) => "invalid_field_element",
                CommitmentError::InvalidValue(_) => "invalid_value",
                CommitmentError::UnsupportedArity(_) => "unsupported_arity",
            },
            DvpError::Prover(err) => match err {
                ProverError::CircuitNotFound(_) => "circuit_not_found",
                ProverError::CircuitKeyMismatch { .. } => "circuit_key_mismatch",
                ProverError::WitnessComputation(_) => "witness_computation_error",
                ProverError::Proving(_) => "proving_error",
                ProverError::InvalidValue(_) => "invalid_value",
                ProverError::ArtifactCorrupt { .. } | ProverError::ArtifactIo { .. } => {
                    "artifact_unavailable"
                }
                ProverError::InvalidProofEncoding(_) => "invalid_proof_encoding",
            },
            DvpError::InvariantViolation(_) => "invariant_violation",
            DvpError::ServiceUnavailable => "service_unavailable",
            DvpError::Timeout(_) => "timeout",
            DvpError::WorkerPanic(_) => "worker_panic",
        }
    }
}
