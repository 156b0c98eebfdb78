use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

use crate::inputs::CircuitKind;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("circuit not found: no artifact `{0}` in the artifact store")]
    CircuitNotFound(String),

    #[error("circuit/key mismatch for `{kind}`: {reason}")]
    CircuitKeyMismatch { kind: CircuitKind, reason: String },

    #[error("witness computation failed: {0}")]
    WitnessComputation(String),

    #[error("proving failed: {0}")]
    Proving(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("artifact `{name}` is corrupt: {reason}")]
    ArtifactCorrupt { name: String, reason: String },

    #[error("artifact `{name}` could not be accessed: {source}")]
    ArtifactIo {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid proof encoding: {0}")]
    InvalidProofEncoding(String),
}

impl ProverError {
    pub(crate) fn mismatch(kind: CircuitKind, reason: impl Into<String>) -> Self {
        Self::CircuitKeyMismatch {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::ArtifactCorrupt {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn proving(err: SynthesisError) -> Self {
        Self::Proving(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProverError>;
