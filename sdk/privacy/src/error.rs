use thiserror::Error;
use zkdvp_field::FieldError;

/// Errors raised while building or checking commitments.
///
/// Messages identify what was wrong, never the salt or key involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    #[error(transparent)]
    InvalidFieldElement(#[from] FieldError),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("poseidon has no {0}-ary variant")]
    UnsupportedArity(usize),
}

pub type Result<T> = std::result::Result<T, CommitmentError>;
