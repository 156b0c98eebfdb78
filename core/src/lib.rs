pub mod deposit;
pub mod error;
pub mod service;
pub mod transfer;

pub use deposit::{DepositArtifacts, deposit_proof};
pub use error::{DvpError, Result};
pub use service::{ProofService, default_workers};
pub use transfer::{TransferArtifacts, check_transfer, transfer_proof};
