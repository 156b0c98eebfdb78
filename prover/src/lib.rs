pub mod artifacts;
pub mod cache;
pub mod circuit;
pub mod encoding;
pub mod error;
pub mod inputs;
pub mod pipeline;

// Re-export key types for external usage
pub use artifacts::{
    ArtifactStore, CircuitManifest, FsArtifactStore, InMemoryArtifactStore, VerificationKeyFile,
    generate_artifacts,
};
pub use encoding::{ENCODED_PROOF_LEN, EncodedProof, decode_proof, encode_proof};
pub use error::{ProverError, Result};
pub use inputs::{
    CircuitInputs, CircuitKind, DepositInputs, TRANSFER_ARITY, TransferInputs,
    build_deposit_inputs, build_transfer_inputs,
};
pub use pipeline::{CircuitProgram, ProofOutput, ProofPipeline, ProvingMaterial, Witness};
