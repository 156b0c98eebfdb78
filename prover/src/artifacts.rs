//! Artifact store
//!
//! Each circuit kind publishes three artifacts under one namespace:
//!
//! ```text
//! <kind>.circuit      JSON manifest describing the compiled circuit
//! <kind>.provingkey   compressed Groth16 proving key
//! <kind>-vkey.json    JSON wrapper around the compressed verification key
//! ```
//!
//! Stores treat contents as opaque bytes; parsing and cross-checks live in the
//! pipeline.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::circuit::{DvpCircuit, circuit_shape};
use crate::error::{ProverError, Result};
use crate::inputs::{CircuitKind, TRANSFER_ARITY};

pub trait ArtifactStore: Send + Sync {
    /// Fetch an artifact by name; `Ok(None)` when it does not exist
    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>>;

    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<()>;
}

/// Artifacts stored as files in one directory
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.root.join(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProverError::ArtifactIo {
                name: name.to_string(),
                source,
            }),
        }
    }

    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let io_err = |source| ProverError::ArtifactIo {
            name: name.to_string(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(io_err)?;
        fs::write(self.root.join(name), bytes).map_err(io_err)
    }
}

/// Artifacts held in memory, for tests and embedded setups
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.artifacts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .artifacts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned())
    }

    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        self.artifacts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), bytes);
        Ok(())
    }
}

/// Contents of `<kind>.circuit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitManifest {
    pub kind: CircuitKind,
    /// Input/output slots (1 for deposit)
    pub arity: usize,
    pub public_inputs: usize,
    pub constraints: usize,
}

/// Contents of `<kind>-vkey.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationKeyFile {
    pub kind: CircuitKind,
    pub protocol: String,
    pub curve: String,
    pub n_public: usize,
    /// Hex of the compressed arkworks verification key
    pub key: String,
}

impl VerificationKeyFile {
    pub fn new(kind: CircuitKind, vk: &VerifyingKey<Bn254>) -> Result<Self> {
        let mut bytes = Vec::new();
        vk.serialize_compressed(&mut bytes)
            .map_err(|e| ProverError::corrupt(kind.verification_key_artifact(), e))?;
        Ok(Self {
            kind,
            protocol: "groth16".to_string(),
            curve: "bn128".to_string(),
            n_public: vk.gamma_abc_g1.len().saturating_sub(1),
            key: hex::encode(bytes),
        })
    }

    pub fn verifying_key(&self) -> Result<VerifyingKey<Bn254>> {
        let name = self.kind.verification_key_artifact();
        let bytes = hex::decode(&self.key).map_err(|e| ProverError::corrupt(&name, e))?;
        VerifyingKey::<Bn254>::deserialize_compressed(bytes.as_slice())
            .map_err(|e| ProverError::corrupt(&name, e))
    }
}

/// Run a dev-only circuit-specific setup for `kind` and publish its artifacts.
///
/// Not a trusted setup ceremony: whoever holds `rng` can forge proofs.
pub fn generate_artifacts<R: RngCore + CryptoRng>(
    store: &dyn ArtifactStore,
    kind: CircuitKind,
    rng: &mut R,
) -> Result<CircuitManifest> {
    let start = std::time::Instant::now();
    let shape = circuit_shape(kind).map_err(ProverError::proving)?;

    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(DvpCircuit::blank(kind), rng)
        .map_err(ProverError::proving)?;

    let manifest = CircuitManifest {
        kind,
        arity: match kind {
            CircuitKind::Deposit => 1,
            CircuitKind::Transfer => TRANSFER_ARITY,
        },
        public_inputs: shape.public_inputs,
        constraints: shape.constraints,
    };
    let vkey = VerificationKeyFile::new(kind, &vk)?;

    let mut pk_bytes = Vec::new();
    pk.serialize_compressed(&mut pk_bytes)
        .map_err(|e| ProverError::corrupt(kind.proving_key_artifact(), e))?;

    store.put(&kind.circuit_artifact(), to_json(&manifest, kind.circuit_artifact())?)?;
    store.put(&kind.proving_key_artifact(), pk_bytes)?;
    store.put(
        &kind.verification_key_artifact(),
        to_json(&vkey, kind.verification_key_artifact())?,
    )?;

    info!(
        kind = %kind,
        constraints = manifest.constraints,
        setup_ms = start.elapsed().as_millis() as u64,
        "generated circuit artifacts"
    );
    Ok(manifest)
}

fn to_json<T: Serialize>(value: &T, name: String) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| ProverError::corrupt(name, e))
}
