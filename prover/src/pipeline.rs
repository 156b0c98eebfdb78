//! Proof Pipeline
//!
//! ```text
//! CircuitInputs ──► load_circuit ──► compute_witness ──► prove ──► encode_proof
//!                        │                                  ▲
//!                        └──► load_proving_material ────────┘
//! ```
//!
//! Circuit manifests and proving material are resolved from the artifact store
//! once per kind and shared read-only afterwards. Witness computation and
//! proving are synchronous and CPU bound; callers on an async runtime should
//! go through the proof service instead.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_serialize::CanonicalDeserialize;
use ark_snark::SNARK;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zkdvp_field::FieldElement;

use crate::artifacts::{ArtifactStore, CircuitManifest, FsArtifactStore, VerificationKeyFile};
use crate::cache::KindCache;
use crate::circuit::{DvpCircuit, circuit_shape};
use crate::encoding::{EncodedProof, decode_proof, encode_proof};
use crate::error::{ProverError, Result};
use crate::inputs::{CircuitInputs, CircuitKind};

/// A circuit whose published manifest matches the compiled constraint system
#[derive(Debug, Clone)]
pub struct CircuitProgram {
    pub kind: CircuitKind,
    pub manifest: CircuitManifest,
}

pub struct ProvingMaterial {
    pub kind: CircuitKind,
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
    prepared_vk: PreparedVerifyingKey<Bn254>,
}

/// A satisfying assignment for one circuit, ready to be proven
pub struct Witness {
    kind: CircuitKind,
    circuit: DvpCircuit,
    public_signals: Vec<FieldElement>,
    num_constraints: usize,
}

impl Witness {
    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn public_signals(&self) -> &[FieldElement] {
        &self.public_signals
    }

    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }
}

// Private wire values never reach logs.
impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("kind", &self.kind)
            .field("public_signals", &self.public_signals)
            .field("num_constraints", &self.num_constraints)
            .finish_non_exhaustive()
    }
}

/// Everything the verifying contract needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOutput {
    pub kind: CircuitKind,
    pub proof: EncodedProof,
    pub public_signals: Vec<FieldElement>,
}

pub struct ProofPipeline {
    store: Arc<dyn ArtifactStore>,
    circuits: KindCache<CircuitProgram>,
    material: KindCache<ProvingMaterial>,
}

impl ProofPipeline {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            circuits: KindCache::new(),
            material: KindCache::new(),
        }
    }

    /// Pipeline over artifacts stored in `root`
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsArtifactStore::new(root)))
    }

    fn fetch_required(&self, name: &str) -> Result<Vec<u8>> {
        self.store
            .fetch(name)?
            .ok_or_else(|| ProverError::CircuitNotFound(name.to_string()))
    }

    pub fn load_circuit(&self, kind: CircuitKind) -> Result<Arc<CircuitProgram>> {
        self.circuits.get_or_try_load(kind, || {
            let name = kind.circuit_artifact();
            let bytes = self.fetch_required(&name)?;
            let manifest: CircuitManifest =
                serde_json::from_slice(&bytes).map_err(|e| ProverError::corrupt(&name, e))?;

            if manifest.kind != kind {
                return Err(ProverError::mismatch(
                    kind,
                    format!("`{name}` describes the `{}` circuit", manifest.kind),
                ));
            }

            let shape = circuit_shape(kind).map_err(ProverError::proving)?;
            if manifest.public_inputs != shape.public_inputs
                || manifest.constraints != shape.constraints
            {
                return Err(ProverError::mismatch(
                    kind,
                    format!(
                        "manifest has {} public inputs and {} constraints, compiled circuit has {} and {}",
                        manifest.public_inputs,
                        manifest.constraints,
                        shape.public_inputs,
                        shape.constraints
                    ),
                ));
            }

            debug!(kind = %kind, constraints = manifest.constraints, "loaded circuit");
            Ok(CircuitProgram { kind, manifest })
        })
    }

    /// Proving and verification keys for `kind`, cross-checked against each
    /// other and against the circuit.
    pub fn load_proving_material(&self, kind: CircuitKind) -> Result<Arc<ProvingMaterial>> {
        let program = self.load_circuit(kind)?;

        self.material.get_or_try_load(kind, || {
            let start = Instant::now();

            let vk_name = kind.verification_key_artifact();
            let vk_file: VerificationKeyFile =
                serde_json::from_slice(&self.fetch_required(&vk_name)?)
                    .map_err(|e| ProverError::corrupt(&vk_name, e))?;
            if vk_file.kind != kind {
                return Err(ProverError::mismatch(
                    kind,
                    format!("`{vk_name}` is published for `{}`", vk_file.kind),
                ));
            }
            let verifying_key = vk_file.verifying_key()?;
            if verifying_key.gamma_abc_g1.len() != program.manifest.public_inputs + 1 {
                return Err(ProverError::mismatch(
                    kind,
                    format!(
                        "verification key expects {} public inputs, circuit has {}",
                        verifying_key.gamma_abc_g1.len().saturating_sub(1),
                        program.manifest.public_inputs
                    ),
                ));
            }

            let pk_name = kind.proving_key_artifact();
            let pk_bytes = self.fetch_required(&pk_name)?;
            let proving_key =
                ProvingKey::<Bn254>::deserialize_compressed_unchecked(pk_bytes.as_slice())
                    .map_err(|e| ProverError::corrupt(&pk_name, e))?;
            if proving_key.vk != verifying_key {
                return Err(ProverError::mismatch(
                    kind,
                    "proving key belongs to a different verification key",
                ));
            }

            let prepared_vk =
                Groth16::<Bn254>::process_vk(&verifying_key).map_err(ProverError::proving)?;

            info!(
                kind = %kind,
                load_ms = start.elapsed().as_millis() as u64,
                "loaded proving material"
            );
            Ok(ProvingMaterial {
                kind,
                proving_key,
                verifying_key,
                prepared_vk,
            })
        })
    }

    /// Assign every wire of `program` from `inputs` and check the assignment
    /// satisfies all constraints.
    pub fn compute_witness(
        &self,
        program: &CircuitProgram,
        inputs: &CircuitInputs,
    ) -> Result<Witness> {
        let kind = program.kind;
        if inputs.kind() != kind {
            return Err(ProverError::WitnessComputation(format!(
                "{} inputs supplied to the {kind} circuit",
                inputs.kind()
            )));
        }

        let start = Instant::now();
        let circuit = DvpCircuit::from_inputs(inputs);
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit
            .clone()
            .generate_constraints(cs.clone())
            .map_err(|e| ProverError::WitnessComputation(e.to_string()))?;

        let satisfied = cs
            .is_satisfied()
            .map_err(|e| ProverError::WitnessComputation(e.to_string()))?;
        if !satisfied {
            warn!(kind = %kind, "inputs do not satisfy the circuit");
            return Err(ProverError::WitnessComputation(format!(
                "inputs violate the {kind} circuit constraints"
            )));
        }

        let public_signals = circuit
            .public_inputs()
            .into_iter()
            .map(FieldElement::from)
            .collect();
        let num_constraints = cs.num_constraints();

        info!(
            kind = %kind,
            constraints = num_constraints,
            witness_ms = start.elapsed().as_millis() as u64,
            "computed witness"
        );
        Ok(Witness {
            kind,
            circuit,
            public_signals,
            num_constraints,
        })
    }

    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        material: &ProvingMaterial,
        witness: Witness,
        rng: &mut R,
    ) -> Result<(Proof<Bn254>, Vec<FieldElement>)> {
        if material.kind != witness.kind {
            return Err(ProverError::mismatch(
                witness.kind,
                format!("proving material is for `{}`", material.kind),
            ));
        }

        let start = Instant::now();
        let proof = Groth16::<Bn254>::prove(&material.proving_key, witness.circuit, rng)
            .map_err(ProverError::proving)?;

        info!(
            kind = %witness.kind,
            proving_ms = start.elapsed().as_millis() as u64,
            "generated groth16 proof"
        );
        Ok((proof, witness.public_signals))
    }

    /// Load, compute the witness, prove and encode
    pub fn run<R: RngCore + CryptoRng>(
        &self,
        inputs: &CircuitInputs,
        rng: &mut R,
    ) -> Result<ProofOutput> {
        let kind = inputs.kind();
        let program = self.load_circuit(kind)?;
        let material = self.load_proving_material(kind)?;

        let witness = self.compute_witness(&program, inputs)?;
        let (proof, public_signals) = self.prove(&material, witness, rng)?;

        Ok(ProofOutput {
            kind,
            proof: encode_proof(&proof),
            public_signals,
        })
    }

    /// Check an encoded proof against the published verification key
    pub fn verify(
        &self,
        kind: CircuitKind,
        proof: &EncodedProof,
        public_signals: &[FieldElement],
    ) -> Result<bool> {
        let material = self.load_proving_material(kind)?;
        if public_signals.len() + 1 != material.verifying_key.gamma_abc_g1.len() {
            return Ok(false);
        }

        let proof = decode_proof(proof.as_bytes())?;
        let inputs: Vec<Fr> = public_signals.iter().map(FieldElement::inner).collect();
        Groth16::<Bn254>::verify_with_processed_vk(&material.prepared_vk, &inputs, &proof)
            .map_err(ProverError::proving)
    }
}
