//! Key Generation CLI for the deposit and transfer circuits
//!
//! Runs a circuit-specific Groth16 setup per circuit kind and writes the three
//! artifacts the proof pipeline loads:
//!
//!   <kind>.circuit, <kind>.provingkey, <kind>-vkey.json
//!
//! Usage:
//!   cargo run --package zkdvp-prover --bin keygen -- --out ./keys
//!
//! Note: this is a development setup, not a ceremony. Keys must be regenerated
//! whenever a circuit changes.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use zkdvp_prover::{CircuitKind, FsArtifactStore, generate_artifacts};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Parse command line arguments
    let mut out_dir = std::env::var("PROVING_KEYS_ROOT").unwrap_or_else(|_| "./keys".into());
    let mut kinds: Vec<CircuitKind> = CircuitKind::ALL.to_vec();
    let mut seed: Option<u64> = None;
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--out" | "-o" => {
                i += 1;
                if i < args.len() {
                    out_dir = args[i].clone();
                }
            }
            "--kind" => {
                i += 1;
                if i < args.len() {
                    kinds = vec![args[i].parse().context("unknown circuit kind")?];
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    seed = Some(args[i].parse().context("seed must be an integer")?);
                }
            }
            "--force" | "-f" => {
                force = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                print_help();
                bail!("unknown argument: {other}");
            }
        }
        i += 1;
    }

    let store = FsArtifactStore::new(&out_dir);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for kind in kinds {
        if !force && artifacts_exist(store.root(), kind) {
            println!("{kind}: artifacts already exist in {out_dir} (use --force to regenerate)");
            continue;
        }

        println!("{kind}: running Groth16 circuit-specific setup...");
        let manifest = generate_artifacts(&store, kind, &mut rng)
            .with_context(|| format!("setup failed for the {kind} circuit"))?;
        println!(
            "{kind}: {} constraints, {} public inputs",
            manifest.constraints, manifest.public_inputs
        );
        println!("  {}", store.root().join(kind.circuit_artifact()).display());
        println!("  {}", store.root().join(kind.proving_key_artifact()).display());
        println!(
            "  {}",
            store.root().join(kind.verification_key_artifact()).display()
        );
    }

    println!();
    println!("To use these keys, set:");
    println!("  export PROVING_KEYS_ROOT={out_dir}");

    Ok(())
}

fn artifacts_exist(root: &Path, kind: CircuitKind) -> bool {
    [
        kind.circuit_artifact(),
        kind.proving_key_artifact(),
        kind.verification_key_artifact(),
    ]
    .iter()
    .all(|name| root.join(name).exists())
}

fn print_help() {
    println!("Circuit key generation tool");
    println!();
    println!("USAGE:");
    println!("    keygen [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --out, -o <DIR>    Artifact directory (default: $PROVING_KEYS_ROOT or ./keys)");
    println!("    --kind <KIND>      Only generate `deposit` or `transfer`");
    println!("    --seed <N>         Deterministic setup randomness (tests only)");
    println!("    --force, -f        Overwrite existing artifacts");
    println!("    --help, -h         Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    keygen --out ./keys");
    println!("    keygen --kind transfer -f");
}
