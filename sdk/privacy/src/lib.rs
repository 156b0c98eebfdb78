//! zkdvp Privacy SDK
//!
//! Commitment primitives for confidential UTXOs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Shielded UTXO                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │ value/token  │  │    salt      │  │  owner public key     │  │
//! │  │ (private)    │  │  (private)   │  │  (Baby Jubjub point)  │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘  │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │          Poseidon commitment (public field element)      │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod error;
pub mod nullifier;
pub mod poseidon;
pub mod salt;
pub mod utxo;

pub use commitment::{commit, commit_nf, uri_digest};
pub use error::{CommitmentError, Result};
pub use nullifier::nullifier;
pub use poseidon::{poseidon_hash, poseidon_parameters};
pub use salt::new_salt;
pub use utxo::{Utxo, ZERO_UTXO, parse_value};
