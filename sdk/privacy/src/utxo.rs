//! Shielded UTXOs
//!
//! ```text
//! Utxo = {
//!     value:          Option<u64>,          // fungible amount (owner-only)
//!     tokenId, uri:   Option<u64>, Option<String>   // non-fungible variant
//!     commitmentHash: FieldElement,         // the only public part
//!     salt:           Option<FieldElement>, // owner-only, needed to spend
//! }
//! ```
//!
//! A UTXO never changes after its commitment is computed: a different value or
//! salt is a different UTXO. The zero-UTXO (all zeros) fills unused slots of
//! fixed-arity circuits and is never persisted.

use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zkdvp_field::FieldElement;
use zkdvp_keypair::{ShieldedKeyPair, ShieldedPublicKey};

use crate::commitment::{commit, commit_nf};
use crate::error::{CommitmentError, Result};
use crate::nullifier::nullifier;
use crate::salt::new_salt;

/// Padding UTXO for empty circuit slots
pub const ZERO_UTXO: Utxo = Utxo {
    value: Some(0),
    token_id: None,
    uri: None,
    commitment: FieldElement::ZERO,
    salt: Some(FieldElement::ZERO),
};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_value")]
    pub value: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_value")]
    pub token_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "commitmentHash", alias = "hash")]
    pub commitment: FieldElement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<FieldElement>,
}

impl Utxo {
    /// Mint a value UTXO for `owner`. A fresh salt is drawn unless one is supplied.
    pub fn new<R: RngCore + CryptoRng>(
        value: u64,
        owner: &ShieldedPublicKey,
        salt: Option<FieldElement>,
        rng: &mut R,
    ) -> Self {
        let salt = salt.unwrap_or_else(|| new_salt(rng));
        Self {
            value: Some(value),
            token_id: None,
            uri: None,
            commitment: commit(value, &salt, owner),
            salt: Some(salt),
        }
    }

    /// Mint a non-fungible token UTXO for `owner`
    pub fn new_nf<R: RngCore + CryptoRng>(
        token_id: u64,
        uri: impl Into<String>,
        owner: &ShieldedPublicKey,
        salt: Option<FieldElement>,
        rng: &mut R,
    ) -> Self {
        let uri = uri.into();
        let salt = salt.unwrap_or_else(|| new_salt(rng));
        Self {
            value: None,
            token_id: Some(token_id),
            commitment: commit_nf(token_id, &uri, &salt, owner),
            uri: Some(uri),
            salt: Some(salt),
        }
    }

    pub fn zero() -> Self {
        ZERO_UTXO
    }

    /// Padding slots are identified by a zero commitment
    pub fn is_padding(&self) -> bool {
        self.commitment.is_zero()
    }

    pub fn is_non_fungible(&self) -> bool {
        self.token_id.is_some()
    }

    /// Recompute the commitment under `owner` and compare.
    ///
    /// Fails with `InvalidValue` when the opening (value or salt) is missing.
    pub fn opens_to(&self, owner: &ShieldedPublicKey) -> Result<bool> {
        let salt = self
            .salt
            .ok_or_else(|| CommitmentError::InvalidValue("utxo has no salt".into()))?;

        let recomputed = match (self.token_id, &self.uri) {
            (Some(token_id), Some(uri)) => commit_nf(token_id, uri, &salt, owner),
            (Some(_), None) => {
                return Err(CommitmentError::InvalidValue(
                    "token utxo has no uri".into(),
                ));
            }
            (None, _) => {
                let value = self
                    .value
                    .ok_or_else(|| CommitmentError::InvalidValue("utxo has no value".into()))?;
                commit(value, &salt, owner)
            }
        };
        Ok(recomputed == self.commitment)
    }

    /// Spend tag for this UTXO under its owner's keys
    pub fn nullifier(&self, owner: &ShieldedKeyPair) -> Result<FieldElement> {
        match (self.value, self.salt) {
            (Some(value), Some(salt)) => Ok(nullifier(value, &salt, owner)),
            _ => Err(CommitmentError::InvalidValue(
                "nullifier needs the utxo value and salt".into(),
            )),
        }
    }
}

// The salt is the spending secret; it never reaches logs.
impl fmt::Debug for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utxo")
            .field("value", &self.value)
            .field("token_id", &self.token_id)
            .field("uri", &self.uri)
            .field("commitment", &self.commitment)
            .field("salt", &self.salt.map(|_| "<redacted>"))
            .finish()
    }
}

/// Parse an externally supplied amount.
///
/// Accepts base-10 digits only; negative, fractional and out-of-range amounts
/// fail with `InvalidValue`.
pub fn parse_value(s: &str) -> Result<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommitmentError::InvalidValue(
            "expected a non-negative integer".into(),
        ));
    }
    s.parse::<u64>()
        .map_err(|_| CommitmentError::InvalidValue("amount exceeds 64 bits".into()))
}

/// Amounts travel as decimal strings; integers are accepted on input
mod opt_value {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<u64>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<u64>, D::Error> {
        deserializer.deserialize_option(OptValueVisitor)
    }

    struct OptValueVisitor;

    impl<'de> Visitor<'de> for OptValueVisitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> std::result::Result<Self::Value, D::Error> {
            deserializer.deserialize_any(ValueVisitor).map(Some)
        }
    }

    struct ValueVisitor;

    impl Visitor<'_> for ValueVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom("invalid value: negative amount"))
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<u64, E> {
            Err(E::custom("invalid value: amounts must be integers"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u64, E> {
            parse_value(v).map_err(E::custom)
        }
    }
}
