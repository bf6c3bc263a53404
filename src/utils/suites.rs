// src/utils/suites.rs
//! Registry of supported cryptographic suites.
//!
//! Each suite is known by two external names: the `type` used on a public key
//! entry and the `type` used on a signature entry. Lookup in either direction
//! goes through tables built once from [`CryptoSuite::ALL`] and never mutated,
//! so concurrent readers need no locking.

use crate::error::ModelFailure;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A signature scheme together with its key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CryptoSuite {
    Ed25519,
    Rsa,
    EcdsaSecp256k1,
}

impl CryptoSuite {
    /// Every suite the engine knows how to verify.
    pub const ALL: [CryptoSuite; 3] = [
        CryptoSuite::Ed25519,
        CryptoSuite::Rsa,
        CryptoSuite::EcdsaSecp256k1,
    ];

    /// The `type` of a public key entry using this suite.
    pub const fn key_id(self) -> &'static str {
        match self {
            CryptoSuite::Ed25519 => "Ed25519VerificationKey2018",
            CryptoSuite::Rsa => "RsaVerificationKey2018",
            CryptoSuite::EcdsaSecp256k1 => "EcdsaSecp256k1VerificationKey2019",
        }
    }

    /// The `type` of a signature entry using this suite.
    pub const fn signature_id(self) -> &'static str {
        match self {
            CryptoSuite::Ed25519 => "Ed25519Signature2018",
            CryptoSuite::Rsa => "RsaSignature2018",
            CryptoSuite::EcdsaSecp256k1 => "EcdsaSecp256k1Signature2019",
        }
    }

    /// Resolves a public key `type`.
    ///
    /// # Errors
    /// `UnknownSuite` carrying the unrecognized name
    pub fn from_key_id(key_type: &str) -> Result<Self, ModelFailure> {
        BY_KEY_ID
            .get(key_type)
            .copied()
            .ok_or_else(|| ModelFailure::UnknownSuite(key_type.to_string()))
    }

    /// Resolves a signature `type`.
    ///
    /// # Errors
    /// `UnknownSuite` carrying the unrecognized name
    pub fn from_signature_id(signature_type: &str) -> Result<Self, ModelFailure> {
        BY_SIGNATURE_ID
            .get(signature_type)
            .copied()
            .ok_or_else(|| ModelFailure::UnknownSuite(signature_type.to_string()))
    }
}

impl fmt::Display for CryptoSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CryptoSuite::Ed25519 => "Ed25519",
            CryptoSuite::Rsa => "RSA",
            CryptoSuite::EcdsaSecp256k1 => "ECDSA-secp256k1",
        };
        f.write_str(name)
    }
}

static BY_KEY_ID: Lazy<HashMap<&'static str, CryptoSuite>> = Lazy::new(|| {
    CryptoSuite::ALL
        .iter()
        .map(|suite| (suite.key_id(), *suite))
        .collect()
});

static BY_SIGNATURE_ID: Lazy<HashMap<&'static str, CryptoSuite>> = Lazy::new(|| {
    CryptoSuite::ALL
        .iter()
        .map(|suite| (suite.signature_id(), *suite))
        .collect()
});
