//! Builders for signed envelopes used across the integration tests.

#![allow(dead_code)]

use did_envelope::{CryptoSuite, Document, Envelope};
use k256::ecdsa::signature::Signer;
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair, RsaKeyPair, RSA_PKCS1_SHA256};
use serde_json::{json, Value};

pub const DID: &str = "did:example:net:7c4b1f0e-2a3d-4c5e-9f60-718293a4b5c6";
pub const CREATED: &str = "2024-01-01T00:00:00Z";

const RSA_PKCS8: &[u8] = include_bytes!("../fixtures/rsa-2048.pk8");
pub const RSA_PUBLIC_PEM: &str = include_str!("../fixtures/rsa-2048.pub.pem");

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A signing key for one of the supported suites.
pub enum TestKey {
    Ed25519(Ed25519KeyPair),
    Rsa(RsaKeyPair),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl TestKey {
    pub fn ed25519(seed: u8) -> Self {
        TestKey::Ed25519(Ed25519KeyPair::from_seed_unchecked(&[seed; 32]).unwrap())
    }

    pub fn rsa() -> Self {
        TestKey::Rsa(RsaKeyPair::from_pkcs8(RSA_PKCS8).unwrap())
    }

    pub fn secp256k1(seed: u8) -> Self {
        TestKey::Secp256k1(k256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap())
    }

    pub fn suite(&self) -> CryptoSuite {
        match self {
            TestKey::Ed25519(_) => CryptoSuite::Ed25519,
            TestKey::Rsa(_) => CryptoSuite::Rsa,
            TestKey::Secp256k1(_) => CryptoSuite::EcdsaSecp256k1,
        }
    }

    /// Ed25519: raw 32 bytes. RSA: PKCS#1 DER. secp256k1: compressed SEC1.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            TestKey::Ed25519(pair) => pair.public_key().as_ref().to_vec(),
            TestKey::Rsa(pair) => pair.public_key().as_ref().to_vec(),
            TestKey::Secp256k1(key) => key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            TestKey::Ed25519(pair) => pair.sign(message).as_ref().to_vec(),
            TestKey::Rsa(pair) => {
                let mut signature = vec![0; pair.public_modulus_len()];
                pair.sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), message, &mut signature)
                    .unwrap();
                signature
            }
            TestKey::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature = key.sign(message);
                signature.to_bytes().to_vec()
            }
        }
    }
}

pub fn key_id(fragment: &str) -> String {
    format!("{DID}#{fragment}")
}

pub fn key_url(fragment: &str) -> url::Url {
    url::Url::parse(&key_id(fragment)).unwrap()
}

/// A `publicKey` entry carrying the key as Base58.
pub fn key_entry(fragment: &str, key: &TestKey) -> Value {
    json!({
        "id": key_id(fragment),
        "type": key.suite().key_id(),
        "controller": DID,
        "publicKeyBase58": bs58::encode(key.public_key_bytes()).into_string(),
    })
}

/// A document JSON string with the given key entries and timestamps.
pub fn document_with(entries: Vec<Value>, created: Option<&str>, updated: Option<&str>) -> String {
    let mut body = json!({
        "@context": "https://w3id.org/did/v1",
        "id": DID,
        "publicKey": entries,
    });
    if let Some(created) = created {
        body["created"] = json!(created);
    }
    if let Some(updated) = updated {
        body["updated"] = json!(updated);
    }
    serde_json::to_string_pretty(&body).unwrap()
}

pub fn document(keys: &[(&str, &TestKey)], created: Option<&str>, updated: Option<&str>) -> String {
    let entries = keys
        .iter()
        .map(|(fragment, key)| key_entry(fragment, key))
        .collect();
    document_with(entries, created, updated)
}

/// A `signatures` entry carrying the signature as Base58.
pub fn signature_entry(fragment: &str, suite: CryptoSuite, signature: &[u8]) -> Value {
    json!({
        "id": key_id(fragment),
        "type": suite.signature_id(),
        "signatureBase58": bs58::encode(signature).into_string(),
    })
}

pub fn instruction(action: &str, signatures: Vec<Value>) -> String {
    json!({ "action": action, "signatures": signatures }).to_string()
}

/// An instruction with one signature per key over `document`.
pub fn signed_instruction(action: &str, document: &str, keys: &[(&str, &TestKey)]) -> String {
    let signatures = keys
        .iter()
        .map(|(fragment, key)| {
            signature_entry(fragment, key.suite(), &key.sign(document.as_bytes()))
        })
        .collect();
    instruction(action, signatures)
}

pub fn envelope(instruction: &str, document: &str) -> Envelope {
    Envelope::parse(instruction, document).unwrap()
}

pub fn precursor(document: &str) -> Document {
    Envelope::parse_precursor(document).unwrap()
}
