// src/utils/crypto.rs
//! Signature verification primitives.
//!
//! Dispatches a (suite, message, public key, signature) tuple to the matching
//! primitive:
//! - Ed25519 via `ring`
//! - RSA PKCS#1 v1.5 or PSS with SHA-256 via `ring`
//! - ECDSA over secp256k1 with SHA-256 via `k256`
//!
//! Key bytes arrive in whatever shape their encoding produced, so each suite
//! first normalizes them: a DER `SubjectPublicKeyInfo` wrapper is unwrapped
//! and a multicodec prefix is stripped.

use crate::utils::suites::CryptoSuite;
use k256::ecdsa::signature::Verifier;
use k256::pkcs8::spki::SubjectPublicKeyInfoRef;
use k256::pkcs8::ObjectIdentifier;
use ring::signature::{self, UnparsedPublicKey};
use std::borrow::Cow;

const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];
const SECP256K1_MULTICODEC: [u8; 2] = [0xe7, 0x01];

const ED25519_KEY_LEN: usize = 32;
/// Compressed and uncompressed SEC1 points.
const SEC1_KEY_LENS: [usize; 2] = [33, 65];

/// Verifies `signature` over `message` with `public_key` under `suite`.
///
/// # Arguments
/// * `suite` - The crypto suite shared by the key and the signature
/// * `message` - The exact bytes that were signed
/// * `public_key` - Decoded key bytes (raw, SEC1, PKCS#1 or SPKI DER)
/// * `signature` - Decoded signature bytes
///
/// # Returns
/// `true` only if the signature is valid. Unusable key or signature bytes
/// are reported as `false`, never as a panic.
pub fn verify_signature(
    suite: CryptoSuite,
    message: &[u8],
    public_key: &[u8],
    signature: &[u8],
) -> bool {
    match suite {
        CryptoSuite::Ed25519 => verify_ed25519(message, public_key, signature),
        CryptoSuite::Rsa => verify_rsa(message, public_key, signature),
        CryptoSuite::EcdsaSecp256k1 => verify_secp256k1(message, public_key, signature),
    }
}

fn verify_ed25519(message: &[u8], public_key: &[u8], signature: &[u8]) -> bool {
    let Some(key) = normalize_key(
        public_key,
        ED25519_OID,
        &ED25519_MULTICODEC,
        &[ED25519_KEY_LEN],
    ) else {
        return false;
    };

    UnparsedPublicKey::new(&signature::ED25519, key.as_ref())
        .verify(message, signature)
        .is_ok()
}

fn verify_rsa(message: &[u8], public_key: &[u8], signature: &[u8]) -> bool {
    // PKCS#1 keys have no multicodec form.
    let Some(key) = normalize_key(public_key, RSA_ENCRYPTION_OID, &[], &[]) else {
        return false;
    };

    [
        &signature::RSA_PKCS1_2048_8192_SHA256,
        &signature::RSA_PSS_2048_8192_SHA256,
    ]
    .into_iter()
    .any(|params| {
        UnparsedPublicKey::new(params, key.as_ref())
            .verify(message, signature)
            .is_ok()
    })
}

fn verify_secp256k1(message: &[u8], public_key: &[u8], signature: &[u8]) -> bool {
    let Some(key) = normalize_key(
        public_key,
        EC_PUBLIC_KEY_OID,
        &SECP256K1_MULTICODEC,
        &SEC1_KEY_LENS,
    ) else {
        return false;
    };

    let Ok(verifying_key) = k256::ecdsa::VerifyingKey::from_sec1_bytes(&key) else {
        return false;
    };

    let Some(parsed) = parse_secp256k1_signature(signature) else {
        return false;
    };

    // k256 only accepts low-S signatures.
    let parsed = parsed.normalize_s().unwrap_or(parsed);

    verifying_key.verify(message, &parsed).is_ok()
}

/// Reads a compact `r || s` or DER signature.
///
/// A leading SEQUENCE tag means DER is tried first, since a 64-byte DER
/// signature is also a well-formed compact one.
fn parse_secp256k1_signature(bytes: &[u8]) -> Option<k256::ecdsa::Signature> {
    let compact = || k256::ecdsa::Signature::from_slice(bytes).ok();
    let der = || k256::ecdsa::Signature::from_der(bytes).ok();

    if bytes.first() == Some(&0x30) {
        der().or_else(compact)
    } else {
        compact().or_else(der)
    }
}

/// Brings key bytes to the suite's native form.
///
/// # Returns
/// - The bit string of a `SubjectPublicKeyInfo` whose algorithm is `oid`
/// - `None` for a `SubjectPublicKeyInfo` of any other algorithm
/// - The bytes after `multicodec`, if they start with it and what remains
///   has one of the `native_lens`
/// - Otherwise the bytes unchanged
fn normalize_key<'a>(
    public_key: &'a [u8],
    oid: ObjectIdentifier,
    multicodec: &[u8],
    native_lens: &[usize],
) -> Option<Cow<'a, [u8]>> {
    if let Ok(spki) = SubjectPublicKeyInfoRef::try_from(public_key) {
        if spki.algorithm.oid != oid {
            return None;
        }
        return spki
            .subject_public_key
            .as_bytes()
            .map(|bytes| Cow::Owned(bytes.to_vec()));
    }

    let stripped = public_key
        .strip_prefix(multicodec)
        .filter(|rest| !multicodec.is_empty() && native_lens.contains(&rest.len()));

    Some(Cow::Borrowed(stripped.unwrap_or(public_key)))
}
