// src/models/document.rs
//! DID Document model.
//!
//! A document is kept as the JSON it was submitted as. Typed views (`id`,
//! timestamps, public keys) are computed on request and can each fail on
//! their own, so a validator only pays for, and only reports, what it reads.

use crate::error::{IdentifierFailure, ModelFailure};
use crate::models::did::{Identifier, NetworkPolicy};
use crate::models::json::{as_object, required_str, RawJson};
use crate::utils::encoding::{self, Encoding};
use crate::utils::suites::CryptoSuite;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use url::Url;

/// A public key entry of a DID Document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    /// Key id, a DID URL whose fragment names the key.
    pub id: Url,
    pub suite: CryptoSuite,
    pub controller: Url,
    /// Encoding the key material was supplied in.
    pub encoding: Encoding,
    /// Decoded key material.
    pub key_bytes: Vec<u8>,
}

impl PublicKey {
    /// The key id without its fragment.
    pub fn owner(&self) -> Url {
        let mut owner = self.id.clone();
        owner.set_fragment(None);
        owner
    }
}

/// A DID Document as submitted by a caller.
///
/// # JSON Shape
/// ```json
/// {
///   "@context": "https://w3id.org/did/v1",
///   "id": "did:example:net:7c4b1f0e-2a3d-4c5e-9f60-718293a4b5c6",
///   "created": "2024-01-01T00:00:00Z",
///   "publicKey": [{
///     "id": "did:example:net:7c4b1f0e-2a3d-4c5e-9f60-718293a4b5c6#keys-1",
///     "type": "Ed25519VerificationKey2018",
///     "controller": "did:example:net:7c4b1f0e-2a3d-4c5e-9f60-718293a4b5c6",
///     "publicKeyBase58": "..."
///   }]
/// }
/// ```
///
/// # Signing
/// Signatures cover [`Document::raw_bytes`], the exact submitted text.
#[derive(Debug, Clone)]
pub struct Document {
    json: RawJson,
}

impl Document {
    /// Parses a document without extracting any field.
    ///
    /// # Errors
    /// `MalformedJson` if `input` is not a JSON object
    pub fn parse(input: &str) -> Result<Self, ModelFailure> {
        Ok(Document {
            json: RawJson::parse(input)?,
        })
    }

    /// The bytes signatures are computed over.
    pub fn raw_bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }

    /// The mandatory `id`, parsed strictly.
    pub fn id(&self) -> Result<Identifier, ModelFailure> {
        self.id_with(NetworkPolicy::Strict)
    }

    /// The mandatory `id`, parsed under the given network policy.
    ///
    /// # Errors
    /// `InvalidDocument` if `id` is absent, not a string or not a valid
    /// identifier
    pub fn id_with(&self, policy: NetworkPolicy) -> Result<Identifier, ModelFailure> {
        let id = self
            .json
            .string("id")
            .map_err(|_| IdentifierFailure::Absent)?;
        Ok(Identifier::parse_with(id, policy)?)
    }

    /// Checks that `@context` is present and not empty.
    ///
    /// The content of the context is not interpreted.
    pub fn context(&self) -> Result<(), ModelFailure> {
        let present = match self.json.object().get("@context") {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            _ => false,
        };

        if present {
            Ok(())
        } else {
            Err(ModelFailure::MissingContext)
        }
    }

    /// The optional `created` timestamp.
    pub fn created(&self) -> Result<Option<NaiveDateTime>, ModelFailure> {
        self.timestamp("created")
    }

    /// The optional `updated` timestamp.
    pub fn updated(&self) -> Result<Option<NaiveDateTime>, ModelFailure> {
        self.timestamp("updated")
    }

    fn timestamp(&self, field: &'static str) -> Result<Option<NaiveDateTime>, ModelFailure> {
        match self.json.optional_string(field)? {
            None => Ok(None),
            Some(value) => parse_timestamp(value)
                .map(Some)
                .ok_or_else(|| ModelFailure::InvalidTimestamp {
                    field,
                    value: value.to_string(),
                }),
        }
    }

    /// Extracts every entry of the `publicKey` array.
    ///
    /// Extraction is all or nothing: the first bad entry fails the whole call.
    /// An absent array yields no keys. Duplicate ids are returned as found;
    /// rejecting them is up to the validator.
    ///
    /// # Errors
    /// - `MissingField` for a non-array `publicKey` or a missing entry field
    /// - `InvalidUri` for a malformed `id` or `controller`
    /// - `UnknownSuite` for an unregistered `type`
    /// - `Encoding` for missing, ambiguous or undecodable key material
    pub fn public_keys(&self) -> Result<Vec<PublicKey>, ModelFailure> {
        self.json
            .optional_array("publicKey")?
            .iter()
            .map(extract_public_key)
            .collect()
    }
}

fn extract_public_key(item: &Value) -> Result<PublicKey, ModelFailure> {
    let entry = as_object(item, "publicKey")?;

    let id = parse_uri("id", required_str(entry, "id")?)?;
    let suite = CryptoSuite::from_key_id(required_str(entry, "type")?)?;
    let controller = parse_uri("controller", required_str(entry, "controller")?)?;

    let material = encoding::resolve(entry, encoding::KEY_FIELDS)?;
    let key_bytes = material.decode()?;

    Ok(PublicKey {
        id,
        suite,
        controller,
        encoding: material.encoding,
        key_bytes,
    })
}

pub(crate) fn parse_uri(field: &'static str, value: &str) -> Result<Url, ModelFailure> {
    Url::parse(value).map_err(|_| ModelFailure::InvalidUri {
        field,
        value: value.to_string(),
    })
}

/// Parses an ISO-8601 date-time, dropping any offset.
///
/// Only the relative order of timestamps matters, so the wall-clock value is
/// kept as written.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
