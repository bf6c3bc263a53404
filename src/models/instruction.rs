// src/models/instruction.rs
//! Signed instruction model.
//!
//! An instruction names the action requested on a document and carries one
//! signature per public key that authorizes it. Each signature states which
//! key it claims to satisfy through its `id` (the target).

use crate::error::ModelFailure;
use crate::models::document::parse_uri;
use crate::models::json::{as_object, required_str, RawJson};
use crate::utils::encoding::{self, Encoding};
use crate::utils::suites::CryptoSuite;
use serde_json::Value;
use std::fmt;
use url::Url;

/// The operation requested on a DID Document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Maps the wire name of an action.
    ///
    /// # Errors
    /// `UnknownAction` for anything other than `read`, `create`, `update`
    /// or `delete`
    pub fn from_name(name: &str) -> Result<Self, ModelFailure> {
        match name {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(ModelFailure::UnknownAction(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signature entry of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub suite: CryptoSuite,
    /// Id of the public key this signature claims to satisfy.
    pub target: Url,
    pub encoding: Encoding,
    pub signature_bytes: Vec<u8>,
}

/// An instruction as submitted by a caller.
///
/// ```json
/// {
///   "action": "create",
///   "signatures": [{
///     "id": "did:example:net:7c4b1f0e-2a3d-4c5e-9f60-718293a4b5c6#keys-1",
///     "type": "Ed25519Signature2018",
///     "signatureBase58": "..."
///   }]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Instruction {
    json: RawJson,
}

impl Instruction {
    /// Parses an instruction without extracting any field.
    ///
    /// # Errors
    /// `MalformedJson` if `input` is not a JSON object
    pub fn parse(input: &str) -> Result<Self, ModelFailure> {
        Ok(Instruction {
            json: RawJson::parse(input)?,
        })
    }

    pub fn raw_bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }

    /// The requested action.
    ///
    /// # Errors
    /// - `MissingField` if `action` is absent or not a string
    /// - `UnknownAction` if the name is not recognized
    pub fn action(&self) -> Result<Action, ModelFailure> {
        Action::from_name(self.json.string("action")?)
    }

    /// Extracts every entry of the `signatures` array, failing on the first
    /// bad entry. An absent array yields no signatures.
    pub fn signatures(&self) -> Result<Vec<Signature>, ModelFailure> {
        self.json
            .optional_array("signatures")?
            .iter()
            .map(extract_signature)
            .collect()
    }
}

fn extract_signature(item: &Value) -> Result<Signature, ModelFailure> {
    let entry = as_object(item, "signatures")?;

    let target = parse_uri("id", required_str(entry, "id")?)?;
    let suite = CryptoSuite::from_signature_id(required_str(entry, "type")?)?;

    let material = encoding::resolve(entry, encoding::SIGNATURE_FIELDS)?;
    let signature_bytes = material.decode()?;

    Ok(Signature {
        suite,
        target,
        encoding: material.encoding,
        signature_bytes,
    })
}
