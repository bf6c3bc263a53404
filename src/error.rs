// src/error.rs
//! Failure taxonomy for envelope validation.
//!
//! Failures are returned, never thrown. Each layer wraps the one below it so
//! the root cause survives up to the caller:
//!
//! ```text
//! IdentifierFailure ─┐
//! EncodingFailure ───┼─> ModelFailure ─> ValidationFailure
//! (suite lookup) ────┘
//! ```
//!
//! Every type here is `Clone + PartialEq` so whole verdicts can be compared,
//! which is how idempotence is checked in the test suite.

use crate::utils::suites::CryptoSuite;
use thiserror::Error;
use url::Url;

/// Reasons a DID string is rejected by the identifier parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierFailure {
    /// The scheme segment is not `did`.
    #[error("invalid scheme in `{0}`, expected `did`")]
    InvalidScheme(String),

    /// The string is not shaped like `did:<method>:<network>:<uuid>`.
    #[error("malformed identifier `{0}`")]
    Malformed(String),

    /// The trailing segment looks like a UUID but does not parse as one.
    #[error("invalid uuid `{0}`")]
    InvalidUuid(String),

    /// The network segment is not one of the known networks.
    #[error("unknown network `{0}`")]
    InvalidNetwork(String),

    /// The document carries no string `id` to parse.
    #[error("document has no `id`")]
    Absent,
}

/// Reasons key or signature material cannot be resolved or decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingFailure {
    /// None of the recognized encoding fields is present.
    #[error("no recognized encoding field present")]
    Missing,

    /// More than one encoding field is present.
    #[error("ambiguous encoding, found fields {0:?}")]
    Ambiguous(Vec<&'static str>),

    /// The encoding field is present but its content does not decode.
    #[error("failed to decode `{field}`: {reason}")]
    Decode {
        /// JSON field carrying the material.
        field: &'static str,
        /// Decoder diagnostic.
        reason: String,
    },
}

/// Field extraction failures on a document or instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelFailure {
    /// Input is not a JSON object.
    #[error("malformed json: {0}")]
    MalformedJson(String),

    /// A mandatory field is absent or has the wrong JSON type.
    #[error("missing or mistyped field `{0}`")]
    MissingField(String),

    /// `@context` is absent or empty.
    #[error("missing or empty `@context`")]
    MissingContext,

    /// The document `id` is not a valid identifier.
    #[error("invalid document id: {0}")]
    InvalidDocument(#[from] IdentifierFailure),

    /// A field that must hold a URI does not.
    #[error("field `{field}` is not a valid uri: `{value}`")]
    InvalidUri {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A timestamp field does not parse.
    #[error("field `{field}` is not a valid timestamp: `{value}`")]
    InvalidTimestamp {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A `type` names no registered crypto suite.
    #[error("unknown crypto suite `{0}`")]
    UnknownSuite(String),

    /// Key or signature material is missing, ambiguous or undecodable.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingFailure),

    /// `action` names no known action.
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// The action is known but not allowed for the requested validation.
    #[error("action `{actual}` is not allowed here, expected {expected}")]
    IllegalAction {
        /// Action found in the instruction.
        actual: String,
        /// Human readable list of allowed actions.
        expected: &'static str,
    },
}

/// The verdict on an envelope: exactly one reason it was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// One of the inputs is not JSON at all.
    #[error("malformed json: {0}")]
    MalformedJson(String),

    #[error("malformed instruction: {0}")]
    MalformedInstruction(ModelFailure),

    #[error("malformed document: {0}")]
    MalformedDocument(ModelFailure),

    #[error("malformed precursor document: {0}")]
    MalformedPrecursor(ModelFailure),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// The document carries no public keys.
    #[error("document has no public keys")]
    NoKeys,

    /// Two signatures claim the same key.
    #[error("more than one signature targets `{0}`")]
    SignatureTarget(Url),

    #[error("public key id `{0}` is used more than once")]
    DuplicatePublicKeyId(Url),

    /// The number of signatures does not satisfy the count policy.
    #[error("{signatures} signature(s) for {keys} public key(s)")]
    SignatureCount {
        /// Public keys in the document.
        keys: usize,
        /// Signatures in the instruction.
        signatures: usize,
    },

    #[error("crypto suite {0} is not supported by this deployment")]
    UnsupportedCryptoSuite(CryptoSuite),

    #[error("no signature targets public key `{0}`")]
    UntargetedPublicKey(Url),

    #[error("suite mismatch for `{target}`: key is {key_suite}, signature is {signature_suite}")]
    CryptoSuiteMismatch {
        target: Url,
        key_suite: CryptoSuite,
        signature_suite: CryptoSuite,
    },

    #[error("signature for `{0}` does not verify")]
    InvalidSignature(Url),

    /// No precursor key is covered by a valid signature.
    #[error("no signature matches any precursor key")]
    NoMatchingSignature,

    /// A precursor key was not re-signed.
    #[error("missing signature for precursor key `{0}`")]
    MissingSignature(Url),

    #[error("modification carries no `updated` timestamp")]
    MissingTemporalInformation,

    #[error("timestamps are not in a valid order")]
    InvalidTemporalRelation,

    /// Key id is not anchored in the document's own identifier.
    #[error("public key id `{0}` does not belong to the document")]
    InvalidPublicKeyId(Url),
}

/// Result alias used by the validator entry points.
pub type ValidationResult = Result<(), ValidationFailure>;
