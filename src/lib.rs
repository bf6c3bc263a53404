// src/lib.rs

//! # DID Envelope Validation
//!
//! Decides whether a request to create, update or delete a Decentralized
//! Identifier (DID) Document may be accepted. A request is an *envelope*: the
//! candidate document plus a signed instruction naming the action, and for
//! modifications the previously accepted (precursor) document.
//!
//! ## Layers
//! 1. **Models**: `Identifier`, `Document`, `Instruction` keep the submitted
//!    JSON untouched and expose typed, fallible accessors
//! 2. **Utils**: the crypto suite registry, key/signature encodings and the
//!    signature primitives
//! 3. **Services**: `EnvelopeValidator`, which runs every check and returns a
//!    single verdict
//!
//! Persistence, transport and ledger integration belong to the caller.
//!
//! ## Example
//! ```no_run
//! use did_envelope::{Envelope, EnvelopeValidator, ValidatorConfig};
//!
//! # fn run(instruction: &str, document: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let validator = EnvelopeValidator::new(ValidatorConfig::from_env()?);
//! let envelope = Envelope::parse(instruction, document)?;
//! validator.validate_creation(&envelope)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{DeletionPolicy, SignatureCountPolicy, ValidatorConfig};
pub use error::{
    EncodingFailure, IdentifierFailure, ModelFailure, ValidationFailure, ValidationResult,
};
pub use models::did::{Identifier, Network, NetworkPolicy};
pub use models::document::{Document, PublicKey};
pub use models::instruction::{Action, Instruction, Signature};
pub use services::validator::{Envelope, EnvelopeValidator};
pub use utils::encoding::Encoding;
pub use utils::suites::CryptoSuite;
