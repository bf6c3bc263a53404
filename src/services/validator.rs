// src/services/validator.rs
//! Envelope validation service.
//!
//! Decides whether a signed instruction may create, update or delete a DID
//! Document. Validation is a pure function of its inputs: no state is kept
//! between calls, so one validator can be shared freely across threads.
//!
//! ## Stages
//! 1. **Action**: the instruction's action must suit the entry point.
//! 2. **Base**: structure, key/signature pairing and signature checks on the
//!    candidate document.
//! 3. **Temporal** (modification only): timestamps against the precursor.
//! 4. **Key ownership** (modification only): the precursor's keys must
//!    authorize the change.
//!
//! The first failure ends validation. The order of checks inside each stage
//! is fixed so the same envelope always fails for the same reason.

use crate::config::{DeletionPolicy, SignatureCountPolicy, ValidatorConfig};
use crate::error::{ModelFailure, ValidationFailure, ValidationResult};
use crate::models::document::{Document, PublicKey};
use crate::models::instruction::{Action, Instruction, Signature};
use crate::utils::crypto::verify_signature;
use log::{debug, info, trace};
use std::collections::{HashMap, HashSet};
use url::Url;

/// A candidate document together with the instruction acting on it.
#[derive(Debug, Clone)]
pub struct Envelope {
    instruction: Instruction,
    document: Document,
}

impl Envelope {
    /// Parses both inputs as JSON before any field is looked at.
    ///
    /// # Arguments
    /// * `instruction` - The signed instruction JSON
    /// * `document` - The candidate DID Document JSON, exactly as signed
    ///
    /// # Errors
    /// `MalformedJson` if either input is not a JSON object
    pub fn parse(instruction: &str, document: &str) -> Result<Self, ValidationFailure> {
        Ok(Envelope {
            instruction: Instruction::parse(instruction).map_err(malformed_json)?,
            document: Document::parse(document).map_err(malformed_json)?,
        })
    }

    /// Parses a previously accepted document to validate a modification
    /// against.
    pub fn parse_precursor(precursor: &str) -> Result<Document, ValidationFailure> {
        Document::parse(precursor).map_err(malformed_json)
    }

    pub fn new(instruction: Instruction, document: Document) -> Self {
        Envelope {
            instruction,
            document,
        }
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Which entry point base validation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Creation,
    Modification,
}

/// Validates envelopes under one deployment profile.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeValidator {
    config: ValidatorConfig,
}

impl EnvelopeValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        EnvelopeValidator { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Routes an envelope to creation or modification validation by its
    /// action.
    ///
    /// # Panics
    /// If the action is `update` or `delete` and no precursor is given. The
    /// caller must look up the current document before asking for a
    /// modification to be validated.
    pub fn validate(&self, envelope: &Envelope, precursor: Option<&Document>) -> ValidationResult {
        match reject(action_of(envelope))? {
            Action::Create => self.validate_creation(envelope),
            Action::Update | Action::Delete => match precursor {
                Some(precursor) => self.validate_modification(envelope, precursor),
                None => panic!("modification validation requires a precursor document"),
            },
            Action::Read => reject(Err(illegal_action(Action::Read, "create, update or delete"))),
        }
    }

    /// Validates an envelope that creates a new document.
    ///
    /// # Errors
    /// The first failure found, see the module docs for the order
    pub fn validate_creation(&self, envelope: &Envelope) -> ValidationResult {
        let action = reject(action_of(envelope))?;
        if action != Action::Create {
            return reject(Err(illegal_action(action, "create")));
        }

        reject(self.validate_base(envelope, Stage::Creation).map(|_| ()))
    }

    /// Validates an envelope that updates or deletes `precursor`.
    ///
    /// # Arguments
    /// * `envelope` - The instruction and the candidate document
    /// * `precursor` - The currently accepted document
    ///
    /// # Errors
    /// The first failure found, see the module docs for the order
    pub fn validate_modification(&self, envelope: &Envelope, precursor: &Document) -> ValidationResult {
        let action = reject(action_of(envelope))?;
        if !matches!(action, Action::Update | Action::Delete) {
            return reject(Err(illegal_action(action, "update or delete")));
        }

        let outcome = self
            .validate_base(envelope, Stage::Modification)
            .and_then(|signatures| {
                validate_temporal(envelope.document(), precursor)?;
                self.validate_key_ownership(action, envelope.document(), precursor, &signatures)
            });

        reject(outcome)
    }

    /// Structural, pairing and signature checks shared by every action.
    ///
    /// # Returns
    /// The instruction's signatures, for the modification stages to reuse
    fn validate_base(&self, envelope: &Envelope, stage: Stage) -> Result<Vec<Signature>, ValidationFailure> {
        let document = envelope.document();

        document
            .context()
            .map_err(ValidationFailure::MalformedDocument)?;

        let created = document
            .created()
            .map_err(ValidationFailure::MalformedDocument)?;
        let updated = document
            .updated()
            .map_err(ValidationFailure::MalformedDocument)?;
        if let (Some(created), Some(updated)) = (created, updated) {
            if updated <= created {
                return Err(ValidationFailure::InvalidTemporalRelation);
            }
        }

        let signatures = envelope
            .instruction()
            .signatures()
            .map_err(ValidationFailure::MalformedInstruction)?;
        if let Some(target) = first_duplicate(signatures.iter().map(|s| &s.target)) {
            return Err(ValidationFailure::SignatureTarget(target.clone()));
        }

        let keys = document
            .public_keys()
            .map_err(ValidationFailure::MalformedDocument)?;
        if let Some(id) = first_duplicate(keys.iter().map(|k| &k.id)) {
            return Err(ValidationFailure::DuplicatePublicKeyId(id.clone()));
        }

        if keys.is_empty() {
            return Err(ValidationFailure::NoKeys);
        }

        self.check_signature_count(stage, keys.len(), signatures.len())?;

        if let Some(key) = keys.iter().find(|key| !self.config.supports(key.suite)) {
            return Err(ValidationFailure::UnsupportedCryptoSuite(key.suite));
        }

        let id = document
            .id_with(self.config.network_policy())
            .map_err(ValidationFailure::MalformedDocument)?;
        if let Some(key) = keys.iter().find(|key| !is_anchored(key, id.as_str())) {
            return Err(ValidationFailure::InvalidPublicKeyId(key.id.clone()));
        }

        debug!("structure of {} accepted with {} key(s)", id, keys.len());

        let by_target: HashMap<&Url, &Signature> =
            signatures.iter().map(|s| (&s.target, s)).collect();
        let pairs = keys
            .iter()
            .map(|key| {
                by_target
                    .get(&key.id)
                    .map(|signature| (key, *signature))
                    .ok_or_else(|| ValidationFailure::UntargetedPublicKey(key.id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (key, signature) in &pairs {
            check_suites(key, signature)?;
        }

        for (key, signature) in &pairs {
            if !verify_pair(key, signature, document.raw_bytes()) {
                return Err(ValidationFailure::InvalidSignature(key.id.clone()));
            }
        }

        debug!("all {} signature(s) on {} verified", pairs.len(), id);
        Ok(signatures)
    }

    fn check_signature_count(&self, stage: Stage, keys: usize, signatures: usize) -> ValidationResult {
        let exact = stage == Stage::Creation
            && self.config.signature_count == SignatureCountPolicy::ExactForCreation;

        let satisfied = if exact {
            signatures == keys
        } else {
            signatures >= keys
        };

        if satisfied {
            Ok(())
        } else {
            Err(ValidationFailure::SignatureCount { keys, signatures })
        }
    }

    /// The precursor's keys must authorize the change.
    ///
    /// Under the all-keys policy (always used for updates) every precursor
    /// key needs a signature that verifies against the precursor's key
    /// material. Under the any-key deletion policy one such signature is
    /// enough.
    fn validate_key_ownership(
        &self,
        action: Action,
        document: &Document,
        precursor: &Document,
        signatures: &[Signature],
    ) -> ValidationResult {
        let owners = precursor
            .public_keys()
            .map_err(ValidationFailure::MalformedPrecursor)?;

        if action == Action::Delete && self.config.deletion_policy == DeletionPolicy::AnyKey {
            let authorized = owners.iter().any(|key| {
                signatures.iter().any(|signature| {
                    signature.target == key.id
                        && signature.suite == key.suite
                        && verify_pair(key, signature, document.raw_bytes())
                })
            });
            return if authorized {
                Ok(())
            } else {
                Err(ValidationFailure::NoMatchingSignature)
            };
        }

        for key in &owners {
            let signature = signatures
                .iter()
                .find(|signature| signature.target == key.id)
                .ok_or_else(|| ValidationFailure::MissingSignature(key.id.clone()))?;

            check_suites(key, signature)?;
            if !verify_pair(key, signature, document.raw_bytes()) {
                return Err(ValidationFailure::InvalidSignature(key.id.clone()));
            }
        }

        debug!("{} precursor key(s) re-signed", owners.len());
        Ok(())
    }
}

/// Timestamp rules for a modification.
///
/// `created` may not change, `updated` is mandatory and must move strictly
/// forward from the precursor's.
fn validate_temporal(document: &Document, precursor: &Document) -> ValidationResult {
    let precursor_created = precursor
        .created()
        .map_err(ValidationFailure::MalformedPrecursor)?;
    let created = document
        .created()
        .map_err(ValidationFailure::MalformedDocument)?;
    if precursor_created != created {
        return Err(ValidationFailure::InvalidTemporalRelation);
    }

    let updated = document
        .updated()
        .map_err(ValidationFailure::MalformedDocument)?
        .ok_or(ValidationFailure::MissingTemporalInformation)?;

    let precursor_updated = precursor
        .updated()
        .map_err(ValidationFailure::MalformedPrecursor)?;
    if let Some(previous) = precursor_updated {
        if updated <= previous {
            return Err(ValidationFailure::InvalidTemporalRelation);
        }
    }

    Ok(())
}

fn action_of(envelope: &Envelope) -> Result<Action, ValidationFailure> {
    envelope.instruction().action().map_err(|failure| match failure {
        ModelFailure::UnknownAction(name) => ValidationFailure::UnknownAction(name),
        other => ValidationFailure::MalformedInstruction(other),
    })
}

fn illegal_action(action: Action, expected: &'static str) -> ValidationFailure {
    ValidationFailure::MalformedInstruction(ModelFailure::IllegalAction {
        actual: action.to_string(),
        expected,
    })
}

fn malformed_json(failure: ModelFailure) -> ValidationFailure {
    match failure {
        ModelFailure::MalformedJson(reason) => ValidationFailure::MalformedJson(reason),
        other => ValidationFailure::MalformedJson(other.to_string()),
    }
}

fn reject<T>(outcome: Result<T, ValidationFailure>) -> Result<T, ValidationFailure> {
    if let Err(failure) = &outcome {
        info!("envelope rejected: {}", failure);
    }
    outcome
}

/// The key id must be the document id plus a non-empty fragment.
fn is_anchored(key: &PublicKey, document_id: &str) -> bool {
    key.id.fragment().map_or(false, |fragment| !fragment.is_empty())
        && key.owner().as_str() == document_id
}

fn check_suites(key: &PublicKey, signature: &Signature) -> ValidationResult {
    if key.suite == signature.suite {
        Ok(())
    } else {
        Err(ValidationFailure::CryptoSuiteMismatch {
            target: key.id.clone(),
            key_suite: key.suite,
            signature_suite: signature.suite,
        })
    }
}

fn verify_pair(key: &PublicKey, signature: &Signature, message: &[u8]) -> bool {
    let valid = verify_signature(key.suite, message, &key.key_bytes, &signature.signature_bytes);
    trace!("signature for {} ({}): valid={}", key.id, key.suite, valid);
    valid
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a Url>) -> Option<&'a Url> {
    let mut seen = HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}
