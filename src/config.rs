// src/config.rs
//! Deployment profile for the envelope validator.
//!
//! Deployments differ in which crypto suites they accept and in how strictly
//! they count signatures. Profiles load from an optional file followed by
//! environment variables:
//!
//! - `DID_ENVELOPE_STRICT_NETWORK`: `true` / `false`
//! - `DID_ENVELOPE_SIGNATURE_COUNT`: `exact-for-creation` / `at-least`
//! - `DID_ENVELOPE_DELETION_POLICY`: `all-keys` / `any-key`
//!
//! `supported_suites` is a list and is set from the file source, e.g.
//! ```toml
//! supported_suites = ["ed25519"]
//! ```

use crate::models::did::NetworkPolicy;
use crate::utils::suites::CryptoSuite;
use anyhow::Context;
use serde::Deserialize;

/// Prefix of the environment variables read by [`ValidatorConfig::from_env`].
pub const ENV_PREFIX: &str = "DID_ENVELOPE";

/// How many signatures an envelope must carry relative to its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureCountPolicy {
    /// Exactly one signature per key on creation; at least one per key on
    /// update and delete.
    #[default]
    ExactForCreation,
    /// At least one signature per key for every action.
    AtLeast,
}

/// Which precursor keys must re-sign a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionPolicy {
    /// Every precursor key must be covered by a signature.
    #[default]
    AllKeys,
    /// One valid signature from any precursor key is enough.
    AnyKey,
}

/// Validator settings for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Suites public keys may use.
    pub supported_suites: Vec<CryptoSuite>,
    pub signature_count: SignatureCountPolicy,
    pub deletion_policy: DeletionPolicy,
    /// Reject identifiers on networks outside the known set.
    pub strict_network: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            supported_suites: CryptoSuite::ALL.to_vec(),
            signature_count: SignatureCountPolicy::default(),
            deletion_policy: DeletionPolicy::default(),
            strict_network: true,
        }
    }
}

impl ValidatorConfig {
    /// The historical profile that accepts Ed25519 keys only.
    pub fn ed25519_only() -> Self {
        ValidatorConfig {
            supported_suites: vec![CryptoSuite::Ed25519],
            ..Self::default()
        }
    }

    /// Loads settings from the environment, honouring a `.env` file.
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value of the wrong shape.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::build(None)
    }

    /// Loads settings from `path` (any format the `config` crate detects by
    /// extension), then applies environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file is missing or unreadable, or if any
    /// setting has the wrong shape.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        Self::build(Some(path))
    }

    fn build(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to read validator configuration")?;

        let config: ValidatorConfig = settings
            .try_deserialize()
            .context("invalid validator configuration")?;

        log::debug!("loaded validator configuration: {:?}", config);
        Ok(config)
    }

    pub fn network_policy(&self) -> NetworkPolicy {
        if self.strict_network {
            NetworkPolicy::Strict
        } else {
            NetworkPolicy::Lenient
        }
    }

    pub fn supports(&self, suite: CryptoSuite) -> bool {
        self.supported_suites.contains(&suite)
    }
}
