// src/models/did.rs
//! Decentralized Identifier (DID) parsing.
//!
//! Identifiers handled by this crate have exactly four colon separated
//! segments:
//! ```text
//! did:<method>:<network>:<uuid>
//! ```
//! where `<uuid>` is an RFC 4122 UUID in its hyphenated form.

use crate::error::IdentifierFailure;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The only scheme accepted in an identifier.
pub const DID_SCHEME: &str = "did";

/// Networks an identifier may be anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Network {
    /// Production network, `main`.
    Main,
    /// Public test network, `test`.
    Test,
    /// Developer network, `dev`.
    Dev,
    /// Shared default network, `net`.
    Net,
    /// A network outside the known set, only produced by lenient parsing.
    Unlisted(String),
}

impl Network {
    /// Maps a network segment onto a known network.
    ///
    /// # Returns
    /// `None` if the segment is not part of the known set
    pub fn known(segment: &str) -> Option<Self> {
        match segment {
            "main" => Some(Network::Main),
            "test" => Some(Network::Test),
            "dev" => Some(Network::Dev),
            "net" => Some(Network::Net),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Dev => "dev",
            Network::Net => "net",
            Network::Unlisted(other) => other,
        }
    }
}

/// How the parser treats a network segment outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkPolicy {
    /// Reject with `InvalidNetwork`.
    Strict,
    /// Accept as [`Network::Unlisted`].
    Lenient,
}

/// A parsed identifier of the form `did:<method>:<network>:<uuid>`.
///
/// Immutable once parsed. The original text is retained so that key ids can
/// be compared against exactly what the document declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    text: String,
    method: String,
    network: Network,
    uuid: Uuid,
}

impl Identifier {
    /// Parses an identifier, rejecting unknown networks.
    ///
    /// # Arguments
    /// * `input` - The DID string, e.g. `did:example:net:0b5e...`
    ///
    /// # Errors
    /// - `InvalidScheme` if the first segment is not `did`
    /// - `Malformed` if the string does not have the four segment shape
    /// - `InvalidUuid` if the last segment does not parse as a UUID
    /// - `InvalidNetwork` if the network is not known
    pub fn parse(input: &str) -> Result<Self, IdentifierFailure> {
        Self::parse_with(input, NetworkPolicy::Strict)
    }

    /// Parses an identifier with an explicit network policy.
    pub fn parse_with(input: &str, policy: NetworkPolicy) -> Result<Self, IdentifierFailure> {
        let segments: Vec<&str> = input.split(':').collect();

        if segments.first() != Some(&DID_SCHEME) {
            return Err(IdentifierFailure::InvalidScheme(input.to_string()));
        }

        let [_, method, network, uuid] = segments[..] else {
            return Err(IdentifierFailure::Malformed(input.to_string()));
        };

        if !is_method_name(method) || !is_network_name(network) || !is_uuid_shaped(uuid) {
            return Err(IdentifierFailure::Malformed(input.to_string()));
        }

        let uuid = Uuid::parse_str(uuid)
            .map_err(|_| IdentifierFailure::InvalidUuid(uuid.to_string()))?;

        let network = match (Network::known(network), policy) {
            (Some(known), _) => known,
            (None, NetworkPolicy::Lenient) => Network::Unlisted(network.to_string()),
            (None, NetworkPolicy::Strict) => {
                return Err(IdentifierFailure::InvalidNetwork(network.to_string()))
            }
        };

        Ok(Identifier {
            text: input.to_string(),
            method: method.to_string(),
            network,
            uuid,
        })
    }

    /// The identifier exactly as it appeared in the input.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }
}

impl FromStr for Identifier {
    type Err = IdentifierFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// DID method names are lowercase ASCII letters and digits.
fn is_method_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

fn is_network_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
}

/// Checks the 8-4-4-4-12 hyphenated layout without judging the digits.
///
/// Non-hex characters in an otherwise well shaped segment are left for the
/// UUID parser so they surface as `InvalidUuid` rather than `Malformed`.
fn is_uuid_shaped(segment: &str) -> bool {
    let groups: Vec<&str> = segment.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "7c4b1f0e-2a3d-4c5e-9f60-718293a4b5c6";

    #[test]
    fn test_parse_valid_identifier() {
        let did = Identifier::parse(&format!("did:example:net:{UUID}")).unwrap();

        assert_eq!(did.method(), "example");
        assert_eq!(did.network(), &Network::Net);
        assert_eq!(did.uuid().to_string(), UUID);
        assert_eq!(did.to_string(), format!("did:example:net:{UUID}"));
    }

    #[test]
    fn test_rejects_wrong_scheme() {
        let result = Identifier::parse(&format!("urn:example:net:{UUID}"));
        assert!(matches!(result, Err(IdentifierFailure::InvalidScheme(_))));
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        for input in [
            "did".to_string(),
            "did:example".to_string(),
            format!("did:example:{UUID}"),
            format!("did:example:net:extra:{UUID}"),
            "did::net:".to_string(),
        ] {
            assert!(
                matches!(Identifier::parse(&input), Err(IdentifierFailure::Malformed(_))),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn test_rejects_non_hyphenated_uuid() {
        let result = Identifier::parse("did:example:net:7c4b1f0e2a3d4c5e9f60718293a4b5c6");
        assert!(matches!(result, Err(IdentifierFailure::Malformed(_))));
    }

    #[test]
    fn test_rejects_non_hex_uuid() {
        let result = Identifier::parse("did:example:net:7c4b1f0e-2a3d-4c5e-9f60-718293a4b5zz");
        assert!(matches!(result, Err(IdentifierFailure::InvalidUuid(_))));
    }

    #[test]
    fn test_network_policy() {
        let input = format!("did:example:moon:{UUID}");

        assert_eq!(
            Identifier::parse(&input),
            Err(IdentifierFailure::InvalidNetwork("moon".to_string()))
        );

        let lenient = Identifier::parse_with(&input, NetworkPolicy::Lenient).unwrap();
        assert_eq!(lenient.network(), &Network::Unlisted("moon".to_string()));
        assert_eq!(lenient.network().as_str(), "moon");
    }
}
