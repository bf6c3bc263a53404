// src/utils/encoding.rs
//! Key and signature material encodings.
//!
//! A key or signature entry must carry its material in exactly one of a fixed
//! list of fields. Resolution walks that list in order and counts hits; it is
//! independent of the crypto suite. Decoding then turns the chosen field into
//! raw bytes:
//!
//! | Encoding  | Key field            | Signature field      |
//! |-----------|----------------------|----------------------|
//! | Base58    | `publicKeyBase58`    | `signatureBase58`    |
//! | Base64    | `publicKeyBase64`    | `signatureBase64`    |
//! | Hex       | `publicKeyHex`       | `signatureHex`       |
//! | Pem       | `publicKeyPem`       |                      |
//! | Jwk       | `publicKeyJwk`       |                      |
//! | Multibase | `publicKeyMultibase` | `signatureMultibase` |

use crate::error::EncodingFailure;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Textual (or structured) forms key and signature material may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Base58,
    Base64,
    Hex,
    Pem,
    Jwk,
    Multibase,
}

/// Key material fields, in resolution order.
pub const KEY_FIELDS: &[(Encoding, &str)] = &[
    (Encoding::Base58, "publicKeyBase58"),
    (Encoding::Base64, "publicKeyBase64"),
    (Encoding::Hex, "publicKeyHex"),
    (Encoding::Pem, "publicKeyPem"),
    (Encoding::Jwk, "publicKeyJwk"),
    (Encoding::Multibase, "publicKeyMultibase"),
];

/// Signature material fields, in resolution order.
pub const SIGNATURE_FIELDS: &[(Encoding, &str)] = &[
    (Encoding::Base58, "signatureBase58"),
    (Encoding::Base64, "signatureBase64"),
    (Encoding::Hex, "signatureHex"),
    (Encoding::Multibase, "signatureMultibase"),
];

/// Material found in an entry, not yet decoded.
#[derive(Debug, Clone, Copy)]
pub struct EncodedValue<'a> {
    pub encoding: Encoding,
    pub field: &'static str,
    pub value: &'a Value,
}

/// Picks the single encoding field present in `object`.
///
/// # Arguments
/// * `object` - A public key or signature entry
/// * `fields` - [`KEY_FIELDS`] or [`SIGNATURE_FIELDS`]
///
/// # Errors
/// - `Missing` if no listed field is present
/// - `Ambiguous` if more than one is present
///
/// A field set to `null` counts as absent.
pub fn resolve<'a>(
    object: &'a Map<String, Value>,
    fields: &'static [(Encoding, &'static str)],
) -> Result<EncodedValue<'a>, EncodingFailure> {
    let present: Vec<EncodedValue<'a>> = fields
        .iter()
        .filter_map(|&(encoding, field)| {
            object
                .get(field)
                .filter(|value| !value.is_null())
                .map(|value| EncodedValue {
                    encoding,
                    field,
                    value,
                })
        })
        .collect();

    match present.as_slice() {
        [] => Err(EncodingFailure::Missing),
        [single] => Ok(*single),
        many => Err(EncodingFailure::Ambiguous(
            many.iter().map(|found| found.field).collect(),
        )),
    }
}

impl EncodedValue<'_> {
    /// Decodes the material into raw bytes.
    ///
    /// JWK material is converted to the native key form for its key type;
    /// PEM material yields the DER inside the armor.
    pub fn decode(&self) -> Result<Vec<u8>, EncodingFailure> {
        let failure = |reason: String| EncodingFailure::Decode {
            field: self.field,
            reason,
        };

        if self.encoding == Encoding::Jwk {
            return decode_jwk_value(self.value).map_err(failure);
        }

        let text = self
            .value
            .as_str()
            .ok_or_else(|| failure("expected a string".to_string()))?;

        self.encoding.decode_str(text).map_err(failure)
    }
}

impl Encoding {
    /// Decodes a textual value. JWK text must hold a JSON object.
    pub fn decode_str(self, text: &str) -> Result<Vec<u8>, String> {
        match self {
            Encoding::Base58 => bs58::decode(text)
                .with_alphabet(bs58::Alphabet::BITCOIN)
                .into_vec()
                .map_err(|e| e.to_string()),
            Encoding::Base64 => base64::decode(text).map_err(|e| e.to_string()),
            Encoding::Hex => hex::decode(text).map_err(|e| e.to_string()),
            Encoding::Pem => decode_pem(text),
            Encoding::Jwk => {
                let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
                decode_jwk_value(&value)
            }
            Encoding::Multibase => decode_multibase(text),
        }
    }

    /// Encodes raw bytes in a reversible textual encoding.
    ///
    /// # Returns
    /// `None` for PEM and JWK, whose text carries more than the bytes
    pub fn encode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Base58 => Some(bs58::encode(bytes).into_string()),
            Encoding::Base64 => Some(base64::encode(bytes)),
            Encoding::Hex => Some(hex::encode(bytes)),
            Encoding::Multibase => Some(multibase::encode(multibase::Base::Base58Btc, bytes)),
            Encoding::Pem | Encoding::Jwk => None,
        }
    }
}

/// Strips one PEM armor block and decodes its Base64 body.
fn decode_pem(text: &str) -> Result<Vec<u8>, String> {
    let mut lines = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let begin = lines.next().ok_or("empty PEM")?;
    let label = begin
        .strip_prefix("-----BEGIN ")
        .and_then(|rest| rest.strip_suffix("-----"))
        .ok_or("missing PEM BEGIN line")?;

    let mut body = String::new();
    while let Some(line) = lines.next() {
        if let Some(end) = line
            .strip_prefix("-----END ")
            .and_then(|rest| rest.strip_suffix("-----"))
        {
            if end != label {
                return Err(format!("PEM label mismatch: BEGIN {label}, END {end}"));
            }
            if lines.next().is_some() {
                return Err("trailing data after PEM END line".to_string());
            }
            return base64::decode(&body).map_err(|e| e.to_string());
        }
        body.push_str(line);
    }

    Err("missing PEM END line".to_string())
}

/// Decodes a multibase string according to its leading base code.
fn decode_multibase(text: &str) -> Result<Vec<u8>, String> {
    multibase::decode(text)
        .map(|(_, bytes)| bytes)
        .map_err(|e| e.to_string())
}

/// The JWK members this engine understands.
#[derive(Debug, Deserialize)]
struct Jwk {
    kty: String,
    crv: Option<String>,
    x: Option<String>,
    y: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// Accepts a JWK given as an object or as a string holding one.
fn decode_jwk_value(value: &Value) -> Result<Vec<u8>, String> {
    let jwk: Jwk = match value {
        Value::String(text) => serde_json::from_str(text),
        other => Jwk::deserialize(other),
    }
    .map_err(|e| format!("invalid JWK: {e}"))?;

    let member = |name: &str, member: &Option<String>| -> Result<Vec<u8>, String> {
        let text = member
            .as_deref()
            .ok_or_else(|| format!("JWK is missing `{name}`"))?;
        base64::decode_config(text, base64::URL_SAFE_NO_PAD)
            .map_err(|e| format!("JWK member `{name}`: {e}"))
    };

    match (jwk.kty.as_str(), jwk.crv.as_deref()) {
        ("OKP", Some("Ed25519")) => member("x", &jwk.x),
        ("EC", Some("secp256k1")) => {
            let x = member("x", &jwk.x)?;
            let y = member("y", &jwk.y)?;
            if x.len() != 32 || y.len() != 32 {
                return Err("secp256k1 JWK coordinates must be 32 bytes".to_string());
            }
            let mut point = Vec::with_capacity(65);
            point.push(0x04);
            point.extend_from_slice(&x);
            point.extend_from_slice(&y);
            Ok(point)
        }
        ("RSA", _) => {
            let n = member("n", &jwk.n)?;
            let e = member("e", &jwk.e)?;
            Ok(rsa_public_key_der(&n, &e))
        }
        (kty, crv) => Err(format!(
            "unsupported JWK key type `{kty}` with curve `{}`",
            crv.unwrap_or("none")
        )),
    }
}

/// DER encodes a PKCS#1 `RSAPublicKey ::= SEQUENCE { n INTEGER, e INTEGER }`.
fn rsa_public_key_der(n: &[u8], e: &[u8]) -> Vec<u8> {
    let mut body = der_unsigned_integer(n);
    body.extend(der_unsigned_integer(e));
    der_tlv(0x30, &body)
}

fn der_unsigned_integer(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let mut content = bytes[start..].to_vec();
    if content.first().map_or(true, |&b| b & 0x80 != 0) {
        content.insert(0, 0x00);
    }
    der_tlv(0x02, &content)
}

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let len_bytes: Vec<u8> = len
            .to_be_bytes()
            .into_iter()
            .skip_while(|&b| b == 0)
            .collect();
        out.push(0x80 | len_bytes.len() as u8);
        out.extend(len_bytes);
    }
    out.extend_from_slice(content);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn entry(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resolve_exactly_one() {
        let object = entry(json!({"id": "x", "publicKeyHex": "00ff"}));
        let found = resolve(&object, KEY_FIELDS).unwrap();

        assert_eq!(found.encoding, Encoding::Hex);
        assert_eq!(found.decode().unwrap(), vec![0x00, 0xff]);
    }

    #[test]
    fn test_resolve_missing_and_ambiguous() {
        let none = entry(json!({"id": "x"}));
        assert_eq!(resolve(&none, KEY_FIELDS).unwrap_err(), EncodingFailure::Missing);

        let two = entry(json!({"publicKeyHex": "00", "publicKeyBase58": "1"}));
        assert_eq!(
            resolve(&two, KEY_FIELDS).unwrap_err(),
            EncodingFailure::Ambiguous(vec!["publicKeyBase58", "publicKeyHex"])
        );
    }

    #[test]
    fn test_null_field_is_absent() {
        let object = entry(json!({"publicKeyHex": "00ff", "publicKeyBase58": null}));
        let found = resolve(&object, KEY_FIELDS).unwrap();
        assert_eq!(found.field, "publicKeyHex");

        let only_null = entry(json!({"signatureHex": null}));
        assert_eq!(resolve(&only_null, SIGNATURE_FIELDS).unwrap_err(), EncodingFailure::Missing);
    }

    #[test]
    fn test_signature_fields_exclude_pem_and_jwk() {
        let object = entry(json!({"signaturePem": "x"}));
        assert_eq!(resolve(&object, SIGNATURE_FIELDS).unwrap_err(), EncodingFailure::Missing);
    }

    #[test]
    fn test_invalid_base58_alphabet() {
        let object = entry(json!({"publicKeyBase58": "0OIl"}));
        let err = resolve(&object, KEY_FIELDS).unwrap().decode().unwrap_err();
        assert!(matches!(err, EncodingFailure::Decode { field: "publicKeyBase58", .. }));
    }

    #[test]
    fn test_non_string_value_fails_decode() {
        let object = entry(json!({"signatureHex": 12}));
        let err = resolve(&object, SIGNATURE_FIELDS).unwrap().decode().unwrap_err();
        assert!(matches!(err, EncodingFailure::Decode { field: "signatureHex", .. }));
    }

    #[test]
    fn test_pem_armor() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x05];
        let pem = format!(
            "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----\n",
            base64::encode(&der)
        );
        assert_eq!(Encoding::Pem.decode_str(&pem).unwrap(), der);

        let mismatched = pem.replace("END PUBLIC KEY", "END RSA PUBLIC KEY");
        assert!(Encoding::Pem.decode_str(&mismatched).is_err());

        let unterminated = format!("-----BEGIN PUBLIC KEY-----\n{}\n", base64::encode(&der));
        assert!(Encoding::Pem.decode_str(&unterminated).is_err());

        assert!(Encoding::Pem.decode_str(&base64::encode(&der)).is_err());
    }

    #[test]
    fn test_multibase_prefixes() {
        let bytes = b"multibase".to_vec();

        for text in [
            format!("z{}", bs58::encode(&bytes).into_string()),
            format!("f{}", hex::encode(&bytes)),
            format!("F{}", hex::encode_upper(&bytes)),
            format!("m{}", base64::encode_config(&bytes, base64::STANDARD_NO_PAD)),
            format!("M{}", base64::encode(&bytes)),
            format!("u{}", base64::encode_config(&bytes, base64::URL_SAFE_NO_PAD)),
            format!("U{}", base64::encode_config(&bytes, base64::URL_SAFE)),
            multibase::encode(multibase::Base::Base32Lower, &bytes),
        ] {
            assert_eq!(Encoding::Multibase.decode_str(&text).unwrap(), bytes, "{text}");
        }

        assert!(Encoding::Multibase.decode_str("").is_err());
        assert!(Encoding::Multibase.decode_str("#abc").is_err());
        assert!(Encoding::Multibase.decode_str("z0OIl").is_err());
    }

    #[test]
    fn test_jwk_ed25519_object_and_string() {
        let x = [9u8; 32];
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": base64::encode_config(x, base64::URL_SAFE_NO_PAD),
        });

        let object = entry(json!({ "publicKeyJwk": jwk.clone() }));
        assert_eq!(resolve(&object, KEY_FIELDS).unwrap().decode().unwrap(), x.to_vec());

        let as_text = entry(json!({ "publicKeyJwk": jwk.to_string() }));
        assert_eq!(resolve(&as_text, KEY_FIELDS).unwrap().decode().unwrap(), x.to_vec());
    }

    #[test]
    fn test_jwk_secp256k1_builds_uncompressed_point() {
        let jwk = json!({
            "kty": "EC",
            "crv": "secp256k1",
            "x": base64::encode_config([1u8; 32], base64::URL_SAFE_NO_PAD),
            "y": base64::encode_config([2u8; 32], base64::URL_SAFE_NO_PAD),
        });
        let point = decode_jwk_value(&jwk).unwrap();

        assert_eq!(point.len(), 65);
        assert_eq!(point[0], 0x04);
        assert_eq!(&point[1..33], &[1u8; 32]);
        assert_eq!(&point[33..], &[2u8; 32]);
    }

    #[test]
    fn test_jwk_rsa_builds_pkcs1() {
        let jwk = json!({
            "kty": "RSA",
            "n": base64::encode_config([0xc1, 0x02], base64::URL_SAFE_NO_PAD),
            "e": base64::encode_config([0x01, 0x00, 0x01], base64::URL_SAFE_NO_PAD),
        });

        assert_eq!(
            decode_jwk_value(&jwk).unwrap(),
            vec![0x30, 0x0a, 0x02, 0x03, 0x00, 0xc1, 0x02, 0x02, 0x03, 0x01, 0x00, 0x01]
        );
    }

    #[test]
    fn test_jwk_rejects_garbage() {
        assert!(decode_jwk_value(&json!("{not json")).is_err());
        assert!(decode_jwk_value(&json!({"kty": "oct", "k": "AAAA"})).is_err());
        assert!(decode_jwk_value(&json!({"kty": "OKP", "crv": "Ed25519"})).is_err());
    }

    #[test]
    fn test_long_der_length() {
        let content = vec![0xab; 300];
        let tlv = der_tlv(0x04, &content);
        assert_eq!(&tlv[..4], &[0x04, 0x82, 0x01, 0x2c]);
        assert_eq!(tlv.len(), 304);
    }

    proptest! {
        /// Reversible encodings give back the bytes they were fed.
        #[test]
        fn reversible_encodings_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..96)) {
            for encoding in [Encoding::Base58, Encoding::Base64, Encoding::Hex, Encoding::Multibase] {
                let text = encoding.encode(&bytes).unwrap();
                prop_assert_eq!(encoding.decode_str(&text).unwrap(), bytes.clone());
            }
        }
    }
}
