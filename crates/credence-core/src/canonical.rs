//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are u64 milliseconds)
//!
//! Records use string keys so they stay self-describing on the wire. The
//! canonical encoding is critical: the same record must produce identical
//! bytes (and thus identical hashes) across all nodes, and payload and
//! signature bytes round-trip verbatim so stored hashes stay valid.

use bytes::Bytes;
use ciborium::value::Value;

use crate::certificate::{CertKind, Certificate};
use crate::crypto::Sha256Hash;
use crate::error::CoreError;
use crate::profile::Profile;
use crate::types::{CertId, KeyId, PersonId, ProfileId};

/// Certificate record field names.
mod cert_fields {
    pub const CERT_ID: &str = "cert_id";
    pub const KIND: &str = "kind";
    pub const PAYLOAD: &str = "payload";
    pub const SIGNATURE: &str = "signature";
    pub const PAYLOAD_HASH: &str = "payload_hash";
    pub const SIGNATURE_HASH: &str = "signature_hash";
    pub const TIMESTAMP: &str = "timestamp";
    pub const TRUSTED: &str = "trusted";
}

/// Profile record field names.
mod profile_fields {
    pub const PROFILE_ID: &str = "profile_id";
    pub const PERSON_ID: &str = "person_id";
    pub const OWNER: &str = "owner";
    pub const PROFILE_HASH: &str = "profile_hash";
    pub const TIMESTAMP: &str = "timestamp";
    pub const KEYS: &str = "keys";
    pub const CERTIFICATES: &str = "certificates";
}

/// Encode a certificate as its peer-facing wire record (seven named fields).
pub fn certificate_wire_bytes(cert: &Certificate) -> Vec<u8> {
    encode_canonical(&certificate_to_value(cert, false))
}

/// Encode a certificate as a storage record (wire fields plus the local
/// admission flag).
pub fn certificate_record_bytes(cert: &Certificate) -> Vec<u8> {
    encode_canonical(&certificate_to_value(cert, true))
}

/// Encode the content a certificate id is derived from.
///
/// The id covers kind, payload, signature, and timestamp; the hash fields
/// are derivable and the id cannot cover itself.
pub fn certificate_content_bytes(
    kind: CertKind,
    payload: &[u8],
    signature: &[u8],
    timestamp: u64,
) -> Vec<u8> {
    let value = Value::Map(vec![
        (text(cert_fields::KIND), Value::Integer(kind.to_u8().into())),
        (text(cert_fields::PAYLOAD), Value::Bytes(payload.to_vec())),
        (
            text(cert_fields::SIGNATURE),
            Value::Bytes(signature.to_vec()),
        ),
        (
            text(cert_fields::TIMESTAMP),
            Value::Integer(timestamp.into()),
        ),
    ]);
    encode_canonical(&value)
}

fn certificate_to_value(cert: &Certificate, with_admission: bool) -> Value {
    let mut entries = vec![
        (text(cert_fields::CERT_ID), text(&cert.cert_id.to_hex())),
        (
            text(cert_fields::KIND),
            Value::Integer(cert.kind.to_u8().into()),
        ),
        (text(cert_fields::PAYLOAD), Value::Bytes(cert.payload.to_vec())),
        (
            text(cert_fields::SIGNATURE),
            Value::Bytes(cert.signature.to_vec()),
        ),
        (
            text(cert_fields::PAYLOAD_HASH),
            Value::Bytes(cert.payload_hash.0.to_vec()),
        ),
        (
            text(cert_fields::SIGNATURE_HASH),
            Value::Bytes(cert.signature_hash.0.to_vec()),
        ),
        (
            text(cert_fields::TIMESTAMP),
            Value::Integer(cert.timestamp.into()),
        ),
    ];
    if with_admission {
        entries.push((text(cert_fields::TRUSTED), Value::Bool(cert.trusted)));
    }
    Value::Map(entries)
}

/// Decode a certificate from wire or storage bytes.
///
/// The admission flag defaults to `false` when absent (wire records never
/// carry it); the endorsed-key back-link is always re-derived at admission
/// and never read from the record.
pub fn decode_certificate(bytes: &[u8]) -> Result<Certificate, CoreError> {
    let value: Value = ciborium::from_reader(bytes)
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let map = as_map(&value)?;

    let cert_id = CertId::from_hex(get_text(map, cert_fields::CERT_ID)?)
        .map_err(|_| CoreError::DecodingError("invalid cert_id".into()))?;

    let kind_raw = get_u64(map, cert_fields::KIND)?;
    let kind = u8::try_from(kind_raw)
        .ok()
        .and_then(CertKind::from_u8)
        .ok_or(CoreError::UnknownKind(kind_raw))?;

    let payload = Bytes::from(get_bytes(map, cert_fields::PAYLOAD)?.to_vec());
    let signature = Bytes::from(get_bytes(map, cert_fields::SIGNATURE)?.to_vec());
    let payload_hash = get_hash(map, cert_fields::PAYLOAD_HASH)?;
    let signature_hash = get_hash(map, cert_fields::SIGNATURE_HASH)?;
    let timestamp = get_u64(map, cert_fields::TIMESTAMP)?;

    let trusted = match get(map, cert_fields::TRUSTED) {
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(CoreError::DecodingError("invalid trusted flag".into())),
        None => false,
    };

    Ok(Certificate {
        cert_id,
        kind,
        payload,
        signature,
        payload_hash,
        signature_hash,
        timestamp,
        trusted,
        endorsed_key: None,
    })
}

/// Encode a profile as a storage/wire record.
pub fn profile_record_bytes(profile: &Profile) -> Vec<u8> {
    let keys: Vec<Value> = profile.keys.iter().map(|k| text(&k.to_hex())).collect();
    let certs: Vec<Value> = profile
        .certificates
        .iter()
        .map(|c| text(&c.to_hex()))
        .collect();

    let value = Value::Map(vec![
        (
            text(profile_fields::PROFILE_ID),
            text(profile.profile_id.as_str()),
        ),
        (
            text(profile_fields::PERSON_ID),
            text(profile.person_id.as_str()),
        ),
        (text(profile_fields::OWNER), text(profile.owner.as_str())),
        (
            text(profile_fields::PROFILE_HASH),
            Value::Bytes(profile.profile_hash.0.to_vec()),
        ),
        (
            text(profile_fields::TIMESTAMP),
            Value::Integer(profile.timestamp.into()),
        ),
        (text(profile_fields::KEYS), Value::Array(keys)),
        (text(profile_fields::CERTIFICATES), Value::Array(certs)),
    ]);
    encode_canonical(&value)
}

/// Decode a profile from record bytes.
pub fn decode_profile(bytes: &[u8]) -> Result<Profile, CoreError> {
    let value: Value = ciborium::from_reader(bytes)
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let map = as_map(&value)?;

    let profile_id = ProfileId::new(get_text(map, profile_fields::PROFILE_ID)?);
    let person_id = PersonId::new(get_text(map, profile_fields::PERSON_ID)?);
    let owner = PersonId::new(get_text(map, profile_fields::OWNER)?);
    let profile_hash = get_hash(map, profile_fields::PROFILE_HASH)?;
    let timestamp = get_u64(map, profile_fields::TIMESTAMP)?;

    let keys = get_array(map, profile_fields::KEYS)?
        .iter()
        .map(|v| match v {
            Value::Text(s) => KeyId::from_hex(s)
                .map_err(|_| CoreError::DecodingError("invalid key id".into())),
            _ => Err(CoreError::DecodingError("invalid key id".into())),
        })
        .collect::<Result<_, _>>()?;

    let certificates = get_array(map, profile_fields::CERTIFICATES)?
        .iter()
        .map(|v| match v {
            Value::Text(s) => CertId::from_hex(s)
                .map_err(|_| CoreError::DecodingError("invalid cert id".into())),
            _ => Err(CoreError::DecodingError("invalid cert id".into())),
        })
        .collect::<Result<_, _>>()?;

    Ok(Profile {
        profile_id,
        person_id,
        owner,
        profile_hash,
        timestamp,
        keys,
        certificates,
    })
}

// ─────────────────────────────────────────────────────────────────────────
// Canonical encoder
// ─────────────────────────────────────────────────────────────────────────

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Encode a CBOR Value to canonical bytes.
pub fn encode_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            encode_integer(buf, *i);
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        _ => {
            // Floats and tags never appear in our records.
            unreachable!("unsupported CBOR value in canonical encoding");
        }
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type, smallest form.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Decode helpers
// ─────────────────────────────────────────────────────────────────────────

fn as_map(value: &Value) -> Result<&[(Value, Value)], CoreError> {
    match value {
        Value::Map(m) => Ok(m),
        _ => Err(CoreError::DecodingError("expected map".into())),
    }
}

fn get<'a>(map: &'a [(Value, Value)], name: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Text(s) if s == name))
        .map(|(_, v)| v)
}

fn get_text<'a>(map: &'a [(Value, Value)], name: &str) -> Result<&'a str, CoreError> {
    match get(map, name) {
        Some(Value::Text(s)) => Ok(s),
        _ => Err(CoreError::DecodingError(format!("missing field {name}"))),
    }
}

fn get_bytes<'a>(map: &'a [(Value, Value)], name: &str) -> Result<&'a [u8], CoreError> {
    match get(map, name) {
        Some(Value::Bytes(b)) => Ok(b),
        _ => Err(CoreError::DecodingError(format!("missing field {name}"))),
    }
}

fn get_u64(map: &[(Value, Value)], name: &str) -> Result<u64, CoreError> {
    match get(map, name) {
        Some(Value::Integer(i)) => {
            let n: i128 = (*i).into();
            u64::try_from(n).map_err(|_| CoreError::DecodingError(format!("field {name} out of range")))
        }
        _ => Err(CoreError::DecodingError(format!("missing field {name}"))),
    }
}

fn get_hash(map: &[(Value, Value)], name: &str) -> Result<Sha256Hash, CoreError> {
    let bytes = get_bytes(map, name)?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CoreError::DecodingError(format!("field {name} must be 32 bytes")))?;
    Ok(Sha256Hash(arr))
}

fn get_array<'a>(map: &'a [(Value, Value)], name: &str) -> Result<&'a [Value], CoreError> {
    match get(map, name) {
        Some(Value::Array(a)) => Ok(a),
        _ => Err(CoreError::DecodingError(format!("missing field {name}"))),
    }
}
