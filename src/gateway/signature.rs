//! Canonical-ordering HMAC-SHA256 signing for gateway parameters.
//!
//! Sign and verify share one canonicalization: keys sorted byte-wise
//! ascending, joined as `k1=v1&k2=v2&...` over raw values. The gateway
//! documents no further escaping of values before hashing.

use crate::gateway::types::{PARAM_SECURE_HASH, PARAM_SECURE_HASH_TYPE};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

fn canonicalize(params: &BTreeMap<String, String>) -> String {
    let mut data = String::new();
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            data.push('&');
        }
        data.push_str(key);
        data.push('=');
        data.push_str(value);
    }
    data
}

/// Hex-encoded HMAC-SHA256 over the canonical form of `params`.
pub fn sign_params(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(canonicalize(params).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Recompute the signature over `params` (signature fields and empty values
/// removed) and compare against `provided` in constant time.
pub fn verify_params(params: &BTreeMap<String, String>, provided: &str, secret: &str) -> bool {
    let mut filtered = params.clone();
    filtered.remove(PARAM_SECURE_HASH);
    filtered.remove(PARAM_SECURE_HASH_TYPE);
    filtered.retain(|_, value| !value.is_empty());

    let expected = sign_params(&filtered, secret);
    secure_eq(expected.as_bytes(), provided.trim().as_bytes())
}

pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
