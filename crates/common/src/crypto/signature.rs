//! HMAC-SHA512 request signatures
//!
//! The partner API expects an `airalo-signature` header holding the lowercase
//! hex HMAC-SHA512 of the compact JSON form of the request payload, keyed by
//! the client secret.

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Signs and verifies request payloads with the partner secret.
#[derive(Clone)]
pub struct Signature {
    secret: Vec<u8>,
}

impl Signature {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into().into_bytes() }
    }

    /// Sign a serializable payload.
    ///
    /// Returns `None` for payloads with nothing to sign (null, empty object,
    /// empty array, empty string) or payloads that fail to serialize.
    pub fn sign<T: Serialize + ?Sized>(&self, payload: &T) -> Option<String> {
        let canonical = Self::canonical(payload)?;
        self.sign_bytes(canonical.as_bytes())
    }

    /// Sign a JSON string; whitespace is normalised before signing.
    pub fn sign_raw(&self, payload: &str) -> Option<String> {
        let canonical = Self::canonical_str(payload)?;
        self.sign_bytes(canonical.as_bytes())
    }

    /// Constant-time check of `hash` against the payload signature.
    pub fn verify<T: Serialize + ?Sized>(&self, hash: &str, payload: &T) -> bool {
        let Some(canonical) = Self::canonical(payload) else {
            return false;
        };
        let Ok(expected) = hex::decode(hash) else {
            return false;
        };
        let Ok(mut mac) = <HmacSha512 as Mac>::new_from_slice(&self.secret) else {
            return false;
        };
        mac.update(canonical.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    fn sign_bytes(&self, data: &[u8]) -> Option<String> {
        let mut mac = <HmacSha512 as Mac>::new_from_slice(&self.secret).ok()?;
        mac.update(data);
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    fn canonical<T: Serialize + ?Sized>(payload: &T) -> Option<String> {
        let value = serde_json::to_value(payload).ok()?;
        match value {
            Value::String(raw) => Self::canonical_str(&raw),
            value if is_empty(&value) => None,
            value => serde_json::to_string(&value).ok(),
        }
    }

    fn canonical_str(payload: &str) -> Option<String> {
        if payload.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(value) if is_empty(&value) => None,
            Ok(value) => serde_json::to_string(&value).ok(),
            // Non-JSON strings are signed verbatim.
            Err(_) => Some(payload.to_string()),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signature").field("secret", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const EXPECTED: &str = "0778f43d9edaacae5bac635e20d29de5abbf7004dc563b22dbe8895351c7e83a\
                            e4f6d4a7d7e7cfdec64030e68c23e75f449ced2c9cf7020fcece1cf23540e708";

    #[derive(Serialize)]
    struct Payload {
        package_id: &'static str,
        quantity: u32,
    }

    #[test]
    fn signs_struct_payload_as_compact_json() {
        let signature = Signature::new("secret");
        let hash = signature.sign(&Payload { package_id: "pkg", quantity: 1 }).unwrap();
        assert_eq!(hash, EXPECTED);
    }

    #[test]
    fn raw_json_whitespace_is_normalised() {
        let signature = Signature::new("secret");
        let hash = signature.sign_raw("{ \"package_id\": \"pkg\",\n \"quantity\": 1 }").unwrap();
        assert_eq!(hash, EXPECTED);
    }

    #[test]
    fn empty_payloads_have_no_signature() {
        let signature = Signature::new("secret");
        assert!(signature.sign(&json!({})).is_none());
        assert!(signature.sign(&json!(null)).is_none());
        assert!(signature.sign_raw("   ").is_none());
    }

    #[test]
    fn verify_accepts_matching_hash_only() {
        let signature = Signature::new("secret");
        let payload = json!({"package_id": "pkg", "quantity": 1});
        assert!(signature.verify(EXPECTED, &payload));
        assert!(!signature.verify("deadbeef", &payload));
        assert!(!Signature::new("other").verify(EXPECTED, &payload));
    }

    #[test]
    fn debug_output_hides_secret() {
        assert!(!format!("{:?}", Signature::new("top-secret")).contains("top-secret"));
    }
}
