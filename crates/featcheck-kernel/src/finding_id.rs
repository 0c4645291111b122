//! Deterministic identifiers for findings and reports.
//!
//! Two runs over the same descriptor set must produce identical ids.
//!
//! Algorithm:
//! 1. Build the canonical finding key (schema, task, class, subject, message)
//! 2. Serialize it canonically: sorted keys, no whitespace
//! 3. findingId = "f1_" || base32hex_lower(SHA256(keyBytes))
//!
//! A report digest applies the same encoding to the ordered list of error
//! and warning ids, with prefix "d1_".

use serde_json::Value;
use sha2::{Digest, Sha256};

const FINDING_KEY_SCHEMA: u64 = 1;

pub fn compute_finding_id(task: &str, class: &str, subject: &str, message: &str) -> String {
    let key = canonical_finding_key(task, class, subject, message);
    let hash = Sha256::digest(canonical_bytes(&key));
    format!("f1_{}", base32hex_lower_no_pad(&hash))
}

/// Digest over finding ids, order-sensitive.
pub fn compute_report_digest<'a>(
    error_ids: impl IntoIterator<Item = &'a str>,
    warning_ids: impl IntoIterator<Item = &'a str>,
) -> String {
    let ids = |items: Vec<&str>| {
        Value::Array(
            items
                .into_iter()
                .map(|id| Value::String(id.to_string()))
                .collect(),
        )
    };
    let mut map = serde_json::Map::new();
    map.insert("errors".to_string(), ids(error_ids.into_iter().collect()));
    map.insert(
        "warnings".to_string(),
        ids(warning_ids.into_iter().collect()),
    );
    let hash = Sha256::digest(canonical_bytes(&Value::Object(map)));
    format!("d1_{}", base32hex_lower_no_pad(&hash))
}

fn canonical_finding_key(task: &str, class: &str, subject: &str, message: &str) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("schema".to_string(), Value::Number(FINDING_KEY_SCHEMA.into()));
    map.insert("task".to_string(), Value::String(task.to_string()));
    map.insert("class".to_string(), Value::String(class.to_string()));
    map.insert("subject".to_string(), Value::String(subject.to_string()));
    map.insert("message".to_string(), Value::String(message.to_string()));
    Value::Object(map)
}

/// Canonical JSON: object keys sorted, no insignificant whitespace.
///
/// Keys only ever hold strings, integers, arrays and objects here, so
/// serde_json's compact output is canonical once keys are ordered.
fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_canonical(value, &mut buf);
    buf
}

fn write_canonical(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_canonical(item, buf);
            }
            buf.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            buf.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                buf.extend_from_slice(Value::String((*key).clone()).to_string().as_bytes());
                buf.push(b':');
                write_canonical(&map[*key], buf);
            }
            buf.push(b'}');
        }
        scalar => buf.extend_from_slice(scalar.to_string().as_bytes()),
    }
}

/// RFC 4648 base32hex encoding, lowercase, without padding.
fn base32hex_lower_no_pad(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuv";

    let mut result = String::new();
    let mut bits: u64 = 0;
    let mut num_bits: u32 = 0;

    for &byte in data {
        bits = (bits << 8) | (byte as u64);
        num_bits += 8;

        while num_bits >= 5 {
            num_bits -= 5;
            let idx = ((bits >> num_bits) & 0x1f) as usize;
            result.push(ALPHABET[idx] as char);
        }
    }

    if num_bits > 0 {
        let idx = ((bits << (5 - num_bits)) & 0x1f) as usize;
        result.push(ALPHABET[idx] as char);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_id_determinism() {
        let id1 = compute_finding_id("bundle-packages", "missing_mandatory", "b1:1.0.0", "m");
        let id2 = compute_finding_id("bundle-packages", "missing_mandatory", "b1:1.0.0", "m");
        assert_eq!(id1, id2);
        assert!(id1.starts_with("f1_"));
        // 256 bits in 5-bit symbols
        assert_eq!(id1.len(), 3 + 52);
    }

    #[test]
    fn finding_id_sensitivity() {
        let base = compute_finding_id("bundle-packages", "missing_mandatory", "b1:1.0.0", "m");
        assert_ne!(
            base,
            compute_finding_id("bundle-packages", "missing_optional", "b1:1.0.0", "m")
        );
        assert_ne!(
            base,
            compute_finding_id("bundle-packages", "missing_mandatory", "b2:1.0.0", "m")
        );
        assert_ne!(
            base,
            compute_finding_id("api-regions", "missing_mandatory", "b1:1.0.0", "m")
        );
    }

    #[test]
    fn digest_is_order_sensitive() {
        let none: [&str; 0] = [];
        let a = compute_report_digest(["f1_a", "f1_b"], none);
        let b = compute_report_digest(["f1_b", "f1_a"], none);
        let c = compute_report_digest(none, ["f1_a", "f1_b"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("d1_"));
    }

    #[test]
    fn base32hex_alphabet() {
        let hash = Sha256::digest(b"");
        let encoded = base32hex_lower_no_pad(&hash);
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='v').contains(&c))
        );
        assert_eq!(base32hex_lower_no_pad(b"f"), "co");
        assert_eq!(base32hex_lower_no_pad(b"foobar"), "cpnmuoj1e8");
    }

    #[test]
    fn canonical_key_ordering() {
        let key = canonical_finding_key("t", "c", "s", "m");
        let s = String::from_utf8(canonical_bytes(&key)).expect("utf8");
        assert_eq!(
            s,
            r#"{"class":"c","message":"m","schema":1,"subject":"s","task":"t"}"#
        );
    }
}
