//! Content-addressed document identity.
//!
//! A raw item's id is the SHA-256 of its canonical JSON text. The canonical
//! text sorts object keys, separates with `", "` and `": "`, escapes every
//! non-printable-ASCII character as `\uXXXX`, and renders floats in the
//! shortest round-trip form with a `.0` suffix for integral values and
//! `e+NN` / `e-NN` exponents outside `1e-4 ..= 1e16`. Integers are written
//! with their original digits. Values are parsed with serde_json's
//! `arbitrary_precision`, so nothing is rounded on the way in. That is the byte form
//! earlier ingestion runs hashed, so re-ingesting the same item lands on the
//! same `_id` and overwrites instead of duplicating.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Derive the document id for a raw item.
///
/// Key order in the input never affects the result; any change to a key or
/// value does.
pub fn content_id(item: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(item).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Serialize a value to its canonical text form.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, &n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                out.push_str(": ");
                write_value(out, val);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
    out.push('"');
}

/// `token` is the number exactly as it appeared in the input. Integers keep
/// every digit, whatever their size; only fractional or exponent tokens go
/// through float formatting.
fn write_number(out: &mut String, token: &str) {
    if !token.contains(['.', 'e', 'E']) {
        match token {
            "-0" => out.push('0'),
            _ => out.push_str(token),
        }
        return;
    }
    match token.parse::<f64>() {
        Ok(f) if f.is_infinite() => {
            out.push_str(if f < 0.0 { "-Infinity" } else { "Infinity" })
        }
        Ok(f) => write_float(out, f),
        Err(_) => out.push_str(token),
    }
}

fn write_float(out: &mut String, f: f64) {
    // `{:e}` yields the shortest round-trip digits, e.g. "1.5e-7".
    let sci = format!("{:e}", f.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if f.is_sign_negative() {
        out.push('-');
    }

    let decpt = exp + 1;
    if decpt <= -4 || decpt > 16 {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if exp < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exp.abs()));
    } else if decpt <= 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-decpt) as usize));
        out.push_str(&digits);
    } else {
        let point = decpt as usize;
        if digits.len() <= point {
            out.push_str(&digits);
            out.push_str(&"0".repeat(point - digits.len()));
            out.push_str(".0");
        } else {
            out.push_str(&digits[..point]);
            out.push('.');
            out.push_str(&digits[point..]);
        }
    }
}
