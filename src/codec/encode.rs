//! BSER encoding: `Value` → bytes.

use bytes::{BufMut, BytesMut};

use super::tag;
use crate::types::{Value, ValueMap};

/// Encodes a `Value` into the buffer as a tagged BSER byte sequence.
///
/// Encoding is purely structural and cannot fail: the omission sentinel is
/// dropped from maps (and degrades to Null anywhere else), and an array of
/// similarly-shaped maps is compressed via the template path when the
/// heuristic in [`template_keys`] fires.
pub fn encode_value(buf: &mut BytesMut, value: &Value) {
    match value {
        Value::Null => encode_null(buf),
        // The sentinel is only meaningful in map position; the original
        // implementation never emits it as a standalone value.
        Value::Absent => encode_null(buf),
        Value::Bool(b) => encode_bool(buf, *b),
        Value::Integer(i) => encode_int(buf, *i),
        Value::Double(d) => encode_double(buf, *d),
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => match template_keys(items) {
            Some(keys) => {
                let rows: Vec<&ValueMap> = items.iter().filter_map(|item| item.as_map()).collect();
                encode_template_rows(buf, &keys, &rows);
            }
            None => encode_array(buf, items),
        },
        Value::Map(map) => encode_map(buf, map),
    }
}

pub fn encode_null(buf: &mut BytesMut) {
    buf.put_u8(tag::NULL);
}

pub fn encode_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(if value { tag::TRUE } else { tag::FALSE });
}

/// Encodes an integer using the narrowest width whose range contains it.
pub fn encode_int(buf: &mut BytesMut, value: i64) {
    if i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX) {
        buf.put_u8(tag::INT8);
        buf.put_i8(value as i8);
    } else if i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX) {
        buf.put_u8(tag::INT16);
        buf.put_i16_le(value as i16);
    } else if i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX) {
        buf.put_u8(tag::INT32);
        buf.put_i32_le(value as i32);
    } else {
        buf.put_u8(tag::INT64);
        buf.put_i64_le(value);
    }
}

/// Encodes a double.
///
/// A mathematically integral value within i64 range is emitted as an
/// Integer, byte-identical to encoding the equivalent integer: the wire
/// format distinguishes integral from fractional, not the caller's numeric
/// representation.
pub fn encode_double(buf: &mut BytesMut, value: f64) {
    let integral = value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64;
    if integral {
        encode_int(buf, value as i64);
    } else {
        buf.put_u8(tag::DOUBLE);
        buf.put_f64_le(value);
    }
}

/// Encodes a byte string (length = byte count, no terminator).
pub fn encode_string(buf: &mut BytesMut, value: &[u8]) {
    buf.put_u8(tag::STRING);
    encode_int(buf, value.len() as i64);
    buf.put_slice(value);
}

pub fn encode_array(buf: &mut BytesMut, items: &[Value]) {
    buf.put_u8(tag::ARRAY);
    encode_int(buf, items.len() as i64);
    for item in items {
        encode_value(buf, item);
    }
}

/// Encodes a map, dropping entries whose value is the omission sentinel.
pub fn encode_map(buf: &mut BytesMut, map: &ValueMap) {
    let present = map.values().filter(|v| !matches!(v, Value::Absent)).count();
    buf.put_u8(tag::MAP);
    encode_int(buf, present as i64);
    for (key, value) in map {
        if matches!(value, Value::Absent) {
            continue;
        }
        encode_string(buf, key.as_bytes());
        encode_value(buf, value);
    }
}

/// Encodes an array of maps via the template path: the shared key set is
/// written once, then each row emits one value per key, with the Skip byte
/// standing in for keys the row does not have.
pub fn encode_template(buf: &mut BytesMut, keys: &[String], rows: &[ValueMap]) {
    let borrowed: Vec<&ValueMap> = rows.iter().collect();
    encode_template_rows(buf, keys, &borrowed);
}

fn encode_template_rows(buf: &mut BytesMut, keys: &[String], rows: &[&ValueMap]) {
    buf.put_u8(tag::TEMPLATE);
    buf.put_u8(tag::ARRAY);
    encode_int(buf, keys.len() as i64);
    for key in keys {
        encode_string(buf, key.as_bytes());
    }
    encode_int(buf, rows.len() as i64);
    for row in rows {
        for key in keys {
            match row.get(key) {
                Some(Value::Absent) | None => buf.put_u8(tag::SKIP),
                Some(value) => encode_value(buf, value),
            }
        }
    }
}

/// Decides whether an array should take the template path, returning the
/// shared key order if so.
///
/// The heuristic requires at least two elements, every element a map, and a
/// non-empty intersection of the rows' key sets. The key order is the
/// sorted union of all present keys, so the wire output is deterministic
/// even though map iteration order is not.
pub fn template_keys(items: &[Value]) -> Option<Vec<String>> {
    if items.len() < 2 {
        return None;
    }
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Map(m) => rows.push(m),
            _ => return None,
        }
    }

    let mut union: Vec<String> = Vec::new();
    for row in &rows {
        for (key, value) in row.iter() {
            if matches!(value, Value::Absent) {
                continue;
            }
            if !union.iter().any(|k| k == key) {
                union.push(key.clone());
            }
        }
    }
    union.sort_unstable();

    let shared = union
        .iter()
        .any(|key| rows.iter().all(|row| matches!(row.get(key), Some(v) if !matches!(v, Value::Absent))));
    if union.is_empty() || !shared {
        return None;
    }
    Some(union)
}
