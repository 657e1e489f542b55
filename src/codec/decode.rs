//! BSER decoding: bytes → `Value`.

use bytes::Buf;

use super::tag;
use crate::error::BserError;
use crate::types::{Value, ValueMap};

/// Decodes a single `Value` from the buffer by recursive descent on the
/// tag byte.
///
/// The caller is expected to have verified that the full PDU body is
/// available, so running out of bytes here is a fatal [`BserError::Truncated`],
/// not a retry signal.
pub fn decode_value(buf: &mut impl Buf) -> Result<Value, BserError> {
    ensure_remaining(buf, 1)?;
    let t = buf.get_u8();
    match t {
        tag::NULL => Ok(Value::Null),
        tag::TRUE => Ok(Value::Bool(true)),
        tag::FALSE => Ok(Value::Bool(false)),

        tag::INT8 => {
            ensure_remaining(buf, 1)?;
            Ok(Value::Integer(i64::from(buf.get_i8())))
        }
        tag::INT16 => {
            ensure_remaining(buf, 2)?;
            Ok(Value::Integer(i64::from(buf.get_i16_le())))
        }
        tag::INT32 => {
            ensure_remaining(buf, 4)?;
            Ok(Value::Integer(i64::from(buf.get_i32_le())))
        }
        tag::INT64 => {
            ensure_remaining(buf, 8)?;
            Ok(Value::Integer(buf.get_i64_le()))
        }

        tag::DOUBLE => {
            ensure_remaining(buf, 8)?;
            Ok(Value::Double(buf.get_f64_le()))
        }

        tag::STRING => {
            let len = decode_count(buf)?;
            decode_string_data(buf, len).map(Value::String)
        }

        tag::ARRAY => {
            let len = decode_count(buf)?;
            decode_array_data(buf, len)
        }

        tag::MAP => {
            let len = decode_count(buf)?;
            decode_map_data(buf, len).map(Value::Map)
        }

        tag::TEMPLATE => decode_template(buf),

        tag::SKIP => Err(BserError::Protocol(
            "Skip tag outside a template row".into(),
        )),

        other => Err(BserError::UnknownTag(other)),
    }
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), BserError> {
    if buf.remaining() < needed {
        Err(BserError::Truncated {
            needed,
            avail: buf.remaining(),
        })
    } else {
        Ok(())
    }
}

/// Decodes an Integer value used as a length or element count.
fn decode_count(buf: &mut impl Buf) -> Result<usize, BserError> {
    match decode_value(buf)? {
        Value::Integer(i) if i >= 0 => Ok(i as usize),
        Value::Integer(i) => Err(BserError::Protocol(format!("negative length: {i}"))),
        other => Err(BserError::Protocol(format!(
            "expected an integer length, got: {other}"
        ))),
    }
}

fn decode_string_data(buf: &mut impl Buf, len: usize) -> Result<Vec<u8>, BserError> {
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    Ok(data)
}

fn decode_array_data(buf: &mut impl Buf, len: usize) -> Result<Value, BserError> {
    let mut items = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        items.push(decode_value(buf)?);
    }
    Ok(Value::Array(items))
}

fn decode_map_data(buf: &mut impl Buf, len: usize) -> Result<ValueMap, BserError> {
    let mut map = ValueMap::with_capacity(len.min(4096));
    for _ in 0..len {
        let key = decode_key(buf)?;
        let value = decode_value(buf)?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Map and template keys must be strings, and must be valid UTF-8 so they
/// can be compared.
fn decode_key(buf: &mut impl Buf) -> Result<String, BserError> {
    match decode_value(buf)? {
        Value::String(bytes) => Ok(String::from_utf8(bytes)?),
        other => Err(BserError::Protocol(format!(
            "map key must be a string, got: {other}"
        ))),
    }
}

/// Expands a template into an Array of Map.
///
/// Each row yields one value per shared key; the Skip byte means the row
/// has no entry for that key, so the key is left out of the row's map
/// entirely rather than set to Null.
fn decode_template(buf: &mut impl Buf) -> Result<Value, BserError> {
    let keys = match decode_value(buf)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(bytes) => String::from_utf8(bytes).map_err(BserError::from),
                other => Err(BserError::Protocol(format!(
                    "template key must be a string, got: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(BserError::Protocol(format!(
                "template keys must be an array, got: {other}"
            )));
        }
    };

    let row_count = decode_count(buf)?;
    let mut rows = Vec::with_capacity(row_count.min(4096));
    for _ in 0..row_count {
        let mut row = ValueMap::with_capacity(keys.len());
        for key in &keys {
            ensure_remaining(buf, 1)?;
            if buf.chunk()[0] == tag::SKIP {
                buf.advance(1);
                continue;
            }
            row.insert(key.clone(), decode_value(buf)?);
        }
        rows.push(Value::Map(row));
    }
    Ok(Value::Array(rows))
}
