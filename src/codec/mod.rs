//! BSER binary encoding format.
//!
//! BSER is a tagged, length-prefixed binary representation for JSON-like
//! values. It uses little-endian byte ordering exclusively, and every value
//! is preceded by a single tag byte describing the bytes that follow.

pub mod decode;
pub mod encode;
pub mod tag;

pub use decode::decode_value;
pub use encode::{encode_template, encode_value};

use bytes::BytesMut;

use crate::error::BserError;
use crate::pdu::{PduHeader, write_pdu_header};
use crate::types::Value;

/// Encodes a value as one complete PDU (header + body), ready for
/// transport.
pub fn dump_to_buffer(value: &Value) -> BytesMut {
    let mut body = BytesMut::new();
    encode_value(&mut body, value);
    let mut out = BytesMut::with_capacity(body.len() + 11);
    write_pdu_header(&mut out, body.len());
    out.extend_from_slice(&body);
    out
}

/// Decodes one complete PDU from a byte slice.
///
/// Unlike the incremental [`PduDecoder`](crate::pdu::PduDecoder), this
/// expects the whole message up front: a short buffer is a hard
/// [`BserError::Truncated`], and a body whose decoded value does not span
/// exactly the declared length is a [`BserError::LengthMismatch`].
pub fn load_from_buffer(data: &[u8]) -> Result<Value, BserError> {
    let header = PduHeader::parse(data)?.ok_or(BserError::Truncated {
        needed: 3,
        avail: data.len(),
    })?;
    let end = header.header_len + header.body_len;
    if data.len() < end {
        return Err(BserError::Truncated {
            needed: end,
            avail: data.len(),
        });
    }
    let mut cursor = &data[header.header_len..end];
    let value = decode_value(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(BserError::LengthMismatch {
            declared: header.body_len,
            actual: header.body_len - cursor.len(),
        });
    }
    Ok(value)
}
