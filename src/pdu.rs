//! PDU framing: the magic-plus-length envelope around one encoded value,
//! and the incremental decoder that assembles PDUs from arbitrary chunks.

use bytes::{Buf, BufMut, BytesMut};

use crate::accum::Accumulator;
use crate::codec::decode::decode_value;
use crate::codec::tag;
use crate::error::BserError;
use crate::types::Value;

/// A parsed PDU header: 2 magic bytes plus an Integer-encoded body length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    /// Declared byte length of the body that follows the header.
    pub body_len: usize,
    /// Total header size (magic + length tag + length payload).
    pub header_len: usize,
}

impl PduHeader {
    /// Parses a header from the front of `data` without consuming anything.
    ///
    /// Returns `Ok(None)` when more bytes are needed. The length field may
    /// use any of the four integer widths; our own writer emits Int32, but
    /// other producers use narrower encodings.
    pub fn parse(data: &[u8]) -> Result<Option<Self>, BserError> {
        if data.len() < 2 {
            return Ok(None);
        }
        if data[..2] != tag::PDU_MAGIC {
            return Err(BserError::BadMagic(data[0], data[1]));
        }
        if data.len() < 3 {
            return Ok(None);
        }
        let width = match data[2] {
            tag::INT8 => 1,
            tag::INT16 => 2,
            tag::INT32 => 4,
            tag::INT64 => 8,
            other => {
                return Err(BserError::Protocol(format!(
                    "invalid PDU length tag: 0x{other:02X}"
                )));
            }
        };
        if data.len() < 3 + width {
            return Ok(None);
        }
        let mut payload = &data[3..3 + width];
        let body_len = match width {
            1 => i64::from(payload.get_i8()),
            2 => i64::from(payload.get_i16_le()),
            4 => i64::from(payload.get_i32_le()),
            _ => payload.get_i64_le(),
        };
        if body_len < 0 {
            return Err(BserError::Protocol(format!(
                "negative PDU body length: {body_len}"
            )));
        }
        Ok(Some(Self {
            body_len: body_len as usize,
            header_len: 3 + width,
        }))
    }
}

/// Writes a PDU header for a body of `body_len` bytes.
///
/// The length field is always Int32 (Int64 for bodies beyond i32 range),
/// matching the reference implementation's fixed-width header.
pub fn write_pdu_header(buf: &mut BytesMut, body_len: usize) {
    buf.put_slice(&tag::PDU_MAGIC);
    if body_len <= i32::MAX as usize {
        buf.put_u8(tag::INT32);
        buf.put_i32_le(body_len as i32);
    } else {
        buf.put_u8(tag::INT64);
        buf.put_i64_le(body_len as i64);
    }
}

/// Peeks a PDU header from an accumulator without consuming it.
///
/// `Ok(None)` means the caller should append more input and retry.
pub fn try_read_pdu_header(acc: &Accumulator) -> Result<Option<PduHeader>, BserError> {
    let readable = acc.peek_bytes(acc.read_avail())?;
    PduHeader::parse(readable)
}

/// Incremental PDU decoder.
///
/// Feed it raw transport chunks with [`append`](Self::append), then call
/// [`next_value`](Self::next_value) until it returns `Ok(None)`. One
/// decoder serves one connection; decode errors abandon the current PDU,
/// after which [`reset`](Self::reset) discards any in-flight bytes.
#[derive(Debug, Default)]
pub struct PduDecoder {
    acc: Accumulator,
    pending: Option<PduHeader>,
}

impl PduDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            acc: Accumulator::new(capacity),
            pending: None,
        }
    }

    /// Appends a chunk of raw input.
    pub fn append(&mut self, bytes: &[u8]) {
        self.acc.append(bytes);
    }

    /// True when no partial PDU is buffered, i.e. the stream is at a
    /// message boundary.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.acc.read_avail() == 0
    }

    /// Discards any partially-received PDU. A partial message is not
    /// recoverable once abandoned.
    pub fn reset(&mut self) {
        self.pending = None;
        self.acc.reset();
    }

    /// Attempts to decode the next complete PDU.
    ///
    /// Returns `Ok(None)` when more input is needed: either the header is
    /// incomplete or the declared body is not yet fully buffered.
    pub fn next_value(&mut self) -> Result<Option<Value>, BserError> {
        let body_len = match &self.pending {
            Some(header) => header.body_len,
            None => match try_read_pdu_header(&self.acc)? {
                None => return Ok(None),
                Some(header) => {
                    self.acc.read_bytes(header.header_len)?;
                    tracing::trace!(
                        body_len = header.body_len,
                        header_len = header.header_len,
                        "pdu header accepted"
                    );
                    self.pending = Some(header);
                    header.body_len
                }
            },
        };

        if self.acc.read_avail() < body_len {
            return Ok(None);
        }

        // The body is fully buffered; this PDU completes or fails now.
        self.pending = None;
        let mut cursor = self.acc.read_bytes(body_len)?;
        let value = decode_value(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(BserError::LengthMismatch {
                declared: body_len,
                actual: body_len - cursor.len(),
            });
        }
        tracing::debug!(body_len, "decoded pdu");
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::dump_to_buffer;
    use std::collections::HashMap;

    #[test]
    fn parse_needs_full_header() {
        assert_eq!(PduHeader::parse(&[]).unwrap(), None);
        assert_eq!(PduHeader::parse(&[0x00]).unwrap(), None);
        assert_eq!(PduHeader::parse(&[0x00, 0x01]).unwrap(), None);
        assert_eq!(PduHeader::parse(&[0x00, 0x01, 0x05, 0x02]).unwrap(), None);
    }

    #[test]
    fn parse_accepts_every_length_width() {
        let h = PduHeader::parse(&[0x00, 0x01, 0x03, 0x28]).unwrap().unwrap();
        assert_eq!(h, PduHeader { body_len: 40, header_len: 4 });

        let h = PduHeader::parse(&[0x00, 0x01, 0x04, 0x28, 0x00])
            .unwrap()
            .unwrap();
        assert_eq!(h, PduHeader { body_len: 40, header_len: 5 });

        let h = PduHeader::parse(&[0x00, 0x01, 0x05, 0x02, 0x00, 0x00, 0x00])
            .unwrap()
            .unwrap();
        assert_eq!(h, PduHeader { body_len: 2, header_len: 7 });

        let h = PduHeader::parse(&[
            0x00, 0x01, 0x06, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ])
        .unwrap()
        .unwrap();
        assert_eq!(h, PduHeader { body_len: 2, header_len: 11 });
    }

    #[test]
    fn parse_rejects_bad_magic() {
        assert!(matches!(
            PduHeader::parse(&[0x13, 0x37, 0x03, 0x00]),
            Err(BserError::BadMagic(0x13, 0x37))
        ));
    }

    #[test]
    fn parse_rejects_non_integer_length_tag() {
        assert!(matches!(
            PduHeader::parse(&[0x00, 0x01, 0x02, 0x00]),
            Err(BserError::Protocol(_))
        ));
    }

    #[test]
    fn write_header_uses_int32() {
        let mut buf = BytesMut::new();
        write_pdu_header(&mut buf, 2);
        assert_eq!(&buf[..], &[0x00, 0x01, 0x05, 0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn decoder_handles_byte_at_a_time_input() {
        let msg = dump_to_buffer(&Value::Map(HashMap::from([(
            "foo".to_string(),
            Value::from("bar"),
        )])));

        let mut decoder = PduDecoder::with_capacity(4);
        for (i, byte) in msg.iter().enumerate() {
            let decoded = decoder.next_value().unwrap();
            assert!(decoded.is_none(), "decoded early at byte {i}");
            decoder.append(&[*byte]);
        }
        let value = decoder.next_value().unwrap().expect("complete pdu");
        assert_eq!(
            value,
            Value::Map(HashMap::from([("foo".to_string(), Value::from("bar"))]))
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn decoder_handles_back_to_back_pdus() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&dump_to_buffer(&Value::Integer(1)));
        stream.extend_from_slice(&dump_to_buffer(&Value::from("two")));

        let mut decoder = PduDecoder::new();
        decoder.append(&stream);
        assert_eq!(decoder.next_value().unwrap(), Some(Value::Integer(1)));
        assert_eq!(decoder.next_value().unwrap(), Some(Value::from("two")));
        assert_eq!(decoder.next_value().unwrap(), None);
        assert!(decoder.is_idle());
    }

    #[test]
    fn decoder_reports_length_mismatch() {
        // Body declares 3 bytes but holds an Int8 value (2 bytes) plus one
        // stray byte.
        let mut decoder = PduDecoder::new();
        decoder.append(&[0x00, 0x01, 0x03, 0x03, 0x03, 0x01, 0xAA]);
        assert!(matches!(
            decoder.next_value(),
            Err(BserError::LengthMismatch {
                declared: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn decoder_surfaces_bad_magic() {
        let mut decoder = PduDecoder::new();
        decoder.append(&[0xDE, 0xAD]);
        assert!(matches!(
            decoder.next_value(),
            Err(BserError::BadMagic(0xDE, 0xAD))
        ));
        // The caller can reset and continue with the next message.
        decoder.reset();
        decoder.append(&dump_to_buffer(&Value::Null));
        assert_eq!(decoder.next_value().unwrap(), Some(Value::Null));
    }
}
