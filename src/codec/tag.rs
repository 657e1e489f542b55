//! BSER tag byte constants.
//!
//! Every encoded value is preceded by exactly one of these bytes. The
//! assignments are fixed by the wire format and must not change.

// Containers
pub const ARRAY: u8 = 0x00;
pub const MAP: u8 = 0x01;

// String: byte length (Integer) + raw bytes, no terminator.
pub const STRING: u8 = 0x02;

// Integers, little-endian, always the narrowest width that fits.
pub const INT8: u8 = 0x03;
pub const INT16: u8 = 0x04;
pub const INT32: u8 = 0x05;
pub const INT64: u8 = 0x06;

// IEEE-754 double, little-endian bit pattern.
pub const DOUBLE: u8 = 0x07;

pub const TRUE: u8 = 0x08;
pub const FALSE: u8 = 0x09;
pub const NULL: u8 = 0x0A;

// Template: shared key set factored out of an array of maps.
pub const TEMPLATE: u8 = 0x0B;

// Skip: inside a template row, "this row has no such key".
pub const SKIP: u8 = 0x0C;

/// The 2-byte magic marker that opens every PDU.
pub const PDU_MAGIC: [u8; 2] = [0x00, 0x01];
