//! bser-wire — A pure-Rust BSER binary serialization codec.
//!
//! BSER is the tagged, length-prefixed binary format used by Watchman to
//! exchange JSON-like values over sockets and pipes. Each message is one
//! PDU: a 2-byte magic marker, an integer body length, and a recursively
//! tagged body holding a single value.
//!
//! # Architecture
//!
//! - **`types`** — The [`Value`](types::Value) variant (scalars, byte
//!   strings, arrays, maps) and the field-omission sentinel
//! - **`codec`** — Encoding/decoding between values and tagged bytes,
//!   including the template compression for arrays of similar maps
//! - **`accum`** — Dual-cursor byte accumulator for input that arrives in
//!   arbitrary-sized chunks
//! - **`pdu`** — PDU header framing and the incremental
//!   [`PduDecoder`](pdu::PduDecoder)
//! - **`io`** — Async reader/writer adapters over tokio streams
//! - **`error`** — [`BserError`](error::BserError)

pub mod accum;
pub mod codec;
pub mod error;
pub mod io;
pub mod pdu;
pub mod types;
