//! Async PDU transport adapters.
//!
//! Thin bridges between the synchronous codec and a tokio byte stream:
//! the reader feeds socket chunks into a [`PduDecoder`] and yields one
//! value per complete PDU, the writer emits one PDU per value.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::dump_to_buffer;
use crate::error::BserError;
use crate::pdu::PduDecoder;
use crate::types::Value;

const READ_CHUNK_SIZE: usize = 4096;

/// Reads BSER PDUs from an `AsyncRead` stream.
pub struct PduReader<R> {
    reader: R,
    decoder: PduDecoder,
}

impl<R: AsyncRead + Unpin> PduReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: PduDecoder::new(),
        }
    }

    /// Reads the next value, buffering as many chunks as needed.
    ///
    /// Returns `Ok(None)` on end of stream at a PDU boundary; an EOF in
    /// the middle of a PDU is an error.
    pub async fn read_value(&mut self) -> Result<Option<Value>, BserError> {
        loop {
            if let Some(value) = self.decoder.next_value()? {
                return Ok(Some(value));
            }
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                if self.decoder.is_idle() {
                    return Ok(None);
                }
                return Err(BserError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream closed mid-PDU",
                )));
            }
            tracing::trace!(bytes = n, "buffered transport chunk");
            self.decoder.append(&chunk[..n]);
        }
    }
}

/// Writes BSER PDUs to an `AsyncWrite` stream.
pub struct PduWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> PduWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one value as a complete PDU.
    pub async fn write_value(&mut self, value: &Value) -> Result<(), BserError> {
        let pdu = dump_to_buffer(value);
        self.writer.write_all(&pdu).await?;
        Ok(())
    }

    /// Flushes the underlying writer.
    pub async fn flush(&mut self) -> Result<(), BserError> {
        self.writer.flush().await?;
        Ok(())
    }
}
